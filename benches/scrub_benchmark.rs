//! Benchmarks for pattern matching and the redaction pipeline.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lopdf::{dictionary, Document, Object, Stream};

/// Creates a synthetic PDF where every page carries one email and one phone number.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for i in 0..page_count {
        let text = format!(
            "BT /F1 12 Tf 72 700 Td (Page {} of the benchmark document.) Tj \
             0 -14 Td (Contact: user{}@example.com) Tj \
             0 -14 Td (Phone: 555-123-{:04}) Tj ET",
            i + 1,
            i,
            i
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Benchmark the pattern set on single runs.
fn bench_patterns(c: &mut Criterion) {
    let runs = [
        "Please contact jane.doe@example.com for details",
        "Call us at +1 (555) 123-4567 or 555.987.6543",
        "Quarterly revenue grew 12% over 2023",
    ];

    c.bench_function("classify_runs", |b| {
        b.iter(|| {
            for run in &runs {
                black_box(pdfscrub::classify(black_box(run)));
            }
        });
    });

    c.bench_function("find_phones", |b| {
        b.iter(|| pdfscrub::find_phones(black_box(runs[1])));
    });
}

/// Benchmark scanning at various sizes.
fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for page_count in [1, 5, 10].iter() {
        let data = create_test_pdf(*page_count);
        let scrubber = pdfscrub::Scrubber::new();

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| scrubber.analyze(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark full redaction without the permission lock.
fn bench_redact(c: &mut Criterion) {
    let mut group = c.benchmark_group("redact");

    for page_count in [1, 5].iter() {
        let data = create_test_pdf(*page_count);
        let scrubber = pdfscrub::Scrubber::new().skip_permission_lock();

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| scrubber.redact(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_patterns, bench_analyze, bench_redact);
criterion_main!(benches);
