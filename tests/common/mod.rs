//! Synthetic PDF builders shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{
    dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream,
    StringFormat,
};

/// Line spacing used by [`pdf_with_pages`].
pub const LEADING: i64 = 14;

/// Build a Letter-size PDF with one Helvetica page per entry, each line
/// shown with its own `Tj` starting at (72, 700) and moving down by
/// [`LEADING`].
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let contents: Vec<Vec<u8>> = pages.iter().map(|lines| page_content(lines)).collect();
    let refs: Vec<&[u8]> = contents.iter().map(|c| c.as_slice()).collect();
    pdf_with_contents(&refs)
}

/// Build a Letter-size PDF with raw content streams, font `/F1` bound to
/// Helvetica on every page.
pub fn pdf_with_contents(contents: &[&[u8]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
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

fn page_content(lines: &[&str]) -> Vec<u8> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 700.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("Td", vec![0.into(), (-LEADING).into()]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }.encode().unwrap()
}

/// Encrypt `data` with an empty user password, so it opens without a
/// password but carries the standard security handler.
pub fn encrypt_with_empty_password(data: &[u8]) -> Vec<u8> {
    let mut doc = Document::load_mem(data).unwrap();
    doc.trailer.set(
        "ID",
        vec![
            Object::String(vec![0x42; 16], StringFormat::Hexadecimal),
            Object::String(vec![0x42; 16], StringFormat::Hexadecimal),
        ],
    );
    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password: "",
        key_length: 128,
        permissions: Permissions::all(),
    })
    .unwrap();
    doc.encrypt(&state).unwrap();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Whether `needle` occurs anywhere in `data`.
pub fn contains_bytes(data: &[u8], needle: &[u8]) -> bool {
    data.windows(needle.len()).any(|w| w == needle)
}

/// Plain text of every page, runs joined by newlines.
pub fn page_texts(data: &[u8]) -> Vec<String> {
    let backend = pdfscrub::backend::shared();
    let doc = backend
        .open(data, pdfscrub::LoadMode::Tolerant)
        .expect("document loads");
    (1..=doc.page_count())
        .map(|page| {
            doc.text_runs(page)
                .unwrap()
                .into_iter()
                .map(|run| run.text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}
