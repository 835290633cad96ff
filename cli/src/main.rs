//! pdfscrub CLI - find and redact emails and phone numbers in PDF files

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use pdfscrub::model::ItemContent;
use pdfscrub::{JsonFormat, RedactOptions, RedactOutcome, Scrubber, TextPolicy};

type CliResult = Result<(), Box<dyn StdError>>;

#[derive(Parser)]
#[command(name = "pdfscrub")]
#[command(version)]
#[command(about = "Find and redact emails and phone numbers in PDF files", long_about = None)]
struct Cli {
    /// Input PDF file, redacted next to the original
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Show low-level error details
    #[arg(long, global = true, env = "PDFSCRUB_EXPOSE_ERRORS")]
    expose_errors: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report matches without modifying the files
    Scan {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Print the analysis report as JSON
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Include matched text in the report
        #[arg(long, env = "PDFSCRUB_INCLUDE_TEXT")]
        include_text: bool,
    },

    /// Write redacted copies
    Redact {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output file (single input) or directory
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Do not apply the permission lock
        #[arg(long, env = "PDFSCRUB_SKIP_LOCK")]
        skip_lock: bool,

        /// Lock with this qpdf executable instead of the built-in lock
        #[arg(long, env = "PDFSCRUB_QPDF", value_name = "PATH")]
        qpdf: Option<PathBuf>,

        /// Paint boxes only, leave the underlying text in place
        #[arg(long)]
        overlay_only: bool,

        /// Padding around each box, in points
        #[arg(long, default_value = "2.0")]
        padding: f32,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let expose = cli.expose_errors;
    let scrubber = Scrubber::new().expose_error_detail(expose);

    let result = match cli.command {
        Some(Commands::Scan {
            files,
            json,
            compact,
            include_text,
        }) => {
            let policy = if include_text {
                TextPolicy::Include
            } else {
                TextPolicy::LengthOnly
            };
            let format = json.then_some(if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            });
            cmd_scan(&files, &scrubber.with_text_policy(policy), format)
        }
        Some(Commands::Redact {
            files,
            output,
            skip_lock,
            qpdf,
            overlay_only,
            padding,
        }) => {
            let options = RedactOptions::new()
                .with_skip_permission_lock(skip_lock)
                .with_strip_text(!overlay_only)
                .with_padding(padding);
            let mut scrubber = scrubber.with_redact_options(options);
            if let Some(program) = qpdf {
                scrubber = scrubber.with_qpdf(program);
            }
            cmd_redact(&files, output.as_deref(), &scrubber)
        }
        Some(Commands::Info { input }) => cmd_info(&input, &scrubber),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: redact if input is provided
            if let Some(input) = cli.input {
                cmd_redact(&[input], None, &scrubber)
            } else {
                println!("{}", "Usage: pdfscrub <FILE>".yellow());
                println!("       pdfscrub --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        print_error(e.as_ref(), expose);
        std::process::exit(1);
    }
}

/// Print an error with its category and remediation hint when available.
fn print_error(err: &(dyn StdError + 'static), expose: bool) {
    match err.downcast_ref::<pdfscrub::Error>() {
        Some(err) => {
            let report = err.to_report(expose);
            eprintln!(
                "{}: {} ({})",
                "Error".red().bold(),
                report.message,
                report.category
            );
            eprintln!("{}: {}", "Hint".yellow().bold(), report.hint);
            if let Some(detail) = report.detail {
                eprintln!("{}: {}", "Detail".dimmed(), detail);
            }
        }
        None => eprintln!("{}: {}", "Error".red().bold(), err),
    }
}

fn cmd_scan(files: &[PathBuf], scrubber: &Scrubber, format: Option<JsonFormat>) -> CliResult {
    for file in files {
        let data = fs::read(file)?;
        let report = scrubber.analyze(&data)?;

        if let Some(format) = format {
            println!("{}", report.to_json(format)?);
            continue;
        }

        let stats = &report.statistics;
        if !report.found {
            println!("{} {}", "Clean".green(), file.display());
            continue;
        }

        println!(
            "{} {}: {} matches ({} emails, {} phones) on {} pages",
            "Found".yellow().bold(),
            file.display(),
            stats.total_redactions,
            stats.emails,
            stats.phones,
            stats.pages_affected
        );
        for page in &report.details {
            println!("  {} {}", "Page".bold(), page.page);
            for item in &page.items {
                let content = match &item.content {
                    ItemContent::Text { text } => text.clone(),
                    ItemContent::Length { text_length } => format!("{} chars", text_length),
                };
                println!(
                    "    {} {:<6} {} at ({:.1}, {:.1}) {:.1}x{:.1}",
                    "├─".dimmed(),
                    item.kind.to_string(),
                    content,
                    item.coordinates.x,
                    item.coordinates.y,
                    item.coordinates.width,
                    item.coordinates.height
                );
            }
        }
    }

    Ok(())
}

fn cmd_redact(files: &[PathBuf], output: Option<&Path>, scrubber: &Scrubber) -> CliResult {
    let multiple = files.len() > 1;
    let targets: Vec<(PathBuf, PathBuf)> = files
        .iter()
        .cloned()
        .zip(output_paths(files, output))
        .collect();

    if let Some(dir) = output.filter(|p| !is_file_target(p, multiple)) {
        fs::create_dir_all(dir)?;
    }

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Redacting...");

    let results: Vec<_> = targets
        .par_iter()
        .map(|(input, out)| {
            let result = scrubber.redact_file(input, out);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let mut failed = 0;
    for ((input, out), result) in targets.iter().zip(results) {
        match result {
            Ok(RedactOutcome::Redacted(doc)) => {
                println!(
                    "{} {} -> {}",
                    "Redacted".green().bold(),
                    input.display(),
                    out.display()
                );
                println!(
                    "  {} {} emails, {} phones on {} pages ({} ms{})",
                    "└─".dimmed(),
                    doc.statistics.emails,
                    doc.statistics.phones,
                    doc.statistics.pages_affected,
                    doc.processing_time_ms,
                    if doc.lock_applied { ", locked" } else { "" }
                );
            }
            Ok(RedactOutcome::Clean(report)) => {
                println!("{} {}: {}", "Clean".cyan(), input.display(), report.message);
            }
            Err(e) => {
                failed += 1;
                let report = scrubber.report_error(&e);
                eprintln!(
                    "{} {}: {} ({})",
                    "Failed".red().bold(),
                    input.display(),
                    report.message,
                    report.category
                );
                eprintln!("  {}: {}", "Hint".yellow(), report.hint);
                if let Some(detail) = report.detail {
                    eprintln!("  {}: {}", "Detail".dimmed(), detail);
                }
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, targets.len()).into());
    }
    Ok(())
}

/// Whether `output` names a single output file rather than a directory.
fn is_file_target(output: &Path, multiple: bool) -> bool {
    !multiple
        && output
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}

/// Where the redacted copy of `input` is written.
fn output_path(input: &Path, output: Option<&Path>, multiple: bool) -> PathBuf {
    let name = redacted_name(input);
    match output {
        Some(path) if is_file_target(path, multiple) => path.to_path_buf(),
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Output paths for a batch, numbering names that would otherwise collide.
fn output_paths(files: &[PathBuf], output: Option<&Path>) -> Vec<PathBuf> {
    let multiple = files.len() > 1;
    let mut used = HashSet::new();
    files
        .iter()
        .map(|input| {
            let mut path = output_path(input, output, multiple);
            let mut n = 1;
            while !used.insert(path.clone()) {
                n += 1;
                path = path.with_file_name(format!("{}-{}.redacted.pdf", file_stem(input), n));
            }
            path
        })
        .collect()
}

fn redacted_name(input: &Path) -> String {
    format!("{}.redacted.pdf", file_stem(input))
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn cmd_info(input: &Path, scrubber: &Scrubber) -> CliResult {
    let data = fs::read(input)?;
    let format = pdfscrub::preflight(&data)?;
    let info = scrubber.inspect(&data)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), format.version);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!(
        "{}: {}",
        "Protection".bold(),
        match info.protection {
            pdfscrub::Protection::None => "None",
            pdfscrub::Protection::Recoverable => "Encrypted (empty password)",
            pdfscrub::Protection::Locked => "Password required",
        }
    );

    if let Some(ref title) = info.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = info.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = info.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = info.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = info.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = info.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfscrub".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF email and phone number redaction tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_next_to_input() {
        let out = output_path(Path::new("docs/report.pdf"), None, false);
        assert_eq!(out, PathBuf::from("docs/report.redacted.pdf"));
    }

    #[test]
    fn test_output_path_explicit_file() {
        let out = output_path(Path::new("a.pdf"), Some(Path::new("clean.PDF")), false);
        assert_eq!(out, PathBuf::from("clean.PDF"));
    }

    #[test]
    fn test_output_path_directory_for_batch() {
        let out = output_path(Path::new("in/a.pdf"), Some(Path::new("out.pdf")), true);
        assert_eq!(out, PathBuf::from("out.pdf/a.redacted.pdf"));

        let out = output_path(Path::new("in/b.pdf"), Some(Path::new("out")), false);
        assert_eq!(out, PathBuf::from("out/b.redacted.pdf"));
    }

    #[test]
    fn test_output_paths_disambiguate_same_names() {
        let files = vec![
            PathBuf::from("a/cv.pdf"),
            PathBuf::from("b/cv.pdf"),
            PathBuf::from("c/cv.pdf"),
            PathBuf::from("c/letter.pdf"),
        ];
        let outs = output_paths(&files, Some(Path::new("out")));
        assert_eq!(
            outs,
            vec![
                PathBuf::from("out/cv.redacted.pdf"),
                PathBuf::from("out/cv-2.redacted.pdf"),
                PathBuf::from("out/cv-3.redacted.pdf"),
                PathBuf::from("out/letter.redacted.pdf"),
            ]
        );
    }

    #[test]
    fn test_output_paths_next_to_inputs_do_not_collide() {
        let files = vec![PathBuf::from("a/cv.pdf"), PathBuf::from("b/cv.pdf")];
        let outs = output_paths(&files, None);
        assert_eq!(outs[0], PathBuf::from("a/cv.redacted.pdf"));
        assert_eq!(outs[1], PathBuf::from("b/cv.redacted.pdf"));
    }

    #[test]
    fn test_scan_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        fs::write(&path, "just some notes").unwrap();

        let err = cmd_scan(&[path], &Scrubber::new(), None).unwrap_err();
        let err = err.downcast_ref::<pdfscrub::Error>().unwrap();
        assert_eq!(err.category(), pdfscrub::ErrorCategory::Format);
    }

    #[test]
    fn test_redact_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        fs::write(&path, b"").unwrap();

        let scrubber = Scrubber::new().skip_permission_lock();
        let err = cmd_redact(&[path], Some(dir.path()), &scrubber).unwrap_err();
        assert!(err.to_string().contains("1 of 1 files failed"));
    }

    #[test]
    fn test_cli_parses_redact() {
        let cli = Cli::try_parse_from([
            "pdfscrub", "redact", "a.pdf", "b.pdf", "-o", "out", "--skip-lock",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Redact {
                files, skip_lock, ..
            }) => {
                assert_eq!(files.len(), 2);
                assert!(skip_lock);
            }
            _ => panic!("expected redact command"),
        }
    }
}
