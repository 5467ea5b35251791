//! CLI tool that lists the characters a file would lose in a text encoding.
//!
//! Exits with 0 when every file is compatible, 1 when any file has
//! incompatible characters (or a scan was cancelled), and 2 on errors.

mod logging;
mod pipeline;
mod report;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use incompat_scan_core::{ScanConfig, TextEncoding, QUICK_FIND_THRESHOLD};

use crate::pipeline::{discover_files, scan_files, PipelineConfig, PipelineResult};
use crate::report::{write_report, OutputFormat};

/// List characters that would be lost when saving files in a legacy encoding.
#[derive(Parser, Debug)]
#[command(name = "incompat-scan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Target encoding label (e.g. us-ascii, shift_jis, windows-1252)
    #[arg(long, short)]
    encoding: String,

    /// Only scan files with this extension when walking directories (repeatable)
    #[arg(long = "extension", short = 'x')]
    extensions: Vec<String>,

    /// Character count above which equal-length texts are compared pairwise
    #[arg(long, default_value_t = QUICK_FIND_THRESHOLD)]
    quick_find_threshold: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Cancel remaining scans as soon as one file has incompatible characters
    #[arg(long)]
    fail_fast: bool,
}

fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let encoding = TextEncoding::for_label(&args.encoding)?;

    let config = PipelineConfig {
        encoding,
        scan: ScanConfig {
            quick_find_threshold: args.quick_find_threshold,
        },
        fail_fast: args.fail_fast,
    };

    let files = discover_files(&args.paths, &args.extensions);
    if files.is_empty() {
        return Err(format!("No files found under {:?}", args.paths).into());
    }

    let reports = scan_files(files, &config);
    let result = PipelineResult::from_reports(&reports);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &reports, args.format, &encoding)?;

    if args.format == OutputFormat::Table {
        writeln!(out, "\n[summary]")?;
        writeln!(out, "  Encoding: {}", encoding)?;
        writeln!(out, "  Files scanned: {}", result.total_files)?;
        writeln!(out, "  Files with incompatible characters: {}", result.incompatible_files)?;
        writeln!(out, "  Incompatible characters: {}", result.total_findings)?;
        if result.cancelled_files > 0 {
            writeln!(out, "  Cancelled: {}", result.cancelled_files)?;
        }
        if result.failed_files > 0 {
            writeln!(out, "  Failed: {}", result.failed_files)?;
        }
    }
    out.flush()?;

    Ok(if result.failed_files > 0 {
        ExitCode::from(2)
    } else if result.incompatible_files > 0 || result.cancelled_files > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsString;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let argv = ["incompat-scan", "--encoding", "shift_jis", "notes.txt"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.quick_find_threshold, QUICK_FIND_THRESHOLD);
        assert_eq!(args.format, OutputFormat::Table);
        assert!(!args.fail_fast);
        assert!(args.extensions.is_empty());
    }

    #[test]
    fn test_unknown_encoding_is_an_error() {
        let args = Args::try_parse_from(["incompat-scan", "-e", "klingon", "notes.txt"]).unwrap();
        assert!(run(args).is_err());
    }

    #[test]
    fn test_decode_only_encoding_is_an_error() {
        let argv = ["incompat-scan", "-e", "iso-2022-kr", "notes.txt"];
        let args = Args::try_parse_from(argv).unwrap();
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("decode-only"));
    }

    #[test]
    fn test_run_reports_incompatible_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "a\nb€\nc").unwrap();

        let args = Args::try_parse_from([
            OsString::from("incompat-scan"),
            OsString::from("--encoding"),
            OsString::from("iso-8859-2"),
            OsString::from("--format"),
            OsString::from("json"),
            path.into_os_string(),
        ])
        .unwrap();
        assert_eq!(run(args).unwrap(), ExitCode::from(1));
    }
}
