//! Rendering of scan reports.

use std::error::Error;
use std::io::Write;

use clap::ValueEnum;
use incompat_scan_core::{IncompatibleCharacter, TextEncoding};
use serde::Serialize;

use crate::pipeline::{FileOutcome, FileReport};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table per file
    Table,
    /// JSON array with one object per file
    Json,
    /// One CSV row per incompatible character
    Csv,
}

/// A file report in JSON format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFileReport<'a> {
    path: String,
    encoding: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    incompatible_characters: &'a [IncompatibleCharacter],
}

fn status(outcome: &FileOutcome) -> &'static str {
    match outcome {
        FileOutcome::Scanned(found) if found.is_empty() => "compatible",
        FileOutcome::Scanned(_) => "incompatible",
        FileOutcome::Cancelled => "cancelled",
        FileOutcome::Failed(_) => "failed",
    }
}

/// Show invisible characters such as line separators as escapes.
fn visible(character: &str) -> String {
    character.escape_debug().to_string()
}

fn write_table<W: Write>(
    out: &mut W,
    reports: &[FileReport],
    encoding: &TextEncoding,
) -> std::io::Result<()> {
    for report in reports {
        match &report.outcome {
            FileOutcome::Scanned(found) if found.is_empty() => {}
            FileOutcome::Scanned(found) => {
                writeln!(
                    out,
                    "{} ({} incompatible characters in {})",
                    report.path.display(),
                    found.len(),
                    encoding
                )?;
                writeln!(out, "{:>6}\t{:>8}\t{}\t{}", "Line", "Location", "Char", "Converted")?;
                for f in found {
                    writeln!(
                        out,
                        "{:>6}\t{:>8}\t{}\t{}",
                        f.line_number(),
                        f.location(),
                        visible(f.character()),
                        f.converted_character().map(visible).unwrap_or_default()
                    )?;
                }
            }
            FileOutcome::Cancelled => writeln!(out, "{}: scan cancelled", report.path.display())?,
            FileOutcome::Failed(e) => writeln!(out, "{}: error: {}", report.path.display(), e)?,
        }
    }
    Ok(())
}

fn write_json<W: Write>(
    out: &mut W,
    reports: &[FileReport],
    encoding: &TextEncoding,
) -> Result<(), Box<dyn Error>> {
    let records: Vec<JsonFileReport<'_>> = reports
        .iter()
        .map(|report| JsonFileReport {
            path: report.path.to_string_lossy().to_string(),
            encoding: encoding.name(),
            status: status(&report.outcome),
            error: match &report.outcome {
                FileOutcome::Failed(e) => Some(e.as_str()),
                _ => None,
            },
            incompatible_characters: report.findings(),
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv<W: Write>(out: &mut W, reports: &[FileReport]) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["path", "line", "location", "character", "converted"])?;
    for report in reports {
        let path = report.path.to_string_lossy();
        for f in report.findings() {
            let line = f.line_number().to_string();
            let location = f.location().to_string();
            writer.write_record([
                &*path,
                line.as_str(),
                location.as_str(),
                f.character(),
                f.converted_character().unwrap_or(""),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write all reports in the requested format.
pub fn write_report<W: Write>(
    out: &mut W,
    reports: &[FileReport],
    format: OutputFormat,
    encoding: &TextEncoding,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Table => write_table(out, reports, encoding)?,
        OutputFormat::Json => write_json(out, reports, encoding)?,
        OutputFormat::Csv => write_csv(out, reports)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn reports() -> Vec<FileReport> {
        vec![
            FileReport {
                path: PathBuf::from("notes.txt"),
                outcome: FileOutcome::Scanned(vec![
                    IncompatibleCharacter::new("é", Some("?".to_string()), 3, 1),
                    IncompatibleCharacter::new("\u{2028}", None, 9, 2),
                ]),
            },
            FileReport {
                path: PathBuf::from("clean.txt"),
                outcome: FileOutcome::Scanned(Vec::new()),
            },
            FileReport {
                path: PathBuf::from("gone.txt"),
                outcome: FileOutcome::Failed("not found".to_string()),
            },
        ]
    }

    fn render(format: OutputFormat) -> String {
        let mut out = Vec::new();
        write_report(&mut out, &reports(), format, &TextEncoding::Ascii).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_table() {
        let table = render(OutputFormat::Table);
        assert!(table.contains("notes.txt (2 incompatible characters in US-ASCII)"));
        assert!(table.contains("     1\t       3\té\t?"));
        assert!(table.contains("     2\t       9\t\\u{2028}\t"));
        assert!(!table.contains("clean.txt"));
        assert!(table.contains("gone.txt: error: not found"));
    }

    #[test]
    fn test_json() {
        let json: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json)).unwrap();
        assert_eq!(json[0]["status"], "incompatible");
        assert_eq!(json[0]["encoding"], "US-ASCII");
        assert_eq!(json[0]["incompatibleCharacters"][0]["character"], "é");
        assert_eq!(json[0]["incompatibleCharacters"][1]["lineNumber"], 2);
        assert_eq!(json[1]["status"], "compatible");
        assert_eq!(json[2]["error"], "not found");
    }

    #[test]
    fn test_csv() {
        let csv = render(OutputFormat::Csv);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "path,line,location,character,converted");
        assert_eq!(lines[1], "notes.txt,1,3,é,?");
        assert_eq!(lines.len(), 3);
    }
}
