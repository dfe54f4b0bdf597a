use crate::cli::Cli;
use anyhow::{Context, Result};
use fb2info::{format_metadata, process, CancelToken, ExtractionError, Outcome};
use rayon::prelude::*;
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Shown for files whose name is not an FB2 container
const NON_FB2: &str = "Non FB2 file.";

struct FileReport {
    path: PathBuf,
    result: std::result::Result<Outcome, ExtractionError>,
}

/// Inspect every input and emit the report. Returns `false` when any file failed.
pub fn run(cli: &Cli) -> Result<bool> {
    let options = cli.extract_options();
    let cancel = CancelToken::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.jobs.unwrap_or(0))
        .build()
        .context("Failed to start worker pool")?;

    // par_iter keeps input order in the collected Vec
    let reports: Vec<FileReport> = pool.install(|| {
        cli.inputs
            .par_iter()
            .map(|path| {
                let result = process(path, &options, &cancel);
                if let Err(e) = &result {
                    log_failure(path, e);
                    if cli.fail_fast {
                        cancel.cancel();
                    }
                }
                FileReport {
                    path: path.clone(),
                    result,
                }
            })
            .collect()
    });

    let mut content = String::new();
    for report in &reports {
        if cli.json {
            content.push_str(&render_json(report)?);
            content.push('\n');
        } else {
            content.push_str(&render_text(report));
            content.push_str("\n\n");
        }
    }

    match &cli.output {
        Some(path) => write_report(path, &content)?,
        None => print!("{}", content),
    }

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    let skipped = reports
        .iter()
        .filter(|r| matches!(r.result, Ok(Outcome::Cancelled)))
        .count();
    log::info!(
        "Inspected {} files{}{}",
        reports.len(),
        if failed > 0 {
            format!(", {} failed", failed)
        } else {
            String::new()
        },
        if skipped > 0 {
            format!(", {} skipped", skipped)
        } else {
            String::new()
        },
    );

    Ok(failed == 0)
}

fn log_failure(path: &Path, err: &ExtractionError) {
    log::warn!("{}: {}", path.display(), err);
    let mut cause = err.source();
    while let Some(inner) = cause {
        log::warn!("  caused by: {}", inner);
        cause = inner.source();
    }
}

fn render_text(report: &FileReport) -> String {
    let body = match &report.result {
        Ok(Outcome::Extracted(meta)) => format_metadata(meta),
        Ok(Outcome::Unsupported) => NON_FB2.to_string(),
        Ok(Outcome::Cancelled) => "Skipped.".to_string(),
        Err(e) => e.render(),
    };

    let indented: Vec<String> = body.lines().map(|line| format!("  {}", line)).collect();
    format!("{}\n{}", report.path.display(), indented.join("\n"))
}

fn render_json(report: &FileReport) -> Result<String> {
    let path = report.path.display().to_string();
    let value = match &report.result {
        Ok(Outcome::Extracted(meta)) => json!({
            "path": path,
            "status": "ok",
            "metadata": meta,
            "author": meta.author(),
            "sequence": meta.sequence(),
        }),
        Ok(Outcome::Unsupported) => json!({ "path": path, "status": "unsupported" }),
        Ok(Outcome::Cancelled) => json!({ "path": path, "status": "skipped" }),
        Err(e) => json!({
            "path": path,
            "status": "error",
            "code": e.code(),
            "message": e.render(),
        }),
    };
    serde_json::to_string(&value).context("Failed to serialize report")
}

fn write_report(output_path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(output_path, content)
        .with_context(|| format!("Failed to write report: {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb2info::BookMetadata;

    fn report(result: std::result::Result<Outcome, ExtractionError>) -> FileReport {
        FileReport {
            path: PathBuf::from("dune.fb2"),
            result,
        }
    }

    #[test]
    fn test_text_for_extracted_book() {
        let meta = BookMetadata {
            title: Some("Dune".to_string()),
            first_name: Some("Frank".to_string()),
            last_name: Some("Herbert".to_string()),
            sequence_name: Some("Dune Chronicles".to_string()),
            sequence_number: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            render_text(&report(Ok(Outcome::Extracted(meta)))),
            "dune.fb2\n  Title: Dune\n  Author: Frank Herbert\n  Sequence: Dune Chronicles - 1"
        );
    }

    #[test]
    fn test_text_for_unsupported() {
        assert_eq!(
            render_text(&report(Ok(Outcome::Unsupported))),
            "dune.fb2\n  Non FB2 file."
        );
    }

    #[test]
    fn test_json_for_failure() {
        let err = ExtractionError::NoFb2EntryFound {
            path: PathBuf::from("dune.fb2.zip"),
        };
        let line = render_json(&report(Err(err))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], 9);
    }
}
