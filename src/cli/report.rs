//! Report formatting and printing utilities.
//!
//! Kept apart from the engine so twrap can be used as a library.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use super::args::OutputFormat;
use crate::core::orchestrator::RunSummary;
use crate::core::pipeline::{WrapOutcome, WrapResult};
use crate::core::stats::AggregateStats;
use crate::utils::relative_slash_path;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Set to hide timings, for stable output in tests.
const DISABLE_TIMING_ENV: &str = "TWRAP_DISABLE_TIMING";

pub fn print(summary: &RunSummary, format: OutputFormat, root: &Path) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => {
            print_text_to(summary, root, timing_enabled(), &mut stdout);
            Ok(())
        }
        OutputFormat::Json => print_json_to(summary, root, &mut stdout),
    }
}

fn timing_enabled() -> bool {
    env::var_os(DISABLE_TIMING_ENV).is_none()
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// Print the human-readable report.
pub fn print_text_to<W: Write>(summary: &RunSummary, root: &Path, timing: bool, writer: &mut W) {
    let modified: Vec<(String, usize)> = summary
        .results
        .iter()
        .filter_map(|r| match &r.outcome {
            WrapOutcome::Modified { keys } => Some((relative_slash_path(&r.path, root), keys.len())),
            _ => None,
        })
        .collect();

    let label = if summary.dry_run {
        "would wrap".yellow().bold()
    } else {
        "wrapped".green().bold()
    };
    let path_width = modified
        .iter()
        .map(|(path, _)| UnicodeWidthStr::width(path.as_str()))
        .max()
        .unwrap_or(0);
    for (path, count) in &modified {
        let padding = path_width - UnicodeWidthStr::width(path.as_str());
        let _ = writeln!(
            writer,
            "{} {}{:padding$}  {} {}",
            label,
            path,
            "",
            count,
            plural(*count, "node", "nodes"),
            padding = padding
        );
    }

    for result in &summary.results {
        print_problems(result, root, writer);
    }

    print_summary(&summary.stats, summary.dry_run, writer);
    if timing && summary.stats.total_files > 0 {
        print_timing(&summary.stats, writer);
    }
}

fn print_problems<W: Write>(result: &WrapResult, root: &Path, writer: &mut W) {
    let path = relative_slash_path(&result.path, root);
    if let Some(err) = result.error() {
        let _ = writeln!(
            writer,
            "{}: {}",
            format!("error[{}]", err.kind().as_str()).bold().red(),
            err.message()
        );
        let _ = writeln!(writer, "  {} {}", "-->".blue(), path);
    }
    for diagnostic in &result.diagnostics {
        let _ = writeln!(writer, "{} {}", "warning:".bold().yellow(), diagnostic);
        let _ = writeln!(writer, "  {} {}", "-->".blue(), path);
    }
}

fn print_summary<W: Write>(stats: &AggregateStats, dry_run: bool, writer: &mut W) {
    let files = stats.total_files;
    if stats.error_files > 0 {
        let _ = writeln!(
            writer,
            "\n{} {} of {} {} failed ({} modified, {} unchanged)",
            FAILURE_MARK.red(),
            stats.error_files,
            files,
            plural(files, "file", "files"),
            stats.modified_files,
            stats.unchanged_files
        );
        return;
    }

    let msg = if stats.modified_files == 0 {
        format!(
            "Checked {} source {} - nothing to wrap",
            files,
            plural(files, "file", "files")
        )
    } else {
        format!(
            "{} {} {} in {} of {} {}",
            if dry_run { "Would wrap" } else { "Wrapped" },
            stats.wrapped_nodes,
            plural(stats.wrapped_nodes, "node", "nodes"),
            stats.modified_files,
            files,
            plural(files, "file", "files")
        )
    };
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), msg.green());
}

fn print_timing<W: Write>(stats: &AggregateStats, writer: &mut W) {
    let ms = |d: std::time::Duration| d.as_secs_f64() * 1000.0;
    let _ = writeln!(
        writer,
        "{}",
        format!(
            "Finished in {:.2}s on {} {} (avg {:.1}ms, p50 {:.1}ms, p90 {:.1}ms, p99 {:.1}ms)",
            stats.wall_time.as_secs_f64(),
            stats.worker_count,
            plural(stats.worker_count, "worker", "workers"),
            ms(stats.average_time),
            ms(stats.p50),
            ms(stats.p90),
            ms(stats.p99)
        )
        .dimmed()
    );
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFile {
    path: String,
    outcome: &'static str,
    keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    worker: Option<usize>,
    elapsed_ms: f64,
    diagnostics: Vec<String>,
}

#[derive(Serialize)]
struct JsonError {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    root: PathBuf,
    dry_run: bool,
    files: Vec<JsonFile>,
    stats: &'a AggregateStats,
}

/// Print the machine-readable report.
pub fn print_json_to<W: Write>(summary: &RunSummary, root: &Path, writer: &mut W) -> Result<()> {
    let files = summary
        .results
        .iter()
        .map(|r| JsonFile {
            path: relative_slash_path(&r.path, root),
            outcome: r.outcome.as_str(),
            keys: match &r.outcome {
                WrapOutcome::Modified { keys } => keys.clone(),
                _ => Vec::new(),
            },
            error: r.error().map(|e| JsonError {
                kind: e.kind().as_str(),
                message: e.message().to_string(),
            }),
            worker: r.worker,
            elapsed_ms: r.elapsed.as_secs_f64() * 1000.0,
            diagnostics: r.diagnostics.clone(),
        })
        .collect();

    let report = JsonReport {
        root: root.to_path_buf(),
        dry_run: summary.dry_run,
        files,
        stats: &summary.stats,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    writeln!(writer, "{}", json).context("Failed to write report")?;
    Ok(())
}
