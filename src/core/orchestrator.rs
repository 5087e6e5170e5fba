//! Run driver: scan, dispatch to workers, aggregate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::WrapConfig;
use crate::core::pipeline::{WrapResult, WrapTask, process};
use crate::core::pool::WorkerPool;
use crate::core::scanner::{LoadedFile, Scanner};
use crate::core::stats::AggregateStats;
use crate::error::WrapError;

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub stats: AggregateStats,
    pub modified: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, WrapError)>,
    /// Per-file results sorted by path.
    pub results: Vec<WrapResult>,
    pub skipped_paths: usize,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Wrap every matching file under `config.root`.
///
/// Per-file failures are reported in the summary and never abort the run.
/// Only configuration problems return `Err`.
pub fn run(config: WrapConfig) -> Result<RunSummary, WrapError> {
    let started = Instant::now();
    let scanner = Scanner::new(&config)?;
    let scan = scanner.scan();

    if scan.files.is_empty() {
        info!(root = %config.root.display(), "no source files matched");
        return Ok(RunSummary {
            stats: AggregateStats::from_results(&[], config.workers, started.elapsed()),
            skipped_paths: scan.skipped_count,
            dry_run: config.dry_run,
            ..Default::default()
        });
    }

    let pool = WorkerPool::new(config.workers)?;
    info!(
        files = scan.files.len(),
        workers = pool.size(),
        mode = %config.mode,
        dry_run = config.dry_run,
        "starting wrap run"
    );

    let config = Arc::new(config);
    let mut results = Vec::with_capacity(scan.files.len());
    let mut unprocessed = Vec::new();
    let tasks = scan
        .files
        .into_iter()
        .filter_map(|path| match Scanner::load(&path, config.max_file_bytes) {
            Ok(LoadedFile::Text(text)) => Some(WrapTask {
                path,
                text,
                config: Arc::clone(&config),
            }),
            Ok(LoadedFile::Oversized(size)) => {
                let result = WrapResult::oversized(path, size, config.max_file_bytes);
                for diagnostic in &result.diagnostics {
                    warn!(path = %result.path.display(), "{diagnostic}");
                }
                unprocessed.push(result);
                None
            }
            Err(err) => {
                warn!("{err}");
                unprocessed.push(WrapResult::failed(path, err));
                None
            }
        });
    let completed = pool.run(tasks, |worker, task| process(task, worker));

    results.extend(completed.into_iter().map(|c| c.result));
    results.append(&mut unprocessed);
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let stats = AggregateStats::from_results(&results, pool.size(), started.elapsed());
    let modified = results
        .iter()
        .filter(|r| r.is_modified())
        .map(|r| r.path.clone())
        .collect();
    let failures = results
        .iter()
        .filter_map(|r| r.error().map(|e| (r.path.clone(), e.clone())))
        .collect();

    info!(
        modified = stats.modified_files,
        unchanged = stats.unchanged_files,
        errors = stats.error_files,
        wall_ms = stats.wall_time.as_millis() as u64,
        "wrap run finished"
    );

    Ok(RunSummary {
        stats,
        modified,
        failures,
        results,
        skipped_paths: scan.skipped_count,
        dry_run: config.dry_run,
    })
}
