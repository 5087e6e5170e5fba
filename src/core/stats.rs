use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::core::pipeline::{WrapOutcome, WrapResult};
use crate::error::ErrorKind;

/// Run-level statistics folded from per-file results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_files: usize,
    pub modified_files: usize,
    pub unchanged_files: usize,
    pub error_files: usize,
    pub wrapped_nodes: usize,
    /// Sum of per-file processing time.
    #[serde(serialize_with = "as_millis")]
    pub total_time: Duration,
    /// Elapsed time for the whole run.
    #[serde(serialize_with = "as_millis")]
    pub wall_time: Duration,
    #[serde(serialize_with = "as_millis")]
    pub average_time: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p50: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p90: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p99: Duration,
    pub worker_count: usize,
    /// Files handled per worker index.
    pub per_worker: BTreeMap<usize, usize>,
    pub errors_by_kind: BTreeMap<&'static str, usize>,
}

impl AggregateStats {
    pub fn from_results(results: &[WrapResult], worker_count: usize, wall_time: Duration) -> Self {
        let mut stats = AggregateStats {
            total_files: results.len(),
            worker_count,
            wall_time,
            ..Default::default()
        };

        let mut durations = Vec::with_capacity(results.len());
        let mut by_kind: BTreeMap<ErrorKind, usize> = BTreeMap::new();
        for result in results {
            match &result.outcome {
                WrapOutcome::Modified { keys } => {
                    stats.modified_files += 1;
                    stats.wrapped_nodes += keys.len();
                }
                WrapOutcome::Unchanged => stats.unchanged_files += 1,
                WrapOutcome::Error(err) => {
                    stats.error_files += 1;
                    *by_kind.entry(err.kind()).or_default() += 1;
                }
            }
            if let Some(worker) = result.worker {
                *stats.per_worker.entry(worker).or_default() += 1;
            }
            stats.total_time += result.elapsed;
            durations.push(result.elapsed);
        }

        durations.sort();
        if !durations.is_empty() {
            stats.average_time = stats.total_time / durations.len() as u32;
        }
        stats.p50 = percentile(&durations, 50.0);
        stats.p90 = percentile(&durations, 90.0);
        stats.p99 = percentile(&durations, 99.0);
        stats.errors_by_kind = by_kind.into_iter().map(|(k, v)| (k.as_str(), v)).collect();
        stats
    }

    /// Every file is counted exactly once.
    pub fn is_consistent(&self) -> bool {
        self.modified_files + self.unchanged_files + self.error_files == self.total_files
    }
}

/// Nearest-rank percentile over sorted durations.
pub fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64() * 1000.0)
}
