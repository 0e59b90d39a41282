//! Per-search metrics.
//!
//! A `MetricsRecorder` collects stage timings, branch outcomes and errors
//! for one search. When disabled every method is a no-op and `finish`
//! returns `None`. Recording never changes what the search returns.

use crate::stage::SearchStage;
use serde::{Deserialize, Serialize};
use sources::CandidateBranch;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Outcome of one retrieval branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchMetrics {
    pub duration_ms: f64,
    /// Rows the provider returned (0 when it failed or timed out)
    pub count: usize,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl BranchMetrics {
    pub fn succeeded(duration: Duration, count: usize) -> Self {
        Self {
            duration_ms: millis(duration),
            count,
            ..Default::default()
        }
    }

    pub fn timed_out(duration: Duration) -> Self {
        Self {
            duration_ms: millis(duration),
            timed_out: true,
            error: Some("timed out".to_string()),
            ..Default::default()
        }
    }

    pub fn failed(duration: Duration, error: impl Into<String>) -> Self {
        Self {
            duration_ms: millis(duration),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Everything recorded for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub search_id: String,
    pub related: BranchMetrics,
    pub unknown: BranchMetrics,
    pub ranking_ms: f64,
    pub filtering_ms: f64,
    pub mixing_ms: f64,
    pub final_count: usize,
    pub errors: Vec<String>,
    /// Set only when the search ended in `Errored`
    pub failed_stage: Option<SearchStage>,
    pub total_ms: f64,
}

pub struct MetricsRecorder {
    started: Instant,
    report: Option<Mutex<MetricsReport>>,
}

impl MetricsRecorder {
    /// # Arguments
    /// * `search_id` - Correlation id echoed in the report
    /// * `enabled` - When false nothing is recorded
    pub fn new(search_id: impl Into<String>, enabled: bool) -> Self {
        let report = enabled.then(|| {
            Mutex::new(MetricsReport {
                search_id: search_id.into(),
                ..Default::default()
            })
        });
        Self {
            started: Instant::now(),
            report,
        }
    }

    pub fn disabled() -> Self {
        Self::new(String::new(), false)
    }

    pub fn is_enabled(&self) -> bool {
        self.report.is_some()
    }

    pub fn record_branch(&self, branch: CandidateBranch, metrics: BranchMetrics) {
        self.update(|report| match branch {
            CandidateBranch::Related => report.related = metrics,
            CandidateBranch::Unknown => report.unknown = metrics,
        });
    }

    /// Record how long a post-retrieval stage took. Other stages are ignored.
    pub fn record_stage(&self, stage: SearchStage, duration: Duration) {
        let ms = millis(duration);
        self.update(|report| match stage {
            SearchStage::Ranking => report.ranking_ms = ms,
            SearchStage::Filtering => report.filtering_ms = ms,
            SearchStage::Mixing => report.mixing_ms = ms,
            _ => {}
        });
    }

    pub fn record_error(&self, error: impl Into<String>) {
        let error = error.into();
        self.update(|report| report.errors.push(error));
    }

    pub fn record_final_count(&self, count: usize) {
        self.update(|report| report.final_count = count);
    }

    pub fn mark_failed(&self, stage: SearchStage) {
        self.update(|report| report.failed_stage = Some(stage));
    }

    /// Stamp the total duration and hand back the report.
    pub fn finish(&self) -> Option<MetricsReport> {
        let total_ms = millis(self.started.elapsed());
        self.report.as_ref().map(|report| {
            let mut report = lock(report);
            report.total_ms = total_ms;
            report.clone()
        })
    }

    fn update(&self, f: impl FnOnce(&mut MetricsReport)) {
        if let Some(report) = &self.report {
            f(&mut lock(report));
        }
    }
}

/// A panic elsewhere must not take metrics down with it.
fn lock(report: &Mutex<MetricsReport>) -> MutexGuard<'_, MetricsReport> {
    report.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
