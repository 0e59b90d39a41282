//! # Search Orchestrator
//!
//! This module coordinates one people search from raw term to results:
//! 1. Validate and normalize the term
//! 2. Retrieve related and unknown candidates in parallel, each under its
//!    own timeout (a failed or slow branch degrades to empty)
//! 3. Rank each branch with its weight table
//! 4. Screen the merged pool with the security filter (fail-closed)
//! 5. De-duplicate and interleave the surviving branches
//! 6. Cap and project to the public result shape
//!
//! Steps 3-6 are CPU-bound and run together on a blocking worker. If
//! anything escapes them the search ends `Errored` and the caller only
//! sees a generic failure; detail goes to the log and the metrics report.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{ConfigError, SearchConfig};
use graph_loader::{SocialGraph, UserId};
use pipeline::{
    BranchMetrics, FilterContext, MetricsRecorder, MetricsReport, Mixer, PatternSanitizer,
    PublicCandidate, Ranker, SearchStage, SecurityFilter, TermSanitizer, TermValidator,
    ValidationError,
};
use sources::{
    CandidateBranch, CandidateProvider, CandidateQuery, RawCandidate, RelatedCandidates,
    UnknownCandidates,
};

/// Per-call switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Attach a `MetricsReport` to the response (or the error)
    pub metrics_enabled: bool,
    /// Attach score and branch to every result
    pub diagnostics: bool,
}

/// What a successful search returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search_id: String,
    pub results: Vec<PublicCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsReport>,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Search could not be completed (reference {search_id})")]
    Internal {
        search_id: String,
        metrics: Option<MetricsReport>,
    },
}

impl SearchError {
    pub fn metrics(&self) -> Option<&MetricsReport> {
        match self {
            SearchError::Validation(_) => None,
            SearchError::Internal { metrics, .. } => metrics.as_ref(),
        }
    }
}

/// Tracks the current stage so a failure can name where it happened.
struct StageTracker {
    search_id: String,
    stage: Mutex<SearchStage>,
}

impl StageTracker {
    fn new(search_id: &str) -> Self {
        Self {
            search_id: search_id.to_string(),
            stage: Mutex::new(SearchStage::Validating),
        }
    }

    /// Move to `to` if the lifecycle allows it; otherwise log and stay put.
    fn advance(&self, to: SearchStage) -> bool {
        let mut stage = self.stage.lock().unwrap_or_else(|p| p.into_inner());
        if !stage.can_advance_to(to) {
            warn!(search_id = %self.search_id, "Ignoring illegal stage transition {} -> {}", *stage, to);
            return false;
        }
        debug!(search_id = %self.search_id, "{} -> {}", *stage, to);
        *stage = to;
        true
    }

    fn current(&self) -> SearchStage {
        *self.stage.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Main orchestrator that coordinates the search pipeline
#[derive(Clone)]
pub struct SearchOrchestrator {
    related: Arc<dyn CandidateProvider>,
    unknown: Arc<dyn CandidateProvider>,
    sanitizer: Arc<dyn TermSanitizer>,
    config: Arc<RwLock<Arc<SearchConfig>>>,
}

impl SearchOrchestrator {
    /// Create an orchestrator around already-constructed providers
    ///
    /// # Arguments
    /// * `related` - Provider for the related branch
    /// * `unknown` - Provider for the unknown branch
    /// * `config` - Validated before use
    pub fn new(
        related: Arc<dyn CandidateProvider>,
        unknown: Arc<dyn CandidateProvider>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate().context("Invalid search config")?;
        let sanitizer = PatternSanitizer::new().context("Failed to compile term sanitizer")?;
        Ok(Self {
            related,
            unknown,
            sanitizer: Arc::new(sanitizer),
            config: Arc::new(RwLock::new(Arc::new(config))),
        })
    }

    /// Create an orchestrator backed by the graph providers
    ///
    /// Provider base weights come from `config.providers` and are fixed for
    /// the orchestrator's lifetime; `update_config` does not rebuild providers.
    pub fn from_graph(graph: Arc<SocialGraph>, config: SearchConfig) -> Result<Self> {
        let weights = config.providers;
        let related = RelatedCandidates::new(graph.clone())
            .with_mutual_weight(weights.mutual_weight)
            .with_one_way_weight(weights.one_way_weight);
        let unknown = UnknownCandidates::new(graph)
            .with_shared_connection_weight(weights.shared_connection_weight);
        Self::new(Arc::new(related), Arc::new(unknown), config)
    }

    /// Replace the term sanitizer (builder pattern)
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn TermSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// The config new searches will use
    pub fn config(&self) -> Arc<SearchConfig> {
        self.config
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Swap in a new config. Searches already running keep their snapshot.
    pub fn update_config(&self, config: SearchConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.config.write().unwrap_or_else(|p| p.into_inner()) = Arc::new(config);
        info!("Search config updated");
        Ok(())
    }

    /// Validate a term with the current bounds without searching
    pub fn validator(&self) -> TermValidator {
        TermValidator::new(self.config().term, self.sanitizer.clone())
    }

    /// Main entry point: search for people matching `term`
    ///
    /// # Arguments
    /// * `term` - Raw, unvalidated search term
    /// * `requester_id` - The user searching
    /// * `options` - Metrics and diagnostics switches
    ///
    /// # Returns
    /// Ranked, filtered, de-duplicated public results
    #[instrument(skip(self, term, options))]
    pub async fn search(
        &self,
        term: &str,
        requester_id: UserId,
        options: SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        let start_time = Instant::now();
        let config = self.config();
        let search_id = Uuid::new_v4().to_string();
        let metrics = Arc::new(MetricsRecorder::new(search_id.clone(), options.metrics_enabled));
        let stage = Arc::new(StageTracker::new(&search_id));

        let validated = TermValidator::new(config.term, self.sanitizer.clone())
            .validate(term)
            .inspect_err(|e| info!(search_id = %search_id, "Rejected search term: {}", e.code))?;

        stage.advance(SearchStage::Retrieving);
        let query = CandidateQuery::new(validated.term, requester_id, config.provider_limit);
        let timeout = config.provider_timeout();
        let (related_rows, unknown_rows) = tokio::join!(
            fetch_branch(self.related.as_ref(), CandidateBranch::Related, &query, timeout, &metrics),
            fetch_branch(self.unknown.as_ref(), CandidateBranch::Unknown, &query, timeout, &metrics)
        );
        info!(
            "Retrieved {} related and {} unknown candidates",
            related_rows.len(),
            unknown_rows.len()
        );

        let outcome = tokio::task::spawn_blocking({
            let config = config.clone();
            let metrics = metrics.clone();
            let stage = stage.clone();
            move || {
                run_stages(
                    &config,
                    requester_id,
                    options.diagnostics,
                    related_rows,
                    unknown_rows,
                    &stage,
                    &metrics,
                )
            }
        })
        .await;

        let results = match outcome {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => return Err(fail(&search_id, &stage, &metrics, format!("{:#}", e))),
            Err(e) => return Err(fail(&search_id, &stage, &metrics, format!("stage task panicked: {}", e))),
        };

        stage.advance(SearchStage::Done);
        metrics.record_final_count(results.len());
        info!(
            "Search {} returned {} results in {:.2?}",
            search_id,
            results.len(),
            start_time.elapsed()
        );

        Ok(SearchResponse {
            search_id,
            results,
            metrics: metrics.finish(),
        })
    }
}

/// Run one provider under its timeout. Never fails: errors become empty.
async fn fetch_branch(
    provider: &dyn CandidateProvider,
    branch: CandidateBranch,
    query: &CandidateQuery,
    timeout: Duration,
    metrics: &MetricsRecorder,
) -> Vec<RawCandidate> {
    let started = Instant::now();
    match tokio::time::timeout(timeout, provider.process(query)).await {
        Ok(Ok(rows)) => {
            debug!("{} returned {} rows", provider.name(), rows.len());
            metrics.record_branch(branch, BranchMetrics::succeeded(started.elapsed(), rows.len()));
            rows
        }
        Ok(Err(e)) => {
            warn!("{} failed, continuing without {} branch: {:#}", provider.name(), branch, e);
            metrics.record_branch(branch, BranchMetrics::failed(started.elapsed(), format!("{:#}", e)));
            metrics.record_error(format!("{}: {:#}", provider.name(), e));
            Vec::new()
        }
        Err(_) => {
            warn!(
                "{} timed out after {:?}, continuing without {} branch",
                provider.name(),
                timeout,
                branch
            );
            metrics.record_branch(branch, BranchMetrics::timed_out(started.elapsed()));
            metrics.record_error(format!("{}: timed out", provider.name()));
            Vec::new()
        }
    }
}

/// Rank, filter, mix and project. Runs on a blocking worker.
fn run_stages(
    config: &SearchConfig,
    requester_id: UserId,
    diagnostics: bool,
    related_rows: Vec<RawCandidate>,
    unknown_rows: Vec<RawCandidate>,
    stage: &StageTracker,
    metrics: &MetricsRecorder,
) -> Result<Vec<PublicCandidate>> {
    stage.advance(SearchStage::Ranking);
    let started = Instant::now();
    let ranker = Ranker::new(config.related_weights, config.unknown_weights, config.thresholds);
    let related = ranker.rank(related_rows, CandidateBranch::Related);
    let unknown = ranker.rank(unknown_rows, CandidateBranch::Unknown);
    metrics.record_stage(SearchStage::Ranking, started.elapsed());

    stage.advance(SearchStage::Filtering);
    let started = Instant::now();
    let filter = SecurityFilter::new(config.security.clone(), FilterContext::new(requester_id));
    let pool = related.into_iter().chain(unknown).collect();
    let survivors = filter.screen(pool).unwrap_or_else(|e| {
        warn!("Security filter failed closed: {}", e);
        metrics.record_error(format!("security filter: {}", e));
        Vec::new()
    });
    metrics.record_stage(SearchStage::Filtering, started.elapsed());

    stage.advance(SearchStage::Mixing);
    let started = Instant::now();
    let max_results = config.security.max_results;
    let (related, unknown): (Vec<_>, Vec<_>) = survivors
        .into_iter()
        .partition(|c| c.branch == CandidateBranch::Related);
    let mixed = Mixer::new(config.mixing_coefficient)
        .with_limit(max_results)
        .mix(related, unknown)?;
    metrics.record_stage(SearchStage::Mixing, started.elapsed());

    Ok(mixed
        .iter()
        .map(|c| PublicCandidate::project(c, diagnostics))
        .collect())
}

/// Move the search to `Errored` and build the caller-facing error.
fn fail(search_id: &str, stage: &StageTracker, metrics: &MetricsRecorder, detail: String) -> SearchError {
    let failed = stage.current();
    error!(search_id = %search_id, stage = %failed, "Search failed: {}", detail);
    metrics.mark_failed(failed);
    metrics.record_error(format!("{} stage failed: {}", failed, detail));
    stage.advance(SearchStage::Errored);
    SearchError::Internal {
        search_id: search_id.to_string(),
        metrics: metrics.finish(),
    }
}
