//! The seam between the search pipeline and whatever produces raw rows.
//!
//! The pipeline never knows whether rows come from a database, a search
//! index or the in-memory fixture graph; it only awaits `process`.

use crate::types::{CandidateBranch, CandidateQuery, RawCandidate};
use anyhow::Result;
use async_trait::async_trait;

/// Core trait for candidate retrieval.
///
/// ## Design Note
/// - `Send + Sync` lets the orchestrator hold providers behind `Arc` and
///   drive both branches concurrently
/// - Errors are plain `anyhow` errors: the orchestrator degrades a failed
///   branch to an empty list and never inspects the cause
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Returns the name of this provider (for logging/metrics)
    fn name(&self) -> &str;

    /// The branch this provider feeds
    fn branch(&self) -> CandidateBranch;

    /// Retrieve raw candidates for the query.
    ///
    /// # Returns
    /// * `Ok(Vec<RawCandidate>)` - Rows in provider order (used to break score ties)
    /// * `Err` - If retrieval fails
    async fn process(&self, query: &CandidateQuery) -> Result<Vec<RawCandidate>>;
}
