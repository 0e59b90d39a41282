//! Core traits for the security filter.
//!
//! This module defines the ExclusionPass trait that lets independent
//! admission checks be evaluated over the same candidate pool.

use crate::ranker::ScoredCandidate;
use anyhow::Result;
use graph_loader::UserId;

/// Per-request values every pass may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    pub requester_id: UserId,
}

impl FilterContext {
    pub fn new(requester_id: UserId) -> Self {
        Self { requester_id }
    }
}

/// A single admission check.
///
/// ## Design Note
/// - `Send + Sync` allows passes to run on rayon workers concurrently
/// - A pass only answers "exclude this candidate?"; it never sees the
///   other passes' answers, so pass order cannot change the outcome
/// - An `Err` from any pass makes the whole filter deny everything
pub trait ExclusionPass: Send + Sync {
    /// Returns the name of this pass (for logging/debugging)
    fn name(&self) -> &str;

    /// Decide whether `candidate` must be excluded.
    ///
    /// # Returns
    /// * `Ok(true)` - Exclude the candidate
    /// * `Ok(false)` - This pass has no objection
    /// * `Err` - The pass could not decide
    fn excludes(&self, candidate: &ScoredCandidate, context: &FilterContext) -> Result<bool>;
}
