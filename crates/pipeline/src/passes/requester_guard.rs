//! Exclusions that hold no matter how the filter is configured.

use crate::ranker::ScoredCandidate;
use crate::traits::{ExclusionPass, FilterContext};
use anyhow::Result;

/// Excludes the requester and anyone who blocks the requester.
///
/// Always installed by `SecurityFilter`; toggles do not reach it.
pub struct RequesterGuardPass;

impl ExclusionPass for RequesterGuardPass {
    fn name(&self) -> &str {
        "RequesterGuard"
    }

    fn excludes(&self, candidate: &ScoredCandidate, context: &FilterContext) -> Result<bool> {
        Ok(candidate.id() == context.requester_id || candidate.candidate.blocks_requester)
    }
}
