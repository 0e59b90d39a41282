//! Block-graph exclusion.

use crate::ranker::ScoredCandidate;
use crate::traits::{ExclusionPass, FilterContext};
use anyhow::Result;

/// Excludes anyone on either side of a block with the requester.
pub struct BlockedUserPass;

impl ExclusionPass for BlockedUserPass {
    fn name(&self) -> &str {
        "BlockedUser"
    }

    fn excludes(&self, candidate: &ScoredCandidate, _context: &FilterContext) -> Result<bool> {
        Ok(candidate.candidate.blocked || candidate.candidate.blocks_requester)
    }
}
