//! Spam heuristics.
//!
//! A candidate is treated as spam when any of these hold:
//! - follower count above the threshold together with an auto-generated
//!   looking username (under 3 chars, over 30 chars, or all digits)
//! - display name is a reserved generic word
//! - the requester muted them (when `exclude_muted` is on)

use crate::ranker::ScoredCandidate;
use crate::traits::{ExclusionPass, FilterContext};
use anyhow::Result;
use std::collections::HashSet;

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 30;

pub struct SpamPass {
    follower_threshold: u64,
    /// Lowercased
    reserved_display_names: HashSet<String>,
    exclude_muted: bool,
}

impl SpamPass {
    pub fn new<S: AsRef<str>>(follower_threshold: u64, reserved_display_names: &[S]) -> Self {
        Self {
            follower_threshold,
            reserved_display_names: reserved_display_names
                .iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
            exclude_muted: true,
        }
    }

    /// Set whether muted candidates count as spam (builder pattern).
    pub fn with_exclude_muted(mut self, exclude_muted: bool) -> Self {
        self.exclude_muted = exclude_muted;
        self
    }

    fn generated_username(username: &str) -> bool {
        let chars = username.chars().count();
        chars < MIN_USERNAME_CHARS
            || chars > MAX_USERNAME_CHARS
            || (!username.is_empty() && username.chars().all(|c| c.is_ascii_digit()))
    }
}

impl ExclusionPass for SpamPass {
    fn name(&self) -> &str {
        "Spam"
    }

    fn excludes(&self, candidate: &ScoredCandidate, _context: &FilterContext) -> Result<bool> {
        let c = &candidate.candidate;
        let bot_like = c.stats.follower_count > self.follower_threshold
            && Self::generated_username(&c.username);
        let reserved = self
            .reserved_display_names
            .contains(&c.display_name.trim().to_lowercase());
        Ok(bot_like || reserved || (self.exclude_muted && c.muted))
    }
}
