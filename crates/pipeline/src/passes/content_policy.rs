//! Name-based content policy.

use crate::ranker::ScoredCandidate;
use crate::traits::{ExclusionPass, FilterContext};
use anyhow::Result;

/// Characters never allowed in a name shown in search results
const MARKUP_CHARS: &[char] = &['<', '>', '{', '}', '[', ']', '\\', '"', ';'];

/// Excludes candidates whose username or display name carries a
/// suspicious substring or markup/control characters.
pub struct ContentPolicyPass {
    /// Lowercased substrings
    patterns: Vec<String>,
}

impl ContentPolicyPass {
    /// # Arguments
    /// * `patterns` - Substrings matched case-insensitively; empty ones are ignored
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    fn violates(&self, name: &str) -> bool {
        if name.chars().any(|c| MARKUP_CHARS.contains(&c) || c.is_control()) {
            return true;
        }
        let lowered = name.to_lowercase();
        self.patterns.iter().any(|p| lowered.contains(p.as_str()))
    }
}

impl ExclusionPass for ContentPolicyPass {
    fn name(&self) -> &str {
        "ContentPolicy"
    }

    fn excludes(&self, candidate: &ScoredCandidate, _context: &FilterContext) -> Result<bool> {
        Ok(self.violates(&candidate.candidate.username)
            || self.violates(&candidate.candidate.display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{CandidateBranch, RawCandidate};

    fn named(username: &str, display_name: &str) -> ScoredCandidate {
        ScoredCandidate::new(RawCandidate::new(1, username, display_name), 0.0, CandidateBranch::Unknown)
    }

    #[test]
    fn test_suspicious_substring_is_case_insensitive() {
        let pass = ContentPolicyPass::new(&["free followers", "WWW."]);
        let ctx = FilterContext::new(99);

        assert!(pass.excludes(&named("sam", "FREE Followers here"), &ctx).unwrap());
        assert!(pass.excludes(&named("www.spam.example", "Sam"), &ctx).unwrap());
        assert!(!pass.excludes(&named("sam", "Sam Rivera"), &ctx).unwrap());
    }

    #[test]
    fn test_markup_and_control_characters() {
        let pass = ContentPolicyPass::new::<&str>(&[]);
        let ctx = FilterContext::new(99);

        for display in ["<b>Sam</b>", "Sam {x}", "Sam\\", "\"Sam\"", "Sam;", "Sam\u{7}"] {
            assert!(pass.excludes(&named("sam", display), &ctx).unwrap(), "{:?}", display);
        }
        assert!(!pass.excludes(&named("sam.r", "Sam O'Neil"), &ctx).unwrap());
    }

    #[test]
    fn test_blank_patterns_match_nothing() {
        let pass = ContentPolicyPass::new(&["", "   "]);
        assert!(!pass.excludes(&named("sam", "Sam"), &FilterContext::new(99)).unwrap());
    }
}
