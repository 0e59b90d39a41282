//! The security filter removes candidates the requester must not see.
//!
//! ## Algorithm
//! 1. Split the pool into batches of `batch_size`
//! 2. For every installed pass, concurrently, evaluate every batch and
//!    collect the positions that pass wants excluded
//! 3. Union the position sets and keep everything else, in input order
//!
//! Passes share no state, so the union is the same whatever order rayon
//! schedules them in. Any pass error or panic fails closed: `filter`
//! returns nothing rather than an unscreened pool.

use crate::passes::{BlockedUserPass, ContentPolicyPass, RequesterGuardPass, SpamPass};
use crate::ranker::ScoredCandidate;
use crate::traits::{ExclusionPass, FilterContext};
use graph_loader::UserId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sources::{CandidateBranch, PublicStats};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

/// Toggles and limits for the security filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityFilterConfig {
    pub blocked_users: bool,
    pub content_policy: bool,
    pub spam_heuristics: bool,
    /// Treat muted candidates as spam
    pub exclude_muted: bool,
    /// Case-insensitive substrings that disqualify a name
    pub suspicious_patterns: Vec<String>,
    pub max_results: usize,
    pub batch_size: usize,
    pub spam_follower_threshold: u64,
    pub reserved_display_names: Vec<String>,
}

impl Default for SecurityFilterConfig {
    fn default() -> Self {
        Self {
            blocked_users: true,
            content_policy: true,
            spam_heuristics: true,
            exclude_muted: true,
            suspicious_patterns: ["http://", "https://", "www.", "free followers", "click here"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_results: 50,
            batch_size: 50,
            spam_follower_threshold: 100_000,
            reserved_display_names: [
                "user", "test", "admin", "administrator", "root", "null", "undefined", "support",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Exclusion pass '{pass}' failed: {reason}")]
    Pass { pass: String, reason: String },

    #[error("Exclusion pass panicked")]
    Panicked,
}

/// Internal scoring detail, only attached when diagnostics are requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub score: f64,
    pub branch: CandidateBranch,
}

/// The public-safe shape of a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicCandidate {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub verified: bool,
    pub mutual_follow: bool,
    pub stats: PublicStats,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl PublicCandidate {
    /// Drop every internal field of `scored`.
    pub fn project(scored: &ScoredCandidate, with_diagnostics: bool) -> Self {
        let c = &scored.candidate;
        Self {
            id: c.id,
            username: c.username.clone(),
            display_name: c.display_name.clone(),
            verified: c.verified,
            mutual_follow: c.mutual_follow,
            stats: c.stats,
            avatar_url: c.avatar_url.clone(),
            diagnostics: with_diagnostics.then(|| Diagnostics {
                score: scored.score,
                branch: scored.branch,
            }),
        }
    }
}

/// Runs every enabled exclusion pass over a candidate pool.
pub struct SecurityFilter {
    config: SecurityFilterConfig,
    context: FilterContext,
    passes: Vec<Box<dyn ExclusionPass>>,
    diagnostics: bool,
}

impl SecurityFilter {
    /// Build a filter for one requester.
    ///
    /// The requester guard is always installed; the other passes follow
    /// the config toggles.
    pub fn new(config: SecurityFilterConfig, context: FilterContext) -> Self {
        let mut passes: Vec<Box<dyn ExclusionPass>> = vec![Box::new(RequesterGuardPass)];
        if config.blocked_users {
            passes.push(Box::new(BlockedUserPass));
        }
        if config.content_policy {
            passes.push(Box::new(ContentPolicyPass::new(&config.suspicious_patterns)));
        }
        if config.spam_heuristics {
            passes.push(Box::new(
                SpamPass::new(config.spam_follower_threshold, &config.reserved_display_names)
                    .with_exclude_muted(config.exclude_muted),
            ));
        }

        Self {
            config,
            context,
            passes,
            diagnostics: false,
        }
    }

    /// Install an extra pass (builder pattern).
    pub fn add_pass(mut self, pass: impl ExclusionPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Attach score and branch to projected results (builder pattern).
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Remove excluded candidates without truncating or projecting.
    ///
    /// # Returns
    /// * `Ok(Vec<ScoredCandidate>)` - Survivors in input order
    /// * `Err(FilterError)` - A pass failed; nothing may be shown
    pub fn screen(&self, candidates: Vec<ScoredCandidate>) -> Result<Vec<ScoredCandidate>, FilterError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let excluded = catch_unwind(AssertUnwindSafe(|| self.excluded_positions(&candidates)))
            .map_err(|_| FilterError::Panicked)??;

        debug!(
            "Security filter excluded {} of {} candidates",
            excluded.len(),
            candidates.len()
        );

        Ok(candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
            .map(|(_, c)| c)
            .collect())
    }

    /// Screen, cap to `max_results`, then project.
    ///
    /// Fails closed: on any pass failure the result is empty.
    pub fn filter(&self, candidates: Vec<ScoredCandidate>) -> Vec<PublicCandidate> {
        match self.screen(candidates) {
            Ok(mut survivors) => {
                survivors.truncate(self.config.max_results);
                survivors
                    .iter()
                    .map(|c| PublicCandidate::project(c, self.diagnostics))
                    .collect()
            }
            Err(e) => {
                warn!("Security filter failed closed: {}", e);
                Vec::new()
            }
        }
    }

    /// Whether a single candidate would survive the filter.
    pub fn validate_candidate(&self, candidate: &ScoredCandidate) -> bool {
        !self.filter(vec![candidate.clone()]).is_empty()
    }

    fn excluded_positions(&self, candidates: &[ScoredCandidate]) -> Result<HashSet<usize>, FilterError> {
        let batch_size = self.config.batch_size.max(1);

        let per_pass = self
            .passes
            .par_iter()
            .map(|pass| {
                candidates
                    .par_chunks(batch_size)
                    .enumerate()
                    .map(|(batch, chunk)| self.run_batch(pass.as_ref(), batch * batch_size, chunk))
                    .collect::<Result<Vec<Vec<usize>>, FilterError>>()
            })
            .collect::<Result<Vec<_>, FilterError>>()?;

        Ok(per_pass.into_iter().flatten().flatten().collect())
    }

    fn run_batch(
        &self,
        pass: &dyn ExclusionPass,
        offset: usize,
        chunk: &[ScoredCandidate],
    ) -> Result<Vec<usize>, FilterError> {
        let mut hits = Vec::new();
        for (i, candidate) in chunk.iter().enumerate() {
            let exclude = pass
                .excludes(candidate, &self.context)
                .map_err(|e| FilterError::Pass {
                    pass: pass.name().to_string(),
                    reason: format!("{:#}", e),
                })?;
            if exclude {
                hits.push(offset + i);
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use sources::RawCandidate;

    const REQUESTER: UserId = 1;

    fn scored(id: UserId) -> ScoredCandidate {
        ScoredCandidate::new(
            RawCandidate::new(id, format!("user_{}", id), format!("Person {}", id)),
            0.0,
            CandidateBranch::Unknown,
        )
    }

    fn filter_with(config: SecurityFilterConfig) -> SecurityFilter {
        SecurityFilter::new(config, FilterContext::new(REQUESTER))
    }

    fn ids(results: &[PublicCandidate]) -> Vec<UserId> {
        results.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_clean_pool_passes_through_in_order() {
        let pool: Vec<_> = (2..=6).map(scored).collect();
        let results = filter_with(SecurityFilterConfig::default()).filter(pool);
        assert_eq!(ids(&results), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_requester_and_blocker_excluded_with_everything_off() {
        let config = SecurityFilterConfig {
            blocked_users: false,
            content_policy: false,
            spam_heuristics: false,
            ..Default::default()
        };
        let mut blocker = scored(3);
        blocker.candidate.blocks_requester = true;
        let mut blocked = scored(4);
        blocked.candidate.blocked = true;

        let filter = filter_with(config);
        assert_eq!(filter.pass_names(), vec!["RequesterGuard"]);
        let results = filter.filter(vec![scored(REQUESTER), scored(2), blocker, blocked]);
        assert_eq!(ids(&results), vec![2, 4]);
    }

    #[test]
    fn test_blocked_users_toggle() {
        let mut blocked = scored(4);
        blocked.candidate.blocked = true;
        assert!(!filter_with(SecurityFilterConfig::default()).validate_candidate(&blocked));
    }

    #[test]
    fn test_truncates_to_max_results() {
        let config = SecurityFilterConfig {
            max_results: 3,
            ..Default::default()
        };
        let pool: Vec<_> = (2..=20).map(scored).collect();
        assert_eq!(ids(&filter_with(config).filter(pool)), vec![2, 3, 4]);
    }

    #[test]
    fn test_batching_keeps_positions_straight() {
        let config = SecurityFilterConfig {
            batch_size: 3,
            max_results: 100,
            ..Default::default()
        };
        let pool: Vec<_> = (2..=30)
            .map(|id| {
                let mut c = scored(id);
                c.candidate.blocked = id % 4 == 0;
                c
            })
            .collect();

        let results = filter_with(config).filter(pool);
        let expected: Vec<UserId> = (2..=30).filter(|id| id % 4 != 0).collect();
        assert_eq!(ids(&results), expected);
    }

    #[test]
    fn test_passes_are_unioned() {
        let mut blocked = scored(2);
        blocked.candidate.blocked = true;
        let mut markup = scored(3);
        markup.candidate.display_name = "<b>bold</b>".into();
        let mut reserved = scored(4);
        reserved.candidate.display_name = "Test".into();

        let results = filter_with(SecurityFilterConfig::default())
            .filter(vec![blocked, markup, reserved, scored(5)]);
        assert_eq!(ids(&results), vec![5]);
    }

    struct FailingPass;

    impl ExclusionPass for FailingPass {
        fn name(&self) -> &str {
            "Failing"
        }

        fn excludes(&self, _: &ScoredCandidate, _: &FilterContext) -> anyhow::Result<bool> {
            Err(anyhow!("lookup failed"))
        }
    }

    struct PanickingPass;

    impl ExclusionPass for PanickingPass {
        fn name(&self) -> &str {
            "Panicking"
        }

        fn excludes(&self, c: &ScoredCandidate, _: &FilterContext) -> anyhow::Result<bool> {
            if c.id() == 7 {
                panic!("bad row");
            }
            Ok(false)
        }
    }

    #[test]
    fn test_pass_error_fails_closed() {
        let filter = filter_with(SecurityFilterConfig::default()).add_pass(FailingPass);
        let pool: Vec<_> = (2..=5).map(scored).collect();

        assert!(matches!(
            filter.screen(pool.clone()),
            Err(FilterError::Pass { ref pass, .. }) if pass == "Failing"
        ));
        assert!(filter.filter(pool).is_empty());
    }

    #[test]
    fn test_pass_panic_fails_closed() {
        let filter = filter_with(SecurityFilterConfig::default()).add_pass(PanickingPass);
        let pool: Vec<_> = (2..=10).map(scored).collect();
        assert_eq!(filter.screen(pool.clone()), Err(FilterError::Panicked));
        assert!(filter.filter(pool).is_empty());
    }

    #[test]
    fn test_projection_hides_internal_fields() {
        let mut c = scored(2);
        c.score = 4.5;
        c.candidate.mutual_follow = true;
        c.candidate.relationship_weight = Some(1.0);

        let plain = filter_with(SecurityFilterConfig::default()).filter(vec![c.clone()]);
        let json = serde_json::to_value(&plain[0]).unwrap();
        assert!(json.get("diagnostics").is_none());
        assert!(json.get("score").is_none());
        assert!(json.get("relationship_weight").is_none());
        assert_eq!(json["mutual_follow"], true);

        let diag = filter_with(SecurityFilterConfig::default())
            .with_diagnostics(true)
            .filter(vec![c]);
        let d = diag[0].diagnostics.as_ref().unwrap();
        assert_eq!(d.score, 4.5);
        assert_eq!(d.branch, CandidateBranch::Unknown);
    }

    #[test]
    fn test_validate_candidate_matches_filter() {
        let filter = filter_with(SecurityFilterConfig::default());
        assert!(filter.validate_candidate(&scored(2)));
        assert!(!filter.validate_candidate(&scored(REQUESTER)));
    }
}
