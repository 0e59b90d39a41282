//! Per-branch candidate scoring.
//!
//! The ranker turns provider rows into scored candidates. It never drops
//! a row: exclusion is the security filter's job.
//!
//! ## Algorithm
//! 1. Start from the provider's relationship weight (absent or non-finite -> 0)
//! 2. Add the branch table's weight for every criterion that holds
//! 3. Sort by score descending, keeping provider order for ties

use serde::{Deserialize, Serialize};
use sources::{CandidateBranch, RawCandidate};
use tracing::debug;

/// A provider row with its score and the branch it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: RawCandidate,
    pub score: f64,
    pub branch: CandidateBranch,
}

impl ScoredCandidate {
    pub fn new(candidate: RawCandidate, score: f64, branch: CandidateBranch) -> Self {
        Self {
            candidate,
            score,
            branch,
        }
    }

    pub fn id(&self) -> graph_loader::UserId {
        self.candidate.id
    }
}

/// Additive weight per ranking criterion. Block and mute weights are negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub verified: f64,
    pub mutual_follow: f64,
    pub requester_follows: f64,
    pub follows_requester: f64,
    pub nearby: f64,
    pub popular: f64,
    pub blocked_by_target: f64,
    pub muted: f64,
}

impl RankingWeights {
    /// Table for people the requester is connected to
    pub fn related_defaults() -> Self {
        Self {
            verified: 1.0,
            mutual_follow: 3.0,
            requester_follows: 1.5,
            follows_requester: 1.0,
            nearby: 0.5,
            popular: 0.5,
            blocked_by_target: -10.0,
            muted: -2.0,
        }
    }

    /// Table for strangers; relationship criteria never hold for them
    pub fn unknown_defaults() -> Self {
        Self {
            verified: 2.0,
            mutual_follow: 0.0,
            requester_follows: 0.0,
            follows_requester: 0.0,
            nearby: 1.5,
            popular: 1.0,
            blocked_by_target: -10.0,
            muted: -2.0,
        }
    }

    /// Sum of the weights whose criterion holds for `candidate`.
    pub fn criteria_score(&self, candidate: &RawCandidate, thresholds: &RankingThresholds) -> f64 {
        let nearby = candidate
            .distance_km
            .is_some_and(|d| d.is_finite() && d <= thresholds.nearby_km);
        let popular = candidate.stats.follower_count >= thresholds.popular_followers;

        [
            (candidate.verified, self.verified),
            (candidate.mutual_follow, self.mutual_follow),
            (candidate.requester_follows, self.requester_follows),
            (candidate.follows_requester, self.follows_requester),
            (nearby, self.nearby),
            (popular, self.popular),
            (candidate.blocks_requester, self.blocked_by_target),
            (candidate.muted, self.muted),
        ]
        .iter()
        .filter(|(holds, _)| *holds)
        .map(|(_, weight)| weight)
        .sum()
    }
}

/// Turns numeric signals into boolean criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingThresholds {
    /// Distance at or under which a candidate counts as nearby
    pub nearby_km: f64,
    /// Follower count at or over which a candidate counts as popular
    pub popular_followers: u64,
}

impl Default for RankingThresholds {
    fn default() -> Self {
        Self {
            nearby_km: 25.0,
            popular_followers: 10_000,
        }
    }
}

/// Scores candidates with one weight table per branch.
#[derive(Debug, Clone)]
pub struct Ranker {
    related: RankingWeights,
    unknown: RankingWeights,
    thresholds: RankingThresholds,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(
            RankingWeights::related_defaults(),
            RankingWeights::unknown_defaults(),
            RankingThresholds::default(),
        )
    }
}

impl Ranker {
    pub fn new(related: RankingWeights, unknown: RankingWeights, thresholds: RankingThresholds) -> Self {
        Self {
            related,
            unknown,
            thresholds,
        }
    }

    pub fn weights_for(&self, branch: CandidateBranch) -> &RankingWeights {
        match branch {
            CandidateBranch::Related => &self.related,
            CandidateBranch::Unknown => &self.unknown,
        }
    }

    /// Score a single candidate against `branch`'s table.
    pub fn score(&self, candidate: &RawCandidate, branch: CandidateBranch) -> f64 {
        let base = candidate
            .relationship_weight
            .filter(|w| w.is_finite())
            .unwrap_or(0.0);
        base + self.weights_for(branch).criteria_score(candidate, &self.thresholds)
    }

    /// Score and sort one branch's candidates.
    ///
    /// # Arguments
    /// * `candidates` - Provider rows, in provider order
    /// * `branch` - Which weight table to apply
    ///
    /// # Returns
    /// Every input row, scored, highest first. Equal scores keep input order.
    pub fn rank(&self, candidates: Vec<RawCandidate>, branch: CandidateBranch) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let score = self.score(&candidate, branch);
                ScoredCandidate::new(candidate, score, branch)
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!("Ranked {} {} candidates", scored.len(), branch);
        scored
    }
}
