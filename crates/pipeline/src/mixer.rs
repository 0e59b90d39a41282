//! Blends the related and unknown branches into one ordered list.
//!
//! ## Algorithm
//! 1. De-duplicate: walk `related` then `unknown`, dropping any identity
//!    already seen, so the related copy wins
//! 2. Quota: `total = |R| + |U|` (capped by the optional limit),
//!    `related = round(total * c)`, `unknown = total - related`. A list
//!    shorter than its quota is used in full and the other list takes
//!    the unused slots
//! 3. Interleave by regime:
//!    - `c >= 0.8`: one related, one unknown, then whatever remains
//!    - `0.6 <= c < 0.8`: blocks of `ceil(1/c)` related, then unknown
//!    - `c < 0.6`: one list after the other, related first only when `c > 0.5`
//!
//! Without a limit `total` covers every deduped candidate, so backfill
//! keeps them all and only the regime shapes the order. With `c = 1.0`
//! over four related and four unknown, the related quota is 8, the
//! unknown branch backfills the 4 unused slots, and the output still
//! alternates `[r1, u1, r2, u2, ...]`. Quotas drop candidates only once
//! `with_limit` caps the total.

use crate::ranker::ScoredCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Coefficient at or above which branches alternate item by item
pub const HIGH_BLEND_THRESHOLD: f64 = 0.8;
/// Coefficient at or above which branches alternate in blocks
pub const MEDIUM_BLEND_THRESHOLD: f64 = 0.6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixError {
    #[error("Mixing coefficient must be within [0, 1], got {0}")]
    InvalidCoefficient(f64),
}

/// How the two branches are woven together for a given coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendRegime {
    /// Alternate one by one, related first
    High,
    /// Alternate in blocks of this size, related first
    Medium { block: usize },
    /// Concatenate, related first when `related_leads`
    Low { related_leads: bool },
}

impl BlendRegime {
    /// Pick the regime for a coefficient already known to be in [0, 1].
    pub fn for_coefficient(c: f64) -> Self {
        if c >= HIGH_BLEND_THRESHOLD {
            BlendRegime::High
        } else if c >= MEDIUM_BLEND_THRESHOLD {
            BlendRegime::Medium {
                block: (1.0 / c).ceil() as usize,
            }
        } else {
            BlendRegime::Low {
                related_leads: c > 0.5,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixer {
    coefficient: f64,
    limit: Option<usize>,
}

impl Mixer {
    /// # Arguments
    /// * `coefficient` - Share of the output reserved for related candidates
    pub fn new(coefficient: f64) -> Self {
        Self {
            coefficient,
            limit: None,
        }
    }

    /// Cap the quota total (builder pattern).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// De-duplicate, apply quotas and interleave.
    ///
    /// # Returns
    /// * `Ok(Vec<ScoredCandidate>)` - At most one entry per identity
    /// * `Err(MixError)` - The coefficient is not a number in [0, 1]
    pub fn mix(
        &self,
        related: Vec<ScoredCandidate>,
        unknown: Vec<ScoredCandidate>,
    ) -> Result<Vec<ScoredCandidate>, MixError> {
        let c = self.coefficient;
        if !c.is_finite() || !(0.0..=1.0).contains(&c) {
            return Err(MixError::InvalidCoefficient(c));
        }

        let (related, unknown) = dedupe(related, unknown);

        let available = related.len() + unknown.len();
        let total = self.limit.map_or(available, |limit| available.min(limit));
        if total == 0 {
            return Ok(Vec::new());
        }

        let (related_quota, unknown_quota) = quotas(total, c, related.len(), unknown.len());
        let related: Vec<_> = related.into_iter().take(related_quota).collect();
        let unknown: Vec<_> = unknown.into_iter().take(unknown_quota).collect();

        let regime = BlendRegime::for_coefficient(c);
        debug!(
            "Mixing {} related + {} unknown with {:?}",
            related.len(),
            unknown.len(),
            regime
        );

        Ok(interleave(related, unknown, regime))
    }
}

/// Drop repeated identities, related copies first.
fn dedupe(
    related: Vec<ScoredCandidate>,
    unknown: Vec<ScoredCandidate>,
) -> (Vec<ScoredCandidate>, Vec<ScoredCandidate>) {
    let mut seen = HashSet::with_capacity(related.len() + unknown.len());
    let related: Vec<_> = related.into_iter().filter(|c| seen.insert(c.id())).collect();
    let unknown: Vec<_> = unknown.into_iter().filter(|c| seen.insert(c.id())).collect();
    (related, unknown)
}

/// Split `total` slots between the branches, backfilling short lists.
fn quotas(total: usize, c: f64, related_len: usize, unknown_len: usize) -> (usize, usize) {
    let mut related_quota = ((total as f64) * c).round() as usize;
    related_quota = related_quota.min(total);
    let mut unknown_quota = total - related_quota;

    if related_quota > related_len {
        unknown_quota += related_quota - related_len;
        related_quota = related_len;
    }
    if unknown_quota > unknown_len {
        related_quota = (related_quota + unknown_quota - unknown_len).min(related_len);
        unknown_quota = unknown_len;
    }

    (related_quota, unknown_quota)
}

fn interleave(
    related: Vec<ScoredCandidate>,
    unknown: Vec<ScoredCandidate>,
    regime: BlendRegime,
) -> Vec<ScoredCandidate> {
    let mut out = Vec::with_capacity(related.len() + unknown.len());
    match regime {
        BlendRegime::High => alternate(&mut out, related, unknown, 1),
        BlendRegime::Medium { block } => alternate(&mut out, related, unknown, block.max(1)),
        BlendRegime::Low { related_leads: true } => {
            out.extend(related);
            out.extend(unknown);
        }
        BlendRegime::Low { related_leads: false } => {
            out.extend(unknown);
            out.extend(related);
        }
    }
    out
}

fn alternate(
    out: &mut Vec<ScoredCandidate>,
    related: Vec<ScoredCandidate>,
    unknown: Vec<ScoredCandidate>,
    block: usize,
) {
    let mut related = related.into_iter().peekable();
    let mut unknown = unknown.into_iter().peekable();
    while related.peek().is_some() || unknown.peek().is_some() {
        out.extend(related.by_ref().take(block));
        out.extend(unknown.by_ref().take(block));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{CandidateBranch, RawCandidate};

    fn related(ids: &[u64]) -> Vec<ScoredCandidate> {
        branch(ids, CandidateBranch::Related)
    }

    fn unknown(ids: &[u64]) -> Vec<ScoredCandidate> {
        branch(ids, CandidateBranch::Unknown)
    }

    fn branch(ids: &[u64], branch: CandidateBranch) -> Vec<ScoredCandidate> {
        ids.iter()
            .map(|&id| ScoredCandidate::new(RawCandidate::new(id, format!("u{}", id), "U"), 0.0, branch))
            .collect()
    }

    fn ids(mixed: &[ScoredCandidate]) -> Vec<u64> {
        mixed.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_regime_selection() {
        assert_eq!(BlendRegime::for_coefficient(1.0), BlendRegime::High);
        assert_eq!(BlendRegime::for_coefficient(0.8), BlendRegime::High);
        assert_eq!(BlendRegime::for_coefficient(0.7), BlendRegime::Medium { block: 2 });
        assert_eq!(BlendRegime::for_coefficient(0.6), BlendRegime::Medium { block: 2 });
        assert_eq!(BlendRegime::for_coefficient(0.55), BlendRegime::Low { related_leads: true });
        assert_eq!(BlendRegime::for_coefficient(0.5), BlendRegime::Low { related_leads: false });
        assert_eq!(BlendRegime::for_coefficient(0.0), BlendRegime::Low { related_leads: false });
    }

    #[test]
    fn test_high_blend_alternates() {
        let mixed = Mixer::new(0.9)
            .mix(related(&[1, 2, 3, 4]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        assert_eq!(ids(&mixed), vec![1, 11, 2, 12, 3, 13, 4, 14]);
    }

    #[test]
    fn test_full_coefficient_backfills_unknown() {
        let mixed = Mixer::new(1.0)
            .mix(related(&[1, 2, 3, 4]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        assert_eq!(ids(&mixed), vec![1, 11, 2, 12, 3, 13, 4, 14]);

        // Capped, the related quota takes every slot
        let capped = Mixer::new(1.0)
            .with_limit(4)
            .mix(related(&[1, 2, 3, 4]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        assert_eq!(ids(&capped), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_low_blend_related_leads() {
        let mixed = Mixer::new(0.55)
            .mix(related(&[1, 2, 3, 4]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        assert_eq!(ids(&mixed), vec![1, 2, 3, 4, 11, 12, 13, 14]);
    }

    #[test]
    fn test_low_blend_unknown_leads() {
        let mixed = Mixer::new(0.3)
            .mix(related(&[1, 2, 3, 4]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        assert_eq!(ids(&mixed), vec![11, 12, 13, 14, 1, 2, 3, 4]);
    }

    #[test]
    fn test_medium_blend_blocks() {
        let mixed = Mixer::new(0.7)
            .mix(related(&[1, 2, 3, 4, 5, 6]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        // total 10, quotas 7/3 -> related 6 used in full, unknown backfilled to 4
        assert_eq!(ids(&mixed), vec![1, 2, 11, 12, 3, 4, 13, 14, 5, 6]);
    }

    #[test]
    fn test_quota_applies_under_limit() {
        let mixed = Mixer::new(0.5)
            .with_limit(4)
            .mix(related(&[1, 2, 3, 4]), unknown(&[11, 12, 13, 14]))
            .unwrap();
        assert_eq!(ids(&mixed), vec![11, 12, 1, 2]);
    }

    #[test]
    fn test_dedupe_keeps_related_copy() {
        let mixed = Mixer::new(0.9)
            .mix(related(&[1, 2]), unknown(&[2, 3, 3]))
            .unwrap();
        assert_eq!(ids(&mixed), vec![1, 3, 2]);
        let two = mixed.iter().find(|c| c.id() == 2).unwrap();
        assert_eq!(two.branch, CandidateBranch::Related);
    }

    #[test]
    fn test_one_empty_branch() {
        assert_eq!(ids(&Mixer::new(0.9).mix(related(&[1, 2]), vec![]).unwrap()), vec![1, 2]);
        assert_eq!(ids(&Mixer::new(0.9).mix(vec![], unknown(&[5, 6])).unwrap()), vec![5, 6]);
        assert!(Mixer::new(0.7).mix(vec![], vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let mixer = Mixer::new(0.65);
        let a = mixer.mix(related(&[1, 2, 3]), unknown(&[4, 5, 6, 7])).unwrap();
        let b = mixer.mix(related(&[1, 2, 3]), unknown(&[4, 5, 6, 7])).unwrap();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_invalid_coefficient() {
        for c in [f64::NAN, -0.1, 1.5, f64::INFINITY] {
            assert!(matches!(
                Mixer::new(c).mix(related(&[1]), unknown(&[2])),
                Err(MixError::InvalidCoefficient(_))
            ));
        }
    }
}
