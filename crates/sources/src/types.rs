//! Candidate row types shared by providers and the search pipeline.

use graph_loader::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which retrieval branch produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateBranch {
    /// People connected to the requester
    Related,
    /// People with no follow edge to or from the requester
    Unknown,
}

impl CandidateBranch {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateBranch::Related => "related",
            CandidateBranch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CandidateBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public engagement counters shown next to a search result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicStats {
    pub follower_count: u64,
    pub following_count: u64,
    pub moment_count: u64,
}

/// A user record as returned by a candidate provider.
///
/// All relationship flags are relative to the requester. Providers own
/// creation; the pipeline only reads these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub verified: bool,

    /// The requester blocks this candidate
    pub blocked: bool,
    /// This candidate blocks the requester
    pub blocks_requester: bool,
    /// The requester muted this candidate
    pub muted: bool,

    pub requester_follows: bool,
    pub follows_requester: bool,
    pub mutual_follow: bool,

    pub stats: PublicStats,

    /// Distance between requester and candidate, when both share a location
    pub distance_km: Option<f64>,
    /// Provider-supplied base relevance
    pub relationship_weight: Option<f64>,
    pub avatar_url: Option<String>,
}

impl RawCandidate {
    /// Create a candidate with no relationship flags, stats or weight.
    pub fn new(id: UserId, username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: display_name.into(),
            verified: false,
            blocked: false,
            blocks_requester: false,
            muted: false,
            requester_follows: false,
            follows_requester: false,
            mutual_follow: false,
            stats: PublicStats::default(),
            distance_km: None,
            relationship_weight: None,
            avatar_url: None,
        }
    }
}

/// What a provider is asked to retrieve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    /// Validated, normalized search term
    pub term: String,
    pub requester_id: UserId,
    /// Upper bound on rows a provider should return
    pub limit: usize,
}

impl CandidateQuery {
    pub fn new(term: impl Into<String>, requester_id: UserId, limit: usize) -> Self {
        Self {
            term: term.into(),
            requester_id,
            limit,
        }
    }
}
