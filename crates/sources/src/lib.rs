//! # Sources Crate
//!
//! This crate defines how raw search candidates are retrieved.
//!
//! ## Components
//!
//! ### CandidateProvider
//! The async trait the search orchestrator drives. Each provider feeds one
//! branch and may fail or stall; the orchestrator handles both.
//!
//! ### Related Candidates
//! People the requester follows or is followed by, weighted by whether the
//! follow is mutual.
//!
//! ### Unknown Candidates
//! Everyone else matching the term, weighted by shared connections.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CandidateProvider, CandidateQuery, RelatedCandidates, UnknownCandidates};
//! use graph_loader::SocialGraph;
//! use std::sync::Arc;
//!
//! let graph = Arc::new(SocialGraph::load_from_dir("data/social".as_ref())?);
//! let related = RelatedCandidates::new(graph.clone());
//! let unknown = UnknownCandidates::new(graph.clone());
//!
//! let query = CandidateQuery::new("sam", 1, 100);
//! let (r, u) = tokio::join!(related.process(&query), unknown.process(&query));
//! ```

// Public modules
pub mod types;
pub mod provider;
pub mod row_builder;
pub mod related;
pub mod unknown;

// Re-export commonly used types
pub use types::{CandidateBranch, CandidateQuery, PublicStats, RawCandidate};
pub use provider::CandidateProvider;
pub use related::RelatedCandidates;
pub use unknown::UnknownCandidates;

#[cfg(test)]
mod tests {
    use super::*;
    use graph_loader::SocialGraph;
    use std::sync::Arc;

    #[test]
    fn test_provider_names_and_branches() {
        let graph = Arc::new(SocialGraph::new());
        let providers: Vec<Box<dyn CandidateProvider>> = vec![
            Box::new(RelatedCandidates::new(graph.clone())),
            Box::new(UnknownCandidates::new(graph)),
        ];

        assert_eq!(providers[0].name(), "RelatedCandidates");
        assert_eq!(providers[0].branch(), CandidateBranch::Related);
        assert_eq!(providers[1].name(), "UnknownCandidates");
        assert_eq!(providers[1].branch(), CandidateBranch::Unknown);
    }

    #[test]
    fn test_raw_candidate_defaults() {
        let candidate = RawCandidate::new(7, "neo", "Neo");
        assert_eq!(candidate.id, 7);
        assert!(!candidate.blocked && !candidate.blocks_requester && !candidate.muted);
        assert!(candidate.relationship_weight.is_none());
        assert_eq!(candidate.stats, PublicStats::default());
    }

    #[test]
    fn test_branch_serializes_lowercase() {
        assert_eq!(CandidateBranch::Related.to_string(), "related");
        assert_eq!(CandidateBranch::Unknown.as_str(), "unknown");
    }
}
