//! Synchronous stages of the people-search pipeline.
//!
//! This crate provides:
//! - TermValidator for normalizing and rejecting search terms
//! - Ranker for per-branch weighted scoring
//! - SecurityFilter and its ExclusionPass implementations
//! - Mixer for de-duplicating and blending the two branches
//! - MetricsRecorder for per-search observability
//!
//! ## Architecture
//! Candidates flow through the stages in order:
//! 1. Ranker scores each branch with its own weight table
//! 2. SecurityFilter screens the merged pool (fail-closed)
//! 3. Mixer interleaves the surviving related and unknown lists
//! 4. Results are capped and projected to `PublicCandidate`
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterContext, Mixer, Ranker, SecurityFilter, SecurityFilterConfig};
//! use sources::CandidateBranch;
//!
//! let ranker = Ranker::default();
//! let related = ranker.rank(related_rows, CandidateBranch::Related);
//! let unknown = ranker.rank(unknown_rows, CandidateBranch::Unknown);
//!
//! let filter = SecurityFilter::new(SecurityFilterConfig::default(), FilterContext::new(requester));
//! let mixed = Mixer::new(0.7).mix(related, unknown)?;
//! let results = filter.filter(mixed);
//! ```

pub mod metrics;
pub mod mixer;
pub mod passes;
pub mod ranker;
pub mod security_filter;
pub mod stage;
pub mod traits;
pub mod validator;

// Re-export main types
pub use metrics::{BranchMetrics, MetricsRecorder, MetricsReport};
pub use mixer::{BlendRegime, MixError, Mixer};
pub use ranker::{Ranker, RankingThresholds, RankingWeights, ScoredCandidate};
pub use security_filter::{
    Diagnostics, FilterError, PublicCandidate, SecurityFilter, SecurityFilterConfig,
};
pub use stage::SearchStage;
pub use traits::{ExclusionPass, FilterContext};
pub use validator::{
    PatternSanitizer, TermBounds, TermSanitizer, TermValidator, ValidatedTerm, ValidationDetails,
    ValidationError, ValidationErrorKind,
};
