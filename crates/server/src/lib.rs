//! Server crate for the people-search pipeline.
//!
//! This crate contains the orchestrator that drives a search through
//! validation, retrieval, ranking, filtering and mixing, and the
//! configuration it runs with.

pub mod config;
pub mod orchestrator;

pub use config::{ConfigError, ProviderWeights, SearchConfig};
pub use orchestrator::{SearchError, SearchOptions, SearchOrchestrator, SearchResponse};
