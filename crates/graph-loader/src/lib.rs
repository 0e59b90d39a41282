//! # Graph Loader Crate
//!
//! This crate loads and indexes a social graph fixture: user profiles plus
//! follow, block and mute edges. Candidate providers query it to build the
//! raw candidate rows the search pipeline consumes.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (UserProfile, Edge, Relationship, SocialGraph)
//! - **parser**: Parse .dat files into Rust structs
//! - **index**: Load, validate and search the graph
//! - **error**: Error types for graph loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use graph_loader::SocialGraph;
//! use std::path::Path;
//!
//! let graph = SocialGraph::load_from_dir(Path::new("data/social"))?;
//! let rel = graph.relationship(1, 2);
//! println!("mutual follow: {}", rel.is_mutual_follow());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{GraphLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    // Core types
    Edge,
    EdgeKind,
    GeoPoint,
    Relationship,
    SocialGraph,
    UserProfile,
};
