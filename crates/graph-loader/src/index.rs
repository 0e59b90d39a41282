//! SocialGraph loading, validation and term lookup.
//!
//! Loading parses the four fixture files in parallel, inserts users first
//! and edges second, then validates that every edge points at known users.

use crate::error::{GraphLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

impl SocialGraph {
    /// Load a social graph fixture from a directory.
    ///
    /// Steps:
    /// 1. Parse users.dat and the three edge files in parallel
    /// 2. Insert users (rejecting duplicate handles)
    /// 3. Insert follow, block and mute edges
    /// 4. Validate edge references
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading social graph from {:?}", data_dir);

        let users_path = data_dir.join("users.dat");
        let follows_path = data_dir.join("follows.dat");
        let blocks_path = data_dir.join("blocks.dat");
        let mutes_path = data_dir.join("mutes.dat");

        let ((users, follows), (blocks, mutes)) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_users(&users_path),
                    || parser::parse_edges(&follows_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_edges(&blocks_path),
                    || parser::parse_edges(&mutes_path),
                )
            },
        );

        let users = users?;
        let follows = follows?;
        let blocks = blocks?;
        let mutes = mutes?;

        let mut graph = SocialGraph::new();
        for user in users {
            if graph.username_index.contains_key(&user.username.to_lowercase()) {
                return Err(GraphLoadError::DuplicateUsername(user.username));
            }
            graph.insert_user(user);
        }

        for (kind, edges) in [
            (EdgeKind::Follow, follows),
            (EdgeKind::Block, blocks),
            (EdgeKind::Mute, mutes),
        ] {
            for edge in edges {
                graph.validate_edge(kind, &edge)?;
                graph.insert_edge(kind, edge);
            }
        }

        let (users, follows, blocks, mutes) = graph.counts();
        info!(
            "Loaded {} users, {} follows, {} blocks, {} mutes",
            users, follows, blocks, mutes
        );
        Ok(graph)
    }

    /// Check that an edge joins two distinct, known users.
    pub fn validate_edge(&self, kind: EdgeKind, edge: &Edge) -> Result<()> {
        if edge.from == edge.to {
            return Err(GraphLoadError::SelfEdge {
                kind: kind.as_str().to_string(),
                id: edge.from,
            });
        }
        for id in [edge.from, edge.to] {
            if !self.users.contains_key(&id) {
                return Err(GraphLoadError::MissingReference {
                    entity: "User".to_string(),
                    id,
                });
            }
        }
        Ok(())
    }

    /// Find users whose username or display name contains `term`
    /// (case-insensitive), excluding `exclude`.
    ///
    /// Results are ordered by id so repeated lookups are deterministic.
    pub fn find_by_term(&self, term: &str, exclude: Option<UserId>) -> Vec<UserId> {
        let needle = term.to_lowercase();
        let mut matches: Vec<UserId> = self
            .users
            .par_iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .filter(|(_, user)| {
                user.username.to_lowercase().contains(&needle)
                    || user.display_name.to_lowercase().contains(&needle)
            })
            .map(|(id, _)| *id)
            .collect();
        matches.sort_unstable();
        matches
    }
}
