//! Unknown Candidates - people the requester has no follow edge with
//!
//! ## Algorithm
//! 1. Find users whose username or display name contains the term
//! 2. Drop anyone connected to the requester (those belong to the related branch)
//! 3. Base weight: `shared_connection_weight` per account the requester follows
//!    that also follows the candidate ("people you may know")
//! 4. Order by weight, then follower count, then id; return the top `limit`

use crate::provider::CandidateProvider;
use crate::row_builder::{build_raw_candidate, requester_profile, sort_rows};
use crate::types::{CandidateBranch, CandidateQuery, RawCandidate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use graph_loader::SocialGraph;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Graph-backed provider for the "unknown" branch
#[derive(Clone)]
pub struct UnknownCandidates {
    graph: Arc<SocialGraph>,

    /// Weight added per shared connection
    shared_connection_weight: f64,
}

impl UnknownCandidates {
    /// Create a new unknown-branch provider
    pub fn new(graph: Arc<SocialGraph>) -> Self {
        Self {
            graph,
            shared_connection_weight: 0.1,
        }
    }

    /// Configure the per-shared-connection weight (default: 0.1)
    pub fn with_shared_connection_weight(mut self, weight: f64) -> Self {
        self.shared_connection_weight = weight;
        self
    }

    /// Retrieve unconnected users matching the query (synchronous).
    #[instrument(skip(self, query), fields(requester_id = query.requester_id))]
    pub fn get_candidates(&self, query: &CandidateQuery) -> Result<Vec<RawCandidate>> {
        let requester = requester_profile(&self.graph, query.requester_id)?;
        let matches = self.graph.find_by_term(&query.term, Some(requester.id));

        let mut rows: Vec<RawCandidate> = matches
            .par_iter()
            .filter_map(|&id| {
                let user = self.graph.get_user(id)?;
                if self.graph.relationship(requester.id, id).is_connected() {
                    return None;
                }
                let shared = self.graph.shared_connections(requester.id, id);
                let weight = shared as f64 * self.shared_connection_weight;
                Some(build_raw_candidate(&self.graph, requester, user, Some(weight)))
            })
            .collect();

        sort_rows(&mut rows);
        rows.truncate(query.limit);

        debug!("Generated {} unknown candidates", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl CandidateProvider for UnknownCandidates {
    fn name(&self) -> &str {
        "UnknownCandidates"
    }

    fn branch(&self) -> CandidateBranch {
        CandidateBranch::Unknown
    }

    async fn process(&self, query: &CandidateQuery) -> Result<Vec<RawCandidate>> {
        let provider = self.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || provider.get_candidates(&query))
            .await
            .context("Unknown candidates task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_loader::{Edge, EdgeKind, UserId, UserProfile};

    fn profile(id: UserId, username: &str) -> UserProfile {
        UserProfile {
            id,
            username: username.to_string(),
            display_name: username.to_string(),
            verified: false,
            follower_count: id,
            following_count: 0,
            moment_count: 0,
            avatar_url: None,
            location: None,
        }
    }

    fn create_test_graph() -> Arc<SocialGraph> {
        let mut graph = SocialGraph::new();
        graph.insert_user(profile(1, "me"));
        graph.insert_user(profile(2, "friend_a"));
        graph.insert_user(profile(3, "friend_b"));
        graph.insert_user(profile(4, "kim_popular_stranger"));
        graph.insert_user(profile(5, "kim_known_via_two"));
        graph.insert_user(profile(6, "kim_already_followed"));
        graph.insert_user(profile(7, "kim_blocker"));

        graph.insert_edge(EdgeKind::Follow, Edge { from: 1, to: 2 });
        graph.insert_edge(EdgeKind::Follow, Edge { from: 1, to: 3 });
        graph.insert_edge(EdgeKind::Follow, Edge { from: 2, to: 5 });
        graph.insert_edge(EdgeKind::Follow, Edge { from: 3, to: 5 });
        graph.insert_edge(EdgeKind::Follow, Edge { from: 1, to: 6 });
        graph.insert_edge(EdgeKind::Block, Edge { from: 7, to: 1 });
        Arc::new(graph)
    }

    #[test]
    fn test_unknown_excludes_connected_users() {
        let unknown = UnknownCandidates::new(create_test_graph());
        let rows = unknown.get_candidates(&CandidateQuery::new("kim", 1, 10)).unwrap();

        let ids: Vec<UserId> = rows.iter().map(|r| r.id).collect();
        // 5 has two shared connections; 7 and 4 have none and sort by followers
        assert_eq!(ids, vec![5, 7, 4]);
        let weight = rows[0].relationship_weight.unwrap();
        assert!((weight - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_keeps_blockers_for_the_filter() {
        let unknown = UnknownCandidates::new(create_test_graph());
        let rows = unknown.get_candidates(&CandidateQuery::new("blocker", 1, 10)).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].blocks_requester);
    }

    #[tokio::test]
    async fn test_process_matches_sync_path() {
        let unknown = UnknownCandidates::new(create_test_graph());
        let query = CandidateQuery::new("kim", 1, 2);
        let async_rows = unknown.process(&query).await.unwrap();
        let sync_rows = unknown.get_candidates(&query).unwrap();
        assert_eq!(async_rows, sync_rows);
        assert_eq!(unknown.branch(), CandidateBranch::Unknown);
    }
}
