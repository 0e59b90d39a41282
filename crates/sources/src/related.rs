//! Related Candidates - people the requester is already connected to
//!
//! ## Algorithm
//! 1. Find users whose username or display name contains the term
//! 2. Keep those with a follow edge in either direction
//! 3. Base weight: 1.0 for mutual follows, 0.5 for one-way follows
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

/// Graph-backed provider for the "related" branch
#[derive(Clone)]
pub struct RelatedCandidates {
    /// Shared reference to the graph (read-only, so no Mutex needed)
    graph: Arc<SocialGraph>,

    /// Base weight for a mutual follow
    mutual_weight: f64,

    /// Base weight for a one-way follow in either direction
    one_way_weight: f64,
}

impl RelatedCandidates {
    /// Create a new related-branch provider
    pub fn new(graph: Arc<SocialGraph>) -> Self {
        Self {
            graph,
            mutual_weight: 1.0,
            one_way_weight: 0.5,
        }
    }

    /// Configure the mutual-follow base weight (default: 1.0)
    pub fn with_mutual_weight(mut self, weight: f64) -> Self {
        self.mutual_weight = weight;
        self
    }

    /// Configure the one-way follow base weight (default: 0.5)
    pub fn with_one_way_weight(mut self, weight: f64) -> Self {
        self.one_way_weight = weight;
        self
    }

    /// Retrieve connected users matching the query (synchronous).
    #[instrument(skip(self, query), fields(requester_id = query.requester_id))]
    pub fn get_candidates(&self, query: &CandidateQuery) -> Result<Vec<RawCandidate>> {
        let requester = requester_profile(&self.graph, query.requester_id)?;
        let matches = self.graph.find_by_term(&query.term, Some(requester.id));
        debug!("{} users match '{}'", matches.len(), query.term);

        let mut rows: Vec<RawCandidate> = matches
            .par_iter()
            .filter_map(|&id| {
                let user = self.graph.get_user(id)?;
                let rel = self.graph.relationship(requester.id, id);
                if !rel.is_connected() {
                    return None;
                }
                let weight = if rel.is_mutual_follow() {
                    self.mutual_weight
                } else {
                    self.one_way_weight
                };
                Some(build_raw_candidate(&self.graph, requester, user, Some(weight)))
            })
            .collect();

        sort_rows(&mut rows);
        rows.truncate(query.limit);

        debug!("Generated {} related candidates", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl CandidateProvider for RelatedCandidates {
    fn name(&self) -> &str {
        "RelatedCandidates"
    }

    fn branch(&self) -> CandidateBranch {
        CandidateBranch::Related
    }

    async fn process(&self, query: &CandidateQuery) -> Result<Vec<RawCandidate>> {
        // Graph scans are CPU-bound; keep them off the async workers
        let provider = self.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || provider.get_candidates(&query))
            .await
            .context("Related candidates task panicked")?
    }
}
