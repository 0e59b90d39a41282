//! Helper functions to build RawCandidate rows from the SocialGraph
//!
//! Both graph-backed providers share this: look up the requester once,
//! then derive every relationship flag and the geo distance for a matched
//! user in a single pass.

use crate::types::{PublicStats, RawCandidate};
use anyhow::{anyhow, Result};
use graph_loader::{SocialGraph, UserId, UserProfile};

/// Fetch the requester's profile, failing if they aren't in the graph.
pub fn requester_profile(graph: &SocialGraph, requester_id: UserId) -> Result<&UserProfile> {
    graph
        .get_user(requester_id)
        .ok_or_else(|| anyhow!("Requester {} not found", requester_id))
}

/// Build a raw candidate row for `user` as seen by `requester`.
pub fn build_raw_candidate(
    graph: &SocialGraph,
    requester: &UserProfile,
    user: &UserProfile,
    relationship_weight: Option<f64>,
) -> RawCandidate {
    let rel = graph.relationship(requester.id, user.id);

    let distance_km = match (&requester.location, &user.location) {
        (Some(from), Some(to)) => Some(from.distance_km(to)),
        _ => None,
    };

    RawCandidate {
        id: user.id,
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        verified: user.verified,
        blocked: rel.viewer_blocks,
        blocks_requester: rel.blocks_viewer,
        muted: rel.viewer_mutes,
        requester_follows: rel.viewer_follows,
        follows_requester: rel.follows_viewer,
        mutual_follow: rel.is_mutual_follow(),
        stats: PublicStats {
            follower_count: user.follower_count,
            following_count: user.following_count,
            moment_count: user.moment_count,
        },
        distance_km,
        relationship_weight,
        avatar_url: user.avatar_url.clone(),
    }
}

/// Provider ordering: weight DESC, followers DESC, id ASC.
pub(crate) fn sort_rows(rows: &mut [RawCandidate]) {
    rows.sort_by(|a, b| {
        let wa = a.relationship_weight.unwrap_or(0.0);
        let wb = b.relationship_weight.unwrap_or(0.0);
        wb.total_cmp(&wa)
            .then_with(|| b.stats.follower_count.cmp(&a.stats.follower_count))
            .then_with(|| a.id.cmp(&b.id))
    });
}
