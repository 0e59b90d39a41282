//! Core domain types for the social graph fixture.
//!
//! This module defines the user profile records and the `SocialGraph`
//! store that candidate providers query. The graph keeps one adjacency
//! map per relationship kind and per direction so every relationship
//! question is a pair of set lookups.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a platform user
pub type UserId = u64;

/// Mean Earth radius used by the haversine distance
const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// User-related Types
// =============================================================================

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// A user as stored by the platform.
///
/// The counters are the platform's denormalized public statistics; they are
/// not recomputed from the edge lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub verified: bool,
    pub follower_count: u64,
    pub following_count: u64,
    pub moment_count: u64,
    pub avatar_url: Option<String>,
    pub location: Option<GeoPoint>,
}

/// The kind of directed edge between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Follow,
    Block,
    Mute,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Follow => "follow",
            EdgeKind::Block => "block",
            EdgeKind::Mute => "mute",
        }
    }
}

/// A directed edge: `from` follows/blocks/mutes `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: UserId,
    pub to: UserId,
}

/// Every relationship flag between a viewer and another user, seen from the
/// viewer's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relationship {
    pub viewer_follows: bool,
    pub follows_viewer: bool,
    pub viewer_blocks: bool,
    pub blocks_viewer: bool,
    pub viewer_mutes: bool,
}

impl Relationship {
    pub fn is_mutual_follow(&self) -> bool {
        self.viewer_follows && self.follows_viewer
    }

    /// Connected means a follow edge exists in either direction.
    pub fn is_connected(&self) -> bool {
        self.viewer_follows || self.follows_viewer
    }
}

// =============================================================================
// SocialGraph - The In-Memory Store
// =============================================================================

/// Holds every user, their outgoing follow/block/mute edges and who blocks them.
#[derive(Debug)]
pub struct SocialGraph {
    pub(crate) users: HashMap<UserId, UserProfile>,

    /// Users each user follows
    pub(crate) following: HashMap<UserId, HashSet<UserId>>,
    /// Users each user blocks
    pub(crate) blocking: HashMap<UserId, HashSet<UserId>>,
    /// Users blocking each user
    pub(crate) blocked_by: HashMap<UserId, HashSet<UserId>>,
    /// Users each user mutes
    pub(crate) muting: HashMap<UserId, HashSet<UserId>>,

    /// Lowercased username -> id, also used to reject duplicate handles
    pub(crate) username_index: HashMap<String, UserId>,
}

impl SocialGraph {
    /// Creates a new, empty SocialGraph
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            following: HashMap::new(),
            blocking: HashMap::new(),
            blocked_by: HashMap::new(),
            muting: HashMap::new(),
            username_index: HashMap::new(),
        }
    }

    /// Get a user by ID
    pub fn get_user(&self, id: UserId) -> Option<&UserProfile> {
        self.users.get(&id)
    }

    /// Look up a user by handle (case-insensitive)
    pub fn get_user_by_username(&self, username: &str) -> Option<&UserProfile> {
        self.username_index
            .get(&username.to_lowercase())
            .and_then(|id| self.users.get(id))
    }

    /// Users `id` follows (empty if none)
    pub fn following_of(&self, id: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.following.get(&id).into_iter().flatten().copied()
    }

    pub fn follows(&self, from: UserId, to: UserId) -> bool {
        contains_edge(&self.following, from, to)
    }

    pub fn blocks(&self, from: UserId, to: UserId) -> bool {
        contains_edge(&self.blocking, from, to)
    }

    pub fn mutes(&self, from: UserId, to: UserId) -> bool {
        contains_edge(&self.muting, from, to)
    }

    /// All relationship flags between `viewer` and `other`.
    pub fn relationship(&self, viewer: UserId, other: UserId) -> Relationship {
        Relationship {
            viewer_follows: self.follows(viewer, other),
            follows_viewer: self.follows(other, viewer),
            viewer_blocks: self.blocks(viewer, other),
            blocks_viewer: contains_edge(&self.blocked_by, viewer, other),
            viewer_mutes: self.mutes(viewer, other),
        }
    }

    /// Number of accounts `viewer` follows that also follow `other`.
    pub fn shared_connections(&self, viewer: UserId, other: UserId) -> usize {
        self.following_of(viewer)
            .filter(|&middle| middle != other && self.follows(middle, other))
            .count()
    }

    /// Number of blocks `id` has issued
    pub fn block_count(&self, id: UserId) -> usize {
        self.blocking.get(&id).map_or(0, |set| set.len())
    }

    /// Number of mutes `id` has issued
    pub fn mute_count(&self, id: UserId) -> usize {
        self.muting.get(&id).map_or(0, |set| set.len())
    }

    /// Every user id, sorted ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // Mutators used during loading

    /// Insert a user into the graph
    pub fn insert_user(&mut self, user: UserProfile) {
        self.username_index.insert(user.username.to_lowercase(), user.id);
        self.users.insert(user.id, user);
    }

    /// Insert a directed edge (blocks also update the `blocked_by` index)
    pub fn insert_edge(&mut self, kind: EdgeKind, edge: Edge) {
        match kind {
            EdgeKind::Follow => {
                self.following.entry(edge.from).or_default().insert(edge.to);
            }
            EdgeKind::Block => {
                self.blocking.entry(edge.from).or_default().insert(edge.to);
                self.blocked_by.entry(edge.to).or_default().insert(edge.from);
            }
            EdgeKind::Mute => {
                self.muting.entry(edge.from).or_default().insert(edge.to);
            }
        }
    }

    /// Get counts for debugging/validation: (users, follows, blocks, mutes)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let edges = |map: &HashMap<UserId, HashSet<UserId>>| map.values().map(|s| s.len()).sum();
        (
            self.users.len(),
            edges(&self.following),
            edges(&self.blocking),
            edges(&self.muting),
        )
    }
}

impl Default for SocialGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_edge(map: &HashMap<UserId, HashSet<UserId>>, from: UserId, to: UserId) -> bool {
    map.get(&from).is_some_and(|set| set.contains(&to))
}
