//! Exclusion passes run by the security filter.
//!
//! Each pass answers one question about one candidate. The filter runs
//! them independently and unions their answers.

pub mod blocked_user;
pub mod content_policy;
pub mod requester_guard;
pub mod spam;

// Re-export for convenience
pub use blocked_user::BlockedUserPass;
pub use content_policy::ContentPolicyPass;
pub use requester_guard::RequesterGuardPass;
pub use spam::SpamPass;
