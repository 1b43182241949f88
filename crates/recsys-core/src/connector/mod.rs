//! Database Connector
//!
//! Read-only view of the domain schema the core depends on: future
//! events, active users, a user's recent interactions, the follow
//! graph, and the category/tag dictionaries. Per spec §1 the schema
//! itself (and any live database) is an external collaborator; this
//! module defines only the trait contract plus the fixture-backed
//! [`MockConnector`] used by tests and local development.
//!
//! All methods are read-only and must be idempotent: calling the same
//! method twice with the same arguments against the same underlying
//! state returns the same records (the Engine's determinism guarantee,
//! §5, depends on this).

mod mock;

pub use mock::{Fixture, MockConnector};

use crate::domain::{Event, EventId, Interaction, User, UserId};
use chrono::{DateTime, Utc};

#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectorError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("connector timed out: {0}")]
    Timeout(String),
    #[error("invalid connector request: {0}")]
    Invalid(String),
    #[error("connector io error: {0}")]
    Io(String),
}

/// The read-only surface the Model Builder and Recommendation Engine
/// depend on (§4.4). Implementors must never mutate domain state.
pub trait Connector: Send + Sync {
    /// All events with `start_time > now` and `archived == false`.
    fn future_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>, ConnectorError>;

    /// All users the core should consider (both account kinds).
    fn active_users(&self) -> Result<Vec<User>, ConnectorError>;

    /// A single user by id, or `Ok(None)` if they do not exist. Used by
    /// the Engine to distinguish "unknown viewer" (-> fallback) from a
    /// viewer with no interactions (-> cold start).
    fn get_user(&self, user_id: &str) -> Result<Option<User>, ConnectorError>;

    /// A single event by id, used to resolve organizer/archival state
    /// outside of whatever is cached in a Vector Store snapshot.
    fn get_event(&self, event_id: EventId) -> Result<Option<Event>, ConnectorError>;

    /// `user_id`'s interactions with `created_at >= since`. Drives both
    /// user-vector synthesis (§4.6 step 1) and the viewer-exclusion set
    /// (§4.6 step 2) — the spec names one such method, so both uses are
    /// served from this one call. Never returns `InteractionKind::FriendGoing`,
    /// which is synthetic and computed per-request by the Engine, not
    /// stored.
    fn recent_interactions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Interaction>, ConnectorError>;

    /// The directed set of users `user_id` follows.
    fn followees(&self, user_id: &str) -> Result<Vec<UserId>, ConnectorError>;

    /// Distinct category names known to the domain.
    fn category_dictionary(&self) -> Result<Vec<String>, ConnectorError>;

    /// Distinct tag names known to the domain.
    fn tag_dictionary(&self) -> Result<Vec<String>, ConnectorError>;

    /// Of `followee_ids`, the subset with a `going` or `interested`
    /// interaction on `event_id`. Per design note §9, `friend_going` and
    /// `friend_interested` are treated as equal-weight friend signals.
    fn friends_engaged(
        &self,
        event_id: EventId,
        followee_ids: &[UserId],
    ) -> Result<Vec<UserId>, ConnectorError>;
}
