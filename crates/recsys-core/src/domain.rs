//! Domain types shared by the Connector, Model Builder, and Engine.
//!
//! These are plain data, not active objects: the Engine never mutates
//! them, and every cross-subsystem reference is an id, resolved back
//! through the Connector or a Vector Store metadata sidecar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event id, as stored by the domain schema.
pub type EventId = i64;

/// An opaque user id (individuals and organizations share the space).
pub type UserId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_attendees: Option<u32>,
    pub organizer_id: UserId,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Auto-archived one day after `end_time`.
    pub fn auto_archive_at(&self) -> DateTime<Utc> {
        self.end_time + chrono::Duration::days(1)
    }

    /// Permanently removed 5 days after archiving.
    pub fn purge_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at.map(|t| t + chrono::Duration::days(5))
    }

    /// A candidate event: non-archived and with a future `start_time`.
    pub fn is_future_candidate(&self, now: DateTime<Utc>) -> bool {
        !self.archived && self.start_time > now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Individual,
    Organization,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Individual => write!(f, "individual"),
            AccountKind::Organization => write!(f, "organization"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub kind: AccountKind,
}

/// Interaction kinds, with the base weights used for user-vector
/// synthesis. `FriendGoing` is synthetic: it is never read
/// from the interactions table, only computed per-request by the Engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Going,
    Interested,
    Organized,
    Viewed,
    FriendGoing,
}

impl InteractionKind {
    /// Base weight for user-vector synthesis.
    pub fn base_weight(self) -> f64 {
        match self {
            InteractionKind::Going => 1.5,
            InteractionKind::Interested => 1.0,
            InteractionKind::Organized => 2.0,
            InteractionKind::Viewed => 0.3,
            InteractionKind::FriendGoing => 0.5,
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InteractionKind::Going => "going",
            InteractionKind::Interested => "interested",
            InteractionKind::Organized => "organized",
            InteractionKind::Viewed => "viewed",
            InteractionKind::FriendGoing => "friend_going",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub event_id: EventId,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

/// Directed follow edge. Self-loops are forbidden by construction in the
/// Connector/fixture layer, not re-checked here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialEdge {
    pub follower: UserId,
    pub followee: UserId,
    pub created_at: DateTime<Utc>,
}
