//! Fixture-backed `Connector`, used in tests and local development.
//!
//! The fixture format matches the domain record schema one-to-one
//! (§4.4): a [`Fixture`] is just the four tables — `events`, `users`,
//! `interactions`, `social_edges` — deserialized straight from JSON with
//! no adaptation layer, mirroring the teacher's `tests/e2e` fixture/
//! `TestDataFactory` pattern of building domain records directly rather
//! than through a parsing DSL.

use super::{Connector, ConnectorError};
use crate::domain::{Event, EventId, Interaction, InteractionKind, SocialEdge, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub social_edges: Vec<SocialEdge>,
}

impl Fixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| ConnectorError::Io(format!("{}: {e}", path.as_ref().display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ConnectorError::Invalid(format!("malformed fixture: {e}")))
    }

    /// Self-loops are forbidden by the domain model (§3 SocialEdge); a
    /// fixture violating this is a test-authoring bug, not something the
    /// Connector should silently tolerate.
    fn validate(&self) -> Result<(), ConnectorError> {
        for edge in &self.social_edges {
            if edge.follower == edge.followee {
                return Err(ConnectorError::Invalid(format!(
                    "self-loop in social graph: {}",
                    edge.follower
                )));
            }
        }
        Ok(())
    }
}

/// Fixture-backed [`Connector`] implementation. Immutable after
/// construction; all methods are read-only scans over the fixture's
/// in-memory vectors, which is plenty fast at the fixture sizes tests
/// and local development use.
pub struct MockConnector {
    fixture: Fixture,
}

impl MockConnector {
    pub fn new(fixture: Fixture) -> Result<Self, ConnectorError> {
        fixture.validate()?;
        Ok(Self { fixture })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        Self::new(Fixture::load(path)?)
    }
}

impl Connector for MockConnector {
    fn future_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>, ConnectorError> {
        Ok(self
            .fixture
            .events
            .iter()
            .filter(|e| e.is_future_candidate(now))
            .cloned()
            .collect())
    }

    fn active_users(&self) -> Result<Vec<User>, ConnectorError> {
        Ok(self.fixture.users.clone())
    }

    fn get_user(&self, user_id: &str) -> Result<Option<User>, ConnectorError> {
        Ok(self.fixture.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    fn get_event(&self, event_id: EventId) -> Result<Option<Event>, ConnectorError> {
        Ok(self.fixture.events.iter().find(|e| e.event_id == event_id).cloned())
    }

    fn recent_interactions(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Interaction>, ConnectorError> {
        Ok(self
            .fixture
            .interactions
            .iter()
            .filter(|i| {
                i.user_id == user_id
                    && i.created_at >= since
                    && i.kind != InteractionKind::FriendGoing
            })
            .cloned()
            .collect())
    }

    fn followees(&self, user_id: &str) -> Result<Vec<UserId>, ConnectorError> {
        Ok(self
            .fixture
            .social_edges
            .iter()
            .filter(|e| e.follower == user_id)
            .map(|e| e.followee.clone())
            .collect())
    }

    fn category_dictionary(&self) -> Result<Vec<String>, ConnectorError> {
        let mut set: HashSet<&str> = HashSet::new();
        for e in &self.fixture.events {
            set.insert(e.category.as_str());
        }
        let mut out: Vec<String> = set.into_iter().map(String::from).collect();
        out.sort();
        Ok(out)
    }

    fn tag_dictionary(&self) -> Result<Vec<String>, ConnectorError> {
        let mut set: HashSet<&str> = HashSet::new();
        for e in &self.fixture.events {
            for t in &e.tags {
                set.insert(t.as_str());
            }
        }
        let mut out: Vec<String> = set.into_iter().map(String::from).collect();
        out.sort();
        Ok(out)
    }

    fn friends_engaged(
        &self,
        event_id: EventId,
        followee_ids: &[UserId],
    ) -> Result<Vec<UserId>, ConnectorError> {
        let engaged: HashSet<&str> = self
            .fixture
            .interactions
            .iter()
            .filter(|i| {
                i.event_id == event_id
                    && matches!(i.kind, InteractionKind::Going | InteractionKind::Interested)
            })
            .map(|i| i.user_id.as_str())
            .collect();
        Ok(followee_ids
            .iter()
            .filter(|id| engaged.contains(id.as_str()))
            .cloned()
            .collect())
    }
}
