//! Strategy Selector (§4.7)
//!
//! A pure mapping from a strategy name to the weight table the Engine
//! scores candidates with. Adding a strategy is adding one match arm and
//! one parse string — there is no dynamic registration, matching the
//! spec's "closed enumeration" framing.

use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Hybrid,
    FriendsOnly,
    FriendsBoosted,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Hybrid, Strategy::FriendsOnly, Strategy::FriendsBoosted];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Hybrid => "hybrid",
            Strategy::FriendsOnly => "friends_only",
            Strategy::FriendsBoosted => "friends_boosted",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hybrid" => Ok(Strategy::Hybrid),
            "friends_only" => Ok(Strategy::FriendsOnly),
            "friends_boosted" => Ok(Strategy::FriendsBoosted),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown strategy: {other}"
            ))),
        }
    }
}

/// The weight table a [`Strategy`] resolves to (§4.6 step 3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyWeights {
    /// Multiplier applied to content-similarity before the friend boost.
    /// Zero for `friends_only`, where content similarity plays no part.
    pub base_sim_weight: f64,
    /// Per-friend increment in the boost multiplier (or, for
    /// `friends_only`, the per-friend increment of the score itself).
    pub friend_step: f64,
    /// `friend_count` is capped at this value before being multiplied by
    /// `friend_step`.
    pub friend_cap: u32,
    /// If true, candidates with zero engaged friends are dropped rather
    /// than scored.
    pub drop_no_friends: bool,
}

pub fn weights_for(strategy: Strategy) -> StrategyWeights {
    match strategy {
        Strategy::Hybrid => StrategyWeights {
            base_sim_weight: 1.0,
            friend_step: 0.10,
            friend_cap: 5,
            drop_no_friends: false,
        },
        Strategy::FriendsBoosted => StrategyWeights {
            base_sim_weight: 1.0,
            friend_step: 0.30,
            friend_cap: 5,
            drop_no_friends: false,
        },
        Strategy::FriendsOnly => StrategyWeights {
            base_sim_weight: 0.0,
            friend_step: 0.30,
            friend_cap: 5,
            drop_no_friends: true,
        },
    }
}
