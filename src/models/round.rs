use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Momentum value at which the left side has won
pub const MOMENTUM_MIN: i32 = 0;
/// Momentum value at which the right side has won
pub const MOMENTUM_MAX: i32 = 100;
/// Starting momentum for a fresh round
pub const MOMENTUM_NEUTRAL: i32 = 50;

/// The side a bet backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(format!("Invalid side: {}", s)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Left,
    Right,
    Draw,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Left => "left",
            Winner::Right => "right",
            Winner::Draw => "draw",
        }
    }

    /// The winning side, if the round was not a draw
    pub fn side(&self) -> Option<Side> {
        match self {
            Winner::Left => Some(Side::Left),
            Winner::Right => Some(Side::Right),
            Winner::Draw => None,
        }
    }
}

impl FromStr for Winner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Winner::Left),
            "right" => Ok(Winner::Right),
            "draw" => Ok(Winner::Draw),
            _ => Err(format!("Invalid winner: {}", s)),
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Winner::Left,
            Side::Right => Winner::Right,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two players facing off in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterUser {
    pub handle: String,
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl TwitterUser {
    pub fn new(handle: impl Into<String>, avatar_url: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            handle: handle.into(),
            avatar_url: avatar_url.into(),
            display_name,
        }
    }

    /// Name used in image prompts and logs
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.handle)
    }
}

/// A game round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: i64,
    pub left_user: TwitterUser,
    pub right_user: TwitterUser,
    pub momentum: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub pot_amount: Decimal,
    pub start_time: DateTime<Utc>,
    pub current_deadline: DateTime<Utc>,
    pub max_deadline: DateTime<Utc>,
    pub active: bool,
    pub winner: Option<Winner>,
    pub battle_image_url: Option<String>,
    pub end_reason: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub paid: bool,
}

impl Round {
    /// Momentum sits on an edge; the round only waits for the end-round job
    pub fn is_decided(&self) -> bool {
        self.momentum <= MOMENTUM_MIN || self.momentum >= MOMENTUM_MAX
    }

    /// Whether a bet placed at `now` may still move this round
    pub fn accepts_bets_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_decided() && now < self.current_deadline && now < self.max_deadline
    }
}

/// Values for inserting a new round
#[derive(Debug, Clone)]
pub struct NewRound {
    pub left_user: TwitterUser,
    pub right_user: TwitterUser,
    pub momentum: i32,
    pub start_time: DateTime<Utc>,
    pub current_deadline: DateTime<Utc>,
    pub max_deadline: DateTime<Utc>,
}
