use serde::{Deserialize, Serialize};

/// Lifecycle status of a room, as stored remotely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Playing => "playing",
            RoomStatus::Finished => "finished",
        }
    }
}

/// Game mode selected for a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    /// Timed item collection.
    #[default]
    Collect,
    /// Listed in the lobby but has no simulation.
    Racer,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Collect => "collect",
            GameKind::Racer => "racer",
        }
    }

    pub fn is_playable(&self) -> bool {
        matches!(self, GameKind::Collect)
    }
}
