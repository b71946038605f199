//! Table row shapes as the REST endpoint returns and accepts them.

use serde::{Deserialize, Serialize};

use arena_core::participant::{ParticipantPatch, Position, RoomParticipant};
use arena_core::player::{Player, PlayerColor, PlayerStats};
use arena_core::room::RoomStatus;
use arena_core::store::ScoreRecord;
use arena_core::{ParticipantId, PlayerId, RoomId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub id: ParticipantId,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub position_x: f32,
    pub position_y: f32,
    pub score: u32,
    pub is_ready: bool,
    /// Epoch milliseconds.
    pub joined_at: u64,
}

impl From<ParticipantRow> for RoomParticipant {
    fn from(row: ParticipantRow) -> Self {
        RoomParticipant {
            id: row.id,
            room_id: row.room_id,
            player_id: row.player_id,
            position: Position::new(row.position_x, row.position_y),
            score: row.score,
            is_ready: row.is_ready,
            joined_at: row.joined_at,
        }
    }
}

/// Body of a participant PATCH. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParticipantPatchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
}

impl From<&ParticipantPatch> for ParticipantPatchBody {
    fn from(patch: &ParticipantPatch) -> Self {
        Self {
            position_x: patch.position.map(|p| p.x),
            position_y: patch.position.map(|p| p.y),
            score: patch.score,
            is_ready: patch.is_ready,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerRow {
    pub id: PlayerId,
    pub username: String,
    pub avatar_color: Option<String>,
    #[serde(default)]
    pub total_score: u64,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub wins: u32,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        let color = match row.avatar_color.as_deref().map(PlayerColor::from_hex) {
            Some(Some(color)) => color,
            Some(None) => {
                tracing::debug!(player_id = %row.id, "Unparseable avatar color, using placeholder");
                PlayerColor::PLACEHOLDER
            },
            None => PlayerColor::PLACEHOLDER,
        };
        Player {
            id: row.id,
            username: row.username,
            color,
            stats: PlayerStats {
                total_score: row.total_score,
                games_played: row.games_played,
                wins: row.wins,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsBody {
    pub total_score: u64,
    pub games_played: u32,
    pub wins: u32,
}

impl From<&PlayerStats> for StatsBody {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            total_score: stats.total_score,
            games_played: stats.games_played,
            wins: stats.wins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub score: u32,
    pub rank: u32,
    pub game_type: &'static str,
}

impl From<&ScoreRecord> for ScoreRow {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            room_id: record.room_id,
            player_id: record.player_id,
            score: record.score,
            rank: record.rank,
            game_type: record.game_kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomStatusBody {
    pub status: RoomStatus,
}
