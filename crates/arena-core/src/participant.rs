use serde::{Deserialize, Serialize};

use crate::{ParticipantId, PlayerId, RoomId};

/// A point in arena coordinates (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A player's presence record within one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomParticipant {
    pub id: ParticipantId,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub position: Position,
    pub score: u32,
    pub is_ready: bool,
    /// Unix epoch milliseconds.
    pub joined_at: u64,
}

/// Partial update of a participant row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
}

impl ParticipantPatch {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn score(score: u32) -> Self {
        Self {
            score: Some(score),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.score.is_none() && self.is_ready.is_none()
    }

    /// Apply the present fields onto a participant record.
    pub fn apply_to(&self, participant: &mut RoomParticipant) {
        if let Some(position) = self.position {
            participant.position = position;
        }
        if let Some(score) = self.score {
            participant.score = score;
        }
        if let Some(ready) = self.is_ready {
            participant.is_ready = ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut p = RoomParticipant {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            position: Position::new(10.0, 10.0),
            score: 5,
            is_ready: true,
            joined_at: 0,
        };
        ParticipantPatch::score(40).apply_to(&mut p);
        assert_eq!(p.score, 40);
        assert_eq!(p.position, Position::new(10.0, 10.0));
        assert!(p.is_ready);
    }

    #[test]
    fn empty_patch_detected() {
        assert!(ParticipantPatch::default().is_empty());
        assert!(!ParticipantPatch::position(Position::default()).is_empty());
    }
}
