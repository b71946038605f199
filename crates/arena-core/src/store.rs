use futures::channel::mpsc::UnboundedReceiver;
use serde::{Deserialize, Serialize};

use crate::participant::{ParticipantPatch, RoomParticipant};
use crate::player::{Player, PlayerStats};
use crate::room::{GameKind, RoomStatus};
use crate::{ParticipantId, PlayerId, RoomId};

/// Failure of a remote-store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The request never produced a response.
    Network(String),
    /// The store answered but refused the operation (policy, constraint).
    Rejected { status: u16, message: String },
    /// The addressed row does not exist.
    NotFound(String),
    /// The response body could not be decoded.
    Decode(String),
    /// The subscription channel or client has been shut down.
    Closed,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network error: {e}"),
            Self::Rejected { status, message } => write!(f, "rejected ({status}): {message}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::Closed => write!(f, "store closed"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Outcome row written once per player per finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub score: u32,
    pub rank: u32,
    pub game_kind: GameKind,
}

/// A row-level change on the participants of one room.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantChange {
    Inserted(RoomParticipant),
    Updated(RoomParticipant),
    Deleted(ParticipantId),
}

impl ParticipantChange {
    pub fn participant_id(&self) -> ParticipantId {
        match self {
            Self::Inserted(p) | Self::Updated(p) => p.id,
            Self::Deleted(id) => *id,
        }
    }
}

/// Handle for an active change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Change notifications for one room, delivered through a queue the session
/// drains once per tick.
pub struct ChangeSubscription {
    pub id: SubscriptionId,
    pub events: UnboundedReceiver<ParticipantChange>,
}

/// The hosted data backend, seen from the game session.
///
/// Every operation may fail; callers inside a running session log and drop
/// failures instead of retrying.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Snapshot of every participant in a room, in join order.
    async fn read_participants(&self, room_id: RoomId)
    -> Result<Vec<RoomParticipant>, StoreError>;

    /// Profiles for the given players. Unknown ids are silently omitted.
    async fn read_players(&self, player_ids: &[PlayerId]) -> Result<Vec<Player>, StoreError>;

    async fn read_player(&self, player_id: PlayerId) -> Result<Player, StoreError>;

    /// Start receiving insert/update/delete notifications for a room's participants.
    fn subscribe_participant_changes(
        &self,
        room_id: RoomId,
    ) -> Result<ChangeSubscription, StoreError>;

    /// Stop a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);

    async fn update_participant(
        &self,
        participant_id: ParticipantId,
        patch: &ParticipantPatch,
    ) -> Result<(), StoreError>;

    async fn delete_participant(&self, participant_id: ParticipantId) -> Result<(), StoreError>;

    async fn insert_score_record(&self, record: &ScoreRecord) -> Result<(), StoreError>;

    /// Overwrite a player's cumulative statistics.
    async fn update_player_stats(
        &self,
        player_id: PlayerId,
        stats: &PlayerStats,
    ) -> Result<(), StoreError>;

    async fn update_room_status(&self, room_id: RoomId, status: RoomStatus)
    -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_detail() {
        let e = StoreError::Rejected {
            status: 403,
            message: "row-level security".to_string(),
        };
        assert_eq!(e.to_string(), "rejected (403): row-level security");
        assert_eq!(StoreError::Closed.to_string(), "store closed");
    }

    #[test]
    fn change_reports_participant_id() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(ParticipantChange::Deleted(id).participant_id(), id);
    }
}
