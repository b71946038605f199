pub mod memory_store;
pub mod participant;
pub mod player;
pub mod room;
pub mod store;
pub mod time;

/// Identifier of a registered player.
pub type PlayerId = uuid::Uuid;
/// Identifier of a player's presence row within one room.
pub type ParticipantId = uuid::Uuid;
/// Identifier of a room.
pub type RoomId = uuid::Uuid;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use uuid::Uuid;

    use crate::memory_store::MemoryStore;
    use crate::participant::{ParticipantPatch, Position, RoomParticipant};
    use crate::player::{Player, PlayerColor, PlayerStats};
    use crate::room::RoomStatus;
    use crate::store::{ChangeSubscription, RemoteStore, ScoreRecord, StoreError, SubscriptionId};
    use crate::{ParticipantId, PlayerId, RoomId};

    /// Create `n` test players with palette colors and empty statistics.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                id: Uuid::new_v4(),
                username: format!("player{}", i + 1),
                color: PlayerColor::PALETTE[i % PlayerColor::PALETTE.len()],
                stats: PlayerStats::default(),
            })
            .collect()
    }

    /// One participant per player, joined one second apart in list order.
    pub fn make_participants(room_id: RoomId, players: &[Player]) -> Vec<RoomParticipant> {
        players
            .iter()
            .enumerate()
            .map(|(i, player)| RoomParticipant {
                id: Uuid::new_v4(),
                room_id,
                player_id: player.id,
                position: Position::new(100.0 + 60.0 * i as f32, 300.0),
                score: 0,
                is_ready: true,
                joined_at: 1_000 * (i as u64 + 1),
            })
            .collect()
    }

    /// A room in `Playing` status seeded with `n` players and participants.
    pub struct SeededRoom {
        pub store: MemoryStore,
        pub room_id: RoomId,
        pub players: Vec<Player>,
        pub participants: Vec<RoomParticipant>,
    }

    pub fn seeded_room(n: usize) -> SeededRoom {
        let store = MemoryStore::new();
        let room_id = Uuid::new_v4();
        store.set_room(room_id, RoomStatus::Playing);
        let players = make_players(n);
        for player in &players {
            store.insert_player(player.clone());
        }
        let participants = make_participants(room_id, &players);
        for p in &participants {
            store.insert_participant(p.clone());
        }
        SeededRoom {
            store,
            room_id,
            players,
            participants,
        }
    }

    /// Operations a `FailingStore` can be told to reject.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StoreOp {
        UpdateParticipant,
        DeleteParticipant,
        InsertScoreRecord,
        UpdatePlayerStats,
        UpdateRoomStatus,
    }

    /// Wraps a `MemoryStore`, rejecting the selected write operations and
    /// counting every attempt.
    pub struct FailingStore {
        pub inner: MemoryStore,
        failing: HashSet<StoreOp>,
        attempts: Mutex<Vec<StoreOp>>,
    }

    impl FailingStore {
        pub fn new(inner: MemoryStore, failing: &[StoreOp]) -> Self {
            Self {
                inner,
                failing: failing.iter().copied().collect(),
                attempts: Mutex::new(Vec::new()),
            }
        }

        pub fn attempts(&self) -> Vec<StoreOp> {
            self.attempts.lock().unwrap().clone()
        }

        fn gate(&self, op: StoreOp) -> Result<(), StoreError> {
            self.attempts.lock().unwrap().push(op);
            if self.failing.contains(&op) {
                Err(StoreError::Network(format!("{op:?} unavailable")))
            } else {
                Ok(())
            }
        }
    }

    impl RemoteStore for FailingStore {
        async fn read_participants(
            &self,
            room_id: RoomId,
        ) -> Result<Vec<RoomParticipant>, StoreError> {
            self.inner.read_participants(room_id).await
        }

        async fn read_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
            self.inner.read_players(ids).await
        }

        async fn read_player(&self, player_id: PlayerId) -> Result<Player, StoreError> {
            self.inner.read_player(player_id).await
        }

        fn subscribe_participant_changes(
            &self,
            room_id: RoomId,
        ) -> Result<ChangeSubscription, StoreError> {
            self.inner.subscribe_participant_changes(room_id)
        }

        fn unsubscribe(&self, subscription: SubscriptionId) {
            self.inner.unsubscribe(subscription)
        }

        async fn update_participant(
            &self,
            participant_id: ParticipantId,
            patch: &ParticipantPatch,
        ) -> Result<(), StoreError> {
            self.gate(StoreOp::UpdateParticipant)?;
            self.inner.update_participant(participant_id, patch).await
        }

        async fn delete_participant(&self, participant_id: ParticipantId) -> Result<(), StoreError> {
            self.gate(StoreOp::DeleteParticipant)?;
            self.inner.delete_participant(participant_id).await
        }

        async fn insert_score_record(&self, record: &ScoreRecord) -> Result<(), StoreError> {
            self.gate(StoreOp::InsertScoreRecord)?;
            self.inner.insert_score_record(record).await
        }

        async fn update_player_stats(
            &self,
            player_id: PlayerId,
            stats: &PlayerStats,
        ) -> Result<(), StoreError> {
            self.gate(StoreOp::UpdatePlayerStats)?;
            self.inner.update_player_stats(player_id, stats).await
        }

        async fn update_room_status(
            &self,
            room_id: RoomId,
            status: RoomStatus,
        ) -> Result<(), StoreError> {
            self.gate(StoreOp::UpdateRoomStatus)?;
            self.inner.update_room_status(room_id, status).await
        }
    }
}
