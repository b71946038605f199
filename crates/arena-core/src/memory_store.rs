use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use futures::channel::mpsc::{self, UnboundedSender};

use crate::participant::{ParticipantPatch, RoomParticipant};
use crate::player::{Player, PlayerStats};
use crate::room::RoomStatus;
use crate::store::{
    ChangeSubscription, ParticipantChange, RemoteStore, ScoreRecord, StoreError, SubscriptionId,
};
use crate::{ParticipantId, PlayerId, RoomId};

/// In-process `RemoteStore` with push notifications.
///
/// Backs the headless simulator and the test suites. Row changes fan out to
/// every subscriber of the affected room, including the writer's own
/// subscription, the same way a hosted realtime channel echoes writes.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    players: HashMap<PlayerId, Player>,
    participants: Vec<RoomParticipant>,
    rooms: HashMap<RoomId, RoomStatus>,
    score_records: Vec<ScoreRecord>,
    participant_writes: Vec<(ParticipantId, ParticipantPatch)>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

struct Subscriber {
    id: SubscriptionId,
    room_id: RoomId,
    tx: UnboundedSender<ParticipantChange>,
}

impl Inner {
    fn notify(&mut self, room_id: RoomId, change: ParticipantChange) {
        self.subscribers.retain(|sub| {
            if sub.room_id != room_id {
                return true;
            }
            let delivered = sub.tx.unbounded_send(change.clone()).is_ok();
            if !delivered {
                tracing::debug!(subscription = sub.id.0, "Dropping closed change subscription");
            }
            delivered
        });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_player(&self, player: Player) {
        self.lock().players.insert(player.id, player);
    }

    pub fn set_room(&self, room_id: RoomId, status: RoomStatus) {
        self.lock().rooms.insert(room_id, status);
    }

    /// Add a participant row and notify the room's subscribers.
    pub fn insert_participant(&self, participant: RoomParticipant) {
        let mut inner = self.lock();
        let room_id = participant.room_id;
        inner.participants.push(participant.clone());
        inner.notify(room_id, ParticipantChange::Inserted(participant));
    }

    pub fn player(&self, player_id: PlayerId) -> Option<Player> {
        self.lock().players.get(&player_id).cloned()
    }

    pub fn room_status(&self, room_id: RoomId) -> Option<RoomStatus> {
        self.lock().rooms.get(&room_id).copied()
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<RoomParticipant> {
        self.lock()
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned()
    }

    pub fn score_records(&self) -> Vec<ScoreRecord> {
        self.lock().score_records.clone()
    }

    /// Every participant patch accepted so far, in arrival order.
    pub fn participant_writes(&self) -> Vec<(ParticipantId, ParticipantPatch)> {
        self.lock().participant_writes.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl RemoteStore for MemoryStore {
    async fn read_participants(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<RoomParticipant>, StoreError> {
        let inner = self.lock();
        let mut rows: Vec<RoomParticipant> = inner
            .participants
            .iter()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.joined_at);
        Ok(rows)
    }

    async fn read_players(&self, player_ids: &[PlayerId]) -> Result<Vec<Player>, StoreError> {
        let inner = self.lock();
        Ok(player_ids
            .iter()
            .filter_map(|id| inner.players.get(id).cloned())
            .collect())
    }

    async fn read_player(&self, player_id: PlayerId) -> Result<Player, StoreError> {
        self.lock()
            .players
            .get(&player_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("player {player_id}")))
    }

    fn subscribe_participant_changes(
        &self,
        room_id: RoomId,
    ) -> Result<ChangeSubscription, StoreError> {
        let mut inner = self.lock();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        let (tx, events) = mpsc::unbounded();
        inner.subscribers.push(Subscriber { id, room_id, tx });
        Ok(ChangeSubscription { id, events })
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.lock().subscribers.retain(|s| s.id != subscription);
    }

    async fn update_participant(
        &self,
        participant_id: ParticipantId,
        patch: &ParticipantPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let row = inner
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id)
            .ok_or_else(|| StoreError::NotFound(format!("participant {participant_id}")))?;
        patch.apply_to(row);
        let updated = row.clone();
        inner.participant_writes.push((participant_id, patch.clone()));
        inner.notify(updated.room_id, ParticipantChange::Updated(updated));
        Ok(())
    }

    async fn delete_participant(&self, participant_id: ParticipantId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let idx = inner
            .participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or_else(|| StoreError::NotFound(format!("participant {participant_id}")))?;
        let removed = inner.participants.remove(idx);
        inner.notify(removed.room_id, ParticipantChange::Deleted(participant_id));
        Ok(())
    }

    async fn insert_score_record(&self, record: &ScoreRecord) -> Result<(), StoreError> {
        self.lock().score_records.push(record.clone());
        Ok(())
    }

    async fn update_player_stats(
        &self,
        player_id: PlayerId,
        stats: &PlayerStats,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let player = inner
            .players
            .get_mut(&player_id)
            .ok_or_else(|| StoreError::NotFound(format!("player {player_id}")))?;
        player.stats = *stats;
        Ok(())
    }

    async fn update_room_status(
        &self,
        room_id: RoomId,
        status: RoomStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner.rooms.get_mut(&room_id) {
            Some(current) => {
                *current = status;
                Ok(())
            },
            None => Err(StoreError::NotFound(format!("room {room_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use uuid::Uuid;

    use super::*;
    use crate::participant::Position;

    fn participant(room_id: RoomId, joined_at: u64) -> RoomParticipant {
        RoomParticipant {
            id: Uuid::new_v4(),
            room_id,
            player_id: Uuid::new_v4(),
            position: Position::new(100.0, 100.0),
            score: 0,
            is_ready: true,
            joined_at,
        }
    }

    #[test]
    fn read_participants_orders_by_join_time() {
        let store = MemoryStore::new();
        let room = Uuid::new_v4();
        let late = participant(room, 20);
        let early = participant(room, 10);
        store.insert_participant(late.clone());
        store.insert_participant(early.clone());
        store.insert_participant(participant(Uuid::new_v4(), 0));

        let rows = block_on(store.read_participants(room)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, early.id);
        assert_eq!(rows[1].id, late.id);
    }

    #[test]
    fn updates_fan_out_to_room_subscribers_only() {
        let store = MemoryStore::new();
        let room = Uuid::new_v4();
        let other_room = Uuid::new_v4();
        let p = participant(room, 0);
        store.insert_participant(p.clone());

        let mut sub = store.subscribe_participant_changes(room).unwrap();
        let mut other = store.subscribe_participant_changes(other_room).unwrap();

        block_on(store.update_participant(p.id, &ParticipantPatch::score(7))).unwrap();

        match sub.events.try_next() {
            Ok(Some(ParticipantChange::Updated(row))) => assert_eq!(row.score, 7),
            other => panic!("expected update, got {other:?}"),
        }
        assert!(other.events.try_next().is_err(), "other room must not see it");
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let room = Uuid::new_v4();
        let sub = store.subscribe_participant_changes(room).unwrap();
        assert_eq!(store.subscriber_count(), 1);
        store.unsubscribe(sub.id);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn delete_unknown_participant_is_not_found() {
        let store = MemoryStore::new();
        let err = block_on(store.delete_participant(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn room_status_update_requires_room() {
        let store = MemoryStore::new();
        let room = Uuid::new_v4();
        assert!(block_on(store.update_room_status(room, RoomStatus::Finished)).is_err());
        store.set_room(room, RoomStatus::Playing);
        block_on(store.update_room_status(room, RoomStatus::Finished)).unwrap();
        assert_eq!(store.room_status(room), Some(RoomStatus::Finished));
    }
}
