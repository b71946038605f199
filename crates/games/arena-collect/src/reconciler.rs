use arena_core::participant::{ParticipantPatch, Position, RoomParticipant};
use arena_core::store::ParticipantChange;
use arena_core::{ParticipantId, PlayerId};

use crate::outbox::StoreWrite;

/// Where an inbound change originated relative to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// An echo of this client's own participant row.
    Local,
    /// Another player's row.
    Remote,
}

/// An inbound change tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorUpdate {
    pub origin: Origin,
    pub change: ParticipantChange,
}

/// Every participant of the room, in join order. Remote entries are mirrors
/// that are only ever replaced whole; the local entry is kept as a placeholder
/// for ordering and is never overwritten by echoes.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RoomParticipant>,
}

impl Roster {
    pub fn new(mut entries: Vec<RoomParticipant>) -> Self {
        entries.sort_by_key(|p| p.joined_at);
        Self { entries }
    }

    pub fn entries(&self) -> &[RoomParticipant] {
        &self.entries
    }

    pub fn get(&self, id: ParticipantId) -> Option<&RoomParticipant> {
        self.entries.iter().find(|p| p.id == id)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.entries.iter().map(|p| p.player_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace an existing entry wholesale, or append a new one.
    fn upsert(&mut self, participant: RoomParticipant) {
        match self.entries.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => self.entries.push(participant),
        }
    }

    fn remove(&mut self, id: ParticipantId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p.id != id);
        self.entries.len() != before
    }
}

/// Mediates between the locally authoritative participant and the mirrored
/// rows of everyone else.
///
/// Outbound position writes are throttled to one per push interval of
/// simulated time; score writes go out immediately.
#[derive(Debug, Clone)]
pub struct Reconciler {
    local_id: ParticipantId,
    push_interval_ms: f64,
    last_push_ms: Option<f64>,
    last_pushed: Position,
}

impl Reconciler {
    pub fn new(local_id: ParticipantId, initial: Position, push_interval_ms: f64) -> Self {
        Self {
            local_id,
            push_interval_ms,
            last_push_ms: None,
            last_pushed: initial,
        }
    }

    pub fn tag(&self, change: ParticipantChange) -> MirrorUpdate {
        let origin = if change.participant_id() == self.local_id {
            Origin::Local
        } else {
            Origin::Remote
        };
        MirrorUpdate { origin, change }
    }

    /// Apply a tagged change to the roster. Local-origin changes are dropped so
    /// the locally computed position and score stay authoritative. Returns
    /// whether the roster changed.
    pub fn apply(&self, roster: &mut Roster, update: MirrorUpdate) -> bool {
        if update.origin == Origin::Local {
            tracing::trace!(participant_id = %self.local_id, "Ignoring echo of local participant");
            return false;
        }
        match update.change {
            ParticipantChange::Inserted(p) | ParticipantChange::Updated(p) => {
                roster.upsert(p);
                true
            },
            ParticipantChange::Deleted(id) => roster.remove(id),
        }
    }

    /// Replace every remote mirror from a full snapshot (the poll path). The
    /// local entry is carried over from the current roster.
    pub fn resync(&self, roster: &mut Roster, snapshot: Vec<RoomParticipant>) {
        let local = roster.get(self.local_id).cloned();
        let mut entries: Vec<RoomParticipant> = snapshot
            .into_iter()
            .filter(|p| p.id != self.local_id)
            .collect();
        if let Some(local) = local {
            entries.push(local);
        }
        *roster = Roster::new(entries);
    }

    /// Position write for this tick, if one is due. Pushes only when the
    /// position differs from the last pushed one and the interval has elapsed,
    /// so a position suppressed by the throttle is still sent once the window
    /// reopens.
    pub fn position_write(&mut self, position: Position, now_ms: f64) -> Option<StoreWrite> {
        if position == self.last_pushed {
            return None;
        }
        if let Some(last) = self.last_push_ms
            && now_ms - last < self.push_interval_ms
        {
            return None;
        }
        self.last_push_ms = Some(now_ms);
        self.last_pushed = position;
        Some(StoreWrite::UpdateParticipant {
            participant_id: self.local_id,
            patch: ParticipantPatch::position(position),
        })
    }

    /// Score write, sent immediately on every scoring event.
    pub fn score_write(&self, score: u32) -> StoreWrite {
        StoreWrite::UpdateParticipant {
            participant_id: self.local_id,
            patch: ParticipantPatch::score(score),
        }
    }
}
