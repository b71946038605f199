use std::collections::HashMap;

use futures::channel::mpsc::UnboundedSender;

use arena_core::participant::RoomParticipant;
use arena_core::store::{ParticipantChange, SubscriptionId};
use arena_core::{ParticipantId, RoomId};

/// Turn two consecutive snapshots of a room into the change events a push
/// channel would have delivered. Deletions come first, then inserts and
/// updates in snapshot order.
pub fn diff_snapshots(
    previous: &HashMap<ParticipantId, RoomParticipant>,
    current: &[RoomParticipant],
) -> Vec<ParticipantChange> {
    let mut changes: Vec<ParticipantChange> = previous
        .keys()
        .filter(|id| !current.iter().any(|p| p.id == **id))
        .map(|id| ParticipantChange::Deleted(*id))
        .collect();
    changes.sort_by_key(|c| c.participant_id());

    for row in current {
        match previous.get(&row.id) {
            None => changes.push(ParticipantChange::Inserted(row.clone())),
            Some(old) if old != row => changes.push(ParticipantChange::Updated(row.clone())),
            Some(_) => {},
        }
    }
    changes
}

/// A poll-backed subscription: the last snapshot seen and where to send the
/// differences.
pub(crate) struct Watch {
    pub id: SubscriptionId,
    pub room_id: RoomId,
    tx: UnboundedSender<ParticipantChange>,
    last: HashMap<ParticipantId, RoomParticipant>,
}

impl Watch {
    pub fn new(id: SubscriptionId, room_id: RoomId, tx: UnboundedSender<ParticipantChange>) -> Self {
        Self {
            id,
            room_id,
            tx,
            last: HashMap::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Deliver the changes since the previous snapshot. Returns `None` once the
    /// receiving side has gone away.
    pub fn advance(&mut self, snapshot: &[RoomParticipant]) -> Option<usize> {
        let changes = diff_snapshots(&self.last, snapshot);
        let count = changes.len();
        for change in changes {
            if self.tx.unbounded_send(change).is_err() {
                return None;
            }
        }
        self.last = snapshot.iter().map(|p| (p.id, p.clone())).collect();
        Some(count)
    }
}
