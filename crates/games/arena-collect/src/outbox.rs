use arena_core::ParticipantId;
use arena_core::participant::ParticipantPatch;
use arena_core::store::{RemoteStore, StoreError};

/// A fire-and-forget write produced by the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    UpdateParticipant {
        participant_id: ParticipantId,
        patch: ParticipantPatch,
    },
    DeleteParticipant {
        participant_id: ParticipantId,
    },
}

impl StoreWrite {
    pub fn participant_id(&self) -> ParticipantId {
        match self {
            Self::UpdateParticipant { participant_id, .. }
            | Self::DeleteParticipant { participant_id } => *participant_id,
        }
    }
}

/// Queue of writes the loop has produced but the host has not sent yet.
/// The loop never waits on a round trip; the host drains this between frames.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<StoreWrite>,
}

impl Outbox {
    pub fn push(&mut self, write: StoreWrite) {
        self.pending.push(write);
    }

    pub fn take(&mut self) -> Vec<StoreWrite> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Send one write. Failures are logged and returned but never retried.
pub async fn dispatch<S: RemoteStore>(store: &S, write: &StoreWrite) -> Result<(), StoreError> {
    let result = match write {
        StoreWrite::UpdateParticipant {
            participant_id,
            patch,
        } => store.update_participant(*participant_id, patch).await,
        StoreWrite::DeleteParticipant { participant_id } => {
            store.delete_participant(*participant_id).await
        },
    };
    if let Err(e) = &result {
        tracing::warn!(
            participant_id = %write.participant_id(),
            error = %e,
            "Dropped participant write"
        );
    }
    result
}

/// Send every write in order, each independently. Returns how many failed.
pub async fn dispatch_all<S: RemoteStore>(store: &S, writes: &[StoreWrite]) -> usize {
    let mut failed = 0;
    for write in writes {
        if dispatch(store, write).await.is_err() {
            failed += 1;
        }
    }
    failed
}
