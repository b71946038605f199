use arena_core::player::PlayerStats;
use arena_core::room::{GameKind, RoomStatus};
use arena_core::store::{RemoteStore, ScoreRecord, StoreError};
use arena_core::{PlayerId, RoomId};

use crate::clock::ClockTick;

/// Session outcome lifecycle. `Finalized` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinalizerState {
    #[default]
    Active,
    Finalizing,
    Finalized,
}

/// Edge-triggered gate around session finalization.
#[derive(Debug, Clone, Default)]
pub struct Finalizer {
    state: FinalizerState,
}

impl Finalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FinalizerState {
        self.state
    }

    /// Move `Active -> Finalizing` on the clock's expiry edge. Returns `true`
    /// exactly once per session; every other tick or state is a no-op.
    pub fn begin(&mut self, tick: ClockTick) -> bool {
        if tick == ClockTick::Expired && self.state == FinalizerState::Active {
            self.state = FinalizerState::Finalizing;
            true
        } else {
            false
        }
    }

    /// Move `Finalizing -> Finalized`. Ignored in any other state.
    pub fn complete(&mut self) {
        if self.state == FinalizerState::Finalizing {
            self.state = FinalizerState::Finalized;
        }
    }
}

/// Everything needed to persist the session outcome, captured at the expiry
/// edge so later state changes cannot affect it.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizePlan {
    pub record: ScoreRecord,
    /// Statistics snapshot held by the session, if the profile had loaded.
    /// When absent the current values are read from the store first.
    pub base_stats: Option<PlayerStats>,
}

impl FinalizePlan {
    pub fn new(
        room_id: RoomId,
        player_id: PlayerId,
        score: u32,
        rank: usize,
        game_kind: GameKind,
        base_stats: Option<PlayerStats>,
    ) -> Self {
        Self {
            record: ScoreRecord {
                room_id,
                player_id,
                score,
                rank: u32::try_from(rank).unwrap_or(u32::MAX),
                game_kind,
            },
            base_stats,
        }
    }

    pub fn rank(&self) -> usize {
        self.record.rank as usize
    }

    pub fn is_win(&self) -> bool {
        self.record.rank == 1
    }
}

/// Which of the three finalization writes went through.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeReport {
    pub score_record: Result<(), StoreError>,
    pub player_stats: Result<PlayerStats, StoreError>,
    pub room_status: Result<(), StoreError>,
}

impl FinalizeReport {
    pub fn is_complete(&self) -> bool {
        self.score_record.is_ok() && self.player_stats.is_ok() && self.room_status.is_ok()
    }

    pub fn failures(&self) -> usize {
        [
            self.score_record.is_err(),
            self.player_stats.is_err(),
            self.room_status.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

async fn write_stats<S: RemoteStore>(
    store: &S,
    plan: &FinalizePlan,
) -> Result<PlayerStats, StoreError> {
    let player_id = plan.record.player_id;
    let base = match plan.base_stats {
        Some(stats) => stats,
        None => store.read_player(player_id).await?.stats,
    };
    let stats = base.accumulate(plan.record.score, plan.rank());
    store.update_player_stats(player_id, &stats).await?;
    Ok(stats)
}

/// Persist the outcome: score record, accumulated player statistics, and the
/// room's `Finished` status. Each write is attempted regardless of the others
/// and none is retried; failures are logged and reported.
pub async fn persist<S: RemoteStore>(store: &S, plan: &FinalizePlan) -> FinalizeReport {
    let record = &plan.record;

    let score_record = store.insert_score_record(record).await;
    if let Err(e) = &score_record {
        tracing::warn!(room_id = %record.room_id, player_id = %record.player_id, error = %e, "Failed to save score record");
    }

    let player_stats = write_stats(store, plan).await;
    if let Err(e) = &player_stats {
        tracing::warn!(player_id = %record.player_id, error = %e, "Failed to update player stats");
    }

    let room_status = store
        .update_room_status(record.room_id, RoomStatus::Finished)
        .await;
    if let Err(e) = &room_status {
        tracing::warn!(room_id = %record.room_id, error = %e, "Failed to mark room finished");
    }

    let report = FinalizeReport {
        score_record,
        player_stats,
        room_status,
    };
    tracing::info!(
        room_id = %record.room_id,
        player_id = %record.player_id,
        score = record.score,
        rank = record.rank,
        failures = report.failures(),
        "Session finalized"
    );
    report
}
