pub mod bot;
pub mod clock;
pub mod collectible;
pub mod config;
pub mod finalizer;
pub mod input;
pub mod outbox;
pub mod physics;
pub mod reconciler;
pub mod render;
pub mod scoring;

use std::collections::HashMap;

use futures::{FutureExt, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;

use arena_core::participant::{Position, RoomParticipant};
use arena_core::player::Player;
use arena_core::room::GameKind;
use arena_core::store::{ChangeSubscription, RemoteStore, StoreError, SubscriptionId};
use arena_core::{ParticipantId, PlayerId, RoomId};

use clock::{ClockTick, SessionClock};
use collectible::{Collectible, CollectibleField};
use config::CollectConfig;
use finalizer::{FinalizePlan, FinalizeReport, Finalizer, FinalizerState};
use input::InputSampler;
use outbox::{Outbox, StoreWrite};
use physics::TickGate;
use reconciler::{Reconciler, Roster};
use render::{Frame, FrameView};

/// Why a session could not be started.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The room's game kind has no simulation.
    UnsupportedGameKind(GameKind),
    /// The local participant is not in the room's participant list.
    LocalParticipantMissing(ParticipantId),
    /// The session tuning cannot be simulated or drawn.
    InvalidConfig(String),
    Store(StoreError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedGameKind(kind) => {
                write!(f, "game kind '{}' is not playable", kind.as_str())
            },
            Self::LocalParticipantMissing(id) => write!(f, "participant {id} is not in the room"),
            Self::InvalidConfig(reason) => write!(f, "invalid session config: {reason}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// The participant this client controls. Its position and score are computed
/// locally and only ever pushed outward.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalParticipant {
    pub id: ParticipantId,
    pub player_id: PlayerId,
    pub position: Position,
    pub score: u32,
}

/// All mutable session state, owned by the session loop.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub room_id: RoomId,
    pub game_kind: GameKind,
    pub local: LocalParticipant,
    pub roster: Roster,
    pub profiles: HashMap<PlayerId, Player>,
    pub field: CollectibleField,
    pub clock: SessionClock,
    pub input: InputSampler,
}

/// What one animation callback did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Whether a simulation tick ran (the frame was not too soon).
    pub ticked: bool,
    pub moved: bool,
    pub collected: Vec<Collectible>,
    /// Inbound participant changes applied to the roster.
    pub remote_changes: usize,
}

/// Returned by [`CollectSession::leave`]: the write that removes the local
/// participant and the subscription the host must cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub write: StoreWrite,
    pub subscription: Option<SubscriptionId>,
}

/// One timed collection session in a room.
///
/// The host calls [`tick`](Self::tick) from the animation loop,
/// [`on_second`](Self::on_second) from a one-second timer, sends the writes
/// from [`take_writes`](Self::take_writes) without waiting, and runs
/// [`finalizer::persist`] with the plan `on_second` hands back.
pub struct CollectSession {
    state: SessionState,
    config: CollectConfig,
    reconciler: Reconciler,
    finalizer: Finalizer,
    gate: TickGate,
    outbox: Outbox,
    changes: Option<ChangeSubscription>,
}

impl CollectSession {
    /// Build a session from already-fetched room data.
    pub fn new(
        room_id: RoomId,
        game_kind: GameKind,
        local_participant_id: ParticipantId,
        participants: Vec<RoomParticipant>,
        profiles: Vec<Player>,
        changes: Option<ChangeSubscription>,
        config: CollectConfig,
    ) -> Result<Self, SessionError> {
        if !game_kind.is_playable() {
            return Err(SessionError::UnsupportedGameKind(game_kind));
        }
        config.validate().map_err(SessionError::InvalidConfig)?;
        let row = participants
            .iter()
            .find(|p| p.id == local_participant_id)
            .ok_or(SessionError::LocalParticipantMissing(local_participant_id))?;
        let position = physics::clamp_to_arena(row.position, &config);
        let local = LocalParticipant {
            id: row.id,
            player_id: row.player_id,
            position,
            score: row.score,
        };

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let field = CollectibleField::generate(&mut rng, &config);

        tracing::info!(
            %room_id,
            participant_id = %local.id,
            participants = participants.len(),
            collectibles = field.items().len(),
            "Collect session started"
        );

        Ok(Self {
            reconciler: Reconciler::new(local.id, position, config.position_push_interval_ms),
            state: SessionState {
                room_id,
                game_kind,
                local,
                roster: Roster::new(participants),
                profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
                field,
                clock: SessionClock::new(config.countdown_secs),
                input: InputSampler::new(),
            },
            config,
            finalizer: Finalizer::new(),
            gate: TickGate::new(),
            outbox: Outbox::default(),
            changes,
        })
    }

    /// Subscribe to the room, read its participants and their profiles, and
    /// build the session. A failed profile read is tolerated; labels fall back
    /// to placeholders.
    pub async fn start<S: RemoteStore>(
        store: &S,
        room_id: RoomId,
        local_participant_id: ParticipantId,
        game_kind: GameKind,
        config: CollectConfig,
    ) -> Result<Self, SessionError> {
        if !game_kind.is_playable() {
            return Err(SessionError::UnsupportedGameKind(game_kind));
        }
        config.validate().map_err(SessionError::InvalidConfig)?;
        // Subscribe before the snapshot so no change between the two is lost.
        let changes = store.subscribe_participant_changes(room_id)?;
        let subscription = changes.id;

        let participants = match store.read_participants(room_id).await {
            Ok(p) => p,
            Err(e) => {
                store.unsubscribe(subscription);
                return Err(e.into());
            },
        };
        let player_ids: Vec<PlayerId> = participants.iter().map(|p| p.player_id).collect();
        let profiles = match store.read_players(&player_ids).await {
            Ok(players) => players,
            Err(e) => {
                tracing::warn!(%room_id, error = %e, "Failed to load player profiles");
                Vec::new()
            },
        };

        let session = Self::new(
            room_id,
            game_kind,
            local_participant_id,
            participants,
            profiles,
            Some(changes),
            config,
        );
        if session.is_err() {
            store.unsubscribe(subscription);
        }
        session
    }

    /// Use a host-supplied collectible field in place of the generated one.
    /// Meant for construction time, before the first tick.
    pub fn with_field(mut self, field: CollectibleField) -> Self {
        self.state.field = field;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &CollectConfig {
        &self.config
    }

    pub fn phase(&self) -> FinalizerState {
        self.finalizer.state()
    }

    pub fn score(&self) -> u32 {
        self.state.local.score
    }

    pub fn position(&self) -> Position {
        self.state.local.position
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.clock.remaining()
    }

    /// Key press from the host. Returns `true` for movement keys, whose
    /// default browser action should be suppressed.
    pub fn key_down(&mut self, code: &str) -> bool {
        self.state.input.on_key_down(code)
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        self.state.input.on_key_up(code)
    }

    /// Release every held key, e.g. when the page loses focus.
    pub fn release_keys(&mut self) {
        self.state.input.clear();
    }

    /// Animation-loop entry point. Runs at most one simulation tick per
    /// minimum tick interval, draining queued remote changes first.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        if !self.gate.admit(now_ms, self.config.min_tick_interval_ms) {
            return TickOutcome::default();
        }
        let remote_changes = self.drain_changes();
        let mut outcome = TickOutcome {
            ticked: true,
            remote_changes,
            ..TickOutcome::default()
        };

        if self.finalizer.state() != FinalizerState::Active {
            // Frozen, but a position the throttle held back still goes out.
            if let Some(write) = self
                .reconciler
                .position_write(self.state.local.position, now_ms)
            {
                self.outbox.push(write);
            }
            return outcome;
        }

        let step = physics::advance_local(
            self.state.local.position,
            &self.state.input,
            &mut self.state.field,
            &self.config,
        );
        self.state.local.position = step.position;
        if step.points > 0 {
            self.state.local.score += step.points;
            tracing::debug!(
                score = self.state.local.score,
                items = step.collected.len(),
                "Collected"
            );
            self.outbox
                .push(self.reconciler.score_write(self.state.local.score));
        }
        if let Some(write) = self.reconciler.position_write(step.position, now_ms) {
            self.outbox.push(write);
        }

        outcome.moved = step.moved;
        outcome.collected = step.collected;
        outcome
    }

    fn drain_changes(&mut self) -> usize {
        let Some(sub) = self.changes.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        loop {
            match sub.events.next().now_or_never() {
                Some(Some(change)) => {
                    let update = self.reconciler.tag(change);
                    if self.reconciler.apply(&mut self.state.roster, update) {
                        applied += 1;
                    }
                },
                Some(None) => {
                    tracing::debug!(room_id = %self.state.room_id, "Participant change feed closed");
                    self.changes = None;
                    break;
                },
                None => break,
            }
        }
        applied
    }

    /// One-second timer entry point. Returns the finalization plan exactly once,
    /// on the tick that takes the countdown from 1 to 0.
    pub fn on_second(&mut self) -> Option<FinalizePlan> {
        let tick = self.state.clock.tick();
        if let ClockTick::Running(left) = tick {
            tracing::trace!(left, "Clock tick");
        }
        if !self.finalizer.begin(tick) {
            return None;
        }
        let local = &self.state.local;
        let rank = scoring::local_rank(self.state.roster.entries(), local.id, local.score);
        let base_stats = self.state.profiles.get(&local.player_id).map(|p| p.stats);
        tracing::info!(
            room_id = %self.state.room_id,
            score = local.score,
            rank,
            "Session time expired"
        );
        Some(FinalizePlan::new(
            self.state.room_id,
            local.player_id,
            local.score,
            rank,
            self.state.game_kind,
            base_stats,
        ))
    }

    /// Record that persistence finished. Updates the held statistics snapshot
    /// when the stats write went through.
    pub fn complete_finalization(&mut self, report: &FinalizeReport) {
        self.finalizer.complete();
        if let Ok(stats) = &report.player_stats
            && let Some(player) = self.state.profiles.get_mut(&self.state.local.player_id)
        {
            player.stats = *stats;
        }
    }

    /// Writes produced since the last call, in tick order.
    pub fn take_writes(&mut self) -> Vec<StoreWrite> {
        self.outbox.take()
    }

    /// Replace every remote mirror from a full participant read.
    pub fn apply_snapshot(&mut self, snapshot: Vec<RoomParticipant>) {
        self.reconciler.resync(&mut self.state.roster, snapshot);
    }

    /// Merge late-loaded profiles into the label cache.
    pub fn add_profiles(&mut self, players: Vec<Player>) {
        for player in players {
            self.state.profiles.insert(player.id, player);
        }
    }

    /// Players in the roster without a loaded profile.
    pub fn missing_profiles(&self) -> Vec<PlayerId> {
        self.state
            .roster
            .player_ids()
            .into_iter()
            .filter(|id| !self.state.profiles.contains_key(id))
            .collect()
    }

    /// Compose the current frame. Reads state only.
    pub fn frame(&self) -> Frame {
        render::compose(&FrameView {
            config: &self.config,
            field: &self.state.field,
            participants: self.state.roster.entries(),
            profiles: &self.state.profiles,
            local_id: self.state.local.id,
            local_position: self.state.local.position,
            local_score: self.state.local.score,
            remaining_secs: self.state.clock.remaining(),
            finished: self.finalizer.state() != FinalizerState::Active,
        })
    }

    /// Leave the room: stop consuming changes, drop pending writes, and hand
    /// back the delete for the local participant plus the subscription to
    /// cancel.
    pub fn leave(&mut self) -> Departure {
        let subscription = self.changes.take().map(|c| c.id);
        let dropped = self.outbox.take().len();
        tracing::info!(
            room_id = %self.state.room_id,
            participant_id = %self.state.local.id,
            dropped,
            "Leaving session"
        );
        Departure {
            write: StoreWrite::DeleteParticipant {
                participant_id: self.state.local.id,
            },
            subscription,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use arena_core::store::ParticipantChange;
    use arena_core::test_helpers::seeded_room;

    use super::*;

    fn seeded_config() -> CollectConfig {
        CollectConfig {
            seed: Some(7),
            ..CollectConfig::default()
        }
    }

    #[test]
    fn racer_is_rejected() {
        let room = seeded_room(1);
        let result = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Racer,
            seeded_config(),
        ));
        assert!(matches!(
            result,
            Err(SessionError::UnsupportedGameKind(GameKind::Racer))
        ));
        assert_eq!(room.store.subscriber_count(), 0);
    }

    #[test]
    fn unknown_local_participant_is_rejected_and_unsubscribed() {
        let room = seeded_room(2);
        let missing = uuid::Uuid::new_v4();
        let result = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            missing,
            GameKind::Collect,
            seeded_config(),
        ));
        assert_eq!(
            result.err(),
            Some(SessionError::LocalParticipantMissing(missing))
        );
        assert_eq!(room.store.subscriber_count(), 0);
    }

    #[test]
    fn oversized_margin_is_rejected_before_subscribing() {
        let room = seeded_room(1);
        let config: CollectConfig = toml::from_str("margin = 450.0").unwrap();
        let result = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Collect,
            config,
        ));
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
        assert_eq!(room.store.subscriber_count(), 0);
    }

    #[test]
    fn zero_push_interval_is_rejected_by_new() {
        let room = seeded_room(1);
        let config = CollectConfig {
            position_push_interval_ms: 0.0,
            ..seeded_config()
        };
        let result = CollectSession::new(
            room.room_id,
            GameKind::Collect,
            room.participants[0].id,
            room.participants.clone(),
            room.players.clone(),
            None,
            config,
        );
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn start_loads_roster_and_profiles() {
        let room = seeded_room(3);
        let session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[1].id,
            GameKind::Collect,
            seeded_config(),
        ))
        .unwrap();
        assert_eq!(session.state().roster.len(), 3);
        assert_eq!(session.state().profiles.len(), 3);
        assert!(session.missing_profiles().is_empty());
        assert_eq!(session.state().field.items().len(), 20);
        assert_eq!(session.remaining_secs(), 60);
        assert_eq!(session.position(), room.participants[1].position);
    }

    #[test]
    fn frames_too_close_together_do_not_tick() {
        let room = seeded_room(1);
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Collect,
            seeded_config(),
        ))
        .unwrap();
        session.key_down("KeyD");
        assert!(session.tick(0.0).ticked);
        assert!(!session.tick(10.0).ticked);
        assert!(session.tick(16.0).ticked);
        assert_eq!(session.position().x, room.participants[0].position.x + 10.0);
    }

    #[test]
    fn inbound_changes_are_drained_on_tick() {
        let room = seeded_room(2);
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Collect,
            seeded_config(),
        ))
        .unwrap();
        let remote = room.participants[1].id;
        block_on(room.store.update_participant(
            remote,
            &arena_core::participant::ParticipantPatch::score(25),
        ))
        .unwrap();

        assert_eq!(session.state().roster.get(remote).unwrap().score, 0);
        let outcome = session.tick(0.0);
        assert_eq!(outcome.remote_changes, 1);
        assert_eq!(session.state().roster.get(remote).unwrap().score, 25);
    }

    #[test]
    fn own_echo_does_not_reset_local_score() {
        let room = seeded_room(2);
        let local_id = room.participants[0].id;
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            local_id,
            GameKind::Collect,
            seeded_config(),
        ))
        .unwrap();
        session.state.local.score = 40;
        block_on(room.store.update_participant(
            local_id,
            &arena_core::participant::ParticipantPatch::score(0),
        ))
        .unwrap();
        let outcome = session.tick(0.0);
        assert_eq!(outcome.remote_changes, 0);
        assert_eq!(session.score(), 40);
    }

    #[test]
    fn closed_feed_is_dropped() {
        let room = seeded_room(1);
        let (tx, rx) = futures::channel::mpsc::unbounded::<ParticipantChange>();
        drop(tx);
        let mut session = CollectSession::new(
            room.room_id,
            GameKind::Collect,
            room.participants[0].id,
            room.participants.clone(),
            room.players.clone(),
            Some(ChangeSubscription {
                id: SubscriptionId(9),
                events: rx,
            }),
            seeded_config(),
        )
        .unwrap();
        session.tick(0.0);
        assert_eq!(session.leave().subscription, None);
    }

    #[test]
    fn leave_hands_back_delete_and_subscription() {
        let room = seeded_room(1);
        let local_id = room.participants[0].id;
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            local_id,
            GameKind::Collect,
            seeded_config(),
        ))
        .unwrap();
        session.key_down("ArrowDown");
        session.tick(0.0);
        let departure = session.leave();
        assert_eq!(
            departure.write,
            StoreWrite::DeleteParticipant {
                participant_id: local_id
            }
        );
        assert!(departure.subscription.is_some());
        assert!(session.take_writes().is_empty());
    }

    #[test]
    fn simulation_freezes_after_expiry() {
        let room = seeded_room(1);
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Collect,
            CollectConfig {
                countdown_secs: 2,
                ..seeded_config()
            },
        ))
        .unwrap();
        assert!(session.on_second().is_none());
        assert!(session.on_second().is_some());
        assert_eq!(session.phase(), FinalizerState::Finalizing);
        assert!(session.on_second().is_none());

        let before = session.position();
        session.key_down("ArrowUp");
        let outcome = session.tick(0.0);
        assert!(outcome.ticked);
        assert!(!outcome.moved);
        assert_eq!(session.position(), before);
        assert!(session.take_writes().is_empty());
        assert!(session.frame().texts().any(|t| t == "Time's up!"));
    }

    #[test]
    fn throttled_position_is_flushed_after_expiry() {
        let room = seeded_room(1);
        let local_id = room.participants[0].id;
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            local_id,
            GameKind::Collect,
            CollectConfig {
                countdown_secs: 1,
                ..seeded_config()
            },
        ))
        .unwrap()
        .with_field(CollectibleField::from_items(Vec::new()));

        session.key_down("ArrowRight");
        session.tick(0.0);
        assert_eq!(session.take_writes().len(), 1);
        session.tick(16.0);
        assert!(session.take_writes().is_empty());
        let last = session.position();

        assert!(session.on_second().is_some());
        session.tick(32.0);
        assert!(session.take_writes().is_empty());
        session.tick(64.0);
        assert_eq!(
            session.take_writes(),
            vec![StoreWrite::UpdateParticipant {
                participant_id: local_id,
                patch: arena_core::participant::ParticipantPatch::position(last),
            }]
        );
        session.tick(80.0);
        assert!(session.take_writes().is_empty());
        assert_eq!(session.position(), last);
    }

    #[test]
    fn snapshot_drops_vanished_remotes_and_keeps_local_score() {
        let room = seeded_room(3);
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Collect,
            seeded_config(),
        ))
        .unwrap();
        session.state.local.score = 40;

        let mut stale_local = room.participants[0].clone();
        stale_local.score = 0;
        let mut rival = room.participants[1].clone();
        rival.score = 15;
        session.apply_snapshot(vec![stale_local, rival]);

        let roster = &session.state().roster;
        assert_eq!(roster.len(), 2);
        assert!(roster.get(room.participants[2].id).is_none());
        assert_eq!(roster.get(room.participants[1].id).unwrap().score, 15);
        assert_eq!(session.score(), 40);
        assert!(session.frame().texts().any(|t| t == "Score: 40"));
    }

    #[test]
    fn completion_refreshes_held_stats() {
        let room = seeded_room(1);
        let player_id = room.players[0].id;
        let mut session = block_on(CollectSession::start(
            &room.store,
            room.room_id,
            room.participants[0].id,
            GameKind::Collect,
            CollectConfig {
                countdown_secs: 1,
                ..seeded_config()
            },
        ))
        .unwrap();
        let plan = session.on_second().unwrap();
        assert_eq!(plan.base_stats, Some(Default::default()));
        let report = block_on(finalizer::persist(&room.store, &plan));
        session.complete_finalization(&report);
        assert_eq!(session.phase(), FinalizerState::Finalized);
        assert_eq!(session.state().profiles[&player_id].stats.games_played, 1);
    }
}
