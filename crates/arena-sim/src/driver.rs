use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use arena_collect::config::CollectConfig;
use arena_collect::finalizer::{self, FinalizePlan, FinalizeReport};
use arena_collect::{CollectSession, SessionError, bot, outbox};
use arena_core::memory_store::MemoryStore;
use arena_core::participant::{Position, RoomParticipant};
use arena_core::player::{Player, PlayerColor, PlayerStats};
use arena_core::room::RoomStatus;
use arena_core::store::{RemoteStore, StoreError};
use arena_core::time::unix_millis_now;
use arena_rest::{RestStore, RestStoreConfig, run_poller};

use crate::config::SimConfig;

/// Seconds between full roster resyncs on the REST backend.
const RESYNC_EVERY_SECS: u32 = 5;

/// Why a simulation run could not complete.
#[derive(Debug)]
pub enum SimError {
    /// The REST backend needs an existing room and participant.
    MissingId(&'static str),
    Session(SessionError),
    Store(StoreError),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId(field) => write!(f, "`{field}` must be set for the rest backend"),
            Self::Session(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<SessionError> for SimError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<StoreError> for SimError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// How one bot's session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct BotResult {
    pub name: String,
    pub score: u32,
    pub rank: usize,
    /// All three finalization writes succeeded.
    pub persisted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimOutcome {
    pub results: Vec<BotResult>,
    /// Participant and finalization writes that the store rejected.
    pub failed_writes: usize,
}

struct Bot {
    name: String,
    session: CollectSession,
    result: Option<BotResult>,
}

/// Hold the keys that point the session's player at the nearest collectible.
fn steer(session: &mut CollectSession) {
    session.release_keys();
    for key in bot::bot_keys(session.position(), &session.state().field) {
        session.key_down(key);
    }
}

fn bot_result(name: &str, plan: &FinalizePlan, report: &FinalizeReport) -> BotResult {
    BotResult {
        name: name.to_string(),
        score: plan.record.score,
        rank: plan.rank(),
        persisted: report.is_complete(),
    }
}

/// Bots sharing one layout need one seed. Draw it here when none is set.
fn shared_layout(config: &SimConfig) -> CollectConfig {
    let mut collect = config.collect.clone();
    if collect.seed.is_none() {
        collect.seed = Some(rand::rng().random());
    }
    collect
}

/// Seed `n` players into `room_id`, spread evenly across the arena's middle row.
fn seed_bots(
    store: &MemoryStore,
    room_id: arena_core::RoomId,
    n: usize,
    collect: &CollectConfig,
) -> Vec<(String, RoomParticipant)> {
    let (min_x, max_x, _, _) = collect.bounds();
    let spacing = (max_x - min_x) / (n as f32 + 1.0);
    let joined = unix_millis_now();
    (0..n)
        .map(|i| {
            let player = Player {
                id: Uuid::new_v4(),
                username: format!("bot-{}", i + 1),
                color: PlayerColor::PALETTE[i % PlayerColor::PALETTE.len()],
                stats: PlayerStats::default(),
            };
            let participant = RoomParticipant {
                id: Uuid::new_v4(),
                room_id,
                player_id: player.id,
                position: Position::new(
                    min_x + spacing * (i as f32 + 1.0),
                    collect.arena_height / 2.0,
                ),
                score: 0,
                is_ready: true,
                joined_at: joined + i as u64,
            };
            store.insert_player(player.clone());
            store.insert_participant(participant.clone());
            (player.username, participant)
        })
        .collect()
}

/// Run `config.bots` sessions against an in-memory room in simulated time,
/// from start through finalization and leaving.
pub async fn run_memory(config: &SimConfig, store: &MemoryStore) -> Result<SimOutcome, SimError> {
    let room_id = config.room_id.unwrap_or_else(Uuid::new_v4);
    store.set_room(room_id, RoomStatus::Playing);
    let collect = shared_layout(config);

    let mut bots = Vec::with_capacity(config.bots);
    for (name, participant) in seed_bots(store, room_id, config.bots, &collect) {
        let session =
            CollectSession::start(store, room_id, participant.id, config.game_kind, collect.clone())
                .await?;
        bots.push(Bot {
            name,
            session,
            result: None,
        });
    }

    let frame_ms = config.frame_period_ms();
    // A zero-length session never expires; stop a little past the countdown.
    let deadline_ms = f64::from(collect.countdown_secs.saturating_add(2)) * 1_000.0;
    let mut now_ms = 0.0;
    let mut next_second_ms = 1_000.0;
    let mut failed_writes = 0;

    while bots.iter().any(|b| b.result.is_none()) && now_ms <= deadline_ms {
        now_ms += frame_ms;
        for bot in &mut bots {
            steer(&mut bot.session);
            bot.session.tick(now_ms);
            failed_writes += outbox::dispatch_all(store, &bot.session.take_writes()).await;
        }
        if now_ms < next_second_ms {
            continue;
        }
        next_second_ms += 1_000.0;
        // Once a second every bot rebuilds its roster from a full read.
        let snapshot = store.read_participants(room_id).await?;
        for bot in &mut bots {
            bot.session.apply_snapshot(snapshot.clone());
            let Some(plan) = bot.session.on_second() else {
                continue;
            };
            let report = finalizer::persist(store, &plan).await;
            failed_writes += report.failures();
            bot.session.complete_finalization(&report);
            bot.result = Some(bot_result(&bot.name, &plan, &report));
        }
    }

    for bot in &mut bots {
        let departure = bot.session.leave();
        if let Some(id) = departure.subscription {
            store.unsubscribe(id);
        }
        if outbox::dispatch(store, &departure.write).await.is_err() {
            failed_writes += 1;
        }
    }

    let mut results: Vec<BotResult> = bots.into_iter().filter_map(|b| b.result).collect();
    results.sort_by_key(|r| r.rank);
    Ok(SimOutcome {
        results,
        failed_writes,
    })
}

/// Play one bot as an existing participant of a hosted room, in real time.
pub async fn run_rest(config: &SimConfig, rest: RestStoreConfig) -> Result<SimOutcome, SimError> {
    let room_id = config.room_id.ok_or(SimError::MissingId("room_id"))?;
    let participant_id = config
        .participant_id
        .ok_or(SimError::MissingId("participant_id"))?;

    let store = Arc::new(RestStore::new(rest)?);
    let mut session = CollectSession::start(
        &*store,
        room_id,
        participant_id,
        config.game_kind,
        config.collect.clone(),
    )
    .await?;
    let name = session
        .state()
        .profiles
        .get(&session.state().local.player_id)
        .map(|p| p.username.clone())
        .unwrap_or_else(|| participant_id.to_string());

    let poller = tokio::spawn(run_poller(Arc::clone(&store)));
    let started = tokio::time::Instant::now();
    let frame_period = Duration::from_secs_f64(config.frame_period_ms() / 1_000.0);
    let mut frames = tokio::time::interval(frame_period);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut seconds = tokio::time::interval(Duration::from_secs(1));
    // The first tick of an interval fires immediately.
    seconds.tick().await;

    let mut failed_writes = 0;
    let mut elapsed_secs: u32 = 0;
    let result = loop {
        tokio::select! {
            _ = frames.tick() => {
                steer(&mut session);
                session.tick(started.elapsed().as_secs_f64() * 1_000.0);
                failed_writes += outbox::dispatch_all(&*store, &session.take_writes()).await;
            }
            _ = seconds.tick() => {
                elapsed_secs += 1;
                if elapsed_secs % RESYNC_EVERY_SECS == 0 {
                    match store.read_participants(room_id).await {
                        Ok(rows) => session.apply_snapshot(rows),
                        Err(e) => tracing::warn!(error = %e, "Failed to resync participants"),
                    }
                }
                let missing = session.missing_profiles();
                if !missing.is_empty() {
                    match store.read_players(&missing).await {
                        Ok(players) => session.add_profiles(players),
                        Err(e) => tracing::warn!(error = %e, "Failed to load player profiles"),
                    }
                }
                if let Some(plan) = session.on_second() {
                    let report = finalizer::persist(&*store, &plan).await;
                    failed_writes += report.failures();
                    session.complete_finalization(&report);
                    break bot_result(&name, &plan, &report);
                }
            }
        }
    };
    poller.abort();

    let departure = session.leave();
    if let Some(id) = departure.subscription {
        store.unsubscribe(id);
    }
    if outbox::dispatch(&*store, &departure.write).await.is_err() {
        failed_writes += 1;
    }

    Ok(SimOutcome {
        results: vec![result],
        failed_writes,
    })
}
