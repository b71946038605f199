use serde::Deserialize;

use arena_collect::config::CollectConfig;
use arena_core::room::GameKind;
use arena_core::{ParticipantId, RoomId};

/// Where the simulated sessions read and write room state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process store seeded with one participant per bot.
    #[default]
    Memory,
    /// The hosted backend. One bot joins an existing room as an existing
    /// participant.
    Rest,
}

/// Simulation settings, loaded from `arena-sim.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub backend: Backend,
    /// Bots seeded into the in-memory room.
    pub bots: usize,
    /// Animation frame period (ms). Memory runs advance simulated time by
    /// this much per frame; REST runs sleep it.
    pub frame_ms: f64,
    /// Room to join. Required for the REST backend; random otherwise.
    pub room_id: Option<RoomId>,
    /// Participant the REST bot controls.
    pub participant_id: Option<ParticipantId>,
    pub game_kind: GameKind,
    pub collect: CollectConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            bots: 4,
            frame_ms: 16.0,
            room_id: None,
            participant_id: None,
            game_kind: GameKind::Collect,
            collect: CollectConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load config from `ARENA_SIM_CONFIG` or `arena-sim.toml`, falling back to
    /// defaults.
    pub fn load() -> Self {
        let path = std::env::var("ARENA_SIM_CONFIG").unwrap_or_else(|_| "arena-sim.toml".into());
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "Ignoring malformed simulation config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Frame period with a floor, so simulated time always advances.
    pub fn frame_period_ms(&self) -> f64 {
        self.frame_ms.max(1.0)
    }
}
