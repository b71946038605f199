use serde::Deserialize;

use arena_collect::config::CollectConfig;
use arena_core::room::GameKind;
use arena_core::{ParticipantId, RoomId};
use arena_rest::RestStoreConfig;

fn default_canvas_id() -> String {
    "game-canvas".to_string()
}

/// What the lobby page passes to `startSession`, as JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    #[serde(default = "default_canvas_id")]
    pub canvas_id: String,
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    #[serde(default)]
    pub game_kind: GameKind,
    #[serde(default)]
    pub store: RestStoreConfig,
    /// Overrides for the session tuning. Defaults when absent.
    #[serde(default)]
    pub collect: Option<CollectConfig>,
}

impl SessionOptions {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid session options: {e}"))
    }

    pub fn collect_config(&self) -> CollectConfig {
        self.collect.clone().unwrap_or_default()
    }
}
