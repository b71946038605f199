use serde::{Deserialize, Serialize};

/// Connection settings for the hosted backend's REST surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://xyz.example.co`. The `/rest/v1` prefix is added.
    pub base_url: String,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: String,
    /// Signed-in user's access token. Falls back to the anon key when absent.
    pub access_token: Option<String>,
    /// How often watched rooms are re-read for change detection (ms).
    pub poll_interval_ms: u64,
    pub players_table: String,
    pub participants_table: String,
    pub rooms_table: String,
    pub scores_table: String,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            access_token: None,
            poll_interval_ms: 250,
            players_table: "players".to_string(),
            participants_table: "room_participants".to_string(),
            rooms_table: "game_rooms".to_string(),
            scores_table: "game_scores".to_string(),
        }
    }
}

impl RestStoreConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    /// `ARENA_REST_ANON_KEY` and `ARENA_REST_URL` override whatever was loaded.
    pub fn load() -> Self {
        let mut config = Self::from_file().unwrap_or_default();
        if let Ok(url) = std::env::var("ARENA_REST_URL") {
            config.base_url = url;
        }
        if let Ok(key) = std::env::var("ARENA_REST_ANON_KEY") {
            config.anon_key = key;
        }
        config
    }

    fn from_file() -> Option<Self> {
        if let Ok(path) = std::env::var("ARENA_REST_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
        {
            match toml::from_str::<Self>(&contents) {
                Ok(config) => return Some(config),
                Err(e) => tracing::warn!(path = %path, error = %e, "Ignoring malformed REST config"),
            }
        }
        std::fs::read_to_string("config/rest.toml")
            .ok()
            .and_then(|contents| toml::from_str::<Self>(&contents).ok())
    }

    /// `<base>/rest/v1/<table>`
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }

    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}
