use serde::{Deserialize, Serialize};

/// Finer grids than this are rejected; each line is one draw command.
const MIN_GRID_SPACING: f32 = 1.0;

fn positive(name: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be positive, got {value}"))
    }
}

/// Data-driven configuration for the collection session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Arena width (units).
    pub arena_width: f32,
    /// Arena height (units).
    pub arena_height: f32,
    /// Interior margin on every side; no entity is placed or moved inside it.
    pub margin: f32,
    /// Distance moved per held direction per simulation tick.
    pub step: f32,
    /// Player collision radius.
    pub player_radius: f32,
    /// Collectible collision radius.
    pub item_radius: f32,
    /// Minimum wall-clock gap between simulation ticks (ms).
    pub min_tick_interval_ms: f64,
    /// Session length in whole seconds.
    pub countdown_secs: u32,
    /// Collectibles generated at session start.
    pub collectible_count: usize,
    /// Minimum gap between outbound position writes (ms of simulated time).
    pub position_push_interval_ms: f64,
    /// Seed for collectible placement. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Spacing of the background grid.
    pub grid_spacing: f32,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,
            margin: 20.0,
            step: 5.0,
            player_radius: 20.0,
            item_radius: 15.0,
            min_tick_interval_ms: 16.0,
            countdown_secs: 60,
            collectible_count: 20,
            position_push_interval_ms: 50.0,
            seed: None,
            grid_spacing: 40.0,
        }
    }
}

impl CollectConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    /// Configs that fail [`validate`](Self::validate) are skipped with a warning.
    pub fn load() -> Self {
        let env_path = std::env::var("ARENA_COLLECT_CONFIG").ok();
        for path in env_path.iter().map(String::as_str).chain(["config/collect.toml"]) {
            let Ok(contents) = std::fs::read_to_string(path) else {
                continue;
            };
            let config = match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path, error = %e, "Ignoring malformed collect config");
                    continue;
                },
            };
            match config.validate() {
                Ok(()) => return config,
                Err(e) => tracing::warn!(path, error = %e, "Ignoring invalid collect config"),
            }
        }
        Self::default()
    }

    /// Reject values the simulation or renderer cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        positive("arena_width", self.arena_width)?;
        positive("arena_height", self.arena_height)?;
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(format!("margin must be finite and non-negative, got {}", self.margin));
        }
        if self.margin * 2.0 >= self.arena_width.min(self.arena_height) {
            return Err(format!(
                "margin {} leaves no interior in a {}x{} arena",
                self.margin, self.arena_width, self.arena_height
            ));
        }
        positive("step", self.step)?;
        positive("player_radius", self.player_radius)?;
        positive("item_radius", self.item_radius)?;
        if !(self.grid_spacing.is_finite() && self.grid_spacing >= MIN_GRID_SPACING) {
            return Err(format!(
                "grid_spacing must be at least {MIN_GRID_SPACING}, got {}",
                self.grid_spacing
            ));
        }
        if !(self.position_push_interval_ms.is_finite() && self.position_push_interval_ms > 0.0) {
            return Err(format!(
                "position_push_interval_ms must be positive, got {}",
                self.position_push_interval_ms
            ));
        }
        if !(self.min_tick_interval_ms.is_finite() && self.min_tick_interval_ms >= 0.0) {
            return Err(format!(
                "min_tick_interval_ms must be finite and non-negative, got {}",
                self.min_tick_interval_ms
            ));
        }
        Ok(())
    }

    /// Inclusive bounds `(min_x, max_x, min_y, max_y)` a position is clamped into.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.margin,
            self.arena_width - self.margin,
            self.margin,
            self.arena_height - self.margin,
        )
    }

    /// Center distance below which a player touches a collectible.
    pub fn pickup_distance(&self) -> f32 {
        self.player_radius + self.item_radius
    }
}
