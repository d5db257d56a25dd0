//! Driver settings with persistence
//!
//! Settings are read from `~/.config/dishstorm/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use dishstorm_core::Bounds;
use dishstorm_game::systems::PlayerSmoothing;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// All driver settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub gameplay: GameplaySettings,
}

impl Settings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dishstorm"))
    }

    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// `load` under a temporary stderr subscriber, so fallback messages are
    /// shown before the configured subscriber exists.
    pub fn load_logged() -> Self {
        let startup = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_target(false)
            .finish();
        tracing::subscriber::with_default(startup, Self::load)
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                warn!("Failed to parse settings: {}, using defaults", e);
                Self::default()
            }),
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };
        fs::create_dir_all(&dir)?;

        let path = dir.join("settings.toml");
        fs::write(&path, toml::to_string_pretty(self)?)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Frames to simulate
    pub frames: u32,
    /// Milliseconds per frame
    pub frame_ms: f32,
    /// Seed for wave jitter, drift phases and boss jitter
    pub seed: u64,
    pub arena_width: f32,
    pub arena_height: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            frames: 3600,
            frame_ms: 1000.0 / 60.0,
            seed: 0x5eed,
            arena_width: 1280.0,
            arena_height: 720.0,
        }
    }
}

impl SimulationSettings {
    /// Arena rectangle, at least one unit on each side
    pub fn arena(&self) -> Bounds {
        Bounds::from_size(self.arena_width.max(1.0), self.arena_height.max(1.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Parsed level, `INFO` if unrecognised
    pub fn max_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

/// Gameplay tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    pub dish_lifetime_ms: f32,
    /// Mean time between dish waves
    pub spawn_interval_ms: f32,
    /// A boss arrives every this many waves
    pub boss_every_waves: u32,
    pub boss_hp: f32,
    /// Cursor radius before upgrades
    pub cursor_radius: f32,
    /// Time between cursor hits on the same dish
    pub cursor_hit_interval_ms: f32,
    pub player_smoothing: PlayerSmoothing,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            dish_lifetime_ms: 5000.0,
            spawn_interval_ms: 900.0,
            boss_every_waves: 12,
            boss_hp: 40.0,
            cursor_radius: 40.0,
            cursor_hit_interval_ms: 120.0,
            player_smoothing: PlayerSmoothing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"
            [simulation]
            frames = 10
            seed = 3

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(settings.simulation.frames, 10);
        assert_eq!(settings.simulation.seed, 3);
        assert_eq!(settings.simulation.arena_width, 1280.0);
        assert_eq!(settings.logging.max_level(), Level::DEBUG);
        assert_eq!(settings.gameplay.boss_every_waves, 12);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn malformed_file_warns_and_uses_defaults() {
        let dir = std::env::temp_dir().join(format!("dishstorm-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, "[simulation]\nframes = \"lots\"\n").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = FmtSubscriber::builder()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let settings =
            tracing::subscriber::with_default(subscriber, || Settings::load_from(&path));

        assert_eq!(settings.simulation.frames, 3600);
        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("Failed to parse settings"), "{}", output);
    }

    #[test]
    fn bad_level_falls_back_to_info() {
        let logging = LoggingSettings {
            level: "loud".to_string(),
        };
        assert_eq!(logging.max_level(), Level::INFO);
    }

    #[test]
    fn defaults_survive_a_round_trip() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        let back = Settings::parse(&text).unwrap();
        assert_eq!(back.gameplay.dish_lifetime_ms, 5000.0);
        assert_eq!(back.simulation.arena().height(), 720.0);
    }

    #[test]
    fn degenerate_arena_is_widened() {
        let simulation = SimulationSettings {
            arena_width: -20.0,
            arena_height: 0.0,
            ..Default::default()
        };
        let arena = simulation.arena();
        assert_eq!(arena.width(), 1.0);
        assert_eq!(arena.height(), 1.0);
    }
}
