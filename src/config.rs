//! Runtime configuration with full defaults; an optional JSON file can
//! override any field.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn cycle(&self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    /// Milliseconds between snake steps.
    pub fn snake_step_ms(&self) -> u64 {
        match self {
            Difficulty::Easy => 150,
            Difficulty::Medium => 100,
            Difficulty::Hard => 60,
        }
    }

    pub fn snake_obstacles(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 8,
            Difficulty::Hard => 15,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base cadence of the hub loop; the canvas-style games advance once
    /// per frame while the snake accumulates toward its own step interval.
    pub frame_ms: u64,
    pub difficulty: Difficulty,
    /// Name recorded against catalog high scores.
    pub player: String,
    pub catalog_path: String,
    pub log_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frame_ms: 33,
            difficulty: Difficulty::Medium,
            player: "player".to_string(),
            catalog_path: ".gamebox_catalog.json".to_string(),
            log_path: "gamebox.log".to_string(),
        }
    }
}

impl Config {
    /// Missing file means defaults; an unreadable or malformed file is an
    /// error the caller should surface at startup.
    pub fn load(path: &Path) -> io::Result<Config> {
        match fs::read_to_string(path) {
            Ok(text) => {
                serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}
