//! The game catalog: the hub's record of playable games and their high
//! scores, persisted as JSON between sessions.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    pub id: u32,
    pub name: String,
    pub high_score: u32,
    pub high_score_player: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    next_id: u32,
    entries: Vec<GameEntry>,
}

#[derive(Debug)]
pub struct Catalog {
    next_id: u32,
    entries: Vec<GameEntry>,
    path: Option<PathBuf>,
}

impl Catalog {
    pub fn in_memory(builtins: &[&str]) -> Self {
        let mut catalog = Catalog {
            next_id: 1,
            entries: Vec::new(),
            path: None,
        };
        catalog.restore_builtins(builtins);
        catalog
    }

    /// A missing file yields a fresh catalog seeded with the built-in
    /// games; a corrupt file is an error rather than silent data loss.
    pub fn load(path: &Path, builtins: &[&str]) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let file: CatalogFile = serde_json::from_str(&text)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                let mut catalog = Catalog {
                    next_id: file.next_id.max(1),
                    entries: file.entries,
                    path: Some(path.to_path_buf()),
                };
                catalog.restore_builtins(builtins);
                Ok(catalog)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no catalog at {}, seeding built-ins", path.display());
                let mut catalog = Catalog::in_memory(builtins);
                catalog.path = Some(path.to_path_buf());
                Ok(catalog)
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = CatalogFile {
            next_id: self.next_id,
            entries: self.entries.clone(),
        };
        let text = serde_json::to_string_pretty(&file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, text)
    }

    pub fn entries(&self) -> &[GameEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&GameEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Names are unique, as in the source-of-truth store this mirrors.
    pub fn add(&mut self, name: &str) -> bool {
        if name.is_empty() || self.get(name).is_some() {
            return false;
        }
        self.entries.push(GameEntry {
            id: self.next_id,
            name: name.to_string(),
            high_score: 0,
            high_score_player: None,
        });
        self.next_id += 1;
        true
    }

    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if new.is_empty() || old == new || self.get(new).is_some() {
            return false;
        }
        match self.entries.iter_mut().find(|e| e.name == old) {
            Some(entry) => {
                entry.name = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    pub fn reset_high_score(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.high_score = 0;
                entry.high_score_player = None;
                true
            }
            None => false,
        }
    }

    /// Records a score only when it strictly beats the stored record.
    /// Returns whether a new record was set.
    pub fn record_score(&mut self, name: &str, score: u32, player: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) if score > entry.high_score => {
                entry.high_score = score;
                entry.high_score_player = Some(player.to_string());
                info!("new record for {name}: {score} by {player}");
                true
            }
            Some(_) => false,
            None => {
                error!("score submitted for unknown game {name}");
                false
            }
        }
    }

    /// Re-adds any built-in game that was removed; existing entries keep
    /// their records.
    pub fn restore_builtins(&mut self, builtins: &[&str]) {
        for name in builtins {
            self.add(name);
        }
    }
}
