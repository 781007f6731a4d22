//! Score/session bridge between a finished round and the catalog.
//!
//! Submission is best-effort: a record that fails to persist is logged and
//! forgotten, never retried, and never surfaced to the player as an error.

use crate::catalog::Catalog;
use log::error;

pub trait ScoreSink {
    /// Returns true when the submission set a new record.
    fn submit(&mut self, game: &str, score: u32, player: &str) -> bool;
}

/// Routes scores into the catalog and persists on every new record.
pub struct CatalogSink<'a> {
    catalog: &'a mut Catalog,
}

impl<'a> CatalogSink<'a> {
    pub fn new(catalog: &'a mut Catalog) -> Self {
        CatalogSink { catalog }
    }
}

impl ScoreSink for CatalogSink<'_> {
    fn submit(&mut self, game: &str, score: u32, player: &str) -> bool {
        if score == 0 {
            return false;
        }
        let record = self.catalog.record_score(game, score, player);
        if record {
            if let Err(e) = self.catalog.save() {
                error!("failed to persist catalog after record: {e}");
            }
        }
        record
    }
}
