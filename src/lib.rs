//! xuezi — personal Chinese vocabulary tracker.
//! known characters in SQLite, unseen HSK-1 words suggested at random.

pub mod api;
pub mod catalog;
pub mod db;
pub mod error;
pub mod suggest;

use std::sync::Arc;

pub type SharedStore = Arc<dyn db::CharacterStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub suggester: Arc<suggest::Suggester>,
    pub api_key: Option<String>,
    pub started_at: std::time::Instant,
}

impl AppState {
    pub fn new(store: SharedStore, suggester: suggest::Suggester) -> Self {
        Self {
            store,
            suggester: Arc::new(suggester),
            api_key: None,
            started_at: std::time::Instant::now(),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }
}
