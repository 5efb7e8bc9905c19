//! Shared handler state

use std::sync::Arc;
use voxforge_core::{Forge, ForgeConfig, Journal};

/// Shared state handed to every handler.
///
/// The forge holds no per-request state; the journal is the only thing
/// requests write to.
#[derive(Clone)]
pub struct AppState {
    pub forge: Arc<Forge>,
    pub journal: Arc<Journal>,
}

impl AppState {
    /// State backed by the real HTTP providers
    pub fn new(config: ForgeConfig) -> Self {
        let capacity = config.journal_capacity;
        Self::with_forge(Forge::new(config), capacity)
    }

    pub fn with_forge(forge: Forge, journal_capacity: usize) -> Self {
        Self {
            forge: Arc::new(forge),
            journal: Arc::new(Journal::with_capacity(journal_capacity)),
        }
    }
}
