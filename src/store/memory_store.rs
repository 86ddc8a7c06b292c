use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::{prefs::Prefs, prefs_store::PrefsStore};

/// Keeps the namespace in memory only. Used when no persistence is needed and in tests.
#[derive(Default)]
pub struct MemoryPrefsStore {
    prefs: Mutex<Prefs>,
}

impl MemoryPrefsStore {
    pub fn new(prefs: Prefs) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

impl PrefsStore for MemoryPrefsStore {
    async fn read(&self) -> Result<Prefs> {
        let prefs = self
            .prefs
            .lock()
            .map_err(|_| anyhow!("Preferences lock is poisoned"))?;
        Ok(prefs.clone())
    }

    async fn update<R>(&self, edit: impl FnOnce(&mut Prefs) -> R) -> Result<R> {
        let mut prefs = self
            .prefs
            .lock()
            .map_err(|_| anyhow!("Preferences lock is poisoned"))?;
        let mut next = prefs.clone();
        let result = edit(&mut next);
        *prefs = next;
        Ok(result)
    }
}
