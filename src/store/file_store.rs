use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{debug, warn};

use super::{prefs::Prefs, prefs_store::PrefsStore};

pub const PREFS_FILE_NAME: &str = "prefs.json";

/// The main realization of [PrefsStore]. The whole namespace is kept as one json object in a
/// single file.
///
/// Transactions inside the process are serialized through a mutex, transactions across processes
/// (daemon and cli) through an advisory lock on the file itself.
pub struct FilePrefsStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FilePrefsStore {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path,
            guard: Mutex::new(()),
        })
    }

    /// Opens the store at the standard location inside the application directory.
    pub fn in_dir(dir: &Path) -> Result<Self, std::io::Error> {
        Self::new(dir.join(PREFS_FILE_NAME))
    }

    async fn load(&self, file: &mut File) -> Result<Prefs> {
        let mut content = String::new();
        file.rewind().await?;
        file.read_to_string(&mut content).await?;
        if content.trim().is_empty() {
            return Ok(Prefs::default());
        }

        match serde_json::from_str::<Prefs>(&content) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                // Might happen if the machine went down in the middle of a write. The broken file
                // is kept next to the store so it can be recovered by hand.
                let backup = self.path.with_extension("json.corrupt");
                warn!(
                    "Preferences in {:?} are corrupted, starting from scratch. Copy is kept in {:?}: {e}",
                    self.path, backup
                );
                tokio::fs::write(&backup, content.as_bytes()).await?;
                Ok(Prefs::default())
            }
        }
    }

    async fn persist(file: &mut File, prefs: &Prefs) -> Result<()> {
        let mut buffer = serde_json::to_vec_pretty(prefs)?;
        buffer.push(b'\n');

        file.rewind().await?;
        file.set_len(0).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn update_with_file<R>(
        &self,
        file: &mut File,
        edit: impl FnOnce(&mut Prefs) -> R,
    ) -> Result<R> {
        let mut prefs = self.load(file).await?;
        let before = prefs.clone();
        let result = edit(&mut prefs);
        // Sensors repeat the same reading a lot, no need to touch the disk for those.
        if prefs != before {
            Self::persist(file, &prefs).await?;
        }
        Ok(result)
    }
}

impl PrefsStore for FilePrefsStore {
    async fn read(&self) -> Result<Prefs> {
        let _guard = self.guard.lock().await;

        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preferences in {:?} yet", self.path);
                return Ok(Prefs::default());
            }
            Err(e) => Err(e)?,
        };

        file.lock_shared()?;
        let result = self.load(&mut file).await;
        file.unlock_async().await?;
        result
    }

    async fn update<R>(&self, edit: impl FnOnce(&mut Prefs) -> R) -> Result<R> {
        let _guard = self.guard.lock().await;

        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = self.update_with_file(&mut file, edit).await;
        file.unlock_async().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::store::{prefs::Prefs, prefs_store::PrefsStore};

    use super::{FilePrefsStore, PREFS_FILE_NAME};

    #[tokio::test]
    async fn test_missing_file_reads_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = FilePrefsStore::in_dir(dir.path())?;

        assert_eq!(store.read().await?, Prefs::default());
        assert!(!dir.path().join(PREFS_FILE_NAME).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_survives_reopen() -> Result<()> {
        let dir = tempdir()?;
        {
            let store = FilePrefsStore::in_dir(dir.path())?;
            store
                .update(|prefs| {
                    prefs.put_int("current_steps", 120);
                    prefs.put_string("last_date", "2024-01-02");
                })
                .await?;
            let previous = store
                .update(|prefs| {
                    let previous = prefs.get_int("current_steps", 0);
                    prefs.put_int("current_steps", previous + 5);
                    previous
                })
                .await?;
            assert_eq!(previous, 120);
        }

        let reopened = FilePrefsStore::in_dir(dir.path())?;
        let prefs = reopened.read().await?;
        assert_eq!(prefs.get_int("current_steps", 0), 125);
        assert_eq!(prefs.get_string("last_date"), Some("2024-01-02"));
        Ok(())
    }

    #[tokio::test]
    async fn test_shorter_content_truncates_file() -> Result<()> {
        let dir = tempdir()?;
        let store = FilePrefsStore::in_dir(dir.path())?;
        store
            .update(|prefs| {
                for day in 1..=20 {
                    prefs.put_int(format!("history_2024-01-{day:02}"), 10_000);
                }
            })
            .await?;
        store
            .update(|prefs| {
                for day in 2..=20 {
                    prefs.remove(&format!("history_2024-01-{day:02}"));
                }
            })
            .await?;

        let prefs = store.read().await?;
        assert_eq!(prefs.keys_with_prefix("history_").count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_value_types_keep_the_rest() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(PREFS_FILE_NAME);
        std::fs::write(
            &path,
            r#"{"history_2024-01-01": 8000, "current_steps": 120, "daily_goal": 8000.0}"#,
        )?;

        let store = FilePrefsStore::new(path.clone())?;
        let prefs = store.read().await?;
        assert_eq!(prefs.get_int("current_steps", -1), 120);
        assert_eq!(prefs.get_int("history_2024-01-01", -1), 8000);
        assert_eq!(prefs.get_int("daily_goal", -1), -1);

        store.update(|prefs| prefs.put_int("daily_goal", 9000)).await?;
        let prefs = store.read().await?;
        assert_eq!(prefs.get_int("daily_goal", -1), 9000);
        assert_eq!(prefs.get_int("history_2024-01-01", -1), 8000);
        assert!(!dir.path().join("prefs.json.corrupt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_file_is_replaced() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(PREFS_FILE_NAME);
        std::fs::write(&path, "{\"current_steps\": 4")?;

        let store = FilePrefsStore::new(path.clone())?;
        assert_eq!(store.read().await?, Prefs::default());

        store.update(|prefs| prefs.put_int("current_steps", 1)).await?;
        assert_eq!(store.read().await?.get_int("current_steps", 0), 1);
        assert!(dir.path().join("prefs.json.corrupt").exists());
        Ok(())
    }
}
