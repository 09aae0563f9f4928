use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::models::QueueItem;

/// Durable per-account queue storage: one JSON file per account holding the
/// full ordered item collection. Every save rewrites the whole file via a
/// temp file + rename, so a reader never observes a half-written queue.
pub struct QueueStore {
    data_dir: PathBuf,
}

impl QueueStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn path(&self, account: &str) -> PathBuf {
        self.data_dir.join(format!("queue-{account}.json"))
    }

    /// Load an account's queue. A missing or unreadable file starts the
    /// queue empty rather than failing startup.
    pub async fn load(&self, account: &str) -> Vec<QueueItem> {
        let path = self.path(account);
        match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(
                        "Corrupt queue file for account '{account}' ({}), starting empty: {e}",
                        path.display()
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "Failed to read queue file for account '{account}' ({}), starting empty: {e}",
                    path.display()
                );
                Vec::new()
            }
        }
    }

    /// Persist an account's full queue. Write errors are logged and
    /// swallowed; the in-memory queue stays authoritative until the next
    /// successful save.
    pub async fn save(&self, account: &str, items: &[QueueItem]) {
        if let Err(e) = write_json_atomic(&self.path(account), items).await {
            tracing::error!("Failed to save queue for account '{account}': {e}");
        }
    }
}

/// Serialize `value` to `path` by writing a sibling temp file and renaming
/// it into place.
pub(crate) async fn write_json_atomic<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json).await?;
    fs::rename(&tmp, path).await?;

    Ok(())
}
