use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::store::write_json_atomic;

/// Record of normalized content URLs that have already been fully
/// processed, independent of which account handled them. Consulted by the
/// duplicate guard so re-discovered content is rejected even after its
/// queue entry is long gone.
pub struct Ledger {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl Ledger {
    pub async fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("processed.json");
        let entries = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "Corrupt processed-content ledger ({}), starting empty: {e}",
                        path.display()
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(
                    "Failed to read processed-content ledger ({}), starting empty: {e}",
                    path.display()
                );
                BTreeSet::new()
            }
        };

        Self { path, entries }
    }

    pub fn contains(&self, normalized_url: &str) -> bool {
        self.entries.contains(normalized_url)
    }

    pub fn record(&mut self, normalized_url: String) {
        self.entries.insert(normalized_url);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the ledger. Errors are logged and swallowed, matching the
    /// queue store.
    pub async fn save(&self) {
        if let Err(e) = write_json_atomic(&self.path, &self.entries).await {
            tracing::error!("Failed to save processed-content ledger: {e}");
        }
    }
}
