use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::recipes::Recipe;

pub const STORAGE_VERSION: u32 = 1;

/// On-disk layout of the favorites blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesFile {
    pub version: u32,
    pub favorites: Vec<Recipe>,
}

/// Persistence adapter behind the favorites store, so the storage medium is
/// swappable (JSON file in production, in-memory fake in tests).
#[async_trait]
pub trait FavoritesStorage: Send + Sync {
    /// `None` means no blob has ever been written.
    async fn load(&self) -> Result<Option<FavoritesFile>>;
    async fn save(&self, file: &FavoritesFile) -> Result<()>;
}

/// Favorites persisted as a single pretty-printed JSON file, rewritten on
/// every mutation.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FavoritesStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<FavoritesFile>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let file = serde_json::from_slice(&bytes)
                    .with_context(|| format!("corrupt favorites file at {}", self.path.display()))?;
                Ok(Some(file))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("failed to read favorites file at {}", self.path.display())),
        }
    }

    async fn save(&self, file: &FavoritesFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(file)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("failed to write favorites file at {}", self.path.display()))
    }
}
