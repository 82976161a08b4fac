use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{watch, Mutex};

use crate::recipes::Recipe;
use super::storage::{FavoritesFile, FavoritesStorage, STORAGE_VERSION};

struct StoreInner {
    storage: Box<dyn FavoritesStorage>,
    // Mutations hold this lock across mutate-and-persist, which serializes
    // writers and keeps the blob consistent with memory.
    favorites: Mutex<Vec<Recipe>>,
    updates: watch::Sender<Vec<Recipe>>,
}

/// Process-wide store of saved recipes. Cloning yields another handle to the
/// same state; insertion order is display order; every mutation rewrites the
/// persisted blob and notifies subscribers.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<StoreInner>,
}

impl FavoritesStore {
    /// Loads the persisted blob. A missing blob, an unreadable one, or an
    /// unsupported version starts the store empty; the file on disk is only
    /// touched again on the next mutation.
    pub async fn open(storage: impl FavoritesStorage + 'static) -> Self {
        let favorites = match storage.load().await {
            Ok(Some(file)) if file.version == STORAGE_VERSION => file.favorites,
            Ok(Some(file)) => {
                log::warn!("unsupported favorites version {}; starting empty", file.version);
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("could not load favorites: {:#}; starting empty", e);
                Vec::new()
            }
        };

        let (updates, _) = watch::channel(favorites.clone());
        Self {
            inner: Arc::new(StoreInner {
                storage: Box::new(storage),
                favorites: Mutex::new(favorites),
                updates,
            }),
        }
    }

    /// Saves a copy of the recipe. Adding an id twice is a no-op.
    pub async fn add(&self, recipe: Recipe) -> Result<()> {
        let mut favorites = self.inner.favorites.lock().await;
        if favorites.iter().any(|r| r.id == recipe.id) {
            return Ok(());
        }
        favorites.push(recipe);
        self.persist_and_notify(&favorites).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut favorites = self.inner.favorites.lock().await;
        let before = favorites.len();
        favorites.retain(|r| r.id != id);
        if favorites.len() == before {
            return Ok(());
        }
        self.persist_and_notify(&favorites).await
    }

    /// Adds the recipe if unsaved, removes it otherwise; returns whether the
    /// recipe is a favorite afterwards.
    pub async fn toggle(&self, recipe: &Recipe) -> Result<bool> {
        if self.is_favorite(&recipe.id).await {
            self.remove(&recipe.id).await?;
            Ok(false)
        } else {
            self.add(recipe.clone()).await?;
            Ok(true)
        }
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.inner.favorites.lock().await.iter().any(|r| r.id == id)
    }

    pub async fn get(&self, id: &str) -> Option<Recipe> {
        self.inner.favorites.lock().await.iter().find(|r| r.id == id).cloned()
    }

    /// The saved copy sharing a title with a fresh result, if any; the
    /// display layer prefers it over the fetched record.
    pub async fn find_by_title(&self, title: &str) -> Option<Recipe> {
        self.inner.favorites.lock().await.iter().find(|r| r.title == title).cloned()
    }

    pub async fn all(&self) -> Vec<Recipe> {
        self.inner.favorites.lock().await.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Recipe>> {
        self.inner.updates.subscribe()
    }

    async fn persist_and_notify(&self, favorites: &[Recipe]) -> Result<()> {
        let _ = self.inner.updates.send(favorites.to_vec());
        let file = FavoritesFile {
            version: STORAGE_VERSION,
            favorites: favorites.to_vec(),
        };
        self.inner.storage.save(&file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::slugify;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct MemoryStorage {
        blob: StdMutex<Option<FavoritesFile>>,
    }

    #[async_trait]
    impl FavoritesStorage for MemoryStorage {
        async fn load(&self) -> Result<Option<FavoritesFile>> {
            Ok(self.blob.lock().unwrap().clone())
        }

        async fn save(&self, file: &FavoritesFile) -> Result<()> {
            *self.blob.lock().unwrap() = Some(file.clone());
            Ok(())
        }
    }

    fn recipe(title: &str) -> Recipe {
        Recipe {
            id: slugify(title),
            title: title.to_string(),
            prep_time: "10 min".to_string(),
            ingredients: vec!["water".to_string()],
            instructions: vec!["boil".to_string()],
            image_url: Some("https://img.test/a".to_string()),
        }
    }

    #[tokio::test]
    async fn add_then_get_by_id_round_trips() {
        let store = FavoritesStore::open(MemoryStorage::default()).await;
        let saved = recipe("Tomato Soup");

        store.add(saved.clone()).await.unwrap();
        assert_eq!(store.get("tomato-soup").await, Some(saved));
        assert!(store.is_favorite("tomato-soup").await);

        store.remove("tomato-soup").await.unwrap();
        assert!(!store.is_favorite("tomato-soup").await);
        assert!(store.get("tomato-soup").await.is_none());
    }

    #[tokio::test]
    async fn insertion_order_is_preserved_and_duplicates_ignored() {
        let store = FavoritesStore::open(MemoryStorage::default()).await;
        store.add(recipe("First")).await.unwrap();
        store.add(recipe("Second")).await.unwrap();
        store.add(recipe("First")).await.unwrap();

        let titles: Vec<_> = store.all().await.into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let store = FavoritesStore::open(MemoryStorage::default()).await;
        let r = recipe("Pancakes");

        assert!(store.toggle(&r).await.unwrap());
        assert!(store.is_favorite(&r.id).await);
        assert!(!store.toggle(&r).await.unwrap());
        assert!(!store.is_favorite(&r.id).await);
    }

    #[tokio::test]
    async fn find_by_title_returns_saved_copy() {
        let store = FavoritesStore::open(MemoryStorage::default()).await;
        let mut saved = recipe("Pad Thai");
        saved.prep_time = "locally edited".to_string();
        store.add(saved.clone()).await.unwrap();

        assert_eq!(store.find_by_title("Pad Thai").await, Some(saved));
        assert!(store.find_by_title("Pad See Ew").await.is_none());
    }

    #[tokio::test]
    async fn mutations_notify_subscribers() {
        let store = FavoritesStore::open(MemoryStorage::default()).await;
        let mut updates = store.subscribe();

        store.add(recipe("Chili")).await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_version_starts_empty() {
        let storage = MemoryStorage::default();
        *storage.blob.lock().unwrap() = Some(FavoritesFile {
            version: 99,
            favorites: vec![recipe("From The Future")],
        });

        let store = FavoritesStore::open(storage).await;
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn reopen_sees_persisted_favorites() {
        use crate::favorites::JsonFileStorage;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let store = FavoritesStore::open(JsonFileStorage::new(&path)).await;
        store.add(recipe("Shakshuka")).await.unwrap();
        drop(store);

        let reopened = FavoritesStore::open(JsonFileStorage::new(&path)).await;
        assert!(reopened.is_favorite("shakshuka").await);
    }
}
