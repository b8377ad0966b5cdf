use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::catalog::{CatalogError, CatalogSnapshot, RawCatalog};

const DEFAULT_CAPACITY: u64 = 16;
const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(300);

/// Where a raw catalog comes from. Implementations may block; the cache runs them off the runtime.
pub trait CatalogSource: Send + Sync + 'static {
    /// Cache key identifying this catalog.
    fn key(&self) -> String;
    fn fetch(&self) -> Result<RawCatalog, CatalogError>;
}

pub struct FileCatalogSource {
    path: PathBuf
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for FileCatalogSource {
    fn key(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<RawCatalog, CatalogError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Holds validated snapshots so repeated requests do not re-read and re-validate the catalog.
///
/// Concurrent loads of the same key are coalesced into a single fetch.
pub struct CatalogCache {
    cache: Cache<String, Arc<CatalogSnapshot>>
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_CAPACITY, DEFAULT_TIME_TO_LIVE)
    }

    pub fn with_settings(capacity: u64, time_to_live: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(time_to_live)
                .build()
        }
    }

    pub async fn load(&self, source: Arc<dyn CatalogSource>) -> Result<Arc<CatalogSnapshot>, Arc<CatalogError>> {
        let key = source.key();

        self.cache.try_get_with(key.clone(), async move {
            debug!("Catalog [{key}] not cached, fetching");

            let raw = spawn_blocking(move || source.fetch())
                .await
                .map_err(|error| CatalogError::Loader(error.to_string()))??;

            Ok::<_, CatalogError>(Arc::new(CatalogSnapshot::from_raw(raw)?))
        }).await
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}
