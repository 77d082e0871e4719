use log::{info, warn};
use thiserror::Error;

use crate::cache::{ArtifactStore, InflightLocks, StoreError};
use crate::config::AppConfig;
use crate::generation::upstream::{UpstreamClient, UpstreamError};
use crate::params::{policy, CacheKey, EscapeMode, ParameterSet};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

#[derive(Debug)]
pub struct GeneratedImage {
    pub key: CacheKey,
    pub data: Vec<u8>,
    pub status: CacheStatus,
}

/// Serves generation requests from the artifact store, calling upstream on a miss.
pub struct ImageGenerator {
    store: ArtifactStore,
    upstream: UpstreamClient,
    inflight: InflightLocks,
}

impl ImageGenerator {
    pub fn new(store: ArtifactStore, upstream: UpstreamClient) -> Self {
        Self {
            store,
            upstream,
            inflight: InflightLocks::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        let store = ArtifactStore::new(&config.cache_dir, config.cache_file_extension.clone());
        let upstream = UpstreamClient::new(config.upstream_url.clone())?;
        Ok(Self::new(store, upstream))
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Handle one request given its decoded query pairs.
    pub async fn handle<I, K, V>(&self, query: I, mode: EscapeMode) -> Result<GeneratedImage, GenerationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut params = ParameterSet::from_query(query, mode);
        let bypass = policy::apply(&mut params, &mut rand::thread_rng());
        let key = CacheKey::derive(&params);

        if let Some(reason) = bypass {
            info!("Cache bypass ({:?}) for {}", reason, key);
            return self.render(key, &params, CacheStatus::Bypass).await;
        }

        if let Some(data) = self.lookup(&key).await {
            info!("Cache hit for {}", key);
            return Ok(GeneratedImage { key, data, status: CacheStatus::Hit });
        }

        let _lease = self.inflight.acquire(&key).await;

        // a concurrent request for the same key may have finished while we waited
        if let Some(data) = self.lookup(&key).await {
            info!("Cache hit for {} after waiting on in-flight generation", key);
            return Ok(GeneratedImage { key, data, status: CacheStatus::Hit });
        }

        info!("Cache miss for {}", key);
        self.render(key, &params, CacheStatus::Miss).await
    }

    /// Cached artifact for `key`, if one can be read. Read failures count as misses.
    async fn lookup(&self, key: &CacheKey) -> Option<Vec<u8>> {
        if !self.store.exists(key).await {
            return None;
        }

        artifact_or_miss(key, self.store.read(key).await)
    }

    async fn render(
        &self,
        key: CacheKey,
        params: &ParameterSet,
        status: CacheStatus,
    ) -> Result<GeneratedImage, GenerationError> {
        let data = self.upstream.generate(params).await.map_err(|e| {
            log::error!("Generation failed for {}: {}", key, e);
            e
        })?;

        self.store.write(&key, &data).await.map_err(|e| {
            log::error!("Failed to store artifact {}: {}", key, e);
            e
        })?;

        Ok(GeneratedImage { key, data, status })
    }
}

/// The filesystem can change between the existence check and the read, so a
/// failed read falls through to regeneration.
fn artifact_or_miss(key: &CacheKey, read: Result<Vec<u8>, StoreError>) -> Option<Vec<u8>> {
    match read {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("Treating unreadable artifact {} as a miss: {}", key, e);
            None
        }
    }
}
