//! Shared state for the development server.
//!
//! Build status, the in-memory artifact cache and the live-reload client
//! registry, guarded by parking_lot locks. Every rebuild gets a generation
//! number; results from a generation that is no longer current are dropped.

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue};
use kiln_config::DevServerConfig;
use kiln_pipeline::{Asset, CancelToken};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc;

use crate::dev::DevEvent;

/// Status of the most recent build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// No build has run yet.
    Pending,
    Building,
    Ok { duration_ms: u64 },
    /// The last build left errors, in manifest order.
    Failed { errors: Vec<String> },
}

impl BuildStatus {
    /// Value of the `X-Kiln-Build-Status` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Pending => "pending",
            BuildStatus::Building => "building",
            BuildStatus::Ok { .. } => "ok",
            BuildStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BuildStatus::Failed { .. })
    }

    /// Errors of a failed build.
    pub fn errors(&self) -> Option<&[String]> {
        match self {
            BuildStatus::Failed { errors } => Some(errors),
            _ => None,
        }
    }
}

/// One artifact held in memory.
#[derive(Debug, Clone)]
pub struct CachedAsset {
    pub content: Bytes,
    pub content_type: &'static str,
}

/// Artifacts keyed by the URL path they are served under.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    files: HashMap<String, CachedAsset>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key every asset by `dev.url_for(filename)`.
    pub fn from_assets(assets: &[Asset], dev: &DevServerConfig) -> Self {
        let mut cache = Self::new();
        for asset in assets {
            cache.insert(
                dev.url_for(&asset.filename),
                asset.content.clone(),
                asset.content_type(),
            );
        }
        cache
    }

    pub fn insert(&mut self, url: String, content: impl Into<Bytes>, content_type: &'static str) {
        self.files.insert(
            url,
            CachedAsset {
                content: content.into(),
                content_type,
            },
        );
    }

    pub fn get(&self, url: &str) -> Option<&CachedAsset> {
        self.files.get(url)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Cached URL paths, sorted.
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.files.keys().cloned().collect();
        urls.sort();
        urls
    }
}

/// Live-reload clients by id.
pub type ClientRegistry = RwLock<HashMap<usize, mpsc::Sender<String>>>;

pub struct DevServerState {
    dev: DevServerConfig,
    headers: Vec<(HeaderName, HeaderValue)>,
    status: RwLock<BuildStatus>,
    cache: RwLock<AssetCache>,
    clients: ClientRegistry,
    next_client_id: AtomicUsize,
    generation: AtomicU64,
    /// Token of the build in flight. Also serializes generation changes.
    current: Mutex<CancelToken>,
}

impl DevServerState {
    /// Create state for a server configured by `dev`.
    ///
    /// Headers that are not valid HTTP are logged and skipped.
    pub fn new(dev: DevServerConfig) -> Self {
        let headers = dev
            .headers
            .iter()
            .filter_map(|(name, value)| {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => Some((name, value)),
                    _ => {
                        tracing::warn!(header = %name, "skipping invalid devServer header");
                        None
                    }
                }
            })
            .collect();

        Self {
            dev,
            headers,
            status: RwLock::new(BuildStatus::Pending),
            cache: RwLock::new(AssetCache::new()),
            clients: RwLock::new(HashMap::new()),
            next_client_id: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            current: Mutex::new(CancelToken::new()),
        }
    }

    pub fn dev_config(&self) -> &DevServerConfig {
        &self.dev
    }

    /// Configured response headers, in declaration order.
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Start a new generation: cancel the build in flight and hand out a
    /// fresh token for the next one.
    pub fn begin_build(&self) -> (u64, CancelToken) {
        let mut current = self.current.lock();
        current.cancel();
        let token = CancelToken::new();
        *current = token.clone();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.status.write() = BuildStatus::Building;
        (generation, token)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Record a successful build. Returns `false` and changes nothing if
    /// `generation` has been superseded.
    pub fn complete_build(&self, generation: u64, cache: AssetCache, duration_ms: u64) -> bool {
        let _current = self.current.lock();
        if !self.is_current(generation) {
            return false;
        }
        *self.cache.write() = cache;
        *self.status.write() = BuildStatus::Ok { duration_ms };
        true
    }

    /// Record a failed build. With `cache` set (partial output) it replaces
    /// the served artifacts; otherwise the previous ones stay. Returns
    /// `false` if `generation` has been superseded.
    pub fn fail_build(&self, generation: u64, errors: Vec<String>, cache: Option<AssetCache>) -> bool {
        let _current = self.current.lock();
        if !self.is_current(generation) {
            return false;
        }
        if let Some(cache) = cache {
            *self.cache.write() = cache;
        }
        *self.status.write() = BuildStatus::Failed { errors };
        true
    }

    pub fn status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    pub fn cached(&self, url: &str) -> Option<CachedAsset> {
        self.cache.read().get(url).cloned()
    }

    pub fn cached_urls(&self) -> Vec<String> {
        self.cache.read().urls()
    }

    /// Whether `path` addresses build output: a cached artifact, or anything
    /// under a non-root public path.
    pub fn is_bundle_request(&self, path: &str) -> bool {
        if self.cache.read().get(path).is_some() {
            return true;
        }
        let prefix = self.dev.mount_prefix();
        !prefix.is_empty() && path.starts_with(prefix) && path[prefix.len()..].starts_with('/')
    }

    /// Register a live-reload client. A client joining while the last build
    /// is failing is told so immediately.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(100);

        if let BuildStatus::Failed { errors } = self.status() {
            let event = DevEvent::BuildFailed {
                generation: self.generation(),
                errors,
            };
            if let Ok(json) = serde_json::to_string(&event) {
                let _ = tx.try_send(json);
            }
        }

        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send `event` to every client without waiting. Clients that went away
    /// or stopped draining their buffer are dropped.
    pub fn broadcast(&self, event: &DevEvent) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode dev event");
                return;
            }
        };

        self.clients.write().retain(|id, tx| match tx.try_send(json.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(client = id, "dropping stalled live-reload client");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;
