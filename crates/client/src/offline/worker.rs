//! Offline worker lifecycle and fetch handling.
//!
//! ### Lifecycle
//! `Parsed → Installing → Installed → Activating → Activated`
//!
//! - install: open the current generation and precache the static shell
//!   assets, all or nothing. A failed precache is logged and install still
//!   completes; waiting is always skipped.
//! - activate: delete every generation except the current one, then claim
//!   open clients.
//! - fetch: only handled once activated. See [`super::policy`] for routing.

use std::fmt;
use std::sync::Arc;

use nai_core::{CacheDb, Error, OfflineConfig};
use reqwest::Method;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use url::Url;

use super::network::Network;
use super::policy::{Route, classify};
use super::request::{Request, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    /// Number of precached responses, zero when precaching failed.
    pub cached: usize,
    /// Why precaching failed, if it did.
    pub error: Option<String>,
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateOutcome {
    /// Generations removed, in creation order.
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

/// Result of offering a request to the worker.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The worker did not intercept; the request goes out as if it were absent.
    NotIntercepted,
    /// The worker answered. An error means the request fails for the page.
    Responded(Result<Response, Error>),
}

impl FetchOutcome {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, FetchOutcome::Responded(_))
    }
}

/// The offline fetch policy for one origin.
pub struct OfflineWorker {
    config: OfflineConfig,
    origin: Url,
    cache: CacheDb,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl OfflineWorker {
    /// A freshly parsed worker. Nothing is read from storage.
    pub fn new(config: OfflineConfig, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        if !origin.origin().is_tuple() {
            return Err(Error::InvalidUrl(format!("{} has no usable origin", config.origin)));
        }
        Ok(Self {
            config,
            origin,
            cache,
            network,
            state: RwLock::new(WorkerState::Parsed),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// A worker for an origin that may already have been set up.
    ///
    /// When the current generation exists in storage the worker starts out
    /// activated, the way a browser restores a registered worker.
    pub async fn register(config: OfflineConfig, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let worker = Self::new(config, cache, network)?;
        if worker.cache.has_bucket(&worker.config.cache_version).await? {
            *worker.state.write().await = WorkerState::Activated;
            tracing::debug!("restored activated worker for generation {}", worker.config.cache_version);
        }
        Ok(worker)
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Names of all stored generations.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.cache.bucket_names().await
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {to} from {}", *state)));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: WorkerState) {
        *self.state.write().await = to;
    }

    /// Handle the install event.
    pub async fn install(&self) -> Result<InstallOutcome, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;

        let outcome = match self.precache().await {
            Ok(cached) => {
                tracing::info!("precached {cached} assets into {}", self.config.cache_version);
                InstallOutcome { cached, error: None, skip_waiting: true }
            }
            Err(e) => {
                tracing::warn!("cache installation failed: {e}");
                InstallOutcome { cached: 0, error: Some(e.to_string()), skip_waiting: true }
            }
        };

        self.set_state(WorkerState::Installed).await;
        Ok(outcome)
    }

    /// Fetch every precache path, then store them together.
    async fn precache(&self) -> Result<usize, Error> {
        let version = &self.config.cache_version;
        self.cache.open_bucket(version).await?;

        let mut stored = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let url = self
                .origin
                .join(path)
                .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            if url.origin() != self.origin.origin() {
                return Err(Error::InvalidUrl(format!("{path}: resolves outside {}", self.config.origin)));
            }
            let request = Request::get(url);
            let response = self.network.fetch(&request).await?;
            if !response.status.is_success() {
                return Err(Error::Network(format!("{}: status {}", request.url, response.status.as_u16())));
            }
            stored.push(response.to_cached(&request.url));
        }

        self.cache.put_entries(version, Method::GET.as_str(), &stored).await?;
        Ok(stored.len())
    }

    /// Handle the activate event.
    pub async fn activate(&self) -> Result<ActivateOutcome, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;

        let deleted = match self.evict_stale().await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!("failed to clear old caches: {e}");
                Vec::new()
            }
        };

        self.set_state(WorkerState::Activated).await;
        tracing::info!("activated {}, claiming clients", self.config.cache_version);
        Ok(ActivateOutcome { deleted, clients_claimed: true })
    }

    async fn evict_stale(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.cache.bucket_names().await? {
            if name == self.config.cache_version {
                continue;
            }
            tracing::info!("deleting old cache: {name}");
            if self.cache.delete_bucket(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Install then activate, as a browser does for a worker that skips waiting.
    pub async fn start(&self) -> Result<(InstallOutcome, ActivateOutcome), Error> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Handle a fetch event.
    pub async fn handle_fetch(&self, request: Request) -> FetchOutcome {
        if self.state().await != WorkerState::Activated {
            return FetchOutcome::NotIntercepted;
        }

        let route = classify(&request, &self.origin.origin());
        tracing::debug!("{} {} -> {route:?}", request.method, request.url);

        match route {
            Route::CrossOrigin => FetchOutcome::NotIntercepted,
            Route::NetworkOnly => FetchOutcome::Responded(Ok(self.network_only(&request).await)),
            Route::NetworkFirst => FetchOutcome::Responded(self.network_first(&request).await),
            Route::Passthrough => FetchOutcome::Responded(self.network.fetch(&request).await),
        }
    }

    async fn network_only(&self, request: &Request) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("serving offline page for {}: {e}", request.url);
                Response::offline_page(request.url.clone(), &self.config.offline_page)
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if request.method == Method::GET && response.is_cacheable() {
                    self.spawn_cache_write(request, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                tracing::debug!("network failed for {}, trying cache: {e}", request.url);
                match self.cache.match_any(request.method.as_str(), request.url.as_str()).await {
                    Ok(Some(cached)) => Response::from_cached(cached),
                    Ok(None) => Err(e),
                    Err(db) => {
                        tracing::warn!("cache lookup failed for {}: {db}", request.url);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Store a copy of the response without holding up the caller.
    async fn spawn_cache_write(&self, request: &Request, response: &Response) {
        let cache = self.cache.clone();
        let bucket = self.config.cache_version.clone();
        let cached = response.to_cached(&request.url);

        let handle = tokio::spawn(async move {
            if let Err(e) = cache.put_entry(&bucket, Method::GET.as_str(), &cached).await {
                tracing::warn!("background cache write for {} failed: {e}", cached.url);
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every background cache write started so far.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.pending.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("background cache write task failed: {e}");
            }
        }
    }
}
