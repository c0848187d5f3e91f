pub mod catalog;
pub mod countdown;
pub mod engine;
pub mod hub;
pub mod metadata;
pub mod registry;

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::config::AppConfig;

pub use self::hub::{ClientConnection, ConnectionHub};
use self::{
    catalog::RoundCatalog,
    countdown::CountdownTicks,
    engine::{LifecycleEngine, RoundSettings},
    metadata::MetadataStore,
};

pub type SharedState = Arc<AppState>;

const SSE_MIRROR_CAPACITY: usize = 64;

/// Central application state: the game engine, open connections and collected metadata.
pub struct AppState {
    config: AppConfig,
    hub: Arc<ConnectionHub>,
    engine: Mutex<LifecycleEngine>,
    metadata: MetadataStore,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Also returns the receiving side of the countdown tick channel; hand it to
    /// [`crate::services::countdown_service::run_countdown_driver`] so rounds can expire.
    pub fn new(config: AppConfig, catalog: RoundCatalog) -> (SharedState, CountdownTicks) {
        let hub = Arc::new(ConnectionHub::new(SSE_MIRROR_CAPACITY));
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        let settings = RoundSettings {
            countdown_secs: config.round_seconds(),
            tick_interval: config.tick_interval,
        };
        let engine = LifecycleEngine::new(Arc::new(catalog), settings, hub.clone(), ticks_tx);

        let state = Arc::new(Self {
            config,
            hub,
            engine: Mutex::new(engine),
            metadata: MetadataStore::new(),
        });
        (state, ticks_rx)
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of open WebSocket connections and the SSE mirror.
    pub fn hub(&self) -> &ConnectionHub {
        &self.hub
    }

    /// Per-connection metadata collected over HTTP.
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Run `f` against the engine while holding its lock.
    ///
    /// `f` is synchronous, so one event is fully applied (and its broadcasts queued)
    /// before the next one starts.
    pub async fn with_engine<T>(&self, f: impl FnOnce(&mut LifecycleEngine) -> T) -> T {
        let mut engine = self.engine.lock().await;
        f(&mut engine)
    }
}
