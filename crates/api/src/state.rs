use std::future::Future;
use std::sync::Arc;

use htw_core::error::CoreError;
use htw_db::{StoreResult, WorkflowStore};
use htw_events::EventBus;

use crate::config::ServerConfig;
use crate::engine::{self, TransitionEngine};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WorkflowStore>,
    pub config: Arc<ServerConfig>,
    /// Notification/audit sink.
    pub event_bus: Arc<EventBus>,
    /// The only writer of `status` columns.
    pub engine: Arc<TransitionEngine>,
}

impl AppState {
    pub fn new(store: Arc<dyn WorkflowStore>, config: ServerConfig, event_bus: Arc<EventBus>) -> Self {
        let engine = Arc::new(TransitionEngine::new(
            Arc::clone(&store),
            Arc::clone(&event_bus),
            config.store_timeout(),
        ));
        Self {
            store,
            config: Arc::new(config),
            event_bus,
            engine,
        }
    }

    /// Run a store call under the configured store timeout.
    pub async fn call<T>(&self, fut: impl Future<Output = StoreResult<T>>) -> Result<T, CoreError> {
        engine::bounded(self.config.store_timeout(), fut).await
    }
}
