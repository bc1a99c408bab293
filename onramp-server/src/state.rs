//! Application state shared across all request handlers.

use onramp_core::relay::OrderRelay;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Order relay (rebuilt on SIGHUP).
    relay: Arc<RwLock<Arc<OrderRelay>>>,
}

impl AppState {
    /// Create a new AppState around the given relay.
    pub fn new(relay: OrderRelay) -> Self {
        Self {
            relay: Arc::new(RwLock::new(Arc::new(relay))),
        }
    }

    /// The current relay.
    ///
    /// The lock is released before returning, so a request keeps using the
    /// relay it started with even if a reload swaps it meanwhile.
    pub async fn relay(&self) -> Arc<OrderRelay> {
        Arc::clone(&*self.relay.read().await)
    }

    /// Swap in a new relay (used during SIGHUP reload).
    pub async fn replace_relay(&self, relay: OrderRelay) {
        *self.relay.write().await = Arc::new(relay);
    }
}
