// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;
use std::sync::Arc;

use crate::config::Configuration;
use crate::context::Context;
use crate::discovery::discovery_service;
use crate::http::http_service;
use crate::manager::ServiceManager;
use crate::pubsub::{LocalBus, PubSub};

const COMMUNICATION_BUS_CAPACITY: usize = 512;

/// Top-level gateway process: wires the `discovery` and `http` services together on a shared
/// [`ServiceManager`].
pub struct Node {
    manager: ServiceManager,
}

impl Node {
    /// Starts the gateway with the given configuration and pub/sub transport.
    pub async fn start(config: Configuration, pubsub: Arc<dyn PubSub>) -> Self {
        let context = Context::new(config, pubsub);
        let mut manager = ServiceManager::new(COMMUNICATION_BUS_CAPACITY, context);

        manager.add("discovery", discovery_service);
        manager.add("http", http_service);

        Self { manager }
    }

    /// Starts the gateway using the bundled in-process pub/sub transport.
    pub async fn start_local(config: Configuration) -> Self {
        Self::start(config, Arc::new(LocalBus::new())).await
    }

    /// Resolves when a service has stopped unexpectedly.
    pub async fn on_exit(&self) {
        self.manager.on_exit().await;
    }

    /// Gracefully shuts down every service.
    pub async fn shutdown(self) {
        self.manager.shutdown().await;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").finish_non_exhaustive()
    }
}
