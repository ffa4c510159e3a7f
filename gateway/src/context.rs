// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use crate::config::Configuration;
use crate::pubsub::PubSub;
use crate::registry::SchemaRegistry;
use crate::schema_slot::SchemaSlot;

/// Inner data shared across all services.
pub struct Data {
    /// Gateway configuration.
    pub config: Configuration,

    /// In-memory record of every currently registered backend.
    pub registry: SchemaRegistry,

    /// The gateway's currently active composed schema.
    pub schema: SchemaSlot,

    /// Publish/subscribe transport used for backend lifecycle announcements.
    pub pubsub: Arc<dyn PubSub>,

    /// Shared HTTP client used for introspection and request forwarding.
    pub http_client: reqwest::Client,
}

impl Debug for Data {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        // Omit the schema and pubsub fields, neither implements Debug usefully.
        fmt.debug_struct("Data")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Data {
    pub fn new(config: Configuration, pubsub: Arc<dyn PubSub>) -> Self {
        let registry = SchemaRegistry::new();
        let schema = SchemaSlot::new(
            crate::schema::build(&[]).expect("composing an empty backend set cannot fail"),
        );

        Self {
            config,
            registry,
            schema,
            pubsub,
            http_client: reqwest::Client::new(),
        }
    }
}

/// Data shared across all services.
#[derive(Debug, Clone)]
pub struct Context(pub Arc<Data>);

impl Context {
    /// Returns a new instance of `Context`.
    pub fn new(config: Configuration, pubsub: Arc<dyn PubSub>) -> Self {
        Self(Arc::new(Data::new(config, pubsub)))
    }
}

impl Deref for Context {
    type Target = Data;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
