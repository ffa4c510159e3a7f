// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::schema::ComposedSchema;

/// Holds the gateway's current composed schema and lets it be atomically replaced.
///
/// Requests in flight against the old schema keep their own `Arc` clone and run to completion
/// unaffected by a swap; a new request sees the new schema as soon as [`SchemaSlot::swap`]
/// returns. A failed rebuild never touches the slot, so the gateway keeps serving the last good
/// schema through a broken backend rather than going dark.
#[derive(Clone, Debug)]
pub struct SchemaSlot {
    inner: Arc<RwLock<Arc<ComposedSchema>>>,
}

impl SchemaSlot {
    pub fn new(schema: ComposedSchema) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(schema))),
        }
    }

    /// Returns the currently active schema.
    pub async fn current(&self) -> Arc<ComposedSchema> {
        self.inner.read().await.clone()
    }

    /// Atomically replaces the active schema.
    pub async fn swap(&self, schema: ComposedSchema) {
        *self.inner.write().await = Arc::new(schema);
    }
}
