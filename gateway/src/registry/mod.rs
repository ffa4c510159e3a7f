// SPDX-License-Identifier: AGPL-3.0-or-later

mod types;

pub use types::{
    Backend, ExtensionDeclaration, FieldArg, IntrospectionResponse, IntrospectionResponseData,
    RootTypeRef, SchemaDefinition, ServiceDown, ServiceInfo, TypeDef, TypeField, TypeKind,
    TypeRef,
};

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::broadcast::{channel, Receiver, Sender};
use tokio::sync::Mutex;

/// Holds the most recently seen introspection snapshot for every registered backend.
///
/// Grounded on the teacher's `SchemaProvider`: an in-memory map guarded by a `tokio::sync::Mutex`
/// and a broadcast channel that notifies subscribers (the discovery loop's rebuild trigger)
/// whenever the set of backends changes.
#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    backends: Arc<Mutex<HashMap<String, Backend>>>,
    tx: Sender<()>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let (tx, _) = channel(64);
        Self {
            backends: Arc::new(Mutex::new(HashMap::new())),
            tx,
        }
    }

    /// Returns a receiver notified every time the registry is mutated.
    pub fn on_change(&self) -> Receiver<()> {
        self.tx.subscribe()
    }

    /// Inserts or replaces a backend's entry wholesale.
    pub async fn upsert(&self, info: ServiceInfo, introspection: SchemaDefinition) {
        info!("Registering backend '{}'", info.name);
        let mut backends = self.backends.lock().await;
        backends.insert(
            info.name.clone(),
            Backend { info, introspection },
        );
        drop(backends);
        self.notify();
    }

    /// Removes a backend by name. No-op if it was never registered.
    pub async fn remove(&self, name: &str) {
        let mut backends = self.backends.lock().await;
        if backends.remove(name).is_some() {
            info!("Removed backend '{}'", name);
            drop(backends);
            self.notify();
        } else {
            warn!("Received removal for unknown backend '{}'", name);
        }
    }

    /// Returns a consistent snapshot of all currently registered backends.
    pub async fn snapshot(&self) -> Vec<Backend> {
        self.backends.lock().await.values().cloned().collect()
    }

    fn notify(&self) {
        if self.tx.send(()).is_err() {
            warn!("No subscriber has been informed about a registry change");
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_info(name: &str) -> ServiceInfo {
        ServiceInfo {
            name: name.into(),
            hostname: "localhost".into(),
            port: "4000".into(),
            graphql_http_endpoint: "/graphql".into(),
            graphql_socket_endpoint: None,
            schema_extensions: vec![],
        }
    }

    fn empty_schema() -> SchemaDefinition {
        SchemaDefinition {
            query_type: RootTypeRef { name: "Query".into() },
            mutation_type: None,
            subscription_type: None,
            types: vec![],
        }
    }

    #[tokio::test]
    async fn upsert_and_snapshot() {
        let registry = SchemaRegistry::new();
        registry.upsert(service_info("a"), empty_schema()).await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].info.name, "a");
    }

    #[tokio::test]
    async fn remove_drops_backend() {
        let registry = SchemaRegistry::new();
        registry.upsert(service_info("a"), empty_schema()).await;
        registry.remove("a").await;

        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn upsert_notifies_subscribers() {
        let registry = SchemaRegistry::new();
        let mut rx = registry.on_change();

        registry.upsert(service_info("a"), empty_schema()).await;

        assert!(rx.recv().await.is_ok());
    }
}
