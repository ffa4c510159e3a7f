// SPDX-License-Identifier: AGPL-3.0-or-later

use std::future::Future;

use anyhow::Result;
use log::{error, info};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task;
use tokio::task::JoinHandle;
use triggered::{Listener, Trigger};

use crate::bus::ServiceMessage;
use crate::context::Context;

/// Sends messages on the gateway's communication bus (schema rebuilds, backend
/// registration/removal -- see [`ServiceMessage`]) between the `discovery` and `http` services.
pub type GatewaySender = broadcast::Sender<ServiceMessage>;

/// Resolves once the manager has asked a service to shut down.
pub type Shutdown = JoinHandle<()>;

/// A long-running gateway service -- `discovery_service` or `http_service` -- receiving the
/// shared [`Context`], a shutdown signal, and a sender onto the communication bus.
///
/// Uses the `async_trait` macro as a trick to avoid a more ugly trait signature, since working
/// with generic, static, pinned and boxed async functions can look quite messy.
#[async_trait::async_trait]
pub trait GatewayService {
    async fn call(&self, context: Context, shutdown: Shutdown, tx: GatewaySender) -> Result<()>;
}

/// Implements `GatewayService` for any async function matching `discovery_service`'s and
/// `http_service`'s signature, so they can be registered with [`ServiceManager::add`] directly,
/// without a wrapper type.
#[async_trait::async_trait]
impl<FN, F> GatewayService for FN
where
    // Function accepting the gateway context and our communication channels, returning a future.
    FN: Fn(Context, Shutdown, GatewaySender) -> F + Sync,
    // A future
    F: Future<Output = Result<()>> + Send + 'static,
{
    /// Internal method which calls our generic async function, passing in the context and
    /// channels for communication.
    ///
    /// This gets automatically wrapped in a static, boxed and pinned function signature by the
    /// `async_trait` macro so we don't need to do it ourselves.
    async fn call(&self, context: Context, shutdown: Shutdown, tx: GatewaySender) -> Result<()> {
        (self)(context, shutdown, tx).await
    }
}

/// Wrapper around `Trigger` which sends a signal as soon as `Signal` gets dropped.
#[derive(Clone)]
struct Signal(Trigger);

impl Signal {
    /// Fires the signal manually.
    pub fn trigger(&self) {
        self.0.trigger();
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        // Fires the signal automatically on drop
        self.trigger();

        // And now, drop it!
        drop(self);
    }
}

// Orchestrates the gateway's long-running services (`discovery`, `http`) on a shared `Context`.
//
// This manager offers a message bus between `discovery` and `http` for cross-service
// communication (schema rebuilds, backend registration/removal). It also sends a shutdown signal
// to allow services to react to it gracefully.
//
// A stopped service (because of a panic, error or successful return) sends an exit signal which
// can be subscribed to via the `on_exit` method. Usually a stopped service indicates system
// failure and it is recommended to stop the gateway when this event occurs.
pub struct ServiceManager {
    /// Shared, thread-safe gateway context, handed to every service.
    context: Context,

    /// Sender of our communication bus.
    tx: GatewaySender,

    /// Sender of exit signal.
    ///
    /// The manager catches returned errors or panics from services and sends the exit signal.
    exit_signal: Signal,

    /// Receiver of exit signal.
    ///
    /// This can be used to react to service errors, for example by quitting the program.
    exit_handle: Listener,

    /// Sender of shutdown signal.
    ///
    /// Both `discovery` and `http` subscribe to this broadcast channel and accordingly react to
    /// it.
    ///
    /// This needs to be a broadcast channel as we keep count of the subscribers and stop the
    /// service manager as soon as all of them have been dropped.
    shutdown_signal: broadcast::Sender<bool>,
}

impl ServiceManager {
    /// Returns a new instance of the gateway's service manager.
    ///
    /// The `capacity` argument defines the maximum bound of messages on the communication bus
    /// which get broadcast across `discovery` and `http`.
    pub fn new(capacity: usize, context: Context) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        let (shutdown_signal, _) = broadcast::channel(16);
        let (exit_signal, exit_handle) = triggered::trigger();

        Self {
            context,
            tx,
            exit_signal: Signal(exit_signal),
            exit_handle,
            shutdown_signal,
        }
    }

    /// Adds a new service (`discovery_service` or `http_service`) to the manager.
    ///
    /// Errors returned and panics by the service will send an exit signal which can be subscribed
    /// to via the `on_exit` method.
    pub fn add<S: GatewayService + Send + Sync + Copy + 'static>(
        &mut self,
        name: &'static str,
        service: S,
    ) {
        // Sender for communication bus
        let tx = self.tx.clone();

        // Sender and receiver for shutdown channel
        let shutdown_tx = self.shutdown_signal.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        // Wait for any signal from the shutdown channel
        let signal = task::spawn(async move {
            let _ = shutdown_rx.recv().await;
        });

        // Sender for exit signal
        let exit_signal = self.exit_signal.clone();

        // Reference to shared gateway context
        let context = self.context.clone();

        task::spawn(async move {
            info!("Start {} service", name);

            // Run the service!
            let handle = service.call(context, signal, tx).await;

            // Drop the shutdown sender of this service when we're done, this signals the shutdown
            // process that this service has finally stopped
            drop(shutdown_tx);

            // Handle potential errors which have been returned by the service.
            if let Some(err) = handle.err() {
                error!("Error in {} service: {}", name, err);
                exit_signal.trigger();
            }

            // `exit_signal` will go out of scope now and drops here. Since we also implemented the
            // `Drop` trait on `Signal` we will be able to fire a signal also when this task panics
            // or stops.
        });
    }

    /// Future which resolves as soon as a service returned an error, panicked or stopped.
    pub async fn on_exit(&self) {
        self.exit_handle.clone().await;
    }

    /// Informs `discovery` and `http` about graceful shutdown and waits for them until they both
    /// stopped.
    pub async fn shutdown(self) {
        info!("Received shutdown signal");

        let mut rx = self.shutdown_signal.subscribe();

        // Broadcast graceful shutdown messages to both services
        self.shutdown_signal.send(true).unwrap();

        // We drop our sender first to make sure _all_ senders get eventually closed, because the
        // recv() call otherwise sleeps forever.
        drop(self.shutdown_signal);

        // When every sender has gone out of scope, the recv call will return with a `Closed`
        // error. This is our signal that both services have been finally shut down and we are
        // done for good!
        loop {
            match rx.recv().await {
                Err(RecvError::Closed) => break,
                _ => (),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{Context, GatewaySender, ServiceManager, ServiceMessage, Shutdown};
    use crate::config::Configuration;
    use crate::pubsub::LocalBus;
    use crate::registry::{RootTypeRef, SchemaDefinition, ServiceInfo};

    fn test_context() -> Context {
        Context::new(Configuration::default(), Arc::new(LocalBus::new()))
    }

    #[tokio::test]
    async fn service_starts_and_stops_gracefully() {
        let mut manager = ServiceManager::new(16, test_context());

        manager.add("test", |_, signal: Shutdown, _| async move {
            let work = tokio::task::spawn(async {
                loop {
                    // Doing some very important work here ..
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            });

            // Stop when we received shutdown signal or when work was done
            tokio::select! { _ = work => (), _ = signal => () };

            // Some "tidying" we have to do before we can actually close this service
            tokio::time::sleep(Duration::from_millis(250)).await;

            Ok(())
        });

        manager.shutdown().await;
    }

    /// Exercises the bus with the gateway's own `ServiceMessage`, mirroring how `discovery`
    /// publishes `BackendRegistered` after an introspection succeeds: a listener service folds
    /// the message straight into the shared registry, rather than into an opaque test counter.
    #[tokio::test]
    async fn communication_bus_delivers_backend_registration() {
        let context = test_context();
        let mut manager = ServiceManager::new(32, context.clone());

        manager.add("listener", |context: Context, _, tx: GatewaySender| async move {
            let mut rx = tx.subscribe();
            if let Ok(ServiceMessage::BackendRegistered(name)) = rx.recv().await {
                let info = ServiceInfo {
                    name,
                    hostname: "localhost".into(),
                    port: "4000".into(),
                    graphql_http_endpoint: "/graphql".into(),
                    graphql_socket_endpoint: None,
                    schema_extensions: vec![],
                };
                let schema = SchemaDefinition {
                    query_type: RootTypeRef { name: "Query".into() },
                    mutation_type: None,
                    subscription_type: None,
                    types: vec![],
                };
                context.registry.upsert(info, schema).await;
            }
            Ok(())
        });

        manager.add("announcer", |_, _, tx: GatewaySender| async move {
            // Give the listener a chance to subscribe before the message goes out.
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(ServiceMessage::BackendRegistered("demo".into()));
            Ok(())
        });

        manager.shutdown().await;

        let snapshot = context.registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].info.name, "demo");
    }

    #[tokio::test]
    async fn on_exit_fires_when_a_service_panics() {
        let context = test_context();
        let mut manager = ServiceManager::new(32, context);

        manager.add("discovery-like", |_, signal: Shutdown, _| async move {
            tokio::select! { _ = std::future::pending::<()>() => (), _ = signal => () };
            Ok(())
        });

        manager.add("http-like", |_, _, _| async move {
            // Wait a little bit for the first task to subscribe to the shutdown signal
            tokio::time::sleep(Duration::from_millis(50)).await;
            panic!("This went wrong");
        });

        // Wait for panic to take place ..
        manager.on_exit().await;

        // .. then shut everything down
        manager.shutdown().await;
    }
}
