// SPDX-License-Identifier: AGPL-3.0-or-later

mod introspection;

use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use crate::bus::{ServiceMessage, ServiceSender};
use crate::context::Context;
use crate::manager::Shutdown;
use crate::pubsub::{TOPIC_SERVICE_DOWN, TOPIC_SERVICE_UP};
use crate::registry::{ServiceDown, ServiceInfo};
use crate::schema;

/// How often the gateway re-announces itself on `service.up`, so a backend that only just came
/// up (and may itself want to register extensions against the gateway's own schema) can learn
/// about it without waiting for a restart.
const SELF_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(300);

/// Name the gateway announces itself under. `service.up` messages carrying this name, or an
/// empty `graphqlHttpEndpoint`, are the gateway's own announcement bouncing back off the bus and
/// are ignored rather than introspected and registered as a backend.
const GATEWAY_SERVICE_NAME: &str = "gateway";

/// Long-running service discovering backends, keeping the schema registry current, and rebuilding
/// the composed schema whenever it changes.
pub async fn discovery_service(context: Context, signal: Shutdown, tx: ServiceSender) -> Result<()> {
    let mut service_up = context
        .pubsub
        .subscribe(TOPIC_SERVICE_UP)
        .await
        .map_err(anyhow::Error::msg)?;
    let mut service_down = context
        .pubsub
        .subscribe(TOPIC_SERVICE_DOWN)
        .await
        .map_err(anyhow::Error::msg)?;
    let mut registry_changed = context.registry.on_change();

    announce_self(&context).await;
    let mut announce_interval = tokio::time::interval(SELF_ANNOUNCE_INTERVAL);

    tokio::pin!(signal);

    loop {
        tokio::select! {
            _ = &mut signal => break,

            _ = announce_interval.tick() => {
                announce_self(&context).await;
            }

            payload = service_up.recv() => {
                let Some(payload) = payload else { break };
                match serde_json::from_slice::<ServiceInfo>(&payload) {
                    Ok(info) if is_self_announcement(&info) => {
                        info!("ignoring self-announcement from '{}'", info.name);
                    }
                    Ok(info) => {
                        let name = info.name.clone();
                        handle_service_up(&context, info).await;
                        let _ = tx.send(ServiceMessage::BackendRegistered(name));
                    }
                    Err(err) => warn!("ignoring malformed service.up payload: {err}"),
                }
            }

            payload = service_down.recv() => {
                let Some(payload) = payload else { break };
                match serde_json::from_slice::<ServiceDown>(&payload) {
                    Ok(message) => {
                        context.registry.remove(&message.name).await;
                        let _ = tx.send(ServiceMessage::BackendRemoved(message.name));
                    }
                    Err(err) => warn!("ignoring malformed service.down payload: {err}"),
                }
            }

            changed = registry_changed.recv() => {
                if changed.is_ok() {
                    rebuild(&context).await;
                    let _ = tx.send(ServiceMessage::SchemaRebuilt);
                }
            }
        }
    }

    Ok(())
}

/// Whether `info` is the gateway's own `service.up` announcement delivered back to itself by a
/// `PubSub` implementation (like `LocalBus`) that broadcasts to every subscriber, including the
/// publisher.
fn is_self_announcement(info: &ServiceInfo) -> bool {
    info.name == GATEWAY_SERVICE_NAME || info.graphql_http_endpoint.is_empty()
}

async fn handle_service_up(context: &Context, info: ServiceInfo) {
    let url = format!(
        "http://{}:{}{}",
        info.hostname, info.port, info.graphql_http_endpoint
    );

    match introspection::introspect(&context.http_client, &url).await {
        Ok(schema) => context.registry.upsert(info, schema).await,
        Err(err) => warn!("failed to introspect backend '{}': {}", info.name, err),
    }
}

async fn rebuild(context: &Context) {
    let snapshot = context.registry.snapshot().await;
    match schema::build(&snapshot) {
        Ok(composed) => {
            info!("schema rebuilt from {} backend(s)", snapshot.len());
            context.schema.swap(composed).await;
        }
        Err(err) => error!("schema rebuild failed, keeping previous schema: {err}"),
    }
}

async fn announce_self(context: &Context) {
    let info = ServiceInfo {
        name: GATEWAY_SERVICE_NAME.to_owned(),
        hostname: context.config.published_hostname.clone(),
        port: context.config.published_port.to_string(),
        graphql_http_endpoint: "/graphql".to_owned(),
        graphql_socket_endpoint: Some("/socket".to_owned()),
        schema_extensions: vec![],
    };

    match serde_json::to_vec(&info) {
        Ok(payload) => {
            if context.pubsub.publish(TOPIC_SERVICE_UP, payload).await.is_err() {
                warn!("failed to publish self-announcement");
            }
        }
        Err(err) => error!("failed to serialize self-announcement: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_info(name: &str) -> ServiceInfo {
        ServiceInfo {
            name: name.to_owned(),
            hostname: "localhost".to_owned(),
            port: "4000".to_owned(),
            graphql_http_endpoint: "/graphql".to_owned(),
            graphql_socket_endpoint: None,
            schema_extensions: vec![],
        }
    }

    #[test]
    fn recognizes_its_own_announcement_by_name() {
        let info = backend_info(GATEWAY_SERVICE_NAME);
        assert!(is_self_announcement(&info));
    }

    #[test]
    fn recognizes_an_announcement_with_no_http_endpoint() {
        let mut info = backend_info("some-backend");
        info.graphql_http_endpoint = String::new();
        assert!(is_self_announcement(&info));
    }

    #[test]
    fn does_not_flag_a_real_backend() {
        let info = backend_info("some-backend");
        assert!(!is_self_announcement(&info));
    }
}
