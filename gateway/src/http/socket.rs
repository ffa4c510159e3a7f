// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::{Request, Response, Variables};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::auth::Credential;

use super::context::HttpServiceContext;

/// The envelope every client message arrives in: `{id, type, payload?}`. `type` is matched
/// against the known message kinds below before `payload` is deserialized into the kind-specific
/// payload type, so a message with an unrecognized `type` and a message with a malformed
/// `payload` for a recognized `type` can be told apart and handled differently (see
/// `handle_socket`).
#[derive(Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "empty_payload")]
    payload: JsonValue,
}

fn empty_payload() -> JsonValue {
    JsonValue::Object(Map::new())
}

#[derive(Deserialize, Default)]
struct ConnectionInitPayload {
    #[serde(rename = "Authentication", default)]
    authentication: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartPayload {
    query: String,
    #[serde(default)]
    variables: JsonValue,
    #[serde(default)]
    operation_name: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    ConnectionAck { id: &'a str, payload: &'a str },
    Data { id: &'a str, payload: Response },
    Complete { id: &'a str },
}

/// Upgrades a client connection to the gateway's websocket sub-protocol.
///
/// Unlike `async-graphql-axum`'s bundled websocket transport (built around `async_graphql`'s own
/// `Schema<Query, Mutation, Subscription>` type), the gateway's schema is a dynamically built
/// `async_graphql::dynamic::Schema` behind a [`crate::schema_slot::SchemaSlot`] that can be
/// swapped mid-flight, so the upgrade and framing are handled by hand.
pub async fn handle_socket_upgrade(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Extension(http_context): Extension<HttpServiceContext>,
) -> impl IntoResponse {
    let credential = Credential::from_headers(&headers);
    ws.protocols(["graphql-ws"])
        .on_upgrade(move |socket| handle_socket(socket, http_context, credential))
}

async fn handle_socket(mut socket: WebSocket, http_context: HttpServiceContext, mut credential: Credential) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };

        let envelope = match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("closing socket after malformed message: {err}");
                break;
            }
        };

        match envelope.kind.as_str() {
            "connection_init" => match serde_json::from_value::<ConnectionInitPayload>(envelope.payload) {
                Ok(payload) => {
                    if let Some(value) = payload.authentication {
                        credential = Credential(Some(value));
                    }
                    let ack = ServerMessage::ConnectionAck { id: &envelope.id, payload: "ACK" };
                    if send(&mut socket, &ack).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!("ignoring malformed connection_init payload: {err}"),
            },
            "start" => match serde_json::from_value::<StartPayload>(envelope.payload) {
                Ok(payload) => {
                    let response = execute(&http_context, &credential, payload).await;
                    let data = ServerMessage::Data { id: &envelope.id, payload: response };
                    if send(&mut socket, &data).await.is_err() {
                        break;
                    }
                    if send(&mut socket, &ServerMessage::Complete { id: &envelope.id }).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!("ignoring malformed start payload: {err}"),
            },
            "stop" => {
                // A single `start` is answered with `data` then `complete` immediately, so there
                // is no in-flight subscription for a `stop` to cancel.
            }
            "connection_terminate" => break,
            other => {
                warn!("closing socket after unrecognized message type '{other}'");
                break;
            }
        }
    }

    debug!("socket connection closed");
}

async fn execute(http_context: &HttpServiceContext, credential: &Credential, payload: StartPayload) -> Response {
    let composed = http_context.context.schema.current().await;

    let mut request = Request::new(payload.query)
        .variables(Variables::from_json(payload.variables))
        .data((*composed).clone())
        .data(http_context.context.http_client.clone())
        .data(credential.clone());

    if let Some(name) = payload.operation_name {
        request = request.operation_name(name);
    }

    composed.executable.execute(request).await
}

async fn send(socket: &mut WebSocket, message: &ServerMessage<'_>) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).unwrap_or_default();
    socket.send(Message::Text(text)).await
}
