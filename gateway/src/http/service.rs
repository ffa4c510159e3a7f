// SPDX-License-Identifier: AGPL-3.0-or-later

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Result;
use axum::extract::Extension;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use http::header::CONTENT_TYPE;
use log::debug;
use tower_http::cors::{Any, CorsLayer};

use crate::bus::ServiceSender;
use crate::context::Context;
use crate::manager::Shutdown;

use super::api::{handle_graphql_playground, handle_graphql_query, handle_metrics};
use super::context::HttpServiceContext;
use super::socket::handle_socket_upgrade;

const GRAPHQL_ROUTE: &str = "/graphql";
const SOCKET_ROUTE: &str = "/socket";
const METRICS_ROUTE: &str = "/metrics";

/// Build the HTTP server: GraphQL query/mutation route, websocket route, Prometheus metrics.
pub fn build_server(http_context: HttpServiceContext) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(false)
        .allow_origin(Any);

    Router::new()
        .route(
            GRAPHQL_ROUTE,
            get(|| handle_graphql_playground(GRAPHQL_ROUTE)).post(handle_graphql_query),
        )
        .route(SOCKET_ROUTE, get(handle_socket_upgrade))
        .route(METRICS_ROUTE, get(handle_metrics))
        .layer(cors)
        .layer(Extension(http_context))
}

/// Start the HTTP service.
pub async fn http_service(context: Context, signal: Shutdown, tx: ServiceSender) -> Result<()> {
    let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), context.config.port);

    let metrics = crate::metrics::install()?;
    let http_context = HttpServiceContext::new(context, tx, metrics);

    axum::Server::try_bind(&address)?
        .serve(build_server(http_context).into_make_service())
        .with_graceful_shutdown(async {
            debug!("HTTP service is ready");
            signal.await.ok();
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyper::{Body, Request};
    use serde_json::{json, Value};
    use serial_test::serial;
    use tower::ServiceExt;

    use crate::bus::ServiceMessage;
    use crate::context::Context;
    use crate::pubsub::LocalBus;

    use super::*;

    async fn test_server() -> Router {
        let context = Context::new(Default::default(), Arc::new(LocalBus::new()));
        let (tx, _) = tokio::sync::broadcast::channel::<ServiceMessage>(16);
        let metrics = crate::metrics::install().unwrap();
        let http_context = HttpServiceContext::new(context, tx, metrics);
        build_server(http_context)
    }

    // The Prometheus recorder is a process-global static (see `crate::metrics`), so these two
    // tests have to run in serial rather than relying solely on `install`'s idempotency.
    #[tokio::test]
    #[serial]
    async fn graphql_endpoint_answers_introspection() {
        let app = test_server().await;

        let request = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "query": "{ __typename }" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["data"]["__typename"], "Query");
    }

    #[tokio::test]
    #[serial]
    async fn metrics_endpoint_responds() {
        let app = test_server().await;

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
