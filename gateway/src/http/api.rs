// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::Request;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::{self, IntoResponse};

use crate::auth::Credential;

use super::context::HttpServiceContext;

/// Serves the GraphQL Playground IDE at the given path.
pub async fn handle_graphql_playground(path: &str) -> impl IntoResponse {
    response::Html(playground_source(GraphQLPlaygroundConfig::new(path)))
}

/// Executes a GraphQL request against the gateway's currently composed schema.
///
/// The composed schema, a shared HTTP client, and the caller's credential are attached as
/// per-request data so the forwarding/extension resolvers built in `schema::build` can reach
/// them without a global.
pub async fn handle_graphql_query(
    Extension(http_context): Extension<HttpServiceContext>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let composed = http_context.context.schema.current().await;
    let credential = Credential::from_headers(&headers);

    let request: Request = req.into_inner();
    let request = request
        .data((*composed).clone())
        .data(http_context.context.http_client.clone())
        .data(credential);

    composed.executable.execute(request).await.into()
}

/// Serves the current Prometheus metrics snapshot.
pub async fn handle_metrics(Extension(http_context): Extension<HttpServiceContext>) -> String {
    http_context.metrics.render()
}
