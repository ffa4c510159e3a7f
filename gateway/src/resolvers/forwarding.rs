// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::dynamic::{FieldFuture, ResolverContext, SubscriptionFieldFuture};
use futures_util::stream;

use crate::auth::Credential;
use crate::rewriter;
use crate::schema::ComposedSchema;

use super::{json, transport, BackendCoords};

/// Forwards a single root `Query` field to its owning backend.
pub fn query(ctx: ResolverContext<'_>, coords: BackendCoords) -> FieldFuture<'_> {
    forward_root(ctx, coords, "Query", "query")
}

/// Forwards a single root `Mutation` field to its owning backend.
pub fn mutation(ctx: ResolverContext<'_>, coords: BackendCoords) -> FieldFuture<'_> {
    forward_root(ctx, coords, "Mutation", "mutation")
}

/// Forwards a single root `Subscription` field to its owning backend.
///
/// Per the Non-goals (no subscription multiplexing to upstreams), a `start` message over the
/// client socket is a single request/response exchange rather than a live upstream subscription,
/// so this resolves exactly like [`query`] -- same `query` operation keyword, same one round
/// trip -- and wraps the single resolved value in a one-item stream to satisfy
/// `SubscriptionField`'s API.
pub fn subscription(ctx: ResolverContext<'_>, coords: BackendCoords) -> SubscriptionFieldFuture<'_> {
    SubscriptionFieldFuture::new(async move {
        let value = resolve_root(&ctx, &coords, "Subscription", "query").await?;
        Ok(stream::once(async move { Ok(value) }))
    })
}

fn forward_root<'a>(
    ctx: ResolverContext<'a>,
    coords: BackendCoords,
    root_type: &'static str,
    operation_keyword: &'static str,
) -> FieldFuture<'a> {
    FieldFuture::new(async move {
        let value = resolve_root(&ctx, &coords, root_type, operation_keyword).await?;
        Ok(Some(value))
    })
}

/// Builds and forwards the document for the field `ctx` is currently resolving, keyed under
/// `root_type` (the key the Type Builder recorded this field's return type and extension-field
/// bookkeeping under -- `"Subscription"` for a subscription field, never `"Query"`), and returns
/// the resolved value at that field.
async fn resolve_root<'a>(
    ctx: &ResolverContext<'a>,
    coords: &BackendCoords,
    root_type: &str,
    operation_keyword: &str,
) -> async_graphql::Result<async_graphql::dynamic::FieldValue<'static>> {
    let composed = ctx.data::<ComposedSchema>()?;
    let client = ctx.data::<reqwest::Client>()?;
    let credential = ctx.data::<Credential>().map(|c| c.clone()).unwrap_or_default();

    let field = ctx.field();
    let document = rewriter::document_for(field, composed, root_type, operation_keyword);

    let data = transport::forward(client, coords, &document, &credential).await?;
    let value = data
        .get(field.name())
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    Ok(json::into_field_value(value))
}
