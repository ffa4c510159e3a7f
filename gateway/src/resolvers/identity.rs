// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::Error;
use serde_json::Value as JsonValue;

use super::json;

/// Resolves a field by indexing into the parent object's already-fetched JSON.
///
/// Every field on a type the gateway does not own a direct backend connection for ends up here:
/// its data arrived as part of forwarding some ancestor root field, so there is nothing left to
/// fetch, only a key to read.
pub fn identity(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let parent = ctx
            .parent_value
            .downcast_ref::<JsonValue>()
            .ok_or_else(|| Error::new("expected a JSON object as the parent value"))?;

        let value = parent
            .get(ctx.field().name())
            .cloned()
            .unwrap_or(JsonValue::Null);

        Ok(Some(json::into_field_value(value)))
    })
}
