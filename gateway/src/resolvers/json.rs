// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::dynamic::FieldValue;
use async_graphql::Value as GqlValue;
use serde_json::Value as JsonValue;

/// Converts a JSON value from a backend's response into a dynamic-schema field value.
///
/// Objects are kept as JSON so nested field resolvers (see [`super::identity`]) can index into
/// them without re-parsing; everything else becomes a GraphQL leaf value directly.
pub fn into_field_value(value: JsonValue) -> FieldValue<'static> {
    match value {
        JsonValue::Array(items) => FieldValue::list(items.into_iter().map(into_field_value)),
        JsonValue::Object(_) => FieldValue::owned_any(value),
        other => FieldValue::value(GqlValue::from_json(other).unwrap_or(GqlValue::Null)),
    }
}
