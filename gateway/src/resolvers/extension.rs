// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::Error;
use serde_json::Value as JsonValue;

use crate::auth::Credential;
use crate::registry::ExtensionDeclaration;
use crate::rewriter;
use crate::schema::ComposedSchema;

use super::{json, transport, BackendCoords};

/// Resolves a schema-extension field by calling its declared root field on the backend that owns
/// the extended data, passing along whatever parent fields the declaration asks for as arguments.
pub fn resolve<'a>(
    ctx: ResolverContext<'a>,
    coords: BackendCoords,
    decl: ExtensionDeclaration,
) -> FieldFuture<'a> {
    FieldFuture::new(async move {
        let parent = ctx
            .parent_value
            .downcast_ref::<JsonValue>()
            .ok_or_else(|| Error::new("expected a JSON object as the parent value"))?;

        let composed = ctx.data::<ComposedSchema>()?;
        let client = ctx.data::<reqwest::Client>()?;
        let credential = ctx.data::<Credential>().map(|c| c.clone()).unwrap_or_default();

        let args = decl
            .field_arguments
            .iter()
            .map(|(arg_name, parent_field)| {
                let value = parent.get(parent_field).cloned().unwrap_or(JsonValue::Null);
                format!("{arg_name}: {}", literal(&value))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let args = if args.is_empty() { String::new() } else { format!("({args})") };

        let selection = rewriter::render_selection_set(
            ctx.field(),
            composed,
            &decl.target_backend_type_name,
        );
        let document = format!("query {{ {}{args}{selection} }}", decl.resolve_by_root_field);

        let data = transport::forward(client, &coords, &document, &credential).await?;
        let value = data
            .get(&decl.resolve_by_root_field)
            .cloned()
            .unwrap_or(JsonValue::Null);

        Ok(Some(json::into_field_value(value)))
    })
}

fn literal(value: &JsonValue) -> String {
    async_graphql::Value::from_json(value.clone())
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "null".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_renders_strings_quoted() {
        assert_eq!(literal(&JsonValue::String("a".into())), "\"a\"");
    }

    #[test]
    fn literal_renders_numbers_bare() {
        assert_eq!(literal(&JsonValue::from(42)), "42");
    }
}
