// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::SelectionField;
use async_graphql::Value as GqlValue;

use crate::schema::ComposedSchema;

/// Renders the GraphQL document forwarded to a backend for one root field selection.
///
/// By the time a resolver runs, `async_graphql`'s executor has already resolved variables to
/// literal values and flattened fragment spreads into the `SelectionField` tree, so rendering
/// straight off it (rather than re-deriving either from raw source text, as the system this
/// gateway federates for does) already satisfies the "no unreferenced variable or fragment
/// reaches a backend" property.
pub fn document_for(
    field: SelectionField<'_>,
    composed: &ComposedSchema,
    root_type: &str,
    operation_keyword: &str,
) -> String {
    let body = render_field(field, composed, root_type);
    format!("{operation_keyword} {{ {body} }}")
}

/// Renders one field and its sub-selection. Extension fields are dropped: they are synthesized
/// by the gateway and do not exist on the backend a document is being forwarded to.
pub fn render_field(field: SelectionField<'_>, composed: &ComposedSchema, type_name: &str) -> String {
    let name = field.name();
    let args = render_arguments(field);
    let return_type = composed.return_type_of(type_name, name).unwrap_or_default();
    let selection = render_selection_set(field, composed, return_type);

    format!("{name}{args}{selection}")
}

/// Renders a field's `{ ... }` sub-selection, or an empty string for a leaf field.
pub fn render_selection_set(
    field: SelectionField<'_>,
    composed: &ComposedSchema,
    type_name: &str,
) -> String {
    let children: Vec<_> = field
        .selection_set()
        .filter(|child| !composed.is_extension_field(type_name, child.name()))
        .collect();

    if children.is_empty() {
        return String::new();
    }

    let inner = children
        .into_iter()
        .map(|child| render_field(child, composed, type_name))
        .collect::<Vec<_>>()
        .join(" ");

    format!(" {{ {inner} }}")
}

fn render_arguments(field: SelectionField<'_>) -> String {
    let args = field.arguments().unwrap_or_default();
    if args.is_empty() {
        return String::new();
    }

    let rendered = args
        .into_iter()
        .map(|(name, value)| format!("{name}: {}", render_literal(&value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("({rendered})")
}

/// Renders a resolved argument value as a GraphQL literal.
pub(crate) fn render_literal(value: &GqlValue) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scalar_literal() {
        assert_eq!(render_literal(&GqlValue::String("a".into())), "\"a\"");
        assert_eq!(render_literal(&GqlValue::Boolean(true)), "true");
    }

    // `SelectionField` can only be constructed by the executor mid-query, so `document_for` and
    // `render_field` are exercised through the forwarding resolver's integration tests instead
    // of unit tests here.
}
