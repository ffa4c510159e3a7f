// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::{anyhow, Result};

use crate::registry::{IntrospectionResponse, SchemaDefinition};

/// The standard GraphQL introspection query, trimmed to the fields the Type Builder consumes:
/// `kind`/`name`/`ofType`, object and input fields, and field arguments. Six levels of `ofType`
/// nesting covers any realistic combination of `NON_NULL`/`LIST` wrappers a backend can declare.
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      name
      kind
      fields(includeDeprecated: true) {
        name
        args { name type { ...TypeRef } defaultValue }
        type { ...TypeRef }
      }
      inputFields {
        name
        type { ...TypeRef }
        defaultValue
      }
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
            }
          }
        }
      }
    }
  }
}
"#;

/// Fetches and parses the introspection schema of a backend at the given GraphQL HTTP endpoint.
pub async fn introspect(client: &reqwest::Client, url: &str) -> Result<SchemaDefinition> {
    let response = client
        .post(url)
        .json(&serde_json::json!({ "query": INTROSPECTION_QUERY }))
        .send()
        .await?;

    let body: IntrospectionResponse = response
        .json()
        .await
        .map_err(|err| anyhow!("introspection response from '{url}' was not the expected shape: {err}"))?;

    Ok(body.data.schema)
}
