// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::{HashMap, HashSet};

use async_graphql::dynamic::Schema;

/// The gateway's current executable schema, plus the bookkeeping the Selection Rewriter needs
/// that `async_graphql`'s own `Schema` does not expose: each field's declared return type (so
/// nested selections can be serialized without re-deriving the type from the executor), and
/// which `(type, field)` pairs are gateway-side extensions that must never be forwarded upstream.
#[derive(Clone)]
pub struct ComposedSchema {
    pub executable: Schema,

    /// `(type name, field name) -> named return type` for every field of every composed object
    /// type, wrappers (`NON_NULL`/`LIST`) stripped.
    pub field_return_type: HashMap<(String, String), String>,

    /// `(type name, field name)` pairs added by the extension pass. The Selection Rewriter omits
    /// these when building the document forwarded to a field's owning backend.
    pub extension_fields: HashSet<(String, String)>,

    /// Backend name owning each root operation field, used to decide which backend(s) a client
    /// query must be split across.
    pub root_field_owner: HashMap<(String, String), String>,
}

impl ComposedSchema {
    pub fn return_type_of(&self, type_name: &str, field_name: &str) -> Option<&str> {
        self.field_return_type
            .get(&(type_name.to_owned(), field_name.to_owned()))
            .map(String::as_str)
    }

    pub fn is_extension_field(&self, type_name: &str, field_name: &str) -> bool {
        self.extension_fields
            .contains(&(type_name.to_owned(), field_name.to_owned()))
    }
}

impl std::fmt::Debug for ComposedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedSchema")
            .field("fields", &self.field_return_type.len())
            .field("extension_fields", &self.extension_fields.len())
            .finish()
    }
}
