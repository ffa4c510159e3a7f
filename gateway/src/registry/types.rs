// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Announcement a backend publishes on `service.up`, and the gateway publishes about itself.
///
/// Mirrors `eventbus.ServiceInfo` from the system this gateway federates for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub hostname: String,
    pub port: String,
    #[serde(rename = "graphQLHttpEndpoint")]
    pub graphql_http_endpoint: String,
    #[serde(rename = "graphQLSocketEndpoint", skip_serializing_if = "Option::is_none")]
    pub graphql_socket_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_extensions: Vec<ExtensionDeclaration>,
}

/// Payload published on `service.down` to retract a previously announced backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceDown {
    pub name: String,
}

/// A declaration that a backend wants to add a field onto a type owned by another backend.
///
/// See the Data Model section on schema extension declarations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExtensionDeclaration {
    pub extended_type_name: String,
    pub field_name: String,
    pub target_backend_type_name: String,
    pub resolve_by_root_field: String,
    /// Maps an upstream argument name to the name of the field read off the parent object.
    #[serde(default)]
    pub field_arguments: HashMap<String, String>,
}

/// A type reference as returned by introspection: `{kind, name, ofType}`, recursively nested for
/// `NON_NULL`/`LIST` wrappers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TypeRef {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub of_type: Option<Box<TypeRef>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    InputObject,
    Interface,
    Union,
    Enum,
    List,
    NonNull,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldArg {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub default_value: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TypeField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub args: Vec<FieldArg>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Vec<TypeField>,
    #[serde(default)]
    pub input_fields: Vec<TypeField>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RootTypeRef {
    pub name: String,
}

/// The `data.__schema` object of a standard introspection response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SchemaDefinition {
    pub query_type: RootTypeRef,
    #[serde(default)]
    pub mutation_type: Option<RootTypeRef>,
    #[serde(default)]
    pub subscription_type: Option<RootTypeRef>,
    pub types: Vec<TypeDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntrospectionResponseData {
    #[serde(rename = "__schema")]
    pub schema: SchemaDefinition,
}

/// The full response body of an introspection query against a backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntrospectionResponse {
    pub data: IntrospectionResponseData,
}

/// A backend as held by the registry: its announced coordinates plus its latest introspection.
#[derive(Clone, Debug)]
pub struct Backend {
    pub info: ServiceInfo,
    pub introspection: SchemaDefinition,
}
