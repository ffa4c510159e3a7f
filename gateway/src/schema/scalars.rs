// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::dynamic::{Scalar, TypeRef};

use super::BuildError;

/// Scalar names resolved to `async_graphql`'s own built-in scalar types.
const BUILTIN_SCALARS: &[&str] = &[
    TypeRef::STRING,
    TypeRef::ID,
    TypeRef::BOOLEAN,
    TypeRef::INT,
    TypeRef::FLOAT,
];

/// Scalars that are real GraphQL scalars upstream but have no dynamic-schema built-in, so they
/// are registered as pass-through custom scalars: no validation, values flow through as JSON.
/// `Date` is kept distinct from `DateTime` to match the original gateway's own separate (and
/// similarly un-validating) `Date` scalar.
const CUSTOM_SCALARS: &[&str] = &["DateTime", "Date"];

/// Resolves an introspected scalar name into an executable type reference, or an error if the
/// name is outside the fixed set this gateway knows how to compose.
pub fn resolve(name: &str) -> Result<TypeRef, BuildError> {
    if BUILTIN_SCALARS.contains(&name) {
        Ok(TypeRef::named(name))
    } else if CUSTOM_SCALARS.contains(&name) {
        Ok(TypeRef::named(name))
    } else {
        Err(BuildError::UnknownScalar(name.to_owned()))
    }
}

/// Returns the set of custom scalar definitions that must be registered on the schema builder
/// before any field referencing them is added.
pub fn custom_scalar_definitions() -> Vec<Scalar> {
    CUSTOM_SCALARS.iter().map(|name| Scalar::new(*name)).collect()
}
