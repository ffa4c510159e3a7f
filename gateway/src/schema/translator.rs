// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashSet;

use async_graphql::dynamic::TypeRef as GqlTypeRef;

use crate::registry::{TypeKind, TypeRef as IntrospectedTypeRef};

use super::scalars;
use super::BuildError;

/// Translates an introspected `{kind, name, ofType}` type reference tree into an executable
/// `async_graphql` type reference.
///
/// `known_objects`/`known_inputs` are the names already produced by the object-shell and
/// input-object passes; a reference to a name missing from the relevant set is a build error.
pub fn translate(
    type_ref: &IntrospectedTypeRef,
    known_objects: &HashSet<String>,
    known_inputs: &HashSet<String>,
) -> Result<GqlTypeRef, BuildError> {
    enum Wrapper {
        NonNull,
        List,
    }

    // `async_graphql::dynamic::TypeRef` only exposes fixed-shape constructors (`named`,
    // `named_nn`, `named_list`, `named_nn_list`, `named_list_nn`, `named_nn_list_nn`) rather than
    // letting a caller wrap an arbitrary `TypeRef`, so the NON_NULL/LIST wrappers are peeled off
    // outside-in here and matched against those shapes once the named type underneath is known.
    let mut wrappers = Vec::new();
    let mut current = type_ref;
    loop {
        match current.kind {
            TypeKind::NonNull => {
                wrappers.push(Wrapper::NonNull);
                current = current
                    .of_type
                    .as_deref()
                    .expect("NON_NULL type reference always wraps an inner type");
            }
            TypeKind::List => {
                wrappers.push(Wrapper::List);
                current = current
                    .of_type
                    .as_deref()
                    .expect("LIST type reference always wraps an inner type");
            }
            _ => break,
        }
    }

    let name = match current.kind {
        TypeKind::Scalar => {
            let name = current
                .name
                .as_deref()
                .expect("SCALAR type reference always carries a name");
            scalars::resolve(name)?.to_string()
        }
        TypeKind::Object => {
            let name = current
                .name
                .clone()
                .expect("OBJECT type reference always carries a name");
            if known_objects.contains(&name) {
                name
            } else {
                return Err(BuildError::MissingObject(name));
            }
        }
        TypeKind::InputObject => {
            let name = current
                .name
                .clone()
                .expect("INPUT_OBJECT type reference always carries a name");
            if known_inputs.contains(&name) {
                name
            } else {
                return Err(BuildError::MissingInputObject(name));
            }
        }
        TypeKind::Interface | TypeKind::Union | TypeKind::Enum => {
            return Err(BuildError::UnsupportedTypeKind(
                current.name.clone().unwrap_or_default(),
                current.kind,
            ));
        }
        TypeKind::NonNull | TypeKind::List => unreachable!("wrapper kinds are peeled off above"),
    };

    match wrappers.as_slice() {
        [] => Ok(GqlTypeRef::named(name)),
        [Wrapper::NonNull] => Ok(GqlTypeRef::named_nn(name)),
        [Wrapper::List] => Ok(GqlTypeRef::named_list(name)),
        [Wrapper::List, Wrapper::NonNull] => Ok(GqlTypeRef::named_nn_list(name)),
        [Wrapper::NonNull, Wrapper::List] => Ok(GqlTypeRef::named_list_nn(name)),
        [Wrapper::NonNull, Wrapper::List, Wrapper::NonNull] => Ok(GqlTypeRef::named_nn_list_nn(name)),
        _ => Err(BuildError::UnsupportedTypeKind(name, type_ref.kind)),
    }
}

/// Strips `NON_NULL`/`LIST` wrappers and returns the named type at the core of a reference.
pub fn base_type_name(type_ref: &IntrospectedTypeRef) -> Option<&str> {
    match type_ref.kind {
        TypeKind::NonNull | TypeKind::List => {
            type_ref.of_type.as_deref().and_then(base_type_name)
        }
        _ => type_ref.name.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRef as IntrospectedTypeRef;

    fn scalar(name: &str) -> IntrospectedTypeRef {
        IntrospectedTypeRef {
            kind: TypeKind::Scalar,
            name: Some(name.to_owned()),
            of_type: None,
        }
    }

    fn non_null(inner: IntrospectedTypeRef) -> IntrospectedTypeRef {
        IntrospectedTypeRef {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    fn list(inner: IntrospectedTypeRef) -> IntrospectedTypeRef {
        IntrospectedTypeRef {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    #[test]
    fn translates_nested_non_null_list() {
        let known_objects = HashSet::new();
        let known_inputs = HashSet::new();
        let type_ref = non_null(list(non_null(scalar("String"))));

        let result = translate(&type_ref, &known_objects, &known_inputs).unwrap();
        assert_eq!(result.to_string(), "[String!]!");
    }

    #[test]
    fn base_type_name_strips_wrappers() {
        let type_ref = non_null(list(scalar("Int")));
        assert_eq!(base_type_name(&type_ref), Some("Int"));
    }

    #[test]
    fn missing_object_is_an_error() {
        let known_objects = HashSet::new();
        let known_inputs = HashSet::new();
        let type_ref = IntrospectedTypeRef {
            kind: TypeKind::Object,
            name: Some("User".into()),
            of_type: None,
        };

        assert!(translate(&type_ref, &known_objects, &known_inputs).is_err());
    }
}
