// SPDX-License-Identifier: AGPL-3.0-or-later

use async_graphql::{Error, Result};
use serde_json::Value as JsonValue;

use crate::auth::Credential;

use super::BackendCoords;

/// Posts a forwarded GraphQL document to a backend and returns its `data` object.
///
/// A backend response carrying a top-level `errors` array becomes an [`Error`] here, which
/// `async_graphql` surfaces as a partial-response error on the field the gateway is currently
/// resolving.
pub async fn forward(
    client: &reqwest::Client,
    coords: &BackendCoords,
    document: &str,
    credential: &Credential,
) -> Result<JsonValue> {
    let mut request = client
        .post(coords.url())
        .json(&serde_json::json!({ "query": document }));

    for (name, value) in credential.outgoing_headers() {
        request = request.header(name, value);
    }

    let response = request
        .send()
        .await
        .map_err(|err| Error::new(format!("request to backend failed: {err}")))?;

    let body: JsonValue = response
        .json()
        .await
        .map_err(|err| Error::new(format!("backend response was not valid JSON: {err}")))?;

    if let Some(errors) = body.get("errors") {
        return Err(Error::new(format!("backend returned errors: {errors}")));
    }

    Ok(body.get("data").cloned().unwrap_or(JsonValue::Null))
}
