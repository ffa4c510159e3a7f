// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;

use axum::http::HeaderMap;
use cookie::Cookie;
use percent_encoding::percent_decode_str;

pub const AUTHENTICATION_HEADER: &str = "Authentication";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
const COOKIE_HEADER: &str = "cookie";

/// Opaque credential lifted off an incoming client request and forwarded to every backend a
/// query touches.
///
/// The gateway never interprets credentials, only relays them. Sent as both `Authentication`
/// and `Authorization` on the way out, since federated backends were written against either one
/// depending on their own auth middleware.
#[derive(Clone, Debug, Default)]
pub struct Credential(pub Option<String>);

impl Credential {
    /// Extracts a credential from an incoming request's headers.
    ///
    /// Reads the first non-empty of: cookie `Authentication`, cookie `Authorization`, header
    /// `Authentication`. The chosen value is URL-percent-decoded once; a decode failure (invalid
    /// escape, or decoded bytes that aren't valid UTF-8) yields the empty string rather than
    /// rejecting the request, since the credential is opaque here and only the backend that owns
    /// it can say whether it was ever valid.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cookies = parse_cookies(headers);

        let candidates = [
            cookies.get(AUTHENTICATION_HEADER).cloned(),
            cookies.get(AUTHORIZATION_HEADER).cloned(),
            headers
                .get(AUTHENTICATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        ];

        let raw = candidates.into_iter().flatten().find(|value| !value.is_empty());
        Self(raw.map(|value| decode(&value)))
    }

    /// Header pairs to attach to an outgoing request to a backend.
    pub fn outgoing_headers(&self) -> Vec<(&'static str, String)> {
        match &self.0 {
            Some(value) => vec![
                (AUTHENTICATION_HEADER, value.clone()),
                (AUTHORIZATION_HEADER, value.clone()),
            ],
            None => vec![],
        }
    }
}

/// Parses every `Cookie` header into a `name -> value` map, last one wins on a repeated name.
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| Cookie::parse(segment).ok())
        .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
        .collect()
}

fn decode(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE_HEADER, cookie.parse().unwrap());
        headers
    }

    #[test]
    fn prefers_authentication_cookie_over_everything_else() {
        let mut headers = headers_with_cookie("Authentication=from-cookie; Authorization=other");
        headers.insert(AUTHENTICATION_HEADER, "from-header".parse().unwrap());

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_authorization_cookie() {
        let headers = headers_with_cookie("Authorization=from-cookie");

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_authentication_header_when_no_cookie_present() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHENTICATION_HEADER, "token".parse().unwrap());

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0.as_deref(), Some("token"));
    }

    #[test]
    fn ignores_authorization_header() {
        // Only `Authorization` as a cookie counts; the header of that name is never read, per
        // the credential extraction priority order.
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION_HEADER, "should-be-ignored".parse().unwrap());

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0, None);
    }

    #[test]
    fn empty_cookie_value_falls_through_to_next_candidate() {
        let mut headers = headers_with_cookie("Authentication=");
        headers.insert(AUTHENTICATION_HEADER, "token".parse().unwrap());

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0.as_deref(), Some("token"));
    }

    #[test]
    fn percent_decodes_the_chosen_value() {
        let headers = headers_with_cookie("Authentication=Bearer%20abc%2Fdef");

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0.as_deref(), Some("Bearer abc/def"));
    }

    #[test]
    fn invalid_percent_decoding_becomes_empty_string() {
        // `%FF` decodes to a byte that is not valid UTF-8 on its own.
        let headers = headers_with_cookie("Authentication=%FF");

        let credential = Credential::from_headers(&headers);
        assert_eq!(credential.0.as_deref(), Some(""));
    }

    #[test]
    fn duplicates_onto_both_outgoing_headers() {
        let credential = Credential(Some("token".into()));
        let headers = credential.outgoing_headers();
        assert_eq!(headers.len(), 2);
        assert!(headers.contains(&(AUTHENTICATION_HEADER, "token".to_owned())));
        assert!(headers.contains(&(AUTHORIZATION_HEADER, "token".to_owned())));
    }

    #[test]
    fn no_credential_means_no_headers() {
        assert!(Credential::default().outgoing_headers().is_empty());
    }
}
