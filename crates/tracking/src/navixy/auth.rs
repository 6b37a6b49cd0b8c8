//! Credential resolution and auth encoding strategies
//!
//! Exactly one credential is active per process. It is resolved once from
//! [`AuthParams`] with the precedence session token → hash token → fallback key.

use serde_json::{Map, Value};
use std::fmt;

use super::transport::{HttpRequest, Method};
use crate::config::AuthParams;

/// The active credential for the session
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Delegated session token (`session_key` / `sid` parameter)
    SessionToken(String),
    /// Opaque hash token (`hash` parameter)
    HashToken(String),
    /// Compiled-in static key, used when neither token is supplied
    FallbackKey(String),
}

impl Credentials {
    /// Mode name for diagnostics; never includes the secret
    pub fn mode(&self) -> &'static str {
        match self {
            Credentials::SessionToken(_) => "session_key",
            Credentials::HashToken(_) => "hash",
            Credentials::FallbackKey(_) => "api_key_fallback",
        }
    }

    /// Request parameter name and value for the params strategy
    pub(crate) fn param(&self) -> (&'static str, &str) {
        match self {
            Credentials::SessionToken(token) => ("session_key", token),
            Credentials::HashToken(token) => ("hash", token),
            Credentials::FallbackKey(key) => ("hash", key),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials({}, <redacted>)", self.mode())
    }
}

/// Resolve the active credential from raw auth params
///
/// Empty or whitespace-only tokens count as absent. Never fails because the
/// fallback key is always present.
pub fn resolve(params: &AuthParams) -> Credentials {
    let present = |token: &Option<String>| {
        token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };

    if let Some(token) = present(&params.session_token) {
        Credentials::SessionToken(token)
    } else if let Some(token) = present(&params.hash_token) {
        Credentials::HashToken(token)
    } else {
        Credentials::FallbackKey(params.fallback_key.clone())
    }
}

/// How credentials are attached to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStrategy {
    /// Credential merged into the JSON body (POST) or query string (GET)
    Params,
    /// `Authorization: NVX <fallback key>` header, nothing in body or query
    Header,
}

impl AuthStrategy {
    /// Scheme prefix of the Authorization header
    pub const HEADER_SCHEME: &'static str = "NVX";

    /// Build the request for `payload` under this strategy
    ///
    /// The header strategy always uses `fallback_key`, not the resolved
    /// credential: session and hash tokens are not accepted in header mode.
    pub(crate) fn build_request(
        self,
        method: Method,
        url: String,
        payload: &Map<String, Value>,
        credentials: &Credentials,
        fallback_key: &str,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(method, url);

        match self {
            AuthStrategy::Params => {
                let (name, value) = credentials.param();
                match method {
                    Method::Post => {
                        let mut body = Map::new();
                        body.insert(name.to_string(), Value::from(value));
                        body.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
                        request.body = Some(Value::Object(body));
                    }
                    Method::Get => {
                        request.query.push((name.to_string(), value.to_string()));
                        request.query.extend(query_pairs(payload));
                    }
                }
            }
            AuthStrategy::Header => {
                request.headers.push((
                    "Authorization".to_string(),
                    format!("{} {}", Self::HEADER_SCHEME, fallback_key),
                ));
                match method {
                    Method::Post => request.body = Some(Value::Object(payload.clone())),
                    Method::Get => request.query.extend(query_pairs(payload)),
                }
            }
        }

        request
    }
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthStrategy::Params => "params",
            AuthStrategy::Header => "header",
        })
    }
}

/// Flatten a JSON payload into query pairs (strings unquoted)
fn query_pairs(payload: &Map<String, Value>) -> impl Iterator<Item = (String, String)> + '_ {
    payload.iter().map(|(k, v)| {
        let value = match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        (k.clone(), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(session: Option<&str>, hash: Option<&str>) -> AuthParams {
        AuthParams {
            session_token: session.map(str::to_string),
            hash_token: hash.map(str::to_string),
            fallback_key: "fallback".to_string(),
        }
    }

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(
            resolve(&params(Some("s"), Some("h"))),
            Credentials::SessionToken("s".to_string())
        );
        assert_eq!(
            resolve(&params(None, Some("h"))),
            Credentials::HashToken("h".to_string())
        );
        assert_eq!(
            resolve(&params(None, None)),
            Credentials::FallbackKey("fallback".to_string())
        );
        assert_eq!(
            resolve(&params(Some("  "), None)),
            Credentials::FallbackKey("fallback".to_string())
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::SessionToken("super-secret".to_string());
        let debug = format!("{:?}", creds);
        assert!(debug.contains("session_key"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_params_strategy_post_body() {
        let payload = json!({"trackers": [1, 2]}).as_object().cloned().unwrap();
        let request = AuthStrategy::Params.build_request(
            Method::Post,
            "https://x/tracker/get_states".to_string(),
            &payload,
            &Credentials::SessionToken("s1".to_string()),
            "fallback",
        );

        assert_eq!(request.body, Some(json!({"session_key": "s1", "trackers": [1, 2]})));
        assert!(request.headers.is_empty());
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_params_strategy_get_query() {
        let payload = json!({"with_points": false, "limit": 1000}).as_object().cloned().unwrap();
        let request = AuthStrategy::Params.build_request(
            Method::Get,
            "https://x/zone/list".to_string(),
            &payload,
            &Credentials::FallbackKey("fallback".to_string()),
            "fallback",
        );

        assert!(request.body.is_none());
        assert!(request.query.contains(&("hash".to_string(), "fallback".to_string())));
        assert!(request.query.contains(&("limit".to_string(), "1000".to_string())));
        assert!(request.query.contains(&("with_points".to_string(), "false".to_string())));
    }

    #[test]
    fn test_header_strategy_always_uses_fallback_key() {
        let payload = Map::new();
        let request = AuthStrategy::Header.build_request(
            Method::Post,
            "https://x/tracker/list".to_string(),
            &payload,
            &Credentials::SessionToken("s1".to_string()),
            "fallback",
        );

        assert_eq!(
            request.headers,
            vec![("Authorization".to_string(), "NVX fallback".to_string())]
        );
        assert_eq!(request.body, Some(json!({})));
    }
}
