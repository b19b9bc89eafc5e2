//! Common test utilities for gerritka integration tests.
//!
//! Provides `GerritHarness`, a wiremock-backed fake Gerrit server with
//! helpers for the REST shapes the client speaks: the `)]}'` XSSI prefix
//! on JSON bodies, base64 patch payloads, and per-scheme authentication
//! responses.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use gerritka::gerrit::{Credentials, GerritClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// A fake Gerrit server.
pub struct GerritHarness {
    pub server: MockServer,
}

/// Matches requests whose `Authorization` header starts with the given
/// scheme name (e.g. "Basic", "Digest").
pub struct AuthorizationScheme(pub &'static str);

impl wiremock::Match for AuthorizationScheme {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(self.0))
    }
}

/// Matches requests that carry no `Authorization` header at all.
pub struct NoAuthorization;

impl wiremock::Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

impl GerritHarness {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub fn anonymous_client(&self) -> GerritClient {
        GerritClient::new(&self.server.uri(), None).expect("valid base URL")
    }

    pub fn client_with_credentials(&self, username: &str, password: &str) -> GerritClient {
        GerritClient::new(
            &self.server.uri(),
            Some(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
        )
        .expect("valid base URL")
    }

    /// Mounts a change-metadata endpoint returning the given JSON value
    /// behind Gerrit's XSSI prefix.
    pub async fn mock_change(&self, change: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/changes/{change}")))
            .respond_with(xssi_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Same as [`mock_change`], under the authenticated `/a/` prefix.
    pub async fn mock_change_authed(&self, change: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/a/changes/{change}")))
            .respond_with(xssi_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Mounts a patch endpoint returning `diff` base64-encoded with line
    /// wrapping, the way Gerrit serves it.
    pub async fn mock_patch(&self, change: &str, revision: &str, diff: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/changes/{change}/revisions/{revision}/patch")))
            .respond_with(ResponseTemplate::new(200).set_body_string(encode_patch(diff)))
            .mount(&self.server)
            .await;
    }
}

/// JSON response with the `)]}'` prefix Gerrit puts on all JSON bodies.
pub fn xssi_json(body: &serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(")]}}'\n{body}"))
}

/// Base64-encodes a diff and wraps it at 76 columns like the live server.
pub fn encode_patch(diff: &str) -> String {
    let encoded = BASE64.encode(diff.as_bytes());
    encoded
        .as_bytes()
        .chunks(76)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Minimal account JSON for `accounts/self` responses.
pub fn account_json() -> serde_json::Value {
    serde_json::json!({
        "_account_id": 1000096,
        "name": "Jane Roe",
        "email": "jane.roe@example.com"
    })
}
