//! Gerrit REST client.
//!
//! Thin reqwest wrapper speaking the Gerrit conventions the rest of the
//! crate needs: the `/a/` URL prefix for authenticated requests, the
//! `)]}'` XSSI prefix on JSON bodies, and base64-encoded patch payloads.

use crate::error::{GerritError, GerritResult};
use crate::gerrit::auth::{self, AuthScheme};
use crate::types::ChangeRef;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, WWW_AUTHENTICATE};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use url::{Position, Url};

/// Identity-lookup endpoint, used only by authentication probes.
pub(crate) const SELF_ACCOUNT: &str = "accounts/self";

/// Credential pair for an authenticated session.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Subset of Gerrit change metadata the server needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeInfo {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    /// Revision marker of the latest patchset. May be absent.
    #[serde(default)]
    pub current_revision: String,
}

/// Subset of Gerrit account metadata, used for startup logging.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_account_id")]
    pub account_id: u64,
    #[serde(default)]
    pub name: String,
}

/// Narrow capability the tool layer needs from a Gerrit backend.
///
/// Exactly two operations, so orchestration logic can run against an
/// in-memory substitute in tests.
pub trait ChangeSource {
    /// Looks up change metadata including the current revision marker.
    fn change(&self, id: &ChangeRef) -> impl Future<Output = GerritResult<ChangeInfo>> + Send;

    /// Fetches the patch text for one revision of a change. `Ok(None)`
    /// means the call succeeded but carried no payload.
    fn patch(
        &self,
        id: &ChangeRef,
        revision: &str,
    ) -> impl Future<Output = GerritResult<Option<String>>> + Send;
}

/// Authenticated (or anonymous) session against one Gerrit server.
///
/// The active [`AuthScheme`] is set at most once, during startup
/// negotiation; afterwards the client is shared behind an `Arc` and only
/// read. There is no re-negotiation on later 401s.
pub struct GerritClient {
    http: reqwest::Client,
    base: Url,
    credentials: Option<Credentials>,
    scheme: AuthScheme,
}

impl GerritClient {
    /// Creates an unauthenticated client for the given base address.
    ///
    /// The base path is normalized to end with a slash so REST paths join
    /// underneath it instead of replacing its last segment.
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> GerritResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            credentials,
            scheme: AuthScheme::None,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[must_use]
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub(crate) fn set_scheme(&mut self, scheme: AuthScheme) {
        self.scheme = scheme;
    }

    /// True when a non-empty username was supplied. An empty username is
    /// anonymous mode; negotiation is skipped entirely.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(|c| !c.username.is_empty())
    }

    /// Username of the configured credentials, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    fn rest_url(&self, path: &str) -> GerritResult<Url> {
        // Authenticated requests go under the `/a/` prefix.
        if self.scheme.is_authenticated() {
            Ok(self.base.join(&format!("a/{path}"))?)
        } else {
            Ok(self.base.join(path)?)
        }
    }

    /// Issues a GET under the active authentication scheme.
    ///
    /// Non-2xx responses are returned as-is; callers decide what a given
    /// status means.
    pub(crate) async fn get(&self, path: &str) -> GerritResult<Response> {
        let url = self.rest_url(path)?;
        match (self.scheme, self.credentials.as_ref()) {
            (AuthScheme::Digest, Some(creds)) => self.get_with_digest(url, creds).await,
            (AuthScheme::Basic, Some(creds)) => Ok(self
                .http
                .get(url)
                .header(ACCEPT, "application/json")
                .basic_auth(&creds.username, Some(&creds.password))
                .send()
                .await?),
            (AuthScheme::Cookie, Some(creds)) => Ok(self
                .http
                .get(url)
                .header(ACCEPT, "application/json")
                .header(COOKIE, format!("{}={}", creds.username, creds.password))
                .send()
                .await?),
            _ => Ok(self
                .http
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await?),
        }
    }

    /// Digest is challenge-response: an unauthenticated request draws the
    /// 401 challenge, which is answered once with a computed
    /// `Authorization` header.
    async fn get_with_digest(&self, url: Url, creds: &Credentials) -> GerritResult<Response> {
        let first = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if first.status() != StatusCode::UNAUTHORIZED {
            return Ok(first);
        }

        let header = first
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or(GerritError::MissingChallenge)?
            .to_string();
        let challenge = auth::parse_challenge(&header)
            .ok_or(GerritError::NotDigestChallenge { header })?;

        let uri = &url[Position::BeforePath..Position::AfterQuery];
        let authorization = auth::digest_authorization(
            &challenge,
            &creds.username,
            &creds.password,
            "GET",
            uri,
            &auth::cnonce(),
        );
        Ok(self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, authorization)
            .send()
            .await?)
    }

    /// GET a JSON endpoint, stripping the XSSI prefix before parsing.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> GerritResult<T> {
        let resp = self.get(path).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GerritError::Status {
                status,
                path: path.to_string(),
            });
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(strip_xssi_prefix(&body))?)
    }

    /// Fetches the account the active credentials authenticate as.
    pub async fn self_account(&self) -> GerritResult<AccountInfo> {
        self.get_json(SELF_ACCOUNT).await
    }
}

/// Gerrit prepends `)]}'` to JSON bodies to defeat XSSI; its absence is
/// tolerated for servers behind rewriting proxies.
fn strip_xssi_prefix(body: &str) -> &str {
    body.strip_prefix(")]}'").unwrap_or(body).trim_start()
}

impl ChangeSource for GerritClient {
    async fn change(&self, id: &ChangeRef) -> GerritResult<ChangeInfo> {
        let path = format!("changes/{id}?o=CURRENT_REVISION&o=CURRENT_COMMIT");
        let info: ChangeInfo = self.get_json(&path).await?;
        tracing::debug!(change = %id, revision = %info.current_revision, "fetched change metadata");
        Ok(info)
    }

    async fn patch(&self, id: &ChangeRef, revision: &str) -> GerritResult<Option<String>> {
        let path = format!("changes/{id}/revisions/{revision}/patch");
        let resp = self.get(&path).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GerritError::Status { status, path });
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        // The endpoint returns base64, wrapped in newlines.
        let compact: String = body.split_whitespace().collect();
        let bytes = BASE64.decode(compact.as_bytes())?;
        let text = String::from_utf8(bytes).map_err(|_| GerritError::PatchEncoding)?;
        Ok(Some(text))
    }
}
