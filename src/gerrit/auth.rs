//! Authentication scheme negotiation.
//!
//! Gerrit servers accept one of three credential presentations: HTTP
//! digest, HTTP basic, or a `<username>=<password>` cookie. Which one a
//! server wants is not discoverable up front, so negotiation probes the
//! identity endpoint under each scheme in a fixed order (digest first,
//! the conventional Gerrit default) and keeps the first that answers 200.
//!
//! A 401 means "try the next scheme". A transport failure means the
//! server is unreachable and aborts negotiation immediately. If every
//! scheme is rejected, the client is reset to anonymous so it is left in
//! a known state rather than whatever the last probe set.

use crate::error::{AuthError, GerritError};
use crate::gerrit::client::{GerritClient, SELF_ACCOUNT};
use reqwest::StatusCode;
use std::fmt;

/// Active credential presentation for a [`GerritClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// Anonymous: no credentials attached, no `/a/` URL prefix.
    #[default]
    None,
    /// RFC 2617 digest challenge-response.
    Digest,
    /// HTTP basic authentication.
    Basic,
    /// Credentials sent as a `<username>=<password>` cookie.
    Cookie,
}

impl AuthScheme {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Digest => write!(f, "digest"),
            Self::Basic => write!(f, "basic"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}

/// Outcome of a single identity-endpoint probe.
enum Probe {
    Accepted,
    Rejected,
}

/// Probes `accounts/self` under the client's current scheme.
///
/// Any response at all classifies as accepted (200) or rejected
/// (everything else, including a 401 that lacks a usable digest
/// challenge). Only the absence of a response is an error.
async fn probe(client: &GerritClient) -> Result<Probe, AuthError> {
    match client.get(SELF_ACCOUNT).await {
        Ok(resp) if resp.status() == StatusCode::OK => Ok(Probe::Accepted),
        Ok(_) => Ok(Probe::Rejected),
        Err(GerritError::MissingChallenge) | Err(GerritError::NotDigestChallenge { .. }) => {
            Ok(Probe::Rejected)
        }
        Err(GerritError::Transport(e)) => Err(AuthError::Unreachable(e)),
        Err(e) => Err(AuthError::Probe(e)),
    }
}

/// Negotiates the authentication scheme for `client`.
///
/// Mutates the client's active scheme as it probes; on success the
/// accepted scheme stays set, on total rejection the scheme is reset to
/// [`AuthScheme::None`] before the error is returned.
///
/// # Errors
///
/// [`AuthError::Unreachable`] if a probe gets no response at all,
/// [`AuthError::AllSchemesRejected`] if every scheme is refused.
pub async fn negotiate(client: &mut GerritClient) -> Result<AuthScheme, AuthError> {
    for scheme in [AuthScheme::Digest, AuthScheme::Basic, AuthScheme::Cookie] {
        client.set_scheme(scheme);
        match probe(client).await? {
            Probe::Accepted => {
                tracing::info!(%scheme, "authentication scheme accepted");
                return Ok(scheme);
            }
            Probe::Rejected => {
                tracing::debug!(%scheme, "authentication scheme rejected");
            }
        }
    }

    client.set_scheme(AuthScheme::None);
    Err(AuthError::AllSchemesRejected)
}

// ============================================================================
// Digest challenge handling
// ============================================================================

/// Parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone)]
pub(crate) struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
}

/// Nonce count: the client never reuses a server nonce across requests,
/// so this stays at the first value.
const NONCE_COUNT: &str = "00000001";

/// Parses a digest challenge header. Returns `None` when the header is
/// not a digest challenge or lacks the mandatory realm/nonce fields.
pub(crate) fn parse_challenge(header: &str) -> Option<DigestChallenge> {
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("digest") {
        return None;
    }

    let mut realm = None;
    let mut nonce = None;
    let mut qop = None;
    let mut opaque = None;
    for (key, value) in split_params(rest) {
        match key.as_str() {
            "realm" => realm = Some(value),
            "nonce" => nonce = Some(value),
            // qop is a list; the plain "auth" variant is the one we speak
            "qop" => {
                qop = value
                    .split(',')
                    .map(str::trim)
                    .find(|q| *q == "auth")
                    .map(String::from);
            }
            "opaque" => opaque = Some(value),
            _ => {}
        }
    }

    Some(DigestChallenge {
        realm: realm?,
        nonce: nonce?,
        qop,
        opaque,
    })
}

/// Splits `key=value, key="quoted, value"` parameter lists, honoring
/// quotes around values.
fn split_params(s: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut rest = s;
    loop {
        rest = rest.trim_start_matches([',', ' ']);
        if rest.is_empty() {
            break;
        }
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim().to_ascii_lowercase();
        rest = &rest[eq + 1..];
        let value = if let Some(quoted) = rest.strip_prefix('"') {
            let Some(end) = quoted.find('"') else { break };
            rest = &quoted[end + 1..];
            quoted[..end].to_string()
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            let v = rest[..end].trim().to_string();
            rest = &rest[end..];
            v
        };
        params.push((key, value));
    }
    params
}

/// Computes the `Authorization` header answering a digest challenge
/// (RFC 2617, MD5, with and without `qop=auth`).
pub(crate) fn digest_authorization(
    challenge: &DigestChallenge,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> String {
    let ha1 = md5_hex(&format!("{username}:{}:{password}", challenge.realm));
    let ha2 = md5_hex(&format!("{method}:{uri}"));

    let (response, qop_fields) = match challenge.qop.as_deref() {
        Some(qop) => {
            let response = md5_hex(&format!(
                "{ha1}:{}:{NONCE_COUNT}:{cnonce}:{qop}:{ha2}",
                challenge.nonce
            ));
            (
                response,
                format!(", qop={qop}, nc={NONCE_COUNT}, cnonce=\"{cnonce}\""),
            )
        }
        None => (
            md5_hex(&format!("{ha1}:{}:{ha2}", challenge.nonce)),
            String::new(),
        ),
    };

    let mut header = format!(
        "Digest username=\"{username}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", response=\"{response}\"{qop_fields}",
        challenge.realm, challenge.nonce
    );
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(", opaque=\"{opaque}\""));
    }
    header
}

/// Client nonce for digest responses. Uniqueness matters, secrecy does
/// not: derived from the clock and process id.
pub(crate) fn cnonce() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    md5_hex(&format!("{}:{}", now.as_nanos(), std::process::id()))
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC2617_CHALLENGE: &str = r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

    #[test]
    fn test_parse_challenge_rfc2617_example() {
        let ch = parse_challenge(RFC2617_CHALLENGE).expect("should parse");
        assert_eq!(ch.realm, "testrealm@host.com");
        assert_eq!(ch.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(ch.qop.as_deref(), Some("auth"));
        assert_eq!(ch.opaque.as_deref(), Some("5ccc069c403ebaf9f0171e9517f40e41"));
    }

    #[test]
    fn test_parse_challenge_unquoted_values() {
        let ch = parse_challenge(r#"Digest realm="r", nonce=abc123, algorithm=MD5"#)
            .expect("should parse");
        assert_eq!(ch.nonce, "abc123");
        assert!(ch.qop.is_none());
    }

    #[test]
    fn test_parse_challenge_rejects_basic() {
        assert!(parse_challenge(r#"Basic realm="r""#).is_none());
    }

    #[test]
    fn test_parse_challenge_requires_realm_and_nonce() {
        assert!(parse_challenge(r#"Digest realm="r""#).is_none());
        assert!(parse_challenge(r#"Digest nonce="n""#).is_none());
    }

    #[test]
    fn test_digest_response_rfc2617_worked_example() {
        let ch = parse_challenge(RFC2617_CHALLENGE).unwrap();
        let header = digest_authorization(
            &ch,
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            "0a4f113b",
        );
        assert!(header.contains(r#"response="6629fae49393a05397450978507c4ef1""#), "{header}");
        assert!(header.contains(r#"username="Mufasa""#));
        assert!(header.contains("qop=auth"));
        assert!(header.contains("nc=00000001"));
        assert!(header.contains(r#"opaque="5ccc069c403ebaf9f0171e9517f40e41""#));
    }

    #[test]
    fn test_digest_response_without_qop() {
        let ch = parse_challenge(r#"Digest realm="r", nonce="n""#).unwrap();
        let header = digest_authorization(&ch, "u", "p", "GET", "/x", "cn");
        assert!(!header.contains("qop="));
        assert!(!header.contains("cnonce="));
    }

    #[test]
    fn test_scheme_display() {
        assert_eq!(AuthScheme::Digest.to_string(), "digest");
        assert_eq!(AuthScheme::None.to_string(), "none");
        assert!(AuthScheme::Cookie.is_authenticated());
        assert!(!AuthScheme::None.is_authenticated());
    }
}
