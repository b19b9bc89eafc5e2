//! Gerrit REST API access: client plumbing and authentication negotiation.

mod auth;
mod client;

pub use auth::{negotiate, AuthScheme};
pub use client::{AccountInfo, ChangeInfo, ChangeSource, Credentials, GerritClient};
