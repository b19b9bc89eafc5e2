//! gerritka: MCP server for fetching Gerrit change patches.
//!
//! Exposes a single MCP tool, `get_change_patch`, which takes the URL of
//! a Gerrit change and returns the current patchset's diff as text.
//! Authentication against the Gerrit server is negotiated once at
//! startup (digest, then basic, then cookie).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              MCP Server (rmcp)              │
//! │         JSON-RPC over stdin/stdout          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │           get_change_patch tool             │
//! │  resolve URL → change → patch → size limit  │
//! └────────┬───────────────────────┬────────────┘
//!          │                       │
//!    ┌─────▼────────┐     ┌────────▼────────┐
//!    │ URL resolver │     │  GerritClient   │
//!    │ (pure regex) │     │ reqwest + auth  │
//!    └──────────────┘     └────────┬────────┘
//!                                  │
//!                         ┌────────▼────────┐
//!                         │  Gerrit server  │
//!                         │   (REST API)    │
//!                         └─────────────────┘
//! ```

pub mod error;
pub mod fmt;
pub mod gerrit;
pub mod resolve;
pub mod server;
pub mod tools;
pub mod types;

pub use error::{AuthError, GerritError, ResolveError};
pub use types::ChangeRef;
