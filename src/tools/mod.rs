//! MCP tool implementations.

mod patch;

pub use patch::{execute_patch, PatchInput, PatchOutput, PATCH_CHAR_LIMIT};
