//! The get_change_patch tool: change URL in, latest patch text out.

use crate::gerrit::ChangeSource;
use crate::resolve;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Patches longer than this many characters are cut off before being
/// returned, to keep results inside LLM context budgets.
pub const PATCH_CHAR_LIMIT: usize = 32_000;

const TRUNCATION_WARNING: &str = "WARNING: This patch has been truncated as it is very big:";

/// Input for the get_change_patch tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatchInput {
    /// URL of the Gerrit change
    pub change_url: String,
}

/// Output for the get_change_patch tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PatchOutput {
    /// Change number the URL resolved to
    pub change: String,
    /// Revision the patch belongs to
    pub revision: String,
    /// Patch text, possibly truncated
    pub patch: String,
    /// Whether the size limit cut the patch off
    pub truncated: bool,
}

/// Executes the get_change_patch tool.
///
/// Resolves the URL to a change number, looks up the change's current
/// revision, fetches that revision's patch, and applies the size limit.
/// The patch endpoint is never called when the change has no current
/// revision.
///
/// # Errors
///
/// Returns an error string naming the stage that failed: URL parsing,
/// change lookup, or patch retrieval.
pub async fn execute_patch<S: ChangeSource>(
    source: &S,
    input: PatchInput,
) -> Result<PatchOutput, String> {
    let change = resolve::resolve(&input.change_url)
        .map_err(|e| format!("failed to parse change URL: {e}"))?;

    let info = source
        .change(&change)
        .await
        .map_err(|e| format!("failed to get change {change}: {e}"))?;
    if info.current_revision.is_empty() {
        return Err("no current revision found for change".to_string());
    }

    let patch = source
        .patch(&change, &info.current_revision)
        .await
        .map_err(|e| format!("failed to get patch for change {change}: {e}"))?
        .ok_or_else(|| "received empty patch content".to_string())?;

    let (patch, truncated) = apply_limit(patch, PATCH_CHAR_LIMIT);
    Ok(PatchOutput {
        change: change.to_string(),
        revision: info.current_revision,
        patch,
        truncated,
    })
}

/// Enforces the output-size policy: over `limit` characters, keep exactly
/// the first `limit` and prepend a warning line. Counts characters rather
/// than bytes so multi-byte characters are never split.
fn apply_limit(patch: String, limit: usize) -> (String, bool) {
    if patch.chars().count() <= limit {
        return (patch, false);
    }
    let head: String = patch.chars().take(limit).collect();
    (format!("{TRUNCATION_WARNING}\n{head}"), true)
}
