//! Type-safe newtypes for gerritka.

use serde::Serialize;
use std::fmt;

/// Canonical identifier for a change on the Gerrit server.
///
/// Only the URL resolver constructs these (the constructor is
/// crate-private), so anything holding a `ChangeRef` went through
/// resolution. The wrapped string is the numeric change number as it
/// appears in REST paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChangeRef(String);

impl ChangeRef {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<ChangeRef>();
};
