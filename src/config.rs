//! Host-supplied runtime settings.
//!
//! Read once by the binary and passed down; library code never looks at
//! the environment itself.

use std::env;
use std::path::PathBuf;

/// Fallback overlay root when the invocation does not carry one.
pub const ENV_OVERLAY_ROOT: &str = "OVERLAY_INSTALLER_ROOT";
/// `1`/`true` makes a missing kernel-modules or firmware source fatal.
pub const ENV_STRICT: &str = "OVERLAY_INSTALLER_STRICT";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerConfig {
    pub overlay_root: Option<PathBuf>,
    pub strict: bool,
}

impl InstallerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let overlay_root = lookup(ENV_OVERLAY_ROOT)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let strict = lookup(ENV_STRICT)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            overlay_root,
            strict,
        }
    }
}
