//! Decoding of install options from the two supported invocation shapes.
//!
//! - Structured: a YAML (or JSON) document on stdin, as sent by the host
//!   image builder to `overlay-installer install`.
//! - Positional: `overlay-installer <overlay-root> <rootfs-root>`.
//!
//! Both produce the same [`InstallOptions`], and both fail before anything
//! touches the filesystem.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::InstallerConfig;
use crate::error::UsageError;

/// Options for one installer invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOptions {
    /// Disk the image is destined for. Informational only.
    #[serde(default)]
    pub install_disk: String,

    /// Root of the target filesystem tree.
    pub mount_prefix: PathBuf,

    /// Overlay root supplied by the host. Empty in the document means unset.
    #[serde(default, deserialize_with = "non_empty_path")]
    pub artifacts_path: Option<PathBuf>,

    /// Opaque host options, carried through unchanged.
    #[serde(default)]
    pub extra_options: BTreeMap<String, serde_yaml_ng::Value>,
}

fn non_empty_path<'de, D>(deserializer: D) -> std::result::Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
}

impl InstallOptions {
    /// Options for a target root with an explicit overlay root.
    pub fn new(mount_prefix: impl Into<PathBuf>, artifacts_path: impl Into<PathBuf>) -> Self {
        Self {
            install_disk: String::new(),
            mount_prefix: mount_prefix.into(),
            artifacts_path: Some(artifacts_path.into()),
            extra_options: BTreeMap::new(),
        }
    }

    /// Decode a structured options document.
    pub fn from_document(input: &str) -> Result<Self> {
        let options: InstallOptions =
            serde_yaml_ng::from_str(input).context("decoding install options")?;
        options.validate()?;
        Ok(options)
    }

    /// Read and decode a structured options document from `reader`.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .context("reading install options from stdin")?;
        Self::from_document(&input)
    }

    /// Decode `<overlay-root> <rootfs-root>`.
    pub fn from_positional(args: &[String]) -> std::result::Result<Self, UsageError> {
        match args {
            [] => Err(UsageError::MissingArgument("overlay-root")),
            [_] => Err(UsageError::MissingArgument("rootfs-root")),
            [overlay_root, rootfs_root] => {
                let options = Self::new(rootfs_root, overlay_root);
                options.validate()?;
                Ok(options)
            }
            [_, _, extra, ..] => Err(UsageError::UnexpectedArgument(extra.clone())),
        }
    }

    fn validate(&self) -> std::result::Result<(), UsageError> {
        if self.mount_prefix.as_os_str().is_empty() {
            return Err(UsageError::EmptyMountPrefix);
        }
        if self
            .artifacts_path
            .as_deref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(UsageError::MissingArgument("overlay-root"));
        }
        Ok(())
    }

    /// Target root the categories are installed into.
    pub fn target_root(&self) -> &Path {
        &self.mount_prefix
    }

    /// Overlay root: `artifactsPath` first, then the host-supplied fallback.
    pub fn overlay_root(&self, config: &InstallerConfig) -> std::result::Result<PathBuf, UsageError> {
        self.artifacts_path
            .clone()
            .or_else(|| config.overlay_root.clone())
            .ok_or(UsageError::NoOverlayRoot)
    }
}
