//! Error types shared by the installer and its front ends.

use thiserror::Error;

use crate::layout::Category;

/// A stage failed; names the category it failed in.
#[derive(Debug, Error)]
#[error("failed to install {category}")]
pub struct StageError {
    pub category: Category,
    #[source]
    pub source: anyhow::Error,
}

impl StageError {
    pub fn new(category: Category, source: anyhow::Error) -> Self {
        Self { category, source }
    }
}

/// The invocation itself was unusable. Always raised before any write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing required argument <{0}>")]
    MissingArgument(&'static str),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("mountPrefix must not be empty")]
    EmptyMountPrefix,

    #[error("overlay root not supplied: set artifactsPath or OVERLAY_INSTALLER_ROOT")]
    NoOverlayRoot,
}
