//! Overlay directory layout and per-category source resolution.
//!
//! Staged overlays come in two shapes:
//!
//! ```text
//! current:                       legacy:
//! <root>/artifacts/install/      <root>/install/
//!            kernel-modules/                kernel-modules/
//!            firmware/                      firmware/
//! <root>/artifacts/files/        <root>/files/
//! ```
//!
//! The current shape is always tried first. A category missing from both
//! is reported as absent, not as an error.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One class of overlay content, in installation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Out-of-tree kernel modules, installed under `lib/modules`.
    KernelModules,
    /// Firmware blobs, installed under `lib/firmware`.
    Firmware,
    /// Arbitrary files overlaid onto the target root.
    ConfigFiles,
    /// Kernel command line adjustments. Has no staged directory.
    BootParams,
}

/// Which directory shape a category was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Current,
    Legacy,
}

impl Category {
    /// Categories backed by a staged directory.
    pub const COPYABLE: [Category; 3] = [
        Category::KernelModules,
        Category::Firmware,
        Category::ConfigFiles,
    ];

    /// Name used in logs, errors and the staged layout.
    pub fn name(&self) -> &'static str {
        match self {
            Category::KernelModules => "kernel-modules",
            Category::Firmware => "firmware",
            Category::ConfigFiles => "files",
            Category::BootParams => "boot-params",
        }
    }

    /// Candidate paths relative to the overlay root, most preferred first.
    pub fn candidates(&self) -> &'static [(&'static str, LayoutKind)] {
        match self {
            Category::KernelModules => &[
                ("artifacts/install/kernel-modules", LayoutKind::Current),
                ("install/kernel-modules", LayoutKind::Legacy),
            ],
            Category::Firmware => &[
                ("artifacts/install/firmware", LayoutKind::Current),
                ("install/firmware", LayoutKind::Legacy),
            ],
            Category::ConfigFiles => &[
                ("artifacts/files", LayoutKind::Current),
                ("files", LayoutKind::Legacy),
            ],
            Category::BootParams => &[],
        }
    }

    /// Destination for this category relative to the target root.
    ///
    /// Config files land on the root itself.
    pub fn destination(&self, target_root: &Path) -> PathBuf {
        match self {
            Category::KernelModules => target_root.join("lib/modules"),
            Category::Firmware => target_root.join("lib/firmware"),
            Category::ConfigFiles | Category::BootParams => target_root.to_path_buf(),
        }
    }

    /// Whether an absent source should fail a strict install.
    pub fn is_critical(&self) -> bool {
        matches!(self, Category::KernelModules | Category::Firmware)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A source directory chosen for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub path: PathBuf,
    pub kind: LayoutKind,
}

/// Read-only view over a staged overlay root.
#[derive(Debug, Clone)]
pub struct OverlayLayout {
    root: PathBuf,
}

impl OverlayLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First existing directory among the category's candidates.
    ///
    /// A candidate that exists but is not a directory counts as absent.
    pub fn resolve(&self, category: Category) -> Option<ResolvedSource> {
        category
            .candidates()
            .iter()
            .map(|(rel, kind)| (self.root.join(rel), *kind))
            .find(|(path, _)| path.is_dir())
            .map(|(path, kind)| ResolvedSource { path, kind })
    }
}
