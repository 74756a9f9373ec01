//! Read-only inventory of a staged overlay.
//!
//! Used by `overlay-installer verify` to check what an overlay would
//! install before an image build consumes it. Missing components are
//! reported, not treated as errors.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::layout::{Category, LayoutKind, OverlayLayout};

/// Config files a complete NVIDIA overlay is expected to stage.
pub const EXPECTED_CONFIG_FILES: &[&str] = &[
    "etc/modprobe.d/nvidia.conf",
    "etc/modules-load.d/nvidia.conf",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInventory {
    pub category: Category,
    pub source: Option<PathBuf>,
    pub layout: Option<LayoutKind>,
    /// Regular files under the source.
    pub files: usize,
    /// `.ko` / `.ko.zst` files; only for kernel-modules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedFile {
    pub path: String,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub overlay_root: PathBuf,
    pub categories: Vec<CategoryInventory>,
    pub config_files: Vec<ExpectedFile>,
    /// Kernel modules and firmware are both staged and non-empty.
    pub complete: bool,
}

impl Inventory {
    pub fn category(&self, category: Category) -> Option<&CategoryInventory> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn missing(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .categories
            .iter()
            .filter(|c| c.category.is_critical() && c.files == 0)
            .map(|c| c.category.to_string())
            .collect();
        missing.extend(
            self.config_files
                .iter()
                .filter(|f| !f.present)
                .map(|f| f.path.clone()),
        );
        missing
    }
}

/// Walk every copyable category and report what is staged.
pub fn inspect(layout: &OverlayLayout) -> Result<Inventory> {
    let mut categories = Vec::new();
    let mut config_root = None;

    for category in Category::COPYABLE {
        let resolved = layout.resolve(category);
        let (files, modules) = match &resolved {
            Some(source) => {
                let files = count_files(&source.path, |_| true)?;
                let modules = match category {
                    Category::KernelModules => Some(count_files(&source.path, is_module)?),
                    _ => None,
                };
                (files, modules)
            }
            None => (0, (category == Category::KernelModules).then_some(0)),
        };
        if category == Category::ConfigFiles {
            config_root = resolved.as_ref().map(|s| s.path.clone());
        }
        categories.push(CategoryInventory {
            category,
            layout: resolved.as_ref().map(|s| s.kind),
            source: resolved.map(|s| s.path),
            files,
            modules,
        });
    }

    let config_files = EXPECTED_CONFIG_FILES
        .iter()
        .map(|rel| ExpectedFile {
            path: rel.to_string(),
            present: config_root
                .as_ref()
                .is_some_and(|root| root.join(rel).is_file()),
        })
        .collect();

    let staged = |category: Category| {
        categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.modules.unwrap_or(c.files) > 0)
            .unwrap_or(false)
    };
    let complete = staged(Category::KernelModules) && staged(Category::Firmware);

    Ok(Inventory {
        overlay_root: layout.root().to_path_buf(),
        categories,
        config_files,
        complete,
    })
}

fn is_module(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".ko") || n.ends_with(".ko.zst"))
}

fn count_files(root: &Path, filter: impl Fn(&Path) -> bool) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("walking '{}'", root.display()))?;
        if entry.file_type().is_file() && filter(entry.path()) {
            count += 1;
        }
    }
    Ok(count)
}
