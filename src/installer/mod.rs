//! Stage sequencing for an overlay install.
//!
//! Stages always run in this order, one at a time:
//!
//! 1. kernel-modules -> `<target>/lib/modules`
//! 2. firmware       -> `<target>/lib/firmware`
//! 3. files          -> `<target>` (relative layout kept)
//! 4. boot-params    -> kernel command line, only with a [`BootParams`] strategy
//!
//! A category with no staged source is skipped with a warning. A category
//! that is present but fails to copy stops the run; earlier stages are not
//! undone.

pub mod boot;

use anyhow::anyhow;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::copy::{copy_tree, CopyStats};
use crate::error::StageError;
use crate::layout::{Category, LayoutKind, OverlayLayout};

pub use boot::{AppendBootParams, BootParams, KeepBootParams};

/// What happened in one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Installed {
        source: PathBuf,
        layout: LayoutKind,
        destination: PathBuf,
        stats: CopyStats,
    },
    Skipped,
    BootParams {
        kernel_args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub category: Category,
    pub outcome: StageOutcome,
}

impl fmt::Display for StageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StageOutcome::Installed {
                source,
                layout,
                destination,
                stats,
            } => write!(
                f,
                "[install:{}] {} -> {} ({} files, {} layout)",
                self.category,
                source.display(),
                destination.display(),
                stats.files,
                match layout {
                    LayoutKind::Current => "current",
                    LayoutKind::Legacy => "legacy",
                }
            ),
            StageOutcome::Skipped => {
                write!(f, "[install:{}] not staged, skipped", self.category)
            }
            StageOutcome::BootParams { kernel_args } => write!(
                f,
                "[install:{}] kernel args: [{}]",
                self.category,
                kernel_args.join(" ")
            ),
        }
    }
}

/// Per-stage results of a successful run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub stages: Vec<StageRecord>,
}

impl InstallReport {
    pub fn outcome(&self, category: Category) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.category == category)
            .map(|r| &r.outcome)
    }

    pub fn installed(&self) -> impl Iterator<Item = Category> + '_ {
        self.stages
            .iter()
            .filter(|r| matches!(r.outcome, StageOutcome::Installed { .. }))
            .map(|r| r.category)
    }
}

/// Runs the install stages for one overlay.
pub struct Installer {
    layout: OverlayLayout,
    boot_params: Option<Box<dyn BootParams>>,
    strict: bool,
}

impl Installer {
    /// Three-stage installer: modules, firmware, files.
    pub fn new(layout: OverlayLayout) -> Self {
        Self {
            layout,
            boot_params: None,
            strict: false,
        }
    }

    /// Enable the boot-params stage with `strategy`.
    pub fn with_boot_params(mut self, strategy: impl BootParams + 'static) -> Self {
        self.boot_params = Some(Box::new(strategy));
        self
    }

    /// Treat a missing kernel-modules or firmware source as fatal.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    pub fn run(
        &self,
        target_root: &Path,
        kernel_args: &mut Vec<String>,
    ) -> Result<InstallReport, StageError> {
        self.run_with_progress(target_root, kernel_args, &mut |_: &StageRecord| {})
    }

    /// Run all stages, handing each finished stage to `progress`.
    pub fn run_with_progress(
        &self,
        target_root: &Path,
        kernel_args: &mut Vec<String>,
        progress: &mut dyn FnMut(&StageRecord),
    ) -> Result<InstallReport, StageError> {
        let mut report = InstallReport::default();

        for category in Category::COPYABLE {
            let outcome = self.copy_stage(category, target_root)?;
            let record = StageRecord { category, outcome };
            progress(&record);
            report.stages.push(record);
        }

        if let Some(strategy) = &self.boot_params {
            let updated = strategy
                .apply(kernel_args)
                .map_err(|e| StageError::new(Category::BootParams, e))?;
            *kernel_args = updated;
            let record = StageRecord {
                category: Category::BootParams,
                outcome: StageOutcome::BootParams {
                    kernel_args: kernel_args.clone(),
                },
            };
            progress(&record);
            report.stages.push(record);
        }

        Ok(report)
    }

    fn copy_stage(
        &self,
        category: Category,
        target_root: &Path,
    ) -> Result<StageOutcome, StageError> {
        let Some(source) = self.layout.resolve(category) else {
            if self.strict && category.is_critical() {
                return Err(StageError::new(
                    category,
                    anyhow!(
                        "no staged {} under '{}' (looked in: {})",
                        category,
                        self.layout.root().display(),
                        candidate_list(category)
                    ),
                ));
            }
            warn!(
                category = %category,
                overlay_root = %self.layout.root().display(),
                "category not staged, skipping"
            );
            return Ok(StageOutcome::Skipped);
        };

        let destination = category.destination(target_root);
        info!(
            category = %category,
            source = %source.path.display(),
            destination = %destination.display(),
            layout = ?source.kind,
            "installing"
        );

        let stats =
            copy_tree(&source.path, &destination).map_err(|e| StageError::new(category, e))?;
        debug!(
            category = %category,
            files = stats.files,
            dirs = stats.dirs,
            bytes = stats.bytes,
            "copied"
        );

        Ok(StageOutcome::Installed {
            source: source.path,
            layout: source.kind,
            destination,
            stats,
        })
    }
}

fn candidate_list(category: Category) -> String {
    category
        .candidates()
        .iter()
        .map(|(rel, _)| *rel)
        .collect::<Vec<_>>()
        .join(", ")
}
