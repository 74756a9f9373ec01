//! Programmatic installer interface for hosts that link the crate directly.

use std::path::PathBuf;

use crate::error::StageError;
use crate::installer::{BootParams, InstallReport, Installer, KeepBootParams};
use crate::layout::OverlayLayout;
use crate::options::InstallOptions;

/// Mutable state the host threads through an install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallContext {
    /// Kernel command line tokens for the image being assembled.
    pub kernel_args: Vec<String>,
}

impl InstallContext {
    pub fn with_kernel_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kernel_args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// An overlay that can install itself into a target root.
pub trait OverlayInstaller {
    fn install(
        &self,
        ctx: &mut InstallContext,
        options: &InstallOptions,
    ) -> Result<InstallReport, StageError>;
}

/// Vendor hardware-support overlay rooted at a staged directory.
///
/// Runs all four stages. The boot-params stage keeps the command line as
/// is unless a strategy is supplied with [`VendorOverlay::with_boot_params`].
pub struct VendorOverlay {
    installer: Installer,
}

impl VendorOverlay {
    pub fn new(overlay_root: impl Into<PathBuf>) -> Self {
        let installer =
            Installer::new(OverlayLayout::new(overlay_root)).with_boot_params(KeepBootParams);
        Self { installer }
    }

    pub fn with_boot_params(mut self, strategy: impl BootParams + 'static) -> Self {
        self.installer = self.installer.with_boot_params(strategy);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.installer = self.installer.strict(strict);
        self
    }
}

impl OverlayInstaller for VendorOverlay {
    fn install(
        &self,
        ctx: &mut InstallContext,
        options: &InstallOptions,
    ) -> Result<InstallReport, StageError> {
        self.installer.run(options.target_root(), &mut ctx.kernel_args)
    }
}
