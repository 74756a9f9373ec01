//! Installs a staged vendor hardware-support overlay into a target root
//! filesystem during OS image generation.
//!
//! The overlay carries out-of-tree kernel modules, firmware and config
//! files (`etc/modprobe.d`, `etc/modules-load.d`, ...). The host image
//! builder runs the installer once per image, either as the
//! `overlay-installer` binary or through [`plugin::OverlayInstaller`].
//!
//! # Architecture
//!
//! ```text
//! overlay-installer (bin)      plugin::VendorOverlay
//!     │  install / positional       │
//!     └──────────────┬──────────────┘
//!                    ▼
//!          installer::Installer      stages: modules, firmware, files, boot-params
//!             │            │
//!             ▼            ▼
//!   layout::OverlayLayout  copy::copy_tree
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use overlay_installer::{InstallContext, InstallOptions, OverlayInstaller, VendorOverlay};
//!
//! let overlay = VendorOverlay::new("/usr/share/overlay");
//! let mut ctx = InstallContext::default();
//! let options = InstallOptions::new("/tmp/rootfs", "/usr/share/overlay");
//! overlay.install(&mut ctx, &options)?;
//! # Ok::<(), overlay_installer::StageError>(())
//! ```

pub mod config;
pub mod copy;
pub mod error;
pub mod installer;
pub mod inventory;
pub mod layout;
pub mod options;
pub mod plugin;

/// Name reported to the host by `get-options`.
pub const INSTALLER_NAME: &str = "asus-ascent-gx10";

pub use config::InstallerConfig;
pub use error::{StageError, UsageError};
pub use installer::{BootParams, InstallReport, Installer, StageOutcome, StageRecord};
pub use layout::{Category, OverlayLayout};
pub use options::InstallOptions;
pub use plugin::{InstallContext, OverlayInstaller, VendorOverlay};
