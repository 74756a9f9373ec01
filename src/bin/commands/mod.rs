use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use overlay_installer::inventory;
use overlay_installer::{
    InstallOptions, Installer, InstallerConfig, OverlayLayout, StageRecord, UsageError,
    INSTALLER_NAME,
};
use serde::Serialize;
use tracing::debug;

const SUCCESS_MARKER: &str = "overlay installation complete";

/// Document returned by `get-options`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallerInfo {
    name: &'static str,
    kernel_args: Vec<String>,
}

pub(crate) fn install_from_stdin(config: &InstallerConfig) -> Result<()> {
    let options = InstallOptions::from_reader(io::stdin().lock())?;
    install(&options, config)
}

pub(crate) fn install(options: &InstallOptions, config: &InstallerConfig) -> Result<()> {
    let overlay_root = options.overlay_root(config)?;
    let target_root = options.target_root();
    if !options.extra_options.is_empty() {
        debug!(
            keys = ?options.extra_options.keys().collect::<Vec<_>>(),
            "ignoring extra options"
        );
    }

    // The CLI runs modules, firmware and files; the kernel command line is
    // reported through get-options.
    let installer = Installer::new(OverlayLayout::new(overlay_root)).strict(config.strict);
    println!(
        "[install] overlay {} -> {}",
        installer.layout().root().display(),
        target_root.display()
    );

    installer.run_with_progress(target_root, &mut Vec::new(), &mut |record: &StageRecord| {
        println!("{record}")
    })?;

    println!("{SUCCESS_MARKER}");
    Ok(())
}

pub(crate) fn get_options() -> Result<()> {
    let info = InstallerInfo {
        name: INSTALLER_NAME,
        kernel_args: Vec::new(),
    };
    let out = serde_yaml_ng::to_string(&info).context("encoding installer options")?;
    print!("{out}");
    Ok(())
}

pub(crate) fn verify(overlay_root: Option<&str>, config: &InstallerConfig) -> Result<()> {
    let overlay_root = overlay_root
        .map(PathBuf::from)
        .or_else(|| config.overlay_root.clone())
        .ok_or(UsageError::NoOverlayRoot)?;

    let inventory = inventory::inspect(&OverlayLayout::new(&overlay_root))
        .with_context(|| format!("inspecting overlay '{}'", overlay_root.display()))?;
    let out = serde_json::to_string_pretty(&inventory).context("encoding overlay inventory")?;
    println!("{out}");

    let missing = inventory.missing();
    if !missing.is_empty() {
        eprintln!("[verify] warning: missing components: {}", missing.join(", "));
    }
    Ok(())
}
