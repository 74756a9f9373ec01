use std::process::ExitCode;

use anyhow::Result;
use overlay_installer::{InstallOptions, InstallerConfig, UsageError};
use tracing_subscriber::EnvFilter;

mod commands;

fn usage() -> &'static str {
    "Usage:\n  overlay-installer install            (InstallOptions YAML on stdin)\n  overlay-installer get-options\n  overlay-installer verify [overlay_root]\n  overlay-installer <overlay_root> <rootfs_root>\n\nAn overlay root literally named `verify` must be written as `./verify`."
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = InstallerConfig::from_env();

    match dispatch(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err.downcast_ref::<UsageError>().is_some() {
                eprintln!("{}", usage());
            }
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: &[String], config: &InstallerConfig) -> Result<()> {
    match args {
        [] => Err(UsageError::MissingArgument("command").into()),
        [cmd] if cmd == "install" => commands::install_from_stdin(config),
        [cmd] if cmd == "get-options" => commands::get_options(),
        [cmd] if cmd == "verify" => commands::verify(None, config),
        [cmd, overlay_root] if cmd == "verify" => {
            commands::verify(Some(overlay_root.as_str()), config)
        }
        [cmd, extra, ..] if cmd == "install" || cmd == "get-options" => {
            Err(UsageError::UnexpectedArgument(extra.clone()).into())
        }
        [cmd] if cmd.starts_with('-') => Err(UsageError::UnknownCommand(cmd.clone()).into()),
        _ => {
            let options = InstallOptions::from_positional(args)?;
            commands::install(&options, config)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
