use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

fn installer() -> Command {
    let mut cmd = Command::cargo_bin("overlay-installer").unwrap();
    cmd.env_remove("OVERLAY_INSTALLER_ROOT")
        .env_remove("OVERLAY_INSTALLER_STRICT")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn touch(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Overlay in the legacy layout, without firmware.
fn staged_overlay(temp: &TempDir) -> PathBuf {
    let overlay = temp.path().join("overlay");
    touch(
        &overlay.join("install/kernel-modules/6.12.0-talos/extra/nvidia.ko"),
        "module",
    );
    touch(
        &overlay.join("files/etc/modprobe.d/nvidia.conf"),
        "options nvidia-drm modeset=1\n",
    );
    overlay
}

fn relative_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_positional_install_copies_overlay() {
    let temp = TempDir::new().unwrap();
    let overlay = staged_overlay(&temp);
    let rootfs = temp.path().join("rootfs");

    let out = installer().arg(&overlay).arg(&rootfs).output().unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(rootfs
        .join("lib/modules/6.12.0-talos/extra/nvidia.ko")
        .is_file());
    assert_eq!(
        fs::read_to_string(rootfs.join("etc/modprobe.d/nvidia.conf")).unwrap(),
        "options nvidia-drm modeset=1\n"
    );
    assert!(!rootfs.join("lib/firmware").exists());

    let stdout = stdout(&out);
    assert!(stdout.contains("[install:kernel-modules]"));
    assert!(stdout.contains("[install:firmware] not staged, skipped"));
    assert!(stdout.trim_end().ends_with("overlay installation complete"));
}

#[test]
fn test_positional_with_one_argument_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let overlay = staged_overlay(&temp);

    let out = installer().arg(&overlay).output().unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("missing required argument <rootfs-root>"));
    assert!(stdout(&out).is_empty());
    assert_eq!(
        relative_paths(temp.path())
            .iter()
            .filter(|p| !p.starts_with("overlay"))
            .count(),
        0
    );
}

#[test]
fn test_no_arguments_is_usage_error() {
    let out = installer().output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Usage:"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let out = installer().arg("--bogus").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unknown command '--bogus'"));
}

#[test]
fn test_get_options_prints_static_document() {
    let out = installer().arg("get-options").output().unwrap();

    assert!(out.status.success());
    let doc: serde_yaml_ng::Value = serde_yaml_ng::from_str(&stdout(&out)).unwrap();
    assert_eq!(doc["name"].as_str(), Some("asus-ascent-gx10"));
    assert_eq!(doc["kernelArgs"].as_sequence().map(|s| s.len()), Some(0));
}

#[test]
fn test_stdin_install_matches_positional_install() {
    let temp = TempDir::new().unwrap();
    let overlay = staged_overlay(&temp);
    let via_stdin = temp.path().join("via-stdin");
    let via_args = temp.path().join("via-args");

    let doc = format!(
        "installDisk: /dev/nvme0n1\nmountPrefix: {}\nartifactsPath: {}\nextraOptions:\n  foo: bar\n",
        via_stdin.display(),
        overlay.display()
    );
    let out = installer()
        .arg("install")
        .write_stdin(doc)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("overlay installation complete"));

    let out = installer().arg(&overlay).arg(&via_args).output().unwrap();
    assert!(out.status.success());

    assert_eq!(relative_paths(&via_stdin), relative_paths(&via_args));
}

#[test]
fn test_stdin_install_uses_env_overlay_root() {
    let temp = TempDir::new().unwrap();
    let overlay = staged_overlay(&temp);
    let rootfs = temp.path().join("rootfs");

    let out = installer()
        .arg("install")
        .env("OVERLAY_INSTALLER_ROOT", &overlay)
        .write_stdin(format!("mountPrefix: {}\nartifactsPath: \"\"\n", rootfs.display()))
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(rootfs.join("etc/modprobe.d/nvidia.conf").is_file());
}

#[test]
fn test_stdin_install_without_overlay_root_fails() {
    let temp = TempDir::new().unwrap();
    let rootfs = temp.path().join("rootfs");

    let out = installer()
        .arg("install")
        .write_stdin(format!("mountPrefix: {}\n", rootfs.display()))
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("overlay root not supplied"));
    assert!(!rootfs.exists());
}

#[test]
fn test_malformed_stdin_fails_without_writes() {
    let temp = TempDir::new().unwrap();
    let rootfs = temp.path().join("rootfs");

    let out = installer()
        .arg("install")
        .write_stdin("mountPrefix: [oops\n")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("decoding install options"));
    assert!(!stdout(&out).contains("overlay installation complete"));
    assert!(!rootfs.exists());
}

#[test]
fn test_strict_env_fails_on_missing_firmware() {
    let temp = TempDir::new().unwrap();
    let overlay = staged_overlay(&temp);
    let rootfs = temp.path().join("rootfs");

    let out = installer()
        .arg(&overlay)
        .arg(&rootfs)
        .env("OVERLAY_INSTALLER_STRICT", "1")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("failed to install firmware"));
    assert!(!stdout(&out).contains("overlay installation complete"));
    assert!(!rootfs.join("etc").exists());
}

#[test]
fn test_verify_reports_inventory() {
    let temp = TempDir::new().unwrap();
    let overlay = staged_overlay(&temp);

    let out = installer().arg("verify").arg(&overlay).output().unwrap();

    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["complete"], false);
    assert_eq!(report["categories"][0]["modules"], 1);
    assert_eq!(report["categories"][0]["layout"], "legacy");
    assert!(stderr(&out).contains("missing components: firmware"));
}

#[test]
fn test_overlay_root_named_verify_needs_explicit_path() {
    let temp = TempDir::new().unwrap();
    let overlay = temp.path().join("verify");
    touch(&overlay.join("files/etc/modules-load.d/nvidia.conf"), "nvidia\n");

    let out = installer()
        .current_dir(temp.path())
        .args(["./verify", "rootfs"])
        .output()
        .unwrap();

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(temp
        .path()
        .join("rootfs/etc/modules-load.d/nvidia.conf")
        .is_file());

    let out = installer().arg("--bogus").output().unwrap();
    assert!(stderr(&out).contains("must be written as `./verify`"));
}
