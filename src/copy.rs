//! Recursive directory copy that preserves permission bits.
//!
//! This is the one filesystem primitive every install stage is built on.
//! Regular files and directories are mirrored; anything else (symlinks,
//! devices, FIFOs, sockets) fails the copy with a contextual error.

use anyhow::{bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Counts gathered while mirroring a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Directories visited, including the source root.
    pub dirs: usize,
    /// Regular files written.
    pub files: usize,
    /// Bytes written across all files.
    pub bytes: u64,
}

/// Mirror `src` into `dst`.
///
/// Entries are visited in file-name order. Directories that do not exist
/// yet are created and given the source directory's mode once the walk
/// finishes; directories that already exist keep their mode. Files are
/// truncated and rewritten, then given the source file's mode.
///
/// Not transactional: on error, whatever was written so far stays.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    let mut created_dirs: Vec<(PathBuf, u32)> = Vec::new();

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking '{}'", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("relativizing '{}'", entry.path().display()))?;
        let target = if rel.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(rel)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            let mode = mode_of(entry.path())?;
            if !target.is_dir() {
                create_dir(&target, mode)?;
                created_dirs.push((target, mode));
            }
            stats.dirs += 1;
        } else if file_type.is_file() {
            let mode = mode_of(entry.path())?;
            stats.bytes += copy_file(entry.path(), &target, mode)?;
            stats.files += 1;
            debug!(path = %target.display(), mode = format_args!("{mode:o}"), "copied");
        } else {
            bail!(
                "unsupported entry '{}': only regular files and directories are copied",
                entry.path().display()
            );
        }
    }

    // Children are written first, so a read-only source directory does not
    // block its own contents.
    for (dir, mode) in created_dirs.iter().rev() {
        fs::set_permissions(dir, fs::Permissions::from_mode(*mode))
            .with_context(|| format!("setting permissions on '{}'", dir.display()))?;
    }

    Ok(stats)
}

fn mode_of(path: &Path) -> Result<u32> {
    let md = fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata '{}'", path.display()))?;
    Ok(md.permissions().mode() & 0o7777)
}

fn create_dir(dir: &Path, mode: u32) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating '{}'", dir.display()))?;
    // Owner needs write access until the walk is done.
    fs::set_permissions(dir, fs::Permissions::from_mode(mode | 0o700))
        .with_context(|| format!("setting permissions on '{}'", dir.display()))?;
    Ok(())
}

fn copy_file(src: &Path, dst: &Path, mode: u32) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating '{}'", parent.display()))?;
    }

    prepare_destination(dst)?;

    let mut reader = File::open(src).with_context(|| format!("opening '{}'", src.display()))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(dst)
        .with_context(|| format!("opening '{}' for writing", dst.display()))?;

    let written = io::copy(&mut reader, &mut writer).with_context(|| {
        format!("copying '{}' -> '{}'", src.display(), dst.display())
    })?;

    // `mode` on open is filtered by the umask and ignored for existing files.
    fs::set_permissions(dst, fs::Permissions::from_mode(mode))
        .with_context(|| format!("setting permissions on '{}'", dst.display()))?;

    Ok(written)
}

/// Make an existing `dst` safe to truncate in place.
///
/// A symlink is removed so the write never leaves the destination tree. A
/// read-only file gets owner write back; its final mode is set after the copy.
fn prepare_destination(dst: &Path) -> Result<()> {
    let md = match fs::symlink_metadata(dst) {
        Ok(md) => md,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("reading metadata '{}'", dst.display()))
        }
    };

    if md.file_type().is_symlink() {
        debug!(path = %dst.display(), "replacing symlink");
        fs::remove_file(dst).with_context(|| format!("removing symlink '{}'", dst.display()))?;
    } else if md.is_file() && md.permissions().mode() & 0o200 == 0 {
        fs::set_permissions(dst, fs::Permissions::from_mode(md.permissions().mode() | 0o200))
            .with_context(|| format!("making '{}' writable", dst.display()))?;
    }
    Ok(())
}
