//! Working-tree replacement
//!
//! A mirror's content is driven purely by what gets copied in after
//! [`clear_worktree`] empties it, so files removed upstream never linger.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Version-control metadata directory, never cleared or copied
pub const GIT_DIR: &str = ".git";

/// Remove every entry of `dir` except `.git`
///
/// Directories are removed recursively without following symbolic links;
/// files and links are unlinked. Entries that vanish first are ignored.
pub fn clear_worktree(dir: &Path) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        if entry.file_name() == GIT_DIR {
            continue;
        }

        let path = entry.path();
        let file_type = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata.file_type(),
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to stat {}", path.display()))
            }
        };

        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match removed {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to remove {}", path.display()))
            }
        }
    }

    Ok(())
}

/// Copy every entry of `source` into `target`, skipping `.git` at any depth
///
/// Directory trees are recreated and symbolic links are copied as links. A
/// nested `.git` would make git record its directory as an embedded
/// repository instead of tracking the files.
pub fn copy_snapshot(source: &Path, target: &Path) -> Result<()> {
    let entries = fs::read_dir(source)
        .with_context(|| format!("Failed to read directory {}", source.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", source.display()))?;
        if entry.file_name() == GIT_DIR {
            continue;
        }
        copy_entry(&entry.path(), &target.join(entry.file_name()))?;
    }

    Ok(())
}

fn copy_entry(source: &Path, target: &Path) -> Result<()> {
    let file_type = fs::symlink_metadata(source)
        .with_context(|| format!("Failed to stat {}", source.display()))?
        .file_type();

    if file_type.is_symlink() {
        let link = fs::read_link(source)
            .with_context(|| format!("Failed to read link {}", source.display()))?;
        symlink(&link, target)
            .with_context(|| format!("Failed to create link {}", target.display()))?;
    } else if file_type.is_dir() {
        fs::create_dir(target)
            .with_context(|| format!("Failed to create directory {}", target.display()))?;
        for entry in fs::read_dir(source)
            .with_context(|| format!("Failed to read directory {}", source.display()))?
        {
            let entry =
                entry.with_context(|| format!("Failed to read entry in {}", source.display()))?;
            if entry.file_name() == GIT_DIR {
                debug!("Skipping nested {}", entry.path().display());
                continue;
            }
            copy_entry(&entry.path(), &target.join(entry.file_name()))?;
        }
    } else {
        fs::copy(source, target).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), target.display())
        })?;
    }

    Ok(())
}

#[cfg(unix)]
fn symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(windows)]
fn symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    let resolved = target.parent().map(|p| p.join(link)).unwrap_or_else(|| link.to_path_buf());
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(link, target)
    } else {
        std::os::windows::fs::symlink_file(link, target)
    }
}

/// Write one empty file per package name into `dir`
pub fn write_manifest<S: AsRef<str>>(dir: &Path, packages: &[S]) -> Result<()> {
    for package in packages {
        let path = dir.join(package.as_ref());
        fs::File::create(&path)
            .with_context(|| format!("Failed to create manifest entry {}", path.display()))?;
    }
    debug!("Wrote {} manifest entries to {}", packages.len(), dir.display());
    Ok(())
}
