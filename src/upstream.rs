//! Upstream archive preparation: build-script patches and package enumeration

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::PatchConfig;

/// Apply a literal search-and-replace to one file of the archive checkout
///
/// Returns whether the file changed. A patch whose search text is absent
/// leaves the file untouched.
pub fn apply_patch(archive_dir: &Path, patch: &PatchConfig) -> Result<bool> {
    let path = archive_dir.join(&patch.file);
    let original = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if !original.contains(&patch.find) {
        warn!(
            "Patch text not found in {}, upstream may have fixed it",
            patch.file
        );
        return Ok(false);
    }

    let patched = original.replace(&patch.find, &patch.replace);
    fs::write(&path, patched).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Patched {}", patch.file);
    Ok(true)
}

/// Names of the package directories under `packages_dir`, sorted
///
/// Plain files are skipped, as is the directory named `excluded`.
pub fn list_packages(packages_dir: &Path, excluded: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(packages_dir)
        .with_context(|| format!("Failed to list packages in {}", packages_dir.display()))?;

    let mut packages = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read entry in {}", packages_dir.display()))?;
        if !entry.path().is_dir() {
            continue;
        }

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(name) => {
                warn!("Skipping package with non UTF-8 name: {:?}", name);
                continue;
            }
        };

        if name == excluded {
            debug!("Excluding reserved package name {}", name);
            continue;
        }
        packages.push(name);
    }

    packages.sort();
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archive_patch() -> PatchConfig {
        PatchConfig {
            file: "admin/archive-contents.el".to_string(),
            find: r#"(cons file-pattern "")"#.to_string(),
            replace: "(cons file-pattern (file-name-nondirectory file-pattern))".to_string(),
        }
    }

    #[test]
    fn test_apply_patch_replaces_text() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp.path().join("admin")).unwrap();
        let script = temp.path().join("admin/archive-contents.el");
        fs::write(
            &script,
            "(defun x ()\n  (cons file-pattern \"\"))\n(other)\n",
        )
        .unwrap();

        assert!(apply_patch(temp.path(), &archive_patch()).unwrap());
        assert_eq!(
            fs::read_to_string(&script).unwrap(),
            "(defun x ()\n  (cons file-pattern (file-name-nondirectory file-pattern)))\n(other)\n"
        );

        // Already patched
        assert!(!apply_patch(temp.path(), &archive_patch()).unwrap());
    }

    #[test]
    fn test_apply_patch_missing_file_fails() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        assert!(apply_patch(temp.path(), &archive_patch()).is_err());
    }

    #[test]
    fn test_list_packages_excludes_reserved_name_and_files() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let packages = temp.path();
        for name in ["dash", "ace-window", "gnu-elpa-mirror", "zzz"] {
            fs::create_dir_all(packages.join(name)).unwrap();
        }
        fs::write(packages.join("README"), "not a package").unwrap();

        let listed = list_packages(packages, "gnu-elpa-mirror").unwrap();

        assert_eq!(listed, vec!["ace-window", "dash", "zzz"]);
    }

    #[test]
    fn test_list_packages_missing_directory_fails() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        assert!(list_packages(&temp.path().join("packages"), "gnu-elpa-mirror").is_err());
    }
}
