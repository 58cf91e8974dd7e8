//! On-disk layout of the mirror cache
//!
//! ```text
//! <base>/gnu-elpa/            archive checkout
//! <base>/gnu-elpa/emacs/      Emacs checkout, nested inside the archive
//! <base>/gnu-elpa/packages/   one directory per package
//! <base>/repos/<package>/     mirror working trees
//! <base>/repos/<manifest>/    manifest working tree
//! ```

use std::path::PathBuf;

use crate::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: PathBuf,
    manifest_repository: String,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>, manifest_repository: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            manifest_repository: manifest_repository.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_directory, &config.github.manifest_repository)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.base.join("gnu-elpa")
    }

    pub fn emacs_dir(&self) -> PathBuf {
        self.archive_dir().join("emacs")
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.archive_dir().join("packages")
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.packages_dir().join(package)
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.base.join("repos")
    }

    pub fn mirror_dir(&self, package: &str) -> PathBuf {
        self.repos_dir().join(package)
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.repos_dir().join(&self.manifest_repository)
    }
}
