//! Mirror orchestration
//!
//! Runs the whole pipeline strictly in sequence: sync the upstream checkouts,
//! patch and build the archive, enumerate packages, provision missing mirror
//! repositories, replace each mirror's content with its upstream snapshot,
//! push, then regenerate the manifest repository. The first failure aborts the
//! run; reruns pick up where it stopped because every step resets its target
//! to match upstream.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::commit::{stage_and_commit, CommitMetadata, CommitOutcome};
use crate::credentials::{AccessToken, RemoteUrl};
use crate::git::{run_command, CloneOptions, GitClient};
use crate::github::{HostingApi, NewRepository};
use crate::layout::Layout;
use crate::runner::CommandRunner;
use crate::{snapshot, upstream, Config};

/// Command-line switches altering a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorOptions {
    /// Leave already-present mirror working trees as they are instead of fetching
    pub skip_mirror_pulls: bool,
    /// Stop before pushing anything
    pub skip_push: bool,
}

/// Results from a complete mirror run
#[derive(Debug, Clone)]
pub struct MirrorSummary {
    pub packages: Vec<String>,
    pub created_repositories: Vec<String>,
    pub committed_packages: Vec<String>,
    pub unchanged_packages: usize,
    pub pushed_repositories: usize,
    pub manifest_committed: bool,
    pub metadata: CommitMetadata,
    pub duration: Duration,
}

/// The mirror pipeline and its collaborators
pub struct Mirror {
    config: Arc<Config>,
    layout: Layout,
    token: AccessToken,
    runner: Arc<dyn CommandRunner>,
    git: GitClient,
    hosting: Arc<dyn HostingApi>,
    options: MirrorOptions,
}

impl Mirror {
    pub fn new(
        config: Config,
        token: AccessToken,
        runner: Arc<dyn CommandRunner>,
        hosting: Arc<dyn HostingApi>,
        options: MirrorOptions,
    ) -> Self {
        let layout = Layout::from_config(&config);
        let git = GitClient::new(runner.clone(), &config.commit);

        Self {
            config: Arc::new(config),
            layout,
            token,
            runner,
            git,
            hosting,
            options,
        }
    }

    /// Run every step in order
    pub async fn run(&self) -> Result<MirrorSummary> {
        let start_time = Instant::now();

        let metadata = self.sync_upstreams().await?;
        self.prepare_archive().await?;

        let packages = self.enumerate_packages()?;
        info!("Found {} packages", packages.len());

        let created_repositories = self.provision_mirrors(&packages).await?;
        self.fetch_mirrors(&packages).await?;

        let outcomes = self.update_mirrors(&packages, &metadata).await?;
        let committed_packages: Vec<String> = outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == CommitOutcome::Committed)
            .map(|(package, _)| package.clone())
            .collect();
        let unchanged_packages = outcomes.len() - committed_packages.len();

        let mut pushed_repositories = 0;
        if !self.options.skip_push {
            pushed_repositories += self.publish_mirrors(&packages).await?;
        }

        let manifest_outcome = self.sync_manifest(&packages, &metadata).await?;
        if !self.options.skip_push {
            self.publish_manifest().await?;
            pushed_repositories += 1;
        } else {
            info!("--> skip pushing changes");
        }

        let summary = MirrorSummary {
            packages,
            created_repositories,
            committed_packages,
            unchanged_packages,
            pushed_repositories,
            manifest_committed: manifest_outcome == CommitOutcome::Committed,
            metadata,
            duration: start_time.elapsed(),
        };

        info!(
            "Mirror run completed in {:.2}s: {} packages, {} committed, {} unchanged, {} created",
            summary.duration.as_secs_f64(),
            summary.packages.len(),
            summary.committed_packages.len(),
            summary.unchanged_packages,
            summary.created_repositories.len()
        );

        Ok(summary)
    }

    /// Clone or update GNU ELPA and Emacs, then record their commits
    pub async fn sync_upstreams(&self) -> Result<CommitMetadata> {
        let archive_dir = self.layout.archive_dir();
        let emacs_dir = self.layout.emacs_dir();

        info!("--> clone/update GNU ELPA");
        self.git
            .clone_or_update(
                &RemoteUrl::public(&self.config.upstream.archive_url),
                &archive_dir,
                CloneOptions::shallow_all_branches(),
            )
            .await
            .context("Failed to clone/update GNU ELPA")?;

        info!("--> clone/update Emacs");
        self.git
            .clone_or_update(
                &RemoteUrl::public(&self.config.upstream.emacs_url),
                &emacs_dir,
                CloneOptions::shallow(),
            )
            .await
            .context("Failed to clone/update Emacs")?;

        info!("--> check timestamp and commit hashes");
        let archive_commit = self.git.head_commit(&archive_dir).await?;
        let emacs_commit = self.git.head_commit(&emacs_dir).await?;

        Ok(CommitMetadata::now(archive_commit, emacs_commit))
    }

    /// Patch the archive's build scripts and materialize external packages
    pub async fn prepare_archive(&self) -> Result<()> {
        let archive_dir = self.layout.archive_dir();

        info!("--> install bugfix in GNU ELPA build script");
        for patch in &self.config.upstream.patches {
            if let Err(e) = self.git.checkout_file(&archive_dir, &patch.file).await {
                warn!("Failed to restore {} before patching: {}", patch.file, e);
            }
            upstream::apply_patch(&archive_dir, patch)?;
        }

        info!("--> retrieve/update GNU ELPA external packages");
        run_command(
            self.runner.as_ref(),
            &self.config.upstream.build_command,
            &archive_dir,
        )
        .await
        .context("Failed to retrieve GNU ELPA external packages")?;

        Ok(())
    }

    /// Package names under the archive, minus the reserved manifest name
    pub fn enumerate_packages(&self) -> Result<Vec<String>> {
        upstream::list_packages(&self.layout.packages_dir(), self.config.excluded_package())
    }

    /// Create any mirror repository (and the manifest) missing from the organization
    ///
    /// Existing repositories are listed once per run. Returns the names created.
    pub async fn provision_mirrors(&self, packages: &[String]) -> Result<Vec<String>> {
        let org = &self.config.github.organization;

        info!("--> get list of mirror repositories");
        self.hosting.authenticate().await?;
        let existing: HashSet<String> = self
            .hosting
            .list_organization_repositories(org)
            .await?
            .into_iter()
            .collect();

        let manifest = &self.config.github.manifest_repository;
        let wanted = packages
            .iter()
            .map(|package| NewRepository::package_mirror(package))
            .chain(std::iter::once(NewRepository::manifest(manifest)));

        let mut created = Vec::new();
        for repo in wanted {
            if existing.contains(&repo.name) {
                continue;
            }
            info!("----> create mirror repository {}", repo.name);
            self.hosting.create_repository(org, &repo).await?;
            created.push(repo.name);
        }

        Ok(created)
    }

    /// Clone or update every mirror working tree
    pub async fn fetch_mirrors(&self, packages: &[String]) -> Result<()> {
        info!("--> clone/update mirror repositories");
        for package in packages {
            self.fetch_working_tree(package, &self.layout.mirror_dir(package))
                .await?;
        }
        Ok(())
    }

    /// Replace each mirror's content with its upstream snapshot and commit
    pub async fn update_mirrors(
        &self,
        packages: &[String],
        metadata: &CommitMetadata,
    ) -> Result<Vec<(String, CommitOutcome)>> {
        info!("--> update mirrored packages");
        let mut outcomes = Vec::with_capacity(packages.len());
        for package in packages {
            let outcome = self.update_package(package, metadata).await?;
            outcomes.push((package.clone(), outcome));
        }
        Ok(outcomes)
    }

    /// Replace one mirror's content with its upstream snapshot and commit
    pub async fn update_package(
        &self,
        package: &str,
        metadata: &CommitMetadata,
    ) -> Result<CommitOutcome> {
        info!("----> update package {}", package);
        let package_dir = self.layout.package_dir(package);
        let repo_dir = self.layout.mirror_dir(package);

        snapshot::clear_worktree(&repo_dir)?;
        snapshot::copy_snapshot(&package_dir, &repo_dir)?;

        stage_and_commit(&self.git, &repo_dir, &format!("Update {}", package), metadata)
            .await
            .with_context(|| format!("Failed to commit package {}", package))
    }

    /// Push every mirror repository
    pub async fn publish_mirrors(&self, packages: &[String]) -> Result<usize> {
        info!("--> push changes");
        for package in packages {
            info!("----> push changes to package {}", package);
            self.git
                .push(&self.layout.mirror_dir(package), true)
                .await
                .with_context(|| format!("Failed to push package {}", package))?;
        }
        Ok(packages.len())
    }

    /// Regenerate the manifest working tree: one empty file per package
    pub async fn sync_manifest(
        &self,
        packages: &[String],
        metadata: &CommitMetadata,
    ) -> Result<CommitOutcome> {
        info!("--> update package list");
        let manifest = &self.config.github.manifest_repository;
        let manifest_dir = self.layout.manifest_dir();

        self.fetch_working_tree(manifest, &manifest_dir).await?;
        snapshot::clear_worktree(&manifest_dir)?;
        snapshot::write_manifest(&manifest_dir, packages)?;

        stage_and_commit(&self.git, &manifest_dir, "Update package list", metadata)
            .await
            .context("Failed to commit package list")
    }

    pub async fn publish_manifest(&self) -> Result<()> {
        info!("--> push package list");
        self.git
            .push(&self.layout.manifest_dir(), true)
            .await
            .context("Failed to push package list")
    }

    async fn fetch_working_tree(&self, repo: &str, dir: &Path) -> Result<()> {
        if self.options.skip_mirror_pulls && dir.is_dir() {
            return Ok(());
        }

        info!("----> clone/update mirror repository {}", repo);
        let url = RemoteUrl::github(
            &self.config.github.push_user,
            &self.token,
            &self.config.github.organization,
            repo,
        );
        self.git
            .clone_or_update(&url, dir, CloneOptions::shallow())
            .await
            .with_context(|| format!("Failed to clone/update mirror repository {}", repo))
    }
}
