use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::CommitConfig;
use crate::credentials::RemoteUrl;
use crate::error::MirrorError;
use crate::runner::{CommandOutput, CommandRunner, Invocation};

/// How a fresh clone is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloneOptions {
    /// `--depth 1`
    pub shallow: bool,
    /// `--no-single-branch`; only meaningful for shallow clones
    pub all_branches: bool,
}

impl CloneOptions {
    pub fn shallow() -> Self {
        Self {
            shallow: true,
            all_branches: false,
        }
    }

    pub fn shallow_all_branches() -> Self {
        Self {
            shallow: true,
            all_branches: true,
        }
    }
}

/// Git operations, run through a [`CommandRunner`]
///
/// Every call sets its own working directory; nothing depends on the
/// process's current directory.
#[derive(Clone)]
pub struct GitClient {
    runner: Arc<dyn CommandRunner>,
    author_name: String,
    author_email: String,
}

impl GitClient {
    pub fn new(runner: Arc<dyn CommandRunner>, identity: &CommitConfig) -> Self {
        Self {
            runner,
            author_name: identity.author_name.clone(),
            author_email: identity.author_email.clone(),
        }
    }

    /// Make `dir` a clone reflecting the tip of the remote's default branch
    ///
    /// Existing clones are fetched and hard-reset to the remote-tracking
    /// branch, never merged or rebased.
    pub async fn clone_or_update(
        &self,
        url: &RemoteUrl,
        dir: &Path,
        options: CloneOptions,
    ) -> Result<()> {
        if !dir.is_dir() {
            return self.clone(url, dir, options).await;
        }

        let sensitive = url.is_authenticated();
        let branch = self.current_branch(dir).await?;
        self.fetch(dir, sensitive).await?;

        let tracking = format!("refs/remotes/origin/{}", branch);
        if self.ref_exists(dir, &tracking).await? {
            self.reset_hard(dir, &tracking).await?;
        } else {
            debug!(
                "No remote-tracking branch {} in {}, leaving checkout as is",
                tracking,
                dir.display()
            );
        }

        Ok(())
    }

    async fn clone(&self, url: &RemoteUrl, dir: &Path, options: CloneOptions) -> Result<()> {
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create parent directory of {}", dir.display()))?;
        }

        let mut invocation = Invocation::new("git").arg("clone");
        if options.shallow {
            invocation = invocation.args(["--depth", "1"]);
            if options.all_branches {
                invocation = invocation.arg("--no-single-branch");
            }
        }
        let invocation = invocation
            .arg(url.as_str())
            .arg(dir)
            .sensitive(url.is_authenticated());

        self.run_checked(&invocation).await?;
        info!("Cloned into {}", dir.display());
        Ok(())
    }

    /// Short name of the checked-out branch
    pub async fn current_branch(&self, dir: &Path) -> Result<String> {
        let invocation = Invocation::new("git")
            .args(["symbolic-ref", "--short", "HEAD"])
            .current_dir(dir);

        let output = self.run_checked(&invocation).await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn fetch(&self, dir: &Path, sensitive: bool) -> Result<()> {
        let invocation = Invocation::new("git")
            .arg("fetch")
            .current_dir(dir)
            .sensitive(sensitive);

        self.run_checked(&invocation).await?;
        Ok(())
    }

    /// Whether `reference` exists; `show-ref` exits 1 when it doesn't
    pub async fn ref_exists(&self, dir: &Path, reference: &str) -> Result<bool> {
        let invocation = Invocation::new("git")
            .args(["show-ref", "--verify", "--quiet", reference])
            .current_dir(dir);

        let output = self.run(&invocation).await?;
        match output.status {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            status => Err(unexpected_status(&invocation, status, output)),
        }
    }

    pub async fn reset_hard(&self, dir: &Path, reference: &str) -> Result<()> {
        let invocation = Invocation::new("git")
            .args(["reset", "--hard", reference])
            .current_dir(dir);

        self.run_checked(&invocation).await?;
        Ok(())
    }

    /// Commit hash of `HEAD`
    pub async fn head_commit(&self, dir: &Path) -> Result<String> {
        let invocation = Invocation::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(dir);

        let output = self.run_checked(&invocation).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Restore a tracked file to its committed content
    pub async fn checkout_file(&self, dir: &Path, file: &str) -> Result<()> {
        let invocation = Invocation::new("git")
            .args(["checkout", "--", file])
            .current_dir(dir);

        self.run_checked(&invocation).await?;
        Ok(())
    }

    /// Stage every change, ignored files included
    pub async fn add_all(&self, dir: &Path) -> Result<()> {
        let invocation = Invocation::new("git")
            .args(["add", "--all", "--force"])
            .current_dir(dir);

        self.run_checked(&invocation).await?;
        Ok(())
    }

    /// `diff --cached --quiet` exits 0 when nothing is staged and 1 otherwise
    pub async fn has_staged_changes(&self, dir: &Path) -> Result<bool> {
        let invocation = Invocation::new("git")
            .args(["diff", "--cached", "--quiet"])
            .current_dir(dir);

        let output = self.run(&invocation).await?;
        match output.status {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            status => Err(unexpected_status(&invocation, status, output)),
        }
    }

    /// Commit staged changes as the bot identity
    ///
    /// Author and committer are set through the environment, which git ranks
    /// above any `user.*` configuration and overrides inherited variables.
    pub async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        let invocation = Invocation::new("git")
            .args(["commit", "--quiet", "-m", message])
            .env("GIT_AUTHOR_NAME", &self.author_name)
            .env("GIT_AUTHOR_EMAIL", &self.author_email)
            .env("GIT_COMMITTER_NAME", &self.author_name)
            .env("GIT_COMMITTER_EMAIL", &self.author_email)
            .current_dir(dir);

        self.run_checked(&invocation).await?;
        Ok(())
    }

    /// Push the current branch; the remote URL may carry a credential
    pub async fn push(&self, dir: &Path, sensitive: bool) -> Result<()> {
        let invocation = Invocation::new("git")
            .arg("push")
            .current_dir(dir)
            .sensitive(sensitive);

        self.run_checked(&invocation).await?;
        Ok(())
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.runner.run(invocation).await
    }

    async fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let output = self.run(invocation).await?;
        output.check(invocation).map_err(anyhow::Error::from)
    }
}

/// Build-step helper: run an arbitrary command and fail on nonzero exit
pub async fn run_command(
    runner: &dyn CommandRunner,
    command: &[String],
    dir: &Path,
) -> Result<CommandOutput> {
    let (program, args) = command
        .split_first()
        .context("Build command is empty")?;

    let invocation = Invocation::new(program.as_str())
        .args(args)
        .current_dir(dir);

    let output = runner.run(&invocation).await?;
    Ok(output.check(&invocation)?)
}

fn unexpected_status(
    invocation: &Invocation,
    status: Option<i32>,
    output: CommandOutput,
) -> anyhow::Error {
    MirrorError::CommandFailed {
        command: invocation.to_string(),
        status,
        stderr: output.stderr,
    }
    .into()
}
