// Common test utilities: recording fakes and an on-disk fixture
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use gnu_elpa_mirror::{
    AccessToken, CommandOutput, CommandRunner, Config, HostingApi, Invocation, Layout, Mirror,
    MirrorOptions, NewRepository,
};

pub const TOKEN: &str = "ghp_fixture_token_0123456789";
pub const HEAD: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Subcommand of a git invocation; the program name for anything else
pub fn subcommand(invocation: &Invocation) -> Option<&str> {
    if invocation.program != "git" {
        return Some(invocation.program.as_str());
    }
    invocation.args.first().map(String::as_str)
}

/// Records every invocation and simulates just enough git behavior
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Mutex<Vec<(String, CommandOutput)>>,
    staged: AtomicBool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            staged: AtomicBool::new(true),
        }
    }

    /// Reply with `output` to every invocation of `subcommand`
    pub fn fail_on(&self, subcommand: &str, output: CommandOutput) {
        self.failures
            .lock()
            .unwrap()
            .push((subcommand.to_string(), output));
    }

    /// Whether `git diff --cached --quiet` reports staged changes
    pub fn set_staged(&self, staged: bool) {
        self.staged.store(staged, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, name: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| subcommand(call) == Some(name))
            .collect()
    }

    pub fn calls_in(&self, dir: &Path) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.cwd.as_deref() == Some(dir))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let name = subcommand(invocation).unwrap_or_default().to_string();

        if let Some((_, output)) = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(sub, _)| *sub == name)
        {
            return Ok(output.clone());
        }

        let output = match name.as_str() {
            "clone" => {
                let target = PathBuf::from(invocation.args.last().expect("clone target"));
                fs::create_dir_all(target.join(".git"))?;
                CommandOutput::success()
            }
            "rev-parse" => CommandOutput::success().with_stdout(format!("{}\n", HEAD)),
            "symbolic-ref" => CommandOutput::success().with_stdout("master\n"),
            "diff" if self.staged.load(Ordering::SeqCst) => CommandOutput::with_status(1),
            _ => CommandOutput::success(),
        };
        Ok(output)
    }
}

/// In-memory organization
#[derive(Default)]
pub struct FakeHosting {
    pub existing: Mutex<Vec<String>>,
    pub created: Mutex<Vec<NewRepository>>,
    pub listings: AtomicUsize,
}

impl FakeHosting {
    pub fn with_repositories(names: &[&str]) -> Self {
        let hosting = Self::default();
        *hosting.existing.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        hosting
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|repo| repo.name.clone())
            .collect()
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn authenticate(&self) -> Result<String> {
        Ok("mirror-bot".to_string())
    }

    async fn list_organization_repositories(&self, _org: &str) -> Result<Vec<String>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn create_repository(&self, _org: &str, repo: &NewRepository) -> Result<()> {
        self.existing.lock().unwrap().push(repo.name.clone());
        self.created.lock().unwrap().push(repo.clone());
        Ok(())
    }
}

/// A base directory with an archive checkout already present
pub struct Fixture {
    pub temp_dir: TempDir,
    pub config: Config,
    pub layout: Layout,
    pub runner: Arc<FakeRunner>,
    pub hosting: Arc<FakeHosting>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_hosting(FakeHosting::default())
    }

    pub fn with_hosting(hosting: FakeHosting) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.base_directory = temp_dir.path().to_string_lossy().into_owned();

        let layout = Layout::from_config(&config);
        let fixture = Self {
            temp_dir,
            config,
            layout,
            runner: Arc::new(FakeRunner::new()),
            hosting: Arc::new(hosting),
        };

        let archive = fixture.archive_dir();
        fs::create_dir_all(archive.join(".git")).unwrap();
        fs::create_dir_all(archive.join("emacs/.git")).unwrap();
        fs::create_dir_all(archive.join("packages")).unwrap();
        fs::create_dir_all(archive.join("admin")).unwrap();
        fs::write(
            archive.join("admin/archive-contents.el"),
            "(push (cons file-pattern \"\") specs)\n",
        )
        .unwrap();

        fixture
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.layout.archive_dir()
    }

    pub fn mirror_dir(&self, package: &str) -> PathBuf {
        self.layout.mirror_dir(package)
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.layout.manifest_dir()
    }

    /// Create an upstream package directory with the given files
    pub fn add_package(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.layout.package_dir(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            let path = dir.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    /// Create a mirror working tree as a previous run would have left it
    pub fn add_mirror(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = self.mirror_dir(name);
        fs::create_dir_all(dir.join(".git")).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    pub fn mirror(&self, options: MirrorOptions) -> Mirror {
        Mirror::new(
            self.config.clone(),
            AccessToken::new(TOKEN),
            self.runner.clone(),
            self.hosting.clone(),
            options,
        )
    }
}

/// Sorted entry names of a directory
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Message passed to `git commit -m`
pub fn commit_message(invocation: &Invocation) -> String {
    let position = invocation
        .args
        .iter()
        .position(|arg| arg == "-m")
        .expect("commit without -m");
    invocation.args[position + 1].clone()
}
