//! gnu-elpa-mirror - Mirror GNU ELPA packages to GitHub
//!
//! Keeps one GitHub repository per GNU ELPA package in sync with the upstream
//! archive. Each run resets every mirror's working tree to the current
//! upstream package directory, commits whatever changed with the GNU ELPA and
//! Emacs commits it came from, and pushes.
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`runner`]: External command execution
//! - [`git`]: Git operations on local checkouts
//! - [`github`]: GitHub API integration
//! - [`snapshot`]: Working-tree replacement
//! - [`mirror`]: The end-to-end pipeline

pub mod cli;
pub mod commit;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod github;
pub mod layout;
pub mod mirror;
pub mod runner;
pub mod snapshot;
pub mod upstream;

pub use commit::{CommitMetadata, CommitOutcome};
pub use config::Config;
pub use credentials::{AccessToken, RemoteUrl};
pub use error::MirrorError;
pub use git::{CloneOptions, GitClient};
pub use github::{GitHubClient, HostingApi, NewRepository};
pub use layout::Layout;
pub use mirror::{Mirror, MirrorOptions, MirrorSummary};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
