//! Command-line interface
//!
//! Unknown flags are dropped before clap sees them, so a stray or misspelled
//! switch never aborts a scheduled run.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::mirror::MirrorOptions;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "gnu-elpa-mirror")]
#[command(about = "Mirror GNU ELPA packages to per-package GitHub repositories")]
#[command(version)]
pub struct Cli {
    /// Don't clone/update mirror working trees that already exist
    #[arg(long)]
    pub skip_mirror_pulls: bool,

    /// Don't push mirror or package-list repositories
    #[arg(long)]
    pub skip_push: bool,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Flags taking no value
const SWITCHES: &[&str] = &[
    "--skip-mirror-pulls",
    "--skip-push",
    "--verbose",
    "-v",
    "--help",
    "-h",
    "--version",
    "-V",
];

/// Flags consuming the following argument
const VALUED: &[&str] = &["--config", "-c"];

impl Cli {
    /// Parse the process arguments, ignoring anything unrecognized
    ///
    /// Returns the parsed CLI and the arguments that were dropped.
    pub fn parse_lenient<I, T>(args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (kept, ignored) = partition_args(args);
        (Self::parse_from(kept), ignored)
    }

    pub fn options(&self) -> MirrorOptions {
        MirrorOptions {
            skip_mirror_pulls: self.skip_mirror_pulls,
            skip_push: self.skip_push,
        }
    }
}

/// Split arguments into those clap understands and those to ignore
///
/// The first argument (the program name) is always kept.
pub fn partition_args<I, T>(args: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut kept: Vec<OsString> = args.next().into_iter().collect();
    let mut ignored = Vec::new();

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();

        if SWITCHES.contains(&text.as_str()) || text.starts_with("--config=") {
            kept.push(arg);
        } else if VALUED.contains(&text.as_str()) {
            kept.push(arg);
            if let Some(value) = args.next() {
                kept.push(value);
            }
        } else {
            ignored.push(text);
        }
    }

    (kept, ignored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_flags_parse() {
        let (cli, ignored) = Cli::parse_lenient([
            "gnu-elpa-mirror",
            "--skip-mirror-pulls",
            "--skip-push",
            "--config",
            "/etc/mirror.yml",
        ]);

        assert!(cli.skip_mirror_pulls);
        assert!(cli.skip_push);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/mirror.yml")));
        assert!(!cli.verbose);
        assert!(ignored.is_empty());
        assert_eq!(
            cli.options(),
            MirrorOptions {
                skip_mirror_pulls: true,
                skip_push: true
            }
        );
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let (cli, ignored) = Cli::parse_lenient([
            "gnu-elpa-mirror",
            "--frobnicate",
            "stray",
            "--skip-push",
            "-x",
        ]);

        assert!(cli.skip_push);
        assert!(!cli.skip_mirror_pulls);
        assert_eq!(ignored, vec!["--frobnicate", "stray", "-x"]);
    }

    #[test]
    fn test_config_equals_form_and_defaults() {
        let (kept, ignored) = partition_args(["prog", "--config=/tmp/c.yml", "-v"]);
        assert_eq!(kept.len(), 3);
        assert!(ignored.is_empty());

        let (cli, _) = Cli::parse_lenient(["prog"]);
        assert_eq!(cli.options(), MirrorOptions::default());
        assert!(cli.config.is_none());
    }
}
