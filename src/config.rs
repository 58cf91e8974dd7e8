use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the mirror
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding the upstream checkouts and mirror working trees
    #[serde(default = "default_base_directory")]
    pub base_directory: String,

    /// Upstream repositories and build step
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// GitHub organization and repository settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Identity used for mirror commits
    #[serde(default)]
    pub commit: CommitConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream sources and the build step run against them
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    /// GNU ELPA git repository
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// Emacs git repository
    #[serde(default = "default_emacs_url")]
    pub emacs_url: String,

    /// Command materializing external package sources, run in the archive checkout
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,

    /// Textual fixes applied to the archive checkout before building
    #[serde(default = "default_patches")]
    pub patches: Vec<PatchConfig>,
}

/// Literal search-and-replace applied to one file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PatchConfig {
    /// Path relative to the archive checkout
    pub file: String,
    pub find: String,
    pub replace: String,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// Organization owning the mirror repositories
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Username placed in front of the token in push URLs
    #[serde(default = "default_push_user")]
    pub push_user: String,

    /// Repository listing every mirrored package; never mirrored as a package itself
    #[serde(default = "default_manifest_repository")]
    pub manifest_repository: String,
}

/// Commit identity, independent of the invoking user's git configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CommitConfig {
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_base_directory() -> String {
    "${HOME}/.cache/gnu-elpa-mirror".to_string()
}
fn default_archive_url() -> String {
    "https://git.savannah.gnu.org/git/emacs/elpa.git".to_string()
}
fn default_emacs_url() -> String {
    "https://git.savannah.gnu.org/git/emacs.git".to_string()
}
fn default_build_command() -> Vec<String> {
    vec!["make".to_string(), "externals".to_string()]
}
fn default_patches() -> Vec<PatchConfig> {
    vec![PatchConfig {
        file: "admin/archive-contents.el".to_string(),
        find: r#"(cons file-pattern "")"#.to_string(),
        replace: "(cons file-pattern (file-name-nondirectory file-pattern))".to_string(),
    }]
}
fn default_organization() -> String {
    "emacs-straight".to_string()
}
fn default_push_user() -> String {
    "x-access-token".to_string()
}
fn default_manifest_repository() -> String {
    "gnu-elpa-mirror".to_string()
}
fn default_author_name() -> String {
    "GNU ELPA Mirror Bot".to_string()
}
fn default_author_email() -> String {
    "gnu-elpa-mirror@users.noreply.github.com".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            archive_url: default_archive_url(),
            emacs_url: default_emacs_url(),
            build_command: default_build_command(),
            patches: default_patches(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            push_user: default_push_user(),
            manifest_repository: default_manifest_repository(),
        }
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("gnu-elpa-mirror").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.base_directory = shellexpand::full(&self.base_directory)
            .context("Failed to expand base_directory path")?
            .into_owned();

        Ok(())
    }

    /// Package name that is never mirrored
    pub fn excluded_package(&self) -> &str {
        &self.github.manifest_repository
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            upstream: UpstreamConfig::default(),
            github: GitHubConfig::default(),
            commit: CommitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
