use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::models::Repository;
use octocrab::Octocrab;
use serde::Serialize;
use tracing::{debug, info};

use crate::credentials::AccessToken;

/// Body of a repository creation request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_projects: bool,
    pub auto_init: bool,
}

impl NewRepository {
    /// Mirror repository for one GNU ELPA package
    pub fn package_mirror(package: &str) -> Self {
        Self::bare(
            package,
            format!("Mirror of the {} package from GNU ELPA", package),
            format!("https://elpa.gnu.org/packages/{}.html", package),
        )
    }

    /// Repository listing every mirrored package
    pub fn manifest(name: &str) -> Self {
        Self::bare(
            name,
            "List of packages mirrored from GNU ELPA".to_string(),
            "https://elpa.gnu.org/packages/".to_string(),
        )
    }

    /// No issues, wiki, projects, or initial commit
    fn bare(name: &str, description: String, homepage: String) -> Self {
        Self {
            name: name.to_string(),
            description,
            homepage,
            has_issues: false,
            has_wiki: false,
            has_projects: false,
            auto_init: false,
        }
    }
}

/// Hosting capabilities the mirror consumes
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Verify the token, returning the authenticated login
    async fn authenticate(&self) -> Result<String>;

    /// Names of all repositories owned by `org`
    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<String>>;

    /// Create a repository under `org`
    async fn create_repository(&self, org: &str, repo: &NewRepository) -> Result<()>;
}

/// GitHub client wrapper
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a client authenticating with the given token
    pub fn new(token: &AccessToken) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.expose().to_string())
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn authenticate(&self) -> Result<String> {
        let user = self
            .client
            .current()
            .user()
            .await
            .context("Failed to get current user information. Check your authentication.")?;

        info!("Authenticated as GitHub user: {}", user.login);
        Ok(user.login)
    }

    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<String>> {
        debug!("Fetching repositories for organization: {}", org);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let page_repos = self
                .client
                .orgs(org)
                .list_repos()
                .per_page(100u8)
                .page(page)
                .send()
                .await
                .with_context(|| {
                    format!("Failed to fetch repositories for organization {} page {}", org, page)
                })?;

            let items = page_repos.items;
            if items.is_empty() {
                break;
            }

            repositories.extend(items.into_iter().map(|repo| repo.name));
            page += 1;
        }

        info!(
            "Found {} repositories for organization: {}",
            repositories.len(),
            org
        );
        Ok(repositories)
    }

    async fn create_repository(&self, org: &str, repo: &NewRepository) -> Result<()> {
        let _created: Repository = self
            .client
            .post(format!("/orgs/{}/repos", org), Some(repo))
            .await
            .with_context(|| format!("Failed to create repository {}/{}", org, repo.name))?;

        Ok(())
    }
}
