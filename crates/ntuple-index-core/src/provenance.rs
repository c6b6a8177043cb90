//! Repository/branch identity recorded against every descriptor row.

use crate::convention::normalize_path;
use crate::error::Error;
use git2::Repository;
use std::path::Path;
use tracing::debug;

pub trait ProvenanceProvider {
    fn repo_name(&self) -> &str;
    fn branch(&self) -> &str;

    /// `<repo>/<branch>`, as stored in the `git_src` column.
    fn git_source(&self) -> String {
        format!("{}/{}", self.repo_name(), self.branch())
    }
}

/// Fixed provenance, for sources that are not under version control.
#[derive(Debug, Clone)]
pub struct StaticProvenance {
    pub repo: String,
    pub branch: String,
}

impl StaticProvenance {
    pub fn new(repo: &str, branch: &str) -> Self {
        Self {
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }
}

impl ProvenanceProvider for StaticProvenance {
    fn repo_name(&self) -> &str {
        &self.repo
    }

    fn branch(&self) -> &str {
        &self.branch
    }
}

#[derive(Debug, Clone)]
pub struct GitProvenance {
    repo: String,
    branch: String,
}

impl GitProvenance {
    /// Read provenance from the repository containing `path`: the repo name of
    /// its first remote (alphabetically) and the checked-out branch.
    pub fn discover(path: &Path) -> Result<Self, Error> {
        let repo = Repository::discover(path)?;
        Self::from_repository(&repo)
    }

    pub fn from_repository(repo: &Repository) -> Result<Self, Error> {
        let remotes = repo.remotes()?;
        let mut names: Vec<&str> = remotes.iter().flatten().collect();
        names.sort_unstable();
        let remote_name = names
            .first()
            .ok_or_else(|| Error::Other("repository has no remotes".to_string()))?;
        let remote = repo.find_remote(remote_name)?;
        let url = remote
            .url()
            .ok_or_else(|| Error::Other(format!("remote {} has no URL", remote_name)))?;

        let head = repo.head()?;
        let branch = if head.is_branch() {
            head.shorthand().unwrap_or("HEAD").to_string()
        } else {
            "HEAD".to_string()
        };

        let provenance = Self {
            repo: repo_name_from_url(url),
            branch,
        };
        debug!("Provenance resolved to {}", provenance.git_source());
        Ok(provenance)
    }
}

impl ProvenanceProvider for GitProvenance {
    fn repo_name(&self) -> &str {
        &self.repo
    }

    fn branch(&self) -> &str {
        &self.branch
    }
}

/// `https://github.com/UHH2/UHH2.git` → `UHH2`; URLs without `.git` are
/// normalised and their last segment taken.
pub fn repo_name_from_url(url: &str) -> String {
    match url.strip_suffix(".git") {
        Some(stem) => stem.rsplit('/').next().unwrap_or(stem).to_string(),
        None => normalize_path(url)
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
