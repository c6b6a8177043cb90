//! Checkout of historical branches of the central repository, each of which
//! carries its own copy of the descriptor tree.

use crate::config::LegacyConfig;
use crate::error::Error;
use git2::build::CheckoutBuilder;
use git2::{BranchType, Repository};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct LegacyCheckout {
    repo: Repository,
    remote_name: String,
    wanted: Vec<String>,
}

impl LegacyCheckout {
    /// Open the clone under `config.clone_dir`, creating it (init + remote) when
    /// absent, then fetch the remote.
    pub fn open_or_clone(config: &LegacyConfig) -> Result<Self, Error> {
        let clone_dir = Path::new(&config.clone_dir);
        let repo = if clone_dir.is_dir() {
            debug!("Reusing existing clone under {}", clone_dir.display());
            Repository::open(clone_dir)?
        } else {
            info!(
                "Cloning {} since there is no existing clone under {}",
                config.repo_url,
                clone_dir.display()
            );
            fs::create_dir_all(clone_dir)?;
            let repo = Repository::init(clone_dir)?;
            repo.remote(&config.remote_name, &config.repo_url)?;
            repo
        };

        {
            let mut remote = repo.find_remote(&config.remote_name)?;
            info!("Fetching {}", config.remote_name);
            remote.fetch(&[] as &[&str], None, None)?;
        }

        Ok(Self {
            repo,
            remote_name: config.remote_name.clone(),
            wanted: config.branches.clone(),
        })
    }

    pub fn workdir(&self) -> Result<PathBuf, Error> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Other("legacy clone is a bare repository".to_string()))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Remote-tracking branch names, e.g. `UHH/RunII_94X_v1`.
    pub fn remote_branches(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// Configured branches that exist on the remote, sorted.
    pub fn branches_to_index(&self) -> Result<Vec<String>, Error> {
        let available = self.remote_branches()?;
        let prefix = format!("{}/", self.remote_name);
        let mut branches: Vec<String> = available
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter(|name| self.wanted.iter().any(|w| w == name))
            .map(str::to_string)
            .collect();
        branches.sort();
        branches.dedup();
        info!("Only looking in branches: {:?}", branches);
        Ok(branches)
    }

    /// Point the local branch at the fetched remote tip, track the remote and
    /// force-check it out.
    pub fn checkout(&self, branch: &str) -> Result<(), Error> {
        let upstream = format!("{}/{}", self.remote_name, branch);
        let commit = self
            .repo
            .find_branch(&upstream, BranchType::Remote)?
            .get()
            .peel_to_commit()?;

        let local_ref = format!("refs/heads/{}", branch);
        self.repo.reference(
            &local_ref,
            commit.id(),
            true,
            &format!("ntuple-index: reset {} to {}", branch, upstream),
        )?;
        self.repo
            .find_branch(branch, BranchType::Local)?
            .set_upstream(Some(&upstream))?;

        self.repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
        self.repo.set_head(&local_ref)?;
        info!("Checked out {} to {}", upstream, branch);
        Ok(())
    }
}
