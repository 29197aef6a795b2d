//! # Git Versioning Module
//!
//! Each school directory becomes its own git repository, and every write to
//! one of its tables is committed. This gives an audit trail of roster edits
//! and a way to recover from a bad save.
//!
//! Git operations are non-blocking for the caller: errors are logged but
//! never fail the storage operation that triggered them.

use anyhow::{anyhow, Result};
use git2::{IndexAddOption, Oid, Repository, Signature};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Git manager for handling local repository operations
#[derive(Clone, Debug)]
pub struct GitManager {
    author_name: String,
    author_email: String,
}

impl GitManager {
    pub fn new() -> Self {
        Self {
            author_name: "School Van Tracker".to_string(),
            author_email: "tracker@schoolvan.local".to_string(),
        }
    }

    /// Initialize a git repository in the specified directory
    pub async fn init_repo<P: AsRef<Path>>(&self, repo_path: P) -> Result<()> {
        let repo_path = repo_path.as_ref();

        if !repo_path.exists() {
            fs::create_dir_all(repo_path)?;
        }

        Repository::init(repo_path)
            .map(|_| info!("Initialized git repository at: {:?}", repo_path))
            .map_err(|e| anyhow!("Failed to initialize git repository at {:?}: {}", repo_path, e))
    }

    /// Ensure a git repository exists at the specified path
    pub async fn ensure_repo_exists<P: AsRef<Path>>(&self, repo_path: P) -> Result<()> {
        let repo_path = repo_path.as_ref();
        if self.is_git_repository(repo_path) {
            Ok(())
        } else {
            self.init_repo(repo_path).await
        }
    }

    /// Stage all changes in the repository
    pub async fn add_all<P: AsRef<Path>>(&self, repo_path: P) -> Result<()> {
        let repo = Repository::open(repo_path.as_ref())?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    /// Create a commit with the staged changes
    pub async fn commit<P: AsRef<Path>>(&self, repo_path: P, message: &str) -> Result<Oid> {
        let repo_path = repo_path.as_ref();
        let repo = Repository::open(repo_path)?;
        let signature = Signature::now(&self.author_name, &self.author_email)?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        // First commit has no parent
        let parent_commits = match repo.head().ok().and_then(|head| head.target()) {
            Some(target) => vec![repo.find_commit(target)?],
            None => vec![],
        };

        let commit_id = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_commits.iter().collect::<Vec<_>>(),
        )?;

        debug!("Created commit {} in {:?}: {}", commit_id, repo_path, message);
        Ok(commit_id)
    }

    /// True if the working tree differs from HEAD
    pub async fn has_uncommitted_changes<P: AsRef<Path>>(&self, repo_path: P) -> Result<bool> {
        let repo = Repository::open(repo_path.as_ref())?;
        let statuses = repo.statuses(None)?;
        Ok(!statuses.is_empty())
    }

    /// Number of commits reachable from HEAD
    pub fn commit_count<P: AsRef<Path>>(&self, repo_path: P) -> Result<usize> {
        let repo = Repository::open(repo_path.as_ref())?;
        if repo.head().is_err() {
            return Ok(0);
        }
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        Ok(revwalk.count())
    }

    /// Stage everything and commit with a standard message.
    /// This is the entry point storage code uses after each write.
    pub async fn commit_file_change<P: AsRef<Path>>(
        &self,
        repo_path: P,
        filename: &str,
        action_description: &str,
    ) -> Result<()> {
        let repo_path = repo_path.as_ref();

        if let Err(e) = self.ensure_repo_exists(repo_path).await {
            warn!("Failed to ensure git repository exists at {:?}: {}", repo_path, e);
            return Ok(());
        }

        match self.has_uncommitted_changes(repo_path).await {
            Ok(false) => {
                debug!("No changes to commit in repository: {:?}", repo_path);
                return Ok(());
            }
            Ok(true) => {}
            Err(e) => {
                warn!("Failed to check repository status at {:?}: {}", repo_path, e);
                return Ok(());
            }
        }

        if let Err(e) = self.add_all(repo_path).await {
            warn!("Failed to stage changes in repository {:?}: {}", repo_path, e);
            return Ok(());
        }

        let commit_message = format!("Update {}: {}", filename, action_description);
        if let Err(e) = self.commit(repo_path, &commit_message).await {
            warn!("Failed to commit changes in repository {:?}: {}", repo_path, e);
        }
        Ok(())
    }

    pub fn is_git_repository<P: AsRef<Path>>(&self, repo_path: P) -> bool {
        repo_path.as_ref().join(".git").exists()
    }
}

impl Default for GitManager {
    fn default() -> Self {
        Self::new()
    }
}
