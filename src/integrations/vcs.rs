//! Version control and pull request collaborators.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// `Name <email>`
    pub fn signature(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Local working copy operations
#[async_trait]
pub trait VcsClient: Send + Sync {
    async fn create_branch(&self, name: &str) -> Result<()>;

    async fn stage_all(&self) -> Result<()>;

    /// Commit staged changes, attributed to `author` when given
    async fn commit(&self, message: &str, author: Option<&Author>) -> Result<()>;

    async fn push(&self, branch: &str, remote: &str) -> Result<()>;

    /// Most frequent author of recent history, if any
    async fn top_author(&self) -> Result<Option<Author>>;
}

/// Most frequent author in a commit log; ties go to whoever appears first
pub fn most_frequent_author(log: &[Author]) -> Option<Author> {
    let mut counts: HashMap<&Author, usize> = HashMap::new();
    for author in log {
        *counts.entry(author).or_default() += 1;
    }

    let mut best: Option<(&Author, usize)> = None;
    for author in log {
        let count = counts[author];
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((author, count));
        }
    }
    best.map(|(author, _)| author.clone())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRequest {
    pub title: String,
    /// Branch with the changes
    pub head: String,
    /// Branch to merge into
    pub base: String,
    pub body: String,
    pub draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

/// Code hosting service that can open pull requests
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    async fn create_pull_request(&self, request: &PullRequestRequest) -> Result<PullRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_frequent_author() {
        let ada = Author::new("Ada", "ada@example.com");
        let bob = Author::new("Bob", "bob@example.com");
        let log = vec![bob.clone(), ada.clone(), ada.clone(), bob.clone(), ada.clone()];
        assert_eq!(most_frequent_author(&log), Some(ada));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let ada = Author::new("Ada", "ada@example.com");
        let bob = Author::new("Bob", "bob@example.com");
        let log = vec![bob.clone(), ada.clone(), ada, bob.clone()];
        assert_eq!(most_frequent_author(&log), Some(bob));
        assert_eq!(most_frequent_author(&[]), None);
    }

    #[test]
    fn test_signature() {
        assert_eq!(
            Author::new("Ada", "ada@example.com").signature(),
            "Ada <ada@example.com>"
        );
    }
}
