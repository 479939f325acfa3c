//! External Collaborators
//!
//! Contracts for the services a run is published through, plus the shared
//! retry policy. Only the local filesystem has a concrete implementation
//! ([`RetryingFs`]); version control and code hosting are traits.

pub mod fs;
pub mod publisher;
pub mod retry;
pub mod vcs;

pub use fs::{RepoFs, RetryingFs};
pub use publisher::{Publication, PublishOptions, Publisher};
pub use retry::{RetryPolicy, with_retry};
pub use vcs::{
    Author, PullRequest, PullRequestClient, PullRequestRequest, VcsClient, most_frequent_author,
};
