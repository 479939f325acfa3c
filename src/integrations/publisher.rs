//! Publishing a completed run as a branch and pull request.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::retry::{RetryPolicy, with_retry};
use super::vcs::{Author, PullRequest, PullRequestClient, PullRequestRequest, VcsClient};
use crate::types::{Bundle, Result};

#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Defaults to `revive/modernize-<timestamp>`
    pub branch: Option<String>,
    pub base: String,
    pub remote: String,
    pub title: String,
    pub draft: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            branch: None,
            base: "main".to_string(),
            remote: "origin".to_string(),
            title: "Automated modernization".to_string(),
            draft: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Publication {
    pub branch: String,
    pub author: Option<Author>,
    pub pull_request: PullRequest,
}

/// branch → stage → commit → push (retried) → open PR (retried)
pub struct Publisher {
    vcs: Arc<dyn VcsClient>,
    pull_requests: Arc<dyn PullRequestClient>,
    policy: RetryPolicy,
}

impl Publisher {
    pub fn new(
        vcs: Arc<dyn VcsClient>,
        pull_requests: Arc<dyn PullRequestClient>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            vcs,
            pull_requests,
            policy,
        }
    }

    #[instrument(skip(self, bundle, options))]
    pub async fn publish(
        &self,
        repository: &str,
        bundle: &Bundle,
        options: &PublishOptions,
    ) -> Result<Publication> {
        let branch = options
            .branch
            .clone()
            .unwrap_or_else(|| format!("revive/modernize-{}", Utc::now().format("%Y%m%d%H%M%S")));

        self.vcs.create_branch(&branch).await?;
        self.vcs.stage_all().await?;

        let author = match self.vcs.top_author().await {
            Ok(author) => author,
            Err(e) => {
                warn!(error = %e, "Could not determine commit author");
                None
            }
        };
        let message = format!("{} for {}", options.title, repository);
        self.vcs.commit(&message, author.as_ref()).await?;

        let (vcs, head, remote) = (&self.vcs, &branch, &options.remote);
        with_retry(&self.policy, "push", move || vcs.push(head, remote)).await?;

        let request = PullRequestRequest {
            title: options.title.clone(),
            head: branch.clone(),
            base: options.base.clone(),
            body: bundle.pr_description.clone(),
            draft: options.draft,
        };
        let (host, request) = (&self.pull_requests, &request);
        let pull_request = with_retry(&self.policy, "create pull request", move || {
            host.create_pull_request(request)
        })
        .await?;

        info!(branch = %branch, url = %pull_request.url, "Pull request opened");
        Ok(Publication {
            branch,
            author,
            pull_request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BundleSummary, ErrorCategory, IntegrationError, ReviveError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MockVcs {
        calls: Mutex<Vec<String>>,
        push_failures: AtomicUsize,
        author: Option<Author>,
    }

    impl MockVcs {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl VcsClient for MockVcs {
        async fn create_branch(&self, name: &str) -> Result<()> {
            self.log(format!("branch {}", name));
            Ok(())
        }

        async fn stage_all(&self) -> Result<()> {
            self.log("stage".into());
            Ok(())
        }

        async fn commit(&self, message: &str, author: Option<&Author>) -> Result<()> {
            let by = author.map(Author::signature).unwrap_or_default();
            self.log(format!("commit {} by {}", message, by));
            Ok(())
        }

        async fn push(&self, branch: &str, remote: &str) -> Result<()> {
            self.log(format!("push {} {}", remote, branch));
            let remaining = self.push_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.push_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(IntegrationError::new(ErrorCategory::Network, "reset")
                    .service("git")
                    .into());
            }
            Ok(())
        }

        async fn top_author(&self) -> Result<Option<Author>> {
            Ok(self.author.clone())
        }
    }

    struct MockHost {
        seen: Mutex<Vec<PullRequestRequest>>,
        category: Option<ErrorCategory>,
    }

    #[async_trait]
    impl PullRequestClient for MockHost {
        async fn create_pull_request(&self, request: &PullRequestRequest) -> Result<PullRequest> {
            self.seen.lock().unwrap().push(request.clone());
            if let Some(category) = self.category {
                return Err(IntegrationError::new(category, "rejected").into());
            }
            Ok(PullRequest {
                number: 42,
                url: "https://example.test/pr/42".into(),
            })
        }
    }

    fn bundle() -> Bundle {
        Bundle {
            roadmap: "# Roadmap".into(),
            pr_description: "## Automated modernization".into(),
            diffs: Vec::new(),
            summary: BundleSummary::default(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn options() -> PublishOptions {
        PublishOptions {
            branch: Some("revive/test".into()),
            ..PublishOptions::default()
        }
    }

    #[tokio::test]
    async fn test_publish_sequence_with_push_retry() {
        let vcs = Arc::new(MockVcs {
            push_failures: AtomicUsize::new(2),
            author: Some(Author::new("Ada", "ada@example.com")),
            ..MockVcs::default()
        });
        let host = Arc::new(MockHost {
            seen: Mutex::new(Vec::new()),
            category: None,
        });

        let publication = Publisher::new(vcs.clone(), host.clone(), policy())
            .publish("legacy-app", &bundle(), &options())
            .await
            .unwrap();

        assert_eq!(publication.pull_request.number, 42);
        assert_eq!(publication.author.unwrap().name, "Ada");

        let calls = vcs.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "branch revive/test",
                "stage",
                "commit Automated modernization for legacy-app by Ada <ada@example.com>",
                "push origin revive/test",
                "push origin revive/test",
                "push origin revive/test",
            ]
        );

        let seen = host.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].body, "## Automated modernization");
        assert_eq!(seen[0].head, "revive/test");
    }

    #[tokio::test]
    async fn test_rejected_pull_request_is_surfaced() {
        let vcs = Arc::new(MockVcs::default());
        let host = Arc::new(MockHost {
            seen: Mutex::new(Vec::new()),
            category: Some(ErrorCategory::Auth),
        });

        let err = Publisher::new(vcs, host.clone(), policy())
            .publish("legacy-app", &bundle(), &options())
            .await
            .unwrap_err();

        assert!(matches!(err, ReviveError::Integration(ref e) if e.category == ErrorCategory::Auth));
        assert_eq!(host.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transient_pull_request_failure_exhausts_retries() {
        let vcs = Arc::new(MockVcs::default());
        let host = Arc::new(MockHost {
            seen: Mutex::new(Vec::new()),
            category: Some(ErrorCategory::Transient),
        });

        let result = Publisher::new(vcs, host.clone(), policy())
            .publish("legacy-app", &bundle(), &options())
            .await;

        assert!(result.is_err());
        assert_eq!(host.seen.lock().unwrap().len(), 4);
    }
}
