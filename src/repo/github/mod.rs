pub mod auth;
pub mod model;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

use super::CodeHost;
use crate::domain::pr::{BotComment, PullRequest, ReviewerApprovalMap};
use model::{CommentBody, CommentNode, FileEntry, PageQuery, PullResponse, ReviewNode, ReviewRequestBody};

/// Marker embedded in every comment this bot creates, used to find the
/// single notification comment on later cycles.
const NOTIFY_MARKER: &str = "<!-- ownerbot:notify -->";

const PAGE_SIZE: u8 = 100;

/// One pull request's state as a notification cycle needs it.
#[derive(Debug)]
pub struct PrSnapshot {
    pub pr: PullRequest,
    pub changed_files: Vec<String>,
    pub current_reviewers: ReviewerApprovalMap,
}

/// GitHub-backed code host over octocrab.
pub struct GithubHost {
    octo: Octocrab,
    owner: String,
    repo: String,
}

impl GithubHost {
    pub fn new(
        token: String,
        api_base: Option<String>,
        owner: String,
        repo: String,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(api) = api_base {
            builder = builder
                .base_uri(api)
                .map_err(|e| anyhow!("invalid GITHUB_API_URL: {e}"))?;
        }
        let octo = builder
            .build()
            .map_err(|e| anyhow!("failed to init GitHub client: {e}"))?;
        Ok(Self { octo, owner, repo })
    }

    /// Fetch the PR metadata, changed files, and reviewer approval state.
    ///
    /// The approval map starts from the currently requested reviewers
    /// (pending, `false`); submitted reviews are folded on top with the
    /// latest review per user winning (GitHub returns them oldest first).
    pub async fn pull_request_snapshot(&self, number: u64) -> Result<PrSnapshot> {
        let route = format!("/repos/{}/{}/pulls/{number}", self.owner, self.repo);
        let pull: PullResponse = self
            .octo
            .get(route, None::<&()>)
            .await
            .map_err(|e| anyhow!("GitHub pull request lookup failed: {e}"))?;

        let changed_files = self.changed_files(number).await?;

        let mut current_reviewers = ReviewerApprovalMap::new();
        for user in &pull.requested_reviewers {
            current_reviewers.insert(user.login.clone(), false);
        }
        for review in self.reviews(number).await? {
            if let Some(user) = review.user {
                current_reviewers.insert(user.login, review.state == "APPROVED");
            }
        }

        Ok(PrSnapshot {
            pr: PullRequest {
                number: pull.number,
                author: pull.user.login,
                description: pull.body.unwrap_or_default(),
            },
            changed_files,
            current_reviewers,
        })
    }

    async fn changed_files(&self, number: u64) -> Result<Vec<String>> {
        let route = format!("/repos/{}/{}/pulls/{number}/files", self.owner, self.repo);
        let entries: Vec<FileEntry> = self
            .paginate(&route, "GitHub changed-files listing failed")
            .await?;
        Ok(entries.into_iter().map(|entry| entry.filename).collect())
    }

    async fn reviews(&self, number: u64) -> Result<Vec<ReviewNode>> {
        let route = format!("/repos/{}/{}/pulls/{number}/reviews", self.owner, self.repo);
        self.paginate(&route, "GitHub reviews listing failed").await
    }

    async fn issue_comments(&self, number: u64) -> Result<Vec<CommentNode>> {
        let route = format!("/repos/{}/{}/issues/{number}/comments", self.owner, self.repo);
        self.paginate(&route, "GitHub comments listing failed").await
    }

    async fn paginate<T: serde::de::DeserializeOwned>(
        &self,
        route: &str,
        err_label: &str,
    ) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1u32;
        loop {
            let query = PageQuery {
                per_page: PAGE_SIZE,
                page,
            };
            let batch: Vec<T> = self
                .octo
                .get(route, Some(&query))
                .await
                .map_err(|e| anyhow!("{err_label}: {e}"))?;
            let last_page = batch.len() < PAGE_SIZE as usize;
            out.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }
        Ok(out)
    }
}

#[async_trait]
impl CodeHost for GithubHost {
    async fn create_review_requests(&self, pr_number: u64, usernames: &[String]) -> Result<()> {
        if usernames.is_empty() {
            // the live API rejects an empty reviewer list
            debug!(pr = pr_number, "empty review request set; skipping API call");
            return Ok(());
        }
        let route = format!(
            "/repos/{}/{}/pulls/{pr_number}/requested_reviewers",
            self.owner, self.repo
        );
        let body = ReviewRequestBody { reviewers: usernames };
        let _: serde_json::Value = self
            .octo
            .post(route, Some(&body))
            .await
            .map_err(|e| anyhow!("GitHub review request failed: {e}"))?;
        Ok(())
    }

    async fn bot_comments(&self, pr_number: u64) -> Result<Vec<BotComment>> {
        Ok(self
            .issue_comments(pr_number)
            .await?
            .into_iter()
            .filter_map(|comment| {
                let body = comment.body?;
                body.contains(NOTIFY_MARKER).then(|| BotComment {
                    id: comment.id,
                    body: strip_marker(&body),
                })
            })
            .collect())
    }

    async fn create_bot_comment(&self, pr_number: u64, body: &str) -> Result<BotComment> {
        let route = format!(
            "/repos/{}/{}/issues/{pr_number}/comments",
            self.owner, self.repo
        );
        let marked = with_marker(body);
        let created: CommentNode = self
            .octo
            .post(route, Some(&CommentBody { body: &marked }))
            .await
            .map_err(|e| anyhow!("GitHub comment creation failed: {e}"))?;
        Ok(BotComment {
            id: created.id,
            body: body.to_string(),
        })
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let route = format!(
            "/repos/{}/{}/issues/comments/{comment_id}",
            self.owner, self.repo
        );
        let marked = with_marker(body);
        let _: CommentNode = self
            .octo
            .patch(route, Some(&CommentBody { body: &marked }))
            .await
            .map_err(|e| anyhow!("GitHub comment update failed: {e}"))?;
        Ok(())
    }
}

fn with_marker(body: &str) -> String {
    format!("{NOTIFY_MARKER}\n{body}")
}

fn strip_marker(body: &str) -> String {
    body.strip_prefix(NOTIFY_MARKER)
        .map(|rest| rest.trim_start_matches('\n').to_string())
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trip() {
        let marked = with_marker("Hey @carol, these files were changed:\n- x.js");
        assert!(marked.starts_with(NOTIFY_MARKER));
        assert_eq!(
            strip_marker(&marked),
            "Hey @carol, these files were changed:\n- x.js"
        );
    }

    #[test]
    fn strip_marker_leaves_foreign_bodies_alone() {
        assert_eq!(strip_marker("just a comment"), "just a comment");
    }
}
