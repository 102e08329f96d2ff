use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::CodeHost;
use crate::domain::pr::BotComment;

/// In-memory code host. Backs the engine tests and `--dry-run`, recording
/// every effect instead of sending it anywhere.
#[derive(Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
    next_comment_id: u64,
    review_requests: Vec<(u64, Vec<String>)>,
    comments: Vec<(u64, BotComment)>,
}

impl InMemoryHost {
    /// Every review request recorded so far, as (pr_number, usernames).
    pub fn review_requests(&self) -> Vec<(u64, Vec<String>)> {
        self.state.lock().expect("host state poisoned").review_requests.clone()
    }

    /// Comments recorded for a PR, oldest first.
    pub fn comments(&self, pr_number: u64) -> Vec<BotComment> {
        self.state
            .lock()
            .expect("host state poisoned")
            .comments
            .iter()
            .filter(|(pr, _)| *pr == pr_number)
            .map(|(_, comment)| comment.clone())
            .collect()
    }
}

#[async_trait]
impl CodeHost for InMemoryHost {
    async fn create_review_requests(&self, pr_number: u64, usernames: &[String]) -> Result<()> {
        self.state
            .lock()
            .expect("host state poisoned")
            .review_requests
            .push((pr_number, usernames.to_vec()));
        Ok(())
    }

    async fn bot_comments(&self, pr_number: u64) -> Result<Vec<BotComment>> {
        Ok(self.comments(pr_number))
    }

    async fn create_bot_comment(&self, pr_number: u64, body: &str) -> Result<BotComment> {
        let mut state = self.state.lock().expect("host state poisoned");
        state.next_comment_id += 1;
        let comment = BotComment {
            id: state.next_comment_id,
            body: body.to_string(),
        };
        state.comments.push((pr_number, comment.clone()));
        Ok(comment)
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let mut state = self.state.lock().expect("host state poisoned");
        for (_, comment) in &mut state.comments {
            if comment.id == comment_id {
                comment.body = body.to_string();
                return Ok(());
            }
        }
        Err(anyhow!("no comment with id {comment_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn comment_create_then_update() {
        let host = InMemoryHost::default();

        let created = host.create_bot_comment(7, "first").await.unwrap();
        host.update_comment(created.id, "second").await.unwrap();

        let comments = host.comments(7);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "second");

        assert!(host.update_comment(999, "nope").await.is_err());
    }

    #[tokio::test]
    async fn comments_are_scoped_per_pr() {
        let host = InMemoryHost::default();
        host.create_bot_comment(1, "on pr 1").await.unwrap();
        host.create_bot_comment(2, "on pr 2").await.unwrap();

        assert_eq!(host.bot_comments(1).await.unwrap().len(), 1);
        assert_eq!(host.comments(2)[0].body, "on pr 2");
    }
}
