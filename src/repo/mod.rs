use anyhow::Result;
use async_trait::async_trait;

use crate::domain::pr::BotComment;

pub mod github;
pub mod memory;

/// Narrow boundary to the code-hosting service.
///
/// Failure modes are not distinguished: any error fails the whole
/// notification cycle, and re-running the cycle from scratch is safe.
#[async_trait]
pub trait CodeHost {
    /// Request a formal review from each username.
    async fn create_review_requests(&self, pr_number: u64, usernames: &[String]) -> Result<()>;

    /// Comments previously created by this bot on the PR, oldest first.
    async fn bot_comments(&self, pr_number: u64) -> Result<Vec<BotComment>>;

    async fn create_bot_comment(&self, pr_number: u64, body: &str) -> Result<BotComment>;

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;
}
