use std::collections::HashMap;

/// Map from reviewer username to whether they have approved the PR.
/// Newly requested reviewers are inserted as `false` (pending); entries are
/// never removed within a cycle.
pub type ReviewerApprovalMap = HashMap<String, bool>;

/// The slice of pull request state the notification engine reads.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub author: String,
    /// Free-text description, scanned for the opt-in/opt-out tags.
    pub description: String,
}

/// A notification comment previously created by this bot on a PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotComment {
    pub id: u64,
    pub body: String,
}
