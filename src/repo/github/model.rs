use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct UserNode {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct PullResponse {
    pub number: u64,
    pub body: Option<String>,
    pub user: UserNode,
    #[serde(default)]
    pub requested_reviewers: Vec<UserNode>,
}

#[derive(Debug, Deserialize)]
pub struct FileEntry {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewNode {
    pub user: Option<UserNode>,
    /// e.g. "APPROVED" | "CHANGES_REQUESTED" | "COMMENTED" | "DISMISSED"
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentNode {
    pub id: u64,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewRequestBody<'a> {
    pub reviewers: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct CommentBody<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PageQuery {
    pub per_page: u8,
    pub page: u32,
}
