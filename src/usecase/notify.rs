use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::owner::OwnerModifier;
use crate::domain::pr::{PullRequest, ReviewerApprovalMap};
use crate::domain::tree::{FileTreeMap, OwnersTree};
use crate::repo::CodeHost;

static ADD_REVIEWERS_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)#add-?owners").expect("tag pattern is valid"));
static DONT_ADD_REVIEWERS_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)#no-?add-?owners").expect("tag pattern is valid"));

/// Map from owner display name to the changed files attributed to them,
/// in first-seen order.
pub type NotificationMap = IndexMap<String, Vec<String>>;

/// Whether review requests should be submitted for this PR at all.
///
/// With opt-out mode enabled, requests go out unless the description
/// carries the opt-out tag; with it disabled, only an explicit opt-in tag
/// turns them on. Tags are case-insensitive and the hyphen is optional.
pub fn should_request_reviews(description: &str, opt_out_mode: bool) -> bool {
    let opt_out_tag = DONT_ADD_REVIEWERS_TAG.is_match(description);
    let opt_in_tag = ADD_REVIEWERS_TAG.is_match(description);
    (opt_out_mode && !opt_out_tag) || (!opt_out_mode && opt_in_tag)
}

/// What a notification cycle did.
#[derive(Debug, Default)]
pub struct NotifyOutcome {
    pub requested_reviewers: Vec<String>,
    pub notified: NotificationMap,
}

/// The notification decision engine for one PR snapshot.
///
/// Holds the per-file nearest-owner map for the cycle; everything here is
/// rebuilt from scratch on every invocation.
pub struct OwnersNotifier<'t> {
    pr: PullRequest,
    current_reviewers: ReviewerApprovalMap,
    file_tree_map: FileTreeMap<'t>,
    opt_out_mode: bool,
}

impl<'t> OwnersNotifier<'t> {
    pub fn new(
        pr: PullRequest,
        current_reviewers: ReviewerApprovalMap,
        tree: &'t dyn OwnersTree,
        changed_files: &[String],
        opt_out_mode: bool,
    ) -> Self {
        Self {
            pr,
            current_reviewers,
            file_tree_map: tree.build_file_tree_map(changed_files),
            opt_out_mode,
        }
    }

    /// Run one full notification cycle: gated review requests first, then
    /// the notification comment.
    ///
    /// Every reviewer actually requested is marked pending in the approval
    /// map before aggregation, so nobody is both formally requested and
    /// mentioned in the comment within the same cycle.
    pub async fn notify(
        &mut self,
        host: &dyn CodeHost,
        suggested_reviewers: &[String],
    ) -> Result<NotifyOutcome> {
        let requested = self.request_reviews(host, suggested_reviewers).await?;
        for reviewer in &requested {
            self.current_reviewers.insert(reviewer.clone(), false);
        }

        let notified = self.owners_to_notify();
        self.sync_notification_comment(host, &notified).await?;

        Ok(NotifyOutcome {
            requested_reviewers: requested,
            notified,
        })
    }

    /// Submit review requests if the PR opted in (or did not opt out).
    /// Returns the usernames actually requested.
    pub async fn request_reviews(
        &self,
        host: &dyn CodeHost,
        suggested_reviewers: &[String],
    ) -> Result<Vec<String>> {
        if !should_request_reviews(&self.pr.description, self.opt_out_mode) {
            debug!(pr = self.pr.number, "review requests are off for this PR");
            return Ok(Vec::new());
        }

        let requests = self.reviewers_to_request(suggested_reviewers);
        host.create_review_requests(self.pr.number, &requests).await?;
        Ok(requests)
    }

    /// The suggested reviewers minus anyone who is a silent owner of any
    /// changed file. A silent owner of even one file is excluded globally.
    pub fn reviewers_to_request(&self, suggested_reviewers: &[String]) -> Vec<String> {
        let mut reviewers: IndexSet<String> = suggested_reviewers.iter().cloned().collect();
        for (filename, subtree) in &self.file_tree_map {
            for owner in subtree.modified_file_owners(filename, OwnerModifier::Silent) {
                for username in owner.all_usernames() {
                    reviewers.shift_remove(&username);
                }
            }
        }
        reviewers.into_iter().collect()
    }

    /// Owners to mention in the comment, mapped to the changed files they
    /// should hear about. The PR author and anyone already in the reviewer
    /// approval map are dropped.
    pub fn owners_to_notify(&self) -> NotificationMap {
        let mut notifies = NotificationMap::new();
        for (filename, subtree) in &self.file_tree_map {
            for owner in subtree.modified_file_owners(filename, OwnerModifier::Notify) {
                notifies
                    .entry(owner.name().to_owned())
                    .or_default()
                    .push(filename.clone());
            }
        }

        notifies.shift_remove(&self.pr.author);
        for name in self.current_reviewers.keys() {
            notifies.shift_remove(name);
        }
        notifies
    }

    /// Create or overwrite the single notification comment. An empty map is
    /// a no-op; an existing comment is never cleared.
    async fn sync_notification_comment(
        &self,
        host: &dyn CodeHost,
        notifies: &NotificationMap,
    ) -> Result<()> {
        let Some(body) = render_notification_comment(notifies) else {
            return Ok(());
        };

        let existing = host.bot_comments(self.pr.number).await?;
        match existing.first() {
            Some(comment) => host.update_comment(comment.id, &body).await?,
            None => {
                host.create_bot_comment(self.pr.number, &body).await?;
            }
        }
        Ok(())
    }
}

/// One paragraph per owner (a mention header plus a bullet per file),
/// paragraphs separated by a blank line. `None` when nobody is left to
/// notify.
pub fn render_notification_comment(notifies: &NotificationMap) -> Option<String> {
    if notifies.is_empty() {
        return None;
    }
    let paragraphs: Vec<String> = notifies
        .iter()
        .map(|(name, filenames)| {
            let mut lines = vec![format!("Hey @{name}, these files were changed:")];
            lines.extend(filenames.iter().map(|filename| format!("- {filename}")));
            lines.join("\n")
        })
        .collect();
    Some(paragraphs.join("\n\n"))
}
