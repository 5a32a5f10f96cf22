//! Paginated traversal of posts, comments and comment threads
//!
//! # Pagination
//!
//! Pages are requested at increasing offsets. A page shorter than the page
//! size is the last one; an empty page ends the walk immediately. A failed
//! page fetch abandons the rest of that collection but keeps what was
//! already committed.
//!
//! # Pacing
//!
//! A fixed courtesy delay follows every post, every comment and every page
//! turn, on top of the gateway's hard request budget.

use crate::api::{Comment, Gateway};
use crate::community::OwnerId;
use crate::config::LimitsConfig;
use crate::crawler::committer::{Committer, EditTarget};
use crate::output::{CommunityReport, CommunityStatus};
use std::time::Duration;

/// Walks one community at a time
pub struct Walker<'a> {
    gateway: &'a Gateway,
    committer: Committer<'a>,
    page_size: u32,
    thread_items: u32,
    pacing: Duration,
}

impl<'a> Walker<'a> {
    pub fn new(
        gateway: &'a Gateway,
        limits: &LimitsConfig,
        old_link: &'a str,
        new_link: &'a str,
    ) -> Self {
        Self {
            gateway,
            committer: Committer::new(gateway, old_link, new_link),
            page_size: limits.page_size,
            thread_items: limits.thread_items,
            pacing: limits.pacing(),
        }
    }

    /// Walks every post of `owner` and the comments under each post
    pub async fn crawl_community(&self, identifier: &str, owner: OwnerId) -> CommunityReport {
        let reporter = self.gateway.reporter();
        let mut report = CommunityReport::new(identifier, owner);
        reporter.info(format!("Processing community {} ({})", owner, identifier));

        let mut offset = 0;
        loop {
            let page = match self.gateway.wall_get(owner, offset, self.page_size).await {
                Ok(page) => page,
                Err(e) => {
                    reporter.error(format!(
                        "Failed to fetch posts of {} at offset {}: {}",
                        owner, offset, e
                    ));
                    if e.is_permission() {
                        reporter.error(format!(
                            "Community {} is unavailable (no rights or wrong profile type)",
                            owner
                        ));
                    }
                    report.status = CommunityStatus::Aborted(e.to_string());
                    break;
                }
            };

            if page.items.is_empty() {
                if offset == 0 {
                    reporter.info(format!("Community {} has no posts", owner));
                }
                break;
            }

            let fetched = page.items.len();
            for post in &page.items {
                let outcome = self
                    .committer
                    .maybe_edit(EditTarget::post(owner, post.id), &post.text, &post.attachments)
                    .await;
                report.record(&outcome);
                self.pace().await;

                self.crawl_comments(owner, post.id, &mut report).await;
            }

            if fetched < self.page_size as usize {
                break;
            }
            offset += self.page_size;
            self.pace().await;
        }

        reporter.info(format!(
            "Community {}: {} posts and {} comments edited",
            owner, report.posts_edited, report.comments_edited
        ));
        report
    }

    /// Walks the comments of one post, one level of threads deep
    pub async fn crawl_comments(&self, owner: OwnerId, post_id: i64, report: &mut CommunityReport) {
        let reporter = self.gateway.reporter();
        let edited_before = report.comments_edited;

        let mut offset = 0;
        loop {
            let page = match self
                .gateway
                .wall_get_comments(owner, post_id, offset, self.page_size, self.thread_items)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    reporter.warn(format!(
                        "Could not fetch comments of post {}: {}",
                        post_id, e
                    ));
                    report.comment_fetch_failures += 1;
                    break;
                }
            };

            if page.items.is_empty() {
                break;
            }

            let fetched = page.items.len();
            for comment in &page.items {
                self.edit_comment(owner, comment, report).await;

                if let Some(thread) = &comment.thread {
                    for reply in &thread.items {
                        self.edit_comment(owner, reply, report).await;
                    }
                }
            }

            if fetched < self.page_size as usize {
                break;
            }
            offset += self.page_size;
            self.pace().await;
        }

        let edited = report.comments_edited - edited_before;
        if edited > 0 {
            reporter.info(format!("Post {}: {} comments edited", post_id, edited));
        }
    }

    async fn edit_comment(&self, owner: OwnerId, comment: &Comment, report: &mut CommunityReport) {
        let outcome = self
            .committer
            .maybe_edit(
                EditTarget::comment(owner, comment.id),
                &comment.text,
                &comment.attachments,
            )
            .await;
        report.record(&outcome);
        self.pace().await;
    }

    async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}
