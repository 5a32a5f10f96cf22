//! Text substitution and conditional edits
//!
//! Substitution is a literal replacement of every occurrence of the old link.
//! Nothing is sent when the text would not change, which makes a second pass
//! over already-edited content a no-op.

use crate::api::{Attachment, Gateway};
use crate::community::OwnerId;
use std::fmt;

/// Kind of content an edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Post,
    Comment,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("post"),
            Self::Comment => f.write_str("comment"),
        }
    }
}

/// A post or comment to (possibly) edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub kind: TargetKind,
    pub owner: OwnerId,
    pub id: i64,
}

impl EditTarget {
    pub fn post(owner: OwnerId, id: i64) -> Self {
        Self {
            kind: TargetKind::Post,
            owner,
            id,
        }
    }

    pub fn comment(owner: OwnerId, id: i64) -> Self {
        Self {
            kind: TargetKind::Comment,
            owner,
            id,
        }
    }
}

/// Result of one [`Committer::maybe_edit`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub kind: TargetKind,
    pub id: i64,
    /// The substitution changed the text
    pub changed: bool,
    /// The edit was accepted by the remote side
    pub committed: bool,
}

/// Replaces every literal occurrence of `old` in `text`
///
/// Returns `None` when the text would stay the same.
pub fn substitute(text: &str, old: &str, new: &str) -> Option<String> {
    if old.is_empty() || !text.contains(old) {
        return None;
    }
    let replaced = text.replace(old, new);
    (replaced != text).then_some(replaced)
}

/// Joins the references of `attachments` for an edit call
///
/// Attachments without an owner/id pair cannot be referred back to and are
/// left out; the second value counts them.
pub fn attachment_list(attachments: &[Attachment]) -> (Option<String>, usize) {
    let mut skipped = 0;
    let references: Vec<String> = attachments
        .iter()
        .filter_map(|a| {
            let reference = a.reference();
            if reference.is_none() {
                skipped += 1;
            }
            reference
        })
        .collect();

    if references.is_empty() {
        (None, skipped)
    } else {
        (Some(references.join(",")), skipped)
    }
}

/// Issues edits for texts that contain the old link
pub struct Committer<'a> {
    gateway: &'a Gateway,
    old_link: &'a str,
    new_link: &'a str,
}

impl<'a> Committer<'a> {
    pub fn new(gateway: &'a Gateway, old_link: &'a str, new_link: &'a str) -> Self {
        Self {
            gateway,
            old_link,
            new_link,
        }
    }

    /// Edits `target` if substitution changes `text`
    ///
    /// Attachments are re-sent as references so the edit keeps them. A failed
    /// commit is reported and returned as `changed && !committed`; it never
    /// stops the caller.
    pub async fn maybe_edit(
        &self,
        target: EditTarget,
        text: &str,
        attachments: &[Attachment],
    ) -> EditOutcome {
        let mut outcome = EditOutcome {
            kind: target.kind,
            id: target.id,
            changed: false,
            committed: false,
        };

        let Some(new_text) = substitute(text, self.old_link, self.new_link) else {
            tracing::debug!("{} {} unchanged, skipping", target.kind, target.id);
            return outcome;
        };
        outcome.changed = true;

        let reporter = self.gateway.reporter();
        let (attachments, skipped) = attachment_list(attachments);
        if skipped > 0 {
            reporter.warn(format!(
                "{} {}: {} attachment(s) without an id cannot be kept",
                target.kind, target.id, skipped
            ));
        }

        reporter.info(format!("Editing {} {}...", target.kind, target.id));
        let result = match target.kind {
            TargetKind::Post => {
                self.gateway
                    .wall_edit(target.owner, target.id, &new_text, attachments.as_deref())
                    .await
            }
            TargetKind::Comment => {
                self.gateway
                    .wall_edit_comment(target.owner, target.id, &new_text, attachments.as_deref())
                    .await
            }
        };

        match result {
            Ok(()) => outcome.committed = true,
            Err(e) => reporter.error(format!(
                "Failed to edit {} {}: {}",
                target.kind, target.id, e
            )),
        }

        outcome
    }
}
