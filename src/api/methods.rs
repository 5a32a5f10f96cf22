//! Typed wrappers for the remote methods the crawler uses

use crate::api::{Comment, Gateway, Page, Params, Post, RemoteError, ResolvedName};
use crate::community::OwnerId;
use serde::de::DeserializeOwned;
use serde_json::Value;

impl Gateway {
    /// `wall.get`: one page of an owner's posts
    pub async fn wall_get(
        &self,
        owner: OwnerId,
        offset: u32,
        count: u32,
    ) -> Result<Page<Post>, RemoteError> {
        let params = Params::new()
            .with("owner_id", owner)
            .with("offset", offset)
            .with("count", count)
            .with("extended", 0);
        let value = self.invoke("wall.get", &params).await?;
        decode("wall.get", value)
    }

    /// `wall.edit`: replaces a post's text, re-attaching the given references
    pub async fn wall_edit(
        &self,
        owner: OwnerId,
        post_id: i64,
        message: &str,
        attachments: Option<&str>,
    ) -> Result<(), RemoteError> {
        let mut params = Params::new()
            .with("owner_id", owner)
            .with("post_id", post_id)
            .with("message", message);
        if owner.is_community() {
            params = params.with("from_group", 1);
        }
        if let Some(attachments) = attachments {
            params = params.with("attachments", attachments);
        }
        self.invoke("wall.edit", &params).await.map(drop)
    }

    /// `wall.getComments`: one page of a post's comments with inline threads
    pub async fn wall_get_comments(
        &self,
        owner: OwnerId,
        post_id: i64,
        offset: u32,
        count: u32,
        thread_items: u32,
    ) -> Result<Page<Comment>, RemoteError> {
        let params = Params::new()
            .with("owner_id", owner)
            .with("post_id", post_id)
            .with("offset", offset)
            .with("count", count)
            .with("need_likes", 0)
            .with("need_threads", 1)
            .with("thread_items", thread_items);
        let value = self.invoke("wall.getComments", &params).await?;
        decode("wall.getComments", value)
    }

    /// `wall.editComment`: replaces a comment's text
    pub async fn wall_edit_comment(
        &self,
        owner: OwnerId,
        comment_id: i64,
        message: &str,
        attachments: Option<&str>,
    ) -> Result<(), RemoteError> {
        let mut params = Params::new()
            .with("owner_id", owner)
            .with("comment_id", comment_id)
            .with("message", message);
        if let Some(attachments) = attachments {
            params = params.with("attachments", attachments);
        }
        self.invoke("wall.editComment", &params).await.map(drop)
    }

    /// `utils.resolveScreenName`
    ///
    /// Unknown names come back as an empty list rather than an error, which
    /// maps to `Ok(None)`.
    pub async fn resolve_screen_name(
        &self,
        screen_name: &str,
    ) -> Result<Option<ResolvedName>, RemoteError> {
        let params = Params::new().with("screen_name", screen_name);
        let value = self.invoke("utils.resolveScreenName", &params).await?;
        if !value.is_object() {
            return Ok(None);
        }
        decode("utils.resolveScreenName", value).map(Some)
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value)
        .map_err(|e| RemoteError::protocol(format!("Unexpected {} reply: {}", method, e)))
}
