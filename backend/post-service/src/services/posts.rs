/// Post service - creation, retrieval, deletion, likes and comments
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::metrics::posts::record_operation;
use crate::middleware::permissions::{check_comment_removal, check_post_deletion};
use crate::models::{Caller, Comment, Post};
use crate::services::validation::{validate_text, DEFAULT_MAX_TEXT_LENGTH};
use std::sync::Arc;
use uuid::Uuid;

/// The post store.
///
/// Validation and authorization happen here; every state change is handed to
/// the repository as a single atomic primitive. Nothing is retried: a
/// `Conflict` from storage goes straight back to the caller.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    max_text_length: usize,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self {
            repo,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }

    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    pub fn repository(&self) -> &Arc<dyn PostRepository> {
        &self.repo
    }

    /// All posts, newest first. An empty store yields an empty list.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let result = self.repo.list().await;
        record_operation("list_posts", &result);
        result
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        let result = self.find_post(post_id).await;
        record_operation("get_post", &result);
        result
    }

    pub async fn create_post(&self, caller: &Caller, text: Option<&str>) -> Result<Post> {
        let result = self.create_post_inner(caller, text).await;
        record_operation("create_post", &result);
        result
    }

    async fn create_post_inner(&self, caller: &Caller, text: Option<&str>) -> Result<Post> {
        let text = validate_text(text, self.max_text_length)?;
        let post = Post::new(caller, text);
        self.repo.insert(&post).await?;

        tracing::info!(post_id = %post.id, user_id = %caller.id, "post created");
        Ok(post)
    }

    pub async fn delete_post(&self, caller: &Caller, post_id: Uuid) -> Result<()> {
        let result = self.delete_post_inner(caller, post_id).await;
        record_operation("delete_post", &result);
        result
    }

    async fn delete_post_inner(&self, caller: &Caller, post_id: Uuid) -> Result<()> {
        let post = self.find_post(post_id).await?;

        if let Err(err) = check_post_deletion(caller.id, &post) {
            tracing::warn!(%post_id, user_id = %caller.id, owner = %post.user, "post delete refused");
            return Err(err);
        }

        if !self.repo.delete(post_id).await? {
            // Removed by a concurrent request between lookup and delete
            return Err(AppError::NotFound(post_id.to_string()));
        }

        tracing::info!(%post_id, user_id = %caller.id, "post deleted");
        Ok(())
    }

    pub async fn like_post(&self, caller: &Caller, post_id: Uuid) -> Result<Post> {
        let result = self.repo.push_like(post_id, caller.id).await;
        record_operation("like_post", &result);

        if result.is_ok() {
            tracing::debug!(%post_id, user_id = %caller.id, "post liked");
        }
        result
    }

    pub async fn unlike_post(&self, caller: &Caller, post_id: Uuid) -> Result<Post> {
        let result = self.repo.pull_like(post_id, caller.id).await;
        record_operation("unlike_post", &result);

        if result.is_ok() {
            tracing::debug!(%post_id, user_id = %caller.id, "post unliked");
        }
        result
    }

    pub async fn add_comment(
        &self,
        caller: &Caller,
        post_id: Uuid,
        text: Option<&str>,
    ) -> Result<Post> {
        let result = self.add_comment_inner(caller, post_id, text).await;
        record_operation("add_comment", &result);
        result
    }

    async fn add_comment_inner(
        &self,
        caller: &Caller,
        post_id: Uuid,
        text: Option<&str>,
    ) -> Result<Post> {
        let text = validate_text(text, self.max_text_length)?;
        let comment = Comment::new(caller, text);
        let post = self.repo.push_comment(post_id, &comment).await?;

        tracing::debug!(%post_id, comment_id = %comment.id, user_id = %caller.id, "comment added");
        Ok(post)
    }

    pub async fn remove_comment(
        &self,
        caller: &Caller,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Post> {
        let result = self.remove_comment_inner(caller, post_id, comment_id).await;
        record_operation("remove_comment", &result);
        result
    }

    async fn remove_comment_inner(
        &self,
        caller: &Caller,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Post> {
        let post = self.find_post(post_id).await?;
        let comment = post
            .comment(comment_id)
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        check_comment_removal(caller.id, &post, comment)?;

        // Author and owner are immutable, so the check above stays valid; the
        // pull still reports CommentNotFound if another request got there first.
        let post = self.repo.pull_comment(post_id, comment_id).await?;

        tracing::debug!(%post_id, %comment_id, user_id = %caller.id, "comment removed");
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post> {
        self.repo
            .find(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(post_id.to_string()))
    }
}
