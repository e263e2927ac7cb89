use super::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{Comment, Like, Post};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// In-process post store.
///
/// Each mutation runs while holding the DashMap write guard for the post's
/// key, so the presence check and the update happen under one lock and
/// mutations on the same post are serialized.
pub struct InMemoryPostRepository {
    posts: DashMap<Uuid, Post>,
    available: AtomicBool,
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the storage backend.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::StorageUnavailable(
                "in-memory store is offline".to_string(),
            ))
        }
    }

    /// Apply `mutate` to the post under its write guard and return the result.
    fn update<F>(&self, id: Uuid, mutate: F) -> Result<Post>
    where
        F: FnOnce(&mut Post) -> Result<()>,
    {
        self.ensure_available()?;

        let mut entry = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        mutate(entry.value_mut())?;
        Ok(entry.value().clone())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self) -> Result<Vec<Post>> {
        self.ensure_available()?;

        let mut posts: Vec<Post> = self.posts.iter().map(|e| e.value().clone()).collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>> {
        self.ensure_available()?;
        Ok(self.posts.get(&id).map(|e| e.value().clone()))
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        self.ensure_available()?;
        self.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.posts.remove(&id).is_some())
    }

    async fn push_like(&self, id: Uuid, user: Uuid) -> Result<Post> {
        self.update(id, |post| {
            if post.is_liked_by(user) {
                return Err(AppError::AlreadyLiked);
            }
            post.likes.insert(0, Like { user });
            Ok(())
        })
    }

    async fn pull_like(&self, id: Uuid, user: Uuid) -> Result<Post> {
        self.update(id, |post| {
            let index = post
                .likes
                .iter()
                .position(|like| like.user == user)
                .ok_or(AppError::NotLiked)?;
            post.likes.remove(index);
            Ok(())
        })
    }

    async fn push_comment(&self, id: Uuid, comment: &Comment) -> Result<Post> {
        self.update(id, |post| {
            post.comments.insert(0, comment.clone());
            Ok(())
        })
    }

    async fn pull_comment(&self, id: Uuid, comment_id: Uuid) -> Result<Post> {
        self.update(id, |post| {
            let index = post
                .comments
                .iter()
                .position(|c| c.id == comment_id)
                .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;
            post.comments.remove(index);
            Ok(())
        })
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_available()
    }
}
