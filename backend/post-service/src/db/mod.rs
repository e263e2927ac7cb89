/// Document storage for posts
///
/// `PostRepository` exposes each mutation as one atomic storage primitive
/// (push-if-absent, pull) so that concurrent likes and comments on the same
/// post cannot lose updates.
///
/// - `post_repo`: PostgreSQL implementation (row lock per post)
/// - `memory`: in-process implementation (shard lock per post)
pub mod memory;
pub mod post_repo;

pub use memory::InMemoryPostRepository;
pub use post_repo::PgPostRepository;

use crate::error::Result;
use crate::models::{Comment, Post};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<Post>>;

    async fn find(&self, id: Uuid) -> Result<Option<Post>>;

    async fn insert(&self, post: &Post) -> Result<()>;

    /// Hard delete. Returns false when no post had that id.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Prepend a like by `user`.
    ///
    /// Fails with `NotFound` or `AlreadyLiked`; the presence check and the
    /// insert are one atomic step.
    async fn push_like(&self, id: Uuid, user: Uuid) -> Result<Post>;

    /// Remove `user`'s like. Fails with `NotFound` or `NotLiked`.
    async fn pull_like(&self, id: Uuid, user: Uuid) -> Result<Post>;

    /// Prepend `comment`. Fails with `NotFound`.
    async fn push_comment(&self, id: Uuid, comment: &Comment) -> Result<Post>;

    /// Remove exactly one comment. Fails with `NotFound` or `CommentNotFound`.
    async fn pull_comment(&self, id: Uuid, comment_id: Uuid) -> Result<Post>;

    /// Round trip to storage for readiness probes.
    async fn ping(&self) -> Result<()>;
}
