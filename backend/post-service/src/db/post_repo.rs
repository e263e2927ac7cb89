use super::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{Comment, Like, Post};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db_pool::acquire_with_metrics;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, FromRow, PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

const SERVICE_NAME: &str = "post-service";

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    text: String,
    name: String,
    avatar: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LikeRow {
    post_id: Uuid,
    user_id: Uuid,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    user_id: Uuid,
    text: String,
    name: String,
    avatar: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            user: row.user_id,
            text: row.text,
            name: row.name,
            avatar: row.avatar,
            date: row.created_at,
        }
    }
}

fn assemble(row: PostRow, likes: Vec<Like>, comments: Vec<Comment>) -> Post {
    Post {
        id: row.id,
        user: row.user_id,
        text: row.text,
        name: row.name,
        avatar: row.avatar,
        likes,
        comments,
        date: row.created_at,
    }
}

/// PostgreSQL-backed post store.
///
/// Every mutation runs in its own transaction that first takes
/// `SELECT ... FOR UPDATE` on the post row, which serializes mutations per
/// post id. Likes rely on the `(post_id, user_id)` primary key with
/// `ON CONFLICT DO NOTHING`, so "at most one like per user" also holds at the
/// schema level. Reads span three statements and run in a read-only
/// `REPEATABLE READ` transaction so a post and its children come from one
/// snapshot. All connections are taken through `acquire_with_metrics`.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("post-service migrations applied");
        Ok(())
    }

    async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        Ok(acquire_with_metrics(&self.pool, SERVICE_NAME).await?)
    }

    async fn begin_snapshot(conn: &mut PgConnection) -> Result<Transaction<'_, Postgres>> {
        let mut tx = conn.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn lock_post(conn: &mut PgConnection, id: Uuid) -> Result<()> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        locked
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn load_post(conn: &mut PgConnection, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, user_id, text, name, avatar, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let likes = sqlx::query_as::<_, LikeRow>(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|l| Like { user: l.user_id })
        .collect();

        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, user_id, text, name, avatar, created_at
            FROM post_comments
            WHERE post_id = $1
            ORDER BY seq DESC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Comment::from)
        .collect();

        Ok(Some(assemble(row, likes, comments)))
    }

    async fn reload(conn: &mut PgConnection, id: Uuid) -> Result<Post> {
        Self::load_post(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn list(&self) -> Result<Vec<Post>> {
        let mut conn = self.acquire().await?;
        let mut tx = Self::begin_snapshot(&mut conn).await?;

        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, user_id, text, name, avatar, created_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            tx.commit().await?;
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let mut likes: HashMap<Uuid, Vec<Like>> = HashMap::new();
        for like in sqlx::query_as::<_, LikeRow>(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY seq DESC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&mut *tx)
        .await?
        {
            likes
                .entry(like.post_id)
                .or_default()
                .push(Like { user: like.user_id });
        }

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, user_id, text, name, avatar, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY seq DESC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&mut *tx)
        .await?
        {
            comments
                .entry(comment.post_id)
                .or_default()
                .push(Comment::from(comment));
        }

        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                assemble(
                    row,
                    likes.remove(&id).unwrap_or_default(),
                    comments.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>> {
        let mut conn = self.acquire().await?;
        let mut tx = Self::begin_snapshot(&mut conn).await?;
        let post = Self::load_post(&mut tx, id).await?;
        tx.commit().await?;
        Ok(post)
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        let mut conn = self.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, text, name, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.id)
        .bind(post.user)
        .bind(&post.text)
        .bind(&post.name)
        .bind(&post.avatar)
        .bind(post.date)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Likes and comments go with it via ON DELETE CASCADE
        let mut conn = self.acquire().await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_like(&self, id: Uuid, user: Uuid) -> Result<Post> {
        let mut conn = self.acquire().await?;
        let mut tx = conn.begin().await?;
        Self::lock_post(&mut tx, id).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(AppError::AlreadyLiked);
        }

        let post = Self::reload(&mut tx, id).await?;
        tx.commit().await?;
        Ok(post)
    }

    async fn pull_like(&self, id: Uuid, user: Uuid) -> Result<Post> {
        let mut conn = self.acquire().await?;
        let mut tx = conn.begin().await?;
        Self::lock_post(&mut tx, id).await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(AppError::NotLiked);
        }

        let post = Self::reload(&mut tx, id).await?;
        tx.commit().await?;
        Ok(post)
    }

    async fn push_comment(&self, id: Uuid, comment: &Comment) -> Result<Post> {
        let mut conn = self.acquire().await?;
        let mut tx = conn.begin().await?;
        Self::lock_post(&mut tx, id).await?;

        sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, user_id, text, name, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id)
        .bind(id)
        .bind(comment.user)
        .bind(&comment.text)
        .bind(&comment.name)
        .bind(&comment.avatar)
        .bind(comment.date)
        .execute(&mut *tx)
        .await?;

        let post = Self::reload(&mut tx, id).await?;
        tx.commit().await?;
        Ok(post)
    }

    async fn pull_comment(&self, id: Uuid, comment_id: Uuid) -> Result<Post> {
        let mut conn = self.acquire().await?;
        let mut tx = conn.begin().await?;
        Self::lock_post(&mut tx, id).await?;

        let removed = sqlx::query("DELETE FROM post_comments WHERE id = $1 AND post_id = $2")
            .bind(comment_id)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(AppError::CommentNotFound(comment_id.to_string()));
        }

        let post = Self::reload(&mut tx, id).await?;
        tx.commit().await?;
        Ok(post)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}
