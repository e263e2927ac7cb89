/// Data models for post-service
///
/// - `Post`: a user's post with its likes and comments embedded
/// - `Like`: one user's like, unique per post
/// - `Comment`: a reply addressable by its own id
/// - `Caller`: the authenticated identity performing a mutation
use chrono::{DateTime, SubsecRound, Utc};
use crypto_core::Claims;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time at the microsecond precision `TIMESTAMPTZ` stores, so a
/// record reads back exactly as it was created.
fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Authenticated identity, taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

impl Caller {
    pub fn from_claims(claims: &Claims) -> anyhow::Result<Self> {
        Ok(Self {
            id: claims.user_id()?,
            name: claims.name.clone(),
            avatar: claims.avatar.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Like {
    pub user: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl Comment {
    /// New comment authored by `author`, with a fresh id.
    pub fn new(author: &Caller, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: author.id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            date: timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    /// Owner; set at creation and never changed.
    pub user: Uuid,
    pub text: String,
    /// Author display name at creation time.
    pub name: String,
    /// Author avatar at creation time.
    pub avatar: String,
    /// Newest first, at most one entry per user.
    pub likes: Vec<Like>,
    /// Newest first.
    pub comments: Vec<Comment>,
    pub date: DateTime<Utc>,
}

impl Post {
    /// New post owned by `author` with no likes or comments.
    pub fn new(author: &Caller, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: author.id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            likes: Vec::new(),
            comments: Vec::new(),
            date: timestamp(),
        }
    }

    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.user == user
    }

    pub fn is_liked_by(&self, user: Uuid) -> bool {
        self.likes.iter().any(|like| like.user == user)
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> Caller {
        Caller {
            id: Uuid::new_v4(),
            name: "Brad".to_string(),
            avatar: "//gravatar.com/avatar/brad".to_string(),
        }
    }

    #[test]
    fn new_post_snapshots_author() {
        let author = caller();
        let post = Post::new(&author, "Hello devs".to_string());

        assert_eq!(post.user, author.id);
        assert_eq!(post.name, "Brad");
        assert_eq!(post.avatar, author.avatar);
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
        assert!(post.is_owned_by(author.id));
    }

    #[test]
    fn timestamps_have_microsecond_precision() {
        let author = caller();
        let post = Post::new(&author, "a".to_string());
        let comment = Comment::new(&author, "b".to_string());

        assert_eq!(post.date.timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(comment.date.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn comment_ids_differ_from_post_ids() {
        let author = caller();
        let post = Post::new(&author, "a".to_string());
        let comment = Comment::new(&author, "b".to_string());
        assert_ne!(post.id, comment.id);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let author = caller();
        let mut post = Post::new(&author, "json".to_string());
        post.likes.push(Like { user: author.id });

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["user"], author.id.to_string());
        assert_eq!(value["likes"][0]["user"], author.id.to_string());
        assert!(value["date"].is_string());
        assert!(value["comments"].as_array().unwrap().is_empty());
    }
}
