/// Authorization module for post-service
///
/// Ownership-based permission checks for posts and comments.
use crate::error::{AppError, Result};
use crate::models::{Comment, Post};
use uuid::Uuid;

/// Only the owner can delete their own posts
pub fn check_post_deletion(user_id: Uuid, post: &Post) -> Result<()> {
    if post.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "User is not authorized to delete this post".to_string(),
        ))
    }
}

/// A comment can be removed by its author or by the owner of the post it is on
pub fn check_comment_removal(user_id: Uuid, post: &Post, comment: &Comment) -> Result<()> {
    if comment.user == user_id || post.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "User is not authorized to remove this comment".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Caller;

    fn caller(name: &str) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            name: name.to_string(),
            avatar: String::new(),
        }
    }

    #[test]
    fn only_owner_deletes_post() {
        let owner = caller("owner");
        let post = Post::new(&owner, "mine".to_string());

        assert!(check_post_deletion(owner.id, &post).is_ok());
        assert!(matches!(
            check_post_deletion(Uuid::new_v4(), &post),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn comment_author_or_post_owner_removes_comment() {
        let owner = caller("owner");
        let commenter = caller("commenter");
        let stranger = caller("stranger");
        let post = Post::new(&owner, "thread".to_string());
        let comment = Comment::new(&commenter, "reply".to_string());

        assert!(check_comment_removal(commenter.id, &post, &comment).is_ok());
        assert!(check_comment_removal(owner.id, &post, &comment).is_ok());
        assert!(check_comment_removal(stranger.id, &post, &comment).is_err());
    }
}
