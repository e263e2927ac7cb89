/// Post handlers - HTTP endpoints for posts, likes and comments
use crate::error::{AppError, Result};
use crate::models::Caller;
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

/// A malformed id cannot name an existing post.
fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(raw.to_string()))
}

fn parse_comment_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::CommentNotFound(raw.to_string()))
}

/// Smoke route
pub async fn posts_test() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "msg": "Posts Works" }))
}

/// List all posts, newest first
pub async fn list_posts(service: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = service.list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Get a post by ID
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let post = service.get_post(post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Create a new post
pub async fn create_post(
    service: web::Data<PostService>,
    caller: Caller,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.create_post(&caller, req.text.as_deref()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post (owner only)
pub async fn delete_post(
    service: web::Data<PostService>,
    caller: Caller,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    service.delete_post(&caller, post_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub async fn like_post(
    service: web::Data<PostService>,
    caller: Caller,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let post = service.like_post(&caller, post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn unlike_post(
    service: web::Data<PostService>,
    caller: Caller,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let post = service.unlike_post(&caller, post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn add_comment(
    service: web::Data<PostService>,
    caller: Caller,
    post_id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let post_id = parse_post_id(&post_id)?;
    let post = service
        .add_comment(&caller, post_id, req.text.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn remove_comment(
    service: web::Data<PostService>,
    caller: Caller,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = parse_post_id(&post_id)?;
    let comment_id = parse_comment_id(&comment_id)?;

    let post = service.remove_comment(&caller, post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(post))
}
