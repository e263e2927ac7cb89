/// HTTP handlers for post-service
///
/// - Posts: list, read, create and delete posts
/// - Likes and comments on a post
/// - Health: liveness and readiness probes
pub mod health;
pub mod posts;

pub use health::{health_summary, liveness_check, readiness_summary};
pub use posts::{
    add_comment, create_post, delete_post, get_post, like_post, list_posts, posts_test,
    remove_comment, unlike_post,
};

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;
use actix_web::web;

/// Malformed or missing JSON bodies become a validation error on `body`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation("body", err.to_string()).into())
}

/// Health probes, mounted outside authentication.
pub fn configure_health(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health_summary))
        .route("/api/health/ready", web::get().to(readiness_summary))
        .route("/api/health/live", web::get().to(liveness_check));
}

/// Register the `/api/posts` routes.
///
/// Static segments are registered before `/{id}` so they are never captured
/// as an id.
pub fn configure(cfg: &mut web::ServiceConfig, auth: JwtAuthMiddleware) {
    cfg.service(
        web::scope("/api/posts")
            .wrap(auth)
            .app_data(json_config())
            .route("/test", web::get().to(posts_test))
            .service(
                web::resource("")
                    .route(web::get().to(list_posts))
                    .route(web::post().to(create_post)),
            )
            .route("/like/{id}", web::post().to(like_post))
            .route("/unlike/{id}", web::post().to(unlike_post))
            .route("/comment/{id}", web::post().to(add_comment))
            .route(
                "/comment/{id}/{comment_id}",
                web::delete().to(remove_comment),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_post))
                    .route(web::delete().to(delete_post)),
            ),
    );
}
