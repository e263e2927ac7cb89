/// Business logic layer
///
/// - `posts`: the post store operations with ownership and like/unlike rules
/// - `validation`: input rules shared by posts and comments
pub mod posts;
pub mod validation;

pub use posts::PostService;
pub use validation::{validate_text, DEFAULT_MAX_TEXT_LENGTH};
