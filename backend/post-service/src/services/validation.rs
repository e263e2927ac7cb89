/// Input validation for post and comment bodies
use crate::error::{AppError, Result};

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 300;

/// Check a post or comment body and return it unchanged.
///
/// The text is required, must contain something other than whitespace, and
/// may be at most `max_len` characters long.
pub fn validate_text(text: Option<&str>, max_len: usize) -> Result<String> {
    let text = text.unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::validation("text", "Text field is required"));
    }

    if text.chars().count() > max_len {
        return Err(AppError::validation(
            "text",
            format!("Post must be at most {max_len} characters"),
        ));
    }

    Ok(text.to_string())
}
