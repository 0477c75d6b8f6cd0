//! Artwork and comment input validation shared by the API handlers.

use crate::error::CoreError;

/// Maximum length of an artwork title (matches the `VARCHAR(255)` column).
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum length of a comment body.
pub const MAX_COMMENT_LEN: usize = 2000;

/// Default upper bound for uploaded artwork files (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Validate an artwork title: non-blank and at most [`MAX_TITLE_LEN`] chars.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a comment body: non-blank and at most [`MAX_COMMENT_LEN`] chars.
pub fn validate_comment(content: &str) -> Result<(), CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Comment must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(CoreError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate an uploaded artwork file size.
pub fn validate_upload_size(len: usize, max_bytes: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::Validation("The uploaded file is empty".into()));
    }
    if len > max_bytes {
        return Err(CoreError::Validation(format!(
            "The file is too large. Maximum size is {max_bytes} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(validate_title("Untitled No. 4").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn comment_bounds() {
        assert!(validate_comment("lovely").is_ok());
        assert!(validate_comment("").is_err());
        assert!(validate_comment(&"y".repeat(MAX_COMMENT_LEN + 1)).is_err());
    }

    #[test]
    fn upload_size_bounds() {
        assert!(validate_upload_size(0, 10).is_err());
        assert!(validate_upload_size(10, 10).is_ok());
        assert!(validate_upload_size(11, 10).is_err());
    }
}
