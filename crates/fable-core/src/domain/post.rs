use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 150;
pub const CONTENT_MIN_LEN: usize = 1;
pub const CONTENT_MAX_LEN: usize = 20_000;

/// Post entity - a platform-authored article. Posts carry no author
/// column; only admins may create or mutate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. Title and content are expected to be validated.
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check a title against the platform length bounds.
    pub fn validate_title(title: &str) -> Result<(), String> {
        let len = title.chars().count();
        if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
            return Err(format!(
                "title must be between {TITLE_MIN_LEN} and {TITLE_MAX_LEN} characters"
            ));
        }
        Ok(())
    }

    /// Check content against the platform length bounds.
    pub fn validate_content(content: &str) -> Result<(), String> {
        let len = content.chars().count();
        if !(CONTENT_MIN_LEN..=CONTENT_MAX_LEN).contains(&len) {
            return Err(format!(
                "content must be between {CONTENT_MIN_LEN} and {CONTENT_MAX_LEN} characters"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(Post::validate_title("ab").is_err());
        assert!(Post::validate_title("abc").is_ok());
        assert!(Post::validate_title(&"x".repeat(150)).is_ok());
        assert!(Post::validate_title(&"x".repeat(151)).is_err());
    }

    #[test]
    fn content_bounds() {
        assert!(Post::validate_content("").is_err());
        assert!(Post::validate_content("c").is_ok());
        assert!(Post::validate_content(&"x".repeat(20_001)).is_err());
    }
}
