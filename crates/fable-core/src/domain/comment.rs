use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - authored by a registered user on a post.
/// Comments are immutable once created; deleting the post removes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment. Body is expected to be validated (non-empty).
    pub fn new(post_id: Uuid, author_id: Uuid, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public projection of a comment author. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: Uuid,
    pub email: String,
}

/// A comment joined with its author projection, as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: CommentAuthor,
}
