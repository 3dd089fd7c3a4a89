//! Data Transfer Objects - request/response types for the API.
//!
//! All JSON is camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fable_core::domain::{Post, ReactionType, Role, User};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user's public projection. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The verified session identity, as returned by `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Request to create a post (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

/// Partial post update (admin only). Omitted fields keep their value;
/// supplied fields are re-validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A single post, as returned by the CRUD endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Feed listing query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Uuid>,
}

/// Request to comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// Request to set the caller's reaction on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetReactionRequest {
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
}

/// Body for endpoints that acknowledge without returning an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_is_camel_case_and_hash_free() {
        let user = User::new("a@x.com".into(), "$argon2$secret".into(), Role::User);
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["role"], "USER");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn reaction_request_uses_type_field() {
        let req: SetReactionRequest = serde_json::from_str(r#"{"type":"LIKE"}"#).unwrap();
        assert_eq!(req.reaction_type, ReactionType::Like);

        assert!(serde_json::from_str::<SetReactionRequest>(r#"{"type":"MEH"}"#).is_err());
    }
}
