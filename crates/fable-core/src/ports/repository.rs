use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Comment, CommentWithAuthor, Post, Reaction, ReactionCounts, ReactionType, User,
};
use crate::error::RepoError;

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new user. A duplicate email surfaces as
    /// [`RepoError::Constraint`] from the unique index, not a pre-check.
    async fn insert(&self, user: User) -> Result<User, RepoError>;

    /// Overwrite an existing user row (seed path: role / password reset).
    async fn update(&self, user: User) -> Result<User, RepoError>;
}

/// Exclusive keyset boundary for feed pagination: the position of the
/// last-seen post in `(created_at DESC, id DESC)` order.
#[derive(Debug, Clone, Copy)]
pub struct PageBoundary {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl From<&Post> for PageBoundary {
    fn from(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            id: post.id,
        }
    }
}

/// Post repository.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn insert(&self, post: Post) -> Result<Post, RepoError>;

    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    /// Delete a post together with its comments and reactions, atomically.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Fetch up to `limit` posts ordered `created_at DESC, id DESC`,
    /// strictly after `boundary` when one is given.
    async fn page_after(
        &self,
        boundary: Option<PageBoundary>,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment and return it joined with its author projection.
    async fn insert(&self, comment: Comment) -> Result<CommentWithAuthor, RepoError>;

    /// Comments of a post ascending by creation time, authors projected.
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError>;

    /// Comment counts grouped by post for exactly the given ids.
    /// Posts without comments are simply absent from the map.
    async fn count_by_post(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError>;
}

/// Reaction repository.
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Insert-or-update keyed on (user_id, post_id); last write wins.
    async fn upsert(&self, reaction: Reaction) -> Result<Reaction, RepoError>;

    /// Delete a user's reaction to a post. Returns whether a row existed.
    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;

    /// Like/dislike counts grouped by post for exactly the given ids.
    async fn counts_by_post(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionCounts>, RepoError>;

    /// The given viewer's reactions restricted to the given post ids.
    async fn find_for_viewer(
        &self,
        viewer_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionType>, RepoError>;
}
