use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of reaction a user can leave on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionType {
    Like,
    Dislike,
}

/// Reaction entity - at most one per (user, post), enforced by the
/// store's composite key. Setting a new type overwrites the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
}

/// Per-post aggregate of reaction counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionCounts {
    pub likes: u64,
    pub dislikes: u64,
}
