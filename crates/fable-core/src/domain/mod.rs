//! Domain entities - the core business objects.

mod comment;
mod post;
mod reaction;
mod user;

pub use comment::{Comment, CommentAuthor, CommentWithAuthor};
pub use post::Post;
pub use reaction::{Reaction, ReactionCounts, ReactionType};
pub use user::{Role, User, normalize_email};
