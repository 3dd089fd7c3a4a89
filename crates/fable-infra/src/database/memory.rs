//! In-memory repositories.
//!
//! Used when `DATABASE_URL` is not configured, and as the substrate for
//! HTTP-level tests. One store implements every repository port so the
//! cascade and uniqueness invariants hold across entities, mirroring what
//! the Postgres schema enforces with constraints.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use fable_core::domain::{
    Comment, CommentAuthor, CommentWithAuthor, Post, Reaction, ReactionCounts, ReactionType, User,
};
use fable_core::error::RepoError;
use fable_core::ports::{
    CommentRepository, PageBoundary, PostRepository, ReactionRepository, UserRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<Vec<User>>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
    reactions: RwLock<Vec<Reaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().unwrap();
        // The unique email index, expressed as a check under the same lock.
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("unique email".to_string()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        self.posts.write().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().unwrap();
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // All three locks held together: no observer sees the post gone
        // while its comments or reactions linger.
        let mut posts = self.posts.write().unwrap();
        let mut comments = self.comments.write().unwrap();
        let mut reactions = self.reactions.write().unwrap();

        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        comments.retain(|c| c.post_id != id);
        reactions.retain(|r| r.post_id != id);
        Ok(())
    }

    async fn page_after(
        &self,
        boundary: Option<PageBoundary>,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let mut rows: Vec<Post> = self.posts.read().unwrap().clone();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        if let Some(b) = boundary {
            rows.retain(|p| (p.created_at, p.id) < (b.created_at, b.id));
        }
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

impl InMemoryStore {
    fn author_projection(&self, author_id: Uuid) -> Result<CommentAuthor, RepoError> {
        let users = self.users.read().unwrap();
        let author = users
            .iter()
            .find(|u| u.id == author_id)
            .ok_or(RepoError::NotFound)?;
        Ok(CommentAuthor {
            id: author.id,
            email: author.email.clone(),
        })
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert(&self, comment: Comment) -> Result<CommentWithAuthor, RepoError> {
        let author = self.author_projection(comment.author_id)?;
        self.comments.write().unwrap().push(comment.clone());
        Ok(CommentWithAuthor {
            id: comment.id,
            body: comment.body,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author,
        })
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let mut rows: Vec<Comment> = self
            .comments
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));

        rows.into_iter()
            .map(|c| {
                let author = self.author_projection(c.author_id)?;
                Ok(CommentWithAuthor {
                    id: c.id,
                    body: c.body,
                    created_at: c.created_at,
                    updated_at: c.updated_at,
                    author,
                })
            })
            .collect()
    }

    async fn count_by_post(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        let mut map = HashMap::new();
        for comment in self.comments.read().unwrap().iter() {
            if post_ids.contains(&comment.post_id) {
                *map.entry(comment.post_id).or_insert(0) += 1;
            }
        }
        Ok(map)
    }
}

#[async_trait]
impl ReactionRepository for InMemoryStore {
    async fn upsert(&self, reaction: Reaction) -> Result<Reaction, RepoError> {
        let mut reactions = self.reactions.write().unwrap();
        match reactions
            .iter_mut()
            .find(|r| r.user_id == reaction.user_id && r.post_id == reaction.post_id)
        {
            Some(existing) => existing.reaction_type = reaction.reaction_type,
            None => reactions.push(reaction.clone()),
        }
        Ok(reaction)
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut reactions = self.reactions.write().unwrap();
        let before = reactions.len();
        reactions.retain(|r| !(r.user_id == user_id && r.post_id == post_id));
        Ok(reactions.len() != before)
    }

    async fn counts_by_post(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionCounts>, RepoError> {
        let mut map: HashMap<Uuid, ReactionCounts> = HashMap::new();
        for reaction in self.reactions.read().unwrap().iter() {
            if post_ids.contains(&reaction.post_id) {
                let counts = map.entry(reaction.post_id).or_default();
                match reaction.reaction_type {
                    ReactionType::Like => counts.likes += 1,
                    ReactionType::Dislike => counts.dislikes += 1,
                }
            }
        }
        Ok(map)
    }

    async fn find_for_viewer(
        &self,
        viewer_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionType>, RepoError> {
        Ok(self
            .reactions
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == viewer_id && post_ids.contains(&r.post_id))
            .map(|r| (r.post_id, r.reaction_type))
            .collect())
    }
}
