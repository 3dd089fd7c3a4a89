//! Application state - shared across all handlers.

use std::sync::Arc;

use chrono::Utc;

use fable_core::domain::{Role, User, normalize_email};
use fable_core::error::DomainError;
use fable_core::feed::FeedService;
use fable_core::ports::{
    CommentRepository, PasswordService, PostRepository, ReactionRepository, UserRepository,
};
use fable_infra::database::{
    InMemoryStore, PostgresCommentRepository, PostgresPostRepository, PostgresReactionRepository,
    PostgresUserRepository, connect,
};
use fable_infra::DatabaseConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub feed: Arc<FeedService>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        match db_config {
            Some(config) => match connect(config).await {
                Ok(db) => {
                    let users: Arc<dyn UserRepository> =
                        Arc::new(PostgresUserRepository::new(db.clone()));
                    let posts: Arc<dyn PostRepository> =
                        Arc::new(PostgresPostRepository::new(db.clone()));
                    let comments: Arc<dyn CommentRepository> =
                        Arc::new(PostgresCommentRepository::new(db.clone()));
                    let reactions: Arc<dyn ReactionRepository> =
                        Arc::new(PostgresReactionRepository::new(db));
                    Self::assemble(users, posts, comments, reactions)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    Self::in_memory()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Self::in_memory()
            }
        }
    }

    /// State backed entirely by the in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::assemble(store.clone(), store.clone(), store.clone(), store)
    }

    fn assemble(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        reactions: Arc<dyn ReactionRepository>,
    ) -> Self {
        let feed = Arc::new(FeedService::new(
            posts.clone(),
            comments.clone(),
            reactions.clone(),
        ));
        tracing::info!("Application state initialized");
        Self {
            users,
            posts,
            comments,
            reactions,
            feed,
        }
    }

    /// Upsert the seeded admin account: role and password are reset if the
    /// user already exists. Registration never grants ADMIN; this is the
    /// only elevation path.
    pub async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        passwords: &dyn PasswordService,
    ) -> Result<(), DomainError> {
        let email = normalize_email(email);
        let password_hash = passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        match self.users.find_by_email(&email).await? {
            Some(mut user) => {
                user.role = Role::Admin;
                user.password_hash = password_hash;
                user.updated_at = Utc::now();
                self.users.update(user).await?;
            }
            None => {
                self.users
                    .insert(User::new(email, password_hash, Role::Admin))
                    .await?;
            }
        }

        tracing::info!("Admin user seeded");
        Ok(())
    }
}
