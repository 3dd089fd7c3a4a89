//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use fable_core::domain::{
    Comment, CommentAuthor, CommentWithAuthor, Post, Reaction, ReactionCounts, ReactionType, User,
};
use fable_core::error::RepoError;
use fable_core::ports::{
    CommentRepository, PageBoundary, PostRepository, ReactionRepository, UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::reaction::{self, Entity as ReactionEntity, ReactionKind};
use super::entity::user::{self, Entity as UserEntity};

/// Map a SeaORM error, surfacing unique-constraint violations so the
/// caller can translate them to a conflict instead of a generic failure.
fn map_db_err(e: DbErr) -> RepoError {
    let msg = e.to_string();
    if msg.contains("duplicate") || msg.contains("unique") {
        RepoError::Constraint(msg)
    } else {
        RepoError::Query(msg)
    }
}

/// Mask an email for logging to avoid PII in logs. Works on characters,
/// not bytes, so a multi-byte local part is safe.
pub(crate) fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let mut chars = local.chars();
        let masked_local = match (chars.next(), chars.next()) {
            (Some(first), Some(_)) => format!("{first}***"),
            _ => "***".to_string(),
        };
        format!("{masked_local}{domain}")
    } else {
        "***".to_string()
    }
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = user.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = user.into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => RepoError::Query(other.to_string()),
        })?;
        Ok(model.into())
    }
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let active: post::ActiveModel = post.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let active: post::ActiveModel = post.into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => RepoError::Query(other.to_string()),
        })?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // Comments and reactions go with the post via ON DELETE CASCADE,
        // making the whole removal a single atomic statement.
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn page_after(
        &self,
        boundary: Option<PageBoundary>,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find();

        // Keyset condition: strictly after (created_at, id) in descending
        // order, so pagination stays stable under concurrent inserts.
        if let Some(b) = boundary {
            query = query.filter(
                Condition::any()
                    .add(post::Column::CreatedAt.lt(b.created_at))
                    .add(
                        Condition::all()
                            .add(post::Column::CreatedAt.eq(b.created_at))
                            .add(post::Column::Id.lt(b.id)),
                    ),
            );
        }

        let rows = query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// PostgreSQL comment repository.
pub struct PostgresCommentRepository {
    db: DbConn,
}

impl PostgresCommentRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn with_author(model: comment::Model, author: user::Model) -> CommentWithAuthor {
    CommentWithAuthor {
        id: model.id,
        body: model.body,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
        author: CommentAuthor {
            id: author.id,
            email: author.email,
        },
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn insert(&self, comment: Comment) -> Result<CommentWithAuthor, RepoError> {
        let author_id = comment.author_id;
        let active: comment::ActiveModel = comment.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;

        let author = UserEntity::find_by_id(author_id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .ok_or(RepoError::NotFound)?;

        Ok(with_author(model, author))
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        rows.into_iter()
            .map(|(model, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Query(format!("comment {} has no author row", model.id))
                })?;
                Ok(with_author(model, author))
            })
            .collect()
    }

    async fn count_by_post(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        let rows: Vec<(Uuid, i64)> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "count")
            .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(comment::Column::PostId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
    }
}

/// PostgreSQL reaction repository.
pub struct PostgresReactionRepository {
    db: DbConn,
}

impl PostgresReactionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReactionRepository for PostgresReactionRepository {
    async fn upsert(&self, reaction: Reaction) -> Result<Reaction, RepoError> {
        let active: reaction::ActiveModel = reaction.clone().into();

        // Single-statement upsert on the composite key keeps the
        // one-reaction-per-user-per-post invariant under concurrency.
        ReactionEntity::insert(active)
            .on_conflict(
                OnConflict::columns([reaction::Column::UserId, reaction::Column::PostId])
                    .update_column(reaction::Column::Kind)
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(reaction)
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let result = ReactionEntity::delete_many()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn counts_by_post(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionCounts>, RepoError> {
        let rows: Vec<(Uuid, ReactionKind, i64)> = ReactionEntity::find()
            .select_only()
            .column(reaction::Column::PostId)
            .column(reaction::Column::Kind)
            .column_as(reaction::Column::UserId.count(), "count")
            .filter(reaction::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(reaction::Column::PostId)
            .group_by(reaction::Column::Kind)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let mut map: HashMap<Uuid, ReactionCounts> = HashMap::new();
        for (post_id, kind, count) in rows {
            let counts = map.entry(post_id).or_default();
            match kind {
                ReactionKind::Like => counts.likes = count as u64,
                ReactionKind::Dislike => counts.dislikes = count as u64,
            }
        }

        Ok(map)
    }

    async fn find_for_viewer(
        &self,
        viewer_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ReactionType>, RepoError> {
        let rows = ReactionEntity::find()
            .filter(reaction::Column::UserId.eq(viewer_id))
            .filter(reaction::Column::PostId.is_in(post_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|model| (model.post_id, model.kind.into()))
            .collect())
    }
}
