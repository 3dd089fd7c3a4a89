//! Reaction entity for SeaORM. Composite primary key (user_id, post_id)
//! enforces at most one reaction per user per post.

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;

use fable_core::domain::ReactionType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_reactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: Uuid,
    #[sea_orm(column_name = "type")]
    pub kind: ReactionKind,
}

/// Stored representation of [`fable_core::domain::ReactionType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReactionKind {
    #[sea_orm(string_value = "LIKE")]
    Like,
    #[sea_orm(string_value = "DISLIKE")]
    Dislike,
}

impl From<ReactionType> for ReactionKind {
    fn from(value: ReactionType) -> Self {
        match value {
            ReactionType::Like => ReactionKind::Like,
            ReactionType::Dislike => ReactionKind::Dislike,
        }
    }
}

impl From<ReactionKind> for ReactionType {
    fn from(kind: ReactionKind) -> Self {
        match kind {
            ReactionKind::Like => ReactionType::Like,
            ReactionKind::Dislike => ReactionType::Dislike,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Reaction.
impl From<Model> for fable_core::domain::Reaction {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            post_id: model.post_id,
            reaction_type: model.kind.into(),
        }
    }
}

/// Conversion from Domain Reaction to SeaORM ActiveModel.
impl From<fable_core::domain::Reaction> for ActiveModel {
    fn from(reaction: fable_core::domain::Reaction) -> Self {
        Self {
            user_id: Set(reaction.user_id),
            post_id: Set(reaction.post_id),
            kind: Set(reaction.reaction_type.into()),
        }
    }
}
