//! Reaction handlers, scoped to a post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use fable_core::domain::Reaction;
use fable_shared::dto::{OkResponse, SetReactionRequest};

use crate::middleware::auth::{AUTHENTICATED, Identity, authorize};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

async fn ensure_post_exists(state: &AppState, post_id: Uuid) -> Result<(), AppError> {
    state
        .posts
        .find_by_id(post_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))
}

/// POST /posts/{postId}/reactions - upsert the caller's reaction.
pub async fn set(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<SetReactionRequest>,
) -> AppResult<HttpResponse> {
    authorize(&AUTHENTICATED, Some(&identity))?;

    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;

    let reaction = state
        .reactions
        .upsert(Reaction {
            user_id: identity.user_id,
            post_id,
            reaction_type: body.reaction_type,
        })
        .await?;

    Ok(HttpResponse::Created().json(reaction))
}

/// DELETE /posts/{postId}/reactions - remove the caller's reaction.
/// Removing a reaction that does not exist is not an error; only the
/// post itself can 404.
pub async fn remove(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    authorize(&AUTHENTICATED, Some(&identity))?;

    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;

    let existed = state.reactions.delete(identity.user_id, post_id).await?;
    if !existed {
        tracing::debug!(%post_id, "No reaction row to remove");
    }

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}
