//! Comment handlers, scoped to a post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use fable_core::domain::Comment;
use fable_shared::dto::CreateCommentRequest;

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

/// GET /posts/{postId}/comments - public, ascending by creation time.
pub async fn list(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;

    let comments = state.comments.list_by_post(post_id).await?;

    Ok(HttpResponse::Ok().json(comments))
}

/// POST /posts/{postId}/comments - any authenticated user.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    authorize(&AUTHENTICATED, Some(&identity))?;

    let post_id = path.into_inner();
    let req = body.into_inner();

    if req.body.is_empty() {
        return Err(AppError::BadRequest("Comment body must not be empty".to_string()));
    }

    ensure_post_exists(&state, post_id).await?;

    let comment = state
        .comments
        .insert(Comment::new(post_id, identity.user_id, req.body))
        .await?;

    Ok(HttpResponse::Created().json(comment))
}
