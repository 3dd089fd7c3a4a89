//! Post handlers: the public and authenticated feeds plus admin CRUD.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use fable_core::domain::Post;
use fable_core::feed::FeedOptions;
use fable_shared::dto::{
    CreatePostRequest, FeedQuery, OkResponse, PostResponse, UpdatePostRequest,
};

use crate::middleware::auth::{ADMIN_ONLY, AUTHENTICATED, Identity, authorize};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /posts - public feed, `myReaction` omitted.
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .feed
        .list(FeedOptions {
            limit: query.limit,
            cursor: query.cursor,
            viewer_id: None,
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /posts/me - authenticated feed with the caller's own reaction.
pub async fn list_me(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    authorize(&AUTHENTICATED, Some(&identity))?;

    let page = state
        .feed
        .list(FeedOptions {
            limit: query.limit,
            cursor: query.cursor,
            viewer_id: Some(identity.user_id),
        })
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /posts/{id}
pub async fn get_by_id(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// POST /posts - admin only.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    authorize(&ADMIN_ONLY, Some(&identity))?;

    let req = body.into_inner();
    Post::validate_title(&req.title).map_err(AppError::BadRequest)?;
    Post::validate_content(&req.content).map_err(AppError::BadRequest)?;

    let post = state.posts.insert(Post::new(req.title, req.content)).await?;

    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// PATCH /posts/{id} - admin only, partial update.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    authorize(&ADMIN_ONLY, Some(&identity))?;

    let id = path.into_inner();
    let req = body.into_inner();

    // Fetch first so a missing post is a 404, not a silent no-op update.
    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;

    // Only supplied fields change; each supplied field is re-validated,
    // so an explicit empty string fails the min-length check.
    if let Some(title) = req.title {
        Post::validate_title(&title).map_err(AppError::BadRequest)?;
        post.title = title;
    }
    if let Some(content) = req.content {
        Post::validate_content(&content).map_err(AppError::BadRequest)?;
        post.content = content;
    }
    post.updated_at = Utc::now();

    let updated = state.posts.update(post).await?;

    Ok(HttpResponse::Ok().json(PostResponse::from(updated)))
}

/// DELETE /posts/{id} - admin only. Comments and reactions go with it.
pub async fn remove(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    authorize(&ADMIN_ONLY, Some(&identity))?;

    let id = path.into_inner();
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;

    state.posts.delete(id).await?;

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}
