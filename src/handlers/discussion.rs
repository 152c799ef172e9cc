// src/handlers/discussion.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    models::{
        comment::{CreateCommentRequest, NewComment, UpdateCommentRequest},
        film::FilmRef,
        pagination::{FlatListParams, PageParams, PageRequest},
    },
    services::{
        DiscussionService,
        discussion::{MODERATION_PAGE_SIZE, THREAD_PAGE_SIZE, normalize_body},
    },
    store::CommentStore,
    utils::jwt::Claims,
};

/// Loads a film and checks that its discussion is open to the public.
async fn published_film<S: CommentStore>(
    service: &DiscussionService<S>,
    film_id: i64,
) -> Result<FilmRef, AppError> {
    let film = service
        .film(film_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Film not found".to_string()))?;

    if !film.is_published() {
        return Err(AppError::Forbidden(
            "Film is not published; comments are closed".to_string(),
        ));
    }

    Ok(film)
}

/// List the comment thread of a film.
/// Public. Root comments newest first, each with nested replies.
pub async fn list_thread<S: CommentStore>(
    State(service): State<DiscussionService<S>>,
    AppPath(film_id): AppPath<i64>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    published_film(&service, film_id).await?;

    let page = PageRequest::new(params.page, params.limit, THREAD_PAGE_SIZE);
    let thread = service.thread_for_film(film_id, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": thread.items,
        "pagination": thread.pagination,
    })))
}

/// Count all comments of a film.
pub async fn comment_count<S: CommentStore>(
    State(service): State<DiscussionService<S>>,
    AppPath(film_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let count = service.comment_count(film_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "comment_count": count },
    })))
}

/// Post a comment or a reply.
/// Requires: Login. The film must be published.
pub async fn create_comment<S: CommentStore>(
    State(service): State<DiscussionService<S>>,
    Extension(claims): Extension<Claims>,
    AppPath(film_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    normalize_body(&payload.body)?;
    let user_id = claims.user_id()?;

    published_film(&service, film_id).await?;

    let created = service
        .create(NewComment {
            film_id,
            user_id,
            body: payload.body,
            parent_id: payload.parent_id,
        })
        .await?;

    let message = if created.parent_id.is_some() {
        "Reply posted successfully"
    } else {
        "Comment posted successfully"
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": message,
            "data": created,
        })),
    ))
}

/// Edit a comment.
/// Requires: Login + Author.
pub async fn update_comment<S: CommentStore>(
    State(service): State<DiscussionService<S>>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    normalize_body(&payload.body)?;
    let user_id = claims.user_id()?;

    let comment = service
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.user_id != user_id {
        return Err(AppError::Forbidden(
            "You can only edit your own comments".to_string(),
        ));
    }

    let updated = service.update(id, &payload.body).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment updated successfully",
        "data": updated,
    })))
}

/// Delete a comment and all of its replies.
/// Requires: Login + (Author OR Moderator OR Admin).
pub async fn delete_comment<S: CommentStore>(
    State(service): State<DiscussionService<S>>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let comment = service
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let is_owner = comment.user_id == user_id;
    if !is_owner && !claims.role.can_moderate() {
        tracing::warn!(
            comment_id = id,
            user_id,
            role = ?claims.role,
            "Rejected comment deletion"
        );
        return Err(AppError::Forbidden(
            "You do not have permission to delete this comment".to_string(),
        ));
    }

    service.delete(id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully",
    })))
}

/// Flat list of all comments for moderation.
/// Requires: Login + (Moderator OR Admin).
pub async fn list_all<S: CommentStore>(
    State(service): State<DiscussionService<S>>,
    AppQuery(params): AppQuery<FlatListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::new(params.page, params.limit, MODERATION_PAGE_SIZE);
    let result = service.all_flat(params.film_id, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": result.items,
        "pagination": result.pagination,
    })))
}
