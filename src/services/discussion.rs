// src/services/discussion.rs

use std::collections::HashSet;

use crate::{
    error::AppError,
    models::{
        comment::{CommentResponse, ModerationComment, NewComment, ThreadComment},
        film::FilmRef,
        pagination::{PageRequest, Paginated, Pagination},
    },
    services::thread::{self, MAX_DEPTH},
    store::{CommentStore, CommentTx},
};

pub const THREAD_PAGE_SIZE: i64 = 20;
pub const MODERATION_PAGE_SIZE: i64 = 50;

/// Threaded discussions attached to films.
///
/// Authorization is the caller's job: every method trusts that the acting
/// user has already been checked against the comment or role it touches.
#[derive(Clone)]
pub struct DiscussionService<S> {
    store: S,
}

impl<S: CommentStore> DiscussionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn film(&self, film_id: i64) -> Result<Option<FilmRef>, AppError> {
        let mut tx = self.store.begin().await?;
        let film = tx.find_film(film_id).await?;
        tx.commit().await?;
        Ok(film)
    }

    /// Root comments of a film, newest first, each with its reply tree.
    /// `total` counts root comments only.
    pub async fn thread_for_film(
        &self,
        film_id: i64,
        page: PageRequest,
    ) -> Result<Paginated<ThreadComment>, AppError> {
        let mut tx = self.store.begin().await?;

        let roots = tx.list_roots(film_id, page.limit, page.offset()).await?;
        let total = tx.count_roots(film_id).await?;
        let root_ids: Vec<i64> = roots.iter().map(|root| root.id).collect();
        let descendants = tx.list_descendants(&root_ids, MAX_DEPTH).await?;
        tx.commit().await?;

        Ok(Paginated {
            items: thread::assemble(roots, descendants),
            pagination: Pagination::new(page, total),
        })
    }

    /// Number of comments of a film, at every depth.
    pub async fn comment_count(&self, film_id: i64) -> Result<i64, AppError> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_for_film(film_id).await?;
        tx.commit().await?;
        Ok(total)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<CommentResponse>, AppError> {
        let mut tx = self.store.begin().await?;
        let comment = tx.find_comment(id).await?;
        tx.commit().await?;
        Ok(comment.map(CommentResponse::from))
    }

    /// Depth of a comment, the root being 1.
    pub async fn comment_depth(&self, id: i64) -> Result<u32, AppError> {
        let mut tx = self.store.begin().await?;
        let depth = depth_of(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        tx.commit().await?;
        Ok(depth)
    }

    /// Creates a root comment or a reply. The film is expected to exist and
    /// be published.
    pub async fn create(&self, new: NewComment) -> Result<CommentResponse, AppError> {
        let body = normalize_body(&new.body)?;
        let mut tx = self.store.begin().await?;

        if let Some(parent_id) = new.parent_id {
            let parent = tx.parent_link(parent_id).await?;
            if parent.is_none_or(|p| p.film_id != new.film_id) {
                return Err(AppError::BadRequest("Invalid parent comment".to_string()));
            }

            let parent_depth = depth_of(&mut tx, parent_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Invalid parent comment".to_string()))?;
            if parent_depth >= MAX_DEPTH {
                return Err(AppError::BadRequest(format!(
                    "Maximum reply depth reached (max {})",
                    MAX_DEPTH
                )));
            }
        }

        let id = tx
            .insert(NewComment {
                body,
                ..new
            })
            .await?;
        let created = tx
            .find_comment(id)
            .await?
            .ok_or_else(|| AppError::InternalServerError(format!("comment {} vanished after insert", id)))?;
        tx.commit().await?;

        tracing::info!(
            comment_id = id,
            film_id = created.film_id,
            parent_id = ?created.parent_id,
            "Comment created"
        );
        Ok(created.into())
    }

    /// Replaces the body of a comment. Nothing else is ever edited.
    pub async fn update(&self, id: i64, body: &str) -> Result<CommentResponse, AppError> {
        let body = normalize_body(body)?;
        let mut tx = self.store.begin().await?;

        if !tx.update_body(id, &body).await? {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }
        let updated = tx
            .find_comment(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        tx.commit().await?;

        Ok(updated.into())
    }

    /// Deletes a comment together with its whole reply subtree.
    /// Returns the number of removed comments.
    pub async fn delete(&self, id: i64) -> Result<u64, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_comment(id).await?.is_none() {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        // Pre-order walk; deleting in reverse removes every reply before its parent.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(tx.child_ids(current).await?);
        }
        for comment_id in order.iter().rev() {
            tx.delete_one(*comment_id).await?;
        }
        tx.commit().await?;

        tracing::info!(comment_id = id, removed = order.len(), "Comment deleted");
        Ok(order.len() as u64)
    }

    /// Flat moderation listing, newest first, optionally limited to one film.
    pub async fn all_flat(
        &self,
        film_id: Option<i64>,
        page: PageRequest,
    ) -> Result<Paginated<ModerationComment>, AppError> {
        let mut tx = self.store.begin().await?;
        let rows = tx.list_flat(film_id, page.limit, page.offset()).await?;
        let total = tx.count_flat(film_id).await?;
        tx.commit().await?;

        Ok(Paginated {
            items: rows.into_iter().map(ModerationComment::from).collect(),
            pagination: Pagination::new(page, total),
        })
    }
}

/// Walks parent links up to the root. `None` if the comment does not exist.
async fn depth_of<T: CommentTx>(tx: &mut T, id: i64) -> Result<Option<u32>, AppError> {
    let Some(mut link) = tx.parent_link(id).await? else {
        return Ok(None);
    };

    let mut depth = 1;
    let mut seen = HashSet::from([id]);
    while let Some(parent_id) = link.parent_id {
        if !seen.insert(parent_id) {
            return Err(AppError::InternalServerError(format!(
                "cycle in reply chain of comment {}",
                id
            )));
        }
        link = tx.parent_link(parent_id).await?.ok_or_else(|| {
            AppError::InternalServerError(format!("comment {} has a missing parent", id))
        })?;
        depth += 1;
    }

    Ok(Some(depth))
}

/// Trims a comment body, rejecting it when nothing is left.
pub fn normalize_body(body: &str) -> Result<String, AppError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("body is required".to_string()));
    }
    Ok(trimmed.to_string())
}
