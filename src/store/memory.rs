// src/store/memory.rs

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::AppError,
    models::{
        comment::{CommentRecord, ModerationRecord, NewComment, ParentLink},
        film::FilmRef,
        user::AuthorSummary,
    },
    store::{CommentStore, CommentTx},
};

/// In-memory comment store for local development and tests.
///
/// Transactions are serialized by a single mutex. The first write copies the
/// state, later writes go to the copy, and `commit` publishes it. Read-only
/// transactions never copy.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: i64,
    comments: BTreeMap<i64, StoredComment>,
    films: HashMap<i64, FilmRef>,
    users: HashMap<i64, AuthorSummary>,
}

#[derive(Debug, Clone)]
struct StoredComment {
    id: i64,
    film_id: i64,
    user_id: i64,
    body: String,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: AuthorSummary) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn add_film(&self, film: FilmRef) {
        self.state.lock().await.films.insert(film.id, film);
    }
}

impl MemoryState {
    fn record(&self, comment: &StoredComment) -> CommentRecord {
        let author = self.users.get(&comment.user_id);
        CommentRecord {
            id: comment.id,
            film_id: comment.film_id,
            user_id: comment.user_id,
            body: comment.body.clone(),
            parent_id: comment.parent_id,
            created_at: comment.created_at,
            author_name: author.and_then(|a| a.name.clone()),
            author_image: author.and_then(|a| a.image.clone()),
        }
    }

    /// Comments matching `filter`, newest first.
    fn newest_first<F>(&self, filter: F) -> Vec<&StoredComment>
    where
        F: Fn(&StoredComment) -> bool,
    {
        let mut matching: Vec<&StoredComment> =
            self.comments.values().filter(|c| filter(*c)).collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        matching
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    /// Copy of the state made on the first write; reads go to the guard until then.
    work: Option<MemoryState>,
}

impl MemoryTx {
    fn view(&self) -> &MemoryState {
        self.work.as_ref().unwrap_or(&self.guard)
    }

    fn write(&mut self) -> &mut MemoryState {
        let guard = &self.guard;
        self.work.get_or_insert_with(|| MemoryState::clone(guard))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, AppError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(MemoryTx { guard, work: None })
    }
}

#[async_trait]
impl CommentTx for MemoryTx {
    async fn find_film(&mut self, film_id: i64) -> Result<Option<FilmRef>, AppError> {
        Ok(self.view().films.get(&film_id).cloned())
    }

    async fn find_comment(&mut self, id: i64) -> Result<Option<CommentRecord>, AppError> {
        Ok(self.view().comments.get(&id).map(|c| self.view().record(c)))
    }

    async fn parent_link(&mut self, id: i64) -> Result<Option<ParentLink>, AppError> {
        Ok(self.view().comments.get(&id).map(|c| ParentLink {
            film_id: c.film_id,
            parent_id: c.parent_id,
        }))
    }

    async fn list_roots(
        &mut self,
        film_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentRecord>, AppError> {
        let roots = self
            .view()
            .newest_first(|c| c.film_id == film_id && c.parent_id.is_none());
        let roots = page(roots, limit, offset);
        Ok(roots.into_iter().map(|c| self.view().record(c)).collect())
    }

    async fn count_roots(&mut self, film_id: i64) -> Result<i64, AppError> {
        let total = self
            .view()
            .comments
            .values()
            .filter(|c| c.film_id == film_id && c.parent_id.is_none())
            .count();
        Ok(total as i64)
    }

    async fn list_descendants(
        &mut self,
        root_ids: &[i64],
        max_levels: u32,
    ) -> Result<Vec<CommentRecord>, AppError> {
        let mut found: Vec<&StoredComment> = Vec::new();
        let mut frontier: HashSet<i64> = root_ids.iter().copied().collect();

        for _ in 0..max_levels {
            if frontier.is_empty() {
                break;
            }
            let level: Vec<&StoredComment> = self
                .view()
                .comments
                .values()
                .filter(|c| c.parent_id.is_some_and(|p| frontier.contains(&p)))
                .collect();
            frontier = level.iter().map(|c| c.id).collect();
            found.extend(level);
        }

        found.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(found.into_iter().map(|c| self.view().record(c)).collect())
    }

    async fn count_for_film(&mut self, film_id: i64) -> Result<i64, AppError> {
        let total = self
            .view()
            .comments
            .values()
            .filter(|c| c.film_id == film_id)
            .count();
        Ok(total as i64)
    }

    async fn list_flat(
        &mut self,
        film_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ModerationRecord>, AppError> {
        let rows = self
            .view()
            .newest_first(|c| film_id.is_none_or(|f| c.film_id == f));
        let rows = page(rows, limit, offset);
        Ok(rows
            .into_iter()
            .map(|c| ModerationRecord {
                comment: self.view().record(c),
                film_title: self.view().films.get(&c.film_id).map(|f| f.title.clone()),
            })
            .collect())
    }

    async fn count_flat(&mut self, film_id: Option<i64>) -> Result<i64, AppError> {
        let total = self
            .view()
            .comments
            .values()
            .filter(|c| film_id.is_none_or(|f| c.film_id == f))
            .count();
        Ok(total as i64)
    }

    async fn insert(&mut self, comment: NewComment) -> Result<i64, AppError> {
        // Same guarantees the foreign keys give in PostgreSQL.
        if !self.view().films.contains_key(&comment.film_id) {
            return Err(AppError::InternalServerError(format!(
                "film {} does not exist",
                comment.film_id
            )));
        }
        if let Some(parent_id) = comment.parent_id {
            if !self.view().comments.contains_key(&parent_id) {
                return Err(AppError::InternalServerError(format!(
                    "parent comment {} does not exist",
                    parent_id
                )));
            }
        }

        let state = self.write();
        state.last_id += 1;
        let id = state.last_id;
        state.comments.insert(
            id,
            StoredComment {
                id,
                film_id: comment.film_id,
                user_id: comment.user_id,
                body: comment.body,
                parent_id: comment.parent_id,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update_body(&mut self, id: i64, body: &str) -> Result<bool, AppError> {
        if !self.view().comments.contains_key(&id) {
            return Ok(false);
        }
        match self.write().comments.get_mut(&id) {
            Some(comment) => {
                comment.body = body.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn child_ids(&mut self, id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .view()
            .comments
            .values()
            .filter(|c| c.parent_id == Some(id))
            .map(|c| c.id)
            .collect())
    }

    async fn delete_one(&mut self, id: i64) -> Result<(), AppError> {
        if self.view().comments.values().any(|c| c.parent_id == Some(id)) {
            return Err(AppError::InternalServerError(format!(
                "comment {} still has replies",
                id
            )));
        }
        self.write().comments.remove(&id);
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        let MemoryTx { mut guard, work } = self;
        if let Some(work) = work {
            *guard = work;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_film(FilmRef {
                id: 1,
                title: "Senja".to_string(),
                status: FilmRef::PUBLISHED.to_string(),
            })
            .await;
        store
            .add_user(AuthorSummary {
                id: 7,
                name: Some("Rani".to_string()),
                image: None,
            })
            .await;
        store
    }

    fn root(body: &str) -> NewComment {
        NewComment {
            film_id: 1,
            user_id: 7,
            body: body.to_string(),
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_rolled_back() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        tx.insert(root("dropped")).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_for_film(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn committed_writes_are_visible_with_author() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let id = tx.insert(root("kept")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let record = tx.find_comment(id).await.unwrap().unwrap();
        assert_eq!(record.body, "kept");
        assert_eq!(record.author_name.as_deref(), Some("Rani"));
    }

    #[tokio::test]
    async fn reads_share_the_state_until_first_write() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_film(1).await.unwrap().is_some());
        assert_eq!(tx.count_for_film(1).await.unwrap(), 0);
        assert!(tx.work.is_none());

        assert!(!tx.update_body(99, "nothing here").await.unwrap());
        assert!(tx.work.is_none());

        let id = tx.insert(root("first")).await.unwrap();
        assert!(tx.work.is_some());
        assert_eq!(tx.count_for_film(1).await.unwrap(), 1);
        assert!(tx.update_body(id, "edited").await.unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.find_comment(id).await.unwrap().unwrap().body, "edited");
    }

    #[tokio::test]
    async fn refuses_to_orphan_replies() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let parent = tx.insert(root("parent")).await.unwrap();
        tx.insert(NewComment {
            parent_id: Some(parent),
            ..root("child")
        })
        .await
        .unwrap();

        assert!(tx.delete_one(parent).await.is_err());
    }

    #[tokio::test]
    async fn descendants_respect_level_limit() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let top = tx.insert(root("top")).await.unwrap();
        let mut parent = top;
        for i in 0..4 {
            parent = tx
                .insert(NewComment {
                    parent_id: Some(parent),
                    ..root(&format!("reply {}", i))
                })
                .await
                .unwrap();
        }

        assert_eq!(tx.list_descendants(&[top], 2).await.unwrap().len(), 2);
        assert_eq!(tx.list_descendants(&[top], 5).await.unwrap().len(), 4);
        assert!(tx.list_descendants(&[], 5).await.unwrap().is_empty());
    }
}
