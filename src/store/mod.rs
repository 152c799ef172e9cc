//! Comment store abstraction.
//!
//! Every read and write goes through a [`CommentTx`] opened with
//! [`CommentStore::begin`]. Effects become visible to other transactions only
//! after [`CommentTx::commit`]; dropping a transaction rolls it back.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        comment::{CommentRecord, ModerationRecord, NewComment, ParentLink},
        film::FilmRef,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CommentStore: Clone + Send + Sync + 'static {
    type Tx: CommentTx;

    async fn begin(&self) -> Result<Self::Tx, AppError>;
}

#[async_trait]
pub trait CommentTx: Send + Sized {
    async fn find_film(&mut self, film_id: i64) -> Result<Option<FilmRef>, AppError>;

    async fn find_comment(&mut self, id: i64) -> Result<Option<CommentRecord>, AppError>;

    /// Film and parent of a comment. Implementations lock the row against
    /// concurrent deletion until the transaction ends.
    async fn parent_link(&mut self, id: i64) -> Result<Option<ParentLink>, AppError>;

    /// Root comments of a film, newest first.
    async fn list_roots(
        &mut self,
        film_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentRecord>, AppError>;

    async fn count_roots(&mut self, film_id: i64) -> Result<i64, AppError>;

    /// Every descendant of the given roots down to `max_levels` levels below
    /// them, oldest first.
    async fn list_descendants(
        &mut self,
        root_ids: &[i64],
        max_levels: u32,
    ) -> Result<Vec<CommentRecord>, AppError>;

    async fn count_for_film(&mut self, film_id: i64) -> Result<i64, AppError>;

    /// All comments, optionally of one film, newest first.
    async fn list_flat(
        &mut self,
        film_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ModerationRecord>, AppError>;

    async fn count_flat(&mut self, film_id: Option<i64>) -> Result<i64, AppError>;

    /// Inserts a comment and returns its id.
    async fn insert(&mut self, comment: NewComment) -> Result<i64, AppError>;

    /// Returns false if no comment has this id.
    async fn update_body(&mut self, id: i64, body: &str) -> Result<bool, AppError>;

    async fn child_ids(&mut self, id: i64) -> Result<Vec<i64>, AppError>;

    async fn delete_one(&mut self, id: i64) -> Result<(), AppError>;

    async fn commit(self) -> Result<(), AppError>;
}
