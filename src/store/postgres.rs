// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::AppError,
    models::{
        comment::{CommentRecord, ModerationRecord, NewComment, ParentLink},
        film::FilmRef,
    },
    store::{CommentStore, CommentTx},
};

/// Columns of a comment joined with its author's projection.
/// Expects `discussions d LEFT JOIN users u`.
const COMMENT_COLUMNS: &str = r#"
    d.id, d.film_id, d.user_id, d.body, d.parent_id, d.created_at,
    u.name AS author_name, u.image AS author_image
"#;

/// PostgreSQL-backed comment store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CommentStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }
}

#[async_trait]
impl CommentTx for PgTx {
    async fn find_film(&mut self, film_id: i64) -> Result<Option<FilmRef>, AppError> {
        let film = sqlx::query_as::<_, FilmRef>("SELECT id, title, status FROM films WHERE id = $1")
            .bind(film_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(film)
    }

    async fn find_comment(&mut self, id: i64) -> Result<Option<CommentRecord>, AppError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM discussions d LEFT JOIN users u ON u.id = d.user_id WHERE d.id = $1"
        );
        let comment = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(comment)
    }

    async fn parent_link(&mut self, id: i64) -> Result<Option<ParentLink>, AppError> {
        // FOR SHARE keeps the ancestor chain alive until the reply is inserted.
        let link = sqlx::query_as::<_, ParentLink>(
            "SELECT film_id, parent_id FROM discussions WHERE id = $1 FOR SHARE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(link)
    }

    async fn list_roots(
        &mut self,
        film_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM discussions d
            LEFT JOIN users u ON u.id = d.user_id
            WHERE d.film_id = $1 AND d.parent_id IS NULL
            ORDER BY d.created_at DESC, d.id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let roots = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(film_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(roots)
    }

    async fn count_roots(&mut self, film_id: i64) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM discussions WHERE film_id = $1 AND parent_id IS NULL",
        )
        .bind(film_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(total)
    }

    async fn list_descendants(
        &mut self,
        root_ids: &[i64],
        max_levels: u32,
    ) -> Result<Vec<CommentRecord>, AppError> {
        if root_ids.is_empty() || max_levels == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            WITH RECURSIVE thread AS (
                SELECT id, 1 AS level
                FROM discussions
                WHERE parent_id = ANY($1)
                UNION ALL
                SELECT c.id, t.level + 1
                FROM discussions c
                JOIN thread t ON c.parent_id = t.id
                WHERE t.level < $2
            )
            SELECT {COMMENT_COLUMNS}
            FROM thread t
            JOIN discussions d ON d.id = t.id
            LEFT JOIN users u ON u.id = d.user_id
            ORDER BY d.created_at ASC, d.id ASC
            "#
        );
        let levels = i32::try_from(max_levels).unwrap_or(i32::MAX);
        let replies = sqlx::query_as::<_, CommentRecord>(&sql)
            .bind(root_ids)
            .bind(levels)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(replies)
    }

    async fn count_for_film(&mut self, film_id: i64) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM discussions WHERE film_id = $1")
            .bind(film_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(total)
    }

    async fn list_flat(
        &mut self,
        film_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ModerationRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}, f.title AS film_title
            FROM discussions d
            LEFT JOIN users u ON u.id = d.user_id
            LEFT JOIN films f ON f.id = d.film_id
            WHERE ($1::BIGINT IS NULL OR d.film_id = $1)
            ORDER BY d.created_at DESC, d.id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, ModerationRecord>(&sql)
            .bind(film_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows)
    }

    async fn count_flat(&mut self, film_id: Option<i64>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM discussions WHERE ($1::BIGINT IS NULL OR film_id = $1)",
        )
        .bind(film_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(total)
    }

    async fn insert(&mut self, comment: NewComment) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO discussions (film_id, user_id, body, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(comment.film_id)
        .bind(comment.user_id)
        .bind(&comment.body)
        .bind(comment.parent_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn update_body(&mut self, id: i64, body: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE discussions SET body = $1 WHERE id = $2")
            .bind(body)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn child_ids(&mut self, id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM discussions WHERE parent_id = $1")
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(ids)
    }

    async fn delete_one(&mut self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
