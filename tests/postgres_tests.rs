// tests/postgres_tests.rs
//
// Runs against a real database: DATABASE_URL=... cargo test -- --ignored

use film_archive::{
    error::AppError,
    models::{comment::NewComment, pagination::PageRequest},
    services::DiscussionService,
    store::PgStore,
};
use sqlx::{PgPool, postgres::PgPoolOptions};

async fn connect() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

async fn seed_user(pool: &PgPool, role: &str) -> i64 {
    let name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    sqlx::query_scalar("INSERT INTO users (name, role) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seed_film(pool: &PgPool, status: &str) -> i64 {
    let title = format!("film_{}", uuid::Uuid::new_v4());
    sqlx::query_scalar("INSERT INTO films (title, status) VALUES ($1, $2) RETURNING id")
        .bind(title)
        .bind(status)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn comment(film_id: i64, user_id: i64, body: &str, parent_id: Option<i64>) -> NewComment {
    NewComment {
        film_id,
        user_id,
        body: body.to_string(),
        parent_id,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn thread_lifecycle_on_postgres() {
    // Arrange
    let pool = connect().await;
    let film = seed_film(&pool, "published").await;
    let other_film = seed_film(&pool, "published").await;
    let (u1, u2, u3) = (
        seed_user(&pool, "user").await,
        seed_user(&pool, "user").await,
        seed_user(&pool, "user").await,
    );
    let svc = DiscussionService::new(PgStore::new(pool.clone()));

    // Act: A by U1, B by U2 replying to A, then U3 nests under B
    let a = svc.create(comment(film, u1, "A", None)).await.unwrap();
    let b = svc.create(comment(film, u2, "B", Some(a.id))).await.unwrap();
    assert_eq!(svc.comment_depth(b.id).await.unwrap(), 2);

    let mut parent = b.id;
    for i in 0..3 {
        parent = svc
            .create(comment(film, u3, &format!("C{}", i), Some(parent)))
            .await
            .unwrap()
            .id;
    }
    assert_eq!(svc.comment_depth(parent).await.unwrap(), 5);

    let too_deep = svc.create(comment(film, u3, "C3", Some(parent))).await;
    assert!(matches!(too_deep, Err(AppError::BadRequest(_))));

    let foreign = svc.create(comment(other_film, u1, "elsewhere", None)).await.unwrap();
    let cross = svc.create(comment(film, u1, "cross", Some(foreign.id))).await;
    assert_eq!(
        cross.unwrap_err(),
        AppError::BadRequest("Invalid parent comment".to_string())
    );

    // Assert: thread view
    let thread = svc
        .thread_for_film(film, PageRequest::new(None, None, 20))
        .await
        .unwrap();
    assert_eq!(thread.pagination.total, 1);
    assert_eq!(thread.items[0].reply_count, 4);
    assert_eq!(thread.items[0].replies[0].comment.id, b.id);

    // Assert: cascade delete
    assert_eq!(svc.comment_count(film).await.unwrap(), 5);
    assert_eq!(svc.delete(a.id).await.unwrap(), 5);
    assert_eq!(svc.comment_count(film).await.unwrap(), 0);
    assert_eq!(svc.comment_count(other_film).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn update_keeps_identity_fields_on_postgres() {
    let pool = connect().await;
    let film = seed_film(&pool, "published").await;
    let user = seed_user(&pool, "user").await;
    let svc = DiscussionService::new(PgStore::new(pool));

    let before = svc.create(comment(film, user, "first take", None)).await.unwrap();
    let after = svc.update(before.id, "  second take ").await.unwrap();

    assert_eq!(after.body, "second take");
    assert_eq!(after.id, before.id);
    assert_eq!(after.user_id, before.user_id);
    assert_eq!(after.film_id, before.film_id);
    assert_eq!(after.parent_id, before.parent_id);
    assert_eq!(after.created_at, before.created_at);
}
