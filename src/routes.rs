// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::discussion,
    state::AppState,
    store::CommentStore,
    utils::jwt::{auth_middleware, moderator_middleware},
};

/// Assembles the main application router.
///
/// * Public thread and count routes.
/// * Authenticated write routes.
/// * Moderator-only flat listing.
/// * Global middleware (Trace, CORS).
pub fn create_router<S: CommentStore>(state: AppState<S>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/film/{film_id}", get(discussion::list_thread::<S>))
        .route("/film/{film_id}/count", get(discussion::comment_count::<S>));

    let user_routes = Router::new()
        .route("/film/{film_id}", post(discussion::create_comment::<S>))
        .route(
            "/{id}",
            put(discussion::update_comment::<S>).delete(discussion::delete_comment::<S>),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    let moderator_routes = Router::new()
        .route("/all", get(discussion::list_all::<S>))
        // Auth first, then the role check
        .layer(middleware::from_fn(moderator_middleware))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    let discussion_routes = public_routes.merge(user_routes).merge(moderator_routes);

    Router::new()
        .nest("/api/discussions", discussion_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
