use crate::{config::Config, services::DiscussionService, store::CommentStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState<S> {
    pub discussions: DiscussionService<S>,
    pub config: Config,
}

impl<S: CommentStore> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            discussions: DiscussionService::new(store),
            config,
        }
    }
}

impl<S: Clone> FromRef<AppState<S>> for DiscussionService<S> {
    fn from_ref(state: &AppState<S>) -> Self {
        state.discussions.clone()
    }
}
