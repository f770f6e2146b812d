use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::render::Normalizer;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub normalizer: Arc<Normalizer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let normalizer = Arc::new(Normalizer::new(config.placeholder_text.clone()));
        Self { config, normalizer }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Normalizer> {
    fn from_ref(state: &AppState) -> Self {
        state.normalizer.clone()
    }
}
