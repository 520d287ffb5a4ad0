// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, exam::ExamEngine, store::SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub engine: ExamEngine,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Config,
}

impl FromRef<AppState> for ExamEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
