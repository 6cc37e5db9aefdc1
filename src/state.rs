use crate::auth::{jwt::JwtKeys, repo::UserStore, services::AuthService};
use crate::config::AppConfig;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn UserStore>) -> Self {
        let auth = AuthService::new(store, JwtKeys::new(&config.jwt));
        Self { auth }
    }

    #[cfg(test)]
    pub fn fake_with(store: Arc<dyn UserStore>) -> Self {
        Self::new(&AppConfig::for_tests(), store)
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
