//! Application state

use axum::extract::FromRef;
use medibook_auth::{PasswordService, TokenService};
use medibook_db::Database;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle used to render the Prometheus scrape output
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordService,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenService>, passwords: PasswordService) -> Self {
        Self {
            db,
            tokens,
            passwords,
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
