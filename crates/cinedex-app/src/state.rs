use std::sync::Arc;

use cinedex_dal::Pool;

use crate::decode::DEFAULT_MAX_BODY_SIZE;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                pool,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment name, reported by health check
    pub environment: String,
    /// Maximum accepted size of JSON request body in bytes
    pub max_body_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}
