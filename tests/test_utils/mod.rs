//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::Router;

use relay::api::AppState;
use relay::api::app;
use relay::core::AppConfig;

/// Creates a test application router pointed at the given upstream URL.
pub fn test_app(upstream_url: &str) -> Router {
    let config = AppConfig {
        ollama_url: upstream_url.to_string(),
        ollama_model: String::from("test-model"),
    };
    let app_state = AppState::new(config);
    app(Arc::new(RwLock::new(app_state)))
}
