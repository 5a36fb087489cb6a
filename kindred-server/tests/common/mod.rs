use std::sync::Arc;

use kindred_core::config::Environment;
use kindred_server::{
    config::{IdentityConfig, SecurityConfig, ServerConfig, StoreBackend, StoreConfig},
    services::{MemoryStore, MockIdentityProvider},
    AppState,
};

pub fn test_state() -> (AppState, Arc<MockIdentityProvider>) {
    let identity = Arc::new(MockIdentityProvider::new());

    let config = ServerConfig {
        environment: Environment::Dev,
        service_name: "kindred-server-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        port: 8080,
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        identity: IdentityConfig {
            url: "http://localhost:9999".to_string(),
            service_key: "test-service-key".to_string(),
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            redis_url: String::new(),
        },
    };

    let state = AppState {
        config,
        identity: identity.clone(),
        store: Arc::new(MemoryStore::new()),
    };

    (state, identity)
}
