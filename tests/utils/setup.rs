//! Test setup infrastructure - wires an AuthService and router over an in-memory store
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use gatekeeper::{
    auth::hasher::MIN_COST, create_app, AppState, AuthService, CredentialHasher,
    InMemoryCredentialStore, TokenIssuer,
};

pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub store: Arc<InMemoryCredentialStore>,
    pub service: Arc<AuthService>,
    pub app: Router,
}

pub struct TestSetupBuilder {
    access_ttl: chrono::Duration,
    store_timeout: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            access_ttl: chrono::Duration::minutes(5),
            store_timeout: Duration::from_secs(5),
        }
    }

    /// Issue access tokens that are already expired
    pub fn with_expired_access_tokens(mut self) -> Self {
        self.access_ttl = chrono::Duration::seconds(-60);
        self
    }

    pub fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryCredentialStore::new());
        let token_issuer = TokenIssuer::new(TEST_SECRET)
            .unwrap()
            .with_access_ttl(self.access_ttl);

        let service = Arc::new(AuthService::new(
            store.clone(),
            CredentialHasher::with_cost(MIN_COST),
            token_issuer,
            self.store_timeout,
        )
        .unwrap());
        let app = create_app(AppState::new(service.clone()));

        TestSetup {
            store,
            service,
            app,
        }
    }
}
