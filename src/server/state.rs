//! Shared request state

use std::sync::Arc;

use crate::auth::TokenStore;
use crate::transfer::FileService;

#[derive(Clone)]
pub struct AppState {
    pub service: FileService,
    pub tokens: Arc<TokenStore>,
}

impl AppState {
    pub fn new(service: FileService, tokens: TokenStore) -> Self {
        Self {
            service,
            tokens: Arc::new(tokens),
        }
    }
}
