//! Credential storage and management
//!
//! Bearer tokens are read once at startup from a JSON file of the form
//! `{"users": [{"username": "...", "token": "..."}]}`.

use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default)]
    users: Vec<Credential>,
}

/// Token to username lookup.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    tokens: HashMap<String, String>,
}

impl TokenStore {
    pub fn from_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let mut tokens = HashMap::new();
        for credential in credentials {
            if credential.token.trim().is_empty() {
                warn!("Ignoring empty token for user {}", credential.username);
                continue;
            }
            if let Some(previous) = tokens.insert(credential.token, credential.username.clone()) {
                warn!(
                    "Token for {} shadows the one configured for {}",
                    credential.username, previous
                );
            }
        }
        Self { tokens }
    }

    pub fn from_json(raw: &str) -> io::Result<Self> {
        let file: TokenFile = serde_json::from_str(raw)?;
        Ok(Self::from_credentials(file.users))
    }

    pub async fn load(path: &Path) -> io::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("cannot read tokens file {}: {}", path.display(), e),
            )
        })?;
        let store = Self::from_json(&raw)?;
        info!("Loaded {} API token(s) from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn username_for(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
