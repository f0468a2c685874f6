//! Lazily fetched bearer token.

use std::{fmt, future::Future};

use tokio::sync::Mutex;

use crate::Result;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// An access token handed out by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    token_type: String,
}

impl Token {
    /// Create a new token. An empty `token_type` falls back to `Bearer`.
    pub fn new(access_token: impl Into<String>, token_type: Option<String>) -> Self {
        let token_type = token_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned());
        Self {
            access_token: access_token.into(),
            token_type,
        }
    }

    /// The opaque access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The token type label, `Bearer` unless the server said otherwise.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Holds at most one [Token].
///
/// The lock is held for the whole duration of a fetch, so callers racing on
/// an empty cache end up sharing a single token exchange.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: Mutex<Option<Token>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, or run `fetch` to obtain (and cache) a new
    /// one. A failed fetch leaves the cache empty.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Token>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>>,
    {
        let mut cached = self.inner.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = fetch().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token, forcing the next caller to re-authenticate.
    pub async fn invalidate(&self) {
        if self.inner.lock().await.take().is_some() {
            tracing::debug!("dropped cached access token");
        }
    }

    /// Drop the cached token only if it is still `rejected`. A token that was
    /// already replaced by a newer exchange is left alone.
    pub async fn invalidate_if(&self, rejected: &Token) {
        let mut slot = self.inner.lock().await;
        if slot.as_ref() == Some(rejected) {
            *slot = None;
            tracing::debug!("dropped rejected access token");
        }
    }

    /// Return the cached token, if any, without fetching.
    pub async fn cached(&self) -> Option<Token> {
        self.inner.lock().await.clone()
    }
}
