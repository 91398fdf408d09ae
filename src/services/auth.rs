// src/services/auth.rs

//! Credential acquisition.
//!
//! Exchanges the configured email and password for a bearer token through
//! `auth/login`. Missing credentials and failed logins both yield `None`;
//! callers treat that as "skip the authenticated tier".

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::rpc::RpcClient;
use crate::models::{AuthConfig, BearerToken, Credentials, TokenPolicy};

/// A single token remembered together with the time it was acquired.
#[derive(Debug)]
pub struct TokenCache {
    ttl: Duration,
    slot: Mutex<Option<(BearerToken, DateTime<Utc>)>>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<BearerToken> {
        self.get_at(Utc::now())
    }

    /// Cached token if it is younger than the TTL at `now`.
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<BearerToken> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let (token, acquired) = slot.as_ref()?;
        let age = (now - *acquired).to_std().unwrap_or_default();
        (age < self.ttl).then(|| token.clone())
    }

    pub fn store(&self, token: BearerToken) {
        self.store_at(token, Utc::now());
    }

    pub fn store_at(&self, token: BearerToken, acquired: DateTime<Utc>) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some((token, acquired));
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

/// Produces bearer tokens from configured credentials.
pub struct CredentialAcquirer {
    rpc: Arc<RpcClient>,
    credentials: Option<Credentials>,
    cache: Option<TokenCache>,
}

impl CredentialAcquirer {
    pub fn new(rpc: Arc<RpcClient>, auth: &AuthConfig) -> Self {
        let cache = match auth.token_policy {
            TokenPolicy::PerRequest => None,
            TokenPolicy::Cached { ttl_secs } => {
                Some(TokenCache::new(Duration::from_secs(ttl_secs)))
            }
        };
        Self {
            rpc,
            credentials: Credentials::from_config(auth),
            cache,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Return a usable token, logging in when none is cached.
    ///
    /// Never fails: any login problem is logged and reported as `None`.
    pub async fn acquire_token(&self) -> Option<BearerToken> {
        let Some(credentials) = &self.credentials else {
            log::warn!("Missing JUTGE_EMAIL or JUTGE_PASSWORD; skipping API login");
            return None;
        };

        if let Some(token) = self.cache.as_ref().and_then(TokenCache::get) {
            log::debug!("Reusing cached API token");
            return Some(token);
        }

        log::info!("Attempting automatic login via API...");
        let params = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let token = match self.rpc.call("auth", "login", params, None).await {
            Ok(result) => token_from_result(&result),
            Err(e) => {
                log::error!("Login failed: {}", e);
                return None;
            }
        };

        match token {
            Some(token) => {
                log::info!("Login successful");
                if let Some(cache) = &self.cache {
                    cache.store(token.clone());
                }
                Some(token)
            }
            None => {
                log::error!("Login failed: response carried no token");
                None
            }
        }
    }

    /// Forget a cached token so the next acquisition logs in again.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            log::debug!("Invalidating cached API token");
            cache.invalidate();
        }
    }
}

/// The login result is either the token string or an object holding it.
fn token_from_result(result: &Value) -> Option<BearerToken> {
    let raw = match result {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("token")?.as_str()?,
        _ => return None,
    };
    BearerToken::new(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpstreamConfig;
    use crate::utils::mock::{Method, MockTransport};

    const LOGIN: &str = "https://api.jutge.org/api/auth/login";

    fn auth(policy: TokenPolicy) -> AuthConfig {
        AuthConfig {
            email: Some("bot@example.com".into()),
            password: Some("secret".into()),
            token_policy: policy,
        }
    }

    fn build(mock: MockTransport, auth: &AuthConfig) -> (Arc<MockTransport>, CredentialAcquirer) {
        let mock = Arc::new(mock);
        let rpc = Arc::new(RpcClient::new(mock.clone(), &UpstreamConfig::default()));
        (mock, CredentialAcquirer::new(rpc, auth))
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_network() {
        let (mock, acquirer) = build(MockTransport::new(), &AuthConfig::default());
        assert!(!acquirer.has_credentials());
        assert!(acquirer.acquire_token().await.is_none());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let (mock, acquirer) = build(
            MockTransport::new().on_post(LOGIN, "bot@example.com", 200, r#"{"result":"tok-1"}"#),
            &auth(TokenPolicy::PerRequest),
        );
        let token = acquirer.acquire_token().await.unwrap();
        assert_eq!(token.as_str(), "tok-1");
        assert_eq!(mock.count(Method::Post, LOGIN), 1);
    }

    #[tokio::test]
    async fn test_login_object_result() {
        let (_, acquirer) = build(
            MockTransport::new().on_post(LOGIN, "", 200, r#"{"result":{"token":"tok-2","expiration":"x"}}"#),
            &auth(TokenPolicy::PerRequest),
        );
        assert_eq!(acquirer.acquire_token().await.unwrap().as_str(), "tok-2");
    }

    #[tokio::test]
    async fn test_login_failure_is_swallowed() {
        let (_, acquirer) = build(
            MockTransport::new().on_post(LOGIN, "", 200, r#"{"error":{"message":"Invalid credentials"}}"#),
            &auth(TokenPolicy::PerRequest),
        );
        assert!(acquirer.acquire_token().await.is_none());

        let (_, acquirer) = build(
            MockTransport::new().fail(Method::Post, LOGIN),
            &auth(TokenPolicy::PerRequest),
        );
        assert!(acquirer.acquire_token().await.is_none());
    }

    #[tokio::test]
    async fn test_per_request_logs_in_every_time() {
        let (mock, acquirer) = build(
            MockTransport::new().on_post(LOGIN, "", 200, r#"{"result":"tok"}"#),
            &auth(TokenPolicy::PerRequest),
        );
        acquirer.acquire_token().await.unwrap();
        acquirer.acquire_token().await.unwrap();
        assert_eq!(mock.count(Method::Post, LOGIN), 2);
    }

    #[tokio::test]
    async fn test_cached_policy_reuses_until_invalidated() {
        let (mock, acquirer) = build(
            MockTransport::new().on_post(LOGIN, "", 200, r#"{"result":"tok"}"#),
            &auth(TokenPolicy::Cached { ttl_secs: 600 }),
        );
        acquirer.acquire_token().await.unwrap();
        acquirer.acquire_token().await.unwrap();
        assert_eq!(mock.count(Method::Post, LOGIN), 1);

        acquirer.invalidate();
        acquirer.acquire_token().await.unwrap();
        assert_eq!(mock.count(Method::Post, LOGIN), 2);
    }

    #[test]
    fn test_token_cache_expiry() {
        let cache = TokenCache::new(Duration::from_secs(60));
        let start = Utc::now();
        cache.store_at(BearerToken::new("t").unwrap(), start);

        assert!(cache.get_at(start + chrono::Duration::seconds(59)).is_some());
        assert!(cache.get_at(start + chrono::Duration::seconds(60)).is_none());

        cache.invalidate();
        assert!(cache.get_at(start).is_none());
    }
}
