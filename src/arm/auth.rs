//! Credentials
//!
//! Bearer tokens come from the `ARM_ACCESS_TOKEN` environment variable or
//! from the Azure CLI (`az account get-access-token`). Tokens are cached and
//! refreshed shortly before they expire.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Resource the tokens are requested for
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Environment variable holding a pre-issued bearer token
pub const TOKEN_ENV_VAR: &str = "ARM_ACCESS_TOKEN";

/// Refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// TTL assumed when the issuer does not report one
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// An issued bearer token
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<AccessToken>;
}

/// Token taken verbatim from the environment
pub struct EnvTokenSource;

#[async_trait]
impl TokenSource for EnvTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken> {
        let token = std::env::var(TOKEN_ENV_VAR)
            .map_err(|_| Error::Credential(format!("{TOKEN_ENV_VAR} is not set")))?;
        if token.trim().is_empty() {
            return Err(Error::Credential(format!("{TOKEN_ENV_VAR} is empty")));
        }
        Ok(AccessToken {
            token: token.trim().to_string(),
            expires_on: None,
        })
    }
}

/// Token issued by the Azure CLI
pub struct AzureCliTokenSource;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
}

#[async_trait]
impl TokenSource for AzureCliTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken> {
        let output = tokio::process::Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                MANAGEMENT_RESOURCE,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| Error::Credential(format!("Failed to run az: {e}")))?;

        if !output.status.success() {
            return Err(Error::Credential(
                "az account get-access-token failed. Run 'az login'".to_string(),
            ));
        }

        let parsed: CliToken = serde_json::from_slice(&output.stdout)?;
        Ok(AccessToken {
            token: parsed.access_token,
            expires_on: parsed.expires_on.as_deref().and_then(parse_cli_expiry),
        })
    }
}

/// The CLI reports local time without an offset (`2026-01-15 10:30:00.000000`)
fn parse_cli_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    chrono::Local
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Credential holder with token caching
#[derive(Clone)]
pub struct Credentials {
    source: Arc<dyn TokenSource>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl Credentials {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Environment token when set, Azure CLI otherwise
    pub fn from_environment() -> Self {
        if std::env::var(TOKEN_ENV_VAR).is_ok_and(|t| !t.trim().is_empty()) {
            tracing::debug!("Using bearer token from {}", TOKEN_ENV_VAR);
            Self::new(Arc::new(EnvTokenSource))
        } else {
            tracing::debug!("Using Azure CLI credentials");
            Self::new(Arc::new(AzureCliTokenSource))
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let issued = self.source.fetch_token().await?;
        let ttl = issued
            .expires_on
            .and_then(|at| (at - Utc::now()).to_std().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: issued.token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(issued.token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }
        self.get_token().await
    }
}

/// Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|p| p.join(".azure"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Subscription ids are GUIDs
fn validate_subscription_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

/// Read the default subscription from the environment or the CLI profile
pub fn get_default_subscription() -> Option<String> {
    if let Ok(sub) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&sub) {
            return Some(sub);
        }
        tracing::warn!("Invalid subscription id format in AZURE_SUBSCRIPTION_ID");
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(profile_path).ok()?;
    default_subscription_from_profile(&content)
}

fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The CLI writes the profile with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');
    let profile: AzureProfile = serde_json::from_str(content).ok()?;
    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default)
        .map(|s| s.id)
        .filter(|id| validate_subscription_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        expires_on: Option<DateTime<Utc>>,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken {
                token: format!("token-{n}"),
                expires_on: self.expires_on,
            })
        }
    }

    #[tokio::test]
    async fn test_token_is_cached_until_refresh() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            expires_on: None,
        });
        let credentials = Credentials::new(source.clone());

        assert_eq!(credentials.get_token().await.unwrap(), "token-0");
        assert_eq!(credentials.get_token().await.unwrap(), "token-0");
        assert_eq!(credentials.refresh_token().await.unwrap(), "token-1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nearly_expired_token_is_not_reused() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            expires_on: Some(Utc::now() + chrono::Duration::seconds(30)),
        });
        let credentials = Credentials::new(source.clone());

        credentials.get_token().await.unwrap();
        credentials.get_token().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_subscription_from_profile() {
        let profile = "\u{feff}{\"subscriptions\": [
            {\"id\": \"00000000-0000-0000-0000-000000000001\", \"isDefault\": false},
            {\"id\": \"00000000-0000-0000-0000-000000000002\", \"isDefault\": true}
        ]}";
        assert_eq!(
            default_subscription_from_profile(profile).as_deref(),
            Some("00000000-0000-0000-0000-000000000002")
        );
        assert!(default_subscription_from_profile("{\"subscriptions\": []}").is_none());
    }

    #[test]
    fn test_parse_cli_expiry() {
        assert!(parse_cli_expiry("2026-01-15 10:30:00.000000").is_some());
        assert!(parse_cli_expiry("not a date").is_none());
    }
}
