//! Search engine configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use turbo_data::FetchClient;

use crate::error::ConfigError;
use crate::fetcher::HttpCatalogFetcher;
use crate::money::Currency;
use crate::params::{RequestOptions, SearchScope, MAX_PAGE_SIZE};
use crate::retry::{BackoffStrategy, RetryPolicy};
use crate::suggestions::DEFAULT_MIN_CHARS;

/// Configuration file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Commerce backend connection.
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Items per page (1 to 200).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Characters required before suggestions are requested.
    #[serde(default = "default_min_chars")]
    pub suggestion_min_chars: usize,

    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: u32,

    /// Expansion options sent with every search.
    #[serde(default)]
    pub request: RequestOptions,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Backend connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// e.g. `https://kv7kzm78.api.commercecloud.salesforce.com`
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub organization_id: String,

    #[serde(default)]
    pub site_id: String,

    /// Shopper access token; usually supplied through `TURBO_ACCESS_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Retry settings for transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_min_chars() -> usize {
    DEFAULT_MIN_CHARS
}

fn default_suggestion_limit() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_backoff_max_ms() -> u64 {
    2_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            locale: default_locale(),
            currency: default_currency(),
            page_size: default_page_size(),
            suggestion_min_chars: default_min_chars(),
            suggestion_limit: default_suggestion_limit(),
            request: RequestOptions::default(),
            retry: RetryConfig::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl SearchConfig {
    /// Load config from a TOML or JSON file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display,
                message: e.to_string(),
            })
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display,
                message: e.to_string(),
            })
        }
    }

    /// Apply `TURBO_*` overrides from `(name, value)` pairs.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            match name.as_str() {
                "TURBO_BASE_URL" => self.backend.base_url = value,
                "TURBO_ORGANIZATION_ID" => self.backend.organization_id = value,
                "TURBO_SITE_ID" => self.backend.site_id = value,
                "TURBO_ACCESS_TOKEN" => self.backend.access_token = Some(value),
                "TURBO_LOCALE" => self.locale = value,
                "TURBO_CURRENCY" => self.currency = value,
                "TURBO_PAGE_SIZE" => {
                    self.page_size = value.parse().map_err(|_| {
                        ConfigError::Invalid(format!("TURBO_PAGE_SIZE is not a number: {}", value))
                    })?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Check that the configuration can drive a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let backend = &self.backend;
        if !(backend.base_url.starts_with("http://") || backend.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url must be an http(s) URL, got {:?}",
                backend.base_url
            )));
        }
        if backend.organization_id.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.organization_id is required".into()));
        }
        if backend.site_id.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.site_id is required".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if Currency::from_code(&self.currency).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unsupported currency {:?}",
                self.currency
            )));
        }
        if self.suggestion_min_chars == 0 {
            return Err(ConfigError::Invalid("suggestion_min_chars must be at least 1".into()));
        }
        if self.retry.backoff_base_ms > self.retry.backoff_max_ms {
            return Err(ConfigError::Invalid(
                "retry.backoff_base_ms must not exceed retry.backoff_max_ms".into(),
            ));
        }
        Ok(())
    }

    /// Session-wide search scope.
    pub fn scope(&self) -> SearchScope {
        SearchScope::new(self.page_size, &self.locale, &self.currency)
            .with_options(self.request.clone())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts).with_backoff(BackoffStrategy::Exponential {
            base: Duration::from_millis(self.retry.backoff_base_ms),
            max: Duration::from_millis(self.retry.backoff_max_ms),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// HTTP fetcher for the configured backend.
    pub fn http_fetcher(&self) -> HttpCatalogFetcher {
        let client = FetchClient::new()
            .with_base_url(&self.backend.base_url)
            .with_timeout(self.timeout());
        let fetcher = HttpCatalogFetcher::new(
            client,
            &self.backend.organization_id,
            &self.backend.site_id,
        );
        match &self.backend.access_token {
            Some(token) => fetcher.with_access_token(token),
            None => fetcher,
        }
    }
}

/// Generate a default `turbo.toml` config file.
pub fn generate_default_config() -> String {
    r#"# Catalog search configuration

locale = "en-US"
currency = "USD"
page_size = 25
suggestion_min_chars = 3
suggestion_limit = 5
timeout_ms = 10000

[backend]
base_url = "https://kv7kzm78.api.commercecloud.salesforce.com"
organization_id = "f_ecom_zzrf_001"
site_id = "RefArch"
# access_token is read from TURBO_ACCESS_TOKEN

[request]
expand = ["images", "prices"]
all_images = false
per_pricebook = false

[retry]
max_attempts = 2
backoff_base_ms = 200
backoff_max_ms = 2000
"#
    .to_string()
}
