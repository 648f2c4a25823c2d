//! Remote resource catalog client.
//!
//! # Responsibility
//! - Fetch the catalog JSON listing languages and downloadable resources.
//! - Download resource-container zips to disk.
//! - Classify failures as HTTP status, I/O or decode errors.
//!
//! # Invariants
//! - Every request uses the configured timeout.
//! - Retries apply only to 5xx responses, timeouts and connection failures,
//!   with exponential backoff between attempts.
//! - Downloads are written to a `.part` file and renamed on success.

use crate::config::AppConfig;
use crate::model::language::TextDirection;
use log::{info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No catalog URL configured.
    NotConfigured,
    InvalidUrl(String),
    /// Server answered with a non-success status.
    Http { status: u16, url: String },
    /// Connection, timeout or local file failure.
    Io(String),
    /// Response body is not a valid catalog.
    Decode(String),
}

impl CatalogError {
    /// Short message suitable for showing to users.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured => "catalog is not configured".to_string(),
            Self::InvalidUrl(_) => "catalog address is invalid".to_string(),
            Self::Http { status, .. } => format!("server error (HTTP {status})"),
            Self::Io(_) => "network unavailable".to_string(),
            Self::Decode(_) => "catalog is corrupted".to_string(),
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "catalog url is not configured"),
            Self::InvalidUrl(url) => write!(f, "invalid catalog url `{url}`"),
            Self::Http { status, url } => write!(f, "http status {status} from {url}"),
            Self::Io(message) => write!(f, "catalog i/o error: {message}"),
            Self::Decode(message) => write!(f, "catalog decode error: {message}"),
        }
    }
}

impl Error for CatalogError {}

/// Remote catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub languages: Vec<CatalogLanguage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLanguage {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub anglicized_name: String,
    #[serde(default)]
    pub direction: TextDirection,
    #[serde(default)]
    pub gateway: bool,
    #[serde(default)]
    pub resources: Vec<CatalogResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
}

impl Catalog {
    /// Finds a downloadable resource by language slug and type.
    pub fn find(
        &self,
        language_slug: &str,
        kind: &str,
    ) -> Option<(&CatalogLanguage, &CatalogResource)> {
        self.languages
            .iter()
            .filter(|language| language.slug.eq_ignore_ascii_case(language_slug))
            .find_map(|language| {
                language
                    .resources
                    .iter()
                    .find(|resource| resource.kind.eq_ignore_ascii_case(kind))
                    .map(|resource| (language, resource))
            })
    }

    /// Every `(language, resource)` pair in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (&CatalogLanguage, &CatalogResource)> {
        self.languages.iter().flat_map(|language| {
            language
                .resources
                .iter()
                .map(move |resource| (language, resource))
        })
    }
}

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(MAX_BACKOFF)
    }
}

/// Blocking HTTP client for the resource catalog.
pub struct CatalogClient {
    http: Client,
    catalog_url: Option<String>,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(config: &AppConfig) -> CatalogResult<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(config.http_timeout)
            .user_agent(concat!("glossary/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CatalogError::Io(err.to_string()))?;

        Ok(Self {
            http,
            catalog_url: config.catalog_url.clone(),
            retry: RetryPolicy {
                max_attempts: config.retry_max_attempts.max(1),
                base_delay: config.retry_backoff_base,
            },
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches and decodes the remote catalog.
    pub fn fetch_catalog(&self) -> CatalogResult<Catalog> {
        let url = self
            .catalog_url
            .as_deref()
            .ok_or(CatalogError::NotConfigured)?;
        info!("event=catalog_fetch module=catalog status=start");

        let response = self.get_with_retry(url)?;
        let body = response
            .bytes()
            .map_err(|err| CatalogError::Io(err.to_string()))?;
        let catalog: Catalog =
            serde_json::from_slice(&body).map_err(|err| CatalogError::Decode(err.to_string()))?;

        info!(
            "event=catalog_fetch module=catalog status=ok languages={}",
            catalog.languages.len()
        );
        Ok(catalog)
    }

    /// Downloads `url` to `dest`, returning the number of bytes written.
    pub fn download(&self, url: &str, dest: &Path) -> CatalogResult<u64> {
        let mut response = self.get_with_retry(url)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|err| CatalogError::Io(err.to_string()))?;
        }

        let partial = dest.with_extension("part");
        let written = match write_body(&mut response, &partial) {
            Ok(written) => written,
            Err(err) => {
                let _ = std::fs::remove_file(&partial);
                return Err(err);
            }
        };
        if let Err(err) = std::fs::rename(&partial, dest) {
            let _ = std::fs::remove_file(&partial);
            return Err(CatalogError::Io(err.to_string()));
        }

        info!(
            "event=resource_download module=catalog status=ok bytes={}",
            written
        );
        Ok(written)
    }

    fn get_with_retry(&self, url: &str) -> CatalogResult<Response> {
        let parsed = Url::parse(url).map_err(|_| CatalogError::InvalidUrl(url.to_string()))?;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.http.get(parsed.clone()).send() {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && attempt < max_attempts {
                        self.backoff(attempt, max_attempts, &format!("status={}", status.as_u16()));
                        continue;
                    }
                    return Err(CatalogError::Http {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Err(err) => {
                    let retryable = err.is_timeout() || err.is_connect();
                    if retryable && attempt < max_attempts {
                        self.backoff(attempt, max_attempts, "error=transport");
                        continue;
                    }
                    return Err(CatalogError::Io(err.to_string()));
                }
            }
        }
    }

    fn backoff(&self, attempt: u32, max_attempts: u32, reason: &str) {
        let delay = self.retry.delay_after(attempt);
        warn!(
            "event=http_retry module=catalog status=retry attempt={} max_attempts={} delay_ms={} {}",
            attempt,
            max_attempts,
            delay.as_millis(),
            reason
        );
        std::thread::sleep(delay);
    }
}

fn write_body(response: &mut Response, partial: &Path) -> CatalogResult<u64> {
    let file = File::create(partial).map_err(|err| CatalogError::Io(err.to_string()))?;
    let mut writer = BufWriter::new(file);
    let written = response
        .copy_to(&mut writer)
        .map_err(|err| CatalogError::Io(err.to_string()))?;
    writer
        .flush()
        .map_err(|err| CatalogError::Io(err.to_string()))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogError, RetryPolicy};
    use std::time::Duration;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(40), Duration::from_secs(30));
    }

    #[test]
    fn catalog_find_matches_language_and_type() {
        let catalog: Catalog = serde_json::from_str(
            r#"{"languages":[{"slug":"en","name":"English","gateway":true,
                "resources":[{"type":"ulb","version":"12","url":"https://example.org/en_ulb.zip"}]},
               {"slug":"ar","name":"Arabic","direction":"rtl","resources":[]}]}"#,
        )
        .unwrap();

        let (language, resource) = catalog.find("EN", "ulb").unwrap();
        assert_eq!(language.slug, "en");
        assert_eq!(resource.version, "12");
        assert!(catalog.find("ar", "ulb").is_none());
        assert_eq!(catalog.entries().count(), 1);
    }

    #[test]
    fn user_messages_are_short() {
        let err = CatalogError::Http {
            status: 503,
            url: "https://example.org".to_string(),
        };
        assert_eq!(err.user_message(), "server error (HTTP 503)");
        assert_eq!(
            CatalogError::Decode("eof".to_string()).user_message(),
            "catalog is corrupted"
        );
    }
}
