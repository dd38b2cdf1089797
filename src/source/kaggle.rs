//! Primary-source client for the Kaggle competition API.
//!
//! Provides credential loading from the well-known `kaggle.json` file, a
//! trait-based abstraction over the competition download endpoint (enabling
//! dependency injection for testing), and the rate-limit classification that
//! drives the retry loop in [`crate::fetch`].

use crate::error::{B2tError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use camino::Utf8Path;
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL of the Kaggle public API.
pub const KAGGLE_API_BASE: &str = "https://www.kaggle.com/api/v1";

/// Connection timeout for download requests.
///
/// Only connection establishment is bounded; body transfer is left
/// unbounded because competition bundles run to gigabytes and the retry
/// loop is the sole limit on total attempts.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication material read from `kaggle.json`.
///
/// The file is a JSON object with `username` and `key` fields, downloaded
/// from the Kaggle account settings page. The key is an API token and is
/// redacted from debug output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct KaggleCredentials {
    /// Kaggle account username.
    pub username: String,
    /// Kaggle API key.
    pub key: String,
}

impl KaggleCredentials {
    /// Build the HTTP basic `Authorization` header value for these
    /// credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use b2t::source::kaggle::KaggleCredentials;
    ///
    /// let credentials = KaggleCredentials {
    ///     username: "alice".to_owned(),
    ///     key: "secret".to_owned(),
    /// };
    /// assert_eq!(
    ///     credentials.authorization_header(),
    ///     "Basic YWxpY2U6c2VjcmV0"
    /// );
    /// ```
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.key));
        format!("Basic {token}")
    }
}

impl fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Load credentials from `path`.
///
/// Returns `Ok(None)` when the file does not exist — an absent credential
/// file is a classified outcome, not an error. A file that exists but
/// cannot be read or parsed is an error, so that a typo in `kaggle.json`
/// is reported rather than silently treated as "not configured".
///
/// # Errors
///
/// Returns [`B2tError::CredentialsUnreadable`] when the file exists but is
/// unreadable or not valid credential JSON.
pub fn load_credentials(path: &Utf8Path) -> Result<Option<KaggleCredentials>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents =
        std::fs::read_to_string(path.as_std_path()).map_err(|e| B2tError::CredentialsUnreadable {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
    let credentials =
        serde_json::from_str(&contents).map_err(|e| B2tError::CredentialsUnreadable {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
    Ok(Some(credentials))
}

/// Errors arising from competition download requests.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The source rejected the request due to rate limiting.
    #[error("rate limited by {url}: {reason}")]
    RateLimited {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the rejection.
        reason: String,
    },

    /// HTTP request failed for a non-rate-limit reason.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The competition was not found (HTTP 404).
    #[error("competition not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded bundle.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether this error carries a rate-limit signature.
    ///
    /// An explicit HTTP 429 always qualifies. Errors that arrive as opaque
    /// messages qualify when the text mentions `429` or `Too Many
    /// Requests`, matching how upstream tooling reports throttling.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Http { reason, .. } => {
                reason.contains("429") || reason.contains("Too Many Requests")
            }
            Self::NotFound { .. } | Self::Io(_) => false,
        }
    }
}

/// Trait for downloading a competition's data bundle.
///
/// Abstraction allows tests to script source behaviour without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait CompetitionClient {
    /// Download the competition's full data bundle into `dest_dir`.
    ///
    /// The bundle may arrive as one or more archive files; extraction is
    /// the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] classified for the retry loop: only
    /// rate-limit errors are retryable.
    fn download_all(
        &self,
        credentials: &KaggleCredentials,
        competition: &str,
        dest_dir: &Utf8Path,
    ) -> std::result::Result<(), DownloadError>;
}

/// HTTP-based client using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KaggleClient;

impl KaggleClient {
    /// Construct the download-all URL for a competition identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use b2t::source::kaggle::KaggleClient;
    ///
    /// let url = KaggleClient::download_url("brain-to-text-25");
    /// assert!(url.ends_with("/competitions/data/download-all/brain-to-text-25"));
    /// ```
    #[must_use]
    pub fn download_url(competition: &str) -> String {
        format!("{KAGGLE_API_BASE}/competitions/data/download-all/{competition}")
    }
}

impl CompetitionClient for KaggleClient {
    fn download_all(
        &self,
        credentials: &KaggleCredentials,
        competition: &str,
        dest_dir: &Utf8Path,
    ) -> std::result::Result<(), DownloadError> {
        let url = Self::download_url(competition);
        log::debug!("requesting {url}");
        let authorization = credentials.authorization_header();
        let response = http_agent()
            .get(&url)
            .header("Authorization", authorization.as_str())
            .call()
            .map_err(|e| map_ureq_error(&url, &e))?;

        let bundle_path = dest_dir.join(format!("{competition}.zip"));
        let mut file = std::fs::File::create(bundle_path.as_std_path())?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(())
    }
}

/// Shared `ureq` agent with connection timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(429) => DownloadError::RateLimited {
            url: url.to_owned(),
            reason: "HTTP 429 Too Many Requests".to_owned(),
        },
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
