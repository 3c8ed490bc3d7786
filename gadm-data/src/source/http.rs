//! HTTP implementation of [`ArchiveSource`] backed by `reqwest`.

use std::io::{self, Write};
use std::time::Duration;

use futures_util::StreamExt;
use gadm_core::ArchiveUrl;
use log::debug;
use reqwest::{Client, Response};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{ArchiveSource, SourceBuildError, TransportError};

/// Default user agent for archive downloads.
pub const DEFAULT_USER_AGENT: &str = "gadm-maps/0.1";

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpArchiveSource`].
///
/// No overall request timeout is applied unless one is configured; large
/// country archives can take minutes on slow links.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use gadm_data::source::HttpArchiveSourceConfig;
///
/// let config = HttpArchiveSourceConfig::default()
///     .with_user_agent("atlas/2.0")
///     .with_timeout(Duration::from_secs(600));
/// assert_eq!(config.user_agent, "atlas/2.0");
/// assert_eq!(config.timeout, Some(Duration::from_secs(600)));
/// ```
#[derive(Debug, Clone)]
pub struct HttpArchiveSourceConfig {
    /// User agent string for requests.
    pub user_agent: String,
    /// Overall request timeout.
    pub timeout: Option<Duration>,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
}

impl Default for HttpArchiveSourceConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl HttpArchiveSourceConfig {
    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the overall request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Blocking HTTP archive downloader.
///
/// When called from inside a multi-threaded Tokio runtime the download runs
/// on that runtime via [`tokio::task::block_in_place`]; otherwise the owned
/// current-thread runtime drives it.
pub struct HttpArchiveSource {
    client: Client,
    config: HttpArchiveSourceConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpArchiveSource")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpArchiveSource {
    /// Create a source with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, SourceBuildError> {
        Self::with_config(HttpArchiveSourceConfig::default())
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpArchiveSourceConfig) -> Result<Self, SourceBuildError> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(SourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &HttpArchiveSourceConfig {
        &self.config
    }

    async fn call(&self, url: &str) -> Result<Response, TransportError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, url))
    }

    async fn download_async(
        &self,
        url: &ArchiveUrl,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        let response = self.call(url).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|err| convert_reqwest_error(&err, url))?;
            sink.write_all(&bytes)
                .map_err(|source| TransportError::Network {
                    url: url.to_string(),
                    source,
                })?;
            written += bytes.len() as u64;
        }
        sink.flush().map_err(|source| TransportError::Network {
            url: url.to_string(),
            source,
        })?;
        debug!("downloaded {written} bytes from {url}");
        Ok(written)
    }
}

impl ArchiveSource for HttpArchiveSource {
    fn download_archive(
        &self,
        url: &ArchiveUrl,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        let future = self.download_async(url, sink);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own runtime.
            _ => self.runtime.block_on(future),
        }
    }
}

fn convert_reqwest_error(error: &reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error.to_string()),
    }
}
