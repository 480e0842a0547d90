//! HTTP client with connection pooling and retry logic

use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Request, Response, StatusCode};
use sandbuild_config::NetworkConfig;
use sandbuild_errors::{Error, NetworkError};
use sandbuild_events::{AppEvent, DownloadEvent, EventEmitter, EventSender};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    /// Total attempts per logical request, including the first
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * retry_base_delay`
    pub retry_base_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            pool_idle_timeout: config.pool_idle_timeout(),
            pool_max_idle_per_host: config.pool_max_idle_per_host,
            max_attempts: config.max_attempts,
            retry_base_delay: config.retry_base_delay(),
            user_agent: format!("sandbuild/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

static SHARED: OnceLock<NetClient> = OnceLock::new();

/// HTTP client wrapper with retry logic.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
    events: Option<EventSender>,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::ClientInit` if the underlying client cannot be
    /// built from the configuration.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        // reqwest has no max-lifetime knob; the idle bound is what keeps
        // pooled connections fresh.
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            config,
            events: None,
        })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// The process-wide client, built with default settings on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the first initialization fails.
    pub fn shared() -> Result<&'static NetClient, Error> {
        if let Some(client) = SHARED.get() {
            return Ok(client);
        }
        let client = Self::with_defaults()?;
        // A concurrent initializer may have won; either instance is fine.
        let _ = SHARED.set(client);
        SHARED
            .get()
            .ok_or_else(|| Error::internal("shared network client missing after init"))
    }

    /// Attach an event sender
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Execute a GET request with retries
    ///
    /// # Errors
    ///
    /// See [`NetClient::execute`].
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Response, Error> {
        let request = self
            .client
            .request(Method::GET, url)
            .build()
            .map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;
        self.execute(request, cancel).await
    }

    /// Send `request`, retrying transient failures.
    ///
    /// A response with status 408, 429 or 5xx is retried unless it came from
    /// the final attempt, in which case it is returned as is. Connection
    /// failures and client-side timeouts are retried the same way and
    /// surface as errors after the final attempt. The wait between attempts
    /// honours `Retry-After` when present and is `attempt * base delay`
    /// otherwise.
    ///
    /// A request whose body cannot be cloned is sent exactly once.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` as soon as `cancel` fires, and the mapped
    /// transport error once retries are exhausted.
    pub async fn execute(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, Error> {
        let url = request.url().to_string();
        let max_attempts = self.config.max_attempts.max(1);
        let mut original = Some(request);

        for attempt in 1..=max_attempts {
            let replay = if attempt < max_attempts {
                original.as_ref().and_then(Request::try_clone)
            } else {
                None
            };
            let is_final = replay.is_none();
            let request = match replay {
                Some(request) => request,
                None => original
                    .take()
                    .ok_or_else(|| Error::internal("request consumed before final attempt"))?,
            };

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                result = self.client.execute(request) => result,
            };

            let (delay, reason) = match outcome {
                Ok(response) if is_final || !is_transient_status(response.status()) => {
                    return Ok(response);
                }
                Ok(response) => {
                    let delay = retry_after(response.headers(), Utc::now())
                        .unwrap_or_else(|| self.backoff(attempt));
                    // dropping the response discards its body
                    (delay, format!("HTTP {}", response.status()))
                }
                Err(e) if !is_final && is_transient_error(&e) => (self.backoff(attempt), e.to_string()),
                Err(e) => {
                    let err = map_error(&url, &e);
                    self.emit(AppEvent::Download(DownloadEvent::Failed {
                        url: url.clone(),
                        message: err.to_string(),
                    }));
                    return Err(err);
                }
            };

            self.emit(AppEvent::Download(DownloadEvent::Retrying {
                url: url.clone(),
                attempt,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason,
            }));
            sleep_or_cancel(delay, cancel).await?;
        }

        unreachable!("retry loop for {url} ended without returning")
    }

    /// Stream the body at `url` into `dest`, returning the byte count
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::HttpError` for a non-success final status, a
    /// transport or I/O error while streaming, or `Error::Cancelled`.
    pub async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, Error> {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url.to_string(),
        }));

        let response = self.get(url, cancel).await?;
        let status = response.status();
        if !status.is_success() {
            let err: Error = NetworkError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into();
            self.emit(AppEvent::Download(DownloadEvent::Failed {
                url: url.to_string(),
                message: err.to_string(),
            }));
            return Err(err);
        }

        // The body lands in a sibling file first so an interrupted transfer
        // never leaves a truncated `dest` behind.
        let partial = partial_path(dest);
        let written = match self.stream_body(response, &partial, cancel).await {
            Ok(written) => written,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                self.emit(AppEvent::Download(DownloadEvent::Failed {
                    url: url.to_string(),
                    message: err.to_string(),
                }));
                return Err(err);
            }
        };
        if let Err(e) = tokio::fs::rename(&partial, dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(Error::io_with_path(&e, dest));
        }

        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.to_string(),
            bytes: written,
        }));
        Ok(written)
    }

    async fn stream_body(
        &self,
        response: Response,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, Error> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io_with_path(&e, path))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Ok(written)
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config
            .retry_base_delay
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }
}

impl EventEmitter for NetClient {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

fn map_error(url: &str, error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
        .into()
    } else if error.is_connect() {
        NetworkError::ConnectionRefused(error.to_string()).into()
    } else if error.is_builder() {
        NetworkError::InvalidUrl(error.to_string()).into()
    } else {
        NetworkError::DownloadFailed(error.to_string()).into()
    }
}

/// Delay requested by a `Retry-After` header: either delta-seconds or an
/// HTTP date. A date in the past means "now".
pub(crate) fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        (at.with_timezone(&Utc) - now)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<(), Error> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
