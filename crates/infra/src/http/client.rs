//! Outbound HTTP for the source adapters
//!
//! Every adapter talks to a rate-limited SaaS API. The client retries
//! throttled (429) and server-error responses as well as transport failures,
//! up to the configured attempt count. A `Retry-After` header in seconds
//! overrides the exponential delay, capped at [`MAX_RETRY_AFTER`].

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use workdash_domain::{HttpConfig, WorkdashError};

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("workdash/", env!("CARGO_PKG_VERSION"));

/// Longest server-requested pause honored between attempts.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Shared HTTP client; cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    policy: RetryPolicy,
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Exponential delay before retry number `retry` (1-based).
    fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(8);
        self.base_delay.saturating_mul(factor)
    }

    fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Whether a response is worth another attempt.
fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// `Retry-After` in whole seconds. HTTP-date values are ignored.
fn retry_after(response: &Response) -> Option<Duration> {
    let raw = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    let seconds = raw.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with a 30s timeout and a single attempt.
    pub fn new() -> Result<Self, WorkdashError> {
        Self::builder().build()
    }

    /// Client honoring the application's HTTP settings.
    pub fn from_config(config: &HttpConfig) -> Result<Self, WorkdashError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .max_attempts(config.max_attempts)
            .build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Send `builder`, retrying per the client's policy.
    ///
    /// The final response is returned whatever its status; callers decide
    /// what a non-success status means for their source. Only transport
    /// failures become errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, WorkdashError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    WorkdashError::Internal("streaming request bodies cannot be retried".into())
                })?
                .build()
                .map_err(InfraError::from)?;
            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            let pause = match self.inner.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    if !retryable_status(status) || !self.policy.has_attempts_after(attempt) {
                        return Ok(response);
                    }
                    let pause =
                        retry_after(&response).unwrap_or_else(|| self.policy.delay(attempt));
                    warn!(
                        attempt,
                        %url,
                        %status,
                        delay_ms = pause.as_millis() as u64,
                        "retrying HTTP request"
                    );
                    pause
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    if !retryable_error(&err) || !self.policy.has_attempts_after(attempt) {
                        return Err(InfraError::from(err).into());
                    }
                    self.policy.delay(attempt)
                }
            };

            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: u32,
    base_delay: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 1,
            base_delay: Duration::from_millis(250),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts per request; 1 disables retries.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// First retry delay; later retries double it.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, WorkdashError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(InfraError::from)?;

        Ok(HttpClient {
            inner,
            policy: RetryPolicy { max_attempts: self.max_attempts, base_delay: self.base_delay },
        })
    }
}
