use market_core::{ProviderFailure, ProviderResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Classification of errors for retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableError {
    /// 429 Rate Limit - retry with longer delays
    RateLimit,
    /// 5xx Server Error - retry with medium delays
    ServerError,
    /// Network timeout or dropped connection - retry with shorter delays
    Timeout,
    /// Other errors - don't retry
    Other,
}

impl RetryableError {
    /// Malformed payloads, missing data and 4xx responses are not retried
    pub fn classify(failure: &ProviderFailure) -> Self {
        match failure {
            ProviderFailure::RateLimited => RetryableError::RateLimit,
            ProviderFailure::HttpStatus(status) if *status >= 500 => RetryableError::ServerError,
            ProviderFailure::Timeout | ProviderFailure::Transport(_) => RetryableError::Timeout,
            ProviderFailure::HttpStatus(_)
            | ProviderFailure::Malformed(_)
            | ProviderFailure::NoData => RetryableError::Other,
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including initial attempt)
    pub max_attempts: u32,
    /// Delays for rate limit errors (milliseconds)
    pub rate_limit_delays_ms: Vec<u64>,
    /// Delays for server errors (milliseconds)
    pub server_error_delays_ms: Vec<u64>,
    /// Delays for timeout errors (milliseconds)
    pub timeout_delays_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delays_ms: vec![500, 1000, 2000],
            server_error_delays_ms: vec![300, 600, 1200],
            timeout_delays_ms: vec![500, 1000],
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Get the delay for a specific retry attempt and error type.
    /// Attempts past the end of a delay list reuse its last entry.
    fn get_delay(&self, attempt: u32, error_type: RetryableError) -> Option<Duration> {
        let delays = match error_type {
            RetryableError::RateLimit => &self.rate_limit_delays_ms,
            RetryableError::ServerError => &self.server_error_delays_ms,
            RetryableError::Timeout => &self.timeout_delays_ms,
            RetryableError::Other => return None,
        };

        delays
            .get(attempt as usize)
            .or_else(|| delays.last())
            .map(|&delay_ms| Duration::from_millis(delay_ms))
    }
}

/// Retry an async operation with classified backoff
///
/// # Arguments
/// * `operation` - The async operation to retry (a closure returning a Future)
/// * `config` - Retry configuration
/// * `classify_error` - Function to classify errors for retry strategy
///
/// # Returns
/// * `Ok(T)` - Operation succeeded (either on first attempt or after retries)
/// * `Err(E)` - The last error, once retries are exhausted or it is not retryable
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    config: &RetryConfig,
    classify_error: impl Fn(&E) -> RetryableError,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("Operation succeeded after {} retry attempts", attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                let error_type = classify_error(&e);

                if error_type == RetryableError::Other {
                    debug!("Operation failed with non-retryable error: {}", e);
                    return Err(e);
                }

                if attempt >= config.max_attempts {
                    if config.max_attempts > 0 {
                        warn!(
                            "Operation failed after {} attempts (max retries exhausted): {}",
                            attempt + 1,
                            e
                        );
                    }
                    return Err(e);
                }

                let delay = match config.get_delay(attempt, error_type) {
                    Some(d) => d,
                    None => return Err(e),
                };

                warn!(
                    "Operation failed (attempt {}/{}): {} - Retrying in {}ms (error type: {:?})",
                    attempt + 1,
                    config.max_attempts + 1,
                    e,
                    delay.as_millis(),
                    error_type
                );

                tokio::time::sleep(delay).await;

                attempt += 1;
            }
        }
    }
}

/// Retries a provider call according to its failure kind.
///
/// The outcome of the last attempt is returned as-is; a provider failure never
/// turns into an error here.
pub async fn retry_provider_call<F, Fut, T>(mut operation: F, config: &RetryConfig) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    if !config.is_enabled() {
        return operation().await;
    }

    retry_with_backoff(
        || {
            let call = operation();
            async move { call.await.into_result() }
        },
        config,
        RetryableError::classify,
    )
    .await
    .into()
}
