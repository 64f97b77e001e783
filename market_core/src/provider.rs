use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a single provider call for a single asset produced no payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderFailure {
    /// The bounded request timeout elapsed
    Timeout,
    /// HTTP 429
    RateLimited,
    /// Any other non-2xx status
    HttpStatus(u16),
    /// Body could not be decoded into the provider's payload shape
    Malformed(String),
    /// Connection / DNS / TLS level failure
    Transport(String),
    /// Provider answered but had nothing for this asset
    NoData,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailure::Timeout => write!(f, "request timed out"),
            ProviderFailure::RateLimited => write!(f, "rate limit exceeded"),
            ProviderFailure::HttpStatus(status) => write!(f, "HTTP {}", status),
            ProviderFailure::Malformed(reason) => write!(f, "malformed payload: {}", reason),
            ProviderFailure::Transport(reason) => write!(f, "transport error: {}", reason),
            ProviderFailure::NoData => write!(f, "no data"),
        }
    }
}

/// Outcome of one provider call for one asset.
///
/// Provider clients always hand back one of these; failures never escape as
/// errors or panics.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult<T> {
    Ok(T),
    Failed(ProviderFailure),
}

impl<T> ProviderResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderResult::Ok(_))
    }

    pub fn is_failed(&self) -> bool {
        !self.is_ok()
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ProviderResult::Ok(value) => Some(value),
            ProviderResult::Failed(_) => None,
        }
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            ProviderResult::Ok(value) => Some(value),
            ProviderResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProviderFailure> {
        match self {
            ProviderResult::Ok(_) => None,
            ProviderResult::Failed(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResult<U> {
        match self {
            ProviderResult::Ok(value) => ProviderResult::Ok(f(value)),
            ProviderResult::Failed(reason) => ProviderResult::Failed(reason),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.ok().unwrap_or(default)
    }

    pub fn into_result(self) -> Result<T, ProviderFailure> {
        match self {
            ProviderResult::Ok(value) => Ok(value),
            ProviderResult::Failed(reason) => Err(reason),
        }
    }
}

impl<T> From<Result<T, ProviderFailure>> for ProviderResult<T> {
    fn from(result: Result<T, ProviderFailure>) -> Self {
        match result {
            Ok(value) => ProviderResult::Ok(value),
            Err(reason) => ProviderResult::Failed(reason),
        }
    }
}
