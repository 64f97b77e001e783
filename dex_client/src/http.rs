use crate::Result;
use market_core::{ProviderFailure, ProviderResult};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP access to one provider host with a bounded per-request timeout.
///
/// Every outcome is mapped to a [`ProviderResult`]; nothing here retries.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    provider: &'static str,
    base_url: String,
    client: Client,
}

fn classify_transport_error(error: &reqwest::Error) -> ProviderFailure {
    if error.is_timeout() {
        ProviderFailure::Timeout
    } else {
        ProviderFailure::Transport(error.to_string())
    }
}

impl ProviderHttp {
    pub fn new(provider: &'static str, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let url = self.url(path);
        debug!("{} GET {} {:?}", self.provider, url, query);

        let response = match self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let failure = classify_transport_error(&e);
                warn!("{} request to {} failed: {}", self.provider, url, failure);
                return ProviderResult::Failed(failure);
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("{} rate limit hit on {}", self.provider, url);
            return ProviderResult::Failed(ProviderFailure::RateLimited);
        }
        if !status.is_success() {
            debug!("{} returned HTTP {} for {}", self.provider, status, url);
            return ProviderResult::Failed(ProviderFailure::HttpStatus(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return ProviderResult::Failed(classify_transport_error(&e)),
        };

        match serde_json::from_str::<T>(&body) {
            Ok(payload) => ProviderResult::Ok(payload),
            Err(e) => {
                debug!(
                    "Failed to parse {} response from {}: {} (body: {:.200})",
                    self.provider, url, e, body
                );
                ProviderResult::Failed(ProviderFailure::Malformed(e.to_string()))
            }
        }
    }
}
