use async_trait::async_trait;
use market_core::ProviderResult;

/// One logical request/response pair against one external provider.
///
/// `fetch` never returns an error or panics: transport problems, bad
/// statuses and undecodable bodies all come back as `ProviderResult::Failed`.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    type Request: Send + Sync;
    type Payload: Send;

    fn name(&self) -> &'static str;

    async fn fetch(&self, request: &Self::Request) -> ProviderResult<Self::Payload>;
}
