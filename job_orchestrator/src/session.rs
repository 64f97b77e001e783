use crate::cycle::{ViewState, ViewStore};
use crate::pipeline::{MarketDataPipeline, PipelineProfile};
use crate::Result;
use chrono::Utc;
use market_core::{
    rank, top_movers, AssetCatalog, AssetMetricsRecord, MoverDirection, PriceInterval,
    RankedPage, RankingState, SortField,
};
use std::sync::{Arc, RwLock};
use tracing::{error, info};

/// A catalog-backed ranking view: one aggregation per refresh, then sorting,
/// filtering and paging over the published records without refetching.
///
/// Every control takes `&self`, so an interval change can start a new cycle
/// while an older one is still in flight; the older result is then dropped.
#[derive(Debug)]
pub struct RankingSession {
    pipeline: Arc<MarketDataPipeline>,
    catalog: Arc<AssetCatalog>,
    profile: PipelineProfile,
    state: RwLock<RankingState>,
    store: ViewStore<AssetMetricsRecord>,
}

impl RankingSession {
    pub fn new(
        pipeline: Arc<MarketDataPipeline>,
        catalog: Arc<AssetCatalog>,
        profile: PipelineProfile,
    ) -> Self {
        let state = RankingState::new(profile.default_sort, profile.page_size);
        Self {
            pipeline,
            catalog,
            profile,
            state: RwLock::new(state),
            store: ViewStore::new(),
        }
    }

    pub fn with_interval(self, interval: PriceInterval) -> Self {
        self.update_state(|state| state.set_interval(interval));
        self
    }

    pub fn profile(&self) -> &PipelineProfile {
        &self.profile
    }

    /// Copy of the current controls
    pub fn state(&self) -> RankingState {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn view(&self) -> Arc<ViewState<AssetMetricsRecord>> {
        self.store.snapshot()
    }

    fn update_state(&self, change: impl FnOnce(&mut RankingState)) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        change(&mut state);
    }

    /// Runs one full aggregation cycle for the whole catalog at the current
    /// interval.
    ///
    /// Returns whether the result was published; a cycle overtaken by a newer
    /// one is dropped.
    pub async fn refresh(&self) -> Result<bool> {
        let interval = self.state().interval;
        self.run_cycle(interval).await
    }

    /// Switching the interval always re-runs the full pipeline
    pub async fn select_interval(&self, interval: PriceInterval) -> Result<bool> {
        self.update_state(|state| state.set_interval(interval));
        self.run_cycle(interval).await
    }

    async fn run_cycle(&self, interval: PriceInterval) -> Result<bool> {
        let token = self.store.begin();

        let outcome = self
            .pipeline
            .aggregate(
                self.catalog.assets(),
                &self.catalog,
                &self.profile,
                interval,
                Utc::now(),
            )
            .await;

        match outcome {
            Ok(records) => {
                let published = self.store.commit(token, records, Utc::now());
                if published {
                    info!("{} refreshed ({})", self.profile.name, interval);
                }
                Ok(published)
            }
            Err(e) => {
                error!("{} refresh failed: {}", self.profile.name, e);
                self.store.fail(token, e.to_string());
                Err(e)
            }
        }
    }

    pub fn toggle_sort(&self, field: SortField) {
        self.update_state(|state| state.toggle_sort(field));
    }

    pub fn set_filter(&self, filter: impl Into<String>) {
        let filter = filter.into();
        self.update_state(|state| state.set_filter(filter));
    }

    pub fn set_page(&self, page: usize) {
        self.update_state(|state| state.set_page(page));
    }

    /// Visible page of the published records; `None` unless Ready
    pub fn current_page(&self) -> Option<RankedPage<AssetMetricsRecord>> {
        let view = self.store.snapshot();
        if !view.is_ready() {
            return None;
        }
        Some(rank(view.records(), &self.state()))
    }

    /// Largest absolute price changes of the published records
    pub fn movers(&self, direction: Option<MoverDirection>) -> Vec<AssetMetricsRecord> {
        let view = self.store.snapshot();
        top_movers(view.records(), self.profile.page_size, direction)
    }
}
