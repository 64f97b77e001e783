use config_manager::SystemConfig;
use job_orchestrator::{MarketServices, OrchestratorError};
use market_core::{
    AssetCatalog, AssetId, BadgeStatus, BadgeTier, PriceInterval, SortField, WalletPortfolio,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALGO: u64 = 0;
const USDC: u64 = 31566704;
const AAA: u64 = 2004387843;
const ADDRESS: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA27";

const CATALOG: &str = r#"[
    {"name": "ALGO", "assetID": "0", "stableTVL": true},
    {"name": "USDC", "assetID": "31566704", "stableTVL": true},
    {"name": "AAA", "assetID": "2004387843", "logo": "aaa.png"}
]"#;

fn config_for(server: &MockServer) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.vestige.api_base_url = server.uri();
    config.vestige.free_api_base_url = server.uri();
    config.tinyman.api_base_url = server.uri();
    config.pact.api_base_url = server.uri();
    config.pera.api_base_url = server.uri();
    config.indexer.api_base_url = server.uri();
    config.scheduler.inter_batch_delay_ms = 0;
    config
}

fn services(server: &MockServer) -> MarketServices {
    let catalog = AssetCatalog::from_json_str(CATALOG).unwrap();
    MarketServices::new(config_for(server), catalog).unwrap()
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_pools(server: &MockServer, asset: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/pools"))
        .and(query_param("asset_1_id", asset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_price(server: &MockServer, asset: u64, price: f64) {
    Mock::given(method("GET"))
        .and(path("/assets/price"))
        .and(query_param("asset_ids", asset.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"asset_id": asset, "price": price}])),
        )
        .mount(server)
        .await;
}

async fn mount_market(server: &MockServer) {
    mount_pools(
        server,
        ALGO,
        json!([{"provider": "T2", "asset_1_id": ALGO, "asset_2_id": USDC, "address": "POOL3"}]),
    )
    .await;
    mount_pools(server, USDC, json!([])).await;
    mount_pools(
        server,
        AAA,
        json!([
            {"provider": "T3", "asset_1_id": AAA, "asset_2_id": ALGO, "address": "POOL1"},
            {"provider": "HL", "asset_1_id": AAA, "asset_2_id": ALGO, "address": "POOL2"}
        ]),
    )
    .await;

    mount_json(server, "/api/v1/pools/POOL1", json!({"liquidity_in_usd": "1000"})).await;
    mount_json(server, "/api/v1/pools/POOL3", json!({"liquidity_in_usd": "3000"})).await;
    mount_json(
        server,
        "/api/internal/pools",
        json!({"results": [{"address": "PACT1", "assets": [{"id": ALGO}, {"id": AAA}], "tvl_usd": "500"}]}),
    )
    .await;

    mount_price(server, ALGO, 0.25).await;
    mount_price(server, USDC, 1.0).await;
    mount_price(server, AAA, 0.5).await;

    mount_json(
        server,
        &format!("/assets/{}/candles", AAA),
        json!([
            {"timestamp": 1, "open": 1.0, "close": 1.2},
            {"timestamp": 2, "open": 1.2, "close": 1.5}
        ]),
    )
    .await;
    mount_json(
        server,
        &format!("/assets/{}/history", AAA),
        json!([{"timestamp": 1, "tvl": 10.0}, {"timestamp": 2, "tvl": 20.0}]),
    )
    .await;
    mount_json(
        server,
        &format!("/asset/{}/holders", AAA),
        json!([{"address": "A"}, {"address": "B"}]),
    )
    .await;
}

async fn mount_account(server: &MockServer) {
    mount_json(
        server,
        &format!("/v2/accounts/{}", ADDRESS),
        json!({"account": {"address": ADDRESS, "amount": 150_000_000u64, "assets": []}}),
    )
    .await;
    mount_json(
        server,
        &format!("/v2/accounts/{}/assets", ADDRESS),
        json!({"assets": [
            {"asset-id": AAA, "amount": 20_000_000_000u64},
            {"asset-id": USDC, "amount": 0},
            {"asset-id": 999, "amount": 5}
        ]}),
    )
    .await;
    mount_json(
        server,
        &format!("/v2/assets/{}", AAA),
        json!({"asset": {"index": AAA, "params": {"name": "AAA", "unit-name": "AAA", "decimals": 10}}}),
    )
    .await;
}

#[tokio::test]
async fn test_ranking_cycle_end_to_end() {
    let server = MockServer::start().await;
    mount_market(&server).await;

    let session = services(&server).ranking_session().unwrap();
    assert!(session.current_page().is_none());
    assert!(session.refresh().await.unwrap());

    let page = session.current_page().unwrap();
    let names: Vec<&str> = page.items.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["ALGO", "USDC", "AAA"]);

    // POOL3 + POOL1 + PACT1, each counted once
    assert_eq!(page.items[0].trusted_tvl, 4500.0);
    assert_eq!(page.items[1].trusted_tvl, 3000.0);
    // the untrusted venue is ignored
    assert_eq!(page.items[2].trusted_tvl, 1500.0);

    let aaa = &page.items[2];
    assert_eq!(aaa.latest_price_usd, 0.5);
    assert_eq!(aaa.price_change_percent, 50.0);
    assert_eq!(aaa.full_tvl, 20.0);
    assert_eq!(aaa.holder_count, 2);
    assert_eq!(aaa.logo_url, "aaa.png");

    // failed candle lookups leave the change at zero
    assert_eq!(page.items[0].price_change_percent, 0.0);

    session.toggle_sort(SortField::PriceChange);
    assert_eq!(session.current_page().unwrap().items[0].name(), "AAA");

    session.set_filter("usd");
    let filtered = session.current_page().unwrap();
    assert_eq!(filtered.filtered_count, 1);
    assert_eq!(filtered.items[0].asset_id, AssetId(USDC));

    session.set_page(3);
    assert!(session.current_page().unwrap().items.is_empty());
}

#[tokio::test]
async fn test_interval_change_runs_a_new_cycle() {
    let server = MockServer::start().await;
    mount_market(&server).await;

    let session = services(&server).ranking_session().unwrap();
    assert!(session.select_interval(PriceInterval::SevenDays).await.unwrap());
    assert_eq!(session.state().interval, PriceInterval::SevenDays);
    assert!(session.view().is_ready());
}

#[tokio::test]
async fn test_newer_interval_cycle_overtakes_slower_one() {
    let server = MockServer::start().await;

    // hourly candles (1D) answer slowly, daily candles (7D) at once
    Mock::given(method("GET"))
        .and(path(format!("/assets/{}/candles", AAA)))
        .and(query_param("interval", "3600"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    {"timestamp": 1, "open": 1.0, "close": 1.0},
                    {"timestamp": 2, "open": 1.0, "close": 2.0}
                ]))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/assets/{}/candles", AAA)))
        .and(query_param("interval", "86400"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"timestamp": 1, "open": 1.0, "close": 1.0},
            {"timestamp": 2, "open": 1.0, "close": 1.1}
        ])))
        .mount(&server)
        .await;
    mount_market(&server).await;

    let session = services(&server).ranking_session().unwrap();

    let slow = session.select_interval(PriceInterval::OneDay);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.select_interval(PriceInterval::SevenDays).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert!(!slow.unwrap());
    assert!(fast.unwrap());
    assert_eq!(session.state().interval, PriceInterval::SevenDays);

    let page = session.current_page().unwrap();
    let aaa = page
        .items
        .iter()
        .find(|r| r.asset_id == AssetId(AAA))
        .unwrap();
    assert!((aaa.price_change_percent - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_wallet_portfolio_end_to_end() {
    let server = MockServer::start().await;
    mount_market(&server).await;
    mount_account(&server).await;

    let service = services(&server).wallet_service().unwrap();
    let portfolio: WalletPortfolio = service
        .load_portfolio(ADDRESS, PriceInterval::OneDay, chrono::Utc::now())
        .await
        .unwrap();

    // zero balance and unresolvable assets are left out
    assert_eq!(portfolio.len(), 2);
    assert_eq!(portfolio.holdings[0].asset_id(), AssetId(ALGO));
    assert_eq!(portfolio.holdings[0].usd_value(), 37.5);
    assert_eq!(portfolio.holdings[1].usd_value(), 1.0);
    assert_eq!(portfolio.total_usd_value, 38.5);

    assert!(service.refresh(ADDRESS, PriceInterval::OneDay).await.unwrap());
    let page = service
        .current_page(&service.default_ranking_state())
        .unwrap();
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_wallet_values_unpriced_asset_with_pera_usd_value() {
    let server = MockServer::start().await;
    let wallet = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBYE";

    mount_json(
        &server,
        &format!("/v2/accounts/{}", wallet),
        json!({"account": {"address": wallet, "amount": 0, "assets": []}}),
    )
    .await;
    mount_json(
        &server,
        &format!("/v2/accounts/{}/assets", wallet),
        json!({"assets": [{"asset-id": 777, "amount": 5}]}),
    )
    .await;
    mount_json(
        &server,
        "/v2/assets/777",
        json!({"asset": {"index": 777, "params": {"name": "Seven", "unit-name": "SVN", "decimals": 0}}}),
    )
    .await;
    mount_json(
        &server,
        "/v1/public/assets/777",
        json!({"asset_id": 777, "verification_tier": "verified", "usd_value": "2.0"}),
    )
    .await;

    let portfolio = services(&server)
        .wallet_service()
        .unwrap()
        .load_portfolio(wallet, PriceInterval::OneDay, chrono::Utc::now())
        .await
        .unwrap();

    assert_eq!(portfolio.len(), 1);
    let holding = &portfolio.holdings[0];
    assert_eq!(holding.asset_id(), AssetId(777));
    assert!(holding.verified());
    assert_eq!(holding.usd_value(), 10.0);
    assert_eq!(portfolio.total_usd_value, 10.0);
}

#[tokio::test]
async fn test_wallet_account_failure_fails_the_view() {
    let server = MockServer::start().await;
    mount_market(&server).await;

    let service = services(&server).wallet_service().unwrap();
    let result = service.refresh(ADDRESS, PriceInterval::OneDay).await;

    assert!(matches!(result, Err(OrchestratorError::Client(_))));
    assert!(service.view().error_message().is_some());
    assert!(service.view().records().is_empty());
}

#[tokio::test]
async fn test_token_details_end_to_end() {
    let server = MockServer::start().await;
    mount_market(&server).await;
    mount_account(&server).await;

    mount_json(
        &server,
        "/assets/search",
        json!([{"supply": 1000, "circulating_supply": 400, "burned_supply": 100}]),
    )
    .await;
    mount_json(
        &server,
        &format!("/asset/{}/prices/simple/1D", AAA),
        json!([{"timestamp": 1, "price": 0.4}, {"timestamp": 2, "price": 0.5}]),
    )
    .await;
    mount_json(
        &server,
        &format!("/asset/{}/tvl/simple/30D", AAA),
        json!([{"timestamp": 1, "tvl": 900}, {"timestamp": 2, "tvl": "1500"}]),
    )
    .await;
    mount_json(
        &server,
        &format!("/v1/public/assets/{}", AAA),
        json!({"verification_tier": "verified", "logo": "https://logos/aaa.png"}),
    )
    .await;

    let details = services(&server)
        .token_details()
        .unwrap()
        .load(AssetId(AAA), PriceInterval::OneDay, chrono::Utc::now())
        .await
        .unwrap();

    assert_eq!(details.record.trusted_tvl, 1500.0);
    assert_eq!(details.supply_breakdown.circulating_percent, 40.0);
    assert_eq!(details.supply_breakdown.burned_percent, 10.0);
    assert_eq!(details.price_history.len(), 2);
    assert_eq!(details.current_tvl, 1500.0);

    let providers: Vec<&str> = details.pools.iter().map(|p| p.provider.as_str()).collect();
    assert_eq!(providers, vec!["Tinyman V2", "PactFi"]);

    let tinyman = &details.pools[0];
    assert_eq!(tinyman.tvl_usd, 1000.0);
    assert_eq!(tinyman.asset_1.unit_name, "AAA");
    assert_eq!(tinyman.asset_1.logo_url.as_deref(), Some("https://logos/aaa.png"));
    assert_eq!(tinyman.asset_2.unit_name, "ALGO");
}

#[tokio::test]
async fn test_badge_classification() {
    let server = MockServer::start().await;
    mount_market(&server).await;
    mount_account(&server).await;

    let badges = services(&server).badge_service().unwrap();

    // 150 ALGO clears the balance threshold
    let status = badges.status(Some(ADDRESS)).await;
    assert_eq!(status, BadgeStatus::Classified(BadgeTier::DiamondHands));
    assert_eq!(badges.cached_tier(ADDRESS), Some(BadgeTier::DiamondHands));
}

#[tokio::test]
async fn test_badge_unavailable_when_account_lookup_fails() {
    let server = MockServer::start().await;
    let badges = services(&server).badge_service().unwrap();

    let status = badges.status(Some(ADDRESS)).await;
    assert!(matches!(status, BadgeStatus::Unavailable(_)));
    assert!(status.tier().is_none());
}
