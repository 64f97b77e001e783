use anyhow::Result;
use config_manager::SystemConfig;
use job_orchestrator::MarketServices;
use market_core::Rankable;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_orchestrator=debug".into()),
        )
        .init();

    info!("Starting Algorand market ranker...");

    let config = SystemConfig::load()?;
    info!("Configuration loaded successfully");

    let services = MarketServices::from_config(config)?;
    let session = services.ranking_session()?;
    session.refresh().await?;

    if let Some(page) = session.current_page() {
        println!(
            "Page {}/{} ({} assets, {} interval)",
            page.page,
            page.total_pages,
            page.filtered_count,
            session.state().interval
        );
        for (position, record) in page.items.iter().enumerate() {
            println!(
                "{:>3}. {:<12} tvl ${:>14.2}  price ${:>12.6}  change {:>8.2}%  holders {}",
                position + 1,
                record.display_name(),
                record.trusted_tvl,
                record.latest_price_usd,
                record.price_change_percent,
                record.holder_count
            );
        }
        if page.has_next() {
            println!("... {} more page(s)", page.total_pages - page.page);
        }
    }

    // Optional wallet address: show its holdings and badge as well
    if let Some(address) = std::env::args().nth(1) {
        let wallet = services.wallet_service()?;
        let portfolio = wallet
            .load_portfolio(&address, session.state().interval, chrono::Utc::now())
            .await?;

        println!();
        println!("Wallet {} (${:.2})", address, portfolio.total_usd_value);
        let state = wallet.default_ranking_state();
        for holding in market_core::rank(&portfolio.holdings, &state).items {
            println!(
                "  {:<12} {:>18} ${:>12.2}  {:>6.2}%",
                holding.secondary_label().unwrap_or(holding.display_name()),
                holding.amount,
                holding.usd_value(),
                portfolio.share(holding.asset_id())
            );
        }

        let badge = services.badge_service()?.status(Some(&address)).await;
        println!("Badge: {}", badge.message());
    }

    Ok(())
}
