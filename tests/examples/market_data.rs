//! Public market data from every built-in venue
//!
//! Demonstrates:
//! - Building the trading interface from a JSON venue list
//! - Pair discovery, tickers and order books over the live public endpoints
//! - Read-through caching (the second ticker read is served locally)

use multivenue_exchanges::prelude::*;
use tracing::{info, warn};

const VENUES: &str = r#"{
    "venues": [
        {"name": "huobi"},
        {"name": "localbitcoins"},
        {"name": "okex"}
    ]
}"#;

#[monoio::main(timer_enabled = true)]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_logging();

    info!("🚀 Starting MultiVenue market data example");

    let config = ExchangesConfig::from_json_str(VENUES)?;
    let interface = TradingInterface::new(&config)?;

    let outcomes = interface.refresh_tradable_pairs(MarketType::Spot).await;
    for (venue, outcome) in &outcomes {
        match outcome {
            Ok(pairs) => info!("📋 {}: {} tradable pairs", venue, pairs.len()),
            Err(e) => warn!("⚠️  {}: pair discovery failed: {}", venue, e),
        }
    }

    let watch = [
        ("huobi", TradingPair::new("BTC", "USDT")?),
        ("localbitcoins", TradingPair::new("BTC", "USD")?),
        ("okex", TradingPair::new("LTC", "BTC")?),
    ];

    for (venue, pair) in &watch {
        let timer = PerfTimer::start(format!("{venue} ticker"));
        match interface.fetch_ticker(venue, pair, MarketType::Spot).await {
            Ok(ticker) => info!(
                "📈 {} {}: last {} bid {} ask {} volume {} ({}μs)",
                venue,
                pair,
                ticker.last,
                ticker.bid,
                ticker.ask,
                ticker.volume,
                timer.elapsed_micros()
            ),
            Err(e) => {
                warn!("⚠️  {} {} ticker failed: {}", venue, pair, e);
                continue;
            }
        }

        // Within the staleness window, so no dispatch
        let before = interface.dispatch_stats(venue)?.dispatched;
        interface.fetch_ticker(venue, pair, MarketType::Spot).await?;
        info!("💾 cached read dispatched {} requests", interface.dispatch_stats(venue)?.dispatched - before);

        match interface.fetch_order_book(venue, pair, MarketType::Spot).await {
            Ok(book) => info!(
                "📚 {} {}: {} bids, {} asks, best {:?} / {:?}",
                venue,
                pair,
                book.bids().len(),
                book.asks().len(),
                book.best_bid(),
                book.best_ask()
            ),
            Err(e) => warn!("⚠️  {} {} order book failed: {}", venue, pair, e),
        }
    }

    for venue in interface.enabled_venues() {
        let stats = interface.dispatch_stats(&venue)?;
        info!(
            "📊 {}: dispatched {} ok {} venue errors {} transport errors {} timeouts {}",
            venue, stats.dispatched, stats.succeeded, stats.venue_errors, stats.transport_errors, stats.timeouts
        );
    }

    Ok(())
}
