//! Authenticated balance and open-order check
//!
//! Reads `<VENUE>_API_KEY`, `<VENUE>_API_SECRET` (and `OKEX_API_PASSPHRASE`) from the
//! environment or a `.env` file. Venues without credentials are skipped.

use multivenue_exchanges::prelude::*;
use tracing::{error, info, warn};

#[monoio::main(timer_enabled = true)]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_logging();

    info!("🔐 Starting MultiVenue account check");

    let mut config = ExchangesConfig::default();
    for venue in [VenueConfig::huobi(), VenueConfig::localbitcoins(), VenueConfig::okex()] {
        let name = venue.name.clone();
        match venue.with_env_credentials() {
            Ok(venue) => config = config.with_venue(venue),
            Err(e) => warn!("⏭️  skipping {}: {}", name, e),
        }
    }

    if config.venues.is_empty() {
        error!("❌ No venue credentials found");
        return Ok(());
    }

    let interface = TradingInterface::new(&config)?;

    for venue in interface.enabled_venues() {
        let account = match interface.get_account_info(&venue).await {
            Ok(account) => account,
            Err(e) => {
                error!("❌ {} account query failed: {}", venue, e);
                continue;
            }
        };

        info!("💰 {} balances:", venue);
        for balance in account.balances.iter().filter(|b| !b.total().is_zero()) {
            info!("   {}: available {} held {}", balance.currency, balance.available, balance.held);
        }

        let fee = interface.get_fee(&venue, &FeeRequest::withdrawal("BTC", Fixed::ONE))?;
        info!("   BTC withdrawal fee: {}", fee);
        info!("   withdrawals: {}", interface.withdraw_capabilities(&venue)?);
    }

    Ok(())
}
