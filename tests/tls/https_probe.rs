//! Connectivity probe for the monoio HTTPS transport
//!
//! Performs one unauthenticated GET per venue and prints status and a body preview.

use anyhow::Context;
use multivenue_exchanges::prelude::*;
use multivenue_exchanges::{HttpRequest, MonoioHttpsClient};
use tracing::{error, info};
use url::Url;

const PROBES: &[(&str, &str)] = &[
    ("okex", "https://www.okex.com/api/general/v3/time"),
    ("huobi", "https://api.hadax.com/v1/common/timestamp"),
    ("localbitcoins", "https://localbitcoins.com/api/currencies/"),
];

#[monoio::main(timer_enabled = true)]
async fn main() -> anyhow::Result<()> {
    init_logging();
    info!("🚀 Probing monoio HTTPS transport");

    let client = MonoioHttpsClient::new();
    for (venue, endpoint) in PROBES {
        let url = Url::parse(endpoint).with_context(|| format!("bad probe url for {venue}"))?;
        let timer = PerfTimer::start(format!("{venue} probe"));

        match client.perform(HttpRequest::get(url)).await {
            Ok(response) => {
                info!("📡 {}: status {} in {}μs", venue, response.status, timer.elapsed_micros());
                match serde_json::from_str::<serde_json::Value>(&response.body) {
                    Ok(json) => info!("📄 {}", json),
                    Err(_) => info!("📄 {}", response.body.chars().take(200).collect::<String>()),
                }
            }
            Err(e) => error!("❌ {}: {}", venue, e),
        }
    }

    Ok(())
}
