//! Criterion benchmarks for the synchronous hot paths
//!
//! - Fee lookups (called per quote by arbitrage scanners)
//! - Order book construction from unsorted venue levels
//! - Request signing for each venue scheme
//! - Pair formatting

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use multivenue_exchanges::fees::FeeSchedule;
use multivenue_exchanges::huobi::auth::HuobiSigner;
use multivenue_exchanges::localbitcoins::auth::LocalBitcoinsSigner;
use multivenue_exchanges::okex::auth::OkexSigner;
use multivenue_exchanges::prelude::*;
use multivenue_exchanges::HttpRequest;
use url::Url;

fn fee_lookup(c: &mut Criterion) {
    let schedule = FeeSchedule::new("okex", Fixed::from_scaled(15, 4), Fixed::from_scaled(1, 3))
        .with_withdrawal_fees(&[("BTC", Fixed::from_scaled(5, 4)), ("LTC", Fixed::from_scaled(1, 3))]);
    let pair = TradingPair::new("LTC", "BTC").unwrap();
    let trade = FeeRequest::trade(&pair, Fixed::from_i64(10), Fixed::from_scaled(86, 4), false);
    let withdrawal = FeeRequest::withdrawal("BTC", Fixed::ONE);

    c.bench_function("fee_trade_taker", |b| b.iter(|| schedule.fee(black_box(&trade))));
    c.bench_function("fee_withdrawal", |b| b.iter(|| schedule.fee(black_box(&withdrawal))));
}

fn order_book_construction(c: &mut Criterion) {
    let pair = TradingPair::new("BTC", "USDT").unwrap();
    let levels: Vec<BookLevel> = (0..200)
        .map(|i| BookLevel::new(Fixed::from_i64(6000 + (i * 37) % 200), Fixed::from_scaled(i + 1, 2)))
        .collect();

    c.bench_function("order_book_200_levels", |b| {
        b.iter_batched(
            || (levels.clone(), levels.clone()),
            |(bids, asks)| OrderBookSnapshot::new("huobi", pair.clone(), MarketType::Spot, bids, asks),
            BatchSize::SmallInput,
        )
    });
}

fn signing(c: &mut Criterion) {
    let credentials = Credentials::new("bench-key", "bench-secret").with_passphrase("bench-pass");
    let huobi = HuobiSigner::new(credentials.clone()).unwrap();
    let okex = OkexSigner::new(credentials.clone()).unwrap();
    let localbitcoins = LocalBitcoinsSigner::new(credentials).unwrap();

    let get = HttpRequest::get(Url::parse("https://api.hadax.com/v1/order/openOrders?symbol=btcusdt").unwrap());
    let post = HttpRequest::post(Url::parse("https://www.okex.com/api/spot/v3/orders").unwrap())
        .with_body(r#"{"type":"limit","side":"buy","instrument_id":"LTC-BTC","price":"0.0086","size":"1"}"#);

    c.bench_function("sign_huobi", |b| {
        b.iter_batched(
            || get.clone(),
            |mut request| huobi.sign_at(&mut request, "2018-06-01T12:00:00"),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("sign_okex", |b| {
        b.iter_batched(
            || post.clone(),
            |mut request| okex.sign_at(&mut request, "2018-06-01T12:00:00.000Z"),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("sign_localbitcoins", |b| {
        b.iter_batched(
            || post.clone(),
            |mut request| localbitcoins.sign_with_nonce(&mut request, 1_527_854_400_000),
            BatchSize::SmallInput,
        )
    });
}

fn pair_formatting(c: &mut Criterion) {
    let pair = TradingPair::new("BTC", "USDT").unwrap();
    let dashed = PairFormat::dashed_upper();
    let compact = PairFormat::new("", false);

    c.bench_function("pair_format_dashed", |b| b.iter(|| black_box(&pair).format(&dashed)));
    c.bench_function("pair_format_compact", |b| b.iter(|| black_box(&pair).format(&compact)));
}

criterion_group!(benches, fee_lookup, order_book_construction, signing, pair_formatting);
criterion_main!(benches);
