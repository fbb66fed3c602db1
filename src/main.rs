use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use correction_engine::config::Config;
use correction_engine::engine::{Engine, Providers, TickerRequest};
use correction_engine::providers::{
    DefaultFundamentals, HttpMarketData, NeutralContext, NoCatalyst, SimpleIndicators,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    cfg.validate().context("invalid configuration")?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let requests = ticker_requests_from_env();
    if requests.is_empty() {
        anyhow::bail!("TICKERS is empty; set TICKERS=AAPL:62,MSFT:55");
    }
    info!(tickers = requests.len(), "correction engine starting");

    let providers = Providers {
        market: Arc::new(HttpMarketData::new(&cfg)),
        indicators: Arc::new(SimpleIndicators::new()),
        catalyst: Arc::new(NoCatalyst),
        fundamentals: Arc::new(DefaultFundamentals),
        context: Arc::new(NeutralContext),
    };

    let engine = Engine::new(cfg, providers);
    let records = engine.run_batch(requests).await;

    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    Ok(())
}

/// TICKERS is a comma list of `SYMBOL` or `SYMBOL:base_score` entries.
fn ticker_requests_from_env() -> Vec<TickerRequest> {
    std::env::var("TICKERS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (ticker, score) = match entry.split_once(':') {
                Some((t, s)) => (t, s.parse().unwrap_or(50.0)),
                None => (entry, 50.0),
            };
            Some(TickerRequest {
                ticker: ticker.to_uppercase(),
                base_score: score,
            })
        })
        .collect()
}
