use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::models::{PriceBar, PriceSeries};
use crate::providers::MarketDataProvider;

const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, serde::Deserialize)]
struct HistoryResponse {
    bars: Vec<RawBar>,
}

#[derive(Debug, serde::Deserialize)]
struct RawBar {
    t: i64,
    o: String,
    h: String,
    l: String,
    c: String,
    v: String,
}

/// HTTP market data client with a minimum inter-request interval and a
/// short-TTL cache so repeated fetches within a batch hit the network once.
pub struct HttpMarketData {
    client: Client,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
    cache: Mutex<HashMap<String, (Instant, PriceSeries)>>,
    cache_ttl: Duration,
}

impl HttpMarketData {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: cfg.market_data_url.clone(),
            last_request: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
            cache_ttl: Duration::from_secs(cfg.cache_ttl_secs),
        }
    }

    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketData {
    async fn fetch_series(&self, ticker: &str, bars: usize) -> Result<PriceSeries> {
        let cache_key = format!("{}_{}", ticker, bars);
        {
            let cache = self.cache.lock().await;
            if let Some((cached_at, series)) = cache.get(&cache_key) {
                if cached_at.elapsed() < self.cache_ttl {
                    return Ok(series.clone());
                }
            }
        }

        self.rate_limit().await;

        let resp = self
            .client
            .get(format!("{}/history", self.base_url))
            .query(&[("symbol", ticker), ("limit", &bars.to_string())])
            .send()
            .await
            .context("failed to fetch price history")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("market data error {}: {}", status, body);
        }

        let data: HistoryResponse = resp
            .json()
            .await
            .context("failed to parse history response")?;

        let series = PriceSeries::new(ticker, parse_bars(data.bars));

        self.cache
            .lock()
            .await
            .insert(cache_key, (Instant::now(), series.clone()));

        Ok(series)
    }
}

/// Malformed or non-finite bars are dropped rather than failing the fetch.
fn parse_bars(raw: Vec<RawBar>) -> Vec<PriceBar> {
    let mut parsed: Vec<PriceBar> = raw
        .into_iter()
        .filter_map(|rb| {
            let bar = PriceBar {
                timestamp: DateTime::from_timestamp(rb.t, 0)?,
                open: rb.o.parse().ok()?,
                high: rb.h.parse().ok()?,
                low: rb.l.parse().ok()?,
                close: rb.c.parse().ok()?,
                volume: rb.v.parse().ok()?,
            };
            let finite = [bar.open, bar.high, bar.low, bar.close, bar.volume]
                .iter()
                .all(|v| v.is_finite());
            finite.then_some(bar)
        })
        .collect();
    parsed.sort_by_key(|b| b.timestamp);
    parsed
}
