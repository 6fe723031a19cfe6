//! CoinGecko price feed implementation
//!
//! Thin client with public/pro base selection, retry/backoff, a robust
//! last-price fallback chain, and daily OHLC with a minute-series fallback
//! for ATR computation.

use super::{Bar, FeedError, PriceFeed, RetryPolicy};
use crate::config::FeedConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;

/// Public API base URL
const PUBLIC_BASE: &str = "https://api.coingecko.com/api/v3";
/// Pro API base URL, used when an API key is present
const PRO_BASE: &str = "https://pro-api.coingecko.com/api/v3";
/// Environment variable holding an optional pro API key
const API_KEY_ENV: &str = "COINGECKO_API_KEY";

/// Stablecoin quotes CoinGecko does not support directly; treated as USD
const STABLECOIN_QUOTES: [&str; 6] = ["usdc", "usdt", "busd", "tusd", "usdd", "dai"];

/// Normalize a quote currency: lowercase, stablecoins mapped to "usd"
fn normalize_vs_currency(vs: &str) -> String {
    let vs = vs.trim().to_lowercase();
    if vs.is_empty() || STABLECOIN_QUOTES.contains(&vs.as_str()) {
        "usd".to_string()
    } else {
        vs
    }
}

/// Decimal from a JSON number, `None` for anything else
fn dec_from(value: &Value) -> Option<Decimal> {
    value.as_f64().and_then(Decimal::from_f64_retain)
}

/// Parse one OHLC row `[ms, open, high, low, close]`, skipping garbled rows
fn parse_bar(row: &Value) -> Option<Bar> {
    let arr = row.as_array()?;
    if arr.len() < 5 {
        return None;
    }
    Some(Bar {
        ts_ms: arr[0].as_i64()?,
        open: dec_from(&arr[1])?,
        high: dec_from(&arr[2])?,
        low: dec_from(&arr[3])?,
        close: dec_from(&arr[4])?,
    })
}

/// Parse one price row `[ms, price]`, skipping garbled rows
fn parse_point(row: &Value) -> Option<(i64, Decimal)> {
    let arr = row.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    Some((arr[0].as_i64()?, dec_from(&arr[1])?))
}

/// CoinGecko HTTP client for one coin/quote pair
pub struct CoinGeckoClient {
    client: reqwest::Client,
    coin_id: String,
    vs_currency: String,
    base: &'static str,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl CoinGeckoClient {
    /// Create a client from feed configuration. Picks the pro API base when
    /// `COINGECKO_API_KEY` is set in the environment.
    pub fn new(cfg: &FeedConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        let base = if api_key.is_some() { PRO_BASE } else { PUBLIC_BASE };
        Ok(Self {
            client,
            coin_id: cfg.coin_id.trim().to_string(),
            vs_currency: normalize_vs_currency(&cfg.vs_currency),
            base,
            api_key,
            retry: RetryPolicy::from_config(cfg),
        })
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, FeedError> {
        let url = format!("{}{}", self.base, path);
        let mut request = self
            .client
            .get(&url)
            .query(params)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    /// Latest price with a three-endpoint fallback chain:
    /// `/simple/price`, then `/coins/markets`, then `/coins/{id}`.
    /// Transport errors propagate immediately (the retry policy handles
    /// them); missing data or an error status falls through to the next
    /// endpoint.
    async fn fetch_last_price(&self) -> Result<Decimal, FeedError> {
        let mut failure: Option<FeedError> = None;

        match self
            .get_json(
                "/simple/price",
                &[
                    ("ids", self.coin_id.clone()),
                    ("vs_currencies", self.vs_currency.clone()),
                ],
            )
            .await
        {
            Ok(json) => {
                if let Some(price) = json
                    .get(&self.coin_id)
                    .and_then(|coin| coin.get(&self.vs_currency))
                    .and_then(dec_from)
                {
                    return Ok(price);
                }
                tracing::warn!(
                    coin_id = %self.coin_id,
                    vs = %self.vs_currency,
                    "simple/price response missing data"
                );
            }
            Err(e @ FeedError::Network(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "simple/price request failed");
                failure = Some(e);
            }
        }

        match self
            .get_json(
                "/coins/markets",
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("ids", self.coin_id.clone()),
                    ("per_page", "1".to_string()),
                    ("page", "1".to_string()),
                ],
            )
            .await
        {
            Ok(json) => {
                if let Some(price) = json
                    .as_array()
                    .and_then(|arr| arr.first())
                    .and_then(|m| m.get("current_price"))
                    .and_then(dec_from)
                {
                    tracing::info!(used = "coins/markets", "price fallback endpoint used");
                    return Ok(price);
                }
                tracing::warn!(coin_id = %self.coin_id, "coins/markets response empty");
            }
            Err(e @ FeedError::Network(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "coins/markets request failed");
                failure = Some(e);
            }
        }

        match self
            .get_json(
                &format!("/coins/{}", self.coin_id),
                &[
                    ("localization", "false".to_string()),
                    ("tickers", "false".to_string()),
                    ("market_data", "true".to_string()),
                    ("community_data", "false".to_string()),
                    ("developer_data", "false".to_string()),
                    ("sparkline", "false".to_string()),
                ],
            )
            .await
        {
            Ok(json) => {
                if let Some(price) = json
                    .get("market_data")
                    .and_then(|md| md.get("current_price"))
                    .and_then(|cp| cp.get(&self.vs_currency))
                    .and_then(dec_from)
                {
                    tracing::info!(used = "coins/{id}", "price fallback endpoint used");
                    return Ok(price);
                }
                tracing::warn!(coin_id = %self.coin_id, "coins/{{id}} response missing price");
            }
            Err(e) => {
                tracing::warn!(error = %e, "coins/{{id}} request failed");
                failure = Some(e);
            }
        }

        Err(failure.unwrap_or_else(|| {
            FeedError::Malformed("no price in any endpoint response".to_string())
        }))
    }

    async fn fetch_daily_bars(&self, days: u32) -> Result<Vec<Bar>, FeedError> {
        let json = self
            .get_json(
                &format!("/coins/{}/ohlc", self.coin_id),
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("days", days.to_string()),
                ],
            )
            .await
            .map_err(|e| match e {
                // OHLC coverage varies by asset/period; a 4xx here means the
                // caller should fall back to the minute series.
                FeedError::Status { status, .. } if (400..500).contains(&status) && status != 429 => {
                    FeedError::Unsupported(format!("ohlc returned status {status}"))
                }
                other => other,
            })?;
        let rows = json
            .as_array()
            .ok_or_else(|| FeedError::Malformed("ohlc response is not an array".to_string()))?;
        Ok(rows.iter().filter_map(parse_bar).collect())
    }

    async fn fetch_minute_series(&self, days: u32) -> Result<Vec<(i64, Decimal)>, FeedError> {
        let json = self
            .get_json(
                &format!("/coins/{}/market_chart", self.coin_id),
                &[
                    ("vs_currency", self.vs_currency.clone()),
                    ("days", days.to_string()),
                    ("interval", "minute".to_string()),
                ],
            )
            .await?;
        let rows = json
            .get("prices")
            .and_then(Value::as_array)
            .ok_or_else(|| FeedError::Malformed("market_chart missing prices".to_string()))?;
        let points: Vec<(i64, Decimal)> = rows.iter().filter_map(parse_point).collect();
        if points.is_empty() {
            tracing::warn!(coin_id = %self.coin_id, "market_chart returned no usable prices");
        }
        Ok(points)
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    async fn last_price(&self) -> Result<Decimal, FeedError> {
        self.retry
            .run("last_price", FeedError::is_retryable, || {
                self.fetch_last_price()
            })
            .await
    }

    async fn daily_bars(&self, days: u32) -> Result<Vec<Bar>, FeedError> {
        self.retry
            .run("daily_bars", FeedError::is_retryable, || {
                self.fetch_daily_bars(days)
            })
            .await
    }

    async fn minute_series(&self, days: u32) -> Result<Vec<(i64, Decimal)>, FeedError> {
        self.retry
            .run("minute_series", FeedError::is_retryable, || {
                self.fetch_minute_series(days)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_normalize_vs_currency() {
        assert_eq!(normalize_vs_currency("USDC"), "usd");
        assert_eq!(normalize_vs_currency("usdt"), "usd");
        assert_eq!(normalize_vs_currency("dai"), "usd");
        assert_eq!(normalize_vs_currency("EUR"), "eur");
        assert_eq!(normalize_vs_currency(" usd "), "usd");
        assert_eq!(normalize_vs_currency(""), "usd");
    }

    #[test]
    fn test_parse_bar_valid_row() {
        let row = json!([1704067200000i64, 42000.0, 42500.5, 41800.25, 42400.0]);
        let bar = parse_bar(&row).unwrap();
        assert_eq!(bar.ts_ms, 1_704_067_200_000);
        assert_eq!(bar.high, dec!(42500.5));
        assert_eq!(bar.low, dec!(41800.25));
    }

    #[test]
    fn test_parse_bar_garbled_rows() {
        assert!(parse_bar(&json!("not a row")).is_none());
        assert!(parse_bar(&json!([1704067200000i64, 42000.0])).is_none());
        assert!(parse_bar(&json!([null, 1.0, 2.0, 3.0, 4.0])).is_none());
        assert!(parse_bar(&json!([1704067200000i64, "x", 2.0, 3.0, 4.0])).is_none());
    }

    #[test]
    fn test_parse_point_valid_and_garbled() {
        assert_eq!(
            parse_point(&json!([1704067200000i64, 42500.5])),
            Some((1_704_067_200_000, dec!(42500.5)))
        );
        assert!(parse_point(&json!([1704067200000i64])).is_none());
        assert!(parse_point(&json!(["ts", 42500.5])).is_none());
    }

    #[test]
    fn test_bad_rows_do_not_abort_parse() {
        let rows = json!([
            [1, 100.0, 101.0, 99.0, 100.5],
            "garbage",
            [2, 100.5, 102.0, 100.0, 101.5],
        ]);
        let bars: Vec<Bar> = rows.as_array().unwrap().iter().filter_map(parse_bar).collect();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, dec!(101.5));
    }
}
