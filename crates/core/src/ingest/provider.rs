use crate::config::Settings;
use crate::domain::series::{Lookback, PriceSeries};
use crate::ingest::types::ChartEnvelope;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_history(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(default_headers())
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: settings.market_data_base_url.clone(),
        })
    }

    fn url(&self, symbol: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(self.base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid market data base url: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("market data base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl PriceSource for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_history(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries> {
        let url = self.url(symbol)?;

        let res = self
            .http
            .get(url)
            .query(&[("range", lookback.as_range()), ("interval", "1d")])
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;

        // Unknown symbols come back as 404 with an error object; prefer its description.
        let parsed = serde_json::from_str::<ChartEnvelope>(&text);
        if !status.is_success() {
            if let Ok(env) = parsed {
                if let Some(err) = env.chart.error {
                    anyhow::bail!(
                        "market data HTTP {status} for {symbol}: {} ({})",
                        err.description,
                        err.code
                    );
                }
            }
            anyhow::bail!("market data HTTP {status} for {symbol}: {text}");
        }

        let env = parsed
            .with_context(|| format!("market data response is not a chart payload: {text}"))?;
        let series = env
            .into_series()
            .with_context(|| format!("failed to read price series for {symbol}"))?;

        tracing::debug!(%symbol, range = lookback.as_range(), points = series.len(), "fetched price history");
        Ok(series)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;

    fn settings(base: &str) -> Settings {
        Settings {
            sentry_dsn: None,
            variant: Variant::Simple,
            lookback: Lookback::OneMonth,
            market_data_base_url: base.to_string(),
            news_base_url: "https://finance.yahoo.com".to_string(),
        }
    }

    #[test]
    fn builds_chart_url_and_escapes_symbol() {
        let p = YahooChartProvider::from_settings(&settings("https://query1.finance.yahoo.com/"))
            .unwrap();
        assert_eq!(
            p.url("AAPL").unwrap().as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/AAPL"
        );
        assert_eq!(
            p.url("BRK/B").unwrap().as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/BRK%2FB"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let p = YahooChartProvider::from_settings(&settings("http://127.0.0.1:9000/proxy")).unwrap();
        assert_eq!(
            p.url("MSFT").unwrap().as_str(),
            "http://127.0.0.1:9000/proxy/v8/finance/chart/MSFT"
        );
    }
}
