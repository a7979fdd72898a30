use crate::chart::render_price_chart;
use crate::config::{Settings, Variant};
use crate::domain::headline::{Headline, MAX_HEADLINES};
use crate::domain::prediction::{Prediction, UNABLE_TO_FETCH};
use crate::domain::report::Report;
use crate::domain::series::{Lookback, PriceSeries};
use crate::ingest::provider::{PriceSource, YahooChartProvider};
use crate::news::{HeadlineSource, QuotePageScraper};
use crate::predict::{self, rnn::RnnConfig};
use crate::time::us_market::next_trading_day;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Upper-cases the submitted symbol. No other validation happens.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Runs fetch, chart, estimate, and headlines for one submission.
#[derive(Clone)]
pub struct Orchestrator {
    prices: Arc<dyn PriceSource>,
    headlines: Arc<dyn HeadlineSource>,
    variant: Variant,
    lookback: Lookback,
    rnn: RnnConfig,
}

impl Orchestrator {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        headlines: Arc<dyn HeadlineSource>,
        variant: Variant,
        lookback: Lookback,
    ) -> Self {
        Self {
            prices,
            headlines,
            variant,
            lookback,
            rnn: RnnConfig::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prices = YahooChartProvider::from_settings(settings)?;
        let headlines = QuotePageScraper::from_settings(settings)?;
        Ok(Self::new(
            Arc::new(prices),
            Arc::new(headlines),
            settings.variant,
            settings.lookback,
        )
        .with_rnn_config(RnnConfig::from_env()))
    }

    pub fn with_rnn_config(mut self, rnn: RnnConfig) -> Self {
        self.rnn = rnn;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Produces the page content for `raw_symbol`.
    ///
    /// Only the simple variant returns `Err`, and only when the price fetch fails.
    pub async fn run(&self, raw_symbol: &str) -> Result<Report> {
        let symbol = normalize_symbol(raw_symbol);

        let fetched = self.prices.fetch_history(&symbol, self.lookback).await;

        let series = match self.variant {
            Variant::Simple => fetched
                .with_context(|| format!("failed to fetch price history for {symbol}"))?,
            Variant::Enhanced => match fetched {
                Ok(series) if !series.is_empty() => series,
                Ok(_) => {
                    tracing::warn!(%symbol, provider = self.prices.provider_name(), "empty price history");
                    return Ok(unable_to_fetch(symbol));
                }
                Err(err) => {
                    tracing::warn!(%symbol, provider = self.prices.provider_name(), error = %err, "price history fetch failed");
                    return Ok(unable_to_fetch(symbol));
                }
            },
        };

        let chart_svg = render_price_chart(&symbol, &series)
            .with_context(|| format!("failed to render chart for {symbol}"))?;

        let prediction = self.estimate(series.clone()).await?;
        let next_trading_day = series.last().map(|p| next_trading_day(p.date));
        let headlines = self.headlines_for(&symbol).await;

        Ok(Report {
            symbol,
            chart_svg: Some(chart_svg),
            prediction: Some(prediction),
            next_trading_day,
            headlines,
        })
    }

    async fn estimate(&self, series: PriceSeries) -> Result<Prediction> {
        match self.variant {
            Variant::Simple => Ok(predict::moving_average(&series)),
            Variant::Enhanced => {
                let config = self.rnn.clone();
                tokio::task::spawn_blocking(move || predict::recurrent(&series, &config))
                    .await
                    .context("join model training task failed")
            }
        }
    }

    async fn headlines_for(&self, symbol: &str) -> Vec<Headline> {
        match self.headlines.fetch_headlines(symbol).await {
            Ok(mut items) => {
                items.truncate(MAX_HEADLINES);
                items
            }
            Err(err) => {
                tracing::error!(%symbol, error = %err, "failed to fetch news");
                Vec::new()
            }
        }
    }
}

fn unable_to_fetch(symbol: String) -> Report {
    Report {
        symbol,
        chart_svg: None,
        prediction: Some(Prediction::summary(UNABLE_TO_FETCH)),
        next_trading_day: None,
        headlines: Vec::new(),
    }
}
