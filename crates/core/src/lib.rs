pub mod chart;
pub mod domain;
pub mod ingest;
pub mod news;
pub mod orchestrator;
pub mod predict;
pub mod time;

pub mod config {
    use crate::domain::series::Lookback;
    use anyhow::Context;

    const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_NEWS_BASE_URL: &str = "https://finance.yahoo.com";

    /// Which estimate the orchestrator produces, and how it treats a failed fetch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Variant {
        /// 5-day moving average; provider errors fail the request.
        Simple,
        /// Recurrent network retrained per request; provider errors render a message.
        Enhanced,
    }

    impl Variant {
        pub fn parse(s: &str) -> anyhow::Result<Self> {
            match s.trim().to_ascii_lowercase().as_str() {
                "simple" | "moving_average" => Ok(Self::Simple),
                "enhanced" | "rnn" => Ok(Self::Enhanced),
                other => anyhow::bail!("unknown PREDICTOR {other:?} (expected simple or enhanced)"),
            }
        }

        pub fn default_lookback(self) -> Lookback {
            match self {
                Self::Simple => Lookback::OneMonth,
                Self::Enhanced => Lookback::SixMonths,
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub variant: Variant,
        pub lookback: Lookback,
        pub market_data_base_url: String,
        pub news_base_url: String,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let variant = match std::env::var("PREDICTOR").ok() {
                Some(v) => Variant::parse(&v)?,
                None => Variant::Simple,
            };

            let lookback = match std::env::var("LOOKBACK").ok() {
                Some(v) => Lookback::parse(&v).context("invalid LOOKBACK")?,
                None => variant.default_lookback(),
            };

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                variant,
                lookback,
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MARKET_DATA_BASE_URL.to_string()),
                news_base_url: std::env::var("NEWS_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_NEWS_BASE_URL.to_string()),
            })
        }

        pub fn with_variant(mut self, variant: Variant) -> Self {
            self.variant = variant;
            self.lookback = variant.default_lookback();
            self
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_variant_aliases() {
            assert_eq!(Variant::parse("simple").unwrap(), Variant::Simple);
            assert_eq!(Variant::parse(" RNN ").unwrap(), Variant::Enhanced);
            assert!(Variant::parse("lstm-xl").is_err());
        }

        #[test]
        fn variant_picks_lookback() {
            assert_eq!(Variant::Simple.default_lookback(), Lookback::OneMonth);
            assert_eq!(Variant::Enhanced.default_lookback(), Lookback::SixMonths);
        }
    }
}
