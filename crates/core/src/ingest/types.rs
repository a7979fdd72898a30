use crate::domain::series::PriceSeries;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: Option<String>,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Option<Vec<Option<f64>>>,
}

impl ChartEnvelope {
    /// Converts the first result into a series. A result without a close column, or no
    /// result at all, is an empty series rather than an error.
    pub fn into_series(self) -> Result<PriceSeries> {
        if let Some(err) = self.chart.error {
            anyhow::bail!("chart error {}: {}", err.code, err.description);
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(PriceSeries::default());
        };

        let Some(closes) = result
            .indicators
            .quote
            .into_iter()
            .next()
            .and_then(|q| q.close)
        else {
            return Ok(PriceSeries::default());
        };

        let offset = result.meta.gmtoffset;
        let mut rows = Vec::with_capacity(result.timestamp.len());
        for (ts, close) in result.timestamp.iter().zip(closes) {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .with_context(|| format!("timestamp out of range: {ts}"))?
                .date_naive();
            rows.push((date, close));
        }

        PriceSeries::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn converts_timestamps_to_exchange_dates_and_skips_nulls() {
        // 2026-03-02 14:30 UTC and 2026-03-03 14:30 UTC, New York offset -5h.
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL", "gmtoffset": -18000},
                    "timestamp": [1772461800, 1772548200, 1772634600],
                    "indicators": {"quote": [{"close": [240.5, null, 242.0]}]}
                }],
                "error": null
            }
        });

        let env: ChartEnvelope = serde_json::from_value(v).unwrap();
        let series = env.into_series().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.points()[0].date,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
        assert_eq!(series.closes(), vec![240.5, 242.0]);
    }

    #[test]
    fn missing_close_column_is_empty() {
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "ZZZZ"},
                    "timestamp": [1772461800],
                    "indicators": {"quote": [{}]}
                }],
                "error": null
            }
        });

        let env: ChartEnvelope = serde_json::from_value(v).unwrap();
        assert!(env.into_series().unwrap().is_empty());
    }

    #[test]
    fn error_object_is_an_error() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });

        let env: ChartEnvelope = serde_json::from_value(v).unwrap();
        let err = env.into_series().unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }
}
