use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "6mo")]
    SixMonths,
}

impl Lookback {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(Self::OneMonth),
            "6mo" => Ok(Self::SixMonths),
            other => anyhow::bail!("unsupported lookback {other:?} (expected 1mo or 6mo)"),
        }
    }

    /// Range parameter understood by the chart endpoint.
    pub fn as_range(self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::SixMonths => "6mo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes for one symbol, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from provider rows. Rows without a close are dropped and the
    /// remainder is sorted by date.
    pub fn from_rows<I>(rows: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let mut points = Vec::new();
        for (date, close) in rows {
            let Some(close) = close else {
                continue;
            };
            ensure!(
                close.is_finite() && close >= 0.0,
                "invalid close {close} on {date}"
            );
            points.push(PricePoint { date, close });
        }
        points.sort_by_key(|p| p.date);
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn drops_missing_closes_and_sorts() {
        let series =
            PriceSeries::from_rows([(d(4), Some(11.0)), (d(2), Some(10.0)), (d(3), None)]).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, d(2));
        assert_eq!(series.closes(), vec![10.0, 11.0]);
        assert_eq!(series.last().unwrap().close, 11.0);
    }

    #[test]
    fn rejects_non_finite_close() {
        let res = PriceSeries::from_rows([(d(2), Some(f64::NAN))]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_lookback() {
        assert_eq!(Lookback::parse("6MO").unwrap(), Lookback::SixMonths);
        assert_eq!(Lookback::OneMonth.as_range(), "1mo");
        assert!(Lookback::parse("5y").is_err());
    }
}
