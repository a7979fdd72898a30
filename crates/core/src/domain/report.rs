use crate::domain::headline::Headline;
use crate::domain::prediction::Prediction;
use chrono::NaiveDate;
use serde::Serialize;

/// Everything one form submission produced. Missing parts render as absent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub symbol: String,
    #[serde(skip)]
    pub chart_svg: Option<String>,
    pub prediction: Option<Prediction>,
    pub next_trading_day: Option<NaiveDate>,
    pub headlines: Vec<Headline>,
}

impl Report {
    pub fn has_chart(&self) -> bool {
        self.chart_svg.is_some()
    }
}
