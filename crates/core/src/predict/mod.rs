pub mod rnn;
pub mod scaler;

use crate::domain::prediction::{Prediction, MODEL_UNAVAILABLE, NOT_ENOUGH_DATA};
use crate::domain::series::PriceSeries;
use rnn::RnnConfig;
use std::time::Instant;

pub const MOVING_AVERAGE_DAYS: usize = 5;

/// Mean of the last five closes, or the fallback text when there are fewer.
pub fn moving_average(series: &PriceSeries) -> Prediction {
    let closes = series.closes();
    if closes.len() < MOVING_AVERAGE_DAYS {
        return Prediction::summary(NOT_ENOUGH_DATA);
    }

    let tail = &closes[closes.len() - MOVING_AVERAGE_DAYS..];
    let mean = tail.iter().sum::<f64>() / MOVING_AVERAGE_DAYS as f64;
    Prediction::summary(format!("${mean:.2} (Simple average)"))
}

/// Latest close next to a freshly trained network's estimate.
///
/// Blocks for the whole training run; call it off the async executor.
pub fn recurrent(series: &PriceSeries, config: &RnnConfig) -> Prediction {
    let Some(last) = series.last() else {
        return Prediction::summary(NOT_ENOUGH_DATA);
    };

    // A full window with no close after it leaves nothing to train on.
    if series.len() <= config.window {
        return Prediction::Model {
            latest_close: last.close,
            predicted_close: None,
            note: Some(MODEL_UNAVAILABLE.to_string()),
        };
    }

    let started = Instant::now();
    match rnn::forecast_next(&series.closes(), config) {
        Ok(forecast) => {
            tracing::info!(
                windows = forecast.windows,
                epochs = config.epochs,
                hidden_size = config.hidden_size,
                final_loss = ?forecast.final_loss,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "retrained recurrent model from scratch for this request"
            );
            Prediction::Model {
                latest_close: last.close,
                predicted_close: Some(forecast.predicted_close),
                note: None,
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, points = series.len(), "recurrent estimate failed");
            Prediction::Model {
                latest_close: last.close,
                predicted_close: None,
                note: Some(format!("Model estimate unavailable: {err}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        PriceSeries::from_rows(
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| (start + Duration::days(i as i64), Some(*c))),
        )
        .unwrap()
    }

    #[test]
    fn averages_last_five_closes() {
        let p = moving_average(&series(&[1.0, 100.0, 101.0, 102.0, 103.0, 104.0]));
        assert_eq!(p.text(), Some("$102.00 (Simple average)"));
    }

    #[test]
    fn short_series_falls_back_to_message() {
        for n in 0..MOVING_AVERAGE_DAYS {
            let closes = vec![10.0; n];
            let p = moving_average(&series(&closes));
            assert_eq!(p.text(), Some(NOT_ENOUGH_DATA));
        }
    }

    #[test]
    fn recurrent_reports_latest_close_below_threshold() {
        let closes: Vec<f64> = (0..59).map(|i| 20.0 + i as f64).collect();
        let p = recurrent(&series(&closes), &RnnConfig::default());
        assert_eq!(
            p,
            Prediction::Model {
                latest_close: 78.0,
                predicted_close: None,
                note: Some(MODEL_UNAVAILABLE.to_string()),
            }
        );
    }

    #[test]
    fn recurrent_with_exactly_one_window_has_no_training_sample() {
        let closes = vec![42.0; 60];
        let p = recurrent(&series(&closes), &RnnConfig::default());
        match p {
            Prediction::Model {
                latest_close,
                predicted_close,
                note,
            } => {
                assert_eq!(latest_close, 42.0);
                assert!(predicted_close.is_none());
                assert_eq!(note.as_deref(), Some(MODEL_UNAVAILABLE));
            }
            other => panic!("unexpected prediction: {other:?}"),
        }
    }

    #[test]
    fn recurrent_produces_estimate_with_enough_history() {
        let closes: Vec<f64> = (0..70).map(|i| 200.0 + (i as f64 / 3.0).cos()).collect();
        let config = RnnConfig::default()
            .with_hidden_size(4)
            .with_epochs(2)
            .with_seed(3);
        let p = recurrent(&series(&closes), &config);
        match p {
            Prediction::Model {
                predicted_close: Some(v),
                note: None,
                ..
            } => assert!(v.is_finite()),
            other => panic!("unexpected prediction: {other:?}"),
        }
    }
}
