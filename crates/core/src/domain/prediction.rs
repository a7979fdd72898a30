use serde::{Deserialize, Serialize};

pub const NOT_ENOUGH_DATA: &str = "Not enough data to predict";
pub const UNABLE_TO_FETCH: &str = "Unable to fetch stock data. Please check the symbol and try again.";
pub const MODEL_UNAVAILABLE: &str =
    "Not enough history for a model estimate (need more than 60 trading days)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prediction {
    /// Single line of text: a moving-average estimate or a fallback message.
    Summary { text: String },
    /// Latest observed close next to the network's estimate.
    Model {
        latest_close: f64,
        predicted_close: Option<f64>,
        note: Option<String>,
    },
}

impl Prediction {
    pub fn summary(text: impl Into<String>) -> Self {
        Self::Summary { text: text.into() }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Summary { text } => Some(text),
            Self::Model { .. } => None,
        }
    }

    /// Display lines, in order.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Summary { text } => vec![text.clone()],
            Self::Model {
                latest_close,
                predicted_close,
                note,
            } => {
                let mut out = vec![format!("Latest close: ${latest_close:.2}")];
                if let Some(p) = predicted_close {
                    out.push(format!("Predicted next close: ${p:.2} (RNN)"));
                }
                if let Some(note) = note {
                    out.push(note.clone());
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_lines_include_note_only_when_present() {
        let p = Prediction::Model {
            latest_close: 101.5,
            predicted_close: Some(102.25),
            note: None,
        };
        assert_eq!(
            p.lines(),
            vec!["Latest close: $101.50", "Predicted next close: $102.25 (RNN)"]
        );

        let p = Prediction::Model {
            latest_close: 3.0,
            predicted_close: None,
            note: Some(MODEL_UNAVAILABLE.to_string()),
        };
        assert_eq!(p.lines().len(), 2);
        assert_eq!(p.text(), None);
    }
}
