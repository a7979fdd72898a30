use ndarray::Array1;

/// Min-max scaling into `[0, 1]`, fitted on one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return Self { min: 0.0, range: 1.0 };
        }

        // A flat series has no spread; scale by 1 so everything maps to 0.
        let range = if max > min { max - min } else { 1.0 };
        Self { min, range }
    }

    pub fn transform(&self, values: &[f64]) -> Array1<f64> {
        values.iter().map(|v| (v - self.min) / self.range).collect()
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range + self.min
    }
}
