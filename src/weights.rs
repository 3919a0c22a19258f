use crate::features::FEATURE_COUNT;
use serde::{Deserialize, Serialize};

/// One coefficient per feature, in `features::FEATURES` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector([f64; FEATURE_COUNT]);

impl WeightVector {
    pub const DEFAULT: Self = WeightVector([
        -1.0,  // monotonicity
        -0.1,  // smoothness
        2.7,   // free cells
        0.01,  // max tile
        10.0,  // freedom degree
        1.0,   // free or paired cells
    ]);

    pub const fn from_array(weights: [f64; FEATURE_COUNT]) -> Self {
        WeightVector(weights)
    }

    pub const fn get(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    /// Replace every coefficient. No validation is done.
    pub fn set(&mut self, weights: [f64; FEATURE_COUNT]) {
        self.0 = weights;
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        WeightVector::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_after_set() {
        let mut weights = WeightVector::default();
        let w = [0.5, -3.25, 1e-9, 0.0, -0.0, 42.0];
        weights.set(w);
        assert_eq!(weights.get(), w);
    }

    #[test]
    fn test_json_is_a_plain_array() {
        let weights = WeightVector::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0,6.0]");
        let back: WeightVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weights);
    }

    #[test]
    fn test_wrong_length_json_is_rejected() {
        assert!(serde_json::from_str::<WeightVector>("[1.0, 2.0]").is_err());
    }
}
