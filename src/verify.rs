//! Heuristic verification: weighted indicators against a threshold.
//!
//! Weights and thresholds belong to each scenario. The engine only sums the
//! weights of indicators that fired; a non-positive or NaN weight counts as
//! zero so the sum can only grow as indicators fire.

use serde::{Deserialize, Serialize};

/// A named weak signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub weight: f64,
    pub fired: bool,
}

impl Indicator {
    pub fn new(name: impl Into<String>, weight: f64, fired: bool) -> Self {
        Self {
            name: name.into(),
            weight,
            fired,
        }
    }

    pub fn fired(name: impl Into<String>, weight: f64) -> Self {
        Self::new(name, weight, true)
    }

    pub fn missed(name: impl Into<String>, weight: f64) -> Self {
        Self::new(name, weight, false)
    }

    /// Weight as counted by the verifier
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_nan() || self.weight < 0.0 {
            0.0
        } else {
            self.weight
        }
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub score: f64,
    pub max_score: f64,
    pub threshold: f64,
    pub passed: bool,
}

/// Sum of the weights of every indicator that fired
pub fn aggregate(indicators: &[Indicator]) -> f64 {
    indicators
        .iter()
        .filter(|i| i.fired)
        .map(Indicator::effective_weight)
        .sum()
}

pub fn score(indicators: &[Indicator], threshold: f64) -> bool {
    evaluate(indicators, threshold).passed
}

pub fn evaluate(indicators: &[Indicator], threshold: f64) -> Verdict {
    let score = aggregate(indicators);
    let max_score = indicators.iter().map(Indicator::effective_weight).sum();
    Verdict {
        score,
        max_score,
        threshold,
        passed: score >= threshold,
    }
}
