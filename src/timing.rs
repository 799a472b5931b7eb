//! Summary statistics over repeated wall-clock measurements.
use std::time::Duration;

/// Mean and spread of a set of timed trials, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    /// Population standard deviation of the trials.
    pub std_dev: f64,
}

/// Summarizes `trials` into a [`Summary`]. Empty input yields zeros.
pub fn summarize(trials: &[Duration]) -> Summary {
    if trials.is_empty() {
        return Summary {
            mean: 0.0,
            std_dev: 0.0,
        };
    }
    let seconds = trials.iter().map(Duration::as_secs_f64).collect::<Vec<_>>();
    let mean = seconds.iter().sum::<f64>() / seconds.len() as f64;
    let variance = seconds
        .iter()
        .map(|trial| (trial - mean).powi(2))
        .sum::<f64>()
        / seconds.len() as f64;
    Summary {
        mean,
        std_dev: variance.sqrt(),
    }
}
