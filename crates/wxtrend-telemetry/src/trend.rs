//! Least-squares trend over a window snapshot.
//!
//! `x` is the 0-based position in the snapshot, not wall-clock time, so the
//! slope is "change per reading" and irregular sampling does not skew it.

use serde::Serialize;

use crate::error::TrendError;
use crate::observation::Observation;

/// Slopes within this band are reported as steady
const STEADY_BAND: f64 = 0.05;

/// Slope/intercept pair of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fit {
    pub slope: f64,
    pub intercept: f64,
}

impl Fit {
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Fitted values at indices `0..n`, for drawing the trend line
    pub fn line(&self, n: usize) -> Vec<f64> {
        (0..n).map(|i| self.value_at(i as f64)).collect()
    }

    pub fn direction(&self) -> TrendDirection {
        TrendDirection::from_slope(self.slope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Steady,
    Falling,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > STEADY_BAND {
            Self::Rising
        } else if slope < -STEADY_BAND {
            Self::Falling
        } else {
            Self::Steady
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Rising => "▲",
            Self::Steady => "■",
            Self::Falling => "▼",
        })
    }
}

/// Ordinary least-squares simple linear regression.
///
/// Fewer than two points, or points whose `x` values are all equal, yield
/// [`TrendError::InsufficientData`].
pub fn fit(points: &[(f64, f64)]) -> Result<Fit, TrendError> {
    if points.len() < 2 {
        return Err(TrendError::InsufficientData {
            points: points.len(),
        });
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var) = (0.0, 0.0);
    for (x, y) in points {
        let dx = x - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }

    if var == 0.0 {
        return Err(TrendError::InsufficientData {
            points: points.len(),
        });
    }

    let slope = cov / var;
    Ok(Fit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Fit a snapshot using each observation's position as `x`.
pub fn fit_observations(snapshot: &[Observation]) -> Result<Fit, TrendError> {
    let points: Vec<(f64, f64)> = snapshot
        .iter()
        .enumerate()
        .map(|(i, obs)| (i as f64, obs.value))
        .collect();
    fit(&points)
}
