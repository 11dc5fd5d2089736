//! Rolling window statistics
//!
//! Closed-form updates for a constant-size window where one observation
//! enters and one leaves:
//!
//! mean'       = mean + (new − lost)/n
//! variance'   = variance + n/(n−1) · ((new² − lost²)/n + mean² − mean'²)
//! covariance' = covariance + [(newX·newY − lostX·lostY) − meanX·(newY − lostY)
//!               − meanY·(newX − lostX) − (newX − lostX)(newY − lostY)/n] / (n−1)
//!
//! Statistics are Bessel-corrected, matching [`crate::stats`].

use crate::error::{Result, RiskError};
use crate::stats::{sample_covariance, sample_mean, sample_variance};
use std::collections::VecDeque;

const fn ensure_window(n: usize) -> Result<()> {
    if n < 2 {
        return Err(RiskError::InsufficientData {
            required: 2,
            actual: n,
        });
    }
    Ok(())
}

/// Mean after replacing `lost` by `new` in a window of `n` values.
pub fn rolling_mean(mean: f64, new: f64, lost: f64, n: usize) -> Result<f64> {
    ensure_window(n)?;
    Ok(mean + (new - lost) / n as f64)
}

/// Variance after replacing `lost` by `new`; `mean` is the mean before the update.
pub fn rolling_variance(variance: f64, mean: f64, new: f64, lost: f64, n: usize) -> Result<f64> {
    let next_mean = rolling_mean(mean, new, lost, n)?;
    let n = n as f64;
    let shift = (new * new - lost * lost) / n + mean * mean - next_mean * next_mean;
    Ok(variance + (n / (n - 1.0)) * shift)
}

/// Covariance after replacing the pair `lost` by `new`; `means` are taken
/// before the update.
pub fn rolling_covariance(
    covariance: f64,
    means: (f64, f64),
    new: (f64, f64),
    lost: (f64, f64),
    n: usize,
) -> Result<f64> {
    ensure_window(n)?;
    let (mean_x, mean_y) = means;
    let dx = new.0 - lost.0;
    let dy = new.1 - lost.1;
    let n = n as f64;
    let delta = (new.0 * new.1 - lost.0 * lost.1) - mean_x * dy - mean_y * dx - dx * dy / n;
    Ok(covariance + delta / (n - 1.0))
}

/// Fixed-size window of paired observations with running mean, variance and
/// covariance.
///
/// Statistics are computed directly while the window fills and updated
/// recursively once it is full.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<(f64, f64)>,
    means: (f64, f64),
    variances: (f64, f64),
    covariance: f64,
}

impl RollingWindow {
    /// Create an empty window holding `capacity` observations.
    pub fn new(capacity: usize) -> Result<Self> {
        ensure_window(capacity)?;
        Ok(Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            means: (0.0, 0.0),
            variances: (0.0, 0.0),
            covariance: 0.0,
        })
    }

    /// Window size.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Observations currently held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no observation has been pushed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the window holds `capacity` observations.
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Add an observation, returning the one that left the window.
    pub fn push(&mut self, x: f64, y: f64) -> Result<Option<(f64, f64)>> {
        if !self.is_full() {
            self.values.push_back((x, y));
            self.recompute()?;
            return Ok(None);
        }

        let Some(lost) = self.values.pop_front() else {
            return Ok(None);
        };
        self.values.push_back((x, y));

        let n = self.capacity;
        self.covariance = rolling_covariance(self.covariance, self.means, (x, y), lost, n)?;
        self.variances = (
            rolling_variance(self.variances.0, self.means.0, x, lost.0, n)?,
            rolling_variance(self.variances.1, self.means.1, y, lost.1, n)?,
        );
        self.means = (
            rolling_mean(self.means.0, x, lost.0, n)?,
            rolling_mean(self.means.1, y, lost.1, n)?,
        );
        Ok(Some(lost))
    }

    fn recompute(&mut self) -> Result<()> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = self.values.iter().copied().unzip();
        self.means = (sample_mean(&xs)?, sample_mean(&ys)?);
        if xs.len() >= 2 {
            self.variances = (sample_variance(&xs)?, sample_variance(&ys)?);
            self.covariance = sample_covariance(&xs, &ys)?;
        }
        Ok(())
    }

    /// Means of the two series.
    pub const fn means(&self) -> (f64, f64) {
        self.means
    }

    /// Variances of the two series.
    pub const fn variances(&self) -> (f64, f64) {
        self.variances
    }

    /// Covariance of the two series.
    pub const fn covariance(&self) -> f64 {
        self.covariance
    }

    /// Observations, oldest first.
    pub fn values(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }
}
