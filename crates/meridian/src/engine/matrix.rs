//! Labelled correlation matrices.

use ndarray::Array2;

/// Pairwise correlations of a list of tickers.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    tickers: Vec<String>,
    matrix: Array2<f64>,
}

impl CorrelationMatrix {
    pub(super) fn identity(tickers: &[&str]) -> Self {
        Self {
            tickers: tickers.iter().map(|t| (*t).to_string()).collect(),
            matrix: Array2::eye(tickers.len()),
        }
    }

    pub(super) fn set(&mut self, i: usize, j: usize, value: f64) {
        self.matrix[[i, j]] = value;
        self.matrix[[j, i]] = value;
    }

    /// Tickers labelling rows and columns.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Correlation values, rows and columns in ticker order.
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Correlation of two tickers in the matrix.
    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == first)?;
        let j = self.tickers.iter().position(|t| t == second)?;
        Some(self.matrix[[i, j]])
    }
}
