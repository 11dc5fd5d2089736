#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/meridian/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod correlation;
pub mod error;
pub mod estimators;
pub mod returns;
pub mod rolling;
pub mod stats;

pub use calendar::{AlignedPair, TradingCalendar, align, common_dates};
pub use correlation::{
    bound_correlation, likelihood_correlation, moment_correlation, percentile_correlation,
};
pub use error::{Result, RiskError};
pub use estimators::{
    AnnualizedMoments, Estimator, LikelihoodEstimator, MomentEstimator, NormalFit,
    PercentileEstimator, estimate, estimator_for,
};
pub use returns::ReturnSample;
pub use rolling::{RollingWindow, rolling_covariance, rolling_mean, rolling_variance};
