#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/meridian/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache_location;
pub mod config;
pub mod engine;
pub mod error;

// Re-export main types from sub-crates
pub use meridian_data as data;
pub use meridian_risk as risk;

pub use config::EngineConfig;
pub use engine::{CorrelationMatrix, RiskEngine};
pub use error::{EngineError, Result};

pub use meridian_data::{AssetClass, CorrelationResult, EstimationMethod, RiskProfile};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
