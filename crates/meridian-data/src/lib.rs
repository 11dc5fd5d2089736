#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/meridian/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod asset;
pub mod cache;
pub mod error;
pub mod prices;
pub mod providers;
pub mod records;

pub use asset::{AssetClass, CRYPTO_TRADING_DAYS, EQUITY_TRADING_DAYS, EstimationMethod};
pub use cache::{CacheStats, ResultCache};
pub use error::{DataError, Result};
pub use prices::{PricePoint, PriceSeries};
pub use providers::{
    AssetTypeResolver, InMemoryProvider, PriceHistoryProvider, RiskFreeRateProvider,
};
pub use records::{
    CorrelationKey, CorrelationResult, ProfileField, ProfileKey, ProfileRecord, ProfileUpdate,
    RiskProfile,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
