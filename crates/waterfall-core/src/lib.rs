pub mod allocation;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod structuring;
pub mod types;

#[cfg(feature = "analytics")]
pub mod analytics;

#[cfg(feature = "datasets")]
pub mod datasets;

pub use error::WaterfallError;
pub use types::*;

/// Standard result type for all waterfall operations
pub type WaterfallResult<T> = Result<T, WaterfallError>;
