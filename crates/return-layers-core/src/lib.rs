pub mod error;
pub mod layers;
pub mod types;

#[cfg(feature = "chart")]
pub mod chart;

#[cfg(feature = "sensitivity")]
pub mod scenarios;

pub use error::ReturnLayersError;
pub use layers::{
    calculate_return_layers, derive_returns, AssetClass, FormulaVariant, GlobalParameters,
    ReturnLayersInput,
};
pub use types::*;

/// Standard result type for all return-layer operations
pub type ReturnLayersResult<T> = Result<T, ReturnLayersError>;
