pub mod assets;
pub mod calculator;
pub mod edits;

pub use assets::{AssetClass, FormulaVariant, GlobalParameters, ReturnLayersInput};
pub use calculator::{
    calculate_return_layers, derive_returns, DerivedReturn, LayerRow, ReturnLayersOutput,
    ReturnMetric,
};
pub use edits::{parse_field_value, AssetField, FieldEdit, GlobalField};
