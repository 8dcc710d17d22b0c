use napi::Result as NapiResult;
use napi_derive::napi;

use return_layers_core::chart::build_chart as chart_rows;
use return_layers_core::layers::calculate_return_layers as compute_layers;
use return_layers_core::layers::{FieldEdit, ReturnLayersInput, ReturnMetric};
use return_layers_core::scenarios::sweep_global as sweep;
use return_layers_core::{ComputationOutput, SensitivityVariable};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_input(input_json: &str) -> NapiResult<ReturnLayersInput> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Return layers
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_return_layers(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let output = compute_layers(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sample_input() -> NapiResult<String> {
    serde_json::to_string(&ReturnLayersInput::sample()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// `edit` is either a JSON `FieldEdit` object or the short form
/// `"Equities.gross_return=9"` / `"percent_debt=30"`.
#[napi]
pub fn apply_edit(input_json: String, edit: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let edit: FieldEdit = if edit.trim_start().starts_with('{') {
        serde_json::from_str(&edit).map_err(to_napi_error)?
    } else {
        edit.parse().map_err(to_napi_error)?
    };
    let updated = input.apply_edit(&edit).map_err(to_napi_error)?;
    serde_json::to_string(&updated).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

#[napi]
pub fn build_chart(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let computed = compute_layers(&input).map_err(to_napi_error)?;
    let output = ComputationOutput {
        result: chart_rows(&computed.result),
        methodology: computed.methodology,
        assumptions: computed.assumptions,
        warnings: computed.warnings,
        metadata: computed.metadata,
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn sweep_global(
    input_json: String,
    variable_json: String,
    metric: String,
) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let variable: SensitivityVariable =
        serde_json::from_str(&variable_json).map_err(to_napi_error)?;
    let metric: ReturnMetric = metric.parse().map_err(to_napi_error)?;
    let output = sweep(&input, &variable, metric).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
