use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use return_layers_core::chart::{build_chart, ChartData};
use return_layers_core::layers::{calculate_return_layers, ReturnLayersInput};
use return_layers_core::ComputationOutput;

use super::{load_input, LayerInputArgs};

/// Arguments for the return layer breakdown
#[derive(Args)]
pub struct ComputeArgs {
    #[command(flatten)]
    pub input: LayerInputArgs,
}

/// Arguments for chart rows
#[derive(Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub input: LayerInputArgs,
}

#[derive(Debug, Serialize)]
struct ChartOutput {
    chart: ChartData,
    /// Header row then one row per asset, two-decimal cells
    table: Vec<Vec<String>>,
}

pub fn run_compute(args: ComputeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = load_input(&args.input)?;
    info!(
        assets = input.assets.len(),
        variant = %input.variant,
        "computing return layers"
    );
    let result = calculate_return_layers(&input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_chart(args: ChartArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = load_input(&args.input)?;
    let computed = calculate_return_layers(&input)?;
    let chart = build_chart(&computed.result);
    let table = chart.table();

    let output = ComputationOutput {
        result: ChartOutput { chart, table },
        methodology: computed.methodology,
        assumptions: computed.assumptions,
        warnings: computed.warnings,
        metadata: computed.metadata,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_sample() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(ReturnLayersInput::sample())?)
}
