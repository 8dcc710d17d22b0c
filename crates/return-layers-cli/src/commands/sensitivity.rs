use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use return_layers_core::chart::format_percent;
use return_layers_core::layers::ReturnMetric;
use return_layers_core::scenarios::{sweep_global, SweepOutput};
use return_layers_core::{ComputationOutput, SensitivityVariable};

use super::{load_input, LayerInputArgs};

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub input: LayerInputArgs,

    /// Global parameter to sweep in format name:min:max:step
    /// (e.g. "percent_debt:0:60:10")
    #[arg(long)]
    pub var: String,

    /// Metric to report: leveraged_gross, leveraged_net, after_tax,
    /// after_tax_real, unleveraged_net, risk_premium, expenses_impact,
    /// tax_impact, inflation_impact
    #[arg(long, default_value = "after_tax_real")]
    pub metric: String,
}

#[derive(Debug, Serialize)]
struct SensitivityOutput {
    sweep: SweepOutput,
    table: Vec<Vec<String>>,
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse()?,
        max: parts[2].parse()?,
        step: parts[3].parse()?,
    })
}

/// Parameter values down the side, assets across the top.
fn sweep_table(sweep: &SweepOutput) -> Vec<Vec<String>> {
    let mut table = Vec::with_capacity(sweep.values.len() + 1);
    let mut header = vec![sweep.parameter.to_string()];
    header.extend(sweep.assets.iter().cloned());
    table.push(header);

    for (value, row) in sweep.values.iter().zip(&sweep.matrix) {
        let mut cells = vec![value.normalize().to_string()];
        cells.extend(row.iter().map(|cell: &Option<Decimal>| {
            cell.map(|v| format_percent(v, 2)).unwrap_or_else(|| "n/a".into())
        }));
        table.push(cells);
    }
    table
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let variable = parse_sens_var(&args.var)?;
    let metric: ReturnMetric = args.metric.parse()?;
    let input = load_input(&args.input)?;

    let swept = sweep_global(&input, &variable, metric)?;
    let table = sweep_table(&swept.result);

    let output = ComputationOutput {
        result: SensitivityOutput {
            sweep: swept.result,
            table,
        },
        methodology: swept.methodology,
        assumptions: swept.assumptions,
        warnings: swept.warnings,
        metadata: swept.metadata,
    };
    Ok(serde_json::to_value(output)?)
}
