use clap::Args;
use serde_json::Value;
use tracing::debug;

use return_layers_core::layers::FieldEdit;

use super::{load_input, LayerInputArgs};

/// Arguments for editing an input
#[derive(Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub input: LayerInputArgs,

    /// Edit as FIELD=VALUE or "ASSET.FIELD=VALUE" (repeatable, applied in order)
    /// e.g. --set percent_debt=30 --set "Equities.gross_return=9"
    #[arg(long = "set", required = true)]
    pub edits: Vec<String>,
}

/// Apply edits and print the resulting input, ready to pipe into `compute`.
pub fn run_edit(args: EditArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let edits = args
        .edits
        .iter()
        .map(|s| s.parse::<FieldEdit>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut current = load_input(&args.input)?;
    for edit in &edits {
        debug!(?edit, "applying edit");
        current = current.apply_edit(edit)?;
    }

    Ok(serde_json::to_value(current)?)
}
