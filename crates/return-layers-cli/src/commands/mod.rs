pub mod edit;
pub mod layers;
pub mod sensitivity;

use clap::Args;
use rust_decimal::Decimal;
use tracing::debug;

use return_layers_core::layers::{
    parse_field_value, AssetClass, FormulaVariant, GlobalField, ReturnLayersInput,
};

use crate::input;

/// Input options shared by every calculator command.
///
/// The base input comes from `--input`, else JSON piped on stdin, else the
/// built-in sample. Individual flags are then applied on top.
#[derive(Args, Debug, Default)]
pub struct LayerInputArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Asset class as NAME:GROSS:EXPENSES in percent (repeatable). Replaces the
    /// asset list; pass --risk-free unless the current risk-free asset is listed
    #[arg(long = "asset", allow_hyphen_values = true)]
    pub assets: Vec<String>,

    /// Inflation (e.g. 2.1 for 2.1%)
    #[arg(long, allow_hyphen_values = true)]
    pub inflation: Option<Decimal>,

    /// Tax rate (e.g. 20 for 20%)
    #[arg(long, allow_hyphen_values = true)]
    pub tax_rate: Option<Decimal>,

    /// Borrowing cost (e.g. 4 for 4%)
    #[arg(long, allow_hyphen_values = true)]
    pub borrowing_cost: Option<Decimal>,

    /// Share of the position financed with debt, 0 to below 100
    #[arg(long, allow_hyphen_values = true)]
    pub percent_debt: Option<Decimal>,

    /// Name of the asset class that supplies the risk-free rate
    #[arg(long)]
    pub risk_free: Option<String>,

    /// Formula variant: compounding, linear
    #[arg(long)]
    pub variant: Option<String>,
}

/// Parse `NAME:GROSS:EXPENSES`. The name may contain colons.
pub fn parse_asset(spec: &str) -> Result<AssetClass, Box<dyn std::error::Error>> {
    let mut parts = spec.rsplitn(3, ':');
    let (expenses, gross, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(e), Some(g), Some(n)) if !n.trim().is_empty() => (e, g, n.trim()),
        _ => {
            return Err(format!(
                "Asset must be NAME:GROSS:EXPENSES, got '{spec}'"
            )
            .into())
        }
    };
    Ok(AssetClass::new(
        name,
        parse_field_value(&format!("{name}.gross_return"), gross)?,
        parse_field_value(&format!("{name}.expenses"), expenses)?,
    ))
}

pub fn load_input(args: &LayerInputArgs) -> Result<ReturnLayersInput, Box<dyn std::error::Error>> {
    let base: ReturnLayersInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        debug!("no input supplied, starting from the sample session");
        ReturnLayersInput::sample()
    };
    apply_overrides(base, args)
}

/// Apply command-line flags on top of a base input.
fn apply_overrides(
    mut base: ReturnLayersInput,
    args: &LayerInputArgs,
) -> Result<ReturnLayersInput, Box<dyn std::error::Error>> {
    if !args.assets.is_empty() {
        base.assets = args
            .assets
            .iter()
            .map(|s| parse_asset(s))
            .collect::<Result<Vec<_>, _>>()?;
        if args.risk_free.is_none() && base.asset(&base.risk_free_asset).is_none() {
            return Err(format!(
                "--asset replaced the asset list and '{}' is no longer in it; \
                 name the risk-free asset with --risk-free",
                base.risk_free_asset
            )
            .into());
        }
    }

    let overrides = [
        (GlobalField::Inflation, args.inflation),
        (GlobalField::TaxRate, args.tax_rate),
        (GlobalField::BorrowingCost, args.borrowing_cost),
        (GlobalField::PercentDebt, args.percent_debt),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            base = base.with_global(field, value);
        }
    }

    if let Some(ref name) = args.risk_free {
        base = base.with_risk_free_asset(name)?;
    }
    if let Some(ref variant) = args.variant {
        base = base.with_variant(variant.parse::<FormulaVariant>()?);
    }

    Ok(base)
}
