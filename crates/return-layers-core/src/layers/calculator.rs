use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ReturnLayersError;
use crate::types::{with_metadata, ComputationOutput, Percent, Rate};
use crate::ReturnLayersResult;

use super::assets::{AssetClass, FormulaVariant, GlobalParameters, ReturnLayersInput};

const HUNDRED: Decimal = dec!(100);

/// Return layers for one asset class, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedReturn {
    /// Pre-tax nominal gross leveraged return
    pub leveraged_gross: Percent,
    /// Pre-tax nominal net leveraged return
    pub leveraged_net: Percent,
    /// After-tax nominal net leveraged return
    pub after_tax: Percent,
    /// After-tax real net leveraged return
    pub after_tax_real: Percent,
    /// After-tax net unleveraged return
    pub unleveraged_net: Percent,
    /// After-tax net risk premium (unleveraged)
    pub risk_premium: Percent,
    pub expenses_impact: Percent,
    /// Linear variant only: leveraged net minus after-tax
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_impact: Option<Percent>,
    /// Linear variant only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_impact: Option<Percent>,
}

/// Selects one field of a [`DerivedReturn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMetric {
    LeveragedGross,
    LeveragedNet,
    AfterTax,
    AfterTaxReal,
    UnleveragedNet,
    RiskPremium,
    ExpensesImpact,
    TaxImpact,
    InflationImpact,
}

impl ReturnMetric {
    pub const ALL: [ReturnMetric; 9] = [
        ReturnMetric::LeveragedGross,
        ReturnMetric::LeveragedNet,
        ReturnMetric::AfterTax,
        ReturnMetric::AfterTaxReal,
        ReturnMetric::UnleveragedNet,
        ReturnMetric::RiskPremium,
        ReturnMetric::ExpensesImpact,
        ReturnMetric::TaxImpact,
        ReturnMetric::InflationImpact,
    ];

    /// `None` for the impact fields the compounding variant does not report.
    pub fn value(&self, r: &DerivedReturn) -> Option<Percent> {
        match self {
            ReturnMetric::LeveragedGross => Some(r.leveraged_gross),
            ReturnMetric::LeveragedNet => Some(r.leveraged_net),
            ReturnMetric::AfterTax => Some(r.after_tax),
            ReturnMetric::AfterTaxReal => Some(r.after_tax_real),
            ReturnMetric::UnleveragedNet => Some(r.unleveraged_net),
            ReturnMetric::RiskPremium => Some(r.risk_premium),
            ReturnMetric::ExpensesImpact => Some(r.expenses_impact),
            ReturnMetric::TaxImpact => r.tax_impact,
            ReturnMetric::InflationImpact => r.inflation_impact,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnMetric::LeveragedGross => "leveraged_gross",
            ReturnMetric::LeveragedNet => "leveraged_net",
            ReturnMetric::AfterTax => "after_tax",
            ReturnMetric::AfterTaxReal => "after_tax_real",
            ReturnMetric::UnleveragedNet => "unleveraged_net",
            ReturnMetric::RiskPremium => "risk_premium",
            ReturnMetric::ExpensesImpact => "expenses_impact",
            ReturnMetric::TaxImpact => "tax_impact",
            ReturnMetric::InflationImpact => "inflation_impact",
        }
    }
}

impl fmt::Display for ReturnMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnMetric {
    type Err = ReturnLayersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        ReturnMetric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == wanted || m.as_str().replace('_', "") == wanted)
            .ok_or_else(|| ReturnLayersError::InvalidInput {
                field: "metric".into(),
                reason: format!("Unknown return metric '{s}'"),
            })
    }
}

/// One output row. Exactly one of `returns` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<DerivedReturn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLayersOutput {
    pub variant: FormulaVariant,
    pub risk_free_asset: String,
    pub risk_free_rate: Percent,
    /// Same order as the input asset list
    pub rows: Vec<LayerRow>,
}

impl ReturnLayersOutput {
    pub fn row(&self, name: &str) -> Option<&LayerRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

/// Derive every return layer for the whole asset list.
///
/// Problems with the shared parameters or the risk-free reference fail the
/// whole call. Problems confined to one asset (negative expenses, a blank
/// name, overflow) only blank out that row and add a warning.
pub fn calculate_return_layers(
    input: &ReturnLayersInput,
) -> ReturnLayersResult<ComputationOutput<ReturnLayersOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.validate_assets()?;
    let risk_free = input.risk_free_rate()?;
    validate_globals(&input.globals, risk_free, input.variant)?;

    let g = &input.globals;
    if g.percent_debt > dec!(50) {
        warnings.push(format!(
            "High leverage: {}% debt financing amplifies gains and losses alike",
            g.percent_debt
        ));
    }
    if g.tax_rate < Decimal::ZERO || g.tax_rate > HUNDRED {
        warnings.push(format!(
            "Tax rate of {}% is outside 0-100%; verify input",
            g.tax_rate
        ));
    }

    let mut rows = Vec::with_capacity(input.assets.len());
    for asset in &input.assets {
        match validate_asset(asset).and_then(|_| derive(asset, g, risk_free, input.variant)) {
            Ok(returns) => {
                debug!(asset = %asset.name, variant = %input.variant, "derived return layers");
                if g.percent_debt > Decimal::ZERO && asset.gross_return < g.borrowing_cost {
                    warnings.push(format!(
                        "{}: borrowing cost ({}%) exceeds gross return ({}%); leverage lowers the return",
                        asset.name, g.borrowing_cost, asset.gross_return
                    ));
                }
                if returns.after_tax_real < Decimal::ZERO {
                    warnings.push(format!(
                        "{}: after-tax real return is negative ({}%)",
                        asset.name,
                        returns.after_tax_real.round_dp(2)
                    ));
                }
                rows.push(LayerRow {
                    name: asset.name.clone(),
                    returns: Some(returns),
                    error: None,
                });
            }
            Err(e) if e.is_row_local() => {
                warn!(asset = %asset.name, error = %e, "asset row skipped");
                warnings.push(format!("{}: {e}", asset.name));
                rows.push(LayerRow {
                    name: asset.name.clone(),
                    returns: None,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let output = ReturnLayersOutput {
        variant: input.variant,
        risk_free_asset: input.risk_free_asset.clone(),
        risk_free_rate: risk_free,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        input.variant.describe(),
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Derive the return layers of a single asset.
///
/// `risk_free` is a percentage, normally the gross return of the designated
/// risk-free asset.
pub fn derive_returns(
    asset: &AssetClass,
    globals: &GlobalParameters,
    risk_free: Percent,
    variant: FormulaVariant,
) -> ReturnLayersResult<DerivedReturn> {
    validate_globals(globals, risk_free, variant)?;
    validate_asset(asset)?;
    derive(asset, globals, risk_free, variant)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_globals(
    globals: &GlobalParameters,
    risk_free: Percent,
    variant: FormulaVariant,
) -> ReturnLayersResult<()> {
    if globals.percent_debt < Decimal::ZERO || globals.percent_debt >= HUNDRED {
        return Err(ReturnLayersError::InvalidInput {
            field: "percent_debt".into(),
            reason: format!(
                "Percent debt must be at least 0 and below 100, got {}",
                globals.percent_debt
            ),
        });
    }
    if variant == FormulaVariant::Compounding {
        if globals.inflation == -HUNDRED {
            return Err(ReturnLayersError::DivisionByZero {
                context: "real return deflator (1 + inflation)".into(),
            });
        }
        if risk_free == -HUNDRED {
            return Err(ReturnLayersError::DivisionByZero {
                context: "risk premium base (1 + risk-free rate)".into(),
            });
        }
    }
    Ok(())
}

fn validate_asset(asset: &AssetClass) -> ReturnLayersResult<()> {
    if asset.name.trim().is_empty() {
        return Err(ReturnLayersError::InvalidInput {
            field: "name".into(),
            reason: "Asset class name cannot be blank".into(),
        });
    }
    if asset.expenses < Decimal::ZERO {
        return Err(ReturnLayersError::InvalidInput {
            field: "expenses".into(),
            reason: format!("Expenses cannot be negative, got {}", asset.expenses),
        });
    }
    Ok(())
}

/// Fractions of the inputs (8.0% -> 0.08).
struct Fractions {
    g: Rate,
    e: Rate,
    d: Rate,
    bc: Rate,
    t: Rate,
    inf: Rate,
    rf: Rate,
}

impl Fractions {
    fn new(asset: &AssetClass, globals: &GlobalParameters, risk_free: Percent) -> Self {
        Self {
            g: asset.gross_return / HUNDRED,
            e: asset.expenses / HUNDRED,
            d: globals.percent_debt / HUNDRED,
            bc: globals.borrowing_cost / HUNDRED,
            t: globals.tax_rate / HUNDRED,
            inf: globals.inflation / HUNDRED,
            rf: risk_free / HUNDRED,
        }
    }
}

fn derive(
    asset: &AssetClass,
    globals: &GlobalParameters,
    risk_free: Percent,
    variant: FormulaVariant,
) -> ReturnLayersResult<DerivedReturn> {
    let f = Fractions::new(asset, globals, risk_free);
    let one = Decimal::ONE;
    let keep = sub(one, f.t)?;
    let net = sub(f.g, f.e)?;
    let unleveraged_net = mul(net, keep)?;

    let layers = match variant {
        FormulaVariant::Compounding => {
            // Debt-to-equity multiplier on the spread over borrowing cost
            let de = div(f.d, sub(one, f.d)?, "debt-to-equity (1 - percent debt)")?;
            let leveraged_gross = add(f.g, mul(de, sub(f.g, f.bc)?)?)?;
            let leveraged_net = add(net, mul(de, sub(net, f.bc)?)?)?;
            let after_tax = mul(leveraged_net, keep)?;
            let after_tax_real = sub(
                div(
                    add(one, after_tax)?,
                    add(one, f.inf)?,
                    "real return deflator (1 + inflation)",
                )?,
                one,
            )?;
            let risk_premium = sub(
                div(
                    add(one, unleveraged_net)?,
                    add(one, f.rf)?,
                    "risk premium base (1 + risk-free rate)",
                )?,
                one,
            )?;
            [
                leveraged_gross,
                leveraged_net,
                after_tax,
                after_tax_real,
                risk_premium,
            ]
        }
        FormulaVariant::Linear => {
            let leveraged_gross = add(f.g, mul(f.d, sub(f.g, f.bc)?)?)?;
            let leveraged_net = sub(leveraged_gross, f.e)?;
            let after_tax = mul(leveraged_net, keep)?;
            let after_tax_real = sub(after_tax, f.inf)?;
            let risk_premium = sub(unleveraged_net, mul(f.rf, keep)?)?;
            [
                leveraged_gross,
                leveraged_net,
                after_tax,
                after_tax_real,
                risk_premium,
            ]
        }
    };
    let [leveraged_gross, leveraged_net, after_tax, after_tax_real, risk_premium] = layers;

    let (tax_impact, inflation_impact) = match variant {
        FormulaVariant::Compounding => (None, None),
        FormulaVariant::Linear => (
            Some(pct(sub(leveraged_net, after_tax)?)?),
            Some(pct(f.inf)?),
        ),
    };

    Ok(DerivedReturn {
        leveraged_gross: pct(leveraged_gross)?,
        leveraged_net: pct(leveraged_net)?,
        after_tax: pct(after_tax)?,
        after_tax_real: pct(after_tax_real)?,
        unleveraged_net: pct(unleveraged_net)?,
        risk_premium: pct(risk_premium)?,
        expenses_impact: pct(f.e)?,
        tax_impact,
        inflation_impact,
    })
}

fn overflow(context: &str) -> ReturnLayersError {
    ReturnLayersError::Overflow {
        context: context.into(),
    }
}

fn add(a: Decimal, b: Decimal) -> ReturnLayersResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow("addition"))
}

fn sub(a: Decimal, b: Decimal) -> ReturnLayersResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow("subtraction"))
}

fn mul(a: Decimal, b: Decimal) -> ReturnLayersResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow("multiplication"))
}

fn div(a: Decimal, b: Decimal, context: &str) -> ReturnLayersResult<Decimal> {
    if b.is_zero() {
        return Err(ReturnLayersError::DivisionByZero {
            context: context.into(),
        });
    }
    a.checked_div(b).ok_or_else(|| overflow(context))
}

/// Fraction back to percentage points.
fn pct(r: Rate) -> ReturnLayersResult<Percent> {
    mul(r, HUNDRED)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{AssetField, GlobalField};
    use pretty_assertions::assert_eq;

    fn equities() -> AssetClass {
        AssetClass::new("Equities", dec!(8.0), dec!(0.5))
    }

    fn globals() -> GlobalParameters {
        GlobalParameters::default()
    }

    fn assert_close(actual: Decimal, expected: Decimal, what: &str) {
        assert!(
            (actual - expected).abs() < dec!(0.0000001),
            "{what}: expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn test_linear_reference_scenario() {
        let r = derive_returns(&equities(), &globals(), dec!(2.5), FormulaVariant::Linear).unwrap();

        // 8 + 0.2 * (8 - 4) = 8.8
        assert_eq!(r.leveraged_gross, dec!(8.8));
        assert_eq!(r.leveraged_net, dec!(8.3));
        // 8.3 * 0.8 = 6.64
        assert_eq!(r.after_tax, dec!(6.64));
        // 6.64 - 2.1 = 4.54
        assert_eq!(r.after_tax_real, dec!(4.54));
        // 7.5 * 0.8 = 6.0
        assert_eq!(r.unleveraged_net, dec!(6.0));
        // 6.0 - 2.5 * 0.8 = 4.0
        assert_eq!(r.risk_premium, dec!(4.0));
        assert_eq!(r.expenses_impact, dec!(0.5));
        assert_eq!(r.tax_impact, Some(dec!(1.66)));
        assert_eq!(r.inflation_impact, Some(dec!(2.1)));
    }

    #[test]
    fn test_compounding_reference_scenario() {
        let r = derive_returns(&equities(), &globals(), dec!(2.5), FormulaVariant::Compounding)
            .unwrap();

        // D/E = 0.2 / 0.8 = 0.25; 8 + 0.25 * 4 = 9
        assert_eq!(r.leveraged_gross, dec!(9));
        // 7.5 + 0.25 * (7.5 - 4) = 8.375
        assert_eq!(r.leveraged_net, dec!(8.375));
        assert_eq!(r.after_tax, dec!(6.7));
        // 1.067 / 1.021 - 1
        assert_close(r.after_tax_real, dec!(4.5053868756), "after-tax real");
        assert_eq!(r.unleveraged_net, dec!(6.0));
        // 1.06 / 1.025 - 1
        assert_close(r.risk_premium, dec!(3.4146341463), "risk premium");
        assert_eq!(r.tax_impact, None);
        assert_eq!(r.inflation_impact, None);
    }

    #[test]
    fn test_compounding_fisher_identity() {
        let r = derive_returns(&equities(), &globals(), dec!(2.5), FormulaVariant::Compounding)
            .unwrap();
        let lhs = Decimal::ONE + r.after_tax_real / HUNDRED;
        let rhs = (Decimal::ONE + r.after_tax / HUNDRED) / (Decimal::ONE + dec!(2.1) / HUNDRED);
        assert_close(lhs, rhs, "Fisher identity");
    }

    #[test]
    fn test_zero_debt_removes_leverage() {
        let mut g = globals();
        g.percent_debt = Decimal::ZERO;
        for variant in [FormulaVariant::Compounding, FormulaVariant::Linear] {
            let r = derive_returns(&equities(), &g, dec!(2.5), variant).unwrap();
            assert_eq!(r.leveraged_gross, dec!(8.0), "{variant}");
            assert_eq!(r.leveraged_net, dec!(7.5), "{variant}");
        }
    }

    #[test]
    fn test_full_debt_rejected() {
        let mut g = globals();
        g.percent_debt = dec!(100);
        let err = derive_returns(&equities(), &g, dec!(2.5), FormulaVariant::Compounding)
            .unwrap_err();
        match err {
            ReturnLayersError::InvalidInput { field, .. } => assert_eq!(field, "percent_debt"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_negative_debt_rejected() {
        let mut g = globals();
        g.percent_debt = dec!(-5);
        assert!(derive_returns(&equities(), &g, dec!(2.5), FormulaVariant::Linear).is_err());
    }

    #[test]
    fn test_deflation_by_minus_hundred_rejected() {
        let mut g = globals();
        g.inflation = dec!(-100);
        assert!(matches!(
            derive_returns(&equities(), &g, dec!(2.5), FormulaVariant::Compounding),
            Err(ReturnLayersError::DivisionByZero { .. })
        ));
        // Linear subtracts inflation, nothing to divide by
        assert!(derive_returns(&equities(), &g, dec!(2.5), FormulaVariant::Linear).is_ok());
    }

    #[test]
    fn test_negative_expenses_rejected() {
        let asset = AssetClass::new("Equities", dec!(8), dec!(-0.1));
        assert!(matches!(
            derive_returns(&asset, &globals(), dec!(2.5), FormulaVariant::Linear),
            Err(ReturnLayersError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported_not_panicking() {
        let asset = AssetClass::new("Huge", Decimal::MAX, dec!(0));
        let err = derive_returns(&asset, &globals(), dec!(2.5), FormulaVariant::Linear)
            .unwrap_err();
        assert!(err.is_row_local(), "got {err:?}");
    }

    #[test]
    fn test_metric_lookup() {
        let r = derive_returns(&equities(), &globals(), dec!(2.5), FormulaVariant::Linear).unwrap();
        assert_eq!(ReturnMetric::AfterTaxReal.value(&r), Some(dec!(4.54)));
        assert_eq!("afterTaxReal".parse::<ReturnMetric>().unwrap(), ReturnMetric::AfterTaxReal);
        assert_eq!("risk-premium".parse::<ReturnMetric>().unwrap(), ReturnMetric::RiskPremium);
        assert!("alpha".parse::<ReturnMetric>().is_err());
    }

    #[test]
    fn test_calculate_sample_all_rows() {
        let out = calculate_return_layers(&ReturnLayersInput::sample()).unwrap();
        assert_eq!(out.result.rows.len(), 3);
        assert_eq!(out.result.risk_free_rate, dec!(2.5));
        assert!(out.result.rows.iter().all(|r| r.returns.is_some()));
        assert!(out.methodology.starts_with("Compounding"));
    }

    #[test]
    fn test_bad_row_is_isolated() {
        let input = ReturnLayersInput::sample()
            .with_asset_field("Corporate Bonds", AssetField::Expenses, dec!(-1))
            .unwrap();
        let out = calculate_return_layers(&input).unwrap();

        let bonds = out.result.row("Corporate Bonds").unwrap();
        assert!(bonds.returns.is_none());
        assert!(bonds.error.as_deref().unwrap().contains("Expenses"));
        assert!(out.result.row("Equities").unwrap().returns.is_some());
        assert!(out.warnings.iter().any(|w| w.starts_with("Corporate Bonds:")));
    }

    #[test]
    fn test_negative_carry_warning() {
        let input = ReturnLayersInput::sample();
        let out = calculate_return_layers(&input).unwrap();
        // T-bills yield 2.5% against a 4% borrowing cost
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("Treasury Bills: borrowing cost")));
    }

    #[test]
    fn test_high_leverage_warning() {
        let input = ReturnLayersInput::sample()
            .with_global(GlobalField::PercentDebt, dec!(60));
        let out = calculate_return_layers(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("High leverage")));
    }

    #[test]
    fn test_tax_rate_out_of_range_warning() {
        let out = calculate_return_layers(&ReturnLayersInput::sample()).unwrap();
        assert!(!out.warnings.iter().any(|w| w.contains("outside 0-100%")));

        let input = ReturnLayersInput::sample().with_global(GlobalField::TaxRate, dec!(120));
        let out = calculate_return_layers(&input).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("Tax rate of 120% is outside 0-100%")));
    }

    #[test]
    fn test_negative_real_return_warning() {
        let out = calculate_return_layers(&ReturnLayersInput::sample()).unwrap();
        assert!(!out
            .warnings
            .iter()
            .any(|w| w.starts_with("Equities: after-tax real return is negative")));

        // 6.7% after tax cannot keep up with 10% inflation
        let input = ReturnLayersInput::sample().with_global(GlobalField::Inflation, dec!(10));
        let out = calculate_return_layers(&input).unwrap();
        let equities = out.result.row("Equities").unwrap().returns.as_ref().unwrap();
        assert!(equities.after_tax_real < Decimal::ZERO);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("Equities: after-tax real return is negative")));
    }
}
