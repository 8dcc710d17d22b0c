use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ReturnLayersError;
use crate::layers::{calculate_return_layers, GlobalField, ReturnLayersInput, ReturnMetric};
use crate::types::*;
use crate::ReturnLayersResult;

/// Upper bound on sweep points, guards against a tiny step on a wide range.
const MAX_SWEEP_POINTS: usize = 10_000;

/// Output of a one-way sweep over a global parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    pub parameter: GlobalField,
    pub metric: ReturnMetric,
    /// Asset names, column order of `matrix`
    pub assets: Vec<String>,
    /// Swept parameter values, row order of `matrix`
    pub values: Vec<Decimal>,
    /// matrix[i][j] = metric of assets[j] when the parameter equals values[i];
    /// `None` where that point or row could not be computed
    pub matrix: Vec<Vec<Option<Percent>>>,
    /// Row closest to the parameter's current value
    pub base_case_position: usize,
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> ReturnLayersResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(ReturnLayersError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(ReturnLayersError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(ReturnLayersError::InvalidInput {
                field: format!("variable:{}", var.name),
                reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points; use a larger step"),
            });
        }
        values.push(current);
        // Past Decimal::MAX there is nothing left to sweep
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| {
            v.checked_sub(target)
                .map(|d| d.abs())
                .unwrap_or(Decimal::MAX)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Sweep one global parameter and report `metric` for every asset at each
/// step.
///
/// `variable.name` names the parameter (`percent_debt`, `inflation`, ...).
/// Points where the whole calculation fails, e.g. percent debt reaching 100,
/// are kept as rows of `None` and reported in the warnings.
pub fn sweep_global(
    input: &ReturnLayersInput,
    variable: &SensitivityVariable,
    metric: ReturnMetric,
) -> ReturnLayersResult<ComputationOutput<SweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let parameter: GlobalField = variable.name.parse()?;
    let values = generate_sweep_values(variable)?;
    let assets: Vec<String> = input.assets.iter().map(|a| a.name.clone()).collect();

    let mut matrix = Vec::with_capacity(values.len());
    for value in &values {
        let point = input.with_global(parameter, *value);
        match calculate_return_layers(&point) {
            Ok(out) => {
                let row = out
                    .result
                    .rows
                    .iter()
                    .map(|r| r.returns.as_ref().and_then(|ret| metric.value(ret)))
                    .collect();
                matrix.push(row);
            }
            Err(e) => {
                debug!(%parameter, %value, error = %e, "sweep point failed");
                warnings.push(format!("Evaluation failed at {parameter} = {value}: {e}"));
                matrix.push(vec![None; assets.len()]);
            }
        }
    }

    if matrix.iter().flatten().all(Option::is_none) {
        warnings.push(format!(
            "Metric {metric} is unavailable at every point for the {} variant",
            input.variant
        ));
    }

    let base_case_position = closest_index(&values, parameter.get(&input.globals));

    let output = SweepOutput {
        parameter,
        metric,
        assets,
        values,
        matrix,
        base_case_position,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Way Sensitivity Sweep",
        &serde_json::json!({
            "parameter": parameter.to_string(),
            "metric": metric.as_str(),
            "variant": input.variant.to_string(),
            "min": variable.min.to_string(),
            "max": variable.max.to_string(),
            "step": variable.step.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::FormulaVariant;
    use rust_decimal_macros::dec;

    fn debt_sweep(min: Decimal, max: Decimal, step: Decimal) -> SensitivityVariable {
        SensitivityVariable {
            name: "percentDebt".into(),
            min,
            max,
            step,
        }
    }

    #[test]
    fn test_sweep_values() {
        let vals = generate_sweep_values(&debt_sweep(dec!(1), dec!(5), dec!(1))).unwrap();
        assert_eq!(vals, vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
    }

    #[test]
    fn test_sweep_with_non_exact_step() {
        let vals = generate_sweep_values(&debt_sweep(dec!(0), dec!(1), dec!(0.3))).unwrap();
        // 0, 0.3, 0.6, 0.9, 1.0 (max appended)
        assert_eq!(vals.len(), 5);
        assert_eq!(*vals.last().unwrap(), dec!(1));
    }

    #[test]
    fn test_invalid_step() {
        assert!(generate_sweep_values(&debt_sweep(dec!(0), dec!(1), dec!(0))).is_err());
        assert!(generate_sweep_values(&debt_sweep(dec!(2), dec!(1), dec!(1))).is_err());
    }

    #[test]
    fn test_too_many_points() {
        assert!(generate_sweep_values(&debt_sweep(dec!(0), dec!(100), dec!(0.001))).is_err());
    }

    #[test]
    fn test_sweep_values_at_decimal_max() {
        let var = SensitivityVariable {
            name: "inflation".into(),
            min: Decimal::MAX - dec!(1),
            max: Decimal::MAX,
            step: dec!(1),
        };
        let vals = generate_sweep_values(&var).unwrap();
        assert_eq!(vals, vec![Decimal::MAX - dec!(1), Decimal::MAX]);

        let single = SensitivityVariable {
            min: Decimal::MAX,
            ..var
        };
        assert_eq!(generate_sweep_values(&single).unwrap(), vec![Decimal::MAX]);
    }

    #[test]
    fn test_closest_index_far_apart() {
        let vals = vec![dec!(-5), Decimal::MAX];
        assert_eq!(closest_index(&vals, Decimal::MIN), 0);
        assert_eq!(closest_index(&vals, dec!(-4)), 0);
    }

    #[test]
    fn test_sweep_near_decimal_max_does_not_panic() {
        let input = ReturnLayersInput::sample();
        let var = SensitivityVariable {
            name: "inflation".into(),
            min: Decimal::MAX - dec!(1),
            max: Decimal::MAX,
            step: dec!(1),
        };
        let out = sweep_global(&input, &var, ReturnMetric::AfterTax).unwrap();
        assert_eq!(out.result.values.len(), 2);
        assert_eq!(out.result.matrix.len(), 2);
    }

    #[test]
    fn test_debt_sweep_raises_equity_leverage() {
        let input = ReturnLayersInput::sample();
        let out = sweep_global(
            &input,
            &debt_sweep(dec!(0), dec!(60), dec!(20)),
            ReturnMetric::LeveragedGross,
        )
        .unwrap();
        let res = &out.result;

        assert_eq!(res.values, vec![dec!(0), dec!(20), dec!(40), dec!(60)]);
        assert_eq!(res.assets[0], "Equities");
        // Equities earn more than the 4% borrowing cost: leverage helps
        let equities: Vec<Decimal> = res.matrix.iter().map(|r| r[0].unwrap()).collect();
        assert!(equities.windows(2).all(|w| w[0] < w[1]), "{equities:?}");
        // Unlevered at 0% debt
        assert_eq!(equities[0], dec!(8.0));
        // Current percent debt is 20
        assert_eq!(res.base_case_position, 1);
    }

    #[test]
    fn test_full_debt_point_reported() {
        let input = ReturnLayersInput::sample();
        let out = sweep_global(
            &input,
            &debt_sweep(dec!(80), dec!(100), dec!(10)),
            ReturnMetric::AfterTax,
        )
        .unwrap();

        assert_eq!(out.result.matrix.len(), 3);
        assert!(out.result.matrix[2].iter().all(Option::is_none));
        assert!(out.warnings.iter().any(|w| w.contains("percent_debt = 100")));
    }

    #[test]
    fn test_impact_metric_unavailable_for_compounding() {
        let input = ReturnLayersInput::sample();
        let out = sweep_global(
            &input,
            &debt_sweep(dec!(0), dec!(20), dec!(10)),
            ReturnMetric::TaxImpact,
        )
        .unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("unavailable")));

        let linear = input.with_variant(FormulaVariant::Linear);
        let out = sweep_global(
            &linear,
            &debt_sweep(dec!(0), dec!(20), dec!(10)),
            ReturnMetric::TaxImpact,
        )
        .unwrap();
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_unknown_parameter() {
        let input = ReturnLayersInput::sample();
        let var = SensitivityVariable {
            name: "volatility".into(),
            min: dec!(0),
            max: dec!(1),
            step: dec!(1),
        };
        assert!(sweep_global(&input, &var, ReturnMetric::AfterTax).is_err());
    }
}
