use serde::{Deserialize, Serialize};

use crate::layers::{FormulaVariant, ReturnMetric};

/// A bar series in the return layer chart, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSeries {
    PreTaxNominalGrossLeveraged,
    PreTaxNominalNetLeveraged,
    AfterTaxNominalNetLeveraged,
    AfterTaxRealNetLeveraged,
    AfterTaxRealNetUnleveraged,
    AfterTaxNetRiskPremium,
    Expenses,
    Taxes,
    Inflation,
}

const COMMON: [ChartSeries; 7] = [
    ChartSeries::PreTaxNominalGrossLeveraged,
    ChartSeries::PreTaxNominalNetLeveraged,
    ChartSeries::AfterTaxNominalNetLeveraged,
    ChartSeries::AfterTaxRealNetLeveraged,
    ChartSeries::AfterTaxRealNetUnleveraged,
    ChartSeries::AfterTaxNetRiskPremium,
    ChartSeries::Expenses,
];

impl ChartSeries {
    /// Series drawn for a formula variant. The linear variant also breaks
    /// out taxes and inflation.
    pub fn for_variant(variant: FormulaVariant) -> Vec<ChartSeries> {
        let mut series = COMMON.to_vec();
        if variant == FormulaVariant::Linear {
            series.push(ChartSeries::Taxes);
            series.push(ChartSeries::Inflation);
        }
        series
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartSeries::PreTaxNominalGrossLeveraged => "Pre-Tax Nominal Gross Leveraged Return",
            ChartSeries::PreTaxNominalNetLeveraged => "Pre-Tax Nominal Net Leveraged Return",
            ChartSeries::AfterTaxNominalNetLeveraged => "After-Tax Nominal Net Leveraged Return",
            ChartSeries::AfterTaxRealNetLeveraged => "After-Tax Real Net Leveraged Return",
            ChartSeries::AfterTaxRealNetUnleveraged => "After-Tax Real Net Unleveraged Return",
            ChartSeries::AfterTaxNetRiskPremium => "After-Tax Net Risk Premium (Unleveraged)",
            ChartSeries::Expenses => "Expenses",
            ChartSeries::Taxes => "Taxes",
            ChartSeries::Inflation => "Inflation",
        }
    }

    /// Fill colour, light to dark blue across the cascade.
    pub fn color(&self) -> &'static str {
        match self {
            ChartSeries::PreTaxNominalGrossLeveraged => "#C7D2FE",
            ChartSeries::PreTaxNominalNetLeveraged => "#A5B4FC",
            ChartSeries::AfterTaxNominalNetLeveraged => "#93C5FD",
            ChartSeries::AfterTaxRealNetLeveraged => "#60A5FA",
            ChartSeries::AfterTaxRealNetUnleveraged => "#3B82F6",
            ChartSeries::AfterTaxNetRiskPremium => "#2563EB",
            ChartSeries::Expenses => "#1D4ED8",
            ChartSeries::Taxes => "#1E40AF",
            ChartSeries::Inflation => "#1E3A8A",
        }
    }

    pub fn metric(&self) -> ReturnMetric {
        match self {
            ChartSeries::PreTaxNominalGrossLeveraged => ReturnMetric::LeveragedGross,
            ChartSeries::PreTaxNominalNetLeveraged => ReturnMetric::LeveragedNet,
            ChartSeries::AfterTaxNominalNetLeveraged => ReturnMetric::AfterTax,
            ChartSeries::AfterTaxRealNetLeveraged => ReturnMetric::AfterTaxReal,
            ChartSeries::AfterTaxRealNetUnleveraged => ReturnMetric::UnleveragedNet,
            ChartSeries::AfterTaxNetRiskPremium => ReturnMetric::RiskPremium,
            ChartSeries::Expenses => ReturnMetric::ExpensesImpact,
            ChartSeries::Taxes => ReturnMetric::TaxImpact,
            ChartSeries::Inflation => ReturnMetric::InflationImpact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compounding_has_seven_series() {
        let series = ChartSeries::for_variant(FormulaVariant::Compounding);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0], ChartSeries::PreTaxNominalGrossLeveraged);
        assert_eq!(series[6], ChartSeries::Expenses);
    }

    #[test]
    fn test_linear_adds_tax_and_inflation() {
        let series = ChartSeries::for_variant(FormulaVariant::Linear);
        assert_eq!(series.len(), 9);
        assert_eq!(&series[7..], &[ChartSeries::Taxes, ChartSeries::Inflation]);
    }

    #[test]
    fn test_colors_are_distinct() {
        let series = ChartSeries::for_variant(FormulaVariant::Linear);
        for (i, a) in series.iter().enumerate() {
            for b in &series[i + 1..] {
                assert_ne!(a.color(), b.color(), "{a:?} and {b:?} share a colour");
            }
        }
    }
}
