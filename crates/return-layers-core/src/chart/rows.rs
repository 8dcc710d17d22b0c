use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::layers::{FormulaVariant, ReturnLayersOutput};
use crate::types::Percent;

use super::series::ChartSeries;

/// Decimal places on bar value labels.
pub const BAR_LABEL_DP: u32 = 1;
/// Decimal places in tooltips and the tabular view.
pub const TOOLTIP_DP: u32 = 2;

/// One bar of one asset group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub series: ChartSeries,
    pub label: String,
    pub color: String,
    pub value: Percent,
    /// e.g. "8.8%"
    pub bar_label: String,
    /// e.g. "8.80%"
    pub tooltip: String,
}

/// All bars for one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub variant: FormulaVariant,
    /// Series in legend order
    pub series: Vec<ChartSeries>,
    pub rows: Vec<ChartRow>,
    /// Assets left off the chart because their row failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<String>,
}

/// Format a percentage the way the chart labels it: rounded half away from
/// zero to `dp` places, zero padded, with a trailing `%`.
pub fn format_percent(value: Percent, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    // -0.0 would otherwise print with a sign
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{:.*}%", dp as usize, rounded)
}

/// Turn calculator output into chart rows, one per computed asset.
pub fn build_chart(output: &ReturnLayersOutput) -> ChartData {
    let series = ChartSeries::for_variant(output.variant);
    let mut rows = Vec::with_capacity(output.rows.len());
    let mut omitted = Vec::new();

    for row in &output.rows {
        let Some(returns) = &row.returns else {
            omitted.push(row.name.clone());
            continue;
        };
        let points = series
            .iter()
            .filter_map(|s| {
                s.metric().value(returns).map(|value| ChartPoint {
                    series: *s,
                    label: s.label().to_string(),
                    color: s.color().to_string(),
                    value,
                    bar_label: format_percent(value, BAR_LABEL_DP),
                    tooltip: format_percent(value, TOOLTIP_DP),
                })
            })
            .collect();
        rows.push(ChartRow {
            name: row.name.clone(),
            points,
        });
    }

    ChartData {
        variant: output.variant,
        series,
        rows,
        omitted,
    }
}

impl ChartData {
    /// Tabular view: a header row, then one row per asset with two-decimal
    /// cells.
    pub fn table(&self) -> Vec<Vec<String>> {
        let mut table = Vec::with_capacity(self.rows.len() + 1);
        let mut header = vec!["Asset".to_string()];
        header.extend(self.series.iter().map(|s| s.label().to_string()));
        table.push(header);

        for row in &self.rows {
            let mut cells = vec![row.name.clone()];
            cells.extend(self.series.iter().map(|s| {
                row.points
                    .iter()
                    .find(|p| p.series == *s)
                    .map(|p| p.tooltip.clone())
                    .unwrap_or_default()
            }));
            table.push(cells);
        }
        table
    }

    pub fn row(&self, name: &str) -> Option<&ChartRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

impl ChartRow {
    pub fn value(&self, series: ChartSeries) -> Option<Percent> {
        self.points.iter().find(|p| p.series == series).map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{calculate_return_layers, AssetField, ReturnLayersInput};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(8.8), 1), "8.8%");
        assert_eq!(format_percent(dec!(8.8), 2), "8.80%");
        assert_eq!(format_percent(dec!(4.505386875), 2), "4.51%");
        assert_eq!(format_percent(dec!(0.25), 1), "0.3%");
        assert_eq!(format_percent(dec!(-0.25), 1), "-0.3%");
        assert_eq!(format_percent(dec!(-0.04), 1), "0.0%");
        assert_eq!(format_percent(dec!(6), 2), "6.00%");
    }

    #[test]
    fn test_sample_chart_shape() {
        let out = calculate_return_layers(&ReturnLayersInput::sample()).unwrap();
        let chart = build_chart(&out.result);

        assert_eq!(chart.rows.len(), 3);
        assert_eq!(chart.series.len(), 7);
        let equities = chart.row("Equities").unwrap();
        assert_eq!(equities.points.len(), 7);
        assert_eq!(equities.points[0].label, "Pre-Tax Nominal Gross Leveraged Return");
        assert_eq!(equities.points[0].bar_label, "9.0%");
        assert_eq!(equities.points[0].tooltip, "9.00%");
        assert_eq!(equities.value(ChartSeries::Expenses), Some(dec!(0.5)));
    }

    #[test]
    fn test_linear_chart_has_impacts() {
        let input = ReturnLayersInput::sample().with_variant(FormulaVariant::Linear);
        let out = calculate_return_layers(&input).unwrap();
        let chart = build_chart(&out.result);

        let equities = chart.row("Equities").unwrap();
        assert_eq!(equities.points.len(), 9);
        assert_eq!(equities.value(ChartSeries::Taxes), Some(dec!(1.66)));
        assert_eq!(equities.value(ChartSeries::Inflation), Some(dec!(2.1)));
    }

    #[test]
    fn test_failed_rows_are_omitted() {
        let input = ReturnLayersInput::sample()
            .with_asset_field("Equities", AssetField::Expenses, dec!(-2))
            .unwrap();
        let out = calculate_return_layers(&input).unwrap();
        let chart = build_chart(&out.result);

        assert_eq!(chart.rows.len(), 2);
        assert_eq!(chart.omitted, vec!["Equities".to_string()]);
    }

    #[test]
    fn test_table_view() {
        let input = ReturnLayersInput::sample().with_variant(FormulaVariant::Linear);
        let out = calculate_return_layers(&input).unwrap();
        let table = build_chart(&out.result).table();

        assert_eq!(table.len(), 4);
        assert_eq!(table[0][0], "Asset");
        assert_eq!(table[0].len(), 10);
        assert_eq!(table[1][0], "Equities");
        assert_eq!(table[1][1], "8.80%");
        assert_eq!(table[1][4], "4.54%");
    }
}
