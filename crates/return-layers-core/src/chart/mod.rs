pub mod rows;
pub mod series;

pub use rows::{build_chart, format_percent, ChartData, ChartPoint, ChartRow};
pub use series::ChartSeries;
