//! Descriptive statistics, monthly time-series analysis, correlation and
//! price elasticity over a derived table.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::CellValue,
    metrics::{self, DerivedTable, FieldOutcome, REVENUE_COLUMN},
    roles::{ColumnRoleMap, Role},
};

const ROLLING_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub revenue: f64,
    /// Percentage change from the previous month.
    pub growth: Option<f64>,
    pub rolling_avg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesStats {
    pub points: Vec<MonthlyPoint>,
    pub monthly_growth_rate: Option<f64>,
    /// Mean monthly revenue keyed by month of year (1-12).
    pub seasonality_by_month: BTreeMap<u32, f64>,
}

impl TimeSeriesStats {
    pub fn rolling_3mo_avg(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.rolling_avg).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, left: &str, right: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == left)?;
        let j = self.columns.iter().position(|c| c == right)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsBundle {
    /// Column name to summary, in table order with revenue last.
    pub descriptive: Vec<(String, DescriptiveStats)>,
    pub time_series: Option<TimeSeriesStats>,
    pub correlation: CorrelationMatrix,
    pub price_elasticity: Option<f64>,
}

impl StatisticsBundle {
    pub fn descriptive_for(&self, column: &str) -> Option<&DescriptiveStats> {
        self.descriptive
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, stats)| stats)
    }

    pub fn monthly_growth_rate(&self) -> Option<f64> {
        self.time_series.as_ref()?.monthly_growth_rate
    }
}

pub fn analyze(derived: &DerivedTable, roles: &ColumnRoleMap) -> StatisticsBundle {
    let descriptive = descriptive_columns(derived, roles)
        .into_iter()
        .filter_map(|(name, values)| describe(&values).map(|stats| (name, stats)))
        .collect();
    let time_series = roles.get(Role::Date).map(|_| time_series(derived));
    let correlation = correlation(derived);
    let price_elasticity = price_elasticity(derived);
    debug!("Price elasticity: {price_elasticity:?}");
    StatisticsBundle {
        descriptive,
        time_series,
        correlation,
        price_elasticity,
    }
}

/// Collects the numeric columns: the quantity and price roles, any other
/// column whose non-empty cells all read as numbers, then revenue.
fn descriptive_columns(derived: &DerivedTable, roles: &ColumnRoleMap) -> Vec<(String, Vec<f64>)> {
    let quantity_idx = roles.column_index(Role::Quantity);
    let price_idx = roles.column_index(Role::Price);
    let column_count = derived.headers.len().saturating_sub(1);
    let mut columns = Vec::new();
    for idx in 0..column_count {
        let name = derived.headers[idx].clone();
        if Some(idx) == quantity_idx {
            let values = derived.rows.iter().filter_map(|r| r.quantity.value().copied());
            columns.push((name, values.collect()));
        } else if Some(idx) == price_idx {
            let values = derived.rows.iter().filter_map(|r| r.price.value().copied());
            columns.push((name, values.collect()));
        } else if let Some(values) = numeric_column(derived, idx) {
            columns.push((name, values));
        }
    }
    columns.push((
        REVENUE_COLUMN.to_string(),
        derived.revenue_rows().map(|(_, revenue)| revenue).collect(),
    ));
    columns
}

fn numeric_column(derived: &DerivedTable, idx: usize) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for row in &derived.rows {
        let cell = row.cells.get(idx).unwrap_or(&CellValue::Empty);
        if cell.is_empty() {
            continue;
        }
        match metrics::coerce_number(cell) {
            FieldOutcome::Valid(n) => values.push(n),
            _ => return None,
        }
    }
    (!values.is_empty()).then_some(values)
}

pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    if values.is_empty() {
        return None;
    }
    let count = values.len();
    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sorted = values
        .iter()
        .copied()
        .sorted_by(|a, b| a.total_cmp(b))
        .collect::<Vec<_>>();
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let central_moment = |power: i32| values.iter().map(|v| (v - mean).powi(power)).sum::<f64>() / n;
    let m2 = central_moment(2);
    let std_dev = (count >= 2).then(|| {
        let sum_squares = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (sum_squares / (n - 1.0)).max(0.0).sqrt()
    });
    let shape_defined = count >= 2 && m2 > 0.0;
    let skewness = shape_defined.then(|| central_moment(3) / m2.powf(1.5));
    let kurtosis = shape_defined.then(|| central_moment(4) / (m2 * m2) - 3.0);
    Some(DescriptiveStats {
        count,
        mean,
        median,
        std_dev,
        min: sorted[0],
        max: sorted[count - 1],
        skewness,
        kurtosis,
    })
}

pub fn time_series(derived: &DerivedTable) -> TimeSeriesStats {
    let series = metrics::monthly_series(derived);
    let revenues = series.iter().map(|(_, revenue)| *revenue).collect::<Vec<_>>();
    let growth = growth_rates(&revenues);
    let rolling = rolling_mean(&revenues, ROLLING_WINDOW);
    let points = series
        .iter()
        .zip(growth.iter().zip(rolling.iter()))
        .map(|((month, revenue), (growth, rolling_avg))| MonthlyPoint {
            month: month.label(),
            revenue: *revenue,
            growth: *growth,
            rolling_avg: *rolling_avg,
        })
        .collect();

    let seasonality_by_month = series
        .iter()
        .map(|(month, revenue)| (month.month, *revenue))
        .into_group_map()
        .into_iter()
        .map(|(month, values)| (month, values.iter().sum::<f64>() / values.len() as f64))
        .collect();

    TimeSeriesStats {
        points,
        monthly_growth_rate: mean_defined(&growth),
        seasonality_by_month,
    }
}

/// Percentage change between consecutive values. The first value, and any
/// value following a zero, have no defined growth.
pub fn growth_rates(values: &[f64]) -> Vec<Option<f64>> {
    let mut rates = Vec::with_capacity(values.len());
    if !values.is_empty() {
        rates.push(None);
    }
    rates.extend(
        values
            .iter()
            .tuple_windows()
            .map(|(prev, next)| (*prev != 0.0).then(|| (next - prev) / prev * 100.0)),
    );
    rates
}

pub fn mean_growth_rate(values: &[f64]) -> Option<f64> {
    mean_defined(&growth_rates(values))
}

fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let defined = values.iter().flatten().collect::<Vec<_>>();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().copied().sum::<f64>() / defined.len() as f64)
}

/// Trailing moving average; the first `window - 1` entries are undefined.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|idx| {
            (window > 0 && idx + 1 >= window).then(|| {
                values[idx + 1 - window..=idx].iter().sum::<f64>() / window as f64
            })
        })
        .collect()
}

pub fn correlation(derived: &DerivedTable) -> CorrelationMatrix {
    let complete = derived
        .rows
        .iter()
        .filter_map(|row| {
            let quantity = *row.quantity.value()?;
            let price = *row.price.value()?;
            Some([quantity, price, quantity * price])
        })
        .collect::<Vec<_>>();
    let columns = vec![
        "quantity".to_string(),
        "price".to_string(),
        "revenue".to_string(),
    ];
    let values = (0..3)
        .map(|i| {
            (0..3)
                .map(|j| {
                    if complete.len() < 2 {
                        return None;
                    }
                    let xs = complete.iter().map(|r| r[i]).collect::<Vec<_>>();
                    let ys = complete.iter().map(|r| r[j]).collect::<Vec<_>>();
                    pearson(&xs, &ys)
                })
                .collect()
        })
        .collect();
    CorrelationMatrix { columns, values }
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Slope of ln(quantity) regressed on ln(price) over strictly positive rows.
pub fn price_elasticity(derived: &DerivedTable) -> Option<f64> {
    let points = derived
        .rows
        .iter()
        .filter_map(|row| {
            let quantity = *row.quantity.value()?;
            let price = *row.price.value()?;
            (quantity > 0.0 && price > 0.0).then(|| (price.ln(), quantity.ln()))
        })
        .collect::<Vec<_>>();
    ols_slope(&points)
}

fn ols_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        (sxy + (x - mean_x) * (y - mean_y), sxx + (x - mean_x).powi(2))
    });
    (sxx > 0.0).then(|| sxy / sxx)
}

/// Formats a statistic for tables: integers without a fraction, otherwise
/// four decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

pub fn descriptive_headers() -> Vec<String> {
    [
        "column", "count", "min", "max", "mean", "median", "std_dev", "skewness", "kurtosis",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

pub fn render_descriptive_rows(bundle: &StatisticsBundle) -> Vec<Vec<String>> {
    let optional = |value: Option<f64>| value.map(format_number).unwrap_or_default();
    bundle
        .descriptive
        .iter()
        .map(|(name, stats)| {
            vec![
                name.clone(),
                stats.count.to_string(),
                format_number(stats.min),
                format_number(stats.max),
                format_number(stats.mean),
                format_number(stats.median),
                optional(stats.std_dev),
                optional(stats.skewness),
                optional(stats.kurtosis),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn describe_single_value_has_no_shape() {
        let stats = describe(&[4.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 4.0);
        assert!(stats.std_dev.is_none());
        assert!(stats.skewness.is_none());
        assert!(stats.kurtosis.is_none());
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn describe_computes_moments() {
        let stats = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.median, 4.5));
        assert!(approx(stats.std_dev.unwrap(), (32.0_f64 / 7.0).sqrt()));
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        // population variance 4, third central moment 5.25
        assert!(approx(stats.skewness.unwrap(), 5.25 / 8.0));
        assert!(stats.kurtosis.unwrap() < 0.0);
    }

    #[test]
    fn symmetric_values_have_zero_skew() {
        let stats = describe(&[1.0, 2.0, 3.0]).unwrap();
        assert!(approx(stats.skewness.unwrap(), 0.0));
        assert!(approx(stats.kurtosis.unwrap(), -1.5));
    }

    #[test]
    fn growth_rates_skip_first_and_zero_bases() {
        let rates = growth_rates(&[100.0, 150.0, 90.0]);
        assert_eq!(rates[0], None);
        assert!(approx(rates[1].unwrap(), 50.0));
        assert!(approx(rates[2].unwrap(), -40.0));
        assert!(approx(mean_growth_rate(&[100.0, 150.0, 90.0]).unwrap(), 5.0));

        let with_gap = growth_rates(&[10.0, 0.0, 20.0]);
        assert_eq!(with_gap, vec![None, Some(-100.0), None]);
        assert_eq!(mean_growth_rate(&[5.0]), None);
    }

    #[test]
    fn rolling_mean_leaves_leading_periods_undefined() {
        let rolling = rolling_mean(&[3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(rolling, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn pearson_requires_variance() {
        assert!(approx(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0));
        assert!(approx(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0));
        assert_eq!(pearson(&[1.0, 1.0], &[2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }

    #[test]
    fn ols_slope_recovers_power_law_exponent() {
        let points = [1.0_f64, 2.0, 4.0, 8.0]
            .iter()
            .map(|price| (price.ln(), (100.0 * price.powf(-1.5)).ln()))
            .collect::<Vec<_>>();
        assert!((ols_slope(&points).unwrap() + 1.5).abs() < 1e-9);
        assert_eq!(ols_slope(&points[..1]), None);
        assert_eq!(ols_slope(&[(1.0, 2.0), (1.0, 3.0)]), None);
    }

    fn derived(headers: &[&str], rows: Vec<Vec<CellValue>>) -> DerivedTable {
        let dataset = crate::data::Dataset::new(headers.iter().map(|h| h.to_string()).collect(), rows);
        let roles = crate::roles::classify(dataset.headers());
        metrics::compute(&dataset, &roles).unwrap().derived
    }

    #[test]
    fn seasonality_averages_each_calendar_month_across_years() {
        let rows = [(2023, 10.0), (2024, 30.0)]
            .iter()
            .flat_map(|(year, scale)| {
                (1..=12).map(move |month| {
                    vec![
                        CellValue::Text(format!("{year}-{month:02}-15")),
                        CellValue::Number(1.0),
                        CellValue::Number(month as f64 * scale),
                    ]
                })
            })
            .collect();
        let series = time_series(&derived(&["Date", "Qty", "Price"], rows));
        assert_eq!(series.points.len(), 24);
        assert_eq!(series.seasonality_by_month.len(), 12);
        assert!(approx(series.seasonality_by_month[&1], 20.0));
        assert!(approx(series.seasonality_by_month[&6], 120.0));
        assert!(approx(series.seasonality_by_month[&12], 240.0));
    }

    #[test]
    fn correlation_needs_two_complete_rows() {
        let table = derived(
            &["Qty", "Price"],
            vec![
                vec![CellValue::Number(2.0), CellValue::Number(5.0)],
                vec![CellValue::Number(3.0), CellValue::Text("n/a".into())],
            ],
        );
        let matrix = correlation(&table);
        assert_eq!(matrix.columns, vec!["quantity", "price", "revenue"]);
        assert!(matrix.values.iter().flatten().all(Option::is_none));
        assert_eq!(matrix.values.len(), 3);
    }

    #[test]
    fn format_number_trims_integral_values() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1.23456), "1.2346");
    }
}
