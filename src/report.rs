//! Terminal and JSON rendering of an [`AnalysisReport`].
//!
//! Rendering switches travel in [`RenderOptions`]; nothing here is stored
//! between runs.

use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::{
    data::format_plain_number,
    format,
    metrics::{AggregateTable, DerivedTable},
    pipeline::AnalysisReport,
    stats::{self, StatisticsBundle},
    table::{Align, render_table},
};

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub show_statistics: bool,
    /// Number of derived rows to list; zero hides the listing.
    pub show_rows: usize,
}

pub fn render_text(report: &AnalysisReport, options: &RenderOptions) -> String {
    let mut out = String::new();

    section(&mut out, "Detected column roles");
    out.push_str(&render_table(
        &headers(&["role", "column"]),
        &report.roles.render_rows(),
        &[],
    ));

    if let Some(products) = &report.aggregates.products {
        section(
            &mut out,
            &format!("Top {} Products by Revenue", products.display_rows().len()),
        );
        out.push_str(&render_aggregate(products));
    }
    if let Some(monthly) = &report.aggregates.monthly {
        section(&mut out, "Monthly Revenue Trend");
        out.push_str(&render_aggregate(monthly));
    }

    if options.show_statistics {
        out.push_str(&render_statistics(&report.statistics));
    }

    if options.show_rows > 0 {
        section(&mut out, "Derived rows");
        out.push_str(&render_derived(&report.derived, options.show_rows));
    }

    if !report.derived.issues.is_empty() {
        let _ = writeln!(
            out,
            "\n{} cell(s) could not be read as numbers or dates and were left out of the totals.",
            report.derived.issues.len()
        );
    }

    section(&mut out, "Insights");
    if report.insights.is_empty() {
        out.push_str("No insights could be generated from this dataset.\n");
    }
    for (idx, insight) in report.insights.iter().enumerate() {
        let _ = writeln!(out, "{}. {}\n", idx + 1, insight);
    }
    out
}

pub fn render_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Serializing report to JSON")
}

pub fn render_aggregate(table: &AggregateTable) -> String {
    let rows = table
        .display_rows()
        .iter()
        .map(|row| vec![row.key.clone(), format::currency(row.value)])
        .collect::<Vec<_>>();
    render_table(
        &[table.key_label.clone(), table.value_label.clone()],
        &rows,
        &[Align::Left, Align::Right],
    )
}

pub fn render_statistics(bundle: &StatisticsBundle) -> String {
    let mut out = String::new();
    section(&mut out, "Descriptive statistics");
    let stat_headers = stats::descriptive_headers();
    let mut align = vec![Align::Right; stat_headers.len()];
    align[0] = Align::Left;
    out.push_str(&render_table(
        &stat_headers,
        &stats::render_descriptive_rows(bundle),
        &align,
    ));

    if let Some(series) = &bundle.time_series {
        section(&mut out, "Monthly growth");
        let rows = series
            .points
            .iter()
            .map(|point| {
                vec![
                    point.month.clone(),
                    format::currency(point.revenue),
                    point.growth.map(format::percent).unwrap_or_default(),
                    point.rolling_avg.map(format::currency).unwrap_or_default(),
                ]
            })
            .collect::<Vec<_>>();
        out.push_str(&render_table(
            &headers(&["month", "revenue", "growth", "rolling_3mo_avg"]),
            &rows,
            &[Align::Left, Align::Right, Align::Right, Align::Right],
        ));
        if let Some(rate) = series.monthly_growth_rate {
            let _ = writeln!(out, "Average monthly growth: {}", format::percent(rate));
        }
        let seasonal = series
            .seasonality_by_month
            .iter()
            .map(|(month, mean)| vec![format!("{month:02}"), format::currency(*mean)])
            .collect::<Vec<_>>();
        section(&mut out, "Seasonality (mean revenue by month of year)");
        out.push_str(&render_table(
            &headers(&["month", "mean_revenue"]),
            &seasonal,
            &[Align::Left, Align::Right],
        ));
    }

    section(&mut out, "Correlation");
    let mut corr_headers = vec![String::new()];
    corr_headers.extend(bundle.correlation.columns.iter().cloned());
    let corr_rows = bundle
        .correlation
        .columns
        .iter()
        .zip(&bundle.correlation.values)
        .map(|(name, values)| {
            let mut row = vec![name.clone()];
            row.extend(
                values
                    .iter()
                    .map(|v| v.map(|r| format!("{r:.3}")).unwrap_or_else(|| "-".into())),
            );
            row
        })
        .collect::<Vec<_>>();
    out.push_str(&render_table(&corr_headers, &corr_rows, &[]));

    match bundle.price_elasticity {
        Some(elasticity) => {
            let _ = writeln!(out, "\nPrice elasticity: {elasticity:.3}");
        }
        None => out.push_str("\nPrice elasticity: not enough positive quantity/price rows\n"),
    }
    out
}

pub fn render_derived(table: &DerivedTable, limit: usize) -> String {
    let rows = table
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            let mut cells = row.cells.iter().map(|c| c.as_display()).collect::<Vec<_>>();
            cells.push(row.revenue().map(format_plain_number).unwrap_or_default());
            cells
        })
        .collect::<Vec<_>>();
    render_table(&table.headers, &rows, &[])
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{}", "=".repeat(title.chars().count()));
}

fn headers(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
