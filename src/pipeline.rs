//! End-to-end analysis: load, check layout, classify, derive, summarize.

use std::path::Path;

use log::info;
use serde::Serialize;

use crate::{
    data::Dataset,
    error::InsightError,
    ingest::{self, IngestOptions},
    insights::{InsightEngine, InsightRecord},
    layout::LayoutContract,
    metrics::{self, AggregateTables, DerivedTable},
    roles::{self, ColumnRoleMap},
    stats::{self, StatisticsBundle},
};

/// Everything one run produces, handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub roles: ColumnRoleMap,
    pub derived: DerivedTable,
    pub aggregates: AggregateTables,
    pub statistics: StatisticsBundle,
    pub insights: Vec<InsightRecord>,
}

pub fn analyze_dataset(dataset: &Dataset) -> Result<AnalysisReport, InsightError> {
    analyze_with_engine(dataset, &InsightEngine::standard())
}

pub fn analyze_with_engine(
    dataset: &Dataset,
    engine: &InsightEngine,
) -> Result<AnalysisReport, InsightError> {
    let roles = roles::classify(dataset.headers());
    info!(
        "Column roles: quantity={:?} price={:?} date={:?} product={:?} order={:?}",
        roles.quantity.as_ref().map(|m| m.name.as_str()),
        roles.price.as_ref().map(|m| m.name.as_str()),
        roles.date.as_ref().map(|m| m.name.as_str()),
        roles.product.as_ref().map(|m| m.name.as_str()),
        roles.order.as_ref().map(|m| m.name.as_str()),
    );
    let metrics::MetricsOutput {
        derived,
        aggregates,
    } = metrics::compute(dataset, &roles)?;
    let statistics = stats::analyze(&derived, &roles);
    let insights = engine.generate(&aggregates, &statistics);
    info!("Generated {} insight(s)", insights.len());
    Ok(AnalysisReport {
        roles,
        derived,
        aggregates,
        statistics,
        insights,
    })
}

/// Loads `path`, applies the optional layout contract and analyzes the table.
pub fn analyze_file(
    path: &Path,
    options: &IngestOptions,
    layout: Option<&LayoutContract>,
) -> Result<AnalysisReport, InsightError> {
    let dataset = ingest::load_dataset(path, options)?;
    if let Some(contract) = layout {
        contract.validate(dataset.headers())?;
    }
    analyze_dataset(&dataset)
}
