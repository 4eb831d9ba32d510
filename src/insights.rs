//! Rule-based insight synthesis.
//!
//! Every rule implements [`InsightRule`] and is evaluated against the same
//! [`RuleInput`]. Rules never fail: a rule lacking the data it needs reports
//! [`RuleOutcome::Skipped`] with the reason, which is logged and otherwise
//! ignored. [`InsightEngine::standard`] registers the built-in rules in
//! their fixed order, product-level rules before time-trend rules.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    format,
    metrics::{AggregateRow, AggregateTable, AggregateTables},
    stats::StatisticsBundle,
};

pub const TOP_PRODUCT_COUNT: usize = 5;
pub const PREMIUM_REVENUE_THRESHOLD: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    RevenueConcentration,
    TopProduct,
    PerformanceSpread,
    PremiumTier,
    SeasonalSpread,
    PositiveGrowth,
    NegativeGrowth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub category: InsightCategory,
    pub headline: String,
    pub recommendations: Vec<String>,
}

impl InsightRecord {
    fn new(category: InsightCategory, headline: String, recommendations: &[&str]) -> Self {
        Self {
            category,
            headline,
            recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl fmt::Display for InsightRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline)?;
        for recommendation in &self.recommendations {
            write!(f, "\n- {recommendation}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoProductTable,
    NoMonthlyTable,
    NoRevenue,
    TooFewPeriods,
    UndefinedAverage,
    BelowThreshold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Emitted(InsightRecord),
    Skipped(SkipReason),
}

impl RuleOutcome {
    pub fn into_record(self) -> Option<InsightRecord> {
        match self {
            RuleOutcome::Emitted(record) => Some(record),
            RuleOutcome::Skipped(_) => None,
        }
    }
}

pub struct RuleInput<'a> {
    pub aggregates: &'a AggregateTables,
    pub statistics: &'a StatisticsBundle,
}

impl<'a> RuleInput<'a> {
    fn products(&self) -> Result<ProductView<'a>, SkipReason> {
        let table = self
            .aggregates
            .products
            .as_ref()
            .ok_or(SkipReason::NoProductTable)?;
        ProductView::new(table)
    }

    fn monthly(&self) -> Result<&'a AggregateTable, SkipReason> {
        match self.aggregates.monthly.as_ref() {
            Some(table) if !table.is_empty() => Ok(table),
            _ => Err(SkipReason::NoMonthlyTable),
        }
    }
}

/// The full product ranking with a positive revenue total.
struct ProductView<'a> {
    rows: &'a [AggregateRow],
    total: f64,
}

impl<'a> ProductView<'a> {
    fn new(table: &'a AggregateTable) -> Result<Self, SkipReason> {
        if table.is_empty() {
            return Err(SkipReason::NoProductTable);
        }
        let total = table.total();
        if total <= 0.0 {
            return Err(SkipReason::NoRevenue);
        }
        Ok(Self {
            rows: &table.rows,
            total,
        })
    }

    fn top(&self) -> &'a [AggregateRow] {
        &self.rows[..TOP_PRODUCT_COUNT.min(self.rows.len())]
    }

    fn bottom(&self) -> &'a [AggregateRow] {
        &self.rows[self.rows.len().saturating_sub(TOP_PRODUCT_COUNT)..]
    }

    /// Percentage of the product total, clamped to 0-100. Negative product
    /// revenue (returns) can otherwise push a share past either bound.
    fn share(&self, revenue: f64) -> f64 {
        (revenue / self.total * 100.0).clamp(0.0, 100.0)
    }
}

fn mean_revenue(rows: &[AggregateRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(|r| r.value).sum::<f64>() / rows.len() as f64)
}

pub trait InsightRule {
    fn name(&self) -> &'static str;
    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome;
}

macro_rules! try_rule {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(reason) => return RuleOutcome::Skipped(reason),
        }
    };
}

pub struct RevenueConcentration;

impl InsightRule for RevenueConcentration {
    fn name(&self) -> &'static str {
        "revenue-concentration"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let products = try_rule!(input.products());
        let top_revenue = products.top().iter().map(|r| r.value).sum::<f64>();
        let share = products.share(top_revenue);
        RuleOutcome::Emitted(InsightRecord::new(
            InsightCategory::RevenueConcentration,
            format!(
                "{} of total revenue comes from just the top {TOP_PRODUCT_COUNT} products. \
                 Consider expanding marketing efforts for these winners through:",
                format::percent(share)
            ),
            &[
                "Targeted advertising campaigns",
                "Bundled product deals",
                "Limited-time promotions",
                "Customer loyalty incentives",
            ],
        ))
    }
}

pub struct TopProductSpotlight;

impl InsightRule for TopProductSpotlight {
    fn name(&self) -> &'static str {
        "top-product"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let products = try_rule!(input.products());
        let leader = &products.rows[0];
        RuleOutcome::Emitted(InsightRecord::new(
            InsightCategory::TopProduct,
            format!(
                "Our #1 product ({}) generates {} of total revenue. Recommendations:",
                leader.key,
                format::percent(products.share(leader.value))
            ),
            &[
                "Analyze what makes this product successful",
                "Explore line extensions or complementary products",
                "Protect this revenue stream with inventory planning",
            ],
        ))
    }
}

pub struct PerformanceSpread;

impl InsightRule for PerformanceSpread {
    fn name(&self) -> &'static str {
        "performance-spread"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let products = try_rule!(input.products());
        let (Some(top_avg), Some(bottom_avg)) =
            (mean_revenue(products.top()), mean_revenue(products.bottom()))
        else {
            return RuleOutcome::Skipped(SkipReason::UndefinedAverage);
        };
        if top_avg <= 0.0 || bottom_avg <= 0.0 {
            return RuleOutcome::Skipped(SkipReason::UndefinedAverage);
        }
        RuleOutcome::Emitted(InsightRecord::new(
            InsightCategory::PerformanceSpread,
            format!(
                "Top products sell {} more than the bottom performers. \
                 For underperforming products, consider:",
                format::ratio(top_avg / bottom_avg)
            ),
            &[
                "Price point adjustments",
                "Better shelf placement or website positioning",
                "Product refresh or packaging updates",
                "Potential discontinuation if consistently underperforming",
            ],
        ))
    }
}

pub struct PremiumTier;

impl InsightRule for PremiumTier {
    fn name(&self) -> &'static str {
        "premium-tier"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let products = match input.aggregates.products.as_ref() {
            Some(table) if !table.is_empty() => table,
            _ => return RuleOutcome::Skipped(SkipReason::NoProductTable),
        };
        let premium = products
            .rows
            .iter()
            .filter(|r| r.value > PREMIUM_REVENUE_THRESHOLD)
            .count();
        if premium == 0 {
            return RuleOutcome::Skipped(SkipReason::BelowThreshold);
        }
        RuleOutcome::Emitted(InsightRecord::new(
            InsightCategory::PremiumTier,
            format!(
                "We have {premium} premium products (earning >{} each). Suggestions:",
                format::currency(PREMIUM_REVENUE_THRESHOLD)
            ),
            &[
                "Create 'premium' product category on website",
                "Highlight in marketing materials",
                "Train sales team on premium product benefits",
            ],
        ))
    }
}

pub struct SeasonalSpread;

impl InsightRule for SeasonalSpread {
    fn name(&self) -> &'static str {
        "seasonal-spread"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let monthly = try_rule!(input.monthly());
        let mut best = &monthly.rows[0];
        let mut worst = &monthly.rows[0];
        for row in &monthly.rows[1..] {
            if row.value > best.value {
                best = row;
            }
            if row.value < worst.value {
                worst = row;
            }
        }
        RuleOutcome::Emitted(InsightRecord::new(
            InsightCategory::SeasonalSpread,
            format!(
                "Revenue varies significantly by month, peaking in {} and dropping in {}. \
                 Difference: {}. Action items:",
                best.key,
                worst.key,
                format::currency(best.value - worst.value)
            ),
            &[
                "Plan inventory and staffing for peak periods",
                "Develop off-season promotions to smooth demand",
                "Analyze causes of seasonal fluctuations",
            ],
        ))
    }
}

pub struct GrowthTrend;

impl InsightRule for GrowthTrend {
    fn name(&self) -> &'static str {
        "growth-trend"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let monthly = try_rule!(input.monthly());
        if monthly.len() < 2 {
            return RuleOutcome::Skipped(SkipReason::TooFewPeriods);
        }
        let Some(average) = input.statistics.monthly_growth_rate() else {
            return RuleOutcome::Skipped(SkipReason::UndefinedAverage);
        };
        let record = if average > 0.0 {
            InsightRecord::new(
                InsightCategory::PositiveGrowth,
                format!(
                    "Healthy average monthly growth of {}. To maintain momentum:",
                    format::percent(average)
                ),
                &[
                    "Reinvest in top-performing channels",
                    "Expand successful product lines",
                    "Continue current marketing strategies",
                ],
            )
        } else {
            InsightRecord::new(
                InsightCategory::NegativeGrowth,
                format!(
                    "Negative average monthly growth of {}. Corrective actions needed:",
                    format::percent(average)
                ),
                &[
                    "Review pricing strategy",
                    "Assess competitive landscape",
                    "Conduct customer feedback surveys",
                ],
            )
        };
        RuleOutcome::Emitted(record)
    }
}

pub struct InsightEngine {
    rules: Vec<Box<dyn InsightRule>>,
}

impl InsightEngine {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn standard() -> Self {
        let mut engine = Self::empty();
        engine.register(Box::new(RevenueConcentration));
        engine.register(Box::new(TopProductSpotlight));
        engine.register(Box::new(PerformanceSpread));
        engine.register(Box::new(PremiumTier));
        engine.register(Box::new(SeasonalSpread));
        engine.register(Box::new(GrowthTrend));
        engine
    }

    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn evaluate_all(&self, input: &RuleInput<'_>) -> Vec<(&'static str, RuleOutcome)> {
        self.rules
            .iter()
            .map(|rule| (rule.name(), rule.evaluate(input)))
            .collect()
    }

    pub fn generate(
        &self,
        aggregates: &AggregateTables,
        statistics: &StatisticsBundle,
    ) -> Vec<InsightRecord> {
        let input = RuleInput {
            aggregates,
            statistics,
        };
        self.evaluate_all(&input)
            .into_iter()
            .filter_map(|(name, outcome)| {
                if let RuleOutcome::Skipped(reason) = &outcome {
                    debug!("Insight rule '{name}' skipped: {reason:?}");
                }
                outcome.into_record()
            })
            .collect()
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn generate(aggregates: &AggregateTables, statistics: &StatisticsBundle) -> Vec<InsightRecord> {
    InsightEngine::standard().generate(aggregates, statistics)
}
