use log::debug;
use serde::{Deserialize, Serialize};

use crate::pipeline::aggregate::{
    self, GroupReport, GroupRow, MarginReport, ParetoReport, ScatterReport, ShareReport,
    TrendPoint,
};
use crate::pipeline::filter::{self, FilterSet};
use crate::pipeline::metrics::{self, Kpi};
use crate::pipeline::table::Table;
use crate::pipeline::{Dimension, GroupOrder, Measure, PipelineError, Rollup};

/// Knobs the presentation layer can turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows kept by the top-N reports.
    pub top_n: usize,
    /// Cumulative fraction the pareto prefix count is measured against.
    pub pareto_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            pareto_threshold: 0.8,
        }
    }
}

/// Best and worst group of a value-sorted report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    pub best: GroupRow,
    pub worst: GroupRow,
}

/// Everything the presentation layer renders for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSet {
    pub kpis: Kpi,
    /// Unweighted mean of the per-row operating margin (the KPI card).
    pub avg_margin: f64,
    /// The filtered rows themselves, for the detail view and download.
    pub filtered: Table,
    pub monthly_trend: Vec<TrendPoint>,
    pub sales_by_product: GroupReport,
    pub sales_by_region: GroupReport,
    pub region_share: ShareReport,
    pub profit_by_retailer: GroupReport,
    pub top_states_by_sales: GroupReport,
    pub top_products_by_units: GroupReport,
    pub sales_by_method: GroupReport,
    pub margin_by_method: MarginReport,
    pub state_pareto: Option<ParetoReport>,
    pub units_vs_profit: ScatterReport,
    pub price_vs_units: ScatterReport,
    pub region_leaders: Option<Extremes>,
}

/// Runs the whole pipeline for one selection: filter, KPIs, every
/// aggregation report. Delegation and packaging only — each number is
/// computed by exactly one engine function.
pub fn build_report(
    table: &Table,
    filters: &FilterSet,
    config: &ReportConfig,
) -> Result<ReportSet, PipelineError> {
    let filtered = filter::apply(table, filters)?;

    let kpis = metrics::compute_kpis(&filtered)?;
    let avg_margin = metrics::average_margin(&filtered)?;

    let monthly_trend = aggregate::monthly_trend(&filtered)?;
    let sales_by_product = aggregate::group_rollup(
        &filtered,
        Dimension::Product,
        Measure::TotalSales,
        Rollup::Sum,
        GroupOrder::ValueDesc,
    )?;
    let sales_by_region = aggregate::group_rollup(
        &filtered,
        Dimension::Region,
        Measure::TotalSales,
        Rollup::Sum,
        GroupOrder::ByKey,
    )?;
    let region_share = aggregate::revenue_share(&sales_by_region);
    let profit_by_retailer = aggregate::group_rollup(
        &filtered,
        Dimension::Retailer,
        Measure::OperatingProfit,
        Rollup::Sum,
        GroupOrder::ValueDesc,
    )?;
    let sales_by_state = aggregate::group_rollup(
        &filtered,
        Dimension::State,
        Measure::TotalSales,
        Rollup::Sum,
        GroupOrder::ValueDesc,
    )?;
    let top_states_by_sales = sales_by_state.top_n(config.top_n);
    let units_by_product = aggregate::group_rollup(
        &filtered,
        Dimension::Product,
        Measure::UnitsSold,
        Rollup::Sum,
        GroupOrder::ValueDesc,
    )?;
    let top_products_by_units = units_by_product.top_n(config.top_n);
    let sales_by_method = aggregate::group_rollup(
        &filtered,
        Dimension::SalesMethod,
        Measure::TotalSales,
        Rollup::Sum,
        GroupOrder::ByKey,
    )?;
    let margin_by_method = aggregate::margin_by(&filtered, Dimension::SalesMethod)?;
    let state_pareto = aggregate::pareto(&sales_by_state, config.pareto_threshold);
    let units_vs_profit = aggregate::scatter(
        &filtered,
        Dimension::Product,
        (Measure::UnitsSold, Rollup::Sum),
        (Measure::OperatingProfit, Rollup::Sum),
    )?;
    let price_vs_units = aggregate::scatter(
        &filtered,
        Dimension::Product,
        (Measure::PricePerUnit, Rollup::Mean),
        (Measure::UnitsSold, Rollup::Sum),
    )?;

    let region_ranked = aggregate::group_rollup(
        &filtered,
        Dimension::Region,
        Measure::TotalSales,
        Rollup::Sum,
        GroupOrder::ValueDesc,
    )?;
    let region_leaders = match (region_ranked.best(), region_ranked.worst()) {
        (Some(best), Some(worst)) => Some(Extremes {
            best: best.clone(),
            worst: worst.clone(),
        }),
        _ => None,
    };

    debug!("report set built over {} filtered rows", filtered.row_count());

    Ok(ReportSet {
        kpis,
        avg_margin,
        monthly_trend,
        sales_by_product,
        sales_by_region,
        region_share,
        profit_by_retailer,
        top_states_by_sales,
        top_products_by_units,
        sales_by_method,
        margin_by_method,
        state_pareto,
        units_vs_profit,
        price_vs_units,
        region_leaders,
        filtered,
    })
}
