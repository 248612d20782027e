//! # Salesboard
//!
//! `salesboard` is the computation core of a retail sales dashboard: it loads
//! a transactions CSV into an in-memory columnar table, applies the user's
//! filter selection, and produces the KPIs and aggregation reports the
//! presentation layer renders. It supports:
//!
//! - Memory-mapped CSV loading with chunk-parallel parsing (Rayon)
//! - A fixed, typed retail schema (dates, categories, numerics) with derived
//!   year/quarter columns
//! - Set/range filtering: region, product, year, quarter, date bounds
//! - KPIs: total sales, units sold, operating profit, weighted margin
//! - Group-by reports: monthly trend, rankings, top-N, revenue share,
//!   per-group margins, pareto concentration, per-group correlation
//! - AVX2 SIMD acceleration for column sums (runtime-detected, scalar
//!   fallback)
//!
//! # Example
//!
//! ```no_run
//! use salesboard::pipeline::filter::FilterSet;
//! use salesboard::pipeline::load;
//! use salesboard::pipeline::report::{build_report, ReportConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (table, summary) = load::load_table("data/sales.csv".as_ref())?;
//!     println!("{} rows loaded, {} skipped", summary.rows_loaded, summary.errors.len());
//!
//!     let filters = FilterSet::universe(&table)?;
//!     let report = build_report(&table, &filters, &ReportConfig::default())?;
//!     println!("Total sales: {:.2}", report.kpis.total_sales);
//!     for row in &report.sales_by_product.rows {
//!         println!("{} => {:.2}", row.key, row.value);
//!     }
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod pipeline;
