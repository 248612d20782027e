use std::path::Path;

use jemallocator::Jemalloc;
use salesboard::pipeline::filter::FilterSet;
use salesboard::pipeline::load;
use salesboard::pipeline::report::{build_report, ReportConfig};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/sales.csv".to_string());
    let (table, summary) = load::load_table(Path::new(&path))?;
    println!("loaded {} rows ({} skipped)", summary.rows_loaded, summary.errors.len());

    let filters = FilterSet::universe(&table)?;
    let report = build_report(&table, &filters, &ReportConfig::default())?;

    println!("total sales:      {:>14.2}", report.kpis.total_sales);
    println!("units sold:       {:>14}", report.kpis.units_sold);
    println!("operating profit: {:>14.2}", report.kpis.operating_profit);
    println!("weighted margin:  {:>13.2}%", report.kpis.weighted_margin * 100.0);
    println!("avg margin:       {:>13.2}%", report.avg_margin * 100.0);

    println!("\ntop states by sales:");
    for row in &report.top_states_by_sales.rows {
        println!("  {:<20} {:>14.2}", row.key, row.value);
    }

    if let Some(pareto) = &report.state_pareto {
        println!(
            "\n{} states cover {:.0}% of sales",
            pareto.count_to_threshold,
            pareto.threshold * 100.0
        );
    }
    if let Some(leaders) = &report.region_leaders {
        println!(
            "best region: {} ({:.2}), worst region: {} ({:.2})",
            leaders.best.key, leaders.best.value, leaders.worst.key, leaders.worst.value
        );
    }

    Ok(())
}
