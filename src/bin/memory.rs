use std::path::Path;

use salesboard::pipeline::filter::FilterSet;
use salesboard::pipeline::load;
use salesboard::pipeline::report::{build_report, ReportConfig};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    let path = Path::new("data/sales_1m.csv");
    let (table, _summary) = load::load_table(path).unwrap();

    let filters = FilterSet::universe(&table).unwrap();
    let _report = build_report(&table, &filters, &ReportConfig::default()).unwrap();

    println!("Memory benchmark finished. See dhat-heap.json for details");
}
