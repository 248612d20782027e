use std::io::Write;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use jemallocator::Jemalloc;
use rand::Rng;
use tempfile::NamedTempFile;

use salesboard::pipeline::filter::{self, FilterSet};
use salesboard::pipeline::load;
use salesboard::pipeline::report::{build_report, ReportConfig};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const ROWS: usize = 200_000;

const REGIONS: [&str; 5] = ["Northeast", "Southeast", "Midwest", "South", "West"];
const PRODUCTS: [&str; 4] = [
    "Men's Apparel",
    "Women's Apparel",
    "Men's Street Footwear",
    "Women's Street Footwear",
];
const RETAILERS: [&str; 4] = ["Foot Locker", "Walmart", "Amazon", "West Gear"];
const STATES: [&str; 6] = ["New York", "California", "Texas", "Florida", "Ohio", "Nevada"];
const METHODS: [&str; 3] = ["Online", "Outlet", "In-Store"];

fn write_sample_csv(rows: usize) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(
        tmp,
        "invoice_date,region,product,retailer,state,sales_method,price_per_unit,units_sold,total_sales,operating_margin,operating_profit"
    )
    .unwrap();

    let mut rng = rand::rng();
    for _ in 0..rows {
        let year = 2020 + rng.random_range(0..2);
        let month = rng.random_range(1..=12);
        let day = rng.random_range(1..=28);
        let price: f64 = rng.random_range(7.0..110.0);
        let units: i64 = rng.random_range(1..1200);
        let total = price * units as f64;
        let margin: f64 = rng.random_range(0.2..0.6);
        writeln!(
            tmp,
            "{year:04}-{month:02}-{day:02},{},{},{},{},{},{price:.2},{units},{total:.2},{margin:.4},{:.2}",
            REGIONS[rng.random_range(0..REGIONS.len())],
            PRODUCTS[rng.random_range(0..PRODUCTS.len())],
            RETAILERS[rng.random_range(0..RETAILERS.len())],
            STATES[rng.random_range(0..STATES.len())],
            METHODS[rng.random_range(0..METHODS.len())],
            total * margin,
        )
        .unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

fn pipeline_benches(c: &mut Criterion) {
    let tmp = write_sample_csv(ROWS);
    let path = tmp.path();

    let mut group = c.benchmark_group("salesboard");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    group.bench_function("load_csv", |b| {
        b.iter(|| load::load_table(path).unwrap())
    });

    let (table, _) = load::load_table(path).unwrap();
    let filters = FilterSet::universe(&table).unwrap();

    group.bench_function("filter_apply", |b| {
        b.iter(|| filter::apply(&table, &filters).unwrap())
    });

    group.bench_function("build_report", |b| {
        b.iter(|| build_report(&table, &filters, &ReportConfig::default()).unwrap())
    });

    group.finish();
}

criterion_group!(benches, pipeline_benches);
criterion_main!(benches);
