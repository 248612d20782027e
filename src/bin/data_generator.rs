use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};

const REGIONS: [&str; 5] = ["Northeast", "Southeast", "Midwest", "South", "West"];
const PRODUCTS: [&str; 6] = [
    "Men's Street Footwear",
    "Men's Athletic Footwear",
    "Women's Street Footwear",
    "Women's Athletic Footwear",
    "Men's Apparel",
    "Women's Apparel",
];
const RETAILERS: [&str; 6] = [
    "Foot Locker",
    "Sports Direct",
    "Walmart",
    "Amazon",
    "West Gear",
    "Kohl's",
];
const STATES: [&str; 10] = [
    "New York",
    "California",
    "Texas",
    "Florida",
    "Washington",
    "Ohio",
    "Illinois",
    "Nevada",
    "Oregon",
    "Georgia",
];
const METHODS: [&str; 3] = ["Online", "Outlet", "In-Store"];

fn main() {
    let path = "data/sales_1m.csv";
    std::fs::create_dir_all("data").unwrap();
    let file = File::create(path).unwrap();
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "invoice_date,region,product,retailer,state,sales_method,price_per_unit,units_sold,total_sales,operating_margin,operating_profit"
    )
    .unwrap();

    let mut rng = rand::rng();
    for _ in 0..1_000_000 {
        let year = 2020 + rng.random_range(0..2);
        let month = rng.random_range(1..=12);
        let day = rng.random_range(1..=28);
        let region = REGIONS[rng.random_range(0..REGIONS.len())];
        let product = PRODUCTS[rng.random_range(0..PRODUCTS.len())];
        let retailer = RETAILERS[rng.random_range(0..RETAILERS.len())];
        let state = STATES[rng.random_range(0..STATES.len())];
        let method = METHODS[rng.random_range(0..METHODS.len())];
        let price: f64 = rng.random_range(7.0..110.0);
        let units: i64 = rng.random_range(1..1200);
        let total = price * units as f64;
        let margin: f64 = rng.random_range(0.2..0.6);
        let profit = total * margin;

        writeln!(
            writer,
            "{year:04}-{month:02}-{day:02},{region},{product},{retailer},{state},{method},{price:.2},{units},{total:.2},{margin:.4},{profit:.2}"
        )
        .unwrap();
    }

    println!("Sample CSV generated: {}", path);
}
