use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregate;
pub mod filter;
pub mod load;
pub mod metrics;
pub mod report;
pub mod table;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("load error: {0}")]
    Load(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("invalid date range: {min} is after {max}")]
    InvalidDateRange { min: NaiveDate, max: NaiveDate },
}

/// Outcome of a load: how many rows made it into the table, and which input
/// rows were skipped.
#[derive(Debug)]
pub struct ParseSummary {
    pub rows_loaded: usize,
    pub errors: Vec<ParseError>,
}

/// One skipped input row. `offset` is the byte offset of the line in the
/// source file.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub offset: usize,
    pub column: String,
    pub value: String,
    pub message: String,
}

/// Calendar quarter, derived from the invoice date at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quarter {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Q1" => Ok(Quarter::Q1),
            "Q2" => Ok(Quarter::Q2),
            "Q3" => Ok(Quarter::Q3),
            "Q4" => Ok(Quarter::Q4),
            other => Err(PipelineError::Schema(format!("unknown quarter: {other}"))),
        }
    }
}

/// Sales channel. Stored canonically in the table's `sales_method` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesMethod {
    Online,
    Outlet,
    InStore,
}

impl SalesMethod {
    pub const ALL: [SalesMethod; 3] = [SalesMethod::Online, SalesMethod::Outlet, SalesMethod::InStore];

    pub fn as_str(self) -> &'static str {
        match self {
            SalesMethod::Online => "Online",
            SalesMethod::Outlet => "Outlet",
            SalesMethod::InStore => "In-Store",
        }
    }
}

impl fmt::Display for SalesMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(SalesMethod::Online),
            "Outlet" => Ok(SalesMethod::Outlet),
            "In-Store" => Ok(SalesMethod::InStore),
            other => Err(PipelineError::Schema(format!("unknown sales method: {other}"))),
        }
    }
}

/// Categorical grouping dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Product,
    Region,
    Retailer,
    State,
    SalesMethod,
}

impl Dimension {
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Product => table::PRODUCT,
            Dimension::Region => table::REGION,
            Dimension::Retailer => table::RETAILER,
            Dimension::State => table::STATE,
            Dimension::SalesMethod => table::SALES_METHOD,
        }
    }
}

/// Numeric columns a report can roll up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    TotalSales,
    UnitsSold,
    OperatingProfit,
    PricePerUnit,
}

impl Measure {
    pub fn column(self) -> &'static str {
        match self {
            Measure::TotalSales => table::TOTAL_SALES,
            Measure::UnitsSold => table::UNITS_SOLD,
            Measure::OperatingProfit => table::OPERATING_PROFIT,
            Measure::PricePerUnit => table::PRICE_PER_UNIT,
        }
    }
}

/// How a measure is rolled up per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rollup {
    Sum,
    Mean,
}

/// Row ordering of a group-by report. `ByKey` is the deterministic rendering
/// of the dashboard's "unordered" breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupOrder {
    ByKey,
    ValueDesc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_from_month_covers_the_year() {
        assert_eq!(Quarter::from_month(1), Quarter::Q1);
        assert_eq!(Quarter::from_month(3), Quarter::Q1);
        assert_eq!(Quarter::from_month(4), Quarter::Q2);
        assert_eq!(Quarter::from_month(9), Quarter::Q3);
        assert_eq!(Quarter::from_month(12), Quarter::Q4);
    }

    #[test]
    fn sales_method_round_trips_canonical_labels() {
        for method in SalesMethod::ALL {
            assert_eq!(method.as_str().parse::<SalesMethod>().unwrap(), method);
        }
        assert!("Drive-Through".parse::<SalesMethod>().is_err());
    }

    #[test]
    fn quarter_rejects_unknown_labels() {
        assert!("Q5".parse::<Quarter>().is_err());
        assert_eq!("Q2".parse::<Quarter>().unwrap(), Quarter::Q2);
    }
}
