use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::pipeline::{PipelineError, Quarter};

pub const INVOICE_DATE: &str = "invoice_date";
pub const REGION: &str = "region";
pub const PRODUCT: &str = "product";
pub const RETAILER: &str = "retailer";
pub const STATE: &str = "state";
pub const SALES_METHOD: &str = "sales_method";
pub const PRICE_PER_UNIT: &str = "price_per_unit";
pub const UNITS_SOLD: &str = "units_sold";
pub const TOTAL_SALES: &str = "total_sales";
pub const OPERATING_PROFIT: &str = "operating_profit";
pub const OPERATING_MARGIN: &str = "operating_margin";

/// Derived at load time from `invoice_date`.
pub const YEAR: &str = "year";
pub const QUARTER: &str = "quarter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Date,
    Int64,
    Float64,
    Str,
}

/// A typed column. Columns own their data; nothing in the pipeline mutates
/// them after the table is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Column {
    Date(Vec<NaiveDate>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Str(Vec<String>),
}

impl Column {
    pub fn with_type(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Date => Column::Date(Vec::new()),
            ColumnType::Int64 => Column::Int64(Vec::new()),
            ColumnType::Float64 => Column::Float64(Vec::new()),
            ColumnType::Str => Column::Str(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Date(_) => ColumnType::Date,
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Date(v) => v.len(),
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the contents of `other` onto the end of this column.
    pub fn append(&mut self, other: Column) -> Result<(), PipelineError> {
        match (self, other) {
            (Column::Date(a), Column::Date(mut b)) => a.append(&mut b),
            (Column::Int64(a), Column::Int64(mut b)) => a.append(&mut b),
            (Column::Float64(a), Column::Float64(mut b)) => a.append(&mut b),
            (Column::Str(a), Column::Str(mut b)) => a.append(&mut b),
            _ => return Err(PipelineError::Schema("column type mismatch on append".into())),
        }
        Ok(())
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Date(v) => Column::Date(rows.iter().map(|&i| v[i]).collect()),
            Column::Int64(v) => Column::Int64(rows.iter().map(|&i| v[i]).collect()),
            Column::Float64(v) => Column::Float64(rows.iter().map(|&i| v[i]).collect()),
            Column::Str(v) => Column::Str(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// In-memory columnar dataset. Built once by the loader, read-only for the
/// rest of the session; every pipeline operation that narrows it produces a
/// new `Table`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table from parallel headers and columns. Every column must
    /// have the same length.
    pub fn new(headers: Vec<String>, columns: Vec<Column>) -> Result<Self, PipelineError> {
        if headers.len() != columns.len() {
            return Err(PipelineError::Schema(format!(
                "{} headers for {} columns",
                headers.len(),
                columns.len()
            )));
        }
        let row_count = columns.first().map_or(0, Column::len);
        if columns.iter().any(|c| c.len() != row_count) {
            return Err(PipelineError::Schema("columns differ in length".into()));
        }
        Ok(Table { headers, columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn get_col(&self, name: &str) -> Result<&Column, PipelineError> {
        let pos = self
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
        Ok(&self.columns[pos])
    }

    pub fn dates(&self, name: &str) -> Result<&[NaiveDate], PipelineError> {
        match self.get_col(name)? {
            Column::Date(v) => Ok(v),
            other => Err(type_mismatch(name, "date", other)),
        }
    }

    pub fn i64s(&self, name: &str) -> Result<&[i64], PipelineError> {
        match self.get_col(name)? {
            Column::Int64(v) => Ok(v),
            other => Err(type_mismatch(name, "int64", other)),
        }
    }

    pub fn f64s(&self, name: &str) -> Result<&[f64], PipelineError> {
        match self.get_col(name)? {
            Column::Float64(v) => Ok(v),
            other => Err(type_mismatch(name, "float64", other)),
        }
    }

    pub fn strs(&self, name: &str) -> Result<&[String], PipelineError> {
        match self.get_col(name)? {
            Column::Str(v) => Ok(v),
            other => Err(type_mismatch(name, "str", other)),
        }
    }

    /// Sorted distinct values of a string column.
    pub fn distinct_strs(&self, name: &str) -> Result<Vec<String>, PipelineError> {
        let mut out = self.strs(name)?.to_vec();
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// New table keeping exactly the given rows, in the given order.
    ///
    /// Panics if an index is out of bounds.
    pub fn take(&self, rows: &[usize]) -> Table {
        let columns = self.columns.iter().map(|c| c.take(rows)).collect();
        Table {
            headers: self.headers.clone(),
            columns,
            row_count: rows.len(),
        }
    }

    /// Appends the derived `year` and `quarter` columns, computed once from
    /// `invoice_date`. A no-op when they are already present.
    pub fn with_calendar(mut self) -> Result<Table, PipelineError> {
        if self.headers.iter().any(|h| h == YEAR) {
            return Ok(self);
        }
        let (years, quarters): (Vec<i64>, Vec<String>) = {
            let dates = self.dates(INVOICE_DATE)?;
            dates
                .iter()
                .map(|d| {
                    (
                        i64::from(d.year()),
                        Quarter::from_month(d.month()).as_str().to_string(),
                    )
                })
                .unzip()
        };
        self.headers.push(YEAR.to_string());
        self.columns.push(Column::Int64(years));
        self.headers.push(QUARTER.to_string());
        self.columns.push(Column::Str(quarters));
        Ok(self)
    }
}

fn type_mismatch(name: &str, want: &str, got: &Column) -> PipelineError {
    PipelineError::Schema(format!(
        "column '{}' is {:?}, expected {}",
        name,
        got.column_type(),
        want
    ))
}
