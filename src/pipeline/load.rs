use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use log::{debug, info, warn};
use memchr::{memchr, memchr_iter};
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::pipeline::table::{self, Column, ColumnType, Table};
use crate::pipeline::{ParseError, ParseSummary, PipelineError, SalesMethod};

/// Expected input columns and their types. Header order in the file is free;
/// every column must be present.
const SCHEMA: [(&str, ColumnType); 11] = [
    (table::INVOICE_DATE, ColumnType::Date),
    (table::REGION, ColumnType::Str),
    (table::PRODUCT, ColumnType::Str),
    (table::RETAILER, ColumnType::Str),
    (table::STATE, ColumnType::Str),
    (table::SALES_METHOD, ColumnType::Str),
    (table::PRICE_PER_UNIT, ColumnType::Float64),
    (table::UNITS_SOLD, ColumnType::Int64),
    (table::TOTAL_SALES, ColumnType::Float64),
    (table::OPERATING_PROFIT, ColumnType::Float64),
    (table::OPERATING_MARGIN, ColumnType::Float64),
];

/// Loads a sales transactions CSV into a [`Table`], memory-mapping the file
/// and parsing newline-aligned chunks in parallel.
///
/// A row that fails to parse in any field is skipped whole and recorded in
/// the returned [`ParseSummary`]; the surviving rows keep their file order.
/// The table gets the derived `year`/`quarter` columns appended before it is
/// returned, and owns all of its data — the mapping is dropped here.
///
/// # Errors
/// Returns a [`PipelineError`] if the file cannot be opened or mapped, the
/// header line is missing or contains unexpected columns, or a required
/// column is absent.
pub fn load_table(path: &Path) -> Result<(Table, ParseSummary), PipelineError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let buf: &[u8] = &mmap[..];

    let header_end = buf
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| PipelineError::Load("missing header line".into()))?;
    let headers: Vec<String> = buf[..header_end]
        .split(|&b| b == b',')
        .map(|s| String::from_utf8_lossy(s).trim().to_string())
        .collect();

    let schema = resolve_schema(&headers)?;

    let data_start = header_end + 1;
    let data = &buf[data_start..];

    let num_threads = rayon::current_num_threads();
    let chunks = find_chunk_boundaries(data, num_threads);
    debug!("parsing {} bytes in {} chunks", data.len(), chunks.len());

    let batches: Vec<ChunkBatch> = chunks
        .par_iter()
        .map(|&(start, end)| parse_chunk(&data[start..end], &schema, &headers, data_start + start))
        .collect();

    let mut columns: Vec<Column> = schema.iter().map(|&ty| Column::with_type(ty)).collect();
    let mut rows_loaded = 0;
    let mut errors = Vec::new();
    for batch in batches {
        rows_loaded += batch.row_count;
        errors.extend(batch.errors);
        for (col, part) in columns.iter_mut().zip(batch.columns) {
            col.append(part)?;
        }
    }

    if !errors.is_empty() {
        warn!("skipped {} malformed rows in {}", errors.len(), path.display());
    }
    info!("loaded {} rows from {}", rows_loaded, path.display());

    let table = Table::new(headers, columns)?.with_calendar()?;
    Ok((table, ParseSummary { rows_loaded, errors }))
}

fn resolve_schema(headers: &[String]) -> Result<Vec<ColumnType>, PipelineError> {
    for (name, _) in SCHEMA {
        if !headers.iter().any(|h| h == name) {
            return Err(PipelineError::MissingColumn(name.to_string()));
        }
    }
    headers
        .iter()
        .map(|h| {
            SCHEMA
                .iter()
                .find(|(name, _)| h == name)
                .map(|&(_, ty)| ty)
                .ok_or_else(|| PipelineError::Load(format!("unexpected column: {h}")))
        })
        .collect()
}

fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let chunk_size = data.len() / num_chunks;
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks.saturating_sub(1) {
        let mut end = (i + 1) * chunk_size;

        // advance to the next newline so rows never straddle chunks
        while end < data.len() && data[end] != b'\n' {
            end += 1;
        }
        if end < data.len() {
            end += 1;
        }

        if start < end {
            boundaries.push((start, end));
        }
        start = end;
    }

    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}

struct ChunkBatch {
    columns: Vec<Column>,
    row_count: usize,
    errors: Vec<ParseError>,
}

/// One parsed cell, staged so a row only lands in the batch once every field
/// of it parsed.
enum Cell {
    Date(NaiveDate),
    Int64(i64),
    Float64(f64),
    Str(String),
}

fn parse_chunk(
    chunk: &[u8],
    schema: &[ColumnType],
    headers: &[String],
    chunk_offset: usize,
) -> ChunkBatch {
    let num_cols = schema.len();
    let mut columns: Vec<Column> = schema.iter().map(|&ty| Column::with_type(ty)).collect();
    let mut errors = Vec::new();
    let mut row_count = 0;

    let mut fields: Vec<&[u8]> = Vec::with_capacity(num_cols);
    let mut staged: Vec<Cell> = Vec::with_capacity(num_cols);

    let mut start = 0;
    while start < chunk.len() {
        let line_end = memchr(b'\n', &chunk[start..]).map_or(chunk.len(), |p| start + p);
        let line = &chunk[start..line_end];
        let line_offset = chunk_offset + start;
        start = line_end + 1;

        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        fields.clear();
        let mut field_start = 0;
        for comma_pos in memchr_iter(b',', line) {
            fields.push(&line[field_start..comma_pos]);
            field_start = comma_pos + 1;
        }
        fields.push(&line[field_start..]);

        if fields.len() != num_cols {
            errors.push(ParseError {
                offset: line_offset,
                column: String::new(),
                value: String::new(),
                message: format!("expected {} fields, got {}", num_cols, fields.len()),
            });
            continue;
        }

        staged.clear();
        let mut bad_row = false;
        for (col_idx, raw) in fields.iter().enumerate() {
            match parse_cell(raw, schema[col_idx], &headers[col_idx]) {
                Ok(cell) => staged.push(cell),
                Err(message) => {
                    errors.push(ParseError {
                        offset: line_offset,
                        column: headers[col_idx].clone(),
                        value: String::from_utf8_lossy(raw).to_string(),
                        message,
                    });
                    bad_row = true;
                    break;
                }
            }
        }
        if bad_row {
            continue;
        }

        for (col, cell) in columns.iter_mut().zip(staged.drain(..)) {
            match (col, cell) {
                (Column::Date(v), Cell::Date(d)) => v.push(d),
                (Column::Int64(v), Cell::Int64(x)) => v.push(x),
                (Column::Float64(v), Cell::Float64(x)) => v.push(x),
                (Column::Str(v), Cell::Str(s)) => v.push(s),
                _ => unreachable!("cells are staged against the declared schema"),
            }
        }
        row_count += 1;
    }

    ChunkBatch { columns, row_count, errors }
}

fn parse_cell(raw: &[u8], ty: ColumnType, column: &str) -> Result<Cell, String> {
    match ty {
        ColumnType::Date => parse_date(raw).map(Cell::Date),
        ColumnType::Int64 => atoi_simd::parse::<i64>(raw)
            .map(Cell::Int64)
            .map_err(|e| e.to_string()),
        ColumnType::Float64 => fast_float::parse::<f64, _>(raw)
            .map(Cell::Float64)
            .map_err(|e| e.to_string()),
        ColumnType::Str => {
            let s = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
            if column == table::SALES_METHOD {
                SalesMethod::from_str(s)
                    .map(|m| Cell::Str(m.as_str().to_string()))
                    .map_err(|e| e.to_string())
            } else {
                Ok(Cell::Str(s.to_string()))
            }
        }
    }
}

fn parse_date(raw: &[u8]) -> Result<NaiveDate, String> {
    let s = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "invoice_date,region,product,retailer,state,sales_method,price_per_unit,units_sold,total_sales,operating_margin,operating_profit";

    fn load_str(csv: &str) -> Result<(Table, ParseSummary), PipelineError> {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", csv).unwrap();
        load_table(tmp.path())
    }

    #[test]
    fn loads_rows_and_derives_calendar() {
        let csv = format!(
            "{HEADER}\n\
             2021-01-05,West,Apparel,West Gear,California,Online,50.00,10,500.00,0.40,200.00\n\
             2021-07-20,East,Footwear,Kohl's,New York,In-Store,40.00,5,200.00,0.50,100.00\n"
        );
        let (table, summary) = load_str(&csv).unwrap();
        assert_eq!(summary.rows_loaded, 2);
        assert!(summary.errors.is_empty());
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.i64s(table::YEAR).unwrap(), &[2021, 2021]);
        assert_eq!(table.strs(table::QUARTER).unwrap(), &["Q1", "Q3"]);
        assert_eq!(table.f64s(table::TOTAL_SALES).unwrap(), &[500.0, 200.0]);
    }

    #[test]
    fn header_order_is_free() {
        let csv = "region,invoice_date,product,retailer,state,sales_method,price_per_unit,units_sold,total_sales,operating_margin,operating_profit\n\
                   West,2021-01-05,Apparel,West Gear,California,Online,50.00,10,500.00,0.40,200.00\n";
        let (table, _) = load_str(csv).unwrap();
        assert_eq!(table.strs(table::REGION).unwrap(), &["West"]);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "invoice_date,product\n2021-01-05,Apparel\n";
        assert!(matches!(
            load_str(csv),
            Err(PipelineError::MissingColumn(_))
        ));
    }

    #[test]
    fn bad_rows_are_skipped_whole() {
        let csv = format!(
            "{HEADER}\n\
             2021-01-05,West,Apparel,West Gear,California,Online,50.00,10,500.00,0.40,200.00\n\
             not-a-date,West,Apparel,West Gear,California,Online,50.00,10,500.00,0.40,200.00\n\
             2021-02-05,West,Apparel,West Gear,California,Carrier-Pigeon,50.00,10,500.00,0.40,200.00\n\
             2021-03-05,West,Apparel\n\
             2021-04-05,East,Footwear,Kohl's,New York,Outlet,40.00,5,200.00,0.50,100.00\n"
        );
        let (table, summary) = load_str(&csv).unwrap();
        assert_eq!(summary.rows_loaded, 2);
        assert_eq!(summary.errors.len(), 3);
        // every surviving column stays aligned
        assert_eq!(table.strs(table::REGION).unwrap(), &["West", "East"]);
        assert_eq!(table.i64s(table::UNITS_SOLD).unwrap(), &[10, 5]);
    }

    #[test]
    fn final_line_without_newline_is_parsed() {
        let csv = format!(
            "{HEADER}\n\
             2021-01-05,West,Apparel,West Gear,California,Online,50.00,10,500.00,0.40,200.00"
        );
        let (table, summary) = load_str(&csv).unwrap();
        assert_eq!(summary.rows_loaded, 1);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn slash_dates_are_accepted() {
        let csv = format!(
            "{HEADER}\n\
             01/05/2021,West,Apparel,West Gear,California,Online,50.00,10,500.00,0.40,200.00\n"
        );
        let (table, _) = load_str(&csv).unwrap();
        let date = table.dates(table::INVOICE_DATE).unwrap()[0];
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 1, 5).unwrap());
    }
}
