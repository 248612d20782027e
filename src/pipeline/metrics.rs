use serde::Serialize;

use crate::helpers::simd_helpers::{sum_f64, sum_i64};
use crate::pipeline::table::{self, Table};
use crate::pipeline::PipelineError;

/// Scalar KPIs over a filtered table. All zero when the table is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpi {
    pub total_sales: f64,
    pub units_sold: i64,
    pub operating_profit: f64,
    /// `operating_profit / total_sales` across the whole table, 0 when
    /// there are no sales. Not the same number as [`average_margin`].
    pub weighted_margin: f64,
}

pub fn compute_kpis(table: &Table) -> Result<Kpi, PipelineError> {
    let total_sales = sum_f64(table.f64s(table::TOTAL_SALES)?);
    let units_sold = sum_i64(table.i64s(table::UNITS_SOLD)?);
    let operating_profit = sum_f64(table.f64s(table::OPERATING_PROFIT)?);
    let weighted_margin = if total_sales != 0.0 {
        operating_profit / total_sales
    } else {
        0.0
    };
    Ok(Kpi {
        total_sales,
        units_sold,
        operating_profit,
        weighted_margin,
    })
}

/// Unweighted mean of the per-row operating margin, 0 on an empty table.
pub fn average_margin(table: &Table) -> Result<f64, PipelineError> {
    let margins = table.f64s(table::OPERATING_MARGIN)?;
    if margins.is_empty() {
        return Ok(0.0);
    }
    Ok(sum_f64(margins) / margins.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::table::{
        Column, OPERATING_MARGIN, OPERATING_PROFIT, TOTAL_SALES, UNITS_SOLD,
    };

    fn sample() -> Table {
        Table::new(
            vec![
                TOTAL_SALES.to_string(),
                UNITS_SOLD.to_string(),
                OPERATING_PROFIT.to_string(),
                OPERATING_MARGIN.to_string(),
            ],
            vec![
                Column::Float64(vec![100.0, 300.0]),
                Column::Int64(vec![10, 20]),
                Column::Float64(vec![50.0, 60.0]),
                Column::Float64(vec![0.50, 0.20]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn kpis_sum_the_numeric_columns() {
        let kpi = compute_kpis(&sample()).unwrap();
        assert_eq!(kpi.total_sales, 400.0);
        assert_eq!(kpi.units_sold, 30);
        assert_eq!(kpi.operating_profit, 110.0);
        assert!((kpi.weighted_margin - 0.275).abs() < 1e-12);
    }

    #[test]
    fn weighted_and_average_margin_are_different_metrics() {
        let table = sample();
        let kpi = compute_kpis(&table).unwrap();
        let avg = average_margin(&table).unwrap();
        // unweighted mean of [0.50, 0.20] vs 110/400
        assert!((avg - 0.35).abs() < 1e-12);
        assert!((kpi.weighted_margin - avg).abs() > 0.05);
    }

    #[test]
    fn empty_table_yields_zeroed_kpis() {
        let empty = sample().take(&[]);
        let kpi = compute_kpis(&empty).unwrap();
        assert_eq!(kpi.total_sales, 0.0);
        assert_eq!(kpi.units_sold, 0);
        assert_eq!(kpi.operating_profit, 0.0);
        assert_eq!(kpi.weighted_margin, 0.0);
        assert_eq!(average_margin(&empty).unwrap(), 0.0);
    }
}
