use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::pipeline::table::{self, Column, Table};
use crate::pipeline::{Dimension, GroupOrder, Measure, PipelineError, Rollup};

/// One key/value row of a group-by report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub value: f64,
}

/// A categorical group-by report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub dimension: Dimension,
    pub measure: Measure,
    pub rows: Vec<GroupRow>,
}

impl GroupReport {
    /// First `n` rows. Meaningful on value-sorted reports; returns every
    /// group when fewer than `n` exist, never pads.
    pub fn top_n(&self, n: usize) -> GroupReport {
        GroupReport {
            dimension: self.dimension,
            measure: self.measure,
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Leading row of a value-sorted report; `None` when there are no groups.
    pub fn best(&self) -> Option<&GroupRow> {
        self.rows.first()
    }

    /// Trailing row of a value-sorted report; `None` when there are no groups.
    pub fn worst(&self) -> Option<&GroupRow> {
        self.rows.last()
    }
}

/// Rolls one measure up per group of `dimension`.
///
/// Accumulation is keyed through a `BTreeMap`, so `GroupOrder::ByKey`
/// reports come out alphabetical and `GroupOrder::ValueDesc` sorts by value
/// with an alphabetical tie-break. Same inputs, same output, always.
pub fn group_rollup(
    table: &Table,
    dimension: Dimension,
    measure: Measure,
    rollup: Rollup,
    order: GroupOrder,
) -> Result<GroupReport, PipelineError> {
    let keys = table.strs(dimension.column())?;
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (key, value) in keys.iter().zip(measure_values(table, measure)?) {
        let entry = groups.entry(key.as_str()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(key, (sum, count))| GroupRow {
            key: key.to_string(),
            value: match rollup {
                Rollup::Sum => sum,
                // count >= 1 for every materialized group
                Rollup::Mean => sum / count as f64,
            },
        })
        .collect();

    if order == GroupOrder::ValueDesc {
        sort_desc(&mut rows);
    }

    Ok(GroupReport { dimension, measure, rows })
}

fn sort_desc(rows: &mut [GroupRow]) {
    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
}

fn measure_values<'a>(
    table: &'a Table,
    measure: Measure,
) -> Result<Box<dyn Iterator<Item = f64> + 'a>, PipelineError> {
    match table.get_col(measure.column())? {
        Column::Int64(v) => Ok(Box::new(v.iter().map(|&x| x as f64))),
        Column::Float64(v) => Ok(Box::new(v.iter().copied())),
        _ => Err(PipelineError::Schema(format!(
            "column '{}' is not numeric",
            measure.column()
        ))),
    }
}

/// Total sales summed into calendar-month buckets, ascending by month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// First day of the bucket's month.
    pub month: NaiveDate,
    pub total_sales: f64,
}

pub fn monthly_trend(table: &Table) -> Result<Vec<TrendPoint>, PipelineError> {
    let dates = table.dates(table::INVOICE_DATE)?;
    let sales = table.f64s(table::TOTAL_SALES)?;
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, value) in dates.iter().zip(sales) {
        *buckets.entry(month_bucket(*date)).or_insert(0.0) += value;
    }
    Ok(buckets
        .into_iter()
        .map(|(month, total_sales)| TrendPoint { month, total_sales })
        .collect())
}

fn month_bucket(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub key: String,
    pub value: f64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareReport {
    pub dimension: Dimension,
    pub rows: Vec<ShareRow>,
}

/// Appends each group's percentage of the grand total. A zero total makes
/// every share 0 rather than dividing by it.
pub fn revenue_share(report: &GroupReport) -> ShareReport {
    let total: f64 = report.rows.iter().map(|r| r.value).sum();
    let rows = report
        .rows
        .iter()
        .map(|r| ShareRow {
            key: r.key.clone(),
            value: r.value,
            share_pct: if total != 0.0 { r.value / total * 100.0 } else { 0.0 },
        })
        .collect();
    ShareReport { dimension: report.dimension, rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginRow {
    pub key: String,
    pub total_sales: f64,
    pub operating_profit: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginReport {
    pub dimension: Dimension,
    pub rows: Vec<MarginRow>,
}

/// Per-group profit margin, in key order. A group with zero sales reports a
/// 0 margin.
pub fn margin_by(table: &Table, dimension: Dimension) -> Result<MarginReport, PipelineError> {
    let keys = table.strs(dimension.column())?;
    let sales = table.f64s(table::TOTAL_SALES)?;
    let profit = table.f64s(table::OPERATING_PROFIT)?;

    let mut groups: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for ((key, s), p) in keys.iter().zip(sales).zip(profit) {
        let entry = groups.entry(key.as_str()).or_insert((0.0, 0.0));
        entry.0 += s;
        entry.1 += p;
    }

    let rows = groups
        .into_iter()
        .map(|(key, (total_sales, operating_profit))| MarginRow {
            key: key.to_string(),
            total_sales,
            operating_profit,
            margin_pct: if total_sales != 0.0 {
                operating_profit / total_sales * 100.0
            } else {
                0.0
            },
        })
        .collect();
    Ok(MarginReport { dimension, rows })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoRow {
    pub key: String,
    pub value: f64,
    pub cumulative_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoReport {
    pub dimension: Dimension,
    pub rows: Vec<ParetoRow>,
    /// Number of leading groups whose cumulative fraction first reaches
    /// `threshold`.
    pub count_to_threshold: usize,
    pub threshold: f64,
}

/// Cumulative concentration of a categorical report, descending by value.
///
/// Returns `None` when the report is empty or its grand total is zero: the
/// fractions are undefined there, not zero.
pub fn pareto(report: &GroupReport, threshold: f64) -> Option<ParetoReport> {
    let total: f64 = report.rows.iter().map(|r| r.value).sum();
    if report.rows.is_empty() || total == 0.0 {
        return None;
    }

    let mut sorted: Vec<GroupRow> = report.rows.clone();
    sort_desc(&mut sorted);

    let mut running = 0.0;
    let mut rows = Vec::with_capacity(sorted.len());
    let mut count_to_threshold = None;
    for row in sorted {
        running += row.value;
        let cumulative_fraction = running / total;
        rows.push(ParetoRow {
            key: row.key,
            value: row.value,
            cumulative_fraction,
        });
        if count_to_threshold.is_none() && cumulative_fraction >= threshold {
            count_to_threshold = Some(rows.len());
        }
    }

    Some(ParetoReport {
        dimension: report.dimension,
        count_to_threshold: count_to_threshold.unwrap_or(rows.len()),
        threshold,
        rows,
    })
}

/// Pearson correlation of two aligned series.
///
/// `None` — undefined, as opposed to zero — when fewer than two points
/// exist or either series has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let xs = &xs[..n];
    let ys = &ys[..n];

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub key: String,
    pub x: f64,
    pub y: f64,
}

/// Two rolled-up measures per group, aligned point by point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterReport {
    pub dimension: Dimension,
    pub x: (Measure, Rollup),
    pub y: (Measure, Rollup),
    pub points: Vec<ScatterPoint>,
    /// Pearson correlation of the two series; `None` when undefined.
    pub correlation: Option<f64>,
}

pub fn scatter(
    table: &Table,
    dimension: Dimension,
    x: (Measure, Rollup),
    y: (Measure, Rollup),
) -> Result<ScatterReport, PipelineError> {
    let keys = table.strs(dimension.column())?;
    let xs = measure_values(table, x.0)?;
    let ys = measure_values(table, y.0)?;

    let mut groups: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for ((key, xv), yv) in keys.iter().zip(xs).zip(ys) {
        let entry = groups.entry(key.as_str()).or_insert((0.0, 0.0, 0));
        entry.0 += xv;
        entry.1 += yv;
        entry.2 += 1;
    }

    let finish = |sum: f64, count: usize, rollup: Rollup| match rollup {
        Rollup::Sum => sum,
        Rollup::Mean => sum / count as f64,
    };

    let points: Vec<ScatterPoint> = groups
        .into_iter()
        .map(|(key, (sx, sy, count))| ScatterPoint {
            key: key.to_string(),
            x: finish(sx, count, x.1),
            y: finish(sy, count, y.1),
        })
        .collect();

    let correlation = pearson(
        &points.iter().map(|p| p.x).collect::<Vec<_>>(),
        &points.iter().map(|p| p.y).collect::<Vec<_>>(),
    );

    Ok(ScatterReport { dimension, x, y, points, correlation })
}
