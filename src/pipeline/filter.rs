use std::collections::HashSet;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::pipeline::table::{self, Table};
use crate::pipeline::{PipelineError, Quarter};

/// The active dashboard selection.
///
/// `regions` and `products` are always consulted: an empty set matches no
/// rows. A caller that wants "everything" passes the full value domain,
/// which [`FilterSet::universe`] builds. The remaining dimensions are
/// optional and unconstrained when `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub regions: HashSet<String>,
    pub products: HashSet<String>,
    #[serde(default)]
    pub years: Option<HashSet<i32>>,
    #[serde(default)]
    pub quarters: Option<HashSet<Quarter>>,
    #[serde(default)]
    pub date_min: Option<NaiveDate>,
    #[serde(default)]
    pub date_max: Option<NaiveDate>,
}

impl FilterSet {
    /// Selection matching every row of `table`: all regions, all products,
    /// no calendar or date constraints.
    pub fn universe(table: &Table) -> Result<Self, PipelineError> {
        Ok(FilterSet {
            regions: table.distinct_strs(table::REGION)?.into_iter().collect(),
            products: table.distinct_strs(table::PRODUCT)?.into_iter().collect(),
            ..FilterSet::default()
        })
    }

    /// Restricts the selection to an inclusive date window.
    pub fn with_dates(mut self, min: NaiveDate, max: NaiveDate) -> Self {
        self.date_min = Some(min);
        self.date_max = Some(max);
        self
    }

    /// Rejects selections the engine refuses to run: inverted date bounds,
    /// or an active dimension whose column is missing from `table`.
    pub fn validate(&self, table: &Table) -> Result<(), PipelineError> {
        if let (Some(min), Some(max)) = (self.date_min, self.date_max) {
            if min > max {
                return Err(PipelineError::InvalidDateRange { min, max });
            }
        }
        table.get_col(table::REGION)?;
        table.get_col(table::PRODUCT)?;
        if self.years.is_some() {
            table.get_col(table::YEAR)?;
        }
        if self.quarters.is_some() {
            table.get_col(table::QUARTER)?;
        }
        if self.date_min.is_some() || self.date_max.is_some() {
            table.get_col(table::INVOICE_DATE)?;
        }
        Ok(())
    }
}

/// Applies `filters` to `table`: keeps the rows satisfying the AND of every
/// active predicate, in input order. Zero matches yields an empty table,
/// not an error.
pub fn apply(table: &Table, filters: &FilterSet) -> Result<Table, PipelineError> {
    filters.validate(table)?;

    let mut rows = member_rows(table.strs(table::REGION)?, &filters.regions);
    rows = intersect_sorted(
        rows,
        member_rows(table.strs(table::PRODUCT)?, &filters.products),
    );

    if let Some(years) = &filters.years {
        let years: HashSet<i64> = years.iter().map(|&y| i64::from(y)).collect();
        let matches = table
            .i64s(table::YEAR)?
            .iter()
            .enumerate()
            .filter(|&(_, y)| years.contains(y))
            .map(|(i, _)| i)
            .collect();
        rows = intersect_sorted(rows, matches);
    }

    if let Some(quarters) = &filters.quarters {
        let labels: HashSet<&str> = quarters.iter().map(|q| q.as_str()).collect();
        let matches = table
            .strs(table::QUARTER)?
            .iter()
            .enumerate()
            .filter(|(_, q)| labels.contains(q.as_str()))
            .map(|(i, _)| i)
            .collect();
        rows = intersect_sorted(rows, matches);
    }

    if filters.date_min.is_some() || filters.date_max.is_some() {
        let matches = table
            .dates(table::INVOICE_DATE)?
            .iter()
            .enumerate()
            .filter(|&(_, d)| {
                filters.date_min.map_or(true, |min| *d >= min)
                    && filters.date_max.map_or(true, |max| *d <= max)
            })
            .map(|(i, _)| i)
            .collect();
        rows = intersect_sorted(rows, matches);
    }

    debug!("filter matched {} of {} rows", rows.len(), table.row_count());
    Ok(table.take(&rows))
}

fn member_rows(values: &[String], allowed: &HashSet<String>) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| allowed.contains(v.as_str()))
        .map(|(i, _)| i)
        .collect()
}

/// Intersection of two ascending index vectors.
fn intersect_sorted(a: Vec<usize>, b: Vec<usize>) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}
