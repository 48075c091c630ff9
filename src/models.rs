//! Data models for the sales report.
//!
//! This module contains the loaded record type and every derived view
//! the aggregator produces.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month names, indexed by `month - 1`.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Returns the English name of a 1-based calendar month.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("Unknown")
}

/// A single transaction row of the sales table.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub order_id: String,
    pub product_category: String,
    pub sales_amount: f64,
    pub profit: f64,
    pub purchase_date: NaiveDate,
    pub customer_age: u32,
    pub region: String,
    /// Missing when the rating cell is empty.
    pub rating: Option<f64>,
}

/// Summed sales amount per category label, ordered by label.
pub type CategoryTotals = BTreeMap<String, f64>;

/// Summed sales amount per region label, ordered by label.
pub type RegionTotals = BTreeMap<String, f64>;

/// Summed sales amount per calendar month (1..=12), ordered January first.
pub type MonthlyTotals = BTreeMap<u32, f64>;

/// Descriptive statistics of customer age.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined below two observations.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Numeric column taking part in the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    SalesAmount,
    Profit,
    Rating,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::SalesAmount, Metric::Profit, Metric::Rating];

    /// Column name as it appears in the input file.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::SalesAmount => "sales_amount",
            Metric::Profit => "profit",
            Metric::Rating => "rating",
        }
    }

    /// Value of this metric for a record, if present.
    pub fn value(&self, record: &SalesRecord) -> Option<f64> {
        match self {
            Metric::SalesAmount => Some(record.sales_amount),
            Metric::Profit => Some(record.profit),
            Metric::Rating => record.rating,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Symmetric Pearson correlation matrix over [`Metric::ALL`].
///
/// A `None` cell means the coefficient is undefined (zero variance or
/// fewer than two paired observations).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub metrics: [Metric; 3],
    pub values: [[Option<f64>; 3]; 3],
}

impl CorrelationMatrix {
    /// Coefficient between the metrics at row `i` and column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values[i][j]
    }

    /// Returns true if every off-diagonal pair matches its mirror.
    pub fn is_symmetric(&self) -> bool {
        (0..3).all(|i| (0..3).all(|j| self.values[i][j] == self.values[j][i]))
    }
}

/// Per-column summary used by the overview section.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub non_null: usize,
    pub dtype: &'static str,
}

/// Shape and first rows of the loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub head: Vec<SalesRecord>,
    pub columns: Vec<ColumnInfo>,
}

/// The region with the largest sales total.
#[derive(Debug, Clone, PartialEq)]
pub struct BestRegion {
    pub region: String,
    pub total: f64,
}

/// Every derived view, computed once from the full table.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub overview: DatasetOverview,
    pub category_totals: CategoryTotals,
    pub monthly_totals: MonthlyTotals,
    /// Requested size of the most-profitable view.
    pub top_n: usize,
    pub top_profitable: Vec<SalesRecord>,
    pub ages: Vec<f64>,
    pub age_statistics: Option<AgeStatistics>,
    pub region_totals: RegionTotals,
    pub best_region: Option<BestRegion>,
    pub correlation: CorrelationMatrix,
}
