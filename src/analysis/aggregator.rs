//! Sales aggregation and statistics.
//!
//! Every function here is a pure view over the full record table.

use super::stats::{mean, pearson, quantile, sample_std};
use crate::models::{
    AgeStatistics, Analysis, BestRegion, CategoryTotals, ColumnInfo, CorrelationMatrix,
    DatasetOverview, Metric, MonthlyTotals, RegionTotals, SalesRecord,
};
use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

/// Number of rows shown in the dataset overview.
pub const OVERVIEW_ROWS: usize = 5;

/// Compute every view over the full table.
pub fn analyze(records: &[SalesRecord], top_n: usize) -> Analysis {
    let region_totals = region_totals(records);
    let best_region = best_region(&region_totals);

    let analysis = Analysis {
        overview: dataset_overview(records),
        category_totals: category_totals(records),
        monthly_totals: monthly_totals(records),
        top_n,
        top_profitable: top_profitable(records, top_n),
        ages: records.iter().map(|r| r.customer_age as f64).collect(),
        age_statistics: age_statistics(records),
        region_totals,
        best_region,
        correlation: correlation_matrix(records),
    };

    debug!(
        "Computed views: {} categories, {} months, {} regions, total sales {:.2}",
        analysis.category_totals.len(),
        analysis.monthly_totals.len(),
        analysis.region_totals.len(),
        grand_total(records)
    );

    analysis
}

/// Sum of sales amount over every record.
pub fn grand_total(records: &[SalesRecord]) -> f64 {
    records.iter().map(|r| r.sales_amount).sum()
}

/// Group sales amount by a string key.
fn sum_by<F>(records: &[SalesRecord], key: F) -> BTreeMap<String, f64>
where
    F: Fn(&SalesRecord) -> &str,
{
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for record in records {
        *totals.entry(key(record).to_string()).or_default() += record.sales_amount;
    }

    totals
}

/// Total sales amount per product category.
pub fn category_totals(records: &[SalesRecord]) -> CategoryTotals {
    sum_by(records, |r| r.product_category.as_str())
}

/// Total sales amount per region.
pub fn region_totals(records: &[SalesRecord]) -> RegionTotals {
    sum_by(records, |r| r.region.as_str())
}

/// Total sales amount per calendar month, pooling all years.
pub fn monthly_totals(records: &[SalesRecord]) -> MonthlyTotals {
    let mut totals = MonthlyTotals::new();

    for record in records {
        *totals.entry(record.purchase_date.month()).or_default() += record.sales_amount;
    }

    totals
}

/// The `n` most profitable records, highest profit first.
///
/// The sort is stable, so equal profits keep their input order.
pub fn top_profitable(records: &[SalesRecord], n: usize) -> Vec<SalesRecord> {
    let mut ranked: Vec<&SalesRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.profit.total_cmp(&a.profit));
    ranked.into_iter().take(n).cloned().collect()
}

/// Descriptive statistics of customer age; `None` for an empty table.
pub fn age_statistics(records: &[SalesRecord]) -> Option<AgeStatistics> {
    let mut ages: Vec<f64> = records.iter().map(|r| r.customer_age as f64).collect();
    if ages.is_empty() {
        return None;
    }
    ages.sort_by(f64::total_cmp);

    Some(AgeStatistics {
        count: ages.len(),
        mean: mean(&ages)?,
        std: sample_std(&ages),
        min: ages[0],
        q1: quantile(&ages, 0.25)?,
        median: quantile(&ages, 0.5)?,
        q3: quantile(&ages, 0.75)?,
        max: ages[ages.len() - 1],
    })
}

/// Region with the highest total; ties resolve to the first label.
pub fn best_region(totals: &RegionTotals) -> Option<BestRegion> {
    let mut best: Option<BestRegion> = None;

    for (region, &total) in totals {
        let better = match &best {
            Some(current) => total > current.total,
            None => true,
        };
        if better {
            best = Some(BestRegion {
                region: region.clone(),
                total,
            });
        }
    }

    best
}

/// Pearson correlation between sales amount, profit and rating.
///
/// Each coefficient uses only the rows where both values are present.
pub fn correlation_matrix(records: &[SalesRecord]) -> CorrelationMatrix {
    let metrics = Metric::ALL;
    let mut values = [[None; 3]; 3];

    for i in 0..metrics.len() {
        for j in i..metrics.len() {
            let pairs: Vec<(f64, f64)> = records
                .iter()
                .filter_map(|r| Some((metrics[i].value(r)?, metrics[j].value(r)?)))
                .collect();

            let coefficient = if i == j {
                // Self-correlation is exact whenever the column varies.
                pearson(&pairs).map(|_| 1.0)
            } else {
                pearson(&pairs)
            };

            values[i][j] = coefficient;
            values[j][i] = coefficient;
        }
    }

    let matrix = CorrelationMatrix { metrics, values };
    debug_assert!(matrix.is_symmetric());
    matrix
}

/// Row count, first rows and per-column completeness.
pub fn dataset_overview(records: &[SalesRecord]) -> DatasetOverview {
    let n = records.len();
    let ratings = records.iter().filter(|r| r.rating.is_some()).count();

    let columns = [
        ("order_id", n, "text"),
        ("product_category", n, "text"),
        ("sales_amount", n, "float"),
        ("profit", n, "float"),
        ("purchase_date", n, "date"),
        ("customer_age", n, "integer"),
        ("region", n, "text"),
        ("rating", ratings, "float"),
    ]
    .into_iter()
    .map(|(name, non_null, dtype)| ColumnInfo {
        name,
        non_null,
        dtype,
    })
    .collect();

    DatasetOverview {
        row_count: n,
        head: records.iter().take(OVERVIEW_ROWS).cloned().collect(),
        columns,
    }
}
