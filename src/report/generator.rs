//! Plain-text report generation.
//!
//! This module renders every analysis view as a labelled text section.
//! The output depends only on the analysis, so identical input always
//! produces identical bytes.

use crate::models::{
    month_name, AgeStatistics, Analysis, BestRegion, CorrelationMatrix, DatasetOverview,
    SalesRecord,
};
use std::collections::BTreeMap;
use std::io::{self, Write};

const BANNER_WIDTH: usize = 50;
const SECTION_RULE: &str = "---------------";
const UNDEFINED: &str = "undefined";

/// Generate the complete text report.
pub fn generate_text_report(analysis: &Analysis) -> String {
    let mut output = String::new();

    output.push_str(&generate_banner());
    output.push_str(&section("Overview", &generate_overview(&analysis.overview)));
    output.push_str(&section(
        "Total sales by product category",
        &generate_totals(&analysis.category_totals, "product_category"),
    ));
    output.push_str(&section(
        "Monthly sales trend",
        &generate_monthly(&analysis.monthly_totals),
    ));
    output.push_str(&section(
        &format!("Top {} Most Profitable Products", analysis.top_n),
        &generate_top_profitable(&analysis.top_profitable),
    ));
    output.push_str(&section(
        "Customer age distribution",
        &generate_age_statistics(analysis.age_statistics.as_ref()),
    ));
    output.push_str(&section(
        "Best Performing Region by Sales",
        &generate_region(&analysis.region_totals, analysis.best_region.as_ref()),
    ));
    output.push_str(&section(
        "Correlation Between Sales, Profit, and Rating",
        &generate_correlation(&analysis.correlation),
    ));

    output
}

/// Write the text report to any writer (stdout in production).
pub fn write_report<W: Write>(analysis: &Analysis, writer: &mut W) -> io::Result<()> {
    writer.write_all(generate_text_report(analysis).as_bytes())?;
    writer.flush()
}

fn generate_banner() -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\nSALES DATA ANALYSIS\n{rule}\n\n\n")
}

fn section(title: &str, body: &str) -> String {
    format!("{SECTION_RULE} {title} {SECTION_RULE}\n\n\n{body}\n\n\n")
}

/// Lay out rows under headers with two-space gutters. Numeric columns
/// (`right[i] == true`) are right-aligned.
fn render_table(headers: &[&str], rows: &[Vec<String>], right: &[bool]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        let line = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths[i];
                if right.get(i).copied().unwrap_or(false) {
                    format!("{:>width$}", cell)
                } else {
                    format!("{:<width$}", cell)
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    };

    let mut lines = vec![format_row(headers.to_vec())];
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }

    lines.join("\n")
}

fn generate_overview(overview: &DatasetOverview) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "Rows: {} | Columns: {}\n\n",
        overview.row_count,
        overview.columns.len()
    ));

    if overview.head.is_empty() {
        body.push_str("No records.\n\n");
    } else {
        body.push_str(&generate_head(&overview.head));
        body.push_str("\n\n");
    }

    let rows: Vec<Vec<String>> = overview
        .columns
        .iter()
        .map(|c| {
            vec![
                c.name.to_string(),
                format!("{} non-null", c.non_null),
                c.dtype.to_string(),
            ]
        })
        .collect();
    body.push_str(&render_table(
        &["Column", "Count", "Type"],
        &rows,
        &[false, true, false],
    ));

    body
}

fn generate_head(records: &[SalesRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.order_id.clone(),
                r.product_category.clone(),
                format!("{:.2}", r.sales_amount),
                format!("{:.2}", r.profit),
                r.purchase_date.format("%Y-%m-%d").to_string(),
                r.customer_age.to_string(),
                r.region.clone(),
                r.rating.map(|v| format!("{:.1}", v)).unwrap_or_default(),
            ]
        })
        .collect();

    render_table(
        &[
            "order_id",
            "product_category",
            "sales_amount",
            "profit",
            "purchase_date",
            "customer_age",
            "region",
            "rating",
        ],
        &rows,
        &[false, false, true, true, false, true, false, true],
    )
}

fn generate_totals(totals: &BTreeMap<String, f64>, label: &str) -> String {
    if totals.is_empty() {
        return "No records.".to_string();
    }

    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|(key, total)| vec![key.clone(), format!("{:.2}", total)])
        .collect();

    render_table(&[label, "sales_amount"], &rows, &[false, true])
}

fn generate_monthly(totals: &BTreeMap<u32, f64>) -> String {
    if totals.is_empty() {
        return "No records.".to_string();
    }

    let rows: Vec<Vec<String>> = totals
        .iter()
        .map(|(&month, total)| vec![month_name(month).to_string(), format!("{:.2}", total)])
        .collect();

    render_table(&["Month", "sales_amount"], &rows, &[false, true])
}

fn generate_top_profitable(records: &[SalesRecord]) -> String {
    if records.is_empty() {
        return "No records.".to_string();
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.order_id.clone(),
                r.product_category.clone(),
                format!("{:.2}", r.profit),
                format!("{:.2}", r.sales_amount),
            ]
        })
        .collect();

    render_table(
        &["order_id", "product_category", "profit", "sales_amount"],
        &rows,
        &[false, false, true, true],
    )
}

fn generate_age_statistics(stats: Option<&AgeStatistics>) -> String {
    let Some(stats) = stats else {
        return "No records.".to_string();
    };

    let std = stats
        .std
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| UNDEFINED.to_string());

    let rows = vec![
        vec!["count".to_string(), stats.count.to_string()],
        vec!["mean".to_string(), format!("{:.2}", stats.mean)],
        vec!["std".to_string(), std],
        vec!["min".to_string(), format!("{:.2}", stats.min)],
        vec!["25%".to_string(), format!("{:.2}", stats.q1)],
        vec!["50%".to_string(), format!("{:.2}", stats.median)],
        vec!["75%".to_string(), format!("{:.2}", stats.q3)],
        vec!["max".to_string(), format!("{:.2}", stats.max)],
    ];

    render_table(&["customer_age", ""], &rows, &[false, true])
}

fn generate_region(totals: &BTreeMap<String, f64>, best: Option<&BestRegion>) -> String {
    let mut body = generate_totals(totals, "region");

    if let Some(best) = best {
        body.push_str(&format!(
            "\n\nBest region: {} ({})",
            best.region,
            format_currency(best.total)
        ));
    }

    body
}

fn generate_correlation(matrix: &CorrelationMatrix) -> String {
    let names: Vec<&str> = matrix.metrics.iter().map(|m| m.column()).collect();

    let rows: Vec<Vec<String>> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut row = vec![name.to_string()];
            row.extend((0..names.len()).map(|j| {
                matrix
                    .get(i, j)
                    .map(|v| format!("{:.4}", v))
                    .unwrap_or_else(|| UNDEFINED.to_string())
            }));
            row
        })
        .collect();

    let mut headers = vec![""];
    headers.extend(names.iter().copied());

    render_table(&headers, &rows, &[false, true, true, true])
}

/// Format with comma thousands separators and a fixed number of decimals.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Whole-dollar label such as `$12,345` or `-$80`.
pub fn format_currency(value: f64) -> String {
    let digits = format_thousands(value, 0);
    match digits.strip_prefix('-') {
        Some(rest) => format!("-${}", rest),
        None => format!("${}", digits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use chrono::NaiveDate;

    fn record(id: &str, category: &str, region: &str, sales: f64, profit: f64) -> SalesRecord {
        SalesRecord {
            order_id: id.to_string(),
            product_category: category.to_string(),
            sales_amount: sales,
            profit,
            purchase_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            customer_age: 30 + id.len() as u32,
            region: region.to_string(),
            rating: Some(sales / 100.0),
        }
    }

    fn create_test_analysis() -> Analysis {
        let records = vec![
            record("1", "A", "North", 100.0, 10.0),
            record("22", "B", "South", 50.0, 30.0),
            record("333", "A", "North", 25.0, 20.0),
        ];
        analyze(&records, 5)
    }

    #[test]
    fn test_generate_text_report_sections_in_order() {
        let report = generate_text_report(&create_test_analysis());

        let titles = [
            "SALES DATA ANALYSIS",
            "--------------- Overview ---------------",
            "--------------- Total sales by product category ---------------",
            "--------------- Monthly sales trend ---------------",
            "--------------- Top 5 Most Profitable Products ---------------",
            "--------------- Customer age distribution ---------------",
            "--------------- Best Performing Region by Sales ---------------",
            "--------------- Correlation Between Sales, Profit, and Rating ---------------",
        ];

        let mut last = 0;
        for title in titles {
            let pos = report[last..]
                .find(title)
                .unwrap_or_else(|| panic!("missing or out of order: {title}"));
            last += pos + title.len();
        }
    }

    #[test]
    fn test_report_is_deterministic() {
        let first = generate_text_report(&create_test_analysis());
        let second = generate_text_report(&create_test_analysis());
        assert_eq!(first, second);
    }

    fn has_line(report: &str, prefix: &str, suffix: &str) -> bool {
        report
            .lines()
            .any(|l| l.starts_with(prefix) && l.ends_with(suffix))
    }

    #[test]
    fn test_category_section_values() {
        let report = generate_text_report(&create_test_analysis());
        assert!(has_line(&report, "A ", " 125.00"));
        assert!(has_line(&report, "B ", " 50.00"));
        assert!(report.contains("February"));
        assert!(report.contains("Best region: North ($125)"));
    }

    #[test]
    fn test_section_layout() {
        let text = section("Title", "body");
        assert_eq!(text, "--------------- Title ---------------\n\n\nbody\n\n\n");
    }

    #[test]
    fn test_undefined_correlation_is_reported() {
        let records = vec![
            record("1", "A", "North", 100.0, 10.0),
            record("2", "B", "South", 100.0, 30.0),
        ];
        let report = generate_text_report(&analyze(&records, 5));
        let correlation = report
            .split("Correlation Between Sales, Profit, and Rating")
            .nth(1)
            .unwrap();
        assert!(correlation.contains(UNDEFINED));
    }

    #[test]
    fn test_empty_analysis() {
        let report = generate_text_report(&analyze(&[], 5));
        assert!(report.contains("Rows: 0 | Columns: 8"));
        assert!(report.contains("No records."));
    }

    #[test]
    fn test_render_table_alignment() {
        let rows = vec![
            vec!["x".to_string(), "1.00".to_string()],
            vec!["long".to_string(), "10.00".to_string()],
        ];
        let table = render_table(&["k", "v"], &rows, &[false, true]);
        assert_eq!(table, "k         v\nx      1.00\nlong  10.00");
    }

    #[test]
    fn test_write_report() {
        let mut buffer = Vec::new();
        write_report(&create_test_analysis(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(&"=".repeat(50)));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_thousands(999.0, 0), "999");
        assert_eq!(format_thousands(-1000.0, 0), "-1,000");
        assert_eq!(format_thousands(-0.2, 0), "0");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(12345.4), "$12,345");
        assert_eq!(format_currency(-80.0), "-$80");
        assert_eq!(format_currency(0.0), "$0");
    }
}
