//! Sales table loader.
//!
//! This module reads the comma-delimited input file into an ordered
//! vector of [`SalesRecord`], resolving columns by header name.

use crate::error::InputError;
use crate::models::SalesRecord;
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "order_id",
    "product_category",
    "sales_amount",
    "profit",
    "purchase_date",
    "customer_age",
    "region",
    "rating",
];

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Header positions of the required columns.
#[derive(Debug, Clone)]
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, InputError> {
        let mut positions = HashMap::new();

        for column in REQUIRED_COLUMNS {
            let idx = headers
                .iter()
                .position(|h| h == column)
                .ok_or(InputError::MissingColumn(column))?;
            positions.insert(column, idx);
        }

        Ok(Self { positions })
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &'static str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
    }
}

/// Load every record from a CSV file on disk.
pub fn load_records(path: &Path) -> Result<Vec<SalesRecord>, InputError> {
    info!("Loading sales data from {}", path.display());

    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let records = read_records(BufReader::new(file))?;
    info!("Loaded {} records", records.len());
    Ok(records)
}

/// Parse records from any reader holding CSV text with a header row.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<SalesRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let index = ColumnIndex::from_headers(&headers)?;
    debug!("Resolved input columns: {:?}", index.positions);

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        // Header is line 1.
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(records.len() as u64 + 2);
        records.push(parse_row(&row, &index, line)?);
    }

    Ok(records)
}

fn parse_row(
    row: &StringRecord,
    index: &ColumnIndex,
    line: u64,
) -> Result<SalesRecord, InputError> {
    let date_cell = index.cell(row, "purchase_date");
    let purchase_date = parse_date(date_cell).ok_or_else(|| InputError::InvalidDate {
        line,
        value: date_cell.to_string(),
    })?;

    let rating_cell = index.cell(row, "rating");
    let rating = if rating_cell.is_empty() {
        None
    } else {
        Some(parse_number(rating_cell, "rating", line)?)
    };

    Ok(SalesRecord {
        order_id: index.cell(row, "order_id").to_string(),
        product_category: index.cell(row, "product_category").to_string(),
        sales_amount: parse_number(index.cell(row, "sales_amount"), "sales_amount", line)?,
        profit: parse_number(index.cell(row, "profit"), "profit", line)?,
        purchase_date,
        customer_age: parse_age(index.cell(row, "customer_age"), line)?,
        region: index.cell(row, "region").to_string(),
        rating,
    })
}

fn parse_number(value: &str, column: &'static str, line: u64) -> Result<f64, InputError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError::InvalidValue {
            line,
            column,
            value: value.to_string(),
        })
}

fn parse_age(value: &str, line: u64) -> Result<u32, InputError> {
    let invalid = || InputError::InvalidValue {
        line,
        column: "customer_age",
        value: value.to_string(),
    };

    // Ages exported as floats ("34.0") are accepted when integral.
    let age = match value.parse::<u32>() {
        Ok(age) => age,
        Err(_) => {
            let float = value.parse::<f64>().map_err(|_| invalid())?;
            if float.fract() != 0.0 || float < 0.0 || float > u32::MAX as f64 {
                return Err(invalid());
            }
            float as u32
        }
    };

    if age == 0 {
        return Err(invalid());
    }
    Ok(age)
}

/// Parse a purchase date, dropping any time-of-day suffix.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(value);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "order_id,product_category,sales_amount,profit,purchase_date,customer_age,region,rating";

    fn read(body: &str) -> Result<Vec<SalesRecord>, InputError> {
        read_records(format!("{}\n{}", HEADER, body).as_bytes())
    }

    #[test]
    fn test_read_records() {
        let records = read(
            "1,Electronics,100.5,20,2024-01-15,34,North,4.5\n\
             2,Books,50,-5.25,2024-02-01,41,South,3\n",
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_id, "1");
        assert_eq!(records[0].product_category, "Electronics");
        assert_eq!(records[0].sales_amount, 100.5);
        assert_eq!(
            records[0].purchase_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(records[1].profit, -5.25);
        assert_eq!(records[1].customer_age, 41);
        assert_eq!(records[1].rating, Some(3.0));
    }

    #[test]
    fn test_columns_in_any_order() {
        let input = "region,rating,order_id,customer_age,purchase_date,profit,\
                     sales_amount,product_category,extra\n\
                     West,5,A-1,29,2023-12-31,1,2,Toys,ignored\n";
        let records = read_records(input.as_bytes()).unwrap();
        assert_eq!(records[0].order_id, "A-1");
        assert_eq!(records[0].region, "West");
        assert_eq!(records[0].product_category, "Toys");
        assert_eq!(records[0].sales_amount, 2.0);
    }

    #[test]
    fn test_missing_column() {
        let input = "order_id,product_category,sales_amount,profit,purchase_date,\
                     customer_age,region\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn("rating")));
    }

    #[test]
    fn test_invalid_date_reports_line() {
        let err = read(
            "1,Books,10,1,2024-01-01,30,North,4\n\
             2,Books,10,1,not-a-date,30,North,4\n",
        )
        .unwrap_err();

        match err {
            InputError::InvalidDate { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_number() {
        let err = read("1,Books,ten,1,2024-01-01,30,North,4\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::InvalidValue {
                column: "sales_amount",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_rating_is_missing() {
        let records = read("1,Books,10,1,2024-01-01,30,North,\n").unwrap();
        assert_eq!(records[0].rating, None);
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age("34", 2).unwrap(), 34);
        assert_eq!(parse_age("34.0", 2).unwrap(), 34);
        assert!(parse_age("34.5", 2).is_err());
        assert!(parse_age("0", 2).is_err());
        assert!(parse_age("-3", 2).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 4);
        assert_eq!(parse_date("2024-07-04"), expected);
        assert_eq!(parse_date("2024/07/04"), expected);
        assert_eq!(parse_date("07/04/2024"), expected);
        assert_eq!(parse_date("2024-07-04 13:45:00"), expected);
        assert_eq!(parse_date("2024-07-04T13:45:00"), expected);
        assert_eq!(parse_date("July 4th"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_records(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, InputError::Open { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "9,Garden,12.5,3,2024-05-05,52,East,4.1").unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region, "East");
    }

    #[test]
    fn test_load_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sales_sample.csv");
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 12);
        assert!(records.iter().all(|r| r.customer_age > 0));
    }
}
