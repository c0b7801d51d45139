use chrono::NaiveDate;
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io::Cursor;

/// Columns every rental dataset must provide, in record order.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "date",
    "weekday",
    "time_range",
    "season",
    "weathersit",
    "workingday",
    "holiday",
    "casual",
    "registered",
    "count",
];

// days from 0000-12-31 (CE) to 1970-01-01, the Date dtype epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One rental-activity observation. `count` is expected to equal
/// `casual + registered`; the loader does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalRecord {
    pub date: NaiveDate,
    pub weekday: String,
    pub time_range: String,
    pub season: String,
    pub weathersit: String,
    pub workingday: String,
    pub holiday: String,
    pub casual: u32,
    pub registered: u32,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct RentalRecordVec {
    pub records: Vec<RentalRecord>,
}

impl RentalRecordVec {
    pub fn new(records: Vec<RentalRecord>) -> Self {
        RentalRecordVec { records }
    }

    /// Serialize the records to an in-memory csv so polars can re-read them
    /// with its own schema inference.
    pub fn file_cursor(&self) -> Result<Cursor<Vec<u8>>, Box<dyn Error>> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        wtr.write_record(REQUIRED_COLUMNS)?;
        for record in &self.records {
            wtr.serialize(record)?;
        }
        let buf = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(Cursor::new(buf))
    }

    pub fn to_df(&self) -> Result<DataFrame, Box<dyn Error>> {
        let file = self.file_cursor()?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|s| s.with_try_parse_dates(true))
            .into_reader_with_file_handle(file)
            .finish()?;
        Ok(df)
    }
}

/// Load the rental dataset from a csv file, sorted ascending by date.
///
/// Fails when the file is missing, a required column is absent or the date
/// column does not parse to a calendar date. Count values pass through
/// unvalidated.
pub fn load_dataset(path: &str) -> Result<DataFrame, Box<dyn Error>> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()?
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;
    ensure_schema(&df)?;
    debug!("loaded {} rows from {}", df.height(), path);
    Ok(df)
}

fn ensure_schema(df: &DataFrame) -> Result<(), Box<dyn Error>> {
    for name in REQUIRED_COLUMNS {
        df.column(name)?;
    }
    if df.column("date")?.dtype() != &DataType::Date {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "date column did not parse as calendar dates",
        )));
    }
    Ok(())
}

/// First and last calendar date of the dataset, the selectable range.
pub fn date_bounds(df: &DataFrame) -> Result<(NaiveDate, NaiveDate), Box<dyn Error>> {
    let date = df.column("date")?.date()?;
    let to_date = |days: i32| NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE);
    match (
        date.min().and_then(to_date),
        date.max().and_then(to_date),
    ) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "dataset has no dates",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, weekday: &str, casual: u32, registered: u32) -> RentalRecord {
        RentalRecord {
            date: date.parse().unwrap(),
            weekday: weekday.to_string(),
            time_range: "Morning".to_string(),
            season: "Spring".to_string(),
            weathersit: "Clear".to_string(),
            workingday: "Workingday".to_string(),
            holiday: "Not Holiday".to_string(),
            casual,
            registered,
            count: casual + registered,
        }
    }

    #[test]
    fn to_df_parses_dates_and_counts() {
        let records = RentalRecordVec::new(vec![
            record("2011-01-01", "Saturday", 331, 654),
            record("2011-01-02", "Sunday", 131, 670),
        ]);
        let df = records.to_df().unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("casual").unwrap().i64().unwrap().get(0), Some(331));
        assert_eq!(
            df.column("weekday").unwrap().str().unwrap().get(1),
            Some("Sunday")
        );
    }

    #[test]
    fn schema_check_rejects_missing_column() {
        let records = RentalRecordVec::new(vec![record("2011-01-01", "Saturday", 331, 654)]);
        let df = records.to_df().unwrap().drop("weathersit").unwrap();
        assert!(ensure_schema(&df).is_err());
    }

    #[test]
    fn schema_check_rejects_unparsed_dates() {
        // read the same rows without date parsing, date stays a string
        let records = RentalRecordVec::new(vec![record("2011-01-01", "Saturday", 331, 654)]);
        let file = records.file_cursor().unwrap();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(file)
            .finish()
            .unwrap();

        assert_eq!(df.column("date").unwrap().dtype(), &DataType::String);
        assert!(ensure_schema(&df).is_err());
    }

    #[test]
    fn load_dataset_fails_on_missing_file() {
        assert!(load_dataset("no-such-file.csv").is_err());
    }

    #[test]
    fn date_bounds_cover_full_range() {
        let records = RentalRecordVec::new(vec![
            record("2011-01-01", "Saturday", 1, 2),
            record("2012-12-31", "Monday", 3, 4),
            record("2011-06-15", "Wednesday", 5, 6),
        ]);
        let df = records.to_df().unwrap();
        let (min, max) = date_bounds(&df).unwrap();

        assert_eq!(min, "2011-01-01".parse::<NaiveDate>().unwrap());
        assert_eq!(max, "2012-12-31".parse::<NaiveDate>().unwrap());
    }
}
