use chrono::NaiveDate;
use log::debug;
use polars::lazy::dsl::GetOutput;
use polars::prelude::*;

/// Canonical weekday ordering for the daily summary.
pub const WEEKDAY_ORDER: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Categorical columns a group summary can be keyed by.
pub const GROUP_KEYS: [&str; 6] = [
    "weekday",
    "time_range",
    "season",
    "weathersit",
    "workingday",
    "holiday",
];

/// Inclusive date-range selection. `None` leaves that side unbounded; an
/// inverted range selects nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Scalar totals over the currently selected range, derived from the
/// weekday summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub registered: u64,
    pub casual: u64,
    pub users: u64,
}

impl Totals {
    pub fn from_weekday(summary: &DataFrame) -> PolarsResult<Self> {
        let registered = summary.column("registered")?.sum::<u64>()?;
        let casual = summary.column("casual")?.sum::<u64>()?;
        Ok(Totals {
            registered,
            casual,
            users: registered + casual,
        })
    }
}

/// A date-filtered view over the loaded dataset. Every summary is computed
/// from the filtered rows, never from the full frame.
pub struct RentalFrame<'a> {
    df: &'a DataFrame,
    range: &'a RangeFilter,
}

impl<'a> RentalFrame<'a> {
    pub fn new(df: &'a DataFrame, range: &'a RangeFilter) -> Self {
        RentalFrame { df, range }
    }

    /// Rows whose date lies in `[start, end]`, order preserved.
    pub fn filtered(&self) -> LazyFrame {
        let mut filter_expr = lit(true);

        if let Some(start) = self.range.start {
            filter_expr = filter_expr.and(col("date").gt_eq(lit(start)));
        }
        if let Some(end) = self.range.end {
            filter_expr = filter_expr.and(col("date").lt_eq(lit(end)));
        }

        self.df.clone().lazy().filter(filter_expr)
    }

    pub fn filtered_df(&self) -> PolarsResult<DataFrame> {
        let df = self.filtered().collect()?;
        debug!("range filter kept {} of {} rows", df.height(), self.df.height());
        Ok(df)
    }

    /// Daily weekday summary: resample to one row per calendar day (first
    /// weekday, summed counts), then per weekday sum `casual` and
    /// `registered` but take the mean of `count`. Rows come out in
    /// Monday..Sunday order, days absent from the range are omitted.
    pub fn weekday_summary(&self) -> PolarsResult<DataFrame> {
        let rank = |s: Series| -> PolarsResult<Option<Series>> {
            let ranks: Vec<u32> = s
                .str()?
                .into_iter()
                .map(|day| {
                    WEEKDAY_ORDER
                        .iter()
                        .position(|name| Some(*name) == day)
                        .unwrap_or(WEEKDAY_ORDER.len()) as u32
                })
                .collect();
            Ok(Some(Series::new("weekday_rank", ranks)))
        };
        let o = GetOutput::from_type(DataType::UInt32);

        self.filtered()
            .group_by_stable([col("date")])
            .agg([
                col("weekday").first(),
                col("casual").sum(),
                col("registered").sum(),
                col("count").sum(),
            ])
            .group_by_stable([col("weekday")])
            .agg([
                col("casual").sum(),
                col("registered").sum(),
                col("count").mean(),
            ])
            .with_column(
                col("weekday")
                    .map(rank, o)
                    .alias("weekday_rank")
                    .cast(DataType::UInt32),
            )
            .sort(["weekday_rank"], SortMultipleOptions::default())
            .select([
                col("weekday"),
                col("casual"),
                col("registered"),
                col("count"),
            ])
            .collect()
    }

    /// Per-category means of the raw filtered rows, no daily resampling.
    /// Groups keep encounter order; an empty selection yields zero groups.
    /// `key` must be one of [`GROUP_KEYS`].
    pub fn group_summary(&self, key: &str) -> PolarsResult<DataFrame> {
        if !GROUP_KEYS.contains(&key) {
            return Err(PolarsError::ComputeError(
                format!("not a grouping column: {}", key).into(),
            ));
        }
        self.filtered()
            .group_by_stable([col(key)])
            .agg([
                col("casual").mean(),
                col("registered").mean(),
                col("count").mean(),
            ])
            .collect()
    }

    /// Per-month sums keyed by (year, month), keeping the month's first
    /// date for labeling.
    pub fn month_summary(&self) -> PolarsResult<DataFrame> {
        self.filtered()
            .with_columns([
                col("date").dt().year().cast(DataType::Int32).alias("year"),
                col("date").dt().month().cast(DataType::UInt32).alias("month"),
            ])
            .group_by_stable([col("year"), col("month")])
            .agg([
                col("date").first().alias("month_start"),
                col("casual").sum(),
                col("registered").sum(),
                col("count").sum(),
            ])
            .sort(["year", "month"], SortMultipleOptions::default())
            .collect()
    }

    pub fn totals(&self) -> PolarsResult<Totals> {
        Totals::from_weekday(&self.weekday_summary()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RentalRecord, RentalRecordVec};

    fn record(date: &str, weekday: &str, season: &str, casual: u32, registered: u32) -> RentalRecord {
        RentalRecord {
            date: date.parse().unwrap(),
            weekday: weekday.to_string(),
            time_range: "Morning".to_string(),
            season: season.to_string(),
            weathersit: "Clear".to_string(),
            workingday: "Workingday".to_string(),
            holiday: "Not Holiday".to_string(),
            casual,
            registered,
            count: casual + registered,
        }
    }

    fn week_df() -> DataFrame {
        // one calendar week, 2012-01-02 is a Monday
        RentalRecordVec::new(vec![
            record("2012-01-02", "Monday", "Spring", 10, 90),
            record("2012-01-03", "Tuesday", "Spring", 30, 70),
            record("2012-01-04", "Wednesday", "Summer", 5, 15),
            record("2012-01-05", "Thursday", "Summer", 7, 13),
            record("2012-01-06", "Friday", "Fall", 20, 30),
            record("2012-01-07", "Saturday", "Fall", 40, 10),
            record("2012-01-08", "Sunday", "Winter", 25, 25),
        ])
        .to_df()
        .unwrap()
    }

    #[test]
    fn full_range_filter_is_identity() {
        let df = week_df();
        let range = RangeFilter {
            start: Some("2012-01-02".parse().unwrap()),
            end: Some("2012-01-08".parse().unwrap()),
        };
        let got = RentalFrame::new(&df, &range).filtered_df().unwrap();
        assert!(df.equals(&got));
    }

    #[test]
    fn unbounded_filter_is_identity() {
        let df = week_df();
        let range = RangeFilter::default();
        let got = RentalFrame::new(&df, &range).filtered_df().unwrap();
        assert!(df.equals(&got));
    }

    #[test]
    fn inverted_range_degenerates_to_empty() {
        let df = week_df();
        let range = RangeFilter {
            start: Some("2012-01-08".parse().unwrap()),
            end: Some("2012-01-02".parse().unwrap()),
        };
        let frame = RentalFrame::new(&df, &range);

        assert_eq!(frame.filtered_df().unwrap().height(), 0);
        assert_eq!(frame.weekday_summary().unwrap().height(), 0);
        assert_eq!(frame.group_summary("season").unwrap().height(), 0);
        assert_eq!(frame.month_summary().unwrap().height(), 0);
        assert_eq!(
            frame.totals().unwrap(),
            Totals {
                registered: 0,
                casual: 0,
                users: 0
            }
        );
    }

    #[test]
    fn weekday_summary_mixes_sum_and_mean() {
        // two Mondays and a Tuesday: casual/registered are summed per
        // weekday while count is averaged over the daily rows
        let df = RentalRecordVec::new(vec![
            record("2012-01-02", "Monday", "Spring", 10, 90),
            record("2012-01-09", "Monday", "Spring", 20, 80),
            record("2012-01-03", "Tuesday", "Spring", 30, 70),
        ])
        .to_df()
        .unwrap();
        let range = RangeFilter::default();
        let summary = RentalFrame::new(&df, &range).weekday_summary().unwrap();

        assert_eq!(summary.height(), 2);
        let weekday = summary.column("weekday").unwrap();
        assert_eq!(weekday.str().unwrap().get(0), Some("Monday"));
        assert_eq!(weekday.str().unwrap().get(1), Some("Tuesday"));

        let casual = summary.column("casual").unwrap().i64().unwrap();
        let registered = summary.column("registered").unwrap().i64().unwrap();
        let count = summary.column("count").unwrap().f64().unwrap();
        assert_eq!(casual.get(0), Some(30));
        assert_eq!(registered.get(0), Some(170));
        assert_eq!(count.get(0), Some(100.0));
        assert_eq!(casual.get(1), Some(30));
        assert_eq!(registered.get(1), Some(70));
        assert_eq!(count.get(1), Some(100.0));
    }

    #[test]
    fn weekday_summary_resamples_same_day_rows() {
        // two records on the same Monday collapse to one daily row first,
        // so the count mean is taken over days, not raw rows
        let df = RentalRecordVec::new(vec![
            record("2012-01-02", "Monday", "Spring", 10, 90),
            record("2012-01-02", "Monday", "Spring", 20, 80),
            record("2012-01-09", "Monday", "Spring", 5, 15),
        ])
        .to_df()
        .unwrap();
        let range = RangeFilter::default();
        let summary = RentalFrame::new(&df, &range).weekday_summary().unwrap();

        assert_eq!(summary.height(), 1);
        assert_eq!(summary.column("casual").unwrap().i64().unwrap().get(0), Some(35));
        assert_eq!(
            summary.column("registered").unwrap().i64().unwrap().get(0),
            Some(185)
        );
        // daily counts are 200 and 20
        assert_eq!(summary.column("count").unwrap().f64().unwrap().get(0), Some(110.0));
    }

    #[test]
    fn weekday_summary_follows_canonical_order() {
        let df = week_df();
        let range = RangeFilter::default();
        let summary = RentalFrame::new(&df, &range).weekday_summary().unwrap();

        let got: Vec<&str> = summary
            .column("weekday")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(got, WEEKDAY_ORDER.to_vec());
    }

    #[test]
    fn season_summary_averages_each_column() {
        let df = week_df();
        let range = RangeFilter::default();
        let summary = RentalFrame::new(&df, &range)
            .group_summary("season")
            .unwrap();

        assert_eq!(summary.height(), 4);
        // encounter order: Spring, Summer, Fall, Winter
        let season = summary.column("season").unwrap();
        assert_eq!(season.str().unwrap().get(0), Some("Spring"));
        let casual = summary.column("casual").unwrap().f64().unwrap();
        let registered = summary.column("registered").unwrap().f64().unwrap();
        let count = summary.column("count").unwrap().f64().unwrap();
        // Spring rows: casual 10/30, registered 90/70, count 100/100
        assert_eq!(casual.get(0), Some(20.0));
        assert_eq!(registered.get(0), Some(80.0));
        assert_eq!(count.get(0), Some(100.0));
    }

    #[test]
    fn group_summary_rejects_non_categorical_keys() {
        let df = week_df();
        let range = RangeFilter::default();
        let frame = RentalFrame::new(&df, &range);

        assert!(frame.group_summary("casual").is_err());
        assert!(frame.group_summary("date").is_err());
        for key in GROUP_KEYS {
            assert!(frame.group_summary(key).is_ok());
        }
    }

    #[test]
    fn month_summary_sums_per_month_and_keeps_labels() {
        let df = RentalRecordVec::new(vec![
            record("2012-01-02", "Monday", "Spring", 10, 90),
            record("2012-01-09", "Monday", "Spring", 20, 80),
            record("2012-02-06", "Monday", "Spring", 30, 70),
        ])
        .to_df()
        .unwrap();
        let range = RangeFilter::default();
        let frame = RentalFrame::new(&df, &range);
        let summary = frame.month_summary().unwrap();

        assert_eq!(summary.height(), 2);
        let year = summary.column("year").unwrap().i32().unwrap();
        let month = summary.column("month").unwrap().u32().unwrap();
        assert_eq!(year.get(0), Some(2012));
        assert_eq!(month.get(0), Some(1));
        assert_eq!(month.get(1), Some(2));

        let casual = summary.column("casual").unwrap().i64().unwrap();
        let count = summary.column("count").unwrap().i64().unwrap();
        assert_eq!(casual.get(0), Some(30));
        assert_eq!(casual.get(1), Some(30));
        assert_eq!(count.get(0), Some(200));
        assert_eq!(count.get(1), Some(100));

        // per-month sums add up to the full-range totals
        let totals = frame.totals().unwrap();
        let month_count: i64 = count.get(0).unwrap() + count.get(1).unwrap();
        assert_eq!(totals.users as i64, month_count);
    }

    #[test]
    fn totals_preserve_count_identity() {
        let df = week_df();
        let range = RangeFilter::default();
        let totals = RentalFrame::new(&df, &range).totals().unwrap();

        assert_eq!(totals.casual, 137);
        assert_eq!(totals.registered, 253);
        assert_eq!(totals.users, totals.casual + totals.registered);
    }
}
