use dataset::record;
use dataset::summary::{RangeFilter, RentalFrame};
use ui::data::Data;

use chrono::NaiveDate;
use clap::builder::PossibleValuesParser;
use clap::Parser;
use env_logger::Env;
use polars::prelude::*;
use std::error::Error;

use log::{debug, error, info};

enum OutputType {
    CSV,
    TABLE,
    POLAR,
}

impl OutputType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(OutputType::CSV),
            "table" => Some(OutputType::TABLE),
            "polar" => Some(OutputType::POLAR),
            _ => None,
        }
    }
}

/// Which summary table to report.
#[derive(Debug, Clone, Copy)]
enum Report {
    Weekday,
    WeekdayAvg,
    TimeRange,
    Season,
    Weathersit,
    Workingday,
    Holiday,
    Monthly,
}

impl Report {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "weekday" => Some(Report::Weekday),
            "weekday-avg" => Some(Report::WeekdayAvg),
            "time-range" => Some(Report::TimeRange),
            "season" => Some(Report::Season),
            "weathersit" => Some(Report::Weathersit),
            "workingday" => Some(Report::Workingday),
            "holiday" => Some(Report::Holiday),
            "monthly" => Some(Report::Monthly),
            _ => None,
        }
    }

    // grouping column of the summary table
    fn key(&self) -> &'static str {
        match self {
            Report::Weekday | Report::WeekdayAvg => "weekday",
            Report::TimeRange => "time_range",
            Report::Season => "season",
            Report::Weathersit => "weathersit",
            Report::Workingday => "workingday",
            Report::Holiday => "holiday",
            Report::Monthly => "month",
        }
    }
}

trait Output {
    fn output(&self) -> Result<(), Box<dyn Error>>;
}

struct PolarOutput {
    df: DataFrame,
}

impl PolarOutput {
    fn new(df: DataFrame) -> Self {
        PolarOutput { df }
    }
}

impl Output for PolarOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        println!("{}", self.df);
        Ok(())
    }
}

struct CsvOutput {
    filename: String,
    df: DataFrame,
}

impl CsvOutput {
    fn new(filename: String, df: DataFrame) -> Self {
        CsvOutput { filename, df }
    }
}

impl Output for CsvOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        let mut file = std::fs::File::create(&self.filename)?;
        let mut m_df = self.df.clone();
        CsvWriter::new(&mut file).finish(&mut m_df)?;
        Ok(())
    }
}

struct TableOutput {
    df: DataFrame,
    report: Report,
}

impl TableOutput {
    fn new(df: DataFrame, report: Report) -> Self {
        TableOutput { df, report }
    }
}

impl Output for TableOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        let data_vec = report_rows(&self.df, self.report)?;
        ui::tui::run(data_vec)
    }
}

fn report_rows(df: &DataFrame, report: Report) -> Result<Vec<Data>, Box<dyn Error>> {
    match report {
        Report::Monthly => month_data_vec(df),
        _ => convert_df_to_data_vec(df, report.key()),
    }
}

fn convert_df_to_data_vec(df: &DataFrame, key: &str) -> Result<Vec<Data>, Box<dyn Error>> {
    let mut d = df.clone();
    d.rename(key, "label")?;
    let mut d = d.select(["label", "casual", "registered", "count"])?;

    let mut j = Vec::<u8>::new();
    JsonWriter::new(&mut j)
        .with_json_format(JsonFormat::Json)
        .finish(&mut d)?;
    let rows = serde_json::from_slice::<Vec<Data>>(&j)?;
    Ok(rows)
}

// monthly rows carry a (year, month) key, label them "January 2012" style
fn month_data_vec(df: &DataFrame) -> Result<Vec<Data>, Box<dyn Error>> {
    let years = df.column("year")?.i32()?;
    let months = df.column("month")?.u32()?;
    let casual = df.column("casual")?.i64()?;
    let registered = df.column("registered")?.i64()?;
    let count = df.column("count")?.i64()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let label = match (years.get(i), months.get(i)) {
            (Some(year), Some(month)) => format!("{} {}", month_name(month), year),
            _ => String::new(),
        };
        rows.push(Data {
            label,
            casual: casual.get(i).map(|v| v.to_string()).unwrap_or_default(),
            registered: registered.get(i).map(|v| v.to_string()).unwrap_or_default(),
            count: count.get(i).map(|v| v.to_string()).unwrap_or_default(),
        });
    }
    Ok(rows)
}

fn month_name(month: u32) -> &'static str {
    chrono::Month::try_from(month as u8)
        .map(|m| m.name())
        .unwrap_or("unknown")
}

/// Rental statistics over a date range of the bike-sharing dataset
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(
        short = 'c',
        long = "config",
        default_value = ".bike-stat.yml",
        help = "config file"
    )]
    config: String,

    #[arg(long = "source", help = "dataset csv, overrides the configured path")]
    source: Option<String>,

    #[arg(
        short = 'F',
        long = "format",
        value_parser = PossibleValuesParser::new(["csv", "table", "polar"]),
        help = "output format, defaults to the configured output"
    )]
    format: Option<String>,

    #[arg(
        short = 'R',
        long = "report",
        value_parser = PossibleValuesParser::new([
            "weekday",
            "weekday-avg",
            "time-range",
            "season",
            "weathersit",
            "workingday",
            "holiday",
            "monthly",
        ]),
        default_value = "weekday",
        help = "summary table to report"
    )]
    report: String,

    #[arg(
        long = "detail",
        help = "keep the filtered rows as a csv file, e.g. --detail detail.csv"
    )]
    detail: Option<String>,

    #[arg(long = "no-detail", action=clap::ArgAction::SetTrue, help="do not keep the filtered csv, ignore --detail if this is set")]
    no_detail: bool,

    /// since date
    #[arg(long = "since", value_parser = parse_date, help = "start of the range, 2011-01-01")]
    since: Option<NaiveDate>,

    /// until date
    #[arg(long = "until", value_parser = parse_date, help = "end of the range, 2012-12-31")]
    until: Option<NaiveDate>,
}

fn parse_date(s: &str) -> Result<NaiveDate, Box<std::io::Error>> {
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) => Ok(d),
        Err(e) => {
            error!("parse date err: {}", e);
            Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Invalid date format",
            )))
        }
    }
}

// --format wins over the configured output; an unknown value is rejected
// here, before any dataset work happens
fn resolve_output(format: Option<String>, default: String) -> Option<OutputType> {
    OutputType::from_str(format.unwrap_or(default).as_str())
}

fn get_output(output_type: OutputType, df: DataFrame, report: Report) -> Box<dyn Output> {
    match output_type {
        OutputType::TABLE => Box::new(TableOutput::new(df, report)),
        OutputType::CSV => Box::new(CsvOutput::new(String::from("report.csv"), df)),
        OutputType::POLAR => Box::new(PolarOutput::new(df)),
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let conf = config::Config::new(&args.config);

    let out_type =
        resolve_output(args.format.clone(), conf.output).expect("output not match");

    let source = args.source.clone().unwrap_or(conf.dataset);
    let df = record::load_dataset(&source).expect("load dataset failed");
    let (min_date, max_date) =
        record::date_bounds(&df).expect("dataset date bounds failed");
    info!(
        "dataset: {} rows, {} .. {}",
        df.height(),
        min_date,
        max_date
    );

    // the selection is clamped to the dataset's own date bounds
    let range = RangeFilter {
        start: Some(args.since.unwrap_or(min_date).max(min_date)),
        end: Some(args.until.unwrap_or(max_date).min(max_date)),
    };
    debug!("range filter: {:?}", range);
    let frame = RentalFrame::new(&df, &range);

    if !args.no_detail {
        let detail_file = args.detail.clone().unwrap_or("detail.csv".to_string());
        info!("detail csv file: {}", detail_file);
        let filtered = frame.filtered_df().expect("range filter failed");
        CsvOutput::new(detail_file, filtered)
            .output()
            .expect("detail csv output failed");
    }

    let totals = frame.totals().expect("totals failed");
    println!("Total registered users: {}", totals.registered);
    println!("Total casual users: {}", totals.casual);
    println!("Total users: {}", totals.users);

    let report = Report::from_str(args.report.as_str()).expect("report not match");
    let summary = match report {
        Report::Weekday => frame.weekday_summary(),
        Report::Monthly => frame.month_summary(),
        _ => frame.group_summary(report.key()),
    }
    .expect("summary failed");

    get_output(out_type, summary, report).output().expect("output failed");
}
