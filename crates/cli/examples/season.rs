use polars::prelude::*;

fn main() {
    let path = "data/main_data.csv";
    let q = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()
        .unwrap()
        .select(vec![
            col("season"),
            col("casual"),
            col("registered"),
            col("count"),
        ])
        .group_by(vec![col("season")])
        .agg([col("*").mean()]);

    let df = q.collect().unwrap();

    println!("{}", df)
}
