use serde::Deserialize;
use std::fs::File;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub output: String,
    pub dataset: String,
}

impl Config {
    // config is required at startup, a missing or malformed file is fatal
    pub fn new(filename: &str) -> Config {
        let reader = File::open(filename).unwrap();
        let config: Config = serde_yaml::from_reader(reader).unwrap();
        config
    }
}
