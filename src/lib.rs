//! Loads CSV data and computes per-column summary statistics.
//!
//! ```no_run
//! use datalab::{analyze, Config, TracingLog};
//!
//! let analysis = analyze(&Config::default(), &TracingLog).unwrap();
//! println!("{} records", analysis.result.records());
//! ```

pub mod config;
pub mod csv;
mod error;
pub mod log;
pub mod record;
pub mod report;
mod stats;

use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

pub use config::Config;
pub use error::{Error, Result};
pub use log::{Log, MemoryLog, NullLog, TracingLog};
pub use record::{Cell, Dataset, Record, Value};
pub use stats::{
    aggregate, AggregateResult, ColumnKind, ColumnStatistics, Description, Distribution,
    ElementCount, Summary,
};

/// The outcome of analyzing one file.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// The analyzed file, as given.
    pub file: String,
    #[serde(flatten)]
    pub result: AggregateResult,
    #[serde(skip)]
    pub elapsed: Duration,
    /// Time spent in each step, in order.
    #[serde(skip)]
    pub timings: Vec<(&'static str, Duration)>,
}

/// Analyzes the configured default file.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or aggregated.
pub fn analyze(config: &Config, log: &dyn Log) -> Result<Analysis> {
    analyze_file(config, &config.default_path(), log)
}

/// Analyzes a comma-separated file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or aggregated.
pub fn analyze_path(path: &Path, log: &dyn Log) -> Result<Analysis> {
    analyze_file(&Config::default(), path, log)
}

/// Analyzes the file at `path` with the reader settings of `config`.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or aggregated.
pub fn analyze_file(config: &Config, path: &Path, log: &dyn Log) -> Result<Analysis> {
    let start = Instant::now();
    let reader = csv::Reader::new().with_delimiter(config.delimiter_byte()?);
    let dataset = reader.load(path, log)?;
    let loaded = start.elapsed();
    let result = aggregate(&dataset)?;
    let elapsed = start.elapsed();
    log.info(&format!(
        "analyzed {} records in {}",
        result.records(),
        report::format_duration(elapsed)
    ));
    Ok(Analysis {
        file: path.display().to_string(),
        result,
        elapsed,
        timings: vec![
            ("Load CSV", loaded),
            ("Aggregate", elapsed.saturating_sub(loaded)),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PEOPLE: &str = "name,age,city\nAlice,30,NYC\nBob,25,LA\nCarol,30,NYC\n";

    #[test]
    fn analyze_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("people.csv"), PEOPLE).unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let log = MemoryLog::new();
        let analysis = analyze(&config, &log).unwrap();
        assert_eq!(analysis.result.records(), 3);
        assert!(analysis.file.ends_with("people.csv"));
        assert!(log.entries().iter().any(|(_, m)| m.starts_with("analyzed 3 records")));
    }

    #[test]
    fn analyze_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "x\n1\n2\n3\n4\n").unwrap();

        let analysis = analyze_path(&path, &NullLog).unwrap();
        assert_eq!(analysis.result.records(), 4);
        let x = analysis.result.column("x").unwrap().as_numeric().unwrap();
        assert_eq!(x.get_mean(), Some(2.5));
    }

    #[test]
    fn analyze_with_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("semi.csv"), "a;b\n1;x\n").unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            default_file: "semi.csv".to_string(),
            delimiter: ';',
            ..Config::default()
        };

        let analysis = analyze(&config, &NullLog).unwrap();
        assert_eq!(
            analysis.result.column("b").unwrap().kind(),
            ColumnKind::Categorical
        );
    }

    #[test]
    fn records_match_data_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut text = String::from("id,group\n");
        for i in 0..25 {
            text.push_str(&format!("{},g{}\n", i, i % 4));
        }
        fs::write(&path, text).unwrap();

        let analysis = analyze_path(&path, &NullLog).unwrap();
        assert_eq!(analysis.result.records(), 25);
        let steps: Vec<_> = analysis.timings.iter().map(|(name, _)| *name).collect();
        assert_eq!(steps, ["Load CSV", "Aggregate"]);
        let total: Duration = analysis.timings.iter().map(|(_, d)| *d).sum();
        assert!(total <= analysis.elapsed);
        let group = analysis.result.column("group").unwrap().as_categorical().unwrap();
        assert_eq!(group.total(), 25);
        assert_eq!(group.number_of_elements(), 4);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let log = MemoryLog::new();
        let err = analyze_path(&dir.path().join("nope.csv"), &log).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn json_includes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, PEOPLE).unwrap();

        let analysis = analyze_path(&path, &NullLog).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json["file"].as_str().unwrap().ends_with("people.csv"));
        assert_eq!(json["records"], 3);
        assert_eq!(json["columns"]["city"]["stats"]["LA"], 1);
        assert!(json.get("elapsed").is_none());
    }
}
