//! Human-readable reports of an `Analysis`.

use chrono::{Local, NaiveDateTime};
use itertools::Itertools;
use num_traits::ToPrimitive;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::stats::{Description, Distribution, Summary};
use crate::Analysis;

const WIDTH: usize = 70;
const LABEL_WIDTH: usize = 20;
const OPERATION_WIDTH: usize = 40;

#[must_use]
pub fn format_number(x: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, x)
}

/// Formats `amount` with thousands separators followed by `currency`, e.g.
/// `45,000.50 EUR`.
#[must_use]
pub fn format_currency(amount: f64, currency: &str, decimals: usize) -> String {
    let formatted = format_number(amount, decimals);
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (whole, fraction) = unsigned.split_at(unsigned.find('.').unwrap_or(unsigned.len()));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}{} {}", sign, grouped, fraction, currency)
}

/// Formats `part / total` as a percentage. A zero total, or one that has no
/// `f64` representation, gives 0%.
#[must_use]
pub fn format_percentage<T: ToPrimitive>(part: T, total: T, decimals: usize) -> String {
    let ratio = match (part.to_f64(), total.to_f64()) {
        (Some(p), Some(t)) if t != 0.0 => p / t * 100.0,
        _ => 0.0,
    };
    format!("{:.*}%", decimals, ratio)
}

/// Formats a duration as `1.50s`, `1m 30s` or `1h 5m`.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.2}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, secs % 3600 / 60)
    }
}

/// Joins `items` with `separator`, using `final_separator` before the last
/// one: `a, b and c`.
#[must_use]
pub fn format_list<T: fmt::Display>(
    items: &[T],
    separator: &str,
    final_separator: &str,
) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!(
            "{}{}{}",
            init.iter().join(separator),
            final_separator,
            last
        ),
    }
}

/// Shortens `text` to at most `max` characters, ending in `...` if cut.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(SUFFIX.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(SUFFIX);
    out
}

/// A text report of an `Analysis`, rendered through `Display`.
pub struct Report<'a> {
    analysis: &'a Analysis,
    title: &'a str,
    decimals: usize,
    currency: &'a str,
    currency_columns: &'a [String],
    generated: NaiveDateTime,
}

impl<'a> Report<'a> {
    /// Creates a report stamped with the current local time.
    #[must_use]
    pub fn new(analysis: &'a Analysis, title: &'a str) -> Self {
        Self {
            analysis,
            title,
            decimals: 2,
            currency: "",
            currency_columns: &[],
            generated: Local::now().naive_local(),
        }
    }

    /// Takes the number format and currency settings from `config`.
    #[must_use]
    pub fn with_config(self, config: &'a Config) -> Self {
        self.decimals(config.decimal_places)
            .currency(&config.currency, &config.currency_columns)
    }

    #[must_use]
    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Reports the numeric `columns` as whole amounts of `currency`.
    #[must_use]
    pub fn currency(mut self, currency: &'a str, columns: &'a [String]) -> Self {
        self.currency = currency;
        self.currency_columns = columns;
        self
    }

    #[must_use]
    pub fn generated_at(mut self, generated: NaiveDateTime) -> Self {
        self.generated = generated;
        self
    }

    fn write_description(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        d: &Description,
    ) -> fmt::Result {
        let (mean, min, max) = match (d.get_mean(), d.get_min(), d.get_max()) {
            (Some(mean), Some(min), Some(max)) => (mean, min, max),
            _ => return writeln!(f, "{}: no numeric values", name),
        };
        let s_deviation = d.get_s_deviation().unwrap_or_default();
        if self.currency_columns.iter().any(|c| c == name) {
            let amount = |x: f64| format_currency(x, self.currency, 0);
            writeln!(
                f,
                "{}: count {}, mean {}, min {}, max {}, std {}",
                name,
                d.get_count(),
                amount(mean),
                amount(min.as_f64().unwrap_or(mean)),
                amount(max.as_f64().unwrap_or(mean)),
                amount(s_deviation),
            )
        } else {
            writeln!(
                f,
                "{}: count {}, mean {}, min {}, max {}, std {}",
                name,
                d.get_count(),
                format_number(mean, self.decimals),
                min,
                max,
                format_number(s_deviation, self.decimals),
            )
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(WIDTH);
        let light = "-".repeat(WIDTH);
        let result = &self.analysis.result;

        writeln!(f, "{}", heavy)?;
        writeln!(f, " {}", self.title)?;
        writeln!(f, "{}", heavy)?;
        writeln!(f, "Generated: {}", self.generated.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f)?;
        writeln!(f, "Data Source: {}", self.analysis.file)?;
        writeln!(f, "Total Records: {}", result.records())?;
        let names: Vec<_> = result.columns().iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "Columns: {}", format_list(&names, ", ", " and "))?;

        let numeric: Vec<_> = result
            .columns()
            .iter()
            .filter_map(|c| c.summary.as_numeric().map(|d| (c.name.as_str(), d)))
            .collect();
        if !numeric.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", light)?;
            writeln!(f, " Numeric Columns")?;
            writeln!(f, "{}", light)?;
            for (name, description) in numeric {
                self.write_description(f, name, description)?;
            }
        }

        for column in result.columns() {
            if let Summary::Categorical(distribution) = &column.summary {
                writeln!(f)?;
                writeln!(f, "{}", light)?;
                writeln!(f, " Distribution: {}", column.name)?;
                writeln!(f, "{}", light)?;
                write_distribution(f, distribution)?;
            }
        }

        writeln!(f, "{}", heavy)?;
        write!(
            f,
            "Analysis completed in {}",
            format_duration(self.analysis.elapsed)
        )
    }
}

fn write_distribution(f: &mut fmt::Formatter<'_>, distribution: &Distribution) -> fmt::Result {
    let total = distribution.total();
    for e in distribution.top_n(distribution.number_of_elements()) {
        writeln!(
            f,
            "  {:.<width$} {:>5} ({:>6})",
            truncate(&e.value, LABEL_WIDTH),
            e.count,
            format_percentage(e.count, total, 1),
            width = LABEL_WIDTH,
        )?;
    }
    Ok(())
}

/// A table of how long each named operation took, with its share of the
/// total.
pub struct PerformanceSummary<'a> {
    operations: &'a [(&'a str, Duration)],
}

impl<'a> PerformanceSummary<'a> {
    #[must_use]
    pub fn new(operations: &'a [(&'a str, Duration)]) -> Self {
        Self { operations }
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.operations.iter().map(|(_, d)| *d).sum()
    }
}

impl fmt::Display for PerformanceSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(WIDTH);
        let total = self.total();

        writeln!(f)?;
        writeln!(f, "{}", heavy)?;
        writeln!(f, " Performance Summary")?;
        writeln!(f, "{}", heavy)?;
        for (operation, duration) in self.operations {
            writeln!(
                f,
                "  {:.<width$} {:>10} ({:>6})",
                operation,
                format_duration(*duration),
                format_percentage(duration.as_secs_f64(), total.as_secs_f64(), 1),
                width = OPERATION_WIDTH,
            )?;
        }
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        writeln!(
            f,
            "  {:.<width$} {:>10}",
            "Total Time",
            format_duration(total),
            width = OPERATION_WIDTH,
        )?;
        write!(f, "{}", heavy)
    }
}

/// Writes `report` into `dir`, creating it if needed. Without a `name` the
/// file is called `report_<timestamp>.txt`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written.
pub fn save(report: &str, dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let name = name.map_or_else(
        || format!("report_{}.txt", Local::now().format("%Y%m%d_%H%M%S")),
        str::to_string,
    );
    let path = dir.join(name);
    fs::write(&path, report).map_err(|e| Error::io(&path, e))?;
    Ok(path)
}
