use itertools::Itertools;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use statistical::population_standard_deviation;
use std::collections::HashMap;
use strum_macros::Display;

use crate::error::{Error, Result};
use crate::record::{Cell, Dataset, Value};

/// How a column was classified after looking at every value in it.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Summary statistics of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    records: usize,
    #[serde(serialize_with = "serialize_columns")]
    columns: Vec<ColumnStatistics>,
}

impl AggregateResult {
    /// Returns the number of records aggregated.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Returns per-column statistics in header order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnStatistics] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Summary> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.summary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub name: String,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "stats", rename_all = "lowercase")]
pub enum Summary {
    Numeric(Description),
    Categorical(Distribution),
}

impl Summary {
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }

    #[must_use]
    pub fn as_numeric(&self) -> Option<&Description> {
        match self {
            Self::Numeric(d) => Some(d),
            Self::Categorical(_) => None,
        }
    }

    #[must_use]
    pub fn as_categorical(&self) -> Option<&Distribution> {
        match self {
            Self::Categorical(d) => Some(d),
            Self::Numeric(_) => None,
        }
    }
}

/// Statistics of a numeric column. Everything but `count` is `None` when the
/// column has no numeric values.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Description {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    s_deviation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<Value>,
}

impl Description {
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn get_mean(&self) -> Option<f64> {
        self.mean
    }

    /// Population standard deviation.
    #[must_use]
    pub fn get_s_deviation(&self) -> Option<f64> {
        self.s_deviation
    }

    #[must_use]
    pub fn get_min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    #[must_use]
    pub fn get_max(&self) -> Option<&Value> {
        self.max.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementCount {
    pub value: String,
    pub count: usize,
}

/// Occurrence counts of the distinct values of a categorical column, in the
/// order the values were first seen.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Distribution {
    counts: Vec<ElementCount>,
}

impl Distribution {
    #[must_use]
    pub fn counts(&self) -> &[ElementCount] {
        &self.counts
    }

    #[must_use]
    pub fn get(&self, value: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.count)
    }

    /// Returns the number of distinct values.
    #[must_use]
    pub fn number_of_elements(&self) -> usize {
        self.counts.len()
    }

    /// Returns the number of non-missing values counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().map(|e| e.count).sum()
    }

    /// Returns the `n` most frequent values. Ties keep first-seen order.
    #[must_use]
    pub fn top_n(&self, n: usize) -> Vec<&ElementCount> {
        self.counts
            .iter()
            .sorted_by(|a, b| b.count.cmp(&a.count))
            .take(n)
            .collect()
    }

    #[must_use]
    pub fn mode(&self) -> Option<&str> {
        self.top_n(1).first().map(|e| e.value.as_str())
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for e in &self.counts {
            map.serialize_entry(&e.value, &e.count)?;
        }
        map.end()
    }
}

fn serialize_columns<S: Serializer>(
    columns: &[ColumnStatistics],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(columns.len()))?;
    for c in columns {
        map.serialize_entry(&c.name, &c.summary)?;
    }
    map.end()
}

/// Running state for one column. Both the numeric and the categorical view
/// are kept until the column is classified.
#[derive(Default)]
struct Accumulator {
    count: usize,
    mean: f64,
    min: Option<Value>,
    max: Option<Value>,
    values: Vec<f64>,
    has_text: bool,
    counts: Vec<ElementCount>,
    index: HashMap<String, usize>,
}

impl Accumulator {
    fn push(&mut self, cell: &Cell) {
        let value = cell.value();
        match value {
            Value::Missing => return,
            Value::Int(_) | Value::Float(_) => {
                if let Some(v) = value.as_f64() {
                    self.count += 1;
                    #[allow(clippy::cast_precision_loss)] // 52-bit precision is good enough
                    let n = self.count as f64;
                    // Divided before subtracting so huge values cannot overflow.
                    self.mean += v / n - self.mean / n;
                    self.values.push(v);
                    if self.min.as_ref().and_then(Value::as_f64).map_or(true, |m| v < m) {
                        self.min = Some(value.clone());
                    }
                    if self.max.as_ref().and_then(Value::as_f64).map_or(true, |m| v > m) {
                        self.max = Some(value.clone());
                    }
                }
            }
            Value::Text(_) => self.has_text = true,
        }
        self.tally(cell.text());
    }

    fn tally(&mut self, key: &str) {
        if let Some(&i) = self.index.get(key) {
            self.counts[i].count += 1;
        } else {
            self.index.insert(key.to_string(), self.counts.len());
            self.counts.push(ElementCount {
                value: key.to_string(),
                count: 1,
            });
        }
    }

    fn finish(self) -> Summary {
        if self.has_text {
            return Summary::Categorical(Distribution {
                counts: self.counts,
            });
        }
        if self.count == 0 {
            return Summary::Numeric(Description::default());
        }

        let (lo, hi) = (
            self.min.as_ref().and_then(Value::as_f64).unwrap_or(self.mean),
            self.max.as_ref().and_then(Value::as_f64).unwrap_or(self.mean),
        );
        // Rounding can push the mean just outside [min, max].
        let mean = self.mean.max(lo).min(hi);
        Summary::Numeric(Description {
            count: self.count,
            mean: Some(mean),
            s_deviation: Some(s_deviation(&self.values, mean, lo.abs().max(hi.abs()))),
            min: self.min,
            max: self.max,
        })
    }
}

/// Population standard deviation of `values` scaled into [-1, 1] by `scale`,
/// so that squared deviations stay finite.
fn s_deviation(values: &[f64], mean: f64, scale: f64) -> f64 {
    if scale == 0.0 {
        return 0.0;
    }
    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    population_standard_deviation(&scaled, Some(mean / scale)) * scale
}

/// Computes summary statistics over `dataset` in a single pass.
///
/// A column is numeric if none of its non-missing values is text. Missing
/// values are skipped: they are neither counted nor used for classification.
///
/// # Errors
///
/// Returns `Error::InvariantViolation` if a record does not have exactly one
/// value per column.
pub fn aggregate(dataset: &Dataset) -> Result<AggregateResult> {
    let columns = dataset.columns();
    let mut accumulators: Vec<Accumulator> =
        columns.iter().map(|_| Accumulator::default()).collect();

    for (i, record) in dataset.records().enumerate() {
        if record.len() != columns.len() {
            return Err(Error::InvariantViolation(format!(
                "record {} has {} values for {} columns",
                i + 1,
                record.len(),
                columns.len()
            )));
        }
        for (acc, cell) in accumulators.iter_mut().zip(record.cells()) {
            acc.push(cell);
        }
    }

    Ok(AggregateResult {
        records: dataset.len(),
        columns: columns
            .iter()
            .zip(accumulators)
            .map(|(name, acc)| ColumnStatistics {
                name: name.clone(),
                summary: acc.finish(),
            })
            .collect(),
    })
}
