use csv_core::ReadRecordResult;
use std::fs;
use std::path::Path;
use std::str;

use crate::error::{Error, Result};
use crate::log::Log;
use crate::record::{check_header, Cell, Dataset};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// A raw CSV record: unescaped field bytes and the end offset of each field.
pub struct Row {
    fields: Vec<u8>,
    ends: Vec<usize>,
}

impl Row {
    /// Reads the next record from `input`. Returns the record and the number
    /// of bytes consumed, or `None` once the input is exhausted.
    #[must_use]
    pub fn next(reader: &mut csv_core::Reader, input: &[u8]) -> Option<(Self, usize)> {
        let mut fields = vec![0_u8; 64];
        let mut ends = vec![0_usize; 8];
        let (mut cur, mut outlen, mut endlen) = (0, 0, 0);
        loop {
            let (res, nin, nout, nend) =
                reader.read_record(&input[cur..], &mut fields[outlen..], &mut ends[endlen..]);
            cur += nin;
            outlen += nout;
            endlen += nend;
            match res {
                // An empty slice on the next call tells the reader the input ended.
                ReadRecordResult::InputEmpty => continue,
                ReadRecordResult::OutputFull => {
                    let len = fields.len();
                    fields.resize(len * 2, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = ends.len();
                    ends.resize(len * 2, 0);
                }
                ReadRecordResult::Record => {
                    fields.truncate(outlen);
                    ends.truncate(endlen);
                    return Some((Self { fields, ends }, cur));
                }
                ReadRecordResult::End => return None,
            }
        }
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        let end = match self.ends.get(i) {
            None => return None,
            Some(&end) => end,
        };
        let start = match i.checked_sub(1).and_then(|i| self.ends.get(i)) {
            None => 0,
            Some(&start) => start,
        };
        Some(&self.fields[start..end])
    }

    /// Decodes every field as UTF-8.
    fn to_strings(&self, row: usize) -> Result<Vec<&str>> {
        (0..self.len())
            .map(|i| {
                str::from_utf8(self.get(i).unwrap_or_default())
                    .map_err(|e| Error::schema(row, format!("field {} is not UTF-8: {}", i + 1, e)))
            })
            .collect()
    }
}

/// CSV reader producing a `Dataset`.
#[derive(Clone, Copy, Debug)]
pub struct Reader {
    delimiter: u8,
}

impl Default for Reader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl Reader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Reads the file at `path` in one go and parses it.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `path` does not exist, `Error::Io` if it
    /// cannot be read, or any error `parse` returns.
    pub fn load(&self, path: &Path, log: &dyn Log) -> Result<Dataset> {
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        let dataset = self.parse(&data, log)?;
        log.info(&format!(
            "loaded {} records from {}",
            dataset.len(),
            path.display()
        ));
        Ok(dataset)
    }

    /// Parses CSV text whose first record is the header.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if the header is missing or has duplicate
    /// names, a row has a different number of fields than the header, or a
    /// field is not valid UTF-8.
    pub fn parse(&self, input: &[u8], log: &dyn Log) -> Result<Dataset> {
        let mut input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        let mut reader = csv_core::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .build();

        let (header, consumed) =
            Row::next(&mut reader, input).ok_or_else(|| Error::schema(0, "missing header row"))?;
        input = &input[consumed..];
        let columns: Vec<String> = header
            .to_strings(0)?
            .into_iter()
            .map(str::to_string)
            .collect();
        check_header(&columns)?;

        let mut rows = Vec::new();
        let mut missing = vec![0_usize; columns.len()];
        while let Some((row, consumed)) = Row::next(&mut reader, input) {
            input = &input[consumed..];
            let index = rows.len() + 1;
            if row.len() != columns.len() {
                return Err(Error::schema(
                    index,
                    format!("expected {} fields, found {}", columns.len(), row.len()),
                ));
            }
            let cells: Vec<Cell> = row
                .to_strings(index)?
                .into_iter()
                .map(Cell::new)
                .collect();
            for (count, cell) in missing.iter_mut().zip(cells.iter()) {
                if cell.value().is_missing() {
                    *count += 1;
                }
            }
            rows.push(cells);
        }

        for (name, &count) in columns.iter().zip(missing.iter()) {
            if count > 0 {
                log.warn(&format!(
                    "column `{}` has {} missing value{}",
                    name,
                    count,
                    if count == 1 { "" } else { "s" }
                ));
            }
        }
        Dataset::new(columns, rows)
    }
}

/// Loads a comma-separated file with the default `Reader`.
///
/// # Errors
///
/// See `Reader::load`.
pub fn load(path: &Path, log: &dyn Log) -> Result<Dataset> {
    Reader::default().load(path, log)
}

/// Parses comma-separated text with the default `Reader`.
///
/// # Errors
///
/// See `Reader::parse`.
pub fn parse(input: &[u8], log: &dyn Log) -> Result<Dataset> {
    Reader::default().parse(input, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{MemoryLog, NullLog};
    use crate::record::Value;
    use std::io::Write;

    const PEOPLE: &str = "name,age,city\nAlice,30,NYC\nBob,25,LA\nCarol,30,NYC\n";

    #[test]
    fn raw_rows() {
        let mut reader = csv_core::Reader::new();
        let input = b"a,\"b,c\",\"d\"\"e\"\nf";
        let (row, consumed) = Row::next(&mut reader, input).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0), Some(&b"a"[..]));
        assert_eq!(row.get(1), Some(&b"b,c"[..]));
        assert_eq!(row.get(2), Some(&b"d\"e"[..]));
        assert_eq!(row.get(3), None);

        let (row, _) = Row::next(&mut reader, &input[consumed..]).unwrap();
        assert_eq!(row.get(0), Some(&b"f"[..]));
        assert!(Row::next(&mut reader, b"").is_none());
    }

    #[test]
    fn long_fields() {
        let long = "x".repeat(1000);
        let input = format!("{},{}\n", long, long);
        let mut reader = csv_core::Reader::new();
        let (row, _) = Row::next(&mut reader, input.as_bytes()).unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(1), Some(long.as_bytes()));
    }

    #[test]
    fn parse_people() {
        let dataset = parse(PEOPLE.as_bytes(), &NullLog).unwrap();
        assert_eq!(dataset.columns(), ["name", "age", "city"]);
        assert_eq!(dataset.len(), 3);

        let names: Vec<_> = dataset
            .records()
            .map(|r| r.get("name").unwrap().to_string())
            .collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
        assert_eq!(dataset.record(1).unwrap().get("age"), Some(&Value::Int(25)));
        assert_eq!(
            dataset.record(2).unwrap().get("city"),
            Some(&Value::Text("NYC".to_string()))
        );
    }

    #[test]
    fn quoted_fields_and_bom() {
        let input = "\u{feff}name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\r\n";
        let dataset = parse(input.as_bytes(), &NullLog).unwrap();
        assert_eq!(dataset.columns(), ["name", "note"]);
        let record = dataset.record(0).unwrap();
        assert_eq!(
            record.get("name"),
            Some(&Value::Text("Smith, J".to_string()))
        );
        assert_eq!(
            record.get("note"),
            Some(&Value::Text("said \"hi\"".to_string()))
        );
    }

    #[test]
    fn blank_lines_and_no_trailing_newline() {
        let dataset = parse(b"a,b\n\n1,2\n\n3,4", &NullLog).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.record(1).unwrap().get("b"), Some(&Value::Int(4)));
    }

    #[test]
    fn blank_single_column_row_is_skipped() {
        // An empty cell in a one-column file is indistinguishable from a
        // blank line.
        let log = MemoryLog::new();
        let dataset = parse(b"score\n10\n\n20\n", &log).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.record(1).unwrap().get("score"), Some(&Value::Int(20)));
        assert!(log.warnings().is_empty());

        let dataset = parse(b"score\n10\n\"\"\n20\n", &log).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.record(1).unwrap().get("score"), Some(&Value::Missing));
    }

    #[test]
    fn raw_text_is_kept() {
        let dataset = parse(b"code,name\n007, x \n", &NullLog).unwrap();
        let record = dataset.record(0).unwrap();
        assert_eq!(record.get("code"), Some(&Value::Int(7)));
        assert_eq!(record.cell(0).map(Cell::text), Some("007"));
        assert_eq!(record.cell(1).map(Cell::text), Some(" x "));
    }

    #[test]
    fn header_only() {
        let dataset = parse(b"name,age,city\n", &NullLog).unwrap();
        assert_eq!(dataset.columns().len(), 3);
        assert!(dataset.is_empty());
    }

    #[test]
    fn empty_input() {
        let err = parse(b"", &NullLog).unwrap_err();
        assert!(matches!(err, Error::Schema { row: 0, .. }));
    }

    #[test]
    fn duplicate_columns() {
        let err = parse(b"a,b,a\n1,2,3\n", &NullLog).unwrap_err();
        assert!(matches!(err, Error::Schema { row: 0, .. }));
    }

    #[test]
    fn extra_field() {
        let err = parse(b"name,age,city\nAlice,30,NYC\nBob,25,LA,extra\n", &NullLog)
            .unwrap_err();
        match err {
            Error::Schema { row, reason } => {
                assert_eq!(row, 2);
                assert_eq!(reason, "expected 3 fields, found 4");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_field() {
        let err = parse(b"name,age,city\nAlice,30\n", &NullLog).unwrap_err();
        assert!(matches!(err, Error::Schema { row: 1, .. }));
    }

    #[test]
    fn invalid_utf8() {
        let err = parse(b"a,b\n1,\xff\xfe\n", &NullLog).unwrap_err();
        assert!(matches!(err, Error::Schema { row: 1, .. }));
    }

    #[test]
    fn custom_delimiter() {
        let dataset = Reader::new()
            .with_delimiter(b';')
            .parse(b"a;b\n1;x\n", &NullLog)
            .unwrap();
        assert_eq!(dataset.columns(), ["a", "b"]);
        assert_eq!(dataset.record(0).unwrap().get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn warns_on_missing_values() {
        let log = MemoryLog::new();
        let dataset = parse(b"a,b,c\n1,,x\n,,y\n3,4,z\n", &log).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(
            log.warnings(),
            vec![
                "column `a` has 1 missing value".to_string(),
                "column `b` has 2 missing values".to_string(),
            ]
        );
    }

    #[test]
    fn load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PEOPLE.as_bytes()).unwrap();

        let log = MemoryLog::new();
        let dataset = load(file.path(), &log).unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(log.entries().iter().any(|(_, msg)| msg.starts_with("loaded 3 records")));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.csv");
        let err = load(&path, &NullLog).unwrap_err();
        match err {
            Error::NotFound { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {}", other),
        }
    }
}
