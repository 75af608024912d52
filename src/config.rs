//! Runtime configuration: where data lives and how it is read and reported.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_FILE: &str = "people.csv";
const DEFAULT_REPORTS_DIR: &str = "reports";
const DEFAULT_DECIMAL_PLACES: usize = 2;
const DEFAULT_CURRENCY: &str = "SEK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory relative file names are resolved against.
    pub data_dir: PathBuf,
    /// File analyzed when no path is given.
    pub default_file: String,
    /// Directory saved reports are written to.
    pub reports_dir: PathBuf,
    /// Field delimiter; must be a single ASCII character.
    pub delimiter: char,
    pub decimal_places: usize,
    /// Currency code appended to amounts in reports.
    pub currency: String,
    /// Numeric columns reported as whole amounts of `currency`.
    pub currency_columns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_file: DEFAULT_FILE.to_string(),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            delimiter: ',',
            decimal_places: DEFAULT_DECIMAL_PLACES,
            currency: DEFAULT_CURRENCY.to_string(),
            currency_columns: vec!["salary".to_string()],
        }
    }
}

impl Config {
    /// Reads a TOML configuration file. Keys that are absent keep their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// sets a delimiter that is not an ASCII character.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = toml::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.delimiter_byte()?;
        Ok(config)
    }

    /// Resolves `name` against `data_dir`. Absolute paths are returned as is.
    #[must_use]
    pub fn data_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(name)
    }

    #[must_use]
    pub fn default_path(&self) -> PathBuf {
        self.data_path(&self.default_file)
    }

    /// # Errors
    ///
    /// Returns an error if the delimiter is not ASCII.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::Delimiter(self.delimiter))
        }
    }
}
