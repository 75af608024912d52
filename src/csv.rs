//! An interface to CSV (comma-separated values).

pub(crate) mod reader;

pub use reader::{load, parse, Reader, Row};
