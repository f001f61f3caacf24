//! Delimited-text output options.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Options for delimited-text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvOptions {
    /// Separator between cell values
    pub delimiter: String,

    /// Terminator written after every row
    pub end_of_line: String,

    /// Render numbers with a decimal comma
    pub float_comma: bool,
}

impl Default for TsvOptions {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            end_of_line: "\n".to_string(),
            float_comma: false,
        }
    }
}

impl TsvOptions {
    /// Create new TSV options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cell separator.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the row terminator.
    pub fn with_end_of_line(mut self, end_of_line: impl Into<String>) -> Self {
        self.end_of_line = end_of_line.into();
        self
    }

    /// Use a decimal comma for numbers.
    pub fn with_float_comma(mut self, float_comma: bool) -> Self {
        self.float_comma = float_comma;
        self
    }

    /// Build options from a flat JSON object with the keys `tsv_delimiter`,
    /// `tsv_endofline` and `tsv_float_comma`. Other keys are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        let flat: FlatTsvOptions =
            serde_json::from_str(json).map_err(|e| Error::InvalidOptions(e.to_string()))?;
        let defaults = Self::default();
        Ok(Self {
            delimiter: flat.tsv_delimiter.unwrap_or(defaults.delimiter),
            end_of_line: flat.tsv_endofline.unwrap_or(defaults.end_of_line),
            float_comma: flat.tsv_float_comma.unwrap_or(defaults.float_comma),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlatTsvOptions {
    tsv_delimiter: Option<String>,
    tsv_endofline: Option<String>,
    tsv_float_comma: Option<bool>,
}
