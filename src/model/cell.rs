//! Cell model structures.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Zero-based position of a cell within a worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    /// Column index (A = 0)
    pub column: u32,
    /// Row index (row "1" = 0)
    pub row: u32,
}

impl CellAddress {
    /// Create an address from zero-based indices.
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Parse an A1-style reference such as `B7` or `$AA$10`.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        let mut column: u32 = 0;
        let mut letters = 0;
        let mut digits_start = None;

        for (i, c) in reference.char_indices() {
            match c {
                '$' if digits_start.is_none() => {}
                'A'..='Z' | 'a'..='z' if digits_start.is_none() => {
                    let value = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
                    column = column.checked_mul(26)?.checked_add(value)?;
                    letters += 1;
                }
                '0'..='9' => {
                    digits_start.get_or_insert(i);
                }
                _ => return None,
            }
        }

        let row: u32 = reference[digits_start?..].parse().ok()?;
        if letters == 0 || row == 0 {
            return None;
        }
        Some(Self {
            column: column - 1,
            row: row - 1,
        })
    }

    /// Column letters for a zero-based column index (0 = "A", 26 = "AA").
    pub fn column_name(column: u32) -> String {
        let mut n = column + 1;
        let mut name = Vec::new();
        while n > 0 {
            let rem = ((n - 1) % 26) as u8;
            name.push(b'A' + rem);
            n = (n - 1) / 26;
        }
        name.reverse();
        String::from_utf8_lossy(&name).into_owned()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_name(self.column), self.row + 1)
    }
}

/// Format a date value as ISO 8601 with millisecond precision and a `Z` suffix.
pub fn format_iso_datetime(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let scientific = format!("{:e}", n);
    let parts = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| Some((mantissa, exp.parse::<i32>().ok()?)));
    match parts {
        Some((mantissa, exp)) if !(-6..21).contains(&exp) => {
            format!("{}e{}{}", mantissa, if exp < 0 { '-' } else { '+' }, exp.abs())
        }
        _ => n.to_string(),
    }
}

fn serialize_iso_datetime<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_iso_datetime(value))
}

/// Typed value of a cell after shared-string lookup and date detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Text, including error codes and unconverted literals
    Text(String),
    /// Plain number
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Date/time decoded from a date-formatted serial number
    #[serde(serialize_with = "serialize_iso_datetime")]
    Date(NaiveDateTime),
    /// No value
    #[default]
    Empty,
}

impl CellValue {
    /// Check if there is no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Get the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number, if this is a numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the date, if this is a date value.
    pub fn as_date(&self) -> Option<&NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Render for delimited-text output.
    ///
    /// Numbers use the shortest digits that read back to the same value,
    /// written out in full for magnitudes from `1e-6` up to `1e21` and in
    /// exponent form (`1e+21`, `1.5e-7`) outside that range. With
    /// `float_comma` numbers use a decimal comma instead of a period.
    pub fn display(&self, float_comma: bool) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                let s = format_number(*n);
                if float_comma {
                    s.replace('.', ",")
                } else {
                    s
                }
            }
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Date(d) => format_iso_datetime(d),
            CellValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(false))
    }
}

/// A single worksheet cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cell {
    /// A1 reference as written in the worksheet
    #[serde(rename = "address", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Parsed position of `reference`
    #[serde(skip)]
    pub address: Option<CellAddress>,

    /// Style index (`s` attribute)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,

    /// Literal content before type resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,

    /// Resolved value
    #[serde(rename = "val")]
    pub value: CellValue,
}

impl Cell {
    /// Create a cell with a raw literal and its resolved value.
    pub fn new(reference: Option<String>, raw: Option<String>, value: CellValue) -> Self {
        let address = reference.as_deref().and_then(CellAddress::parse);
        Self {
            reference,
            address,
            style: None,
            raw,
            value,
        }
    }

    /// Create an unconverted text cell (`value` equals `raw`).
    pub fn text(reference: Option<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self::new(reference, Some(raw.clone()), CellValue::Text(raw))
    }

    /// Set the style index.
    pub fn with_style(mut self, style: Option<u32>) -> Self {
        self.style = style;
        self
    }

    /// Whether type resolution changed the value, i.e. `value` is not the raw text.
    pub fn is_converted(&self) -> bool {
        match (&self.raw, &self.value) {
            (Some(raw), CellValue::Text(text)) => raw != text,
            (None, CellValue::Empty) => false,
            _ => true,
        }
    }

    /// Display value for delimited-text output.
    pub fn display_value(&self, float_comma: bool) -> String {
        self.value.display(float_comma)
    }
}
