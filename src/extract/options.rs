//! Extraction options.

use crate::error::{Error, Result};
use crate::model::SheetDescriptor;
use crate::render::EventFormat;
use crate::xml::XmlBackend;
use serde::Deserialize;
use std::fmt;

/// Which sheets an extraction covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Every sheet, in workbook order
    All,
    /// The sheet at a 1-based position
    Number(usize),
    /// The sheet with this exact name
    Name(String),
    /// The sheet with this relationship id
    Id(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Number(1)
    }
}

impl SheetSelector {
    /// Check whether a sheet is selected.
    pub fn matches(&self, sheet: &SheetDescriptor) -> bool {
        match self {
            SheetSelector::All => true,
            SheetSelector::Number(n) => sheet.number == *n,
            SheetSelector::Name(name) => sheet.name == *name,
            SheetSelector::Id(id) => sheet.relationship_id == *id,
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::All => write!(f, "all sheets"),
            SheetSelector::Number(n) => write!(f, "sheet number {}", n),
            SheetSelector::Name(name) => write!(f, "sheet name {:?}", name),
            SheetSelector::Id(id) => write!(f, "sheet id {:?}", id),
        }
    }
}

/// Options for an extraction run.
///
/// `include_empty_rows` and `ignore_header` compose in a fixed order: empty
/// rows are dropped first, then `ignore_header` rows of what remains are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Sheets to extract
    pub sheet: SheetSelector,

    /// Number of leading rows to skip per sheet
    pub ignore_header: usize,

    /// Emit rows that contain no cells
    pub include_empty_rows: bool,

    /// Skip type conversion except shared-string lookup
    pub raw_values: bool,

    /// Shape of rendered row events
    pub format: EventFormat,

    /// XML parser for package parts
    pub parser: XmlBackend,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::default(),
            ignore_header: 0,
            include_empty_rows: false,
            raw_values: false,
            format: EventFormat::default(),
            parser: XmlBackend::default(),
        }
    }
}

impl ExtractOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select sheets.
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    /// Select every sheet.
    pub fn all_sheets(self) -> Self {
        self.with_sheet(SheetSelector::All)
    }

    /// Skip leading rows of each sheet.
    pub fn with_ignore_header(mut self, rows: usize) -> Self {
        self.ignore_header = rows;
        self
    }

    /// Emit rows without cells.
    pub fn with_include_empty_rows(mut self, include: bool) -> Self {
        self.include_empty_rows = include;
        self
    }

    /// Disable value conversion.
    pub fn with_raw_values(mut self, raw: bool) -> Self {
        self.raw_values = raw;
        self
    }

    /// Set the row event shape.
    pub fn with_format(mut self, format: EventFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the XML parser.
    pub fn with_parser(mut self, parser: XmlBackend) -> Self {
        self.parser = parser;
        self
    }

    /// Build options from a flat JSON object.
    ///
    /// Recognized keys: `sheet_all`, `sheet_nr`, `sheet_name`, `sheet_id`,
    /// `ignore_header`, `include_empty_rows`, `raw_values`, `format` and
    /// `parser`. Other keys are ignored so one object can also carry
    /// [`TsvOptions`](crate::render::TsvOptions). Giving more than one sheet
    /// selector is an error.
    ///
    /// # Example
    ///
    /// ```
    /// use xlsx_extract::{ExtractOptions, SheetSelector};
    ///
    /// let options = ExtractOptions::from_json(r#"{"sheet_name": "Data", "ignore_header": 1}"#)?;
    /// assert_eq!(options.sheet, SheetSelector::Name("Data".into()));
    /// assert_eq!(options.ignore_header, 1);
    /// # Ok::<(), xlsx_extract::Error>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let flat: FlatOptions =
            serde_json::from_str(json).map_err(|e| Error::InvalidOptions(e.to_string()))?;
        flat.into_options()
    }

    /// Build options from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let flat: FlatOptions =
            serde_json::from_value(value).map_err(|e| Error::InvalidOptions(e.to_string()))?;
        flat.into_options()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(usize),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FlatOptions {
    sheet_all: Option<bool>,
    sheet_nr: Option<NumberOrText>,
    sheet_name: Option<String>,
    sheet_id: Option<String>,
    ignore_header: Option<usize>,
    include_empty_rows: Option<bool>,
    raw_values: Option<bool>,
    format: Option<EventFormat>,
    parser: Option<XmlBackend>,
}

impl FlatOptions {
    fn into_options(self) -> Result<ExtractOptions> {
        let mut selectors = Vec::new();
        if self.sheet_all == Some(true) {
            selectors.push(SheetSelector::All);
        }
        if let Some(nr) = self.sheet_nr {
            let n = match nr {
                NumberOrText::Number(n) => n,
                NumberOrText::Text(s) => s.trim().parse().map_err(|_| {
                    Error::InvalidOptions(format!("sheet_nr is not a number: {:?}", s))
                })?,
            };
            if n == 0 {
                return Err(Error::InvalidOptions("sheet_nr starts at 1".to_string()));
            }
            selectors.push(SheetSelector::Number(n));
        }
        if let Some(name) = self.sheet_name {
            selectors.push(SheetSelector::Name(name));
        }
        if let Some(id) = self.sheet_id {
            selectors.push(SheetSelector::Id(id));
        }
        if selectors.len() > 1 {
            return Err(Error::InvalidOptions(
                "only one of sheet_all, sheet_nr, sheet_name and sheet_id may be given"
                    .to_string(),
            ));
        }

        let defaults = ExtractOptions::default();
        Ok(ExtractOptions {
            sheet: selectors.pop().unwrap_or(defaults.sheet),
            ignore_header: self.ignore_header.unwrap_or(defaults.ignore_header),
            include_empty_rows: self
                .include_empty_rows
                .unwrap_or(defaults.include_empty_rows),
            raw_values: self.raw_values.unwrap_or(defaults.raw_values),
            format: self.format.unwrap_or(defaults.format),
            parser: self.parser.unwrap_or(defaults.parser),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.sheet, SheetSelector::Number(1));
        assert_eq!(options.ignore_header, 0);
        assert!(!options.include_empty_rows);
        assert!(!options.raw_values);
        assert_eq!(options.parser, XmlBackend::QuickXml);
        assert_eq!(ExtractOptions::from_json("{}").unwrap(), options);
    }

    #[test]
    fn test_builder() {
        let options = ExtractOptions::new()
            .all_sheets()
            .with_ignore_header(2)
            .with_include_empty_rows(true)
            .with_parser(XmlBackend::RoxmlTree);
        assert_eq!(options.sheet, SheetSelector::All);
        assert_eq!(options.ignore_header, 2);
        assert!(options.include_empty_rows);
        assert_eq!(options.parser, XmlBackend::RoxmlTree);
    }

    #[test]
    fn test_from_json() {
        let options = ExtractOptions::from_json(
            r#"{"sheet_nr": "2", "include_empty_rows": true, "parser": "dom", "format": "array", "tsv_delimiter": ";"}"#,
        )
        .unwrap();
        assert_eq!(options.sheet, SheetSelector::Number(2));
        assert!(options.include_empty_rows);
        assert_eq!(options.parser, XmlBackend::RoxmlTree);
        assert_eq!(options.format, EventFormat::Array);

        let options = ExtractOptions::from_json(r#"{"sheet_all": true}"#).unwrap();
        assert_eq!(options.sheet, SheetSelector::All);

        let options = ExtractOptions::from_json(r#"{"sheet_id": "rId3", "sheet_all": false}"#).unwrap();
        assert_eq!(options.sheet, SheetSelector::Id("rId3".into()));
    }

    #[test]
    fn test_from_json_rejects_conflicts() {
        for json in [
            r#"{"sheet_nr": 1, "sheet_name": "Data"}"#,
            r#"{"sheet_all": true, "sheet_id": "rId1"}"#,
            r#"{"sheet_nr": 0}"#,
            r#"{"sheet_nr": "first"}"#,
            r#"{"ignore_header": -1}"#,
            r#"not json"#,
        ] {
            assert!(
                matches!(ExtractOptions::from_json(json), Err(Error::InvalidOptions(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_selector_matches() {
        let sheet = SheetDescriptor::new(2, "Data", "rId7", "xl/worksheets/sheet2.xml");
        assert!(SheetSelector::All.matches(&sheet));
        assert!(SheetSelector::Number(2).matches(&sheet));
        assert!(!SheetSelector::Number(1).matches(&sheet));
        assert!(SheetSelector::Name("Data".into()).matches(&sheet));
        assert!(!SheetSelector::Name("data".into()).matches(&sheet));
        assert!(SheetSelector::Id("rId7".into()).matches(&sheet));
        assert_eq!(SheetSelector::Name("X".into()).to_string(), "sheet name \"X\"");
    }
}
