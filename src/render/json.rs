//! JSON rendering of extraction events.

use crate::error::Result;
use crate::extract::ExtractEvent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Write;
use std::str::FromStr;

/// Shape of rendered row events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// Rows as objects with `nr` and `cells` (`address`, `raw`, `val`)
    #[default]
    #[serde(alias = "obj")]
    Object,
    /// Rows as arrays of cell values
    #[serde(alias = "arr")]
    Array,
}

impl FromStr for EventFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "object" | "obj" => Ok(EventFormat::Object),
            "array" | "arr" => Ok(EventFormat::Array),
            other => Err(crate::Error::InvalidOptions(format!(
                "unknown event format: {}",
                other
            ))),
        }
    }
}

/// Convert one event to a JSON value.
///
/// Every event becomes an object with a single key naming the event:
/// `sheet`, `row`, `sheet_end`, `end` or `error`.
pub fn event_to_json(event: &ExtractEvent, format: EventFormat) -> Result<Value> {
    let value = match event {
        ExtractEvent::Sheet(sheet) => json!({ "sheet": sheet }),
        ExtractEvent::Row(row) => match format {
            EventFormat::Object => json!({ "row": row }),
            EventFormat::Array => {
                let values = row
                    .cells
                    .iter()
                    .map(|c| serde_json::to_value(&c.value))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                json!({ "row": values })
            }
        },
        ExtractEvent::SheetEnd(sheet) => json!({ "sheet_end": sheet }),
        ExtractEvent::End => json!({ "end": true }),
        ExtractEvent::Error(e) => json!({
            "error": e.to_string(),
            "kind": e.kind().name(),
        }),
    };
    Ok(value)
}

/// Write events as JSON lines, one compact object per line.
///
/// Returns the number of row events written. An error event is written as
/// its line and then returned.
pub fn write_json_lines<W: Write>(
    events: impl IntoIterator<Item = ExtractEvent>,
    mut writer: W,
    format: EventFormat,
) -> Result<usize> {
    let mut rows = 0;
    for event in events {
        serde_json::to_writer(&mut writer, &event_to_json(&event, format)?)?;
        writer.write_all(b"\n")?;
        match event {
            ExtractEvent::Row(_) => rows += 1,
            ExtractEvent::Error(e) => {
                writer.flush()?;
                return Err(e);
            }
            _ => {}
        }
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, CellValue, Row, SheetDescriptor};
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn sample_row() -> Row {
        let mut row = Row::new(Some(2));
        row.push(Cell::new(Some("A2".into()), Some("0".into()), CellValue::Text("Hello".into())));
        row.push(Cell::new(Some("B2".into()), Some("1".into()), CellValue::Boolean(true)));
        row.push(Cell::new(Some("C2".into()), None, CellValue::Empty));
        row
    }

    #[test]
    fn test_row_object() {
        let value = event_to_json(&ExtractEvent::Row(sample_row()), EventFormat::Object).unwrap();
        assert_eq!(
            value,
            json!({
                "row": {
                    "nr": 2,
                    "cells": [
                        { "address": "A2", "raw": "0", "val": "Hello" },
                        { "address": "B2", "raw": "1", "val": true },
                        { "address": "C2", "val": null }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_row_array() {
        let value = event_to_json(&ExtractEvent::Row(sample_row()), EventFormat::Array).unwrap();
        assert_eq!(value, json!({ "row": ["Hello", true, null] }));
    }

    #[test]
    fn test_json_lines() {
        let sheet = SheetDescriptor::new(1, "Data", "rId1", "xl/worksheets/sheet1.xml");
        let events = vec![
            ExtractEvent::Sheet(sheet.clone()),
            ExtractEvent::Row(sample_row()),
            ExtractEvent::SheetEnd(sheet),
            ExtractEvent::Error(Error::TruncatedWorksheet("xl/worksheets/sheet2.xml".into())),
        ];

        let mut buffer = Vec::new();
        let result = write_json_lines(events, &mut buffer, EventFormat::Array);
        assert!(matches!(result, Err(Error::TruncatedWorksheet(_))));

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            r#"{"sheet":{"name":"Data","nr":1,"part":"xl/worksheets/sheet1.xml","rid":"rId1"}}"#
        );
        assert!(lines[3].contains(r#""kind":"streaming""#));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("obj".parse::<EventFormat>().unwrap(), EventFormat::Object);
        assert_eq!("ARRAY".parse::<EventFormat>().unwrap(), EventFormat::Array);
        assert!("table".parse::<EventFormat>().is_err());
    }
}
