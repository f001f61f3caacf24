//! Streaming worksheet parser.
//!
//! A [`WorksheetReader`] pulls XML events from one worksheet part and yields
//! rows one at a time. It walks three states:
//!
//! - **outside row**: waits for `<row>`; end of input here is the normal end
//! - **in row**: collects cells until `</row>`, then yields the row
//! - **in cell**: buffers `<v>` or inline `<is>` text until `</c>`, then
//!   resolves the cell's value
//!
//! The reader holds only the current row. With the quick-xml backend the part
//! is also inflated and parsed as rows are pulled.

use super::date::{parse_iso_datetime, serial_to_datetime, DateSystem};
use super::shared_strings::{decode_escapes, TextRuns};
use super::styles::DateFormats;
use super::SharedStrings;
use crate::error::{Error, Result};
use crate::model::{Cell, CellValue, Row};
use crate::xml::{XmlElement, XmlEvent, XmlEventSource};
use std::sync::Arc;
use tracing::{trace, warn};

/// Turns buffered cell content into typed values.
///
/// Holds the workbook's read-only lookup tables; cloning shares them.
#[derive(Debug, Clone, Default)]
pub struct CellResolver {
    shared_strings: Arc<SharedStrings>,
    date_formats: Arc<DateFormats>,
    date_system: DateSystem,
    raw_values: bool,
}

impl CellResolver {
    /// Create a resolver over the workbook's tables.
    pub fn new(
        shared_strings: Arc<SharedStrings>,
        date_formats: Arc<DateFormats>,
        date_system: DateSystem,
    ) -> Self {
        Self {
            shared_strings,
            date_formats,
            date_system,
            raw_values: false,
        }
    }

    /// Skip all conversion except shared-string lookup.
    pub fn with_raw_values(mut self, raw_values: bool) -> Self {
        self.raw_values = raw_values;
        self
    }

    /// Resolve one cell.
    fn resolve(&self, pending: PendingCell) -> Result<Cell> {
        let PendingCell {
            reference,
            cell_type,
            style,
            value,
            inline,
            ..
        } = pending;
        let cell_type = cell_type.as_deref();

        let raw = match (cell_type, inline, value) {
            (Some("inlineStr"), Some(text), _) => {
                return Ok(Cell::text(reference, text).with_style(style));
            }
            (Some("str"), _, Some(raw)) => raw,
            (_, _, Some(raw)) if !raw.trim().is_empty() => raw,
            _ => return Ok(Cell::new(reference, None, CellValue::Empty).with_style(style)),
        };

        let invalid = |reference: &Option<String>, raw: &str| Error::InvalidCellValue {
            cell: reference.clone().unwrap_or_else(|| "?".to_string()),
            value: raw.to_string(),
        };

        let value = match cell_type {
            Some("s") => {
                let index: usize = raw
                    .trim()
                    .parse()
                    .map_err(|_| invalid(&reference, &raw))?;
                CellValue::Text(self.shared_strings.resolve(index)?.to_string())
            }
            _ if self.raw_values => CellValue::Text(raw.clone()),
            Some("b") => CellValue::Boolean(raw.trim() == "1"),
            None | Some("n") => {
                let number: f64 = raw
                    .trim()
                    .parse()
                    .ok()
                    .filter(|n: &f64| n.is_finite())
                    .ok_or_else(|| invalid(&reference, &raw))?;
                match style.filter(|&s| self.date_formats.is_date_style(s)) {
                    // Negative durations and serials past 9999-12-31 stay numbers
                    Some(_) => serial_to_datetime(number, self.date_system)
                        .map(CellValue::Date)
                        .unwrap_or(CellValue::Number(number)),
                    None => CellValue::Number(number),
                }
            }
            Some("e") => CellValue::Text(raw.clone()),
            Some("str") | Some("inlineStr") => CellValue::Text(decode_escapes(&raw).into_owned()),
            Some("d") => match parse_iso_datetime(&raw) {
                Some(date) => CellValue::Date(date),
                None => CellValue::Text(raw.clone()),
            },
            Some(other) => {
                warn!(cell = ?reference, cell_type = other, "unknown cell type, keeping raw text");
                CellValue::Text(raw.clone())
            }
        };

        Ok(Cell::new(reference, Some(raw), value).with_style(style))
    }
}

/// Content of a cell whose end tag has not been seen yet.
#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    inline: Option<String>,
    in_value: bool,
    in_inline: bool,
    runs: TextRuns,
}

impl PendingCell {
    fn from_element(e: &XmlElement) -> Self {
        Self {
            reference: e.attr("r").map(str::to_string),
            cell_type: e.attr("t").map(str::to_string),
            style: e.attr("s").and_then(|s| s.trim().parse().ok()),
            ..Default::default()
        }
    }
}

enum State {
    OutsideRow,
    InRow(Row),
    InCell(Row, PendingCell),
}

/// Lazy row iterator over one worksheet part.
///
/// After the first error the iterator is exhausted.
pub struct WorksheetReader<S> {
    source: S,
    resolver: CellResolver,
    part: String,
    state: State,
    done: bool,
}

impl<S: XmlEventSource> WorksheetReader<S> {
    /// Create a reader over an event source for the worksheet `part`.
    pub fn new(source: S, resolver: CellResolver, part: impl Into<String>) -> Self {
        Self {
            source,
            resolver,
            part: part.into(),
            state: State::OutsideRow,
            done: false,
        }
    }

    /// Worksheet part this reader consumes.
    pub fn part(&self) -> &str {
        &self.part
    }

    fn invalid_transition(&self, what: &str) -> Error {
        Error::XmlParse(format!("{}: {}", self.part, what))
    }

    /// Advance until a row is complete or the part ends.
    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            let event = self.source.next_event()?;
            let state = std::mem::replace(&mut self.state, State::OutsideRow);

            self.state = match (state, event) {
                (State::OutsideRow, XmlEvent::Start(e)) if e.name == "row" => {
                    let index = e.attr("r").and_then(|r| r.trim().parse().ok());
                    State::InRow(Row::new(index))
                }
                (State::OutsideRow, XmlEvent::Start(e)) if e.name == "c" => {
                    return Err(self.invalid_transition("cell outside of a row"));
                }
                (State::OutsideRow, XmlEvent::Eof) => return Ok(None),
                (State::OutsideRow, _) => State::OutsideRow,

                (State::InRow(row), XmlEvent::Start(e)) => match e.name.as_str() {
                    "c" => State::InCell(row, PendingCell::from_element(&e)),
                    "row" => return Err(self.invalid_transition("row inside a row")),
                    _ => State::InRow(row),
                },
                (State::InRow(row), XmlEvent::End(name)) if name == "row" => {
                    trace!(part = %self.part, row = ?row.index, cells = row.len(), "row");
                    return Ok(Some(row));
                }
                (State::InRow(_), XmlEvent::Eof) => {
                    return Err(Error::TruncatedWorksheet(format!(
                        "{}: input ended inside a row",
                        self.part
                    )));
                }
                (State::InRow(row), _) => State::InRow(row),

                (State::InCell(row, mut cell), XmlEvent::Start(e)) => {
                    match e.name.as_str() {
                        "row" | "c" => {
                            return Err(self.invalid_transition(&format!(
                                "<{}> inside a cell",
                                e.name
                            )));
                        }
                        "v" if !cell.in_inline => {
                            cell.in_value = true;
                            cell.value.get_or_insert_with(String::new);
                        }
                        "is" => {
                            cell.in_inline = true;
                            cell.runs.clear();
                        }
                        name if cell.in_inline => cell.runs.start(name),
                        _ => {}
                    }
                    State::InCell(row, cell)
                }
                (State::InCell(row, mut cell), XmlEvent::Text(text)) => {
                    if cell.in_value {
                        if let Some(value) = cell.value.as_mut() {
                            value.push_str(&text);
                        }
                    } else if cell.in_inline {
                        cell.runs.text(&text);
                    }
                    State::InCell(row, cell)
                }
                (State::InCell(mut row, mut cell), XmlEvent::End(name)) => match name.as_str() {
                    "c" => {
                        row.push(self.resolver.resolve(cell)?);
                        State::InRow(row)
                    }
                    "v" => {
                        cell.in_value = false;
                        State::InCell(row, cell)
                    }
                    "is" => {
                        cell.in_inline = false;
                        cell.inline = Some(cell.runs.take());
                        State::InCell(row, cell)
                    }
                    name => {
                        if cell.in_inline {
                            cell.runs.end(name);
                        }
                        State::InCell(row, cell)
                    }
                },
                (State::InCell(_, cell), XmlEvent::Eof) => {
                    return Err(Error::TruncatedWorksheet(format!(
                        "{}: input ended inside cell {}",
                        self.part,
                        cell.reference.as_deref().unwrap_or("?")
                    )));
                }
            };
        }
    }
}

impl<S: XmlEventSource> Iterator for WorksheetReader<S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: XmlEventSource> std::iter::FusedIterator for WorksheetReader<S> {}
