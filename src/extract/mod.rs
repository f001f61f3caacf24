//! Extraction pipeline.
//!
//! An [`Extraction`] is a pull-based stream of [`ExtractEvent`]s over the
//! selected sheets of a workbook:
//!
//! ```text
//! Sheet(s1) Row* SheetEnd(s1) Sheet(s2) Row* SheetEnd(s2) ... End
//! ```
//!
//! Any failure ends the stream with a single [`ExtractEvent::Error`] in place
//! of `End`. Sheet selection and the presence of every selected worksheet
//! part are checked before the first event, so structural and selection
//! errors never follow emitted rows. Dropping the extraction releases the
//! archive.
//!
//! # Example
//!
//! ```no_run
//! use xlsx_extract::{extract_file, ExtractEvent, ExtractOptions};
//!
//! let options = ExtractOptions::new().all_sheets().with_ignore_header(1);
//! for event in extract_file("data.xlsx", &options) {
//!     match event {
//!         ExtractEvent::Sheet(sheet) => println!("== {}", sheet.name),
//!         ExtractEvent::Row(row) => println!("{}", row.display_values(false).join(" | ")),
//!         ExtractEvent::Error(e) => eprintln!("error: {}", e),
//!         _ => {}
//!     }
//! }
//! ```

mod options;

pub use options::{ExtractOptions, SheetSelector};

use crate::error::Error;
use crate::model::{Row, SheetDescriptor};
use crate::xlsx::{Workbook, WorksheetReader};
use crate::xml::BoxedSource;
use std::collections::VecDeque;
use tracing::debug;

/// One step of an extraction.
#[derive(Debug)]
pub enum ExtractEvent {
    /// A selected sheet starts
    Sheet(SheetDescriptor),
    /// A row of the current sheet
    Row(Row),
    /// The current sheet is complete
    SheetEnd(SheetDescriptor),
    /// All selected sheets are complete
    End,
    /// The extraction failed; no further events follow
    Error(Error),
}

impl ExtractEvent {
    /// Check if this is the last event of an extraction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExtractEvent::End | ExtractEvent::Error(_))
    }
}

enum Phase {
    /// Between sheets
    Ready,
    /// Streaming rows of a sheet
    InSheet {
        sheet: SheetDescriptor,
        reader: WorksheetReader<BoxedSource>,
        skipped: usize,
        emitted: usize,
    },
    /// Failed before the first event
    Failed(Error),
    Finished,
}

/// Event stream over the selected sheets of a workbook.
pub struct Extraction {
    workbook: Option<Workbook>,
    pending: VecDeque<SheetDescriptor>,
    selected: Vec<SheetDescriptor>,
    ignore_header: usize,
    include_empty_rows: bool,
    raw_values: bool,
    phase: Phase,
}

impl Extraction {
    /// Validate the selection against `workbook` and prepare the stream.
    ///
    /// Worksheet parts are read with `options.parser`.
    pub fn new(mut workbook: Workbook, options: &ExtractOptions) -> Self {
        workbook.set_backend(options.parser);

        let selected = match workbook.index().select(&options.sheet) {
            Ok(selected) => selected,
            Err(e) => return Self::failed(e),
        };
        if let Some(err) = selected
            .iter()
            .find_map(|sheet| workbook.check_sheet(sheet).err())
        {
            return Self::failed(err);
        }

        Self {
            workbook: Some(workbook),
            pending: selected.iter().cloned().collect(),
            selected,
            ignore_header: options.ignore_header,
            include_empty_rows: options.include_empty_rows,
            raw_values: options.raw_values,
            phase: Phase::Ready,
        }
    }

    /// An extraction that yields only `Error(err)`.
    pub fn failed(err: Error) -> Self {
        debug!(error = %err, "extraction failed before the first event");
        Self {
            workbook: None,
            pending: VecDeque::new(),
            selected: Vec::new(),
            ignore_header: 0,
            include_empty_rows: false,
            raw_values: false,
            phase: Phase::Failed(err),
        }
    }

    /// Sheets this extraction covers, in emission order.
    pub fn sheets(&self) -> &[SheetDescriptor] {
        &self.selected
    }

    fn finish(&mut self, event: ExtractEvent) -> Option<ExtractEvent> {
        self.phase = Phase::Finished;
        self.pending.clear();
        self.workbook = None;
        Some(event)
    }
}

impl Iterator for Extraction {
    type Item = ExtractEvent;

    fn next(&mut self) -> Option<ExtractEvent> {
        match std::mem::replace(&mut self.phase, Phase::Finished) {
            Phase::Finished => None,
            Phase::Failed(err) => self.finish(ExtractEvent::Error(err)),
            Phase::Ready => {
                let Some(sheet) = self.pending.pop_front() else {
                    debug!(sheets = self.selected.len(), "extraction complete");
                    return self.finish(ExtractEvent::End);
                };
                let Some(workbook) = self.workbook.as_ref() else {
                    return self.finish(ExtractEvent::End);
                };
                match workbook.rows(&sheet, self.raw_values) {
                    Ok(reader) => {
                        debug!(number = sheet.number, name = %sheet.name, part = %sheet.part, "sheet start");
                        self.phase = Phase::InSheet {
                            sheet: sheet.clone(),
                            reader,
                            skipped: 0,
                            emitted: 0,
                        };
                        Some(ExtractEvent::Sheet(sheet))
                    }
                    Err(e) => self.finish(ExtractEvent::Error(e)),
                }
            }
            Phase::InSheet {
                sheet,
                mut reader,
                mut skipped,
                mut emitted,
            } => loop {
                match reader.next() {
                    None => {
                        debug!(number = sheet.number, rows = emitted, "sheet end");
                        self.phase = Phase::Ready;
                        return Some(ExtractEvent::SheetEnd(sheet));
                    }
                    Some(Err(e)) => return self.finish(ExtractEvent::Error(e)),
                    Some(Ok(row)) => {
                        if !self.include_empty_rows && row.is_empty() {
                            continue;
                        }
                        if skipped < self.ignore_header {
                            skipped += 1;
                            continue;
                        }
                        emitted += 1;
                        self.phase = Phase::InSheet {
                            sheet,
                            reader,
                            skipped,
                            emitted,
                        };
                        return Some(ExtractEvent::Row(row));
                    }
                }
            },
        }
    }
}

impl std::iter::FusedIterator for Extraction {}

impl std::fmt::Debug for Extraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extraction")
            .field("selected", &self.selected)
            .field("pending", &self.pending.len())
            .field("ignore_header", &self.ignore_header)
            .field("include_empty_rows", &self.include_empty_rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlBackend;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn workbook(sheet1: &str, sheet2: &str) -> Workbook {
        let parts = [
            (
                "xl/workbook.xml",
                r#"<workbook xmlns:r="urn:r"><sheets><sheet name="One" sheetId="1" r:id="rId1"/><sheet name="Two" sheetId="2" r:id="rId2"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Type="urn:worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="urn:worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#,
            ),
            ("xl/worksheets/sheet1.xml", sheet1),
            ("xl/worksheets/sheet2.xml", sheet2),
        ];
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
            for (name, data) in parts {
                zip.start_file(name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        Workbook::from_bytes(buffer, XmlBackend::QuickXml).unwrap()
    }

    fn labels(extraction: Extraction) -> Vec<String> {
        extraction
            .map(|event| match event {
                ExtractEvent::Sheet(s) => format!("sheet:{}", s.name),
                ExtractEvent::Row(r) => format!("row:{}", r.index.unwrap_or(0)),
                ExtractEvent::SheetEnd(s) => format!("end:{}", s.name),
                ExtractEvent::End => "end".to_string(),
                ExtractEvent::Error(e) => format!("error:{:?}", e.kind()),
            })
            .collect()
    }

    const ROWS: &str = r#"<worksheet><sheetData><row r="1"/><row r="2"><c r="A2"><v>1</v></c></row><row r="3"/><row r="4"><c r="A4"><v>2</v></c></row><row r="5"><c r="A5"><v>3</v></c></row></sheetData></worksheet>"#;

    #[test]
    fn test_event_framing() {
        let options = ExtractOptions::new().all_sheets();
        assert_eq!(
            labels(workbook(ROWS, "<worksheet><sheetData/></worksheet>").extract(&options)),
            vec!["sheet:One", "row:2", "row:4", "row:5", "end:One", "sheet:Two", "end:Two", "end"]
        );
    }

    #[test]
    fn test_filter_then_skip() {
        let options = ExtractOptions::new().with_ignore_header(1);
        assert_eq!(
            labels(workbook(ROWS, ROWS).extract(&options)),
            vec!["sheet:One", "row:4", "row:5", "end:One", "end"]
        );

        let options = ExtractOptions::new()
            .with_ignore_header(1)
            .with_include_empty_rows(true);
        assert_eq!(
            labels(workbook(ROWS, ROWS).extract(&options)),
            vec!["sheet:One", "row:2", "row:3", "row:4", "row:5", "end:One", "end"]
        );
    }

    #[test]
    fn test_selection_error_before_first_event() {
        let options = ExtractOptions::new().with_sheet(SheetSelector::Name("Missing".into()));
        let mut extraction = workbook(ROWS, ROWS).extract(&options);
        assert!(matches!(
            extraction.next(),
            Some(ExtractEvent::Error(Error::SheetNotFound(_)))
        ));
        assert!(extraction.next().is_none());
    }

    #[test]
    fn test_streaming_error_keeps_earlier_rows() {
        let broken = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>0</v></c></row></sheetData></worksheet>"#;
        let options = ExtractOptions::new().all_sheets();
        assert_eq!(
            labels(workbook(broken, ROWS).extract(&options)),
            vec!["sheet:One", "row:1", "error:Streaming"]
        );
    }
}
