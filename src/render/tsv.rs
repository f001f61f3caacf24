//! Delimited-text (TSV) serializer.

use super::options::TsvOptions;
use crate::error::{Error, Result};
use crate::extract::ExtractEvent;
use crate::model::Row;
use std::io::Write;
use tracing::debug;

/// Writes rows as delimited text, one terminator after every row.
///
/// Values are written as they display, without quoting: text as-is, numbers
/// in shortest form, booleans as `true`/`false`, dates in ISO 8601 and empty
/// cells as nothing.
///
/// # Example
///
/// ```
/// use xlsx_extract::model::{Cell, CellValue, Row};
/// use xlsx_extract::render::{TsvOptions, TsvWriter};
///
/// let mut row = Row::new(Some(1));
/// row.push(Cell::text(None, "a"));
/// row.push(Cell::new(None, Some("2.5".into()), CellValue::Number(2.5)));
///
/// let mut writer = TsvWriter::new(Vec::new(), TsvOptions::new().with_float_comma(true));
/// writer.write_row(&row)?;
/// assert_eq!(writer.finish()?, b"a\t2,5\n");
/// # Ok::<(), xlsx_extract::Error>(())
/// ```
pub struct TsvWriter<W: Write> {
    writer: W,
    options: TsvOptions,
    rows_written: usize,
}

impl<W: Write> TsvWriter<W> {
    /// Create a writer over an output sink.
    pub fn new(writer: W, options: TsvOptions) -> Self {
        Self {
            writer,
            options,
            rows_written: 0,
        }
    }

    /// Write one row followed by the terminator.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let line = row.display_values(self.options.float_comma).join(&self.options.delimiter);
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(self.options.end_of_line.as_bytes())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and return the sink.
    ///
    /// Output without rows consists of a single terminator.
    pub fn finish(mut self) -> Result<W> {
        if self.rows_written == 0 {
            self.writer.write_all(self.options.end_of_line.as_bytes())?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Serialize the rows of an event stream.
///
/// Sheet framing events are not written; rows of all sheets follow each
/// other. Returns the number of rows written, or the stream's error. Output
/// written before an error stays in the sink.
pub fn write_events<W: Write>(
    events: impl IntoIterator<Item = ExtractEvent>,
    writer: W,
    options: &TsvOptions,
) -> Result<usize> {
    let mut tsv = TsvWriter::new(writer, options.clone());
    for event in events {
        match event {
            ExtractEvent::Row(row) => tsv.write_row(&row)?,
            ExtractEvent::Error(e) => return Err(e),
            ExtractEvent::End => break,
            ExtractEvent::Sheet(_) | ExtractEvent::SheetEnd(_) => {}
        }
    }
    let rows = tsv.rows_written();
    tsv.finish()?;
    debug!(rows, "wrote delimited text");
    Ok(rows)
}

/// Serialize the rows of an event stream into a string.
pub fn to_tsv_string(
    events: impl IntoIterator<Item = ExtractEvent>,
    options: &TsvOptions,
) -> Result<String> {
    let mut buffer = Vec::new();
    write_events(events, &mut buffer, options)?;
    String::from_utf8(buffer).map_err(|e| Error::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, CellValue, SheetDescriptor};
    use chrono::NaiveDate;

    fn row(values: Vec<CellValue>) -> Row {
        let mut row = Row::new(None);
        for value in values {
            row.push(Cell::new(None, None, value));
        }
        row
    }

    fn sheet() -> SheetDescriptor {
        SheetDescriptor::new(1, "Sheet1", "rId1", "xl/worksheets/sheet1.xml")
    }

    #[test]
    fn test_display_values() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let events = vec![
            ExtractEvent::Sheet(sheet()),
            ExtractEvent::Row(row(vec![
                CellValue::Text("Hello".into()),
                CellValue::Number(1.0),
                CellValue::Number(0.5),
                CellValue::Boolean(false),
                CellValue::Date(date),
                CellValue::Empty,
            ])),
            ExtractEvent::SheetEnd(sheet()),
            ExtractEvent::End,
        ];

        let tsv = to_tsv_string(events, &TsvOptions::default()).unwrap();
        assert_eq!(tsv, "Hello\t1\t0.5\tfalse\t2021-01-01T00:00:00.000Z\t\n");
    }

    #[test]
    fn test_custom_separators() {
        let events = vec![
            ExtractEvent::Row(row(vec![CellValue::Number(1.25), CellValue::Text("x".into())])),
            ExtractEvent::Row(row(vec![CellValue::Number(2.0)])),
            ExtractEvent::End,
        ];
        let options = TsvOptions::new()
            .with_delimiter(";")
            .with_end_of_line("\r\n")
            .with_float_comma(true);
        assert_eq!(to_tsv_string(events, &options).unwrap(), "1,25;x\r\n2\r\n");
    }

    #[test]
    fn test_no_rows() {
        let events = vec![ExtractEvent::Sheet(sheet()), ExtractEvent::SheetEnd(sheet()), ExtractEvent::End];
        assert_eq!(to_tsv_string(events, &TsvOptions::default()).unwrap(), "\n");
    }

    #[test]
    fn test_error_keeps_written_rows() {
        let events = vec![
            ExtractEvent::Row(row(vec![CellValue::Text("kept".into())])),
            ExtractEvent::Error(Error::TruncatedWorksheet("sheet1.xml".into())),
        ];
        let mut buffer = Vec::new();
        let result = write_events(events, &mut buffer, &TsvOptions::default());
        assert!(matches!(result, Err(Error::TruncatedWorksheet(_))));
        assert_eq!(buffer, b"kept\n");
    }
}
