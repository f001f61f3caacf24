//! # xlsx-extract
//!
//! Streaming extraction of rows and cells from XLSX spreadsheets.
//!
//! The library opens a spreadsheet package, resolves shared strings and
//! date-formatted numbers, and streams the selected sheets as a sequence of
//! sheet/row/end events. The same stream can be written out as delimited text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xlsx_extract::{convert, extract_file, ExtractEvent, ExtractOptions, TsvOptions};
//!
//! // Stream events of the first sheet
//! for event in extract_file("data.xlsx", &ExtractOptions::default()) {
//!     if let ExtractEvent::Row(row) = event {
//!         println!("{:?}", row.display_values(false));
//!     }
//! }
//!
//! // Convert every sheet to TSV, skipping one header row per sheet
//! let options = ExtractOptions::new().all_sheets().with_ignore_header(1);
//! let rows = convert("data.xlsx", "data.tsv", &options, &TsvOptions::default())?;
//! println!("{} rows written", rows);
//! # Ok::<(), xlsx_extract::Error>(())
//! ```
//!
//! ## Lower-Level APIs
//!
//! ```no_run
//! use xlsx_extract::Workbook;
//!
//! let workbook = Workbook::open("data.xlsx")?;
//! for sheet in workbook.sheets() {
//!     for row in workbook.rows(sheet, false)? {
//!         let row = row?;
//!         println!("{}: {} cells", sheet.name, row.len());
//!     }
//! }
//! # Ok::<(), xlsx_extract::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: open workbooks with Tokio file I/O

pub mod container;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod render;
pub mod xlsx;
pub mod xml;

#[cfg(feature = "async")]
pub mod asynchronous;

// Re-exports
pub use container::{Relationship, Relationships, SpreadsheetContainer};
pub use detect::{detect_package, detect_package_from_bytes, PackageKind};
pub use error::{Error, ErrorKind, Result};
pub use extract::{ExtractEvent, ExtractOptions, Extraction, SheetSelector};
pub use model::{Cell, CellAddress, CellValue, Row, SheetDescriptor};
pub use render::{EventFormat, TsvOptions, TsvWriter};
pub use xlsx::{DateSystem, Workbook};
pub use xml::XmlBackend;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Extract events from a spreadsheet file.
///
/// Errors while opening the file are delivered as the stream's only event.
///
/// # Example
///
/// ```no_run
/// use xlsx_extract::{extract_file, ExtractEvent, ExtractOptions, SheetSelector};
///
/// let options = ExtractOptions::new().with_sheet(SheetSelector::Name("Data".into()));
/// let rows = extract_file("data.xlsx", &options)
///     .filter(|e| matches!(e, ExtractEvent::Row(_)))
///     .count();
/// ```
pub fn extract_file(path: impl AsRef<Path>, options: &ExtractOptions) -> Extraction {
    match Workbook::open_with(path, options.parser) {
        Ok(workbook) => workbook.extract(options),
        Err(e) => Extraction::failed(e),
    }
}

/// Extract events from spreadsheet bytes.
pub fn extract_bytes(data: Vec<u8>, options: &ExtractOptions) -> Extraction {
    match Workbook::from_bytes(data, options.parser) {
        Ok(workbook) => workbook.extract(options),
        Err(e) => Extraction::failed(e),
    }
}

/// Convert a spreadsheet file to delimited text.
///
/// Returns the number of rows written. Structural and selection errors are
/// reported before the output file is created; a streaming error leaves the
/// rows written so far in the file.
pub fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ExtractOptions,
    tsv_options: &TsvOptions,
) -> Result<usize> {
    let mut events = extract_file(input, options).peekable();
    if matches!(events.peek(), Some(ExtractEvent::Error(_))) {
        if let Some(ExtractEvent::Error(e)) = events.next() {
            return Err(e);
        }
    }

    let output = output.as_ref();
    let file = File::create(output)?;
    let rows = render::write_events(events, BufWriter::new(file), tsv_options)?;
    debug!(output = %output.display(), rows, "conversion complete");
    Ok(rows)
}
