//! SpreadsheetML parts: workbook index, lookup tables and worksheets.
//!
//! A [`Workbook`] loads the read-only tables once ([`SharedStrings`],
//! [`DateFormats`], [`WorkbookIndex`]) and hands out a [`WorksheetReader`]
//! per sheet.
//!
//! # Example
//!
//! ```no_run
//! use xlsx_extract::xlsx::Workbook;
//!
//! let workbook = Workbook::open("spreadsheet.xlsx")?;
//! for sheet in workbook.sheets() {
//!     println!("Sheet {}: {}", sheet.number, sheet.name);
//! }
//! # Ok::<(), xlsx_extract::Error>(())
//! ```

pub mod date;
mod index;
mod shared_strings;
mod styles;
mod workbook;
mod worksheet;

pub use date::{serial_to_datetime, DateSystem};
pub use index::WorkbookIndex;
pub use shared_strings::{decode_escapes, SharedStrings};
pub use styles::{is_builtin_date_format, is_date_format_code, DateFormats};
pub use workbook::Workbook;
pub use worksheet::{CellResolver, WorksheetReader};
