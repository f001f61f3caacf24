//! Data model for extracted spreadsheet content.
//!
//! Rows and cells are produced by the worksheet parser one at a time and are
//! never retained by the engine once emitted. Sheet descriptors come from the
//! workbook index and are shared by reference during extraction.

mod cell;
mod row;
mod sheet;

pub use cell::*;
pub use row::*;
pub use sheet::*;
