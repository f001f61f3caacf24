//! Output rendering for extraction events.
//!
//! Two renderers consume the same event stream:
//!
//! - delimited text ([`TsvWriter`], [`write_events`]): rows only, one line each
//! - JSON lines ([`write_json_lines`]): every event as one JSON object
//!
//! # Example
//!
//! ```no_run
//! use xlsx_extract::{extract_file, ExtractOptions};
//! use xlsx_extract::render::{write_events, TsvOptions};
//!
//! let events = extract_file("data.xlsx", &ExtractOptions::default());
//! let rows = write_events(events, std::io::stdout().lock(), &TsvOptions::default())?;
//! eprintln!("{} rows", rows);
//! # Ok::<(), xlsx_extract::Error>(())
//! ```

mod json;
mod options;
mod tsv;

pub use json::{event_to_json, write_json_lines, EventFormat};
pub use options::TsvOptions;
pub use tsv::{to_tsv_string, write_events, TsvWriter};
