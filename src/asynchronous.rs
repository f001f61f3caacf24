//! Async entry points (feature `async`).
//!
//! The archive is read with Tokio's non-blocking file I/O. Parsing is
//! unchanged and runs when events are pulled.

use crate::error::{Error, Result};
use crate::extract::{ExtractOptions, Extraction};
use crate::xlsx::Workbook;
use crate::xml::XmlBackend;
use std::path::Path;

/// Open a workbook, reading the file asynchronously.
pub async fn open_async(path: impl AsRef<Path>, backend: XmlBackend) -> Result<Workbook> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ArchiveNotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    Workbook::from_bytes(data, backend)
}

/// Async counterpart of [`extract_file`](crate::extract_file).
pub async fn extract_file_async(path: impl AsRef<Path>, options: &ExtractOptions) -> Extraction {
    match open_async(path, options.parser).await {
        Ok(workbook) => workbook.extract(options),
        Err(e) => Extraction::failed(e),
    }
}
