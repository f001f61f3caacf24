//! Spreadsheet package detection.

use crate::container::SpreadsheetContainer;
use crate::error::{Error, Result};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Content type for a regular workbook part (.xlsx).
const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for a macro-enabled workbook part (.xlsm).
const MACRO_WORKBOOK_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Content type for a workbook template part (.xltx).
const TEMPLATE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml";

/// Content type for a macro-enabled template part (.xltm).
const MACRO_TEMPLATE_CONTENT_TYPE: &str =
    "application/vnd.ms-excel.template.macroEnabled.main+xml";

/// Detected flavor of a spreadsheet package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Regular workbook (.xlsx)
    Workbook,
    /// Macro-enabled workbook (.xlsm)
    MacroEnabled,
    /// Template (.xltx)
    Template,
    /// Macro-enabled template (.xltm)
    MacroTemplate,
}

impl PackageKind {
    /// Returns the file extension for this package kind.
    pub fn extension(&self) -> &'static str {
        match self {
            PackageKind::Workbook => "xlsx",
            PackageKind::MacroEnabled => "xlsm",
            PackageKind::Template => "xltx",
            PackageKind::MacroTemplate => "xltm",
        }
    }

    /// Returns a human-readable name for this package kind.
    pub fn name(&self) -> &'static str {
        match self {
            PackageKind::Workbook => "Excel Workbook",
            PackageKind::MacroEnabled => "Excel Macro-Enabled Workbook",
            PackageKind::Template => "Excel Template",
            PackageKind::MacroTemplate => "Excel Macro-Enabled Template",
        }
    }
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the package kind of an opened container.
///
/// Inspects `[Content_Types].xml`; when that part is missing or names no
/// spreadsheet content type, falls back to looking for `xl/workbook.xml`.
pub fn detect_package(container: &SpreadsheetContainer) -> Result<PackageKind> {
    if container.exists("[Content_Types].xml") {
        let content_types = container.read_xml("[Content_Types].xml")?;
        if content_types.contains(MACRO_TEMPLATE_CONTENT_TYPE) {
            return Ok(PackageKind::MacroTemplate);
        }
        if content_types.contains(MACRO_WORKBOOK_CONTENT_TYPE) {
            return Ok(PackageKind::MacroEnabled);
        }
        if content_types.contains(TEMPLATE_CONTENT_TYPE) {
            return Ok(PackageKind::Template);
        }
        if content_types.contains(WORKBOOK_CONTENT_TYPE) {
            return Ok(PackageKind::Workbook);
        }
    }

    detect_by_folder_structure(container)
}

/// Detect the package kind from raw bytes.
///
/// # Example
///
/// ```no_run
/// use xlsx_extract::detect::{detect_package_from_bytes, PackageKind};
///
/// let data = std::fs::read("data.xlsx")?;
/// assert_eq!(detect_package_from_bytes(&data)?, PackageKind::Workbook);
/// # Ok::<(), xlsx_extract::Error>(())
/// ```
pub fn detect_package_from_bytes(data: &[u8]) -> Result<PackageKind> {
    if !is_zip_file(data) {
        return Err(Error::CorruptArchive("missing ZIP signature".to_string()));
    }
    let container = SpreadsheetContainer::from_bytes(data.to_vec())?;
    detect_package(&container)
}

/// Fallback detection by checking folder structure.
fn detect_by_folder_structure(container: &SpreadsheetContainer) -> Result<PackageKind> {
    if container.exists("xl/workbook.xml") {
        return Ok(PackageKind::Workbook);
    }

    let names = container.list_files();
    if names.iter().any(|n| n.starts_with("word/")) {
        Err(Error::NotSpreadsheet("word processing document".to_string()))
    } else if names.iter().any(|n| n.starts_with("ppt/")) {
        Err(Error::NotSpreadsheet("presentation".to_string()))
    } else {
        Err(Error::NotSpreadsheet(
            "no spreadsheet content type or workbook part".to_string(),
        ))
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}
