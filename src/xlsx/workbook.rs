//! An opened spreadsheet package.

use super::date::DateSystem;
use super::index::WorkbookIndex;
use super::styles::DateFormats;
use super::worksheet::{CellResolver, WorksheetReader};
use super::SharedStrings;
use crate::container::{Relationships, SpreadsheetContainer};
use crate::detect::{detect_package, PackageKind};
use crate::error::{Error, Result};
use crate::extract::{ExtractOptions, Extraction};
use crate::model::SheetDescriptor;
use crate::xml::{BoxedSource, XmlBackend};
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_WORKBOOK_PATH: &str = "xl/workbook.xml";
const DEFAULT_SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
const DEFAULT_STYLES_PATH: &str = "xl/styles.xml";

/// A spreadsheet package with its workbook-wide lookup tables loaded.
///
/// Opening reads the workbook index, the shared string table and the date
/// styles. Worksheets are only read when their rows are requested.
///
/// # Example
///
/// ```no_run
/// use xlsx_extract::Workbook;
///
/// let workbook = Workbook::open("report.xlsx")?;
/// for sheet in workbook.sheets() {
///     let rows = workbook.rows(sheet, false)?;
///     println!("{}: {} rows", sheet.name, rows.count());
/// }
/// # Ok::<(), xlsx_extract::Error>(())
/// ```
#[derive(Debug)]
pub struct Workbook {
    container: SpreadsheetContainer,
    backend: XmlBackend,
    kind: PackageKind,
    workbook_path: String,
    index: WorkbookIndex,
    shared_strings: Arc<SharedStrings>,
    date_formats: Arc<DateFormats>,
}

impl Workbook {
    /// Open a workbook file with the default XML parser.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, XmlBackend::default())
    }

    /// Open a workbook file, reading every part with `backend`.
    pub fn open_with(path: impl AsRef<Path>, backend: XmlBackend) -> Result<Self> {
        Self::from_container(SpreadsheetContainer::open(path)?, backend)
    }

    /// Open a workbook from bytes.
    pub fn from_bytes(data: Vec<u8>, backend: XmlBackend) -> Result<Self> {
        Self::from_container(SpreadsheetContainer::from_bytes(data)?, backend)
    }

    /// Open a workbook from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R, backend: XmlBackend) -> Result<Self> {
        Self::from_container(SpreadsheetContainer::from_reader(reader)?, backend)
    }

    /// Load the workbook index and lookup tables of an opened container.
    pub fn from_container(container: SpreadsheetContainer, backend: XmlBackend) -> Result<Self> {
        Self::load(container, backend).map_err(|e| match e {
            // Damaged workbook-level parts leave nothing to extract
            Error::CorruptPart(message) => Error::CorruptArchive(message),
            other => other,
        })
    }

    fn load(container: SpreadsheetContainer, backend: XmlBackend) -> Result<Self> {
        let kind = detect_package(&container)?;

        let package_rels = container.read_relationships("", backend)?;
        let workbook_path = package_rels
            .find_by_type_suffix("officeDocument")
            .filter(|r| !r.external)
            .map(|r| SpreadsheetContainer::resolve_path("", &r.target))
            .filter(|p| container.exists(p))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PATH.to_string());
        if !container.exists(&workbook_path) {
            return Err(Error::MissingPart(workbook_path));
        }

        let rels_path = SpreadsheetContainer::rels_path_for(&workbook_path);
        if !container.exists(&rels_path) {
            return Err(Error::MissingPart(rels_path));
        }
        let rels = container.read_relationships(&workbook_path, backend)?;

        let mut source = container.open_xml(&workbook_path, backend)?;
        let index = WorkbookIndex::parse(&mut source, &rels, &workbook_path)?;

        let shared_strings = match locate_part(
            &container,
            &rels,
            &workbook_path,
            "sharedStrings",
            DEFAULT_SHARED_STRINGS_PATH,
        ) {
            Some(path) => SharedStrings::parse(&mut container.open_xml(&path, backend)?)?,
            None => SharedStrings::default(),
        };

        let date_formats = match locate_part(
            &container,
            &rels,
            &workbook_path,
            "styles",
            DEFAULT_STYLES_PATH,
        ) {
            Some(path) => DateFormats::parse(&mut container.open_xml(&path, backend)?)?,
            None => DateFormats::default(),
        };

        debug!(
            kind = %kind,
            workbook = %workbook_path,
            sheets = index.len(),
            shared_strings = shared_strings.len(),
            date_styles = date_formats.len(),
            "loaded workbook"
        );

        Ok(Self {
            container,
            backend,
            kind,
            workbook_path,
            index,
            shared_strings: Arc::new(shared_strings),
            date_formats: Arc::new(date_formats),
        })
    }

    /// Sheets in workbook order.
    pub fn sheets(&self) -> &[SheetDescriptor] {
        self.index.sheets()
    }

    /// The workbook index.
    pub fn index(&self) -> &WorkbookIndex {
        &self.index
    }

    /// Detected package kind.
    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// Archive path of the workbook part.
    pub fn workbook_path(&self) -> &str {
        &self.workbook_path
    }

    /// XML parser used for worksheet parts.
    pub fn backend(&self) -> XmlBackend {
        self.backend
    }

    /// Switch the XML parser used for worksheet parts read from now on.
    pub fn set_backend(&mut self, backend: XmlBackend) {
        self.backend = backend;
    }

    /// Date system declared by the workbook.
    pub fn date_system(&self) -> DateSystem {
        self.index.date_system()
    }

    /// Shared string table.
    pub fn shared_strings(&self) -> &Arc<SharedStrings> {
        &self.shared_strings
    }

    /// Date style set.
    pub fn date_formats(&self) -> &Arc<DateFormats> {
        &self.date_formats
    }

    /// The underlying container.
    pub fn container(&self) -> &SpreadsheetContainer {
        &self.container
    }

    /// A resolver sharing this workbook's lookup tables.
    pub fn resolver(&self, raw_values: bool) -> CellResolver {
        CellResolver::new(
            Arc::clone(&self.shared_strings),
            Arc::clone(&self.date_formats),
            self.date_system(),
        )
        .with_raw_values(raw_values)
    }

    /// Check that the worksheet part of `sheet` is present and its archive
    /// entry is readable. The part's data is not inflated.
    pub fn check_sheet(&self, sheet: &SheetDescriptor) -> Result<()> {
        self.container.check_part(&sheet.part)
    }

    /// Lazy rows of one sheet.
    pub fn rows(
        &self,
        sheet: &SheetDescriptor,
        raw_values: bool,
    ) -> Result<WorksheetReader<BoxedSource>> {
        self.check_sheet(sheet)?;
        let source = self.container.open_xml(&sheet.part, self.backend)?;
        Ok(WorksheetReader::new(
            source,
            self.resolver(raw_values),
            sheet.part.clone(),
        ))
    }

    /// Run the extraction pipeline over this workbook.
    pub fn extract(self, options: &ExtractOptions) -> Extraction {
        Extraction::new(self, options)
    }
}

/// Find a workbook-level part by relationship type, falling back to its
/// conventional path. Returns `None` when neither exists.
fn locate_part(
    container: &SpreadsheetContainer,
    rels: &Relationships,
    workbook_path: &str,
    type_suffix: &str,
    fallback: &str,
) -> Option<String> {
    let by_rel = rels
        .find_by_type_suffix(type_suffix)
        .filter(|r| !r.external)
        .map(|r| SpreadsheetContainer::resolve_path(workbook_path, &r.target));

    match by_rel {
        Some(path) if container.exists(&path) => Some(path),
        Some(path) => {
            tracing::warn!(part = %path, fallback, "relationship target missing");
            container.exists(fallback).then(|| fallback.to_string())
        }
        None => container.exists(fallback).then(|| fallback.to_string()),
    }
}
