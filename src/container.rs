//! ZIP container access for spreadsheet packages.

use crate::error::{Error, Result};
use crate::xml::{decode_xml_bytes, BoxedSource, XmlBackend, XmlEvent, XmlEventSource};
use flate2::read::DeflateDecoder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, Take};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use zip::CompressionMethod;

/// A relationship entry from a .rels part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Collection of relationships parsed from a .rels part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
    /// Map from relationship type to list of relationships
    pub by_type: HashMap<String, Vec<Relationship>>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a relationships part from an event source.
    pub fn parse(source: &mut dyn XmlEventSource) -> Result<Self> {
        let mut rels = Relationships::new();

        loop {
            match source.next_event()? {
                XmlEvent::Start(e) if e.name == "Relationship" => {
                    let id = e.attr("Id").unwrap_or_default().to_string();
                    if id.is_empty() {
                        continue;
                    }
                    rels.add(Relationship {
                        id,
                        rel_type: e.attr("Type").unwrap_or_default().to_string(),
                        target: e.attr("Target").unwrap_or_default().to_string(),
                        external: e
                            .attr("TargetMode")
                            .is_some_and(|m| m.eq_ignore_ascii_case("external")),
                    });
                }
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Find the first relationship whose type URI ends with `/{suffix}`.
    ///
    /// Transitional and strict packages use different type URI prefixes for
    /// the same relationship, so lookups go by the final path segment.
    pub fn find_by_type_suffix(&self, suffix: &str) -> Option<&Relationship> {
        self.by_type
            .iter()
            .filter(|(t, _)| t.rsplit('/').next() == Some(suffix))
            .flat_map(|(_, rels)| rels.iter())
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// Add a relationship.
    pub fn add(&mut self, rel: Relationship) {
        self.by_type
            .entry(rel.rel_type.clone())
            .or_default()
            .push(rel.clone());
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Location of a part's data inside the archive buffer.
#[derive(Debug, Clone, Copy)]
struct PartEntry {
    method: CompressionMethod,
    start: u64,
    compressed_size: u64,
    size: u64,
    crc32: u32,
}

enum PartBody {
    Stored(Take<Cursor<Arc<[u8]>>>),
    Deflated(DeflateDecoder<Take<Cursor<Arc<[u8]>>>>),
    Buffered(Cursor<Vec<u8>>),
}

/// Byte stream over one part, inflated as it is read.
///
/// The CRC-32 and uncompressed size recorded in the archive are checked when
/// the stream reaches its end; a mismatch is reported as an
/// [`io::ErrorKind::InvalidData`] read error.
pub struct PartReader {
    path: String,
    body: PartBody,
    hasher: crc32fast::Hasher,
    expected_crc: u32,
    expected_size: u64,
    read: u64,
    verified: bool,
}

impl PartReader {
    fn new(path: &str, body: PartBody, entry: &PartEntry) -> Self {
        Self {
            path: path.to_string(),
            // Buffered bodies were already checked by the zip crate
            verified: matches!(body, PartBody::Buffered(_)),
            body,
            hasher: crc32fast::Hasher::new(),
            expected_crc: entry.crc32,
            expected_size: entry.size,
            read: 0,
        }
    }

    fn invalid(&self, message: impl std::fmt::Display) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", self.path, message),
        )
    }

    fn verify(&mut self) -> io::Result<()> {
        if self.verified {
            return Ok(());
        }
        if self.read != self.expected_size {
            return Err(self.invalid(format_args!(
                "expected {} bytes, inflated {}",
                self.expected_size, self.read
            )));
        }
        if self.hasher.clone().finalize() != self.expected_crc {
            return Err(self.invalid("CRC mismatch"));
        }
        self.verified = true;
        Ok(())
    }
}

impl Read for PartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = match &mut self.body {
            PartBody::Stored(r) => r.read(buf),
            PartBody::Deflated(r) => r.read(buf),
            PartBody::Buffered(r) => r.read(buf),
        };
        let n = result.map_err(|e| self.invalid(e))?;

        if n == 0 {
            if !buf.is_empty() {
                self.verify()?;
            }
            return Ok(0);
        }

        self.hasher.update(&buf[..n]);
        self.read += n as u64;
        if self.read > self.expected_size && !self.verified {
            return Err(self.invalid("more data than the recorded size"));
        }
        Ok(n)
    }
}

impl std::fmt::Debug for PartReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartReader")
            .field("path", &self.path)
            .field("read", &self.read)
            .field("expected_size", &self.expected_size)
            .finish()
    }
}

/// Archive accessor over the ZIP container of a spreadsheet package.
///
/// Parts are looked up by their path inside the archive
/// (e.g. `xl/worksheets/sheet1.xml`). The archive bytes are held once and
/// shared by every open [`PartReader`].
pub struct SpreadsheetContainer {
    data: Arc<[u8]>,
    archive: RefCell<zip::ZipArchive<Cursor<Arc<[u8]>>>>,
}

impl SpreadsheetContainer {
    /// Open a container from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xlsx_extract::container::SpreadsheetContainer;
    ///
    /// let container = SpreadsheetContainer::open("data.xlsx")?;
    /// assert!(container.exists("xl/workbook.xml"));
    /// # Ok::<(), xlsx_extract::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ArchiveNotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        debug!(path = %path.display(), bytes = data.len(), "opened archive");
        Self::from_bytes(data)
    }

    /// Create a container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let data: Arc<[u8]> = Arc::from(data);
        let archive = zip::ZipArchive::new(Cursor::new(Arc::clone(&data)))
            .map_err(|e| Error::CorruptArchive(e.to_string()))?;
        Ok(Self {
            data,
            archive: RefCell::new(archive),
        })
    }

    /// Create a container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Find a part's entry and check that its data lies inside the archive.
    fn locate(&self, path: &str) -> Result<PartEntry> {
        let entry = {
            let mut archive = self.archive.borrow_mut();
            let file = archive.by_name(path).map_err(|e| match e {
                zip::result::ZipError::FileNotFound => Error::MissingPart(path.to_string()),
                other => Error::CorruptArchive(format!("{}: {}", path, other)),
            })?;
            PartEntry {
                method: file.compression(),
                start: file.data_start(),
                compressed_size: file.compressed_size(),
                size: file.size(),
                crc32: file.crc32(),
            }
        };

        let end = entry.start.checked_add(entry.compressed_size);
        if end.is_none_or(|end| end > self.data.len() as u64) {
            return Err(Error::CorruptArchive(format!(
                "{}: data runs past the end of the archive",
                path
            )));
        }
        Ok(entry)
    }

    /// Check that a part is present and its header is readable, without
    /// inflating it.
    pub fn check_part(&self, path: &str) -> Result<()> {
        self.locate(path).map(|_| ())
    }

    /// Open a byte stream over a part.
    ///
    /// Stored and deflated parts are inflated as they are read. Damage to the
    /// compressed data surfaces as a read error of the returned stream.
    pub fn open_part(&self, path: &str) -> Result<PartReader> {
        let entry = self.locate(path)?;
        let mut raw = Cursor::new(Arc::clone(&self.data));
        raw.set_position(entry.start);
        let raw = raw.take(entry.compressed_size);

        let body = match entry.method {
            CompressionMethod::Stored => PartBody::Stored(raw),
            CompressionMethod::Deflated => PartBody::Deflated(DeflateDecoder::new(raw)),
            other => {
                debug!(part = path, method = ?other, "reading part whole");
                let data = self
                    .read_part(path)
                    .map_err(|e| Error::CorruptPart(e.to_string()))?;
                PartBody::Buffered(Cursor::new(data))
            }
        };
        Ok(PartReader::new(path, body, &entry))
    }

    /// Read the raw bytes of a part.
    pub fn read_part(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive.by_name(path).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => Error::MissingPart(path.to_string()),
            other => Error::CorruptArchive(format!("{}: {}", path, other)),
        })?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::CorruptArchive(format!("{}: {}", path, e)))?;
        Ok(data)
    }

    /// Read a part as decoded XML text.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        decode_xml_bytes(&self.read_part(path)?)
    }

    /// Open an XML event source over a part.
    pub fn open_xml(&self, path: &str, backend: XmlBackend) -> Result<BoxedSource> {
        debug!(part = path, parser = %backend, "opening part");
        backend.open_reader(self.open_part(path)?)
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        self.archive.borrow().index_for_name(path).is_some()
    }

    /// List all parts in the archive.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }

    /// Read the relationships of a part (`""` for the package itself).
    ///
    /// A part without a relationships part has no relationships.
    pub fn read_relationships(
        &self,
        part_path: &str,
        backend: XmlBackend,
    ) -> Result<Relationships> {
        let rels_path = Self::rels_path_for(part_path);
        if !self.exists(&rels_path) {
            return Ok(Relationships::new());
        }
        let mut source = self.open_xml(&rels_path, backend)?;
        Relationships::parse(&mut source)
    }

    /// Path of the relationships part belonging to `part_path`.
    pub fn rels_path_for(part_path: &str) -> String {
        let part_path = part_path.trim_start_matches('/');
        if part_path.is_empty() {
            return "_rels/.rels".to_string();
        }
        match part_path.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None => format!("_rels/{}.rels", part_path),
        }
    }

    /// Resolve a relationship target relative to the part that owns it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut segments: Vec<&str> = match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
            None => Vec::new(),
        };
        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }

        segments.join("/")
    }
}

impl std::fmt::Debug for SpreadsheetContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadsheetContainer")
            .field("files", &self.archive.borrow().len())
            .field("bytes", &self.data.len())
            .finish()
    }
}
