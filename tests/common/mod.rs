//! Spreadsheet packages built in memory for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

const CONTENT_TYPES_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Style indices of [`DEFAULT_STYLES`].
pub const STYLE_GENERAL: u32 = 0;
pub const STYLE_DATE: u32 = 1;
pub const STYLE_PERCENT: u32 = 2;
pub const STYLE_DATETIME: u32 = 3;

/// General, built-in date (14), percent (10) and a custom date-time format.
pub const DEFAULT_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts><cellXfs count="4"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="10" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

/// Builder for a minimal but complete workbook package.
pub struct WorkbookFixture {
    sheets: Vec<(String, Vec<u8>)>,
    shared_strings: Vec<String>,
    styles: Option<String>,
    date1904: bool,
    omitted: Vec<String>,
    method: zip::CompressionMethod,
}

impl Default for WorkbookFixture {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: Vec::new(),
            styles: Some(DEFAULT_STYLES.to_string()),
            date1904: false,
            omitted: Vec::new(),
            method: zip::CompressionMethod::Deflated,
        }
    }
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet whose `<sheetData>` content is `rows`.
    pub fn sheet(mut self, name: &str, rows: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}"><dimension ref="A1"/><sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetFormatPr defaultRowHeight="15"/><sheetData>{}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#,
            REL_NS, rows
        );
        self.sheets.push((name.to_string(), xml.into_bytes()));
        self
    }

    /// Add a sheet with the worksheet part written verbatim.
    pub fn raw_sheet(self, name: &str, xml: &str) -> Self {
        self.raw_sheet_bytes(name, xml.as_bytes())
    }

    /// Add a sheet whose part holds arbitrary bytes, valid XML or not.
    pub fn raw_sheet_bytes(mut self, name: &str, data: &[u8]) -> Self {
        self.sheets.push((name.to_string(), data.to_vec()));
        self
    }

    /// Store parts uncompressed, so their bytes can be patched in place.
    pub fn stored(mut self) -> Self {
        self.method = zip::CompressionMethod::Stored;
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = None;
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Leave a part out of the package.
    pub fn without(mut self, part: &str) -> Self {
        self.omitted.push(part.to_string());
        self
    }

    /// Relationship id of the sheet at a 0-based position.
    pub fn sheet_rid(position: usize) -> String {
        format!("rId{}", position + 10)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();

        let mut content_types = CONTENT_TYPES_HEAD.to_string();
        let mut workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}"><workbookPr{}/><bookViews><workbookView/></bookViews><sheets>"#,
            REL_NS,
            if self.date1904 { r#" date1904="1""# } else { "" }
        );
        let mut workbook_rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for (i, (name, data)) in self.sheets.iter().enumerate() {
            let rid = Self::sheet_rid(i);
            let part = format!("xl/worksheets/sheet{}.xml", i + 1);
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
                name,
                i + 1,
                rid
            ));
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                rid,
                REL_NS,
                i + 1
            ));
            content_types.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                part
            ));
            parts.push((part, data.clone()));
        }

        workbook.push_str("</sheets></workbook>");

        if !self.shared_strings.is_empty() {
            let items: String = self
                .shared_strings
                .iter()
                .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, s))
                .collect();
            parts.push((
                "xl/sharedStrings.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
                    self.shared_strings.len(),
                    items
                )
                .into_bytes(),
            ));
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rId2" Type="{}/sharedStrings" Target="sharedStrings.xml"/>"#,
                REL_NS
            ));
        }

        if let Some(ref styles) = self.styles {
            parts.push(("xl/styles.xml".to_string(), styles.clone().into_bytes()));
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rId3" Type="{}/styles" Target="styles.xml"/>"#,
                REL_NS
            ));
        }

        workbook_rels.push_str("</Relationships>");
        content_types.push_str("</Types>");

        parts.push(("[Content_Types].xml".to_string(), content_types.into_bytes()));
        parts.push(("_rels/.rels".to_string(), PACKAGE_RELS.as_bytes().to_vec()));
        parts.push(("xl/workbook.xml".to_string(), workbook.into_bytes()));
        parts.push(("xl/_rels/workbook.xml.rels".to_string(), workbook_rels.into_bytes()));

        zip_parts_with(
            parts
                .into_iter()
                .filter(|(name, _)| !self.omitted.contains(name)),
            self.method,
        )
    }

    /// Write the package into `dir` and return its path.
    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Zip arbitrary parts.
pub fn zip_parts<N: AsRef<str>, D: AsRef<[u8]>>(parts: impl IntoIterator<Item = (N, D)>) -> Vec<u8> {
    zip_parts_with(parts, zip::CompressionMethod::Deflated)
}

/// Zip arbitrary parts with one compression method.
pub fn zip_parts_with<N: AsRef<str>, D: AsRef<[u8]>>(
    parts: impl IntoIterator<Item = (N, D)>,
    method: zip::CompressionMethod,
) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default().compression_method(method);
        for (name, data) in parts {
            zip.start_file(name.as_ref(), options).unwrap();
            zip.write_all(data.as_ref()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer
}

/// Shared strings, inline strings, numbers, a boolean, dates and an empty row.
pub fn sample_workbook() -> WorkbookFixture {
    WorkbookFixture::new()
        .shared_strings(&["Name", "Amount", "Alice", "Bob"])
        .sheet(
            "Data",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>10.5</v></c></row><row r="3"/><row r="4"><c r="A4" t="s"><v>3</v></c><c r="B4" s="2"><v>0.25</v></c></row><row r="5"><c r="A5" t="inlineStr"><is><t>Carol</t></is></c><c r="B5" t="b"><v>1</v></c><c r="C5" s="1"><v>44197</v></c></row>"#,
        )
        .sheet(
            "Summary",
            r#"<row r="1"><c r="A1" t="str"><f>COUNTA(Data!A:A)</f><v>4</v></c><c r="B1"><v>3</v></c></row>"#,
        )
        .sheet("Blank", "")
}
