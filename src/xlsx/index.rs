//! Workbook index: the ordered sheet list of `workbook.xml`.

use super::date::DateSystem;
use crate::container::{Relationships, SpreadsheetContainer};
use crate::error::{Error, Result};
use crate::extract::SheetSelector;
use crate::model::SheetDescriptor;
use crate::xml::{XmlEvent, XmlEventSource};
use tracing::debug;

/// Sheets of a workbook in workbook order, plus workbook-wide settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookIndex {
    sheets: Vec<SheetDescriptor>,
    date_system: DateSystem,
}

impl WorkbookIndex {
    /// Parse `workbook.xml`, resolving each sheet's relationship id through
    /// `rels` (the workbook's relationships) to a worksheet part path.
    ///
    /// Sheet numbers are positions in `<sheets>`, starting at 1; `sheetId`
    /// plays no part in them.
    pub fn parse(
        source: &mut dyn XmlEventSource,
        rels: &Relationships,
        workbook_path: &str,
    ) -> Result<Self> {
        let mut index = WorkbookIndex::default();
        let mut in_sheets = false;

        loop {
            match source.next_event()? {
                XmlEvent::Start(e) => match e.name.as_str() {
                    "workbookPr" => {
                        let date1904 = e
                            .attr("date1904")
                            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
                        index.date_system = DateSystem::from_date1904(date1904);
                    }
                    "sheets" => in_sheets = true,
                    "sheet" if in_sheets => {
                        let name = e.attr("name").unwrap_or_default();
                        let rid = e.attr("id").ok_or_else(|| {
                            Error::MalformedWorkbook(format!(
                                "sheet {:?} has no relationship id",
                                name
                            ))
                        })?;
                        let rel = rels.get(rid).filter(|r| !r.external).ok_or_else(|| {
                            Error::MalformedWorkbook(format!(
                                "relationship {} of sheet {:?} does not resolve to a part",
                                rid, name
                            ))
                        })?;
                        let part = SpreadsheetContainer::resolve_path(workbook_path, &rel.target);
                        let number = index.sheets.len() + 1;
                        debug!(number, name, rid, part = %part, "indexed sheet");
                        index
                            .sheets
                            .push(SheetDescriptor::new(number, name, rid, part));
                    }
                    _ => {}
                },
                XmlEvent::End(name) if name == "sheets" => in_sheets = false,
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        Ok(index)
    }

    /// All sheets in workbook order.
    pub fn sheets(&self) -> &[SheetDescriptor] {
        &self.sheets
    }

    /// Date system declared by the workbook.
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook lists no sheets.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Sheets matched by `selector`, in workbook order.
    ///
    /// Fails with [`Error::SheetNotFound`] when a single-sheet selector
    /// matches nothing. [`SheetSelector::All`] never fails.
    pub fn select(&self, selector: &SheetSelector) -> Result<Vec<SheetDescriptor>> {
        let selected: Vec<SheetDescriptor> = self
            .sheets
            .iter()
            .filter(|s| selector.matches(s))
            .cloned()
            .collect();

        if selected.is_empty() && !matches!(selector, SheetSelector::All) {
            return Err(Error::SheetNotFound(selector.to_string()));
        }
        debug!(%selector, count = selected.len(), "selected sheets");
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Relationship;
    use crate::xml::XmlBackend;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr date1904="1"/>
  <sheets>
    <sheet name="Data" sheetId="4" r:id="rId2"/>
    <sheet name="Summary" sheetId="1" r:id="rId1"/>
  </sheets>
  <definedNames><definedName name="x">Data!$A$1</definedName></definedNames>
</workbook>"#;

    fn rels() -> Relationships {
        let mut rels = Relationships::new();
        for (id, target) in [("rId1", "worksheets/sheet1.xml"), ("rId2", "/xl/worksheets/sheet2.xml")] {
            rels.add(Relationship {
                id: id.to_string(),
                rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"
                    .to_string(),
                target: target.to_string(),
                external: false,
            });
        }
        rels
    }

    fn parse(xml: &str, backend: XmlBackend) -> Result<WorkbookIndex> {
        let mut source = backend.open(xml.to_string())?;
        WorkbookIndex::parse(&mut source, &rels(), "xl/workbook.xml")
    }

    #[test]
    fn test_parse_index() {
        for backend in XmlBackend::ALL {
            let index = parse(WORKBOOK, backend).unwrap();
            assert_eq!(index.len(), 2);
            assert_eq!(index.date_system(), DateSystem::V1904);
            assert_eq!(
                index.sheets()[0],
                SheetDescriptor::new(1, "Data", "rId2", "xl/worksheets/sheet2.xml")
            );
            assert_eq!(
                index.sheets()[1],
                SheetDescriptor::new(2, "Summary", "rId1", "xl/worksheets/sheet1.xml")
            );
        }
    }

    #[test]
    fn test_unresolved_relationship() {
        let xml = r#"<workbook xmlns:r="urn:r"><sheets><sheet name="Lost" sheetId="1" r:id="rId9"/></sheets></workbook>"#;
        for backend in XmlBackend::ALL {
            assert!(matches!(parse(xml, backend), Err(Error::MalformedWorkbook(_))));
        }

        let xml = r#"<workbook><sheets><sheet name="NoId" sheetId="1"/></sheets></workbook>"#;
        assert!(matches!(
            parse(xml, XmlBackend::QuickXml),
            Err(Error::MalformedWorkbook(_))
        ));
    }

    #[test]
    fn test_select() {
        let index = parse(WORKBOOK, XmlBackend::QuickXml).unwrap();

        assert_eq!(index.select(&SheetSelector::All).unwrap().len(), 2);
        assert_eq!(index.select(&SheetSelector::Number(2)).unwrap()[0].name, "Summary");
        assert_eq!(
            index.select(&SheetSelector::Name("Data".into())).unwrap()[0].number,
            1
        );
        assert_eq!(
            index.select(&SheetSelector::Id("rId1".into())).unwrap()[0].name,
            "Summary"
        );

        assert!(matches!(
            index.select(&SheetSelector::Number(3)),
            Err(Error::SheetNotFound(_))
        ));
        assert!(matches!(
            index.select(&SheetSelector::Name("Missing".into())),
            Err(Error::SheetNotFound(_))
        ));
    }
}
