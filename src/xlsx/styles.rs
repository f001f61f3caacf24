//! XLSX styles parsing for date detection.

use crate::error::Result;
use crate::xml::{XmlEvent, XmlEventSource};
use std::collections::{HashMap, HashSet};

/// Built-in number format ids that display dates or times.
const BUILTIN_DATE_FORMATS: [std::ops::RangeInclusive<u32>; 4] = [14..=22, 27..=36, 45..=47, 50..=58];

/// Set of cell style indices whose number format is a date or time.
///
/// Built from `xl/styles.xml`: custom formats come from `<numFmts>`, and each
/// `<xf>` in `<cellXfs>` assigns a number format to the style index equal to
/// its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFormats {
    date_styles: HashSet<u32>,
}

impl DateFormats {
    /// Parse the styles part.
    pub fn parse(source: &mut dyn XmlEventSource) -> Result<Self> {
        let mut num_fmts: HashMap<u32, String> = HashMap::new();
        let mut cell_xfs: Vec<u32> = Vec::new();
        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;
        let mut xf_depth = 0usize;

        loop {
            match source.next_event()? {
                XmlEvent::Start(e) => match e.name.as_str() {
                    "numFmts" => in_num_fmts = true,
                    "cellXfs" => in_cell_xfs = true,
                    "numFmt" if in_num_fmts => {
                        let id = e.attr("numFmtId").and_then(|v| v.trim().parse().ok());
                        if let Some(id) = id {
                            num_fmts.insert(id, e.attr("formatCode").unwrap_or_default().to_string());
                        }
                    }
                    "xf" if in_cell_xfs => {
                        if xf_depth == 0 {
                            let id = e
                                .attr("numFmtId")
                                .and_then(|v| v.trim().parse().ok())
                                .unwrap_or(0);
                            cell_xfs.push(id);
                        }
                        xf_depth += 1;
                    }
                    _ => {}
                },
                XmlEvent::End(name) => match name.as_str() {
                    "numFmts" => in_num_fmts = false,
                    "cellXfs" => in_cell_xfs = false,
                    "xf" if in_cell_xfs => xf_depth = xf_depth.saturating_sub(1),
                    _ => {}
                },
                XmlEvent::Eof => break,
                XmlEvent::Text(_) => {}
            }
        }

        let date_styles = cell_xfs
            .iter()
            .enumerate()
            .filter(|(_, id)| match num_fmts.get(id) {
                Some(code) => is_date_format_code(code),
                None => is_builtin_date_format(**id),
            })
            .map(|(index, _)| index as u32)
            .collect();

        Ok(Self { date_styles })
    }

    /// Create a set from explicit style indices.
    pub fn from_styles(styles: impl IntoIterator<Item = u32>) -> Self {
        Self {
            date_styles: styles.into_iter().collect(),
        }
    }

    /// Check whether cells with this style index hold dates.
    pub fn is_date_style(&self, style_index: u32) -> bool {
        self.date_styles.contains(&style_index)
    }

    /// Number of date styles.
    pub fn len(&self) -> usize {
        self.date_styles.len()
    }

    /// Check if no style is a date style.
    pub fn is_empty(&self) -> bool {
        self.date_styles.is_empty()
    }
}

/// Check if a built-in number format id is a date/time format.
pub fn is_builtin_date_format(num_fmt_id: u32) -> bool {
    BUILTIN_DATE_FORMATS.iter().any(|r| r.contains(&num_fmt_id))
}

/// Check if a custom format code displays a date or time.
///
/// Only the first section (up to `;`) is inspected. Quoted literals,
/// backslash escapes, `_`/`*` padding and bracketed sections such as `[Red]`
/// or `[$-409]` are skipped; elapsed-time brackets (`[h]`, `[mm]`, `[ss]`)
/// count as time.
pub fn is_date_format_code(format_code: &str) -> bool {
    let mut chars = format_code.chars();

    while let Some(c) = chars.next() {
        match c {
            ';' => return false,
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let mut section = String::new();
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                    section.push(b);
                }
                if is_elapsed_time(&section) {
                    return true;
                }
            }
            _ => {
                if matches!(c.to_ascii_lowercase(), 'd' | 'y' | 'm' | 'h' | 's') {
                    return true;
                }
            }
        }
    }

    false
}

/// `[h]`, `[hh]`, `[mm]`, `[ss]` and so on.
fn is_elapsed_time(section: &str) -> bool {
    let lower = section.to_ascii_lowercase();
    match lower.chars().next() {
        Some(first @ ('h' | 'm' | 's')) => lower.chars().all(|c| c == first),
        _ => false,
    }
}
