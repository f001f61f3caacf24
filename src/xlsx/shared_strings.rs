//! XLSX shared strings parsing.

use crate::error::{Error, Result};
use crate::xml::{XmlEvent, XmlEventSource};
use std::borrow::Cow;

/// Shared strings table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    /// All strings in order
    strings: Vec<String>,
}

impl SharedStrings {
    /// Create a table from already decoded strings.
    pub fn from_strings(strings: Vec<String>) -> Self {
        Self { strings }
    }

    /// Parse shared strings from an event source over `sharedStrings.xml`.
    ///
    /// Each `<si>` yields one entry: its `<t>` text, or the text of its rich
    /// runs concatenated. Phonetic runs (`<rPh>`) are left out.
    pub fn parse(source: &mut dyn XmlEventSource) -> Result<Self> {
        let mut strings = Vec::new();
        let mut runs = TextRuns::default();
        let mut in_si = false;

        loop {
            match source.next_event()? {
                XmlEvent::Start(e) if e.name == "si" => {
                    in_si = true;
                    runs.clear();
                }
                XmlEvent::Start(e) if in_si => runs.start(&e.name),
                XmlEvent::Text(text) if in_si => runs.text(&text),
                XmlEvent::End(name) if name == "si" => {
                    strings.push(runs.take());
                    in_si = false;
                }
                XmlEvent::End(name) if in_si => runs.end(&name),
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Get a string by index, failing when the index is past the end.
    pub fn resolve(&self, index: usize) -> Result<&str> {
        self.get(index).ok_or(Error::SharedStringOutOfRange {
            index,
            len: self.strings.len(),
        })
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Collects the text of a string item (`<si>` or inline `<is>`).
#[derive(Debug, Default)]
pub(crate) struct TextRuns {
    in_t: bool,
    phonetic_depth: usize,
    text: String,
}

impl TextRuns {
    pub(crate) fn start(&mut self, name: &str) {
        match name {
            "rPh" => self.phonetic_depth += 1,
            "t" if self.phonetic_depth == 0 => self.in_t = true,
            _ => {}
        }
    }

    pub(crate) fn end(&mut self, name: &str) {
        match name {
            "rPh" => self.phonetic_depth = self.phonetic_depth.saturating_sub(1),
            "t" => self.in_t = false,
            _ => {}
        }
    }

    pub(crate) fn text(&mut self, text: &str) {
        if self.in_t {
            self.text.push_str(text);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.in_t = false;
        self.phonetic_depth = 0;
        self.text.clear();
    }

    /// Take the collected text with `_xHHHH_` escapes decoded.
    pub(crate) fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.clear();
        match decode_escapes(&text) {
            Cow::Borrowed(_) => text,
            Cow::Owned(decoded) => decoded,
        }
    }
}

/// Decode `_xHHHH_` escapes, used for characters XML cannot carry.
///
/// `_x005F_` escapes a literal underscore, so `_x005F_x0041_` decodes to
/// `_x0041_`.
pub fn decode_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i + 7 <= bytes.len() {
        if bytes[i] == b'_'
            && bytes[i + 1] == b'x'
            && bytes[i + 6] == b'_'
            && bytes[i + 2..i + 6].iter().all(u8::is_ascii_hexdigit)
        {
            let decoded = u32::from_str_radix(&text[i + 2..i + 6], 16)
                .ok()
                .and_then(char::from_u32);
            if let Some(c) = decoded {
                out.push_str(&text[copied..i]);
                out.push(c);
                i += 7;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    if copied == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}
