//! quick-xml event source.

use super::{XmlElement, XmlEvent, XmlEventSource};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, Cursor};

/// Streaming event source backed by `quick_xml::Reader`.
///
/// Adjacent text and CDATA sections are coalesced into a single
/// [`XmlEvent::Text`]; text outside the root element is dropped.
pub struct QuickXmlSource<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    queued: Option<XmlEvent>,
}

impl QuickXmlSource<Cursor<Vec<u8>>> {
    /// Create a source over already decoded XML text.
    pub fn from_string(xml: String) -> Self {
        Self::from_reader(Cursor::new(xml.into_bytes()))
    }
}

impl<R: BufRead> QuickXmlSource<R> {
    /// Create a source over a buffered UTF-8 reader.
    pub fn from_reader(reader: R) -> Self {
        let mut reader = Reader::from_reader(reader);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = true;
        config.check_end_names = true;

        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            queued: None,
        }
    }

    /// Read the next structural event or a text fragment.
    fn read_fragment(&mut self) -> Result<Fragment> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    self.depth += 1;
                    return Ok(Fragment::Event(XmlEvent::Start(element_from(&e)?)));
                }
                Event::End(e) => {
                    self.depth = self.depth.saturating_sub(1);
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    return Ok(Fragment::Event(XmlEvent::End(name)));
                }
                Event::Text(e) if self.depth > 0 => {
                    let text = e.unescape()?;
                    if !text.is_empty() {
                        return Ok(Fragment::Text(text.into_owned()));
                    }
                }
                Event::CData(e) if self.depth > 0 => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    return Ok(Fragment::Text(text));
                }
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(Error::XmlParse(format!(
                            "unexpected end of document with {} unclosed element(s)",
                            self.depth
                        )));
                    }
                    return Ok(Fragment::Event(XmlEvent::Eof));
                }
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }
    }
}

enum Fragment {
    Text(String),
    Event(XmlEvent),
}

/// Convert a start tag into an owned element.
fn element_from(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement { name, attributes })
}

impl<R: BufRead> XmlEventSource for QuickXmlSource<R> {
    fn next_event(&mut self) -> Result<XmlEvent> {
        if let Some(event) = self.queued.take() {
            return Ok(event);
        }

        let mut text = String::new();
        loop {
            match self.read_fragment()? {
                Fragment::Text(t) => text.push_str(&t),
                Fragment::Event(event) => {
                    if text.is_empty() {
                        return Ok(event);
                    }
                    self.queued = Some(event);
                    return Ok(XmlEvent::Text(text));
                }
            }
        }
    }
}
