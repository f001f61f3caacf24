//! Pluggable XML event sources.
//!
//! Every package part is read through an [`XmlEventSource`], which delivers
//! element starts (with attributes), text and element ends in document order.
//! Two backends implement it:
//!
//! - [`QuickXmlSource`]: pull tokenizer reading the part incrementally (default)
//! - [`DomSource`]: parses the part with roxmltree, then replays the tree
//!
//! Both report malformed markup, including a document that ends while elements
//! are still open, as [`Error::XmlParse`](crate::Error::XmlParse).

mod dom;
mod encoding;
mod quick;

pub use dom::DomSource;
pub use encoding::decode_xml_bytes;
pub use quick::QuickXmlSource;

use crate::error::{Error, Result};
use encoding::PartEncoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufReader, Read};
use std::str::FromStr;

/// An element start tag with its attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name, namespace prefix stripped
    pub name: String,
    /// Attributes as (local name, unescaped value), namespace declarations excluded
    pub attributes: Vec<(String, String)>,
}

impl XmlElement {
    /// Create an element with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Look up an attribute value by local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A single XML event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Element opened. Self-closing elements produce `Start` then `End`.
    Start(XmlElement),
    /// Character data (entities resolved, CDATA included verbatim)
    Text(String),
    /// Element closed (local name)
    End(String),
    /// End of document
    Eof,
}

/// Source of XML events for one package part.
pub trait XmlEventSource {
    /// Pull the next event. After `Eof` every call returns `Eof` again.
    fn next_event(&mut self) -> Result<XmlEvent>;
}

impl<S: XmlEventSource + ?Sized> XmlEventSource for Box<S> {
    fn next_event(&mut self) -> Result<XmlEvent> {
        (**self).next_event()
    }
}

/// Boxed event source as handed out by [`XmlBackend::open`].
pub type BoxedSource = Box<dyn XmlEventSource + Send>;

/// Selects the XML event source implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XmlBackend {
    /// Streaming pull parser (quick-xml)
    #[default]
    QuickXml,
    /// Tree parser (roxmltree), replayed as events
    #[serde(alias = "dom")]
    RoxmlTree,
}

impl XmlBackend {
    /// All available backends.
    pub const ALL: [XmlBackend; 2] = [XmlBackend::QuickXml, XmlBackend::RoxmlTree];

    /// Returns the identifier used in options and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            XmlBackend::QuickXml => "quick-xml",
            XmlBackend::RoxmlTree => "roxmltree",
        }
    }

    /// Open an event source over decoded XML text.
    pub fn open(self, xml: String) -> Result<BoxedSource> {
        match self {
            XmlBackend::QuickXml => Ok(Box::new(QuickXmlSource::from_string(xml))),
            XmlBackend::RoxmlTree => Ok(Box::new(DomSource::parse(&xml)?)),
        }
    }

    /// Open an event source over the byte stream of a part.
    ///
    /// `QuickXml` parses UTF-8 input as it is read. `RoxmlTree`, and either
    /// backend on UTF-16 input, read the whole stream first.
    pub fn open_reader<R: Read + Send + 'static>(self, reader: R) -> Result<BoxedSource> {
        let mut reader = BufReader::new(reader);
        let encoding = encoding::sniff(&mut reader)?;

        if self == XmlBackend::QuickXml && encoding == PartEncoding::Utf8 {
            return Ok(Box::new(QuickXmlSource::from_reader(reader)));
        }

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::CorruptPart(e.to_string()))?;
        self.open(decode_xml_bytes(&bytes)?)
    }
}

impl fmt::Display for XmlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for XmlBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quick-xml" | "quickxml" | "quick" => Ok(XmlBackend::QuickXml),
            "roxmltree" | "dom" => Ok(XmlBackend::RoxmlTree),
            other => Err(Error::InvalidOptions(format!("unknown XML parser: {}", other))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Drain a source into a vector, including the final `Eof`.
    pub(crate) fn collect_events(source: &mut dyn XmlEventSource) -> Result<Vec<XmlEvent>> {
        let mut events = Vec::new();
        loop {
            let event = source.next_event()?;
            let done = event == XmlEvent::Eof;
            events.push(event);
            if done {
                return Ok(events);
            }
        }
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<x:sheetData xmlns:x="urn:test" xmlns:r="urn:rel"><x:row r="1"><x:c r="A1" t="s"><x:v>0</x:v></x:c><x:c r="B1"/></x:row><x:note r:id="rId1">a &amp; b<![CDATA[<raw>]]></x:note></x:sheetData>"#;

    #[test]
    fn test_backends_agree() {
        let mut quick = XmlBackend::QuickXml.open(SAMPLE.to_string()).unwrap();
        let mut dom = XmlBackend::RoxmlTree.open(SAMPLE.to_string()).unwrap();
        let a = collect_events(&mut quick).unwrap();
        let b = collect_events(&mut dom).unwrap();
        assert_eq!(a, b);

        assert_eq!(
            a[0],
            XmlEvent::Start(XmlElement::new("sheetData"))
        );
        assert_eq!(
            a[2],
            XmlEvent::Start(
                XmlElement::new("c")
                    .with_attr("r", "A1")
                    .with_attr("t", "s")
            )
        );
        assert!(a.contains(&XmlEvent::Start(
            XmlElement::new("note").with_attr("id", "rId1")
        )));
        assert!(a.contains(&XmlEvent::End("c".to_string())));
        assert_eq!(a.last(), Some(&XmlEvent::Eof));
    }

    #[test]
    fn test_text_and_cdata() {
        for backend in XmlBackend::ALL {
            let mut source = backend.open(SAMPLE.to_string()).unwrap();
            let text: String = collect_events(&mut source)
                .unwrap()
                .into_iter()
                .filter_map(|e| match e {
                    XmlEvent::Text(t) => Some(t),
                    _ => None,
                })
                .collect();
            assert_eq!(text, "0a & b<raw>", "backend {}", backend);
        }
    }

    #[test]
    fn test_malformed_markup() {
        for backend in XmlBackend::ALL {
            let result = backend
                .open("<a><b></a>".to_string())
                .and_then(|mut s| collect_events(&mut s));
            assert!(
                matches!(result, Err(Error::XmlParse(_))),
                "backend {} accepted mismatched tags",
                backend
            );
        }
    }

    #[test]
    fn test_unclosed_document() {
        for backend in XmlBackend::ALL {
            let result = backend
                .open("<a><b>text</b>".to_string())
                .and_then(|mut s| collect_events(&mut s));
            assert!(
                matches!(result, Err(Error::XmlParse(_))),
                "backend {} accepted truncated document",
                backend
            );
        }
    }

    /// Reader that yields its input in small pieces, then fails.
    struct Failing {
        data: std::io::Cursor<Vec<u8>>,
    }

    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(8);
            let n = self.data.read(&mut buf[..len])?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "inflate failed",
                ));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_open_reader_streams() {
        let xml = b"<a><b>one</b><b>two</b>".to_vec();
        let mut source = XmlBackend::QuickXml
            .open_reader(Failing {
                data: std::io::Cursor::new(xml.clone()),
            })
            .unwrap();
        assert_eq!(
            source.next_event().unwrap(),
            XmlEvent::Start(XmlElement::new("a"))
        );
        assert_eq!(
            source.next_event().unwrap(),
            XmlEvent::Start(XmlElement::new("b"))
        );
        assert_eq!(source.next_event().unwrap(), XmlEvent::Text("one".to_string()));
        let rest: Result<Vec<_>> = (0..6).map(|_| source.next_event()).collect();
        assert!(matches!(rest, Err(Error::CorruptPart(_))));

        let result = XmlBackend::RoxmlTree.open_reader(Failing {
            data: std::io::Cursor::new(xml),
        });
        assert!(matches!(result, Err(Error::CorruptPart(_))));
    }

    #[test]
    fn test_open_reader_matches_open() {
        let mut bom = vec![0xEF, 0xBB, 0xBF];
        bom.extend_from_slice(SAMPLE.as_bytes());
        for backend in XmlBackend::ALL {
            let mut streamed = backend.open_reader(std::io::Cursor::new(bom.clone())).unwrap();
            let mut decoded = backend.open(SAMPLE.to_string()).unwrap();
            assert_eq!(
                collect_events(&mut streamed).unwrap(),
                collect_events(&mut decoded).unwrap(),
                "backend {}",
                backend
            );
        }
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("quick-xml".parse::<XmlBackend>().unwrap(), XmlBackend::QuickXml);
        assert_eq!("DOM".parse::<XmlBackend>().unwrap(), XmlBackend::RoxmlTree);
        assert!("expat".parse::<XmlBackend>().is_err());
        assert_eq!(XmlBackend::RoxmlTree.to_string(), "roxmltree");
    }
}
