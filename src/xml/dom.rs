//! roxmltree event source.

use super::{XmlElement, XmlEvent, XmlEventSource};
use crate::error::Result;
use roxmltree::{Document, Node};
use std::vec::IntoIter;

/// Event source that parses the whole part into a tree first.
///
/// The tree is walked once at construction and replayed as owned events, so
/// parse errors surface from [`DomSource::parse`] before any event is read.
pub struct DomSource {
    events: IntoIter<XmlEvent>,
}

impl DomSource {
    /// Parse XML text and prepare its event sequence.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)?;
        let mut events: Vec<XmlEvent> = Vec::new();
        for child in doc.root().children() {
            flatten(child, &mut events);
        }

        Ok(Self {
            events: events.into_iter(),
        })
    }
}

/// Append the events of `node` and its subtree in document order.
fn flatten(node: Node<'_, '_>, events: &mut Vec<XmlEvent>) {
    if node.is_element() {
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        let name = node.tag_name().name().to_string();
        events.push(XmlEvent::Start(XmlElement {
            name: name.clone(),
            attributes,
        }));
        for child in node.children() {
            flatten(child, events);
        }
        events.push(XmlEvent::End(name));
    } else if node.is_text() {
        let text = node.text().unwrap_or_default();
        if text.is_empty() {
            return;
        }
        match events.last_mut() {
            Some(XmlEvent::Text(prev)) => prev.push_str(text),
            _ => events.push(XmlEvent::Text(text.to_string())),
        }
    }
}

impl XmlEventSource for DomSource {
    fn next_event(&mut self) -> Result<XmlEvent> {
        Ok(self.events.next().unwrap_or(XmlEvent::Eof))
    }
}
