//! Character encoding of package parts.
//!
//! Parts are UTF-8 in practice. A UTF-8 byte order mark is skipped while
//! streaming; UTF-16 parts are decoded whole before parsing.

use crate::error::{Error, Result};
use std::io::BufRead;

/// Encoding detected from the first bytes of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartEncoding {
    Utf8,
    Utf16,
}

/// Look at the start of a stream, consuming a UTF-8 BOM if present.
pub(crate) fn sniff<R: BufRead>(reader: &mut R) -> Result<PartEncoding> {
    let head = reader
        .fill_buf()
        .map_err(|e| Error::CorruptPart(e.to_string()))?;

    if head.starts_with(&[0xEF, 0xBB, 0xBF]) {
        reader.consume(3);
        return Ok(PartEncoding::Utf8);
    }
    let utf16 = head.starts_with(&[0xFF, 0xFE])
        || head.starts_with(&[0xFE, 0xFF])
        // BOM-less UTF-16: ASCII markup leaves NUL in every other byte
        || (head.len() >= 4 && head[1] == 0 && head[3] == 0)
        || (head.len() >= 4 && head[0] == 0 && head[2] == 0);

    Ok(if utf16 {
        PartEncoding::Utf16
    } else {
        PartEncoding::Utf8
    })
}

/// Rewrite a UTF-16 encoding declaration after the text was decoded to UTF-8.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let (decl, rest) = content.split_at(end_decl + 2);
            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");
            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling UTF-8 (with or without BOM) and UTF-16 LE/BE.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec())
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {}", e)));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return Ok(fix_xml_encoding_declaration(&decode_utf16(rest, u16::from_le_bytes)?));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return Ok(fix_xml_encoding_declaration(&decode_utf16(rest, u16::from_be_bytes)?));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => Ok(
            fix_xml_encoding_declaration(&decode_utf16(bytes, u16::from_le_bytes)?),
        ),
        Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => Ok(
            fix_xml_encoding_declaration(&decode_utf16(bytes, u16::from_be_bytes)?),
        ),
        Err(e) => Err(Error::XmlParse(format!("invalid UTF-8: {}", e))),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::XmlParse(format!("invalid UTF-16: {}", e)))
}
