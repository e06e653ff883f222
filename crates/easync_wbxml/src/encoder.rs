//! WBXML encoder.

use crate::codepage::parse_synthesized_name;
use crate::element::{Element, Node};
use crate::error::{WbxmlError, WbxmlResult};

const WBXML_VERSION: u8 = 0x03;
const PUBLIC_ID_UNKNOWN: u8 = 0x01;
const CHARSET_UTF8: u8 = 0x6A;

const SWITCH_PAGE: u8 = 0x00;
const END: u8 = 0x01;
const STR_I: u8 = 0x03;
const OPAQUE: u8 = 0xC3;
const CONTENT_BIT: u8 = 0x40;

/// Encode a document to WBXML bytes.
///
/// Produces a WBXML 1.3 document with an unknown public identifier,
/// UTF-8 inline strings and an empty string table, which is the only
/// shape ActiveSync servers accept. Codepage switches are emitted as
/// the tree is walked; redundant switches are suppressed.
///
/// # Errors
///
/// Returns an error if an element name has no token in its codepage
/// table, or if text content contains a NUL byte (unrepresentable in
/// a null-terminated inline string).
pub fn encode(document: &Element) -> WbxmlResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.write_header();
    encoder.write_element(document)?;
    Ok(encoder.into_bytes())
}

struct Encoder {
    buffer: Vec<u8>,
    page: u8,
}

impl Encoder {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            page: 0,
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn write_header(&mut self) {
        self.buffer.push(WBXML_VERSION);
        self.buffer.push(PUBLIC_ID_UNKNOWN);
        self.buffer.push(CHARSET_UTF8);
        // Empty string table.
        self.buffer.push(0x00);
    }

    fn write_element(&mut self, element: &Element) -> WbxmlResult<()> {
        let (page, token) = resolve_tag(element)?;

        if page != self.page {
            self.buffer.push(SWITCH_PAGE);
            self.buffer.push(page);
            self.page = page;
        }

        if element.is_empty() {
            self.buffer.push(token);
            return Ok(());
        }

        self.buffer.push(token | CONTENT_BIT);
        for child in &element.children {
            match child {
                Node::Element(e) => self.write_element(e)?,
                Node::Text(t) => self.write_text(t)?,
                Node::Opaque(b) => self.write_opaque(b),
            }
        }
        self.buffer.push(END);
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> WbxmlResult<()> {
        if text.as_bytes().contains(&0) {
            return Err(WbxmlError::invalid_structure(
                "NUL byte in inline string content",
            ));
        }
        self.buffer.push(STR_I);
        self.buffer.extend_from_slice(text.as_bytes());
        self.buffer.push(0x00);
        Ok(())
    }

    fn write_opaque(&mut self, data: &[u8]) {
        self.buffer.push(OPAQUE);
        write_mb_u32(&mut self.buffer, data.len() as u32);
        self.buffer.extend_from_slice(data);
    }
}

fn resolve_tag(element: &Element) -> WbxmlResult<(u8, u8)> {
    if let Some(token) = element.page.tag_token(&element.name) {
        return Ok((element.page.number(), token));
    }
    // Names synthesized by the decoder for unknown tokens re-encode to
    // their original (page, token) pair.
    if let Some((page, token)) = parse_synthesized_name(&element.name) {
        return Ok((page, token));
    }
    Err(WbxmlError::UnknownTag {
        page: element.page.number(),
        name: element.name.clone(),
    })
}

/// Write a WBXML multi-byte unsigned integer (7 bits per byte, high
/// bit set on all but the final byte).
pub(crate) fn write_mb_u32(buffer: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut i = 4;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value != 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) as u8) | 0x80;
        value >>= 7;
    }
    buffer.extend_from_slice(&bytes[i..]);
}
