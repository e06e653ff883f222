//! WBXML decoder.

use crate::codepage::{synthesized_name, Codepage};
use crate::element::{Element, Node};
use crate::error::{WbxmlError, WbxmlResult};

const SWITCH_PAGE: u8 = 0x00;
const END: u8 = 0x01;
const ENTITY: u8 = 0x02;
const STR_I: u8 = 0x03;
const STR_T: u8 = 0x83;
const OPAQUE: u8 = 0xC3;
const CONTENT_BIT: u8 = 0x40;
const ATTRIBUTE_BIT: u8 = 0x80;
const TOKEN_MASK: u8 = 0x3F;

/// Maximum allowed opaque payload length.
/// Prevents allocation-based DoS from untrusted length fields.
const MAX_OPAQUE_LENGTH: u64 = 256 * 1024 * 1024;

/// Maximum element nesting depth.
const MAX_DEPTH: usize = 64;

/// Decode WBXML bytes into a document tree.
///
/// Decoding is lossless for the ActiveSync profile: nesting, text and
/// opaque content are preserved, and namespace prefixes are normalized
/// into the element's codepage. Tokens missing from the codepage tables
/// decode to synthesized names that stay queryable and re-encodable.
///
/// # Errors
///
/// Truncated or malformed input yields an explicit error; there is no
/// partial result.
pub fn decode(bytes: &[u8]) -> WbxmlResult<Element> {
    let mut decoder = Decoder::new(bytes);
    decoder.read_header()?;
    let root = decoder.read_document()?;
    if !decoder.is_empty() {
        return Err(WbxmlError::invalid_structure(
            "trailing data after document end",
        ));
    }
    Ok(root)
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    page: u8,
    string_table: &'a [u8],
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            page: 0,
            string_table: &[],
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_header(&mut self) -> WbxmlResult<()> {
        let version = self.read_byte()?;
        if !(0x01..=0x03).contains(&version) {
            return Err(WbxmlError::invalid_header(format!(
                "unsupported WBXML version {version:#04x}"
            )));
        }

        let public_id = self.read_mb_u32()?;
        if public_id == 0 {
            // Public id is a string-table reference; the index itself
            // is irrelevant to ActiveSync.
            self.read_mb_u32()?;
        }

        let charset = self.read_mb_u32()?;
        if charset != 0x6A {
            return Err(WbxmlError::UnsupportedCharset { charset });
        }

        let table_len = self.read_mb_u32()? as usize;
        self.string_table = self.read_bytes(table_len)?;
        Ok(())
    }

    fn read_document(&mut self) -> WbxmlResult<Element> {
        loop {
            let byte = self.read_byte()?;
            match byte {
                SWITCH_PAGE => self.page = self.read_byte()?,
                _ => return self.read_element(byte, 0),
            }
        }
    }

    fn read_element(&mut self, tag_byte: u8, depth: usize) -> WbxmlResult<Element> {
        if depth >= MAX_DEPTH {
            return Err(WbxmlError::DepthLimitExceeded { max_depth: MAX_DEPTH });
        }
        if tag_byte & ATTRIBUTE_BIT != 0 {
            return Err(WbxmlError::AttributesUnsupported {
                offset: self.pos - 1,
            });
        }

        let token = tag_byte & TOKEN_MASK;
        if token < 0x05 {
            return Err(WbxmlError::invalid_structure(format!(
                "expected tag, found control token {token:#04x}"
            )));
        }

        let page = Codepage::from_number(self.page);
        let name = match page.tag_name(token) {
            Some(name) => name.to_string(),
            None => synthesized_name(self.page, token),
        };
        let mut element = Element::new(page, name);

        if tag_byte & CONTENT_BIT == 0 {
            return Ok(element);
        }

        loop {
            let byte = self.read_byte()?;
            match byte {
                END => return Ok(element),
                SWITCH_PAGE => self.page = self.read_byte()?,
                STR_I => element.children.push(Node::Text(self.read_inline_string()?)),
                STR_T => {
                    let offset = self.read_mb_u32()? as usize;
                    element
                        .children
                        .push(Node::Text(self.read_table_string(offset)?));
                }
                OPAQUE => {
                    let len = u64::from(self.read_mb_u32()?);
                    if len > MAX_OPAQUE_LENGTH {
                        return Err(WbxmlError::SizeLimitExceeded {
                            claimed: len,
                            max_allowed: MAX_OPAQUE_LENGTH,
                        });
                    }
                    let bytes = self.read_bytes(len as usize)?;
                    element.children.push(Node::Opaque(bytes.to_vec()));
                }
                ENTITY => {
                    let code = self.read_mb_u32()?;
                    let ch = char::from_u32(code).ok_or_else(|| {
                        WbxmlError::invalid_structure("entity is not a valid character")
                    })?;
                    element.children.push(Node::Text(ch.to_string()));
                }
                other if other & TOKEN_MASK >= 0x05 => {
                    let child = self.read_element(other, depth + 1)?;
                    element.children.push(Node::Element(child));
                }
                other => {
                    return Err(WbxmlError::UnsupportedToken {
                        token: other,
                        offset: self.pos - 1,
                    });
                }
            }
        }
    }

    fn read_inline_string(&mut self) -> WbxmlResult<String> {
        let start = self.pos;
        loop {
            let byte = self.read_byte()?;
            if byte == 0x00 {
                let bytes = &self.data[start..self.pos - 1];
                return std::str::from_utf8(bytes)
                    .map(str::to_string)
                    .map_err(|_| WbxmlError::InvalidUtf8);
            }
        }
    }

    fn read_table_string(&self, offset: usize) -> WbxmlResult<String> {
        let table = self
            .string_table
            .get(offset..)
            .ok_or_else(|| WbxmlError::invalid_structure("string table offset out of range"))?;
        let end = table
            .iter()
            .position(|&b| b == 0x00)
            .ok_or_else(|| WbxmlError::invalid_structure("unterminated string table entry"))?;
        std::str::from_utf8(&table[..end])
            .map(str::to_string)
            .map_err(|_| WbxmlError::InvalidUtf8)
    }

    #[inline]
    fn read_byte(&mut self) -> WbxmlResult<u8> {
        if self.pos >= self.data.len() {
            return Err(WbxmlError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> WbxmlResult<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(WbxmlError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_mb_u32(&mut self) -> WbxmlResult<u32> {
        let mut value: u32 = 0;
        for _ in 0..5 {
            let byte = self.read_byte()?;
            value = value
                .checked_mul(0x80)
                .and_then(|v| v.checked_add(u32::from(byte & 0x7F)))
                .ok_or(WbxmlError::IntegerOverflow)?;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WbxmlError::IntegerOverflow)
    }
}
