//! # easync WBXML
//!
//! WBXML codec for the Exchange ActiveSync wire format.
//!
//! ActiveSync commands and responses travel as WAP Binary XML: element
//! tags become single-byte tokens, namespaces become codepage switches,
//! and text rides inline as null-terminated UTF-8. This crate converts
//! between that binary form and an [`Element`] tree whose typed
//! accessors (`child`, `child_value`, `descendant`) make value
//! extraction unambiguous.
//!
//! ## Properties
//!
//! - `decode(encode(doc))` is structurally equal to `doc` for any
//!   representable document
//! - malformed or truncated input yields an explicit error, never a
//!   partial tree
//! - no shared state; every call is independent and safe to run
//!   concurrently
//!
//! ## Usage
//!
//! ```
//! use easync_wbxml::{decode, encode, Codepage, Element};
//!
//! let doc = Element::new(Codepage::AirSync, "Sync")
//!     .with_text(Codepage::AirSync, "SyncKey", "0");
//!
//! let bytes = encode(&doc).unwrap();
//! let back = decode(&bytes).unwrap();
//! assert_eq!(back.child_value("SyncKey").unwrap(), "0");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codepage;
mod decoder;
mod element;
mod encoder;
mod error;

pub use codepage::{parse_synthesized_name, synthesized_name, Codepage};
pub use decoder::decode;
pub use element::{Element, Node};
pub use encoder::encode;
pub use error::{WbxmlError, WbxmlResult};
