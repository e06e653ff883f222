//! ItemOperations message shapes (attachment and item fetch).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use easync_wbxml::{Codepage, Element, WbxmlResult};

use crate::folder::missing;
use crate::status::FetchStatus;

/// The parsed result of an ItemOperations Fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Effective status: the per-fetch status when present, otherwise
    /// the command status.
    pub status: FetchStatus,
    /// The fetched bytes, when the fetch succeeded.
    pub data: Option<Vec<u8>>,
    /// Content type reported by the server, when present.
    pub content_type: Option<String>,
}

/// Build an ItemOperations request fetching an attachment by its
/// AirSyncBase file reference.
pub fn fetch_attachment_request(file_reference: &str) -> Element {
    Element::new(Codepage::ItemOperations, "ItemOperations").with(
        Element::new(Codepage::ItemOperations, "Fetch")
            .with_text(Codepage::ItemOperations, "Store", "Mailbox")
            .with_text(Codepage::AirSyncBase, "FileReference", file_reference),
    )
}

/// Build an ItemOperations request fetching a whole item by collection
/// and server id, with a MIME body preference.
pub fn fetch_item_request(collection_id: &str, server_id: &str) -> Element {
    Element::new(Codepage::ItemOperations, "ItemOperations").with(
        Element::new(Codepage::ItemOperations, "Fetch")
            .with_text(Codepage::ItemOperations, "Store", "Mailbox")
            .with_text(Codepage::AirSync, "CollectionId", collection_id)
            .with_text(Codepage::AirSync, "ServerId", server_id)
            .with(
                Element::new(Codepage::ItemOperations, "Options").with(
                    Element::new(Codepage::AirSyncBase, "BodyPreference").with_text(
                        Codepage::AirSyncBase,
                        "Type",
                        "4",
                    ),
                ),
            ),
    )
}

/// Parse an ItemOperations response for its first fetch result.
///
/// Servers deliver fetched bytes either as an opaque node or as
/// base64 text; both shapes decode to raw bytes here.
pub fn parse_fetch(root: &Element) -> WbxmlResult<FetchResponse> {
    let command_status = root
        .child_parsed::<u8>("Status")
        .map(FetchStatus::from_code)
        .ok_or_else(|| missing("ItemOperations", "Status"))?;

    let fetch = root.descendant(&["Response", "Fetch"]);
    let status = fetch
        .and_then(|f| f.child_parsed::<u8>("Status"))
        .map(FetchStatus::from_code)
        .unwrap_or(command_status);

    let properties = fetch.and_then(|f| f.child("Properties"));
    let data = properties
        .and_then(|p| p.child("Data"))
        .and_then(|d| match d.opaque_value() {
            Some(bytes) => Some(bytes.to_vec()),
            None => d
                .value()
                .and_then(|text| BASE64.decode(text.trim().as_bytes()).ok()),
        });
    let content_type = properties.and_then(|p| p.child_value("ContentType"));

    Ok(FetchResponse {
        status,
        data,
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_request_shape() {
        let req = fetch_attachment_request("5%3a1%3a0");
        let fetch = req.child("Fetch").unwrap();
        assert_eq!(fetch.child_value("Store").unwrap(), "Mailbox");
        assert_eq!(fetch.child_value("FileReference").unwrap(), "5%3a1%3a0");
        // The reference lives in the AirSyncBase namespace.
        assert_eq!(
            fetch.child("FileReference").unwrap().page,
            Codepage::AirSyncBase
        );
    }

    #[test]
    fn item_request_shape() {
        let req = fetch_item_request("5", "5:12");
        let fetch = req.child("Fetch").unwrap();
        assert_eq!(fetch.child_value("CollectionId").unwrap(), "5");
        assert_eq!(fetch.child_value("ServerId").unwrap(), "5:12");
        assert_eq!(
            fetch
                .descendant(&["Options", "BodyPreference", "Type"])
                .unwrap()
                .value()
                .unwrap(),
            "4"
        );
    }

    fn response(status: &str, data: Element) -> Element {
        Element::new(Codepage::ItemOperations, "ItemOperations")
            .with_text(Codepage::ItemOperations, "Status", "1")
            .with(
                Element::new(Codepage::ItemOperations, "Response").with(
                    Element::new(Codepage::ItemOperations, "Fetch")
                        .with_text(Codepage::ItemOperations, "Status", status)
                        .with(Element::new(Codepage::ItemOperations, "Properties").with(data)),
                ),
            )
    }

    #[test]
    fn parse_base64_data() {
        let encoded = BASE64.encode(b"attachment bytes");
        let root = response(
            "1",
            Element::text(Codepage::ItemOperations, "Data", encoded),
        );
        let parsed = parse_fetch(&root).unwrap();
        assert!(parsed.status.is_success());
        assert_eq!(parsed.data.unwrap(), b"attachment bytes");
    }

    #[test]
    fn parse_opaque_data() {
        let root = response(
            "1",
            Element::opaque(Codepage::ItemOperations, "Data", vec![0xCA, 0xFE]),
        );
        let parsed = parse_fetch(&root).unwrap();
        assert_eq!(parsed.data.unwrap(), vec![0xCA, 0xFE]);
    }

    #[test]
    fn parse_not_found() {
        let root = Element::new(Codepage::ItemOperations, "ItemOperations")
            .with_text(Codepage::ItemOperations, "Status", "1")
            .with(
                Element::new(Codepage::ItemOperations, "Response").with(
                    Element::new(Codepage::ItemOperations, "Fetch").with_text(
                        Codepage::ItemOperations,
                        "Status",
                        "6",
                    ),
                ),
            );
        let parsed = parse_fetch(&root).unwrap();
        assert_eq!(parsed.status, FetchStatus::NotFound);
        assert!(parsed.data.is_none());
    }

    #[test]
    fn missing_status_is_an_error() {
        let root = Element::new(Codepage::ItemOperations, "ItemOperations");
        assert!(parse_fetch(&root).is_err());
    }
}
