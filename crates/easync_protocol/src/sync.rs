//! Sync command message shapes.

use easync_wbxml::{Codepage, Element, WbxmlResult};
use serde::{Deserialize, Serialize};

use crate::folder::{missing, CollectionClass};
use crate::status::SyncStatus;

/// An opaque per-collection sync cursor.
///
/// The server issues a new key with every successful sync; a key is
/// single-use and must fully replace its predecessor before the
/// collection is touched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncKey(String);

impl SyncKey {
    /// The sentinel initial key, used to bootstrap a collection.
    pub fn initial() -> Self {
        SyncKey("0".to_string())
    }

    /// Wrap a server-issued key.
    pub fn new(key: impl Into<String>) -> Self {
        SyncKey(key.into())
    }

    /// True for the sentinel initial key.
    pub fn is_initial(&self) -> bool {
        self.0 == "0"
    }

    /// The wire value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SyncKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options applied to non-initial sync requests.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of changes per response.
    pub window_size: u32,
    /// Time-window filter code (0 = no filter; e.g. 3 = two weeks).
    pub filter_type: Option<u8>,
    /// AirSyncBase body type preference (1 = plain, 2 = HTML, 4 = MIME).
    pub body_type: u8,
    /// Truncate bodies beyond this many bytes.
    pub truncation_size: Option<u32>,
    /// Report client deletions as moves to Deleted Items.
    pub deletes_as_moves: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            window_size: 100,
            filter_type: None,
            body_type: 2,
            truncation_size: Some(200 * 1024),
            deletes_as_moves: true,
        }
    }
}

impl SyncOptions {
    /// Sets the window size.
    pub fn with_window_size(mut self, size: u32) -> Self {
        self.window_size = size;
        self
    }

    /// Sets the filter type.
    pub fn with_filter_type(mut self, filter: u8) -> Self {
        self.filter_type = Some(filter);
        self
    }

    /// Sets the body preference type.
    pub fn with_body_type(mut self, body_type: u8) -> Self {
        self.body_type = body_type;
        self
    }
}

/// An added or changed item in a sync response.
///
/// For `Change` entries the payload carries only the fields that
/// changed (a read flag, a follow-up flag); it must be merged into the
/// stored item, never substituted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncItem {
    /// Server-assigned item identifier.
    pub server_id: String,
    /// The `ApplicationData` subtree, possibly partial.
    pub data: Element,
}

impl SyncItem {
    /// The read state carried by the payload, when present.
    pub fn read(&self) -> Option<bool> {
        self.data.child_value("Read").map(|v| v.trim() == "1")
    }

    /// The follow-up flag status carried by the payload, when present.
    pub fn flag_status(&self) -> Option<u8> {
        self.data.child("Flag")?.child_parsed("FlagStatus")
    }

    /// The message subject, when present.
    pub fn subject(&self) -> Option<String> {
        self.data.child_value("Subject")
    }
}

/// The diff produced by one sync response.
#[derive(Debug, Clone, Default)]
pub struct SyncDiff {
    /// Items added since the previous key.
    pub added: Vec<SyncItem>,
    /// Items with changed fields (partial payloads).
    pub changed: Vec<SyncItem>,
    /// Server ids of deleted items.
    pub deleted: Vec<String>,
    /// Server ids of items aged out of the sync window.
    pub soft_deleted: Vec<String>,
    /// True when the server holds more changes for this key generation.
    pub more_available: bool,
}

impl SyncDiff {
    /// True when the diff carries no item data at all.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.changed.is_empty()
            && self.deleted.is_empty()
            && self.soft_deleted.is_empty()
    }
}

/// The parsed result of one Sync round-trip for one collection.
#[derive(Debug, Clone)]
pub struct SyncResponse {
    /// The collection the response addresses.
    pub collection_id: String,
    /// Command status for this collection.
    pub status: SyncStatus,
    /// The next sync key, present on success.
    pub sync_key: Option<SyncKey>,
    /// Item changes.
    pub diff: SyncDiff,
}

/// Build a Sync request for one collection.
///
/// With the initial key the request carries no change-tracking options:
/// its only purpose is to obtain a usable key, and a zero-key response
/// never carries item data. Subsequent requests ask for changes within
/// a window and state body preferences.
pub fn sync_request(
    collection_id: &str,
    sync_key: &SyncKey,
    class: CollectionClass,
    options: &SyncOptions,
) -> Element {
    let mut collection = Element::new(Codepage::AirSync, "Collection");

    // Exchange 2007 rejects collections without an explicit Class.
    collection.push(Element::text(Codepage::AirSync, "Class", class.as_str()));
    collection.push(Element::text(
        Codepage::AirSync,
        "SyncKey",
        sync_key.as_str(),
    ));
    collection.push(Element::text(
        Codepage::AirSync,
        "CollectionId",
        collection_id,
    ));

    if !sync_key.is_initial() {
        if options.deletes_as_moves {
            collection.push(Element::text(Codepage::AirSync, "DeletesAsMoves", "1"));
        }
        collection.push(Element::new(Codepage::AirSync, "GetChanges"));
        collection.push(Element::text(
            Codepage::AirSync,
            "WindowSize",
            options.window_size.to_string(),
        ));

        let mut opts = Element::new(Codepage::AirSync, "Options");
        if let Some(filter) = options.filter_type {
            opts.push(Element::text(
                Codepage::AirSync,
                "FilterType",
                filter.to_string(),
            ));
        }
        let mut preference = Element::new(Codepage::AirSyncBase, "BodyPreference").with_text(
            Codepage::AirSyncBase,
            "Type",
            options.body_type.to_string(),
        );
        if let Some(size) = options.truncation_size {
            preference.push(Element::text(
                Codepage::AirSyncBase,
                "TruncationSize",
                size.to_string(),
            ));
        }
        opts.push(preference);
        collection.push(opts);
    }

    Element::new(Codepage::AirSync, "Sync")
        .with(Element::new(Codepage::AirSync, "Collections").with(collection))
}

/// Parse a Sync response for its first collection.
///
/// The added/changed/deleted/soft-deleted groups are parsed
/// independently; a malformed entry fails the whole decode rather than
/// silently dropping data.
pub fn parse_sync(root: &Element) -> WbxmlResult<SyncResponse> {
    // A root-level status appears alone when the whole command failed.
    if let Some(status) = root.child_parsed::<u8>("Status") {
        let status = SyncStatus::from_code(status);
        if !status.is_success() {
            return Ok(SyncResponse {
                collection_id: String::new(),
                status,
                sync_key: None,
                diff: SyncDiff::default(),
            });
        }
    }

    let collection = root
        .descendant(&["Collections", "Collection"])
        .ok_or_else(|| missing("Sync", "Collection"))?;

    let status = collection
        .child_parsed::<u8>("Status")
        .map(SyncStatus::from_code)
        .ok_or_else(|| missing("Sync", "Status"))?;

    let collection_id = collection.child_value("CollectionId").unwrap_or_default();
    let sync_key = collection.child_value("SyncKey").map(SyncKey::new);

    let mut diff = SyncDiff {
        more_available: collection.child("MoreAvailable").is_some(),
        ..SyncDiff::default()
    };

    if let Some(commands) = collection.child("Commands") {
        for add in commands.children_named("Add") {
            diff.added.push(parse_item(add)?);
        }
        for change in commands.children_named("Change") {
            diff.changed.push(parse_item(change)?);
        }
        for delete in commands.children_named("Delete") {
            diff.deleted.push(
                delete
                    .child_value("ServerId")
                    .ok_or_else(|| missing("Delete", "ServerId"))?,
            );
        }
        for soft_delete in commands.children_named("SoftDelete") {
            diff.soft_deleted.push(
                soft_delete
                    .child_value("ServerId")
                    .ok_or_else(|| missing("SoftDelete", "ServerId"))?,
            );
        }
    }

    Ok(SyncResponse {
        collection_id,
        status,
        sync_key,
        diff,
    })
}

fn parse_item(node: &Element) -> WbxmlResult<SyncItem> {
    let server_id = node
        .child_value("ServerId")
        .ok_or_else(|| missing("Sync item", "ServerId"))?;
    let data = node
        .child("ApplicationData")
        .cloned()
        .unwrap_or_else(|| Element::new(Codepage::AirSync, "ApplicationData"));
    Ok(SyncItem { server_id, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_request_has_no_change_tracking() {
        let req = sync_request(
            "5",
            &SyncKey::initial(),
            CollectionClass::Email,
            &SyncOptions::default(),
        );
        let collection = req.descendant(&["Collections", "Collection"]).unwrap();
        assert_eq!(collection.child_value("SyncKey").unwrap(), "0");
        assert_eq!(collection.child_value("CollectionId").unwrap(), "5");
        assert!(collection.child("GetChanges").is_none());
        assert!(collection.child("Options").is_none());
        assert!(collection.child("WindowSize").is_none());
    }

    #[test]
    fn incremental_request_asks_for_changes() {
        let options = SyncOptions::default()
            .with_window_size(25)
            .with_filter_type(3);
        let req = sync_request(
            "5",
            &SyncKey::new("1049"),
            CollectionClass::Email,
            &options,
        );
        let collection = req.descendant(&["Collections", "Collection"]).unwrap();
        assert!(collection.child("GetChanges").is_some());
        assert_eq!(collection.child_value("WindowSize").unwrap(), "25");
        let opts = collection.child("Options").unwrap();
        assert_eq!(opts.child_value("FilterType").unwrap(), "3");
        assert_eq!(
            opts.descendant(&["BodyPreference", "Type"]).unwrap().value().unwrap(),
            "2"
        );
    }

    fn response_with_commands(commands: Element) -> Element {
        Element::new(Codepage::AirSync, "Sync").with(
            Element::new(Codepage::AirSync, "Collections").with(
                Element::new(Codepage::AirSync, "Collection")
                    .with_text(Codepage::AirSync, "SyncKey", "1050")
                    .with_text(Codepage::AirSync, "CollectionId", "5")
                    .with_text(Codepage::AirSync, "Status", "1")
                    .with(commands),
            ),
        )
    }

    #[test]
    fn parse_adds_and_deletes() {
        let commands = Element::new(Codepage::AirSync, "Commands")
            .with(
                Element::new(Codepage::AirSync, "Add")
                    .with_text(Codepage::AirSync, "ServerId", "5:1")
                    .with(
                        Element::new(Codepage::AirSync, "ApplicationData")
                            .with_text(Codepage::Email, "Subject", "hi")
                            .with_text(Codepage::Email, "Read", "0"),
                    ),
            )
            .with(
                Element::new(Codepage::AirSync, "Delete")
                    .with_text(Codepage::AirSync, "ServerId", "5:2"),
            )
            .with(
                Element::new(Codepage::AirSync, "SoftDelete")
                    .with_text(Codepage::AirSync, "ServerId", "5:3"),
            );

        let parsed = parse_sync(&response_with_commands(commands)).unwrap();
        assert!(parsed.status.is_success());
        assert_eq!(parsed.sync_key.unwrap().as_str(), "1050");
        assert_eq!(parsed.diff.added.len(), 1);
        assert_eq!(parsed.diff.added[0].server_id, "5:1");
        assert_eq!(parsed.diff.added[0].subject().unwrap(), "hi");
        assert_eq!(parsed.diff.added[0].read(), Some(false));
        assert_eq!(parsed.diff.deleted, vec!["5:2"]);
        assert_eq!(parsed.diff.soft_deleted, vec!["5:3"]);
        assert!(!parsed.diff.more_available);
    }

    #[test]
    fn change_payload_stays_partial() {
        // A read-state-only change carries nothing but the Read field.
        let commands = Element::new(Codepage::AirSync, "Commands").with(
            Element::new(Codepage::AirSync, "Change")
                .with_text(Codepage::AirSync, "ServerId", "5:9")
                .with(
                    Element::new(Codepage::AirSync, "ApplicationData")
                        .with_text(Codepage::Email, "Read", "1"),
                ),
        );

        let parsed = parse_sync(&response_with_commands(commands)).unwrap();
        let change = &parsed.diff.changed[0];
        assert_eq!(change.read(), Some(true));
        assert_eq!(change.subject(), None);
        assert_eq!(change.data.elements().count(), 1);
    }

    #[test]
    fn more_available_flag() {
        let root = Element::new(Codepage::AirSync, "Sync").with(
            Element::new(Codepage::AirSync, "Collections").with(
                Element::new(Codepage::AirSync, "Collection")
                    .with_text(Codepage::AirSync, "SyncKey", "2")
                    .with_text(Codepage::AirSync, "Status", "1")
                    .with(Element::new(Codepage::AirSync, "MoreAvailable")),
            ),
        );
        let parsed = parse_sync(&root).unwrap();
        assert!(parsed.diff.more_available);
    }

    #[test]
    fn root_level_failure_status() {
        let root = Element::new(Codepage::AirSync, "Sync").with_text(
            Codepage::AirSync,
            "Status",
            "4",
        );
        let parsed = parse_sync(&root).unwrap();
        assert_eq!(parsed.status, SyncStatus::ProtocolError);
        assert!(parsed.sync_key.is_none());
    }

    #[test]
    fn missing_collection_is_an_error() {
        let root = Element::new(Codepage::AirSync, "Sync");
        assert!(parse_sync(&root).is_err());
    }

    #[test]
    fn flag_status_accessor() {
        let item = SyncItem {
            server_id: "1".into(),
            data: Element::new(Codepage::AirSync, "ApplicationData").with(
                Element::new(Codepage::Email, "Flag").with_text(
                    Codepage::Email,
                    "FlagStatus",
                    "2",
                ),
            ),
        };
        assert_eq!(item.flag_status(), Some(2));
    }

    #[test]
    fn sync_key_sentinel() {
        assert!(SyncKey::initial().is_initial());
        assert!(!SyncKey::new("17").is_initial());
        assert_eq!(SyncKey::new("17").to_string(), "17");
    }
}
