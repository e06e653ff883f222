//! Ping command message shapes (Direct Push).

use easync_wbxml::{Codepage, Element, WbxmlResult};

use crate::folder::{missing, CollectionClass};
use crate::status::PingStatus;

/// A folder to monitor for changes.
#[derive(Debug, Clone)]
pub struct PingFolder {
    /// Server id of the folder.
    pub server_id: String,
    /// Item class of the folder.
    pub class: CollectionClass,
}

/// The parsed result of one Ping round-trip.
#[derive(Debug, Clone)]
pub struct PingResponse {
    /// Command status.
    pub status: PingStatus,
    /// Folders reported as changed (status 2).
    pub changed_folders: Vec<String>,
    /// Server-suggested heartbeat when the requested one was out of
    /// bounds (status 5).
    pub heartbeat_interval: Option<u32>,
    /// Server limit on monitored folders (status 6).
    pub max_folders: Option<u32>,
}

/// Build a Ping request document.
///
/// An empty folder list re-uses the folder set of the previous ping on
/// the server side, but this engine always names its folders so the
/// subscription survives server-side cache eviction.
pub fn ping_request(heartbeat_secs: u32, folders: &[PingFolder]) -> Element {
    let mut request = Element::new(Codepage::Ping, "Ping").with_text(
        Codepage::Ping,
        "HeartbeatInterval",
        heartbeat_secs.to_string(),
    );

    let mut list = Element::new(Codepage::Ping, "Folders");
    for folder in folders {
        list.push(
            Element::new(Codepage::Ping, "Folder")
                .with_text(Codepage::Ping, "Id", &folder.server_id)
                .with_text(Codepage::Ping, "Class", folder.class.as_str()),
        );
    }
    request.push(list);
    request
}

/// Parse a Ping response document.
pub fn parse_ping(root: &Element) -> WbxmlResult<PingResponse> {
    let status = root
        .child_parsed::<u8>("Status")
        .map(PingStatus::from_code)
        .ok_or_else(|| missing("Ping", "Status"))?;

    let changed_folders = root
        .child("Folders")
        .map(|folders| {
            folders
                .children_named("Folder")
                .filter_map(|f| f.value())
                .collect()
        })
        .unwrap_or_default();

    Ok(PingResponse {
        status,
        changed_folders,
        heartbeat_interval: root.child_parsed("HeartbeatInterval"),
        max_folders: root.child_parsed("MaxFolders"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let folders = vec![
            PingFolder {
                server_id: "5".into(),
                class: CollectionClass::Email,
            },
            PingFolder {
                server_id: "8".into(),
                class: CollectionClass::Calendar,
            },
        ];
        let req = ping_request(480, &folders);
        assert_eq!(req.child_value("HeartbeatInterval").unwrap(), "480");
        let list = req.child("Folders").unwrap();
        let entries: Vec<_> = list.children_named("Folder").collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].child_value("Id").unwrap(), "5");
        assert_eq!(entries[1].child_value("Class").unwrap(), "Calendar");
    }

    #[test]
    fn parse_changes() {
        let root = Element::new(Codepage::Ping, "Ping")
            .with_text(Codepage::Ping, "Status", "2")
            .with(
                Element::new(Codepage::Ping, "Folders")
                    .with(Element::text(Codepage::Ping, "Folder", "5"))
                    .with(Element::text(Codepage::Ping, "Folder", "8")),
            );
        let parsed = parse_ping(&root).unwrap();
        assert_eq!(parsed.status, PingStatus::ChangesFound);
        assert_eq!(parsed.changed_folders, vec!["5", "8"]);
    }

    #[test]
    fn parse_heartbeat_correction() {
        let root = Element::new(Codepage::Ping, "Ping")
            .with_text(Codepage::Ping, "Status", "5")
            .with_text(Codepage::Ping, "HeartbeatInterval", "900");
        let parsed = parse_ping(&root).unwrap();
        assert_eq!(parsed.status, PingStatus::HeartbeatOutOfBounds);
        assert_eq!(parsed.heartbeat_interval, Some(900));
    }

    #[test]
    fn parse_expiry() {
        let root = Element::new(Codepage::Ping, "Ping").with_text(Codepage::Ping, "Status", "1");
        let parsed = parse_ping(&root).unwrap();
        assert_eq!(parsed.status, PingStatus::Expired);
        assert!(parsed.changed_folders.is_empty());
    }

    #[test]
    fn missing_status_is_an_error() {
        assert!(parse_ping(&Element::new(Codepage::Ping, "Ping")).is_err());
    }
}
