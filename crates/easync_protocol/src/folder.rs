//! Folder hierarchy types and the FolderSync message shapes.

use easync_wbxml::{Codepage, Element, WbxmlError, WbxmlResult};
use serde::{Deserialize, Serialize};

use crate::status::FolderSyncStatus;

/// The initial folder hierarchy sync key.
pub const FOLDER_SYNC_KEY_INITIAL: &str = "0";

/// Server-assigned folder type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum FolderType {
    UserGeneric,
    Inbox,
    Drafts,
    DeletedItems,
    SentItems,
    Outbox,
    Tasks,
    Calendar,
    Contacts,
    Notes,
    Journal,
    UserMail,
    UserCalendar,
    UserContacts,
    UserTasks,
    UserJournal,
    UserNotes,
    Unknown,
    RecipientCache,
    /// A type code outside the known enumeration.
    Other(u8),
}

impl FolderType {
    /// Resolve a numeric folder type code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => FolderType::UserGeneric,
            2 => FolderType::Inbox,
            3 => FolderType::Drafts,
            4 => FolderType::DeletedItems,
            5 => FolderType::SentItems,
            6 => FolderType::Outbox,
            7 => FolderType::Tasks,
            8 => FolderType::Calendar,
            9 => FolderType::Contacts,
            10 => FolderType::Notes,
            11 => FolderType::Journal,
            12 => FolderType::UserMail,
            13 => FolderType::UserCalendar,
            14 => FolderType::UserContacts,
            15 => FolderType::UserTasks,
            16 => FolderType::UserJournal,
            17 => FolderType::UserNotes,
            18 => FolderType::Unknown,
            19 => FolderType::RecipientCache,
            other => FolderType::Other(other),
        }
    }

    /// The collection class items in this folder belong to.
    pub fn class(self) -> CollectionClass {
        match self {
            FolderType::Tasks | FolderType::UserTasks => CollectionClass::Tasks,
            FolderType::Calendar | FolderType::UserCalendar => CollectionClass::Calendar,
            FolderType::Contacts | FolderType::UserContacts | FolderType::RecipientCache => {
                CollectionClass::Contacts
            }
            FolderType::Notes | FolderType::UserNotes => CollectionClass::Notes,
            _ => CollectionClass::Email,
        }
    }
}

/// The item class of a collection, as named in `Class` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum CollectionClass {
    Email,
    Calendar,
    Contacts,
    Tasks,
    Notes,
}

impl CollectionClass {
    /// The wire value of the `Class` element.
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionClass::Email => "Email",
            CollectionClass::Calendar => "Calendar",
            CollectionClass::Contacts => "Contacts",
            CollectionClass::Tasks => "Tasks",
            CollectionClass::Notes => "Notes",
        }
    }
}

/// A folder in the server hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Server-assigned folder identifier.
    pub server_id: String,
    /// Server id of the parent folder; "0" at the root.
    pub parent_id: String,
    /// Display name.
    pub display_name: String,
    /// Folder type code.
    pub folder_type: FolderType,
}

impl Folder {
    /// The collection class items in this folder belong to.
    pub fn class(&self) -> CollectionClass {
        self.folder_type.class()
    }
}

/// The outcome of one FolderSync round-trip.
#[derive(Debug, Clone)]
pub struct FolderSyncResponse {
    /// Command status.
    pub status: FolderSyncStatus,
    /// The new folder sync key, to be adopted on success.
    pub sync_key: Option<String>,
    /// Folders added since the previous key.
    pub added: Vec<Folder>,
    /// Folders whose name, parent, or type changed.
    pub updated: Vec<Folder>,
    /// Server ids of removed folders.
    pub deleted: Vec<String>,
}

/// Build a FolderSync request document.
pub fn folder_sync_request(sync_key: &str) -> Element {
    Element::new(Codepage::FolderHierarchy, "FolderSync").with_text(
        Codepage::FolderHierarchy,
        "SyncKey",
        sync_key,
    )
}

/// Parse a FolderSync response document.
pub fn parse_folder_sync(root: &Element) -> WbxmlResult<FolderSyncResponse> {
    let status = root
        .child_parsed::<u8>("Status")
        .map(FolderSyncStatus::from_code)
        .ok_or_else(|| missing("FolderSync", "Status"))?;

    let sync_key = root.child_value("SyncKey");

    let mut response = FolderSyncResponse {
        status,
        sync_key,
        added: Vec::new(),
        updated: Vec::new(),
        deleted: Vec::new(),
    };

    if let Some(changes) = root.child("Changes") {
        for add in changes.children_named("Add") {
            response.added.push(parse_folder(add)?);
        }
        for update in changes.children_named("Update") {
            response.updated.push(parse_folder(update)?);
        }
        for delete in changes.children_named("Delete") {
            let id = delete
                .child_value("ServerId")
                .ok_or_else(|| missing("Delete", "ServerId"))?;
            response.deleted.push(id);
        }
    }

    Ok(response)
}

fn parse_folder(node: &Element) -> WbxmlResult<Folder> {
    Ok(Folder {
        server_id: node
            .child_value("ServerId")
            .ok_or_else(|| missing("Folder", "ServerId"))?,
        parent_id: node.child_value("ParentId").unwrap_or_else(|| "0".into()),
        display_name: node
            .child_value("DisplayName")
            .ok_or_else(|| missing("Folder", "DisplayName"))?,
        folder_type: node
            .child_parsed::<u8>("Type")
            .map(FolderType::from_code)
            .ok_or_else(|| missing("Folder", "Type"))?,
    })
}

pub(crate) fn missing(scope: &str, field: &str) -> WbxmlError {
    WbxmlError::invalid_structure(format!("{scope} response missing {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_node(id: &str, name: &str, type_code: &str) -> Element {
        Element::new(Codepage::FolderHierarchy, "Add")
            .with_text(Codepage::FolderHierarchy, "ServerId", id)
            .with_text(Codepage::FolderHierarchy, "ParentId", "0")
            .with_text(Codepage::FolderHierarchy, "DisplayName", name)
            .with_text(Codepage::FolderHierarchy, "Type", type_code)
    }

    #[test]
    fn request_shape() {
        let req = folder_sync_request("0");
        assert_eq!(req.name, "FolderSync");
        assert_eq!(req.child_value("SyncKey").unwrap(), "0");
    }

    #[test]
    fn parse_full_hierarchy() {
        let root = Element::new(Codepage::FolderHierarchy, "FolderSync")
            .with_text(Codepage::FolderHierarchy, "Status", "1")
            .with_text(Codepage::FolderHierarchy, "SyncKey", "7")
            .with(
                Element::new(Codepage::FolderHierarchy, "Changes")
                    .with_text(Codepage::FolderHierarchy, "Count", "3")
                    .with(folder_node("5", "Inbox", "2"))
                    .with(folder_node("9", "Projects", "12"))
                    .with(
                        Element::new(Codepage::FolderHierarchy, "Delete")
                            .with_text(Codepage::FolderHierarchy, "ServerId", "11"),
                    ),
            );

        let parsed = parse_folder_sync(&root).unwrap();
        assert!(parsed.status.is_success());
        assert_eq!(parsed.sync_key.as_deref(), Some("7"));
        assert_eq!(parsed.added.len(), 2);
        assert_eq!(parsed.added[0].folder_type, FolderType::Inbox);
        assert_eq!(parsed.added[1].folder_type, FolderType::UserMail);
        assert_eq!(parsed.deleted, vec!["11"]);
    }

    #[test]
    fn missing_status_is_an_error() {
        let root = Element::new(Codepage::FolderHierarchy, "FolderSync");
        assert!(parse_folder_sync(&root).is_err());
    }

    #[test]
    fn folder_classes() {
        assert_eq!(FolderType::Inbox.class(), CollectionClass::Email);
        assert_eq!(FolderType::UserCalendar.class(), CollectionClass::Calendar);
        assert_eq!(FolderType::Tasks.class(), CollectionClass::Tasks);
        assert_eq!(FolderType::Notes.class(), CollectionClass::Notes);
        assert_eq!(FolderType::Other(42).class(), CollectionClass::Email);
    }
}
