//! # easync protocol
//!
//! ActiveSync protocol vocabulary: command names, protocol versions,
//! per-command status enumerations, folder types, and the request
//! builders / response parsers for every command the engine speaks.
//!
//! Messages are shaped as [`easync_wbxml::Element`] trees; the session
//! layer encodes them to the binary wire format and decodes responses
//! back before they reach the parsers here. Parsers fail with explicit
//! errors on missing required fields and preserve unknown status codes
//! numerically instead of collapsing them to success.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod compose;
mod estimate;
mod folder;
mod itemops;
mod ping;
mod provision;
mod status;
mod sync;
mod version;

pub use command::Command;
pub use compose::{
    meeting_response_request, move_items_request, parse_meeting_response, parse_move_items,
    parse_send_mail_status, send_mail_request, smart_forward_request, smart_reply_request,
    MeetingAnswer, MeetingResponseResult, MoveRequest, MoveResponse,
};
pub use estimate::{item_estimate_request, parse_item_estimate, ItemEstimateResponse};
pub use folder::{
    folder_sync_request, parse_folder_sync, CollectionClass, Folder, FolderSyncResponse,
    FolderType, FOLDER_SYNC_KEY_INITIAL,
};
pub use itemops::{
    fetch_attachment_request, fetch_item_request, parse_fetch, FetchResponse,
};
pub use ping::{parse_ping, ping_request, PingFolder, PingResponse};
pub use provision::{
    device_information_request, parse_provision, parse_settings_status, provision_acknowledge,
    provision_request, DeviceInformation, ProvisionResponse, POLICY_TYPE_WBXML,
};
pub use status::{
    FetchStatus, FolderSyncStatus, ItemEstimateStatus, MeetingResponseStatus, MoveStatus,
    PingStatus, ProvisionStatus, SyncStatus,
};
pub use sync::{
    parse_sync, sync_request, SyncDiff, SyncItem, SyncKey, SyncOptions, SyncResponse,
};
pub use version::{negotiate, ProtocolVersion, SUPPORTED_VERSIONS};
