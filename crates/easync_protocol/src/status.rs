//! Per-command status code enumerations.
//!
//! Every command reports a numeric status inside the response body.
//! Unknown codes are preserved as `Other(n)` and are never treated as
//! success; callers that want graceful degradation must opt in
//! explicitly.

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident, success = $success:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $desc:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
            /// A code outside the known enumeration.
            Other(u8),
        }

        impl $name {
            /// Resolve a numeric status code.
            pub fn from_code(code: u8) -> Self {
                match code {
                    $($code => $name::$variant,)*
                    other => $name::Other(other),
                }
            }

            /// The numeric status code.
            pub fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code,)*
                    $name::Other(code) => code,
                }
            }

            /// Human-readable description of the status.
            pub fn description(self) -> &'static str {
                match self {
                    $($name::$variant => $desc,)*
                    $name::Other(_) => "unrecognized status code",
                }
            }

            /// True for the command's success status.
            pub fn is_success(self) -> bool {
                matches!(self, $name::$success)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} ({})", self.code(), self.description())
            }
        }
    };
}

status_enum! {
    /// Status codes of the Sync command.
    SyncStatus, success = Success {
        /// The sync completed.
        Success = 1 => "success",
        /// The sync key is stale or unknown; the collection must restart
        /// from the initial key.
        InvalidSyncKey = 3 => "invalid or expired sync key",
        /// The request was malformed.
        ProtocolError = 4 => "protocol error",
        /// The server failed internally.
        ServerError = 5 => "server error",
        /// An item could not be converted.
        ConversionError = 6 => "error converting an item",
        /// A client change conflicted with a server change.
        Conflict = 7 => "conflict between client and server change",
        /// The referenced object no longer exists.
        ObjectNotFound = 8 => "object not found",
        /// The sync cannot complete (often mailbox quota).
        CannotComplete = 9 => "sync cannot be completed",
        /// The folder hierarchy changed; run FolderSync first.
        FolderHierarchyChanged = 12 => "folder hierarchy out of date",
        /// The request did not include all required elements.
        IncompleteRequest = 13 => "incomplete sync request",
        /// The Wait interval is out of range.
        InvalidWait = 14 => "invalid wait interval",
        /// Too many collections in one request.
        TooManyCollections = 15 => "too many collections",
        /// Transient condition; retry the request.
        Retry = 16 => "retriable server condition",
    }
}

status_enum! {
    /// Status codes of the Provision command.
    ProvisionStatus, success = Success {
        /// Policy acquired or acknowledged.
        Success = 1 => "success",
        /// The request was malformed.
        ProtocolError = 2 => "protocol error in provisioning request",
        /// The server failed internally.
        GeneralError = 3 => "general provisioning server error",
        /// The device is not provisioned for this policy.
        DeviceNotProvisioned = 4 => "device not provisioned",
        /// The policy changed and must be re-acquired.
        PolicyRefreshRequired = 5 => "policy refresh required",
        /// The presented policy key is not valid.
        InvalidPolicyKey = 6 => "invalid policy key",
        /// Policy is managed outside ActiveSync.
        ExternallyManaged = 7 => "policy externally managed",
        /// The server does not recognize this device type.
        UnknownDeviceType = 8 => "unknown device type",
    }
}

status_enum! {
    /// Status codes of the Ping command.
    PingStatus, success = Expired {
        /// The heartbeat elapsed with no changes.
        Expired = 1 => "heartbeat expired, no changes",
        /// At least one monitored folder changed.
        ChangesFound = 2 => "changes available",
        /// The request omitted a required parameter.
        MissingParameter = 3 => "missing ping parameter",
        /// The request was malformed.
        SyntaxError = 4 => "ping syntax error",
        /// The requested heartbeat is outside the server's bounds; the
        /// response names an acceptable interval.
        HeartbeatOutOfBounds = 5 => "heartbeat interval out of bounds",
        /// More folders were named than the server allows.
        TooManyFolders = 6 => "too many folders to monitor",
        /// The folder hierarchy changed; run FolderSync and re-ping.
        FolderSyncRequired = 7 => "folder hierarchy sync required",
        /// The server failed internally.
        ServerError = 8 => "ping server error",
    }
}

status_enum! {
    /// Status codes of the FolderSync command.
    FolderSyncStatus, success = Success {
        /// The hierarchy sync completed.
        Success = 1 => "success",
        /// The server failed internally.
        ServerError = 6 => "folder sync server error",
        /// The folder sync key is stale or unknown.
        InvalidSyncKey = 9 => "invalid folder sync key",
        /// The request was malformed.
        BadFormat = 10 => "incorrectly formatted request",
        /// An unknown error occurred.
        UnknownError = 11 => "unknown folder sync error",
        /// An unknown code was returned by the server.
        CodeUnknown = 12 => "unknown folder sync code",
    }
}

status_enum! {
    /// Status codes of an ItemOperations Fetch.
    FetchStatus, success = Success {
        /// The fetch completed.
        Success = 1 => "success",
        /// The request was malformed.
        ProtocolError = 2 => "protocol error",
        /// The server failed internally.
        ServerError = 3 => "server error",
        /// The referenced document library item was not found.
        DocLibNotFound = 4 => "document library item not found",
        /// Access to the item was denied.
        AccessDenied = 5 => "access denied",
        /// The referenced item was not found.
        NotFound = 6 => "object not found",
        /// The connection failed while streaming the item.
        ConnectionFailed = 7 => "connection failed during fetch",
        /// The byte range is invalid.
        InvalidRange = 8 => "invalid byte range",
        /// The store is unknown.
        UnknownStore = 9 => "unknown store",
        /// The file is empty.
        EmptyFile = 10 => "file is empty",
        /// The requested data size exceeds the allowed range.
        TooLarge = 11 => "requested data too large",
        /// The file could not be read as an attachment.
        IoError = 12 => "error reading the file",
        /// The attachment is not eligible for fetch.
        AttachmentUnavailable = 15 => "attachment cannot be fetched",
    }
}

status_enum! {
    /// Status codes of the GetItemEstimate command.
    ItemEstimateStatus, success = Success {
        /// The estimate was computed.
        Success = 1 => "success",
        /// A named collection is invalid or unknown.
        InvalidCollection = 2 => "invalid collection",
        /// The collection has never been synchronized.
        NoSyncState = 3 => "sync state not primed",
        /// The sync key is stale or unknown.
        InvalidSyncKey = 4 => "invalid or expired sync key",
    }
}

status_enum! {
    /// Status codes of a MoveItems move, where success is code 3.
    MoveStatus, success = Success {
        /// The source item or folder is invalid.
        InvalidSource = 1 => "invalid source collection",
        /// The destination folder is invalid.
        InvalidDestination = 2 => "invalid destination collection",
        /// The move completed.
        Success = 3 => "success",
        /// The source and destination are the same folder.
        SameFolder = 4 => "source and destination are the same",
        /// The move could not be performed.
        Failed = 5 => "move failed",
        /// An item was locked by another operation.
        Locked = 7 => "item locked",
    }
}

status_enum! {
    /// Status codes of a MeetingResponse result.
    MeetingResponseStatus, success = Success {
        /// The response was recorded.
        Success = 1 => "success",
        /// The meeting request is invalid.
        InvalidRequest = 2 => "invalid meeting request",
        /// A mailbox error prevented the response.
        MailboxError = 3 => "mailbox error",
        /// A server error prevented the response.
        ServerError = 4 => "meeting response server error",
    }
}
