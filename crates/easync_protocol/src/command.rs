//! ActiveSync command names.

/// A protocol command, as named in the `Cmd` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Synchronize the folder hierarchy.
    FolderSync,
    /// Synchronize one or more collections.
    Sync,
    /// Long-poll for changes (Direct Push).
    Ping,
    /// Acquire or acknowledge security policy.
    Provision,
    /// Device and account settings.
    Settings,
    /// Fetch items and attachments.
    ItemOperations,
    /// Move items between folders.
    MoveItems,
    /// Send a new message.
    SendMail,
    /// Reply to a message, server-side.
    SmartReply,
    /// Forward a message, server-side.
    SmartForward,
    /// Accept, tentatively accept, or decline a meeting request.
    MeetingResponse,
    /// Estimate the number of items a sync would return.
    GetItemEstimate,
    /// Legacy attachment download (pre-14 servers).
    GetAttachment,
}

impl Command {
    /// The wire name used in the request URL.
    pub fn name(self) -> &'static str {
        match self {
            Command::FolderSync => "FolderSync",
            Command::Sync => "Sync",
            Command::Ping => "Ping",
            Command::Provision => "Provision",
            Command::Settings => "Settings",
            Command::ItemOperations => "ItemOperations",
            Command::MoveItems => "MoveItems",
            Command::SendMail => "SendMail",
            Command::SmartReply => "SmartReply",
            Command::SmartForward => "SmartForward",
            Command::MeetingResponse => "MeetingResponse",
            Command::GetItemEstimate => "GetItemEstimate",
            Command::GetAttachment => "GetAttachment",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
