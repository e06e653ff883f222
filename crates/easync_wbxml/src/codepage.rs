//! ActiveSync codepage tables.
//!
//! ActiveSync multiplexes its XML namespaces into single-byte WBXML
//! codepages. Each page maps tag tokens (0x05..=0x3F) to element names.
//! The tables below cover the namespaces this engine speaks; tokens the
//! tables do not know are decoded to synthesized names (see
//! [`synthesized_name`]) so a response is never lost to a vocabulary gap.

use serde::{Deserialize, Serialize};

/// An ActiveSync WBXML codepage (one per protocol namespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Codepage {
    AirSync,
    Contacts,
    Email,
    Calendar,
    Move,
    ItemEstimate,
    FolderHierarchy,
    MeetingResponse,
    Tasks,
    Ping,
    Provision,
    Search,
    Gal,
    AirSyncBase,
    Settings,
    ItemOperations,
    ComposeMail,
    Email2,
    Notes,
    /// A page this codec has no table for, preserved by number.
    Unknown(u8),
}

impl Codepage {
    /// The wire codepage number.
    pub fn number(self) -> u8 {
        match self {
            Codepage::AirSync => 0,
            Codepage::Contacts => 1,
            Codepage::Email => 2,
            Codepage::Calendar => 4,
            Codepage::Move => 5,
            Codepage::ItemEstimate => 6,
            Codepage::FolderHierarchy => 7,
            Codepage::MeetingResponse => 8,
            Codepage::Tasks => 9,
            Codepage::Ping => 13,
            Codepage::Provision => 14,
            Codepage::Search => 15,
            Codepage::Gal => 16,
            Codepage::AirSyncBase => 17,
            Codepage::Settings => 18,
            Codepage::ItemOperations => 20,
            Codepage::ComposeMail => 21,
            Codepage::Email2 => 22,
            Codepage::Notes => 23,
            Codepage::Unknown(n) => n,
        }
    }

    /// Resolve a wire codepage number.
    pub fn from_number(n: u8) -> Self {
        match n {
            0 => Codepage::AirSync,
            1 => Codepage::Contacts,
            2 => Codepage::Email,
            4 => Codepage::Calendar,
            5 => Codepage::Move,
            6 => Codepage::ItemEstimate,
            7 => Codepage::FolderHierarchy,
            8 => Codepage::MeetingResponse,
            9 => Codepage::Tasks,
            13 => Codepage::Ping,
            14 => Codepage::Provision,
            15 => Codepage::Search,
            16 => Codepage::Gal,
            17 => Codepage::AirSyncBase,
            18 => Codepage::Settings,
            20 => Codepage::ItemOperations,
            21 => Codepage::ComposeMail,
            22 => Codepage::Email2,
            23 => Codepage::Notes,
            other => Codepage::Unknown(other),
        }
    }

    fn table(self) -> &'static [(u8, &'static str)] {
        match self {
            Codepage::AirSync => AIRSYNC,
            Codepage::Contacts => CONTACTS,
            Codepage::Email => EMAIL,
            Codepage::Calendar => CALENDAR,
            Codepage::Move => MOVE,
            Codepage::ItemEstimate => ITEM_ESTIMATE,
            Codepage::FolderHierarchy => FOLDER_HIERARCHY,
            Codepage::MeetingResponse => MEETING_RESPONSE,
            Codepage::Tasks => TASKS,
            Codepage::Ping => PING,
            Codepage::Provision => PROVISION,
            Codepage::Search => SEARCH,
            Codepage::Gal => GAL,
            Codepage::AirSyncBase => AIRSYNC_BASE,
            Codepage::Settings => SETTINGS,
            Codepage::ItemOperations => ITEM_OPERATIONS,
            Codepage::ComposeMail => COMPOSE_MAIL,
            Codepage::Email2 => EMAIL2,
            Codepage::Notes => NOTES,
            Codepage::Unknown(_) => &[],
        }
    }

    /// Look up the element name for a tag token on this page.
    pub fn tag_name(self, token: u8) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, name)| *name)
    }

    /// Look up the tag token for an element name on this page.
    pub fn tag_token(self, name: &str) -> Option<u8> {
        self.table()
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(t, _)| *t)
    }
}

/// Synthesize a queryable name for a token missing from the tables.
pub fn synthesized_name(page: u8, token: u8) -> String {
    format!("X-p{page}-t{token:#04x}")
}

/// Parse a name produced by [`synthesized_name`] back into its token,
/// so documents containing unknown tags survive a re-encode.
pub fn parse_synthesized_name(name: &str) -> Option<(u8, u8)> {
    let rest = name.strip_prefix("X-p")?;
    let (page, token) = rest.split_once("-t")?;
    let page = page.parse().ok()?;
    let token = u8::from_str_radix(token.strip_prefix("0x")?, 16).ok()?;
    Some((page, token))
}

const AIRSYNC: &[(u8, &str)] = &[
    (0x05, "Sync"),
    (0x06, "Responses"),
    (0x07, "Add"),
    (0x08, "Change"),
    (0x09, "Delete"),
    (0x0A, "Fetch"),
    (0x0B, "SyncKey"),
    (0x0C, "ClientId"),
    (0x0D, "ServerId"),
    (0x0E, "Status"),
    (0x0F, "Collection"),
    (0x10, "Class"),
    (0x12, "CollectionId"),
    (0x13, "GetChanges"),
    (0x14, "MoreAvailable"),
    (0x15, "WindowSize"),
    (0x16, "Commands"),
    (0x17, "Options"),
    (0x18, "FilterType"),
    (0x1B, "Conflict"),
    (0x1C, "Collections"),
    (0x1D, "ApplicationData"),
    (0x1E, "DeletesAsMoves"),
    (0x20, "Supported"),
    (0x21, "SoftDelete"),
    (0x22, "MIMESupport"),
    (0x23, "MIMETruncation"),
    (0x24, "Wait"),
    (0x25, "Limit"),
    (0x26, "Partial"),
    (0x27, "ConversationMode"),
    (0x28, "MaxItems"),
    (0x29, "HeartbeatInterval"),
];

const CONTACTS: &[(u8, &str)] = &[
    (0x05, "Anniversary"),
    (0x06, "AssistantName"),
    (0x07, "AssistantTelephoneNumber"),
    (0x08, "Birthday"),
    (0x0C, "BusinessCity"),
    (0x0D, "BusinessCountry"),
    (0x0E, "BusinessPostalCode"),
    (0x0F, "BusinessState"),
    (0x10, "BusinessStreet"),
    (0x11, "BusinessFaxNumber"),
    (0x12, "BusinessPhoneNumber"),
    (0x13, "CarPhoneNumber"),
    (0x14, "Categories"),
    (0x15, "Category"),
    (0x16, "Children"),
    (0x17, "Child"),
    (0x18, "CompanyName"),
    (0x19, "Department"),
    (0x1A, "Email1Address"),
    (0x1B, "Email2Address"),
    (0x1C, "Email3Address"),
    (0x1D, "FileAs"),
    (0x1E, "FirstName"),
    (0x1F, "HomeCity"),
    (0x20, "HomeCountry"),
    (0x21, "HomePostalCode"),
    (0x22, "HomeState"),
    (0x23, "HomeStreet"),
    (0x24, "HomeFaxNumber"),
    (0x25, "HomePhoneNumber"),
    (0x26, "Home2PhoneNumber"),
    (0x27, "JobTitle"),
    (0x28, "LastName"),
    (0x29, "MiddleName"),
    (0x2A, "MobilePhoneNumber"),
    (0x2B, "OfficeLocation"),
    (0x2C, "OtherCity"),
    (0x2D, "OtherCountry"),
    (0x2E, "OtherPostalCode"),
    (0x2F, "OtherState"),
    (0x30, "OtherStreet"),
    (0x31, "PagerNumber"),
    (0x32, "RadioPhoneNumber"),
    (0x33, "Spouse"),
    (0x34, "Suffix"),
    (0x35, "Title"),
    (0x36, "WebPage"),
    (0x37, "YomiCompanyName"),
    (0x38, "YomiFirstName"),
    (0x39, "YomiLastName"),
    (0x3B, "Picture"),
];

const EMAIL: &[(u8, &str)] = &[
    (0x0F, "DateReceived"),
    (0x11, "DisplayTo"),
    (0x12, "Importance"),
    (0x13, "MessageClass"),
    (0x14, "Subject"),
    (0x15, "Read"),
    (0x16, "To"),
    (0x17, "Cc"),
    (0x18, "From"),
    (0x19, "ReplyTo"),
    (0x1A, "AllDayEvent"),
    (0x1B, "Categories"),
    (0x1C, "Category"),
    (0x1D, "DtStamp"),
    (0x1E, "EndTime"),
    (0x1F, "InstanceType"),
    (0x20, "BusyStatus"),
    (0x21, "Location"),
    (0x22, "MeetingRequest"),
    (0x23, "Organizer"),
    (0x24, "RecurrenceId"),
    (0x25, "Reminder"),
    (0x26, "ResponseRequested"),
    (0x27, "Recurrences"),
    (0x28, "Recurrence"),
    (0x29, "Type"),
    (0x2A, "Until"),
    (0x2B, "Occurrences"),
    (0x2C, "Interval"),
    (0x2D, "DayOfWeek"),
    (0x2E, "DayOfMonth"),
    (0x2F, "WeekOfMonth"),
    (0x30, "MonthOfYear"),
    (0x31, "StartTime"),
    (0x32, "Sensitivity"),
    (0x33, "TimeZone"),
    (0x34, "GlobalObjId"),
    (0x35, "ThreadTopic"),
    (0x39, "InternetCPID"),
    (0x3A, "Flag"),
    (0x3B, "FlagStatus"),
    (0x3C, "ContentClass"),
    (0x3D, "FlagType"),
    (0x3E, "CompleteTime"),
];

const CALENDAR: &[(u8, &str)] = &[
    (0x05, "TimeZone"),
    (0x06, "AllDayEvent"),
    (0x07, "Attendees"),
    (0x08, "Attendee"),
    (0x09, "Email"),
    (0x0A, "Name"),
    (0x0D, "BusyStatus"),
    (0x0E, "Categories"),
    (0x0F, "Category"),
    (0x11, "DtStamp"),
    (0x12, "EndTime"),
    (0x13, "Exception"),
    (0x14, "Exceptions"),
    (0x15, "Deleted"),
    (0x16, "ExceptionStartTime"),
    (0x17, "Location"),
    (0x18, "MeetingStatus"),
    (0x19, "OrganizerEmail"),
    (0x1A, "OrganizerName"),
    (0x1B, "Recurrence"),
    (0x1C, "Type"),
    (0x1D, "Until"),
    (0x1E, "Occurrences"),
    (0x1F, "Interval"),
    (0x20, "DayOfWeek"),
    (0x21, "DayOfMonth"),
    (0x22, "WeekOfMonth"),
    (0x23, "MonthOfYear"),
    (0x24, "Reminder"),
    (0x25, "Sensitivity"),
    (0x26, "Subject"),
    (0x27, "StartTime"),
    (0x28, "UID"),
    (0x29, "AttendeeStatus"),
    (0x2A, "AttendeeType"),
    (0x33, "DisallowNewTimeProposal"),
    (0x34, "ResponseRequested"),
    (0x35, "AppointmentReplyTime"),
    (0x36, "ResponseType"),
    (0x37, "CalendarType"),
    (0x38, "IsLeapMonth"),
    (0x39, "FirstDayOfWeek"),
    (0x3A, "OnlineMeetingConfLink"),
    (0x3B, "OnlineMeetingExternalLink"),
];

const MOVE: &[(u8, &str)] = &[
    (0x05, "MoveItems"),
    (0x06, "Move"),
    (0x07, "SrcMsgId"),
    (0x08, "SrcFldId"),
    (0x09, "DstFldId"),
    (0x0A, "Response"),
    (0x0B, "Status"),
    (0x0C, "DstMsgId"),
];

const ITEM_ESTIMATE: &[(u8, &str)] = &[
    (0x05, "GetItemEstimate"),
    (0x06, "Version"),
    (0x07, "Collections"),
    (0x08, "Collection"),
    (0x09, "Class"),
    (0x0A, "CollectionId"),
    (0x0B, "DateFilter"),
    (0x0C, "Estimate"),
    (0x0D, "Response"),
    (0x0E, "Status"),
];

const FOLDER_HIERARCHY: &[(u8, &str)] = &[
    (0x05, "Folders"),
    (0x06, "Folder"),
    (0x07, "DisplayName"),
    (0x08, "ServerId"),
    (0x09, "ParentId"),
    (0x0A, "Type"),
    (0x0B, "Response"),
    (0x0C, "Status"),
    (0x0D, "ContentClass"),
    (0x0E, "Changes"),
    (0x0F, "Add"),
    (0x10, "Delete"),
    (0x11, "Update"),
    (0x12, "SyncKey"),
    (0x13, "FolderCreate"),
    (0x14, "FolderDelete"),
    (0x15, "FolderUpdate"),
    (0x16, "FolderSync"),
    (0x17, "Count"),
];

const MEETING_RESPONSE: &[(u8, &str)] = &[
    (0x05, "CalendarId"),
    (0x06, "CollectionId"),
    (0x07, "MeetingResponse"),
    (0x08, "RequestId"),
    (0x09, "Request"),
    (0x0A, "Result"),
    (0x0B, "Status"),
    (0x0C, "UserResponse"),
    (0x0E, "InstanceId"),
];

const TASKS: &[(u8, &str)] = &[
    (0x08, "Categories"),
    (0x09, "Category"),
    (0x0A, "Complete"),
    (0x0B, "DateCompleted"),
    (0x0C, "DueDate"),
    (0x0D, "UtcDueDate"),
    (0x0E, "Importance"),
    (0x0F, "Recurrence"),
    (0x10, "Type"),
    (0x11, "Start"),
    (0x12, "Until"),
    (0x13, "Occurrences"),
    (0x14, "Interval"),
    (0x15, "DayOfMonth"),
    (0x16, "DayOfWeek"),
    (0x17, "WeekOfMonth"),
    (0x18, "MonthOfYear"),
    (0x19, "Regenerate"),
    (0x1A, "DeadOccur"),
    (0x1B, "ReminderSet"),
    (0x1C, "ReminderTime"),
    (0x1D, "Sensitivity"),
    (0x1E, "StartDate"),
    (0x1F, "UtcStartDate"),
    (0x20, "Subject"),
    (0x22, "OrdinalDate"),
    (0x23, "SubOrdinalDate"),
    (0x24, "CalendarType"),
    (0x25, "IsLeapMonth"),
    (0x26, "FirstDayOfWeek"),
];

const PING: &[(u8, &str)] = &[
    (0x05, "Ping"),
    (0x06, "AutdState"),
    (0x07, "Status"),
    (0x08, "HeartbeatInterval"),
    (0x09, "Folders"),
    (0x0A, "Folder"),
    (0x0B, "Id"),
    (0x0C, "Class"),
    (0x0D, "MaxFolders"),
];

const PROVISION: &[(u8, &str)] = &[
    (0x05, "Provision"),
    (0x06, "Policies"),
    (0x07, "Policy"),
    (0x08, "PolicyType"),
    (0x09, "PolicyKey"),
    (0x0A, "Data"),
    (0x0B, "Status"),
    (0x0C, "RemoteWipe"),
    (0x0D, "EASProvisionDoc"),
    (0x0E, "DevicePasswordEnabled"),
    (0x0F, "AlphanumericDevicePasswordRequired"),
    (0x10, "DeviceEncryptionEnabled"),
    (0x11, "PasswordRecoveryEnabled"),
    (0x13, "AttachmentsEnabled"),
    (0x14, "MinDevicePasswordLength"),
    (0x15, "MaxInactivityTimeDeviceLock"),
    (0x16, "MaxDevicePasswordFailedAttempts"),
    (0x17, "MaxAttachmentSize"),
    (0x18, "AllowSimpleDevicePassword"),
    (0x19, "DevicePasswordExpiration"),
    (0x1A, "DevicePasswordHistory"),
    (0x1B, "AllowStorageCard"),
    (0x1C, "AllowCamera"),
    (0x1D, "RequireDeviceEncryption"),
    (0x1E, "AllowUnsignedApplications"),
    (0x1F, "AllowUnsignedInstallationPackages"),
    (0x20, "MinDevicePasswordComplexCharacters"),
    (0x21, "AllowWiFi"),
    (0x22, "AllowTextMessaging"),
    (0x23, "AllowPOPIMAPEmail"),
    (0x24, "AllowBluetooth"),
    (0x25, "AllowIrDA"),
    (0x26, "RequireManualSyncWhenRoaming"),
    (0x27, "AllowDesktopSync"),
    (0x28, "MaxCalendarAgeFilter"),
    (0x29, "AllowHTMLEmail"),
    (0x2A, "MaxEmailAgeFilter"),
    (0x2B, "MaxEmailBodyTruncationSize"),
    (0x2C, "MaxEmailHTMLBodyTruncationSize"),
    (0x2D, "RequireSignedSMIMEMessages"),
    (0x2E, "RequireEncryptedSMIMEMessages"),
    (0x2F, "RequireSignedSMIMEAlgorithm"),
    (0x30, "RequireEncryptionSMIMEAlgorithm"),
    (0x31, "AllowSMIMEEncryptionAlgorithmNegotiation"),
    (0x32, "AllowSMIMESoftCerts"),
    (0x33, "AllowBrowser"),
    (0x34, "AllowConsumerEmail"),
    (0x35, "AllowRemoteDesktop"),
    (0x36, "AllowInternetSharing"),
    (0x37, "UnapprovedInROMApplicationList"),
    (0x38, "ApplicationName"),
    (0x39, "ApprovedApplicationList"),
    (0x3A, "Hash"),
];

const SEARCH: &[(u8, &str)] = &[
    (0x05, "Search"),
    (0x07, "Store"),
    (0x08, "Name"),
    (0x09, "Query"),
    (0x0A, "Options"),
    (0x0B, "Range"),
    (0x0C, "Status"),
    (0x0D, "Response"),
    (0x0E, "Result"),
    (0x0F, "Properties"),
    (0x10, "Total"),
    (0x11, "EqualTo"),
    (0x12, "Value"),
    (0x13, "And"),
    (0x14, "Or"),
    (0x15, "FreeText"),
    (0x17, "DeepTraversal"),
    (0x18, "LongId"),
    (0x19, "RebuildResults"),
    (0x1A, "LessThan"),
    (0x1B, "GreaterThan"),
    (0x1E, "UserName"),
    (0x1F, "Password"),
    (0x20, "ConversationId"),
    (0x21, "Picture"),
    (0x22, "MaxSize"),
    (0x23, "MaxPictures"),
];

const GAL: &[(u8, &str)] = &[
    (0x05, "DisplayName"),
    (0x06, "Phone"),
    (0x07, "Office"),
    (0x08, "Title"),
    (0x09, "Company"),
    (0x0A, "Alias"),
    (0x0B, "FirstName"),
    (0x0C, "LastName"),
    (0x0D, "HomePhone"),
    (0x0E, "MobilePhone"),
    (0x0F, "EmailAddress"),
    (0x10, "Picture"),
    (0x11, "Status"),
    (0x12, "Data"),
];

const AIRSYNC_BASE: &[(u8, &str)] = &[
    (0x05, "BodyPreference"),
    (0x06, "Type"),
    (0x07, "TruncationSize"),
    (0x08, "AllOrNone"),
    (0x0A, "Body"),
    (0x0B, "Data"),
    (0x0C, "EstimatedDataSize"),
    (0x0D, "Truncated"),
    (0x0E, "Attachments"),
    (0x0F, "Attachment"),
    (0x10, "DisplayName"),
    (0x11, "FileReference"),
    (0x12, "Method"),
    (0x13, "ContentId"),
    (0x14, "ContentLocation"),
    (0x15, "IsInline"),
    (0x16, "NativeBodyType"),
    (0x17, "ContentType"),
    (0x18, "Preview"),
    (0x19, "BodyPartPreference"),
    (0x1A, "BodyPart"),
    (0x1B, "Status"),
];

const SETTINGS: &[(u8, &str)] = &[
    (0x05, "Settings"),
    (0x06, "Status"),
    (0x07, "Get"),
    (0x08, "Set"),
    (0x09, "Oof"),
    (0x0A, "OofState"),
    (0x0B, "StartTime"),
    (0x0C, "EndTime"),
    (0x0D, "OofMessage"),
    (0x0E, "AppliesToInternal"),
    (0x0F, "AppliesToExternalKnown"),
    (0x10, "AppliesToExternalUnknown"),
    (0x11, "Enabled"),
    (0x12, "ReplyMessage"),
    (0x13, "BodyType"),
    (0x14, "DevicePassword"),
    (0x15, "Password"),
    (0x16, "DeviceInformation"),
    (0x17, "Model"),
    (0x18, "IMEI"),
    (0x19, "FriendlyName"),
    (0x1A, "OS"),
    (0x1B, "OSLanguage"),
    (0x1C, "PhoneNumber"),
    (0x1D, "UserInformation"),
    (0x1E, "EmailAddresses"),
    (0x1F, "SmtpAddress"),
    (0x20, "UserAgent"),
    (0x21, "EnableOutboundSMS"),
    (0x22, "MobileOperator"),
    (0x23, "PrimarySmtpAddress"),
    (0x24, "Accounts"),
    (0x25, "Account"),
    (0x26, "AccountId"),
    (0x27, "AccountName"),
    (0x28, "UserDisplayName"),
    (0x29, "SendDisabled"),
];

const ITEM_OPERATIONS: &[(u8, &str)] = &[
    (0x05, "ItemOperations"),
    (0x06, "Fetch"),
    (0x07, "Store"),
    (0x08, "Options"),
    (0x09, "Range"),
    (0x0A, "Total"),
    (0x0B, "Properties"),
    (0x0C, "Data"),
    (0x0D, "Status"),
    (0x0E, "Response"),
    (0x0F, "Version"),
    (0x10, "Schema"),
    (0x11, "Part"),
    (0x12, "EmptyFolderContents"),
    (0x13, "DeleteSubFolders"),
    (0x14, "UserName"),
    (0x15, "Password"),
    (0x16, "Move"),
    (0x17, "DstFldId"),
    (0x18, "ConversationId"),
    (0x19, "MoveAlways"),
];

const COMPOSE_MAIL: &[(u8, &str)] = &[
    (0x05, "SendMail"),
    (0x06, "SmartForward"),
    (0x07, "SmartReply"),
    (0x08, "SaveInSentItems"),
    (0x09, "ReplaceMime"),
    (0x0B, "Source"),
    (0x0C, "FolderId"),
    (0x0D, "ItemId"),
    (0x0E, "LongId"),
    (0x0F, "InstanceId"),
    (0x10, "Mime"),
    (0x11, "ClientId"),
    (0x12, "Status"),
    (0x13, "AccountId"),
];

const EMAIL2: &[(u8, &str)] = &[
    (0x05, "UmCallerID"),
    (0x06, "UmUserNotes"),
    (0x07, "UmAttDuration"),
    (0x08, "UmAttOrder"),
    (0x09, "ConversationId"),
    (0x0A, "ConversationIndex"),
    (0x0B, "LastVerbExecuted"),
    (0x0C, "LastVerbExecutionTime"),
    (0x0D, "ReceivedAsBcc"),
    (0x0E, "Sender"),
    (0x0F, "CalendarType"),
    (0x10, "IsLeapMonth"),
    (0x11, "AccountId"),
    (0x12, "FirstDayOfWeek"),
    (0x13, "MeetingMessageType"),
];

const NOTES: &[(u8, &str)] = &[
    (0x05, "Subject"),
    (0x06, "MessageClass"),
    (0x07, "LastModifiedDate"),
    (0x08, "Categories"),
    (0x09, "Category"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_roundtrip() {
        for n in 0..=30u8 {
            assert_eq!(Codepage::from_number(n).number(), n);
        }
    }

    #[test]
    fn airsync_tokens() {
        assert_eq!(Codepage::AirSync.tag_token("Sync"), Some(0x05));
        assert_eq!(Codepage::AirSync.tag_token("SyncKey"), Some(0x0B));
        assert_eq!(Codepage::AirSync.tag_name(0x0E), Some("Status"));
        assert_eq!(Codepage::AirSync.tag_name(0x11), None);
    }

    #[test]
    fn provision_tokens() {
        assert_eq!(Codepage::Provision.tag_token("PolicyKey"), Some(0x09));
        assert_eq!(Codepage::Provision.tag_name(0x0D), Some("EASProvisionDoc"));
    }

    #[test]
    fn unknown_page_has_no_names() {
        assert_eq!(Codepage::Unknown(30).tag_name(0x05), None);
        assert_eq!(Codepage::Unknown(30).tag_token("Sync"), None);
    }

    #[test]
    fn synthesized_names_parse_back() {
        let name = synthesized_name(14, 0x3F);
        assert_eq!(parse_synthesized_name(&name), Some((14, 0x3F)));
        assert_eq!(parse_synthesized_name("Subject"), None);
    }
}
