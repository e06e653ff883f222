//! Protocol version negotiation.

use serde::{Deserialize, Serialize};

/// An ActiveSync protocol version this engine can speak.
///
/// The variants are ordered oldest-first so `Ord` reflects protocol
/// capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Exchange 2007.
    V12_0,
    /// Exchange 2007 SP1.
    V12_1,
    /// Exchange 2010.
    V14_0,
    /// Exchange 2010 SP1 and later.
    V14_1,
}

/// Versions the engine supports, in preference order (best first).
pub const SUPPORTED_VERSIONS: &[ProtocolVersion] = &[
    ProtocolVersion::V14_1,
    ProtocolVersion::V14_0,
    ProtocolVersion::V12_1,
    ProtocolVersion::V12_0,
];

impl ProtocolVersion {
    /// The oldest version the engine supports, used as the fallback
    /// when negotiation cannot complete.
    pub const OLDEST: ProtocolVersion = ProtocolVersion::V12_0;

    /// The version string sent in the `MS-ASProtocolVersion` header.
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVersion::V12_0 => "12.0",
            ProtocolVersion::V12_1 => "12.1",
            ProtocolVersion::V14_0 => "14.0",
            ProtocolVersion::V14_1 => "14.1",
        }
    }

    /// Parse a version string from an `MS-ASProtocolVersions` header.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "12.0" => Some(ProtocolVersion::V12_0),
            "12.1" => Some(ProtocolVersion::V12_1),
            "14.0" => Some(ProtocolVersion::V14_0),
            "14.1" => Some(ProtocolVersion::V14_1),
            _ => None,
        }
    }

    /// True when the server supports the ComposeMail command family
    /// (WBXML-bodied SendMail/SmartReply/SmartForward).
    pub fn has_compose_mail(self) -> bool {
        self >= ProtocolVersion::V14_0
    }

    /// True when MeetingResponse works over ActiveSync at this version;
    /// older servers route through the EWS bridge instead.
    pub fn has_meeting_response(self) -> bool {
        self >= ProtocolVersion::V14_0
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the best supported version from a server's advertised list.
///
/// The advertised list is the comma-separated value of the
/// `MS-ASProtocolVersions` header. Returns the first entry of
/// [`SUPPORTED_VERSIONS`] the server also advertises; when the lists do
/// not intersect (or the header is empty/garbled) the oldest supported
/// version is returned, so negotiation never fails a session outright.
pub fn negotiate(advertised: &str) -> ProtocolVersion {
    let server: Vec<ProtocolVersion> = advertised
        .split(',')
        .filter_map(ProtocolVersion::parse)
        .collect();

    SUPPORTED_VERSIONS
        .iter()
        .copied()
        .find(|v| server.contains(v))
        .unwrap_or(ProtocolVersion::OLDEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_common_version() {
        // Server advertises up to 12.1; the engine prefers 14.1 but
        // must land on 12.1.
        assert_eq!(negotiate("2.5,12.0,12.1"), ProtocolVersion::V12_1);
    }

    #[test]
    fn picks_best_when_server_has_everything() {
        assert_eq!(
            negotiate("2.0,2.5,12.0,12.1,14.0,14.1"),
            ProtocolVersion::V14_1
        );
    }

    #[test]
    fn falls_back_when_no_overlap() {
        assert_eq!(negotiate("2.0,2.5"), ProtocolVersion::OLDEST);
        assert_eq!(negotiate(""), ProtocolVersion::OLDEST);
        assert_eq!(negotiate("garbage"), ProtocolVersion::OLDEST);
    }

    #[test]
    fn tolerates_whitespace() {
        assert_eq!(negotiate(" 12.1 , 14.0 "), ProtocolVersion::V14_0);
    }

    #[test]
    fn ordering_reflects_capability() {
        assert!(ProtocolVersion::V14_1 > ProtocolVersion::V12_1);
        assert!(ProtocolVersion::V12_0 < ProtocolVersion::V12_1);
        assert!(ProtocolVersion::V14_0.has_compose_mail());
        assert!(!ProtocolVersion::V12_1.has_compose_mail());
    }
}
