//! ComposeMail, MoveItems and MeetingResponse message shapes.

use easync_wbxml::{Codepage, Element, WbxmlResult};

use crate::folder::missing;
use crate::status::{MeetingResponseStatus, MoveStatus};

/// Build a 14.x SendMail request with the given MIME payload.
///
/// Pre-14 servers take the raw MIME as the POST body instead; the
/// session layer chooses between the two shapes by negotiated version.
pub fn send_mail_request(client_id: &str, mime: Vec<u8>, save_in_sent: bool) -> Element {
    let mut request = Element::new(Codepage::ComposeMail, "SendMail").with_text(
        Codepage::ComposeMail,
        "ClientId",
        client_id,
    );
    if save_in_sent {
        request.push(Element::new(Codepage::ComposeMail, "SaveInSentItems"));
    }
    request.push(Element::opaque(Codepage::ComposeMail, "Mime", mime));
    request
}

/// Parse a SendMail response status. A 14.x SendMail returns an empty
/// body on success, so an absent status means the send was accepted.
pub fn parse_send_mail_status(root: &Element) -> Option<u8> {
    root.child_parsed("Status")
}

/// Build a 14.x SmartReply request.
///
/// `Source` names the message being answered; the server merges the
/// original body and attachments, so the MIME payload carries only the
/// new content.
pub fn smart_reply_request(
    client_id: &str,
    folder_id: &str,
    item_id: &str,
    mime: Vec<u8>,
    save_in_sent: bool,
) -> Element {
    smart_send_request("SmartReply", client_id, folder_id, item_id, mime, save_in_sent)
}

/// Build a 14.x SmartForward request.
///
/// The server attaches the original message, so forwards do not round
/// large attachments through the client.
pub fn smart_forward_request(
    client_id: &str,
    folder_id: &str,
    item_id: &str,
    mime: Vec<u8>,
    save_in_sent: bool,
) -> Element {
    smart_send_request("SmartForward", client_id, folder_id, item_id, mime, save_in_sent)
}

fn smart_send_request(
    name: &str,
    client_id: &str,
    folder_id: &str,
    item_id: &str,
    mime: Vec<u8>,
    save_in_sent: bool,
) -> Element {
    let mut request = Element::new(Codepage::ComposeMail, name).with_text(
        Codepage::ComposeMail,
        "ClientId",
        client_id,
    );
    if save_in_sent {
        request.push(Element::new(Codepage::ComposeMail, "SaveInSentItems"));
    }
    request.push(
        Element::new(Codepage::ComposeMail, "Source")
            .with_text(Codepage::ComposeMail, "FolderId", folder_id)
            .with_text(Codepage::ComposeMail, "ItemId", item_id),
    );
    request.push(Element::opaque(Codepage::ComposeMail, "Mime", mime));
    request
}

/// One requested move.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    /// Server id of the item to move.
    pub server_id: String,
    /// Source folder id.
    pub source_folder: String,
    /// Destination folder id.
    pub destination_folder: String,
}

/// One move result.
#[derive(Debug, Clone)]
pub struct MoveResponse {
    /// Server id the request named.
    pub server_id: String,
    /// Move status (success is code 3).
    pub status: MoveStatus,
    /// The item's new server id in the destination folder.
    pub new_server_id: Option<String>,
}

/// Build a MoveItems request document.
pub fn move_items_request(moves: &[MoveRequest]) -> Element {
    let mut request = Element::new(Codepage::Move, "MoveItems");
    for mv in moves {
        request.push(
            Element::new(Codepage::Move, "Move")
                .with_text(Codepage::Move, "SrcMsgId", &mv.server_id)
                .with_text(Codepage::Move, "SrcFldId", &mv.source_folder)
                .with_text(Codepage::Move, "DstFldId", &mv.destination_folder),
        );
    }
    request
}

/// Parse a MoveItems response document.
pub fn parse_move_items(root: &Element) -> WbxmlResult<Vec<MoveResponse>> {
    let mut results = Vec::new();
    for response in root.children_named("Response") {
        results.push(MoveResponse {
            server_id: response
                .child_value("SrcMsgId")
                .ok_or_else(|| missing("MoveItems", "SrcMsgId"))?,
            status: response
                .child_parsed::<u8>("Status")
                .map(MoveStatus::from_code)
                .ok_or_else(|| missing("MoveItems", "Status"))?,
            new_server_id: response.child_value("DstMsgId"),
        });
    }
    Ok(results)
}

/// The user's answer to a meeting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingAnswer {
    /// Accept the meeting.
    Accept,
    /// Tentatively accept the meeting.
    Tentative,
    /// Decline the meeting.
    Decline,
}

impl MeetingAnswer {
    /// The wire code of the `UserResponse` element.
    pub fn code(self) -> u8 {
        match self {
            MeetingAnswer::Accept => 1,
            MeetingAnswer::Tentative => 2,
            MeetingAnswer::Decline => 3,
        }
    }
}

/// One meeting response result.
#[derive(Debug, Clone)]
pub struct MeetingResponseResult {
    /// Status of the recorded response.
    pub status: MeetingResponseStatus,
    /// Server id of the calendar entry created for an accepted meeting.
    pub calendar_id: Option<String>,
}

/// Build a MeetingResponse request for a meeting invitation item.
pub fn meeting_response_request(
    collection_id: &str,
    request_id: &str,
    answer: MeetingAnswer,
) -> Element {
    Element::new(Codepage::MeetingResponse, "MeetingResponse").with(
        Element::new(Codepage::MeetingResponse, "Request")
            .with_text(
                Codepage::MeetingResponse,
                "UserResponse",
                answer.code().to_string(),
            )
            .with_text(Codepage::MeetingResponse, "CollectionId", collection_id)
            .with_text(Codepage::MeetingResponse, "RequestId", request_id),
    )
}

/// Parse a MeetingResponse response for its first result.
pub fn parse_meeting_response(root: &Element) -> WbxmlResult<MeetingResponseResult> {
    let result = root
        .child("Result")
        .ok_or_else(|| missing("MeetingResponse", "Result"))?;
    Ok(MeetingResponseResult {
        status: result
            .child_parsed::<u8>("Status")
            .map(MeetingResponseStatus::from_code)
            .ok_or_else(|| missing("MeetingResponse", "Status"))?,
        calendar_id: result.child_value("CalendarId"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_mail_shape() {
        let req = send_mail_request("c-17", b"MIME-Version: 1.0\r\n".to_vec(), true);
        assert_eq!(req.child_value("ClientId").unwrap(), "c-17");
        assert!(req.child("SaveInSentItems").is_some());
        assert_eq!(
            req.child("Mime").unwrap().opaque_value().unwrap(),
            b"MIME-Version: 1.0\r\n"
        );
    }

    #[test]
    fn send_mail_without_sent_copy() {
        let req = send_mail_request("c-18", Vec::new(), false);
        assert!(req.child("SaveInSentItems").is_none());
    }

    #[test]
    fn smart_reply_names_its_source() {
        let req = smart_reply_request("c-19", "5", "5:7", b"new text".to_vec(), true);
        assert_eq!(req.name, "SmartReply");
        let source = req.child("Source").unwrap();
        assert_eq!(source.child_value("FolderId").unwrap(), "5");
        assert_eq!(source.child_value("ItemId").unwrap(), "5:7");
        assert!(req.child("SaveInSentItems").is_some());
    }

    #[test]
    fn smart_forward_shares_the_shape() {
        let req = smart_forward_request("c-20", "5", "5:7", Vec::new(), false);
        assert_eq!(req.name, "SmartForward");
        assert!(req.child("Source").is_some());
        assert!(req.child("SaveInSentItems").is_none());
    }

    #[test]
    fn move_items_round_trip() {
        let req = move_items_request(&[MoveRequest {
            server_id: "5:3".into(),
            source_folder: "5".into(),
            destination_folder: "4".into(),
        }]);
        let mv = req.child("Move").unwrap();
        assert_eq!(mv.child_value("SrcMsgId").unwrap(), "5:3");
        assert_eq!(mv.child_value("DstFldId").unwrap(), "4");

        let response = Element::new(Codepage::Move, "MoveItems").with(
            Element::new(Codepage::Move, "Response")
                .with_text(Codepage::Move, "SrcMsgId", "5:3")
                .with_text(Codepage::Move, "Status", "3")
                .with_text(Codepage::Move, "DstMsgId", "4:9"),
        );
        let parsed = parse_move_items(&response).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].status.is_success());
        assert_eq!(parsed[0].new_server_id.as_deref(), Some("4:9"));
    }

    #[test]
    fn meeting_response_round_trip() {
        let req = meeting_response_request("5", "5:44", MeetingAnswer::Decline);
        let inner = req.child("Request").unwrap();
        assert_eq!(inner.child_value("UserResponse").unwrap(), "3");
        assert_eq!(inner.child_value("RequestId").unwrap(), "5:44");

        let response = Element::new(Codepage::MeetingResponse, "MeetingResponse").with(
            Element::new(Codepage::MeetingResponse, "Result")
                .with_text(Codepage::MeetingResponse, "Status", "1")
                .with_text(Codepage::MeetingResponse, "CalendarId", "8:2"),
        );
        let parsed = parse_meeting_response(&response).unwrap();
        assert!(parsed.status.is_success());
        assert_eq!(parsed.calendar_id.as_deref(), Some("8:2"));
    }

    #[test]
    fn empty_send_mail_response_is_success() {
        let root = Element::new(Codepage::ComposeMail, "SendMail");
        assert_eq!(parse_send_mail_status(&root), None);
    }
}
