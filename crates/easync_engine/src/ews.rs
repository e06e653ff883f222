//! Legacy SOAP/EWS fallback bridge.
//!
//! Used only for operations the ActiveSync surface cannot perform on
//! older servers: dated task fields, notes CRUD, and meeting responses
//! below protocol 14.0. The bridge bypasses the session manager (its
//! endpoint and authentication differ) but shares the NTLM
//! authenticator. It is deliberately narrow: envelopes are assembled
//! as strings and responses are scanned for fault markers and item
//! identifiers, not parsed into a full SOAP model.

use crate::config::AccountConfig;
use crate::error::{EasError, EasResult};
use crate::transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use easync_ntlm::{authenticate, negotiate, Challenge, Credentials};
use easync_protocol::MeetingAnswer;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SOAP_ACTION_BASE: &str = "http://schemas.microsoft.com/exchange/services/2006/messages/";

/// Authentication strategies, tried in order until the server accepts
/// one. New credential-formatting quirks become new list entries.
const AUTH_STRATEGIES: &[AuthStrategy] = &[
    AuthStrategy::Ntlm,
    AuthStrategy::Basic(CredentialFormat::DomainSlashUser),
    AuthStrategy::Basic(CredentialFormat::BareUser),
    AuthStrategy::Basic(CredentialFormat::PrincipalName),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStrategy {
    /// Full NTLM handshake per logical operation.
    Ntlm,
    /// Basic auth with one of the credential formats.
    Basic(CredentialFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialFormat {
    /// `DOMAIN\user`.
    DomainSlashUser,
    /// `user`.
    BareUser,
    /// `user@domain`.
    PrincipalName,
}

impl CredentialFormat {
    fn render(self, credentials: &Credentials) -> String {
        if credentials.domain.is_empty() {
            return credentials.username.clone();
        }
        match self {
            CredentialFormat::DomainSlashUser => {
                format!("{}\\{}", credentials.domain, credentials.username)
            }
            CredentialFormat::BareUser => credentials.username.clone(),
            CredentialFormat::PrincipalName => {
                format!("{}@{}", credentials.username, credentials.domain)
            }
        }
    }
}

/// An EWS item identifier with its change token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EwsItemId {
    /// Opaque item id.
    pub id: String,
    /// Change key for subsequent updates.
    pub change_key: String,
}

/// A task created through the bridge.
#[derive(Debug, Clone, Default)]
pub struct EwsTask {
    /// Task subject.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Start date, when set.
    pub start_date: Option<DateTime<Utc>>,
    /// Due date, when set.
    pub due_date: Option<DateTime<Utc>>,
}

/// The SOAP/EWS fallback bridge.
pub struct EwsBridge<C: HttpClient> {
    client: Arc<C>,
    endpoint: String,
    credentials: Credentials,
    user_agent: String,
    timeout: Duration,
}

impl<C: HttpClient> EwsBridge<C> {
    /// Creates a bridge for the account's server.
    pub fn new(config: &AccountConfig, client: Arc<C>) -> Self {
        Self {
            client,
            endpoint: format!("{}/EWS/Exchange.asmx", config.server_url),
            credentials: config.credentials.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeouts.command,
        }
    }

    /// Creates a task with dated fields.
    pub async fn create_task(&self, task: &EwsTask) -> EasResult<EwsItemId> {
        let mut fields = format!(
            "<t:Subject>{}</t:Subject><t:Body BodyType=\"Text\">{}</t:Body>",
            xml_escape(&task.subject),
            xml_escape(&task.body),
        );
        if let Some(start) = task.start_date {
            fields.push_str(&format!("<t:StartDate>{}</t:StartDate>", ews_date(start)));
        }
        if let Some(due) = task.due_date {
            fields.push_str(&format!("<t:DueDate>{}</t:DueDate>", ews_date(due)));
        }
        let body = format!(
            "<m:CreateItem MessageDisposition=\"SaveOnly\"><m:Items><t:Task>{fields}</t:Task></m:Items></m:CreateItem>"
        );
        let response = self.call("CreateItem", &body).await?;
        extract_item_id(&response).ok_or_else(|| missing_item_id("CreateItem"))
    }

    /// Creates a sticky note.
    pub async fn create_note(&self, subject: &str, body: &str) -> EasResult<EwsItemId> {
        let soap_body = format!(
            "<m:CreateItem MessageDisposition=\"SaveOnly\">\
             <m:SavedItemFolderId><t:DistinguishedFolderId Id=\"notes\"/></m:SavedItemFolderId>\
             <m:Items><t:Message>\
             <t:ItemClass>IPM.StickyNote</t:ItemClass>\
             <t:Subject>{}</t:Subject>\
             <t:Body BodyType=\"Text\">{}</t:Body>\
             </t:Message></m:Items></m:CreateItem>",
            xml_escape(subject),
            xml_escape(body),
        );
        let response = self.call("CreateItem", &soap_body).await?;
        extract_item_id(&response).ok_or_else(|| missing_item_id("CreateItem"))
    }

    /// Rewrites a note's subject and body.
    pub async fn update_note(
        &self,
        item: &EwsItemId,
        subject: &str,
        body: &str,
    ) -> EasResult<EwsItemId> {
        let soap_body = format!(
            "<m:UpdateItem MessageDisposition=\"SaveOnly\" ConflictResolution=\"AlwaysOverwrite\">\
             <m:ItemChanges><t:ItemChange>\
             <t:ItemId Id=\"{}\" ChangeKey=\"{}\"/>\
             <t:Updates>\
             <t:SetItemField><t:FieldURI FieldURI=\"item:Subject\"/>\
             <t:Message><t:Subject>{}</t:Subject></t:Message></t:SetItemField>\
             <t:SetItemField><t:FieldURI FieldURI=\"item:Body\"/>\
             <t:Message><t:Body BodyType=\"Text\">{}</t:Body></t:Message></t:SetItemField>\
             </t:Updates>\
             </t:ItemChange></m:ItemChanges></m:UpdateItem>",
            xml_escape(&item.id),
            xml_escape(&item.change_key),
            xml_escape(subject),
            xml_escape(body),
        );
        let response = self.call("UpdateItem", &soap_body).await?;
        extract_item_id(&response).ok_or_else(|| missing_item_id("UpdateItem"))
    }

    /// Deletes a note (moved to Deleted Items).
    pub async fn delete_note(&self, item: &EwsItemId) -> EasResult<()> {
        let soap_body = format!(
            "<m:DeleteItem DeleteType=\"MoveToDeletedItems\">\
             <m:ItemIds><t:ItemId Id=\"{}\" ChangeKey=\"{}\"/></m:ItemIds>\
             </m:DeleteItem>",
            xml_escape(&item.id),
            xml_escape(&item.change_key),
        );
        self.call("DeleteItem", &soap_body).await?;
        Ok(())
    }

    /// Answers a meeting request on servers whose ActiveSync surface
    /// predates MeetingResponse.
    pub async fn meeting_response(
        &self,
        invitation: &EwsItemId,
        answer: MeetingAnswer,
    ) -> EasResult<()> {
        let element = match answer {
            MeetingAnswer::Accept => "AcceptItem",
            MeetingAnswer::Tentative => "TentativelyAcceptItem",
            MeetingAnswer::Decline => "DeclineItem",
        };
        let soap_body = format!(
            "<m:CreateItem MessageDisposition=\"SendAndSaveCopy\">\
             <m:Items><t:{element}>\
             <t:ReferenceItemId Id=\"{}\" ChangeKey=\"{}\"/>\
             </t:{element}></m:Items></m:CreateItem>",
            xml_escape(&invitation.id),
            xml_escape(&invitation.change_key),
        );
        self.call("CreateItem", &soap_body).await?;
        Ok(())
    }

    /// Sends one SOAP operation through the authentication ladder and
    /// scans the response for fault markers.
    async fn call(&self, operation: &str, body: &str) -> EasResult<String> {
        let envelope = soap_envelope(body);
        let action = format!("{SOAP_ACTION_BASE}{operation}");

        let mut response = None;
        for strategy in AUTH_STRATEGIES {
            let attempt = match strategy {
                AuthStrategy::Ntlm => self.try_ntlm(&action, &envelope).await?,
                AuthStrategy::Basic(format) => {
                    let token = BASE64.encode(format!(
                        "{}:{}",
                        format.render(&self.credentials),
                        self.credentials.password
                    ));
                    self.post(&action, &envelope, &format!("Basic {token}")).await?
                }
            };
            // Uniform success predicate across strategies: the server
            // accepted the request's authorization.
            match attempt.status {
                401 | 403 => {
                    debug!(?strategy, status = attempt.status, "EWS auth rejected, trying next");
                    continue;
                }
                _ => {
                    response = Some(attempt);
                    break;
                }
            }
        }
        let response = response.ok_or(EasError::Authorization { http_status: 401 })?;

        if !response.is_success() {
            return Err(EasError::Transport {
                message: format!("EWS HTTP status {}", response.status),
                retryable: response.status >= 500,
            });
        }

        let text = String::from_utf8(response.body)
            .map_err(|_| EasError::transport_fatal("EWS response is not UTF-8"))?;
        if let Some(fault) = find_fault(&text) {
            warn!(operation, %fault, "EWS operation faulted");
            return Err(EasError::protocol(format!("EWS {operation}"), 0, fault));
        }
        Ok(text)
    }

    async fn try_ntlm(&self, action: &str, envelope: &str) -> EasResult<HttpResponse> {
        let type1 = negotiate();
        let first = self
            .post(action, envelope, &format!("NTLM {}", BASE64.encode(type1)))
            .await?;
        if first.status != 401 {
            return Ok(first);
        }

        let Some(challenge) = first
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("WWW-Authenticate"))
            .find_map(|(_, value)| value.trim().strip_prefix("NTLM "))
            .and_then(|blob| BASE64.decode(blob.trim()).ok())
            .and_then(|bytes| Challenge::parse(&bytes).ok())
        else {
            // No usable challenge; report the 401 so the ladder moves on.
            return Ok(first);
        };

        let type3 = authenticate(&challenge, &self.credentials);
        self.post(action, envelope, &format!("NTLM {}", BASE64.encode(type3)))
            .await
    }

    async fn post(
        &self,
        action: &str,
        envelope: &str,
        authorization: &str,
    ) -> EasResult<HttpResponse> {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            headers: vec![
                ("Authorization".to_string(), authorization.to_string()),
                ("Content-Type".to_string(), "text/xml; charset=utf-8".to_string()),
                ("SOAPAction".to_string(), format!("\"{action}\"")),
                ("User-Agent".to_string(), self.user_agent.clone()),
            ],
            body: envelope.as_bytes().to_vec(),
            timeout: self.timeout,
        };
        self.client
            .execute(request)
            .await
            .map_err(EasError::transport_retryable)
    }
}

fn soap_envelope(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns:t=\"http://schemas.microsoft.com/exchange/services/2006/types\" \
         xmlns:m=\"http://schemas.microsoft.com/exchange/services/2006/messages\">\
         <soap:Header><t:RequestServerVersion Version=\"Exchange2007_SP1\"/></soap:Header>\
         <soap:Body>{body}</soap:Body>\
         </soap:Envelope>"
    )
}

fn ews_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn missing_item_id(operation: &str) -> EasError {
    EasError::protocol(
        format!("EWS {operation}"),
        0,
        "response carries no ItemId",
    )
}

/// Scan a response for SOAP faults or error-class response messages,
/// returning a description when one is present.
fn find_fault(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut error_class = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"faultstring" || name.as_ref() == b"MessageText" {
                    let text = reader.read_text(e.name()).ok()?;
                    let text = text.trim();
                    if name.as_ref() == b"faultstring" || error_class {
                        return Some(text.to_string());
                    }
                } else if has_error_class(&e) {
                    error_class = true;
                }
            }
            Ok(Event::Empty(e)) => {
                if has_error_class(&e) {
                    error_class = true;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    error_class.then(|| "EWS response message class is Error".to_string())
}

fn has_error_class(e: &quick_xml::events::BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|attr| {
        attr.key.local_name().as_ref() == b"ResponseClass"
            && attr.value.as_ref() == b"Error"
    })
}

/// Extract the first ItemId element's id and change key.
fn extract_item_id(xml: &str) -> Option<EwsItemId> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"ItemId" {
                    let mut id = None;
                    let mut change_key = None;
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok()?.into_owned();
                        match attr.key.local_name().as_ref() {
                            b"Id" => id = Some(value),
                            b"ChangeKey" => change_key = Some(value),
                            _ => {}
                        }
                    }
                    return Some(EwsItemId {
                        id: id?,
                        change_key: change_key.unwrap_or_default(),
                    });
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}
