//! Per-collection incremental synchronization.
//!
//! Cursor discipline: a sync key is single-use. The engine sends the
//! stored key, fully parses the response, and only then adopts the
//! returned key; a failed exchange leaves the stored key untouched
//! (or resets it to the initial sentinel when the server declares it
//! invalid). Calls for one collection must be sequential; different
//! collections and accounts sync concurrently.

use crate::error::{EasError, EasResult};
use crate::session::{ExecuteOptions, Session};
use crate::store::StateStore;
use crate::transport::HttpClient;
use chrono::Utc;
use easync_protocol::{
    fetch_attachment_request, folder_sync_request, item_estimate_request,
    meeting_response_request, move_items_request, parse_fetch, parse_folder_sync,
    parse_item_estimate, parse_meeting_response, parse_move_items, parse_send_mail_status,
    parse_sync, send_mail_request, smart_forward_request, smart_reply_request, sync_request,
    CollectionClass,
    Command, Folder, FolderSyncResponse, FolderSyncStatus, MeetingAnswer, MeetingResponseResult,
    MoveRequest, MoveResponse, SyncDiff, SyncKey, SyncOptions, SyncResponse, SyncStatus,
};
use easync_wbxml::WbxmlError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The outcome of one sync round-trip for one collection.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The adopted sync key.
    pub sync_key: SyncKey,
    /// Command status.
    pub status: SyncStatus,
    /// Item changes delivered by this round.
    pub diff: SyncDiff,
}

/// Attachment download strategies, tried in order until one yields
/// bytes. New server quirks become new list entries, not new code
/// paths.
const ATTACHMENT_STRATEGIES: &[AttachmentStrategy] = &[
    AttachmentStrategy::ItemOperations,
    AttachmentStrategy::GetAttachment,
];

#[derive(Debug, Clone, Copy)]
enum AttachmentStrategy {
    /// ItemOperations Fetch by AirSyncBase file reference (12.1+).
    ItemOperations,
    /// Legacy GetAttachment command; the reference rides in the query
    /// string and the response body is the raw attachment.
    GetAttachment,
}

/// The incremental sync engine for one account.
pub struct SyncEngine<C: HttpClient, S: StateStore> {
    session: Arc<Session<C, S>>,
    options: SyncOptions,
}

impl<C: HttpClient, S: StateStore> SyncEngine<C, S> {
    /// Creates a sync engine over a session.
    pub fn new(session: Arc<Session<C, S>>) -> Self {
        Self {
            session,
            options: SyncOptions::default(),
        }
    }

    /// Sets the sync options.
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying session.
    pub fn session(&self) -> &Arc<Session<C, S>> {
        &self.session
    }

    /// Synchronizes the folder hierarchy and applies the diff to the
    /// stored folder list.
    pub async fn folder_sync(&self) -> EasResult<FolderSyncResponse> {
        let store = self.session.store();
        let key = store.folder_sync_key()?;
        let response = self
            .session
            .execute(Command::FolderSync, &folder_sync_request(&key))
            .await?
            .ok_or_else(|| {
                EasError::Decode(WbxmlError::invalid_structure("empty folder sync response"))
            })?;
        let parsed = parse_folder_sync(&response)?;

        match parsed.status {
            FolderSyncStatus::Success => {
                let new_key = parsed.sync_key.clone().ok_or_else(|| {
                    EasError::Decode(WbxmlError::invalid_structure(
                        "folder sync response missing SyncKey",
                    ))
                })?;

                let mut folders = store.folders()?;
                apply_folder_diff(&mut folders, &parsed);
                store.set_folders(&folders)?;
                store.set_folder_sync_key(&new_key)?;
                info!(
                    added = parsed.added.len(),
                    updated = parsed.updated.len(),
                    deleted = parsed.deleted.len(),
                    "folder hierarchy synchronized"
                );
                Ok(parsed)
            }
            FolderSyncStatus::InvalidSyncKey => {
                warn!("folder sync key invalidated by server, resetting hierarchy state");
                store.set_folder_sync_key(easync_protocol::FOLDER_SYNC_KEY_INITIAL)?;
                Err(status_error(Command::FolderSync, parsed.status.code(), parsed.status.description()))
            }
            status => Err(status_error(Command::FolderSync, status.code(), status.description())),
        }
    }

    /// Runs one sync round-trip for a collection.
    ///
    /// With the initial cursor this is a pure bootstrap: the request
    /// carries no change tracking and the outcome never delivers item
    /// data, only a usable key. An empty response body on a
    /// non-initial sync means "no changes" (idle-timeout behavior of
    /// some server versions), not an error.
    pub async fn sync_collection(&self, collection_id: &str) -> EasResult<SyncOutcome> {
        let store = self.session.store();
        let cursor = store.sync_key(collection_id)?;

        if cursor.is_initial() {
            self.session.ensure_provisioned().await?;
        }

        let class = self.collection_class(collection_id)?;
        let request = sync_request(collection_id, &cursor, class, &self.options);
        let response = self.session.execute(Command::Sync, &request).await?;

        let Some(document) = response else {
            if cursor.is_initial() {
                return Err(EasError::Decode(WbxmlError::invalid_structure(
                    "empty response to initial sync",
                )));
            }
            debug!(collection_id, "empty sync response, treating as no changes");
            return Ok(SyncOutcome {
                sync_key: cursor,
                status: SyncStatus::Success,
                diff: SyncDiff::default(),
            });
        };

        let parsed = parse_sync(&document)?;
        self.adopt(collection_id, &cursor, parsed)
    }

    /// Synchronizes a collection to completion, draining
    /// `MoreAvailable` rounds into one merged diff.
    ///
    /// A bootstrap round (initial cursor) yields a fresh cursor but no
    /// data, so it is always followed by at least one more round.
    pub async fn sync_collection_complete(&self, collection_id: &str) -> EasResult<SyncDiff> {
        let store = self.session.store();
        let mut merged = SyncDiff::default();
        loop {
            let was_initial = store.sync_key(collection_id)?.is_initial();
            let outcome = self.sync_collection(collection_id).await?;
            let more = outcome.diff.more_available;
            merge_diff(&mut merged, outcome.diff);
            if more || was_initial {
                continue;
            }
            merged.more_available = false;
            return Ok(merged);
        }
    }

    /// Downloads an attachment by its file reference, trying each
    /// strategy in [`ATTACHMENT_STRATEGIES`] until one yields bytes.
    pub async fn fetch_attachment(&self, file_reference: &str) -> EasResult<Vec<u8>> {
        let mut last_error = None;
        for strategy in ATTACHMENT_STRATEGIES {
            match self.try_fetch(*strategy, file_reference).await {
                Ok(bytes) => return Ok(bytes),
                Err(error @ (EasError::Transport { .. } | EasError::Authorization { .. })) => {
                    return Err(error);
                }
                Err(error) => {
                    debug!(?strategy, %error, "attachment strategy failed, trying next");
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            EasError::Decode(WbxmlError::invalid_structure("no attachment strategies"))
        }))
    }

    async fn try_fetch(
        &self,
        strategy: AttachmentStrategy,
        file_reference: &str,
    ) -> EasResult<Vec<u8>> {
        let timeouts = &self.session.config().timeouts;
        match strategy {
            AttachmentStrategy::ItemOperations => {
                let options = ExecuteOptions {
                    timeout: Some(timeouts.attachment),
                    ..ExecuteOptions::default()
                };
                let document = self
                    .session
                    .execute_with(
                        Command::ItemOperations,
                        &fetch_attachment_request(file_reference),
                        &options,
                    )
                    .await?
                    .ok_or_else(|| {
                        EasError::Decode(WbxmlError::invalid_structure("empty fetch response"))
                    })?;
                let fetch = parse_fetch(&document)?;
                if !fetch.status.is_success() {
                    return Err(status_error(
                        Command::ItemOperations,
                        fetch.status.code(),
                        fetch.status.description(),
                    ));
                }
                fetch.data.ok_or_else(|| {
                    EasError::Decode(WbxmlError::invalid_structure("fetch response missing data"))
                })
            }
            AttachmentStrategy::GetAttachment => {
                let options = ExecuteOptions {
                    timeout: Some(timeouts.attachment),
                    extra_query: vec![("AttachmentName".to_string(), file_reference.to_string())],
                    ..ExecuteOptions::default()
                };
                let response = self
                    .session
                    .request(Command::GetAttachment, &[], &options)
                    .await?;
                if response.body.is_empty() {
                    return Err(EasError::Decode(WbxmlError::invalid_structure(
                        "empty attachment body",
                    )));
                }
                Ok(response.body)
            }
        }
    }

    /// Sends a message with the given MIME payload.
    ///
    /// MIME assembly is the caller's concern; this chooses the wire
    /// shape by negotiated version (WBXML-wrapped on 14.x, raw body on
    /// older servers).
    pub async fn send_mail(&self, mime: Vec<u8>, save_in_sent: bool) -> EasResult<()> {
        let version = self.session.detect_version().await;

        if version.has_compose_mail() {
            let client_id = format!(
                "{}-{}",
                self.session.device_id(),
                Utc::now().timestamp_millis()
            );
            let request = send_mail_request(&client_id, mime, save_in_sent);
            let response = self.session.execute(Command::SendMail, &request).await?;
            if let Some(document) = response {
                if let Some(code) = parse_send_mail_status(&document) {
                    if code != 1 {
                        return Err(status_error(Command::SendMail, code, "send rejected"));
                    }
                }
            }
            return Ok(());
        }

        let options = ExecuteOptions {
            content_type: Some("message/rfc822"),
            extra_query: vec![(
                "SaveInSent".to_string(),
                if save_in_sent { "T" } else { "F" }.to_string(),
            )],
            ..ExecuteOptions::default()
        };
        self.session
            .request(Command::SendMail, &mime, &options)
            .await?;
        Ok(())
    }

    /// Replies to a message server-side. The server merges the original
    /// body and attachments, so `mime` carries only the new content.
    pub async fn smart_reply(
        &self,
        folder_id: &str,
        item_id: &str,
        mime: Vec<u8>,
        save_in_sent: bool,
    ) -> EasResult<()> {
        self.smart_send(Command::SmartReply, folder_id, item_id, mime, save_in_sent)
            .await
    }

    /// Forwards a message server-side with the original attachments.
    pub async fn smart_forward(
        &self,
        folder_id: &str,
        item_id: &str,
        mime: Vec<u8>,
        save_in_sent: bool,
    ) -> EasResult<()> {
        self.smart_send(Command::SmartForward, folder_id, item_id, mime, save_in_sent)
            .await
    }

    async fn smart_send(
        &self,
        command: Command,
        folder_id: &str,
        item_id: &str,
        mime: Vec<u8>,
        save_in_sent: bool,
    ) -> EasResult<()> {
        let version = self.session.detect_version().await;

        if version.has_compose_mail() {
            let client_id = format!(
                "{}-{}",
                self.session.device_id(),
                Utc::now().timestamp_millis()
            );
            let request = match command {
                Command::SmartForward => {
                    smart_forward_request(&client_id, folder_id, item_id, mime, save_in_sent)
                }
                _ => smart_reply_request(&client_id, folder_id, item_id, mime, save_in_sent),
            };
            let response = self.session.execute(command, &request).await?;
            if let Some(document) = response {
                if let Some(code) = parse_send_mail_status(&document) {
                    if code != 1 {
                        return Err(status_error(command, code, "send rejected"));
                    }
                }
            }
            return Ok(());
        }

        // Pre-14 servers take the raw MIME and name the source message
        // in the query string.
        let options = ExecuteOptions {
            content_type: Some("message/rfc822"),
            extra_query: vec![
                ("ItemId".to_string(), item_id.to_string()),
                ("CollectionId".to_string(), folder_id.to_string()),
                (
                    "SaveInSent".to_string(),
                    if save_in_sent { "T" } else { "F" }.to_string(),
                ),
            ],
            ..ExecuteOptions::default()
        };
        self.session.request(command, &mime, &options).await?;
        Ok(())
    }

    /// Asks the server how many changes a sync of the collection would
    /// deliver. Advisory; the stored cursor is not consumed.
    pub async fn estimate_changes(&self, collection_id: &str) -> EasResult<u32> {
        let store = self.session.store();
        let cursor = store.sync_key(collection_id)?;
        let class = self.collection_class(collection_id)?;
        let document = self
            .session
            .execute(
                Command::GetItemEstimate,
                &item_estimate_request(collection_id, &cursor, class),
            )
            .await?
            .ok_or_else(|| {
                EasError::Decode(WbxmlError::invalid_structure("empty item estimate response"))
            })?;
        let parsed = parse_item_estimate(&document)?;
        if !parsed.status.is_success() {
            return Err(status_error(
                Command::GetItemEstimate,
                parsed.status.code(),
                parsed.status.description(),
            ));
        }
        Ok(parsed.estimate.unwrap_or(0))
    }

    /// Moves items between folders.
    pub async fn move_items(&self, moves: &[MoveRequest]) -> EasResult<Vec<MoveResponse>> {
        let document = self
            .session
            .execute(Command::MoveItems, &move_items_request(moves))
            .await?
            .ok_or_else(|| {
                EasError::Decode(WbxmlError::invalid_structure("empty move items response"))
            })?;
        Ok(parse_move_items(&document)?)
    }

    /// Answers a meeting request over ActiveSync (14.0 and later;
    /// older servers go through the EWS bridge instead).
    pub async fn meeting_response(
        &self,
        collection_id: &str,
        request_id: &str,
        answer: MeetingAnswer,
    ) -> EasResult<MeetingResponseResult> {
        let version = self.session.detect_version().await;
        if !version.has_meeting_response() {
            return Err(status_error(
                Command::MeetingResponse,
                0,
                "not supported before protocol 14.0; use the EWS bridge",
            ));
        }

        let request = meeting_response_request(collection_id, request_id, answer);
        let document = self
            .session
            .execute(Command::MeetingResponse, &request)
            .await?
            .ok_or_else(|| {
                EasError::Decode(WbxmlError::invalid_structure(
                    "empty meeting response response",
                ))
            })?;
        let result = parse_meeting_response(&document)?;
        if !result.status.is_success() {
            return Err(status_error(
                Command::MeetingResponse,
                result.status.code(),
                result.status.description(),
            ));
        }
        Ok(result)
    }

    fn adopt(
        &self,
        collection_id: &str,
        cursor: &SyncKey,
        parsed: SyncResponse,
    ) -> EasResult<SyncOutcome> {
        let store = self.session.store();
        match parsed.status {
            SyncStatus::Success => {
                let new_key = parsed.sync_key.ok_or_else(|| {
                    EasError::Decode(WbxmlError::invalid_structure(
                        "sync response missing SyncKey",
                    ))
                })?;
                store.set_sync_key(collection_id, &new_key)?;

                let mut diff = parsed.diff;
                if cursor.is_initial() {
                    // A zero-cursor exchange only establishes the
                    // cursor; item data is deferred to the next round.
                    diff.added.clear();
                    diff.changed.clear();
                    diff.deleted.clear();
                    diff.soft_deleted.clear();
                }

                Ok(SyncOutcome {
                    sync_key: new_key,
                    status: SyncStatus::Success,
                    diff,
                })
            }
            SyncStatus::InvalidSyncKey => {
                warn!(collection_id, "sync key invalidated by server, resetting cursor");
                store.set_sync_key(collection_id, &SyncKey::initial())?;
                Err(status_error(
                    Command::Sync,
                    parsed.status.code(),
                    parsed.status.description(),
                ))
            }
            status => Err(status_error(Command::Sync, status.code(), status.description())),
        }
    }

    fn collection_class(&self, collection_id: &str) -> EasResult<CollectionClass> {
        let folders = self.session.store().folders()?;
        Ok(folders
            .iter()
            .find(|f| f.server_id == collection_id)
            .map(Folder::class)
            .unwrap_or(CollectionClass::Email))
    }
}

fn apply_folder_diff(folders: &mut Vec<Folder>, diff: &FolderSyncResponse) {
    for deleted in &diff.deleted {
        folders.retain(|f| &f.server_id != deleted);
    }
    for updated in &diff.updated {
        match folders.iter_mut().find(|f| f.server_id == updated.server_id) {
            Some(existing) => *existing = updated.clone(),
            None => folders.push(updated.clone()),
        }
    }
    for added in &diff.added {
        if !folders.iter().any(|f| f.server_id == added.server_id) {
            folders.push(added.clone());
        }
    }
}

fn merge_diff(into: &mut SyncDiff, from: SyncDiff) {
    into.added.extend(from.added);
    into.changed.extend(from.changed);
    into.deleted.extend(from.deleted);
    into.soft_deleted.extend(from.soft_deleted);
    into.more_available = from.more_available;
}

fn status_error(command: Command, code: u8, description: &str) -> EasError {
    EasError::protocol(command.name(), code, description)
}
