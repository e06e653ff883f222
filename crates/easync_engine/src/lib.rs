//! # easync engine
//!
//! Exchange ActiveSync protocol/session engine.
//!
//! This crate provides:
//! - Per-account session management (device identity, version
//!   negotiation, command execution with automatic re-provisioning)
//! - The two-phase provisioning state machine
//! - The per-collection incremental sync engine
//! - The adaptive Direct-Push scheduler with periodic-poll fallback
//! - The legacy SOAP/EWS fallback bridge
//!
//! ## Architecture
//!
//! The [`Session`] is the choke point every ActiveSync request routes
//! through; the sync engine and provisioning are its callers, and the
//! push scheduler drives the sync engine. The EWS bridge bypasses the
//! session (different endpoint and authentication) but shares the NTLM
//! authenticator. Network access is abstracted behind [`HttpClient`],
//! durable state behind [`StateStore`]; production code plugs in
//! [`ReqwestClient`] and its own store, tests script exchanges with
//! [`MockHttpClient`] and [`MemoryStore`].
//!
//! ## Key invariants
//!
//! - A sync key is single-use and adopted only after its response is
//!   fully parsed; one collection never has two requests in flight
//! - A policy key is attached to commands only after provisioning
//!   phase 2 confirms it
//! - Version detection degrades to the oldest supported version, never
//!   to an error
//! - The push heartbeat stays within its configured bounds for every
//!   sequence of outcomes

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod ews;
#[cfg(feature = "reqwest-client")]
mod http;
mod provision;
mod push;
mod session;
mod store;
mod sync;
mod transport;

pub use config::{AccountConfig, Timeouts};
pub use error::{EasError, EasResult};
pub use ews::{EwsBridge, EwsItemId, EwsTask};
#[cfg(feature = "reqwest-client")]
pub use http::ReqwestClient;
pub use push::{start_push, PushConfig, PushEvent, PushHandle};
pub use session::{Session, WBXML_CONTENT_TYPE};
pub use store::{MemoryStore, StateStore};
pub use sync::{SyncEngine, SyncOutcome};
pub use transport::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MockHttpClient};
