//! # easync NTLM
//!
//! NTLM challenge-response authentication for the legacy Exchange Web
//! Services bridge.
//!
//! This crate is a pure leaf: it performs no I/O and holds no state.
//! [`negotiate`] produces the Type 1 message, [`Challenge::parse`]
//! reads the server's Type 2, and [`authenticate`] computes the Type 3
//! answer with NTLMv2/LMv2 responses. The variant
//! [`authenticate_at`] takes the client challenge and timestamp as
//! arguments so the computation can be verified against the published
//! reference vectors.
//!
//! The MD4 primitive the NTLM password hash requires is implemented
//! from scratch in [`md4`]; HMAC-MD5 comes from the `hmac` and `md-5`
//! crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod hash;
pub mod md4;
mod message;

pub use error::{NtlmError, NtlmResult};
pub use hash::{filetime_from_unix, lmv2_response, ntlm_hash, ntlmv2_blob, ntlmv2_hash, ntlmv2_response};
pub use message::{authenticate, authenticate_at, negotiate, Challenge, Credentials};
