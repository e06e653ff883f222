//! NTLM handshake messages.
//!
//! Message layouts follow MS-NLMP: a fixed header of little-endian
//! security buffers (length, allocated length, offset) followed by the
//! variable payloads. Only the NTLMv2 path is produced; the obsolete
//! LM/NTLMv1 responses are never emitted.

use crate::error::{NtlmError, NtlmResult};
use crate::hash::{
    filetime_from_unix, lmv2_response, ntlmv2_blob, ntlmv2_hash, ntlmv2_response, utf16le,
};
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, ZeroizeOnDrop};

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const NEGOTIATE_OEM: u32 = 0x0000_0002;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSIONSECURITY: u32 = 0x0008_0000;

/// Flags announced in the Type 1 message.
const TYPE1_FLAGS: u32 = NEGOTIATE_UNICODE
    | NEGOTIATE_OEM
    | REQUEST_TARGET
    | NEGOTIATE_NTLM
    | NEGOTIATE_ALWAYS_SIGN
    | NEGOTIATE_EXTENDED_SESSIONSECURITY;

/// Account credentials for the handshake.
///
/// Zeroized on drop so the password does not linger in freed memory.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Account name, without the domain.
    pub username: String,
    /// Account password.
    pub password: String,
    /// NT domain; empty when the account has none.
    pub domain: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: domain.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// Build a Type 1 (negotiate) message.
///
/// Announces the negotiation flags with empty domain and workstation
/// fields; servers answer with a Type 2 challenge.
pub fn negotiate() -> Vec<u8> {
    let mut msg = Vec::with_capacity(32);
    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&1u32.to_le_bytes());
    msg.extend_from_slice(&TYPE1_FLAGS.to_le_bytes());
    // Empty domain and workstation security buffers, both pointing just
    // past the fixed header.
    write_buffer_field(&mut msg, 0, 32);
    write_buffer_field(&mut msg, 0, 32);
    msg
}

/// A parsed Type 2 (challenge) message.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// The 8-byte server challenge.
    pub server_challenge: [u8; 8],
    /// Flags the server selected.
    pub flags: u32,
    /// The opaque target-info blob, echoed back inside the NTLMv2 blob.
    pub target_info: Vec<u8>,
}

impl Challenge {
    /// Parse a Type 2 message.
    pub fn parse(data: &[u8]) -> NtlmResult<Self> {
        if data.len() < 32 {
            return Err(NtlmError::Truncated {
                needed: 32,
                got: data.len(),
            });
        }
        if &data[..8] != SIGNATURE {
            return Err(NtlmError::BadSignature);
        }
        let msg_type = u32::from_le_bytes(data[8..12].try_into().expect("length checked"));
        if msg_type != 2 {
            return Err(NtlmError::WrongMessageType {
                expected: 2,
                found: msg_type,
            });
        }

        let flags = u32::from_le_bytes(data[20..24].try_into().expect("length checked"));
        let server_challenge: [u8; 8] = data[24..32].try_into().expect("length checked");

        // The target-info buffer exists only in the extended layout.
        let target_info = if data.len() >= 48 {
            read_buffer_field(data, 40)?
        } else {
            Vec::new()
        };

        Ok(Self {
            server_challenge,
            flags,
            target_info,
        })
    }
}

/// Build a Type 3 (authenticate) message with fresh entropy.
///
/// The client challenge comes from the system RNG and the timestamp
/// from the system clock; everything else is a pure function of the
/// challenge and credentials.
pub fn authenticate(challenge: &Challenge, credentials: &Credentials) -> Vec<u8> {
    let mut client_challenge = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut client_challenge);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let timestamp = filetime_from_unix(now.as_secs(), now.subsec_nanos());

    authenticate_at(challenge, credentials, client_challenge, timestamp)
}

/// Build a Type 3 message from explicit entropy.
///
/// Deterministic in all inputs; the reference-vector tests drive this
/// entry point with a fixed client challenge and timestamp.
pub fn authenticate_at(
    challenge: &Challenge,
    credentials: &Credentials,
    client_challenge: [u8; 8],
    timestamp: u64,
) -> Vec<u8> {
    let v2_hash = ntlmv2_hash(
        &credentials.username,
        &credentials.password,
        &credentials.domain,
    );
    let blob = ntlmv2_blob(timestamp, &client_challenge, &challenge.target_info);
    let nt_response = ntlmv2_response(&v2_hash, &challenge.server_challenge, &blob);
    let lm_response = lmv2_response(&v2_hash, &challenge.server_challenge, &client_challenge);

    let domain = utf16le(&credentials.domain);
    let user = utf16le(&credentials.username);
    let workstation: Vec<u8> = Vec::new();
    let session_key: Vec<u8> = Vec::new();

    // Fixed 88-byte header; payloads follow in header order.
    const HEADER_LEN: u32 = 88;
    let mut offset = HEADER_LEN;
    let mut msg = Vec::with_capacity(
        HEADER_LEN as usize + lm_response.len() + nt_response.len() + domain.len() + user.len(),
    );

    msg.extend_from_slice(SIGNATURE);
    msg.extend_from_slice(&3u32.to_le_bytes());
    for payload in [
        &lm_response[..],
        &nt_response[..],
        &domain[..],
        &user[..],
        &workstation[..],
        &session_key[..],
    ] {
        write_buffer_field(&mut msg, payload.len() as u16, offset);
        offset += payload.len() as u32;
    }
    msg.extend_from_slice(&challenge.flags.to_le_bytes());
    // Version field (unused) and MIC placeholder.
    msg.extend_from_slice(&[0u8; 8]);
    msg.extend_from_slice(&[0u8; 16]);

    debug_assert_eq!(msg.len(), HEADER_LEN as usize);

    msg.extend_from_slice(&lm_response);
    msg.extend_from_slice(&nt_response);
    msg.extend_from_slice(&domain);
    msg.extend_from_slice(&user);
    msg.extend_from_slice(&workstation);
    msg.extend_from_slice(&session_key);
    msg
}

fn write_buffer_field(msg: &mut Vec<u8>, len: u16, offset: u32) {
    msg.extend_from_slice(&len.to_le_bytes());
    msg.extend_from_slice(&len.to_le_bytes());
    msg.extend_from_slice(&offset.to_le_bytes());
}

fn read_buffer_field(data: &[u8], at: usize) -> NtlmResult<Vec<u8>> {
    let len = u16::from_le_bytes(data[at..at + 2].try_into().expect("length checked")) as usize;
    let offset =
        u32::from_le_bytes(data[at + 4..at + 8].try_into().expect("length checked")) as usize;
    data.get(offset..offset + len)
        .map(<[u8]>::to_vec)
        .ok_or(NtlmError::Truncated {
            needed: offset + len,
            got: data.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type2_message(target_info: &[u8]) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(SIGNATURE);
        msg.extend_from_slice(&2u32.to_le_bytes());
        write_buffer_field(&mut msg, 0, 48); // target name
        msg.extend_from_slice(&TYPE1_FLAGS.to_le_bytes());
        msg.extend_from_slice(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        msg.extend_from_slice(&[0u8; 8]); // context
        write_buffer_field(&mut msg, target_info.len() as u16, 48);
        msg.extend_from_slice(target_info);
        msg
    }

    #[test]
    fn type1_layout() {
        let msg = negotiate();
        assert_eq!(msg.len(), 32);
        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(u32::from_le_bytes(msg[8..12].try_into().unwrap()), 1);
        let flags = u32::from_le_bytes(msg[12..16].try_into().unwrap());
        assert_eq!(flags & NEGOTIATE_UNICODE, NEGOTIATE_UNICODE);
        assert_eq!(flags & NEGOTIATE_NTLM, NEGOTIATE_NTLM);
    }

    #[test]
    fn parse_challenge() {
        let info = vec![0x02, 0x00, 0x02, 0x00, 0x41, 0x00];
        let challenge = Challenge::parse(&type2_message(&info)).unwrap();
        assert_eq!(
            challenge.server_challenge,
            [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]
        );
        assert_eq!(challenge.target_info, info);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            Challenge::parse(b"short"),
            Err(NtlmError::Truncated { .. })
        ));
        let mut msg = type2_message(&[]);
        msg[0] = b'X';
        assert!(matches!(
            Challenge::parse(&msg),
            Err(NtlmError::BadSignature)
        ));
        let mut msg = type2_message(&[]);
        msg[8] = 3;
        assert!(matches!(
            Challenge::parse(&msg),
            Err(NtlmError::WrongMessageType {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn type3_layout() {
        let challenge = Challenge::parse(&type2_message(&[0u8; 4])).unwrap();
        let creds = Credentials::new("User", "Password", "Domain");
        let msg = authenticate_at(&challenge, &creds, [0xaa; 8], 0);

        assert_eq!(&msg[..8], SIGNATURE);
        assert_eq!(u32::from_le_bytes(msg[8..12].try_into().unwrap()), 3);

        // LM buffer: 24 bytes at offset 88.
        assert_eq!(u16::from_le_bytes(msg[12..14].try_into().unwrap()), 24);
        assert_eq!(u32::from_le_bytes(msg[16..20].try_into().unwrap()), 88);

        // NT buffer follows the LM response.
        let nt_len = u16::from_le_bytes(msg[20..22].try_into().unwrap()) as usize;
        let nt_offset = u32::from_le_bytes(msg[24..28].try_into().unwrap()) as usize;
        assert_eq!(nt_offset, 88 + 24);

        // Domain then user, UTF-16LE.
        let domain_offset = u32::from_le_bytes(msg[32..36].try_into().unwrap()) as usize;
        assert_eq!(domain_offset, nt_offset + nt_len);
        assert_eq!(
            &msg[domain_offset..domain_offset + 12],
            utf16le("Domain").as_slice()
        );

        let user_len = u16::from_le_bytes(msg[36..38].try_into().unwrap()) as usize;
        let user_offset = u32::from_le_bytes(msg[40..44].try_into().unwrap()) as usize;
        assert_eq!(&msg[user_offset..user_offset + user_len], utf16le("User"));

        // Total length accounts for every payload.
        assert_eq!(msg.len(), user_offset + user_len);
    }

    #[test]
    fn type3_carries_reference_responses() {
        // With stubbed entropy the embedded responses must match the
        // published NTLMv2 computation (see hash.rs vectors).
        let mut info = Vec::new();
        info.extend_from_slice(&2u16.to_le_bytes());
        info.extend_from_slice(&12u16.to_le_bytes());
        info.extend_from_slice(&utf16le("Domain"));
        info.extend_from_slice(&1u16.to_le_bytes());
        info.extend_from_slice(&12u16.to_le_bytes());
        info.extend_from_slice(&utf16le("Server"));
        info.extend_from_slice(&[0u8; 4]);

        let challenge = Challenge::parse(&type2_message(&info)).unwrap();
        let creds = Credentials::new("User", "Password", "Domain");
        let msg = authenticate_at(&challenge, &creds, [0xaa; 8], 0);

        // LMv2 at offset 88.
        assert_eq!(
            &msg[88..104],
            &[
                0x86, 0xc3, 0x50, 0x97, 0xac, 0x9c, 0xec, 0x10, 0x25, 0x54, 0x76, 0x4a, 0x57,
                0xcc, 0xcc, 0x19
            ]
        );
        // NTProofStr right after the 24-byte LMv2 response.
        assert_eq!(
            &msg[112..128],
            &[
                0x68, 0xcd, 0x0a, 0xb8, 0x51, 0xe5, 0x1c, 0x96, 0xaa, 0xbc, 0x92, 0x7b, 0xeb,
                0xef, 0x6a, 0x1c
            ]
        );
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("user", "hunter2", "CORP");
        let repr = format!("{creds:?}");
        assert!(!repr.contains("hunter2"));
        assert!(repr.contains("user"));
    }
}
