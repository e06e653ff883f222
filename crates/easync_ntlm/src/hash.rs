//! NTLMv2 hash and response computation.

use crate::md4;
use hmac::{Hmac, Mac};
use md5::Md5;

type HmacMd5 = Hmac<Md5>;

/// Offset between the Windows FILETIME epoch (1601-01-01) and the Unix
/// epoch, in seconds.
const FILETIME_UNIX_OFFSET_SECS: u64 = 11_644_473_600;

/// Encode a string as UTF-16LE bytes.
pub(crate) fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Convert Unix time to a Windows FILETIME (100 ns ticks since 1601).
pub fn filetime_from_unix(secs: u64, subsec_nanos: u32) -> u64 {
    (secs + FILETIME_UNIX_OFFSET_SECS) * 10_000_000 + u64::from(subsec_nanos) / 100
}

fn hmac_md5(key: &[u8], data: &[u8]) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// The NTLM password hash: MD4 over the UTF-16LE password.
pub fn ntlm_hash(password: &str) -> [u8; 16] {
    md4::digest(&utf16le(password))
}

/// The NTLMv2 hash: HMAC-MD5 of the uppercased user name concatenated
/// with the domain (UTF-16LE), keyed by the NTLM hash.
pub fn ntlmv2_hash(username: &str, password: &str, domain: &str) -> [u8; 16] {
    let identity = format!("{}{}", username.to_uppercase(), domain);
    hmac_md5(&ntlm_hash(password), &utf16le(&identity))
}

/// Build the NTLMv2 client blob hashed into the NTLMv2 response.
///
/// Layout: response versions, reserved zeros, FILETIME timestamp,
/// client challenge, reserved zeros, the server's target info, and a
/// trailing reserved field.
pub fn ntlmv2_blob(timestamp: u64, client_challenge: &[u8; 8], target_info: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(32 + target_info.len());
    blob.push(0x01); // Responserversion
    blob.push(0x01); // HiResponserversion
    blob.extend_from_slice(&[0u8; 6]);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0u8; 4]);
    blob
}

/// The NTLMv2 response: HMAC-MD5 over server challenge ++ blob, keyed
/// by the NTLMv2 hash, with the blob appended.
pub fn ntlmv2_response(v2_hash: &[u8; 16], server_challenge: &[u8; 8], blob: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + blob.len());
    data.extend_from_slice(server_challenge);
    data.extend_from_slice(blob);
    let proof = hmac_md5(v2_hash, &data);

    let mut response = Vec::with_capacity(16 + blob.len());
    response.extend_from_slice(&proof);
    response.extend_from_slice(blob);
    response
}

/// The LMv2 response: HMAC-MD5 over server challenge ++ client
/// challenge, keyed by the NTLMv2 hash, with the client challenge
/// appended.
pub fn lmv2_response(
    v2_hash: &[u8; 16],
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
) -> [u8; 24] {
    let mut data = [0u8; 16];
    data[..8].copy_from_slice(server_challenge);
    data[8..].copy_from_slice(client_challenge);
    let mac = hmac_md5(v2_hash, &data);

    let mut response = [0u8; 24];
    response[..16].copy_from_slice(&mac);
    response[16..].copy_from_slice(client_challenge);
    response
}
