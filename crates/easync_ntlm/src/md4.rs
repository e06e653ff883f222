//! MD4 message digest (RFC 1320).
//!
//! The NTLM password hash is MD4 over the UTF-16LE password, and no
//! maintained crate in this workspace's dependency tree provides the
//! primitive, so it is implemented here. The function must reproduce
//! the RFC 1320 reference digests exactly; see the tests below.

const A0: u32 = 0x6745_2301;
const B0: u32 = 0xefcd_ab89;
const C0: u32 = 0x98ba_dcfe;
const D0: u32 = 0x1032_5476;

/// Compute the MD4 digest of a byte slice.
pub fn digest(data: &[u8]) -> [u8; 16] {
    let mut state = [A0, B0, C0, D0];

    // Message padding: a single 0x80, zeros to 56 mod 64, then the
    // original bit length as a little-endian u64.
    let bit_len = (data.len() as u64).wrapping_mul(8);
    let mut message = data.to_vec();
    message.push(0x80);
    while message.len() % 64 != 56 {
        message.push(0x00);
    }
    message.extend_from_slice(&bit_len.to_le_bytes());

    for block in message.chunks_exact(64) {
        process_block(&mut state, block);
    }

    let mut out = [0u8; 16];
    for (i, word) in state.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    out
}

fn f(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}

fn g(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (x & z) | (y & z)
}

fn h(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}

fn process_block(state: &mut [u32; 4], block: &[u8]) {
    let mut x = [0u32; 16];
    for (i, word) in x.iter_mut().enumerate() {
        *word = u32::from_le_bytes([
            block[i * 4],
            block[i * 4 + 1],
            block[i * 4 + 2],
            block[i * 4 + 3],
        ]);
    }

    let [mut a, mut b, mut c, mut d] = *state;

    // Round 1.
    for &k in &[0, 4, 8, 12] {
        a = a.wrapping_add(f(b, c, d)).wrapping_add(x[k]).rotate_left(3);
        d = d
            .wrapping_add(f(a, b, c))
            .wrapping_add(x[k + 1])
            .rotate_left(7);
        c = c
            .wrapping_add(f(d, a, b))
            .wrapping_add(x[k + 2])
            .rotate_left(11);
        b = b
            .wrapping_add(f(c, d, a))
            .wrapping_add(x[k + 3])
            .rotate_left(19);
    }

    // Round 2.
    for k in 0..4 {
        a = a
            .wrapping_add(g(b, c, d))
            .wrapping_add(x[k])
            .wrapping_add(0x5a82_7999)
            .rotate_left(3);
        d = d
            .wrapping_add(g(a, b, c))
            .wrapping_add(x[k + 4])
            .wrapping_add(0x5a82_7999)
            .rotate_left(5);
        c = c
            .wrapping_add(g(d, a, b))
            .wrapping_add(x[k + 8])
            .wrapping_add(0x5a82_7999)
            .rotate_left(9);
        b = b
            .wrapping_add(g(c, d, a))
            .wrapping_add(x[k + 12])
            .wrapping_add(0x5a82_7999)
            .rotate_left(13);
    }

    // Round 3.
    for &k in &[0, 2, 1, 3] {
        a = a
            .wrapping_add(h(b, c, d))
            .wrapping_add(x[k])
            .wrapping_add(0x6ed9_eba1)
            .rotate_left(3);
        d = d
            .wrapping_add(h(a, b, c))
            .wrapping_add(x[k + 8])
            .wrapping_add(0x6ed9_eba1)
            .rotate_left(9);
        c = c
            .wrapping_add(h(d, a, b))
            .wrapping_add(x[k + 4])
            .wrapping_add(0x6ed9_eba1)
            .rotate_left(11);
        b = b
            .wrapping_add(h(c, d, a))
            .wrapping_add(x[k + 12])
            .wrapping_add(0x6ed9_eba1)
            .rotate_left(15);
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
}
