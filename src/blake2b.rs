//! Raw BLAKE2b compression function (RFC 7693), without the streaming
//! finalization a general-purpose hash needs: the caller drives the block
//! counter and the final flag itself, one 128-byte block per [`update`].

use arrayref::array_refs;

pub const BLOCK_LEN: usize = 128;
pub const STATE_LEN: usize = 64;

pub type State = [u64; 8];
pub type Block = [u8; BLOCK_LEN];

const IV: State = [
    0x6A09E667F3BCC908,
    0xBB67AE8584CAA73B,
    0x3C6EF372FE94F82B,
    0xA54FF53A5F1D36F1,
    0x510E527FADE682D1,
    0x9B05688C2B3E6C1F,
    0x1F83D9ABFB41BD6B,
    0x5BE0CD19137E2179,
];

const SIGMA: [[u8; 16]; 12] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
];

#[inline(always)]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

#[inline(always)]
fn round(r: usize, m: &[u64; 16], v: &mut [u64; 16]) {
    let s = SIGMA[r];
    g(v, 0, 4, 8, 12, m[s[0] as usize], m[s[1] as usize]);
    g(v, 1, 5, 9, 13, m[s[2] as usize], m[s[3] as usize]);
    g(v, 2, 6, 10, 14, m[s[4] as usize], m[s[5] as usize]);
    g(v, 3, 7, 11, 15, m[s[6] as usize], m[s[7] as usize]);
    g(v, 0, 5, 10, 15, m[s[8] as usize], m[s[9] as usize]);
    g(v, 1, 6, 11, 12, m[s[10] as usize], m[s[11] as usize]);
    g(v, 2, 7, 8, 13, m[s[12] as usize], m[s[13] as usize]);
    g(v, 3, 4, 9, 14, m[s[14] as usize], m[s[15] as usize]);
}

/// Initializes chaining state for a keyed or unkeyed instance. `klen` is the
/// key length the caller will feed in (0 if unkeyed); `mdlen` is the intended
/// output/tag length. Both are folded into the IV per RFC 7693's parameter
/// block, word 0.
pub fn init(klen: usize, mdlen: usize) -> State {
    assert!(klen <= 64, "blake2b key too long");
    assert!((1..=64).contains(&mdlen), "blake2b digest length out of range");
    let mut st = IV;
    st[0] ^= 0x01010000 | ((klen as u64) << 8) | (mdlen as u64);
    st
}

pub fn export(st: &State, out: &mut [u8; STATE_LEN]) {
    let refs = array_refs!(out, 8, 8, 8, 8, 8, 8, 8, 8);
    *refs.0 = st[0].to_le_bytes();
    *refs.1 = st[1].to_le_bytes();
    *refs.2 = st[2].to_le_bytes();
    *refs.3 = st[3].to_le_bytes();
    *refs.4 = st[4].to_le_bytes();
    *refs.5 = st[5].to_le_bytes();
    *refs.6 = st[6].to_le_bytes();
    *refs.7 = st[7].to_le_bytes();
}

/// Absorbs one block. `t` is a monotonic block counter (not a byte count, as
/// in general-purpose BLAKE2b); `final_block` marks the cascade's last call.
pub fn update(st: &mut State, block: &Block, t: u64, final_block: bool) {
    let msg_refs = array_refs!(block, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8);
    let m = [
        u64::from_le_bytes(*msg_refs.0),
        u64::from_le_bytes(*msg_refs.1),
        u64::from_le_bytes(*msg_refs.2),
        u64::from_le_bytes(*msg_refs.3),
        u64::from_le_bytes(*msg_refs.4),
        u64::from_le_bytes(*msg_refs.5),
        u64::from_le_bytes(*msg_refs.6),
        u64::from_le_bytes(*msg_refs.7),
        u64::from_le_bytes(*msg_refs.8),
        u64::from_le_bytes(*msg_refs.9),
        u64::from_le_bytes(*msg_refs.10),
        u64::from_le_bytes(*msg_refs.11),
        u64::from_le_bytes(*msg_refs.12),
        u64::from_le_bytes(*msg_refs.13),
        u64::from_le_bytes(*msg_refs.14),
        u64::from_le_bytes(*msg_refs.15),
    ];

    let mut v = [
        st[0], st[1], st[2], st[3], st[4], st[5], st[6], st[7], IV[0], IV[1], IV[2], IV[3], IV[4],
        IV[5], IV[6], IV[7],
    ];
    v[12] ^= t;
    if final_block {
        v[14] ^= !0u64;
    }

    for r in 0..12 {
        round(r, &m, &mut v);
    }

    for i in 0..8 {
        st[i] ^= v[i] ^ v[8 + i];
    }
}
