//! Generic encrypt-to-self (ETS) mode, parameterized over a compression-function
//! driver via [`CompressionFunction`]. This module implements the shared block-layout
//! algorithm once; family-specific key/tag-length validation and wiring live in
//! [`crate::sha256ets`], [`crate::sha512ets`], and [`crate::blake2bets`].
//!
//! Encrypt-to-self is a *one-time* mode: a key must never be reused across two
//! calls to `enc`. Nothing in this module tracks or enforces that; it's a
//! protocol invariant the caller owns.

use crate::xor::{xor2, xor3};
use std::fmt;

/// Largest block size among the supported compression functions (BLAKE2b/SHA-512).
pub const MAX_BLOCK_LEN: usize = 128;
/// Largest state size among the supported compression functions (BLAKE2b/SHA-512).
pub const MAX_STATE_LEN: usize = 64;

/// `0x80` terminates the associated-data stream when it runs out mid-block.
const AD_FINALIZER: u8 = 0x80;
/// Domain-separation tweak XORed into the tag when the AD stream needed the
/// finalizer above, rather than filling the first block exactly.
const TAG_TWEAK: u8 = 0xa5;
/// The final message block's padded data region is rounded up to a multiple
/// of this (the "memory-alignment value" of the reference implementation).
const MAV: usize = 16;

/// A raw, unpadded compression-function driver, exposed the way the mode needs it:
/// one block absorbed per call, no Merkle-Damgard length framing.
pub trait CompressionFunction {
    const BLOCK_LEN: usize;
    const STATE_LEN: usize;
    type State: Copy;

    /// `klen`/`taglen` matter only to BLAKE2b, which folds them into its IV;
    /// the SHA-256/SHA-512 adapters ignore both.
    fn init(klen: usize, taglen: usize) -> Self::State;

    /// Absorbs one `BLOCK_LEN`-byte block. `counter` is a monotonic block
    /// index, not a byte count. `final_block` is a domain-separation marker
    /// within the cascade, not a true "last call ever" signal: further blocks
    /// may follow a call made with `final_block = true`.
    fn update(state: &mut Self::State, block: &[u8], counter: u64, final_block: bool);

    /// Writes `Self::STATE_LEN` bytes of serialized chaining state into `out`.
    fn export(state: &Self::State, out: &mut [u8]);
}

/// Errors returned by the per-family `enc`/`dec`/`dec_strict` entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtsError {
    /// `klen` is outside the set this instantiation allows.
    InvalidKeyLength,
    /// `taglen` is outside `[10, C]` for this instantiation.
    InvalidTagLength,
    /// The plaintext and ciphertext slices passed to `enc`/`dec` differ in length.
    LengthMismatch,
    /// Tag verification failed. Only ever returned by `dec_strict`; `dec`
    /// reports this case as `Ok(false)` instead.
    InvalidTag,
}

impl fmt::Display for EtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            EtsError::InvalidKeyLength => "key length not supported by this instantiation",
            EtsError::InvalidTagLength => "tag length out of range for this instantiation",
            EtsError::LengthMismatch => "plaintext and ciphertext lengths differ",
            EtsError::InvalidTag => "authentication failed",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for EtsError {}

fn round_up_mav(n: usize) -> usize {
    (n + MAV - 1) / MAV * MAV
}

/// Copies AD into `ctx` (`ctx.len()` bytes of context). If AD runs out first,
/// appends the `0x80` finalizer, zero-fills the remainder, and marks `ad_padded`.
fn load_ad(ctx: &mut [u8], ad: &mut &[u8], ad_padded: &mut bool) {
    let l = ctx.len();
    if ad.len() >= l {
        ctx.copy_from_slice(&ad[..l]);
        *ad = &ad[l..];
    } else {
        let n = ad.len();
        ctx[..n].copy_from_slice(ad);
        ctx[n] = AD_FINALIZER;
        for b in &mut ctx[n + 1..] {
            *b = 0;
        }
        *ad = &[];
        *ad_padded = true;
    }
}

/// Rebuilds the context (non-data) half of `block`, `ctx_len` bytes wide, from
/// whatever AD remains (or, once AD is exhausted, from nothing), then XORs in
/// the zero-padded key.
fn rebuild_context(
    block: &mut [u8],
    ctx_len: usize,
    k: &[u8],
    ad: &mut &[u8],
    ad_padded: &mut bool,
) {
    if !*ad_padded {
        load_ad(&mut block[..ctx_len], ad, ad_padded);
    } else {
        for b in &mut block[..ctx_len] {
            *b = 0;
        }
    }
    xor2(&mut block[..k.len()], k);
}

/// Encrypts `m` into `c` under `k`, authenticating `ad` alongside it, and
/// writes `tag.len()` bytes of authenticator into `tag`. The caller's
/// family-specific wrapper is responsible for validating `k.len()` and
/// `tag.len()` before calling this; this function only checks `m.len() ==
/// c.len()`.
pub fn generic_enc<CF: CompressionFunction>(
    k: &[u8],
    ad: &[u8],
    m: &[u8],
    c: &mut [u8],
    tag: &mut [u8],
) -> Result<(), EtsError> {
    if m.len() != c.len() {
        return Err(EtsError::LengthMismatch);
    }
    let d = CF::BLOCK_LEN;
    let cl = CF::STATE_LEN;
    let taglen = tag.len();

    let mut block = [0u8; MAX_BLOCK_LEN];
    let mut buf = [0u8; MAX_STATE_LEN];
    let mut ad = ad;
    let mut m = m;
    let mut c = c;
    let mut mlen = m.len();
    let mut ad_padded = false;
    // The reference implementation marks the message stream padded up front
    // when there is no message at all, before any block is even built; this
    // matters for which `final_block` flag the last absorb carries.
    let mut m_padded = mlen == 0;
    let mut t: u64 = 0;

    rebuild_context(&mut block[..d], d, k, &mut ad, &mut ad_padded);
    let mut st = CF::init(k.len(), taglen);

    while mlen >= cl {
        CF::update(&mut st, &block[..d], t, false);
        t += 1;
        rebuild_context(&mut block[..d], d - cl, k, &mut ad, &mut ad_padded);
        CF::export(&st, &mut buf[..cl]);
        let (c_head, c_tail) = c.split_at_mut(cl);
        xor3(c_head, &m[..cl], &buf[..cl]);
        block[d - cl..d].copy_from_slice(&m[..cl]);
        c = c_tail;
        m = &m[cl..];
        mlen -= cl;
    }

    if mlen > 0 {
        CF::update(&mut st, &block[..d], t, false);
        t += 1;
        let mlen_rup = round_up_mav(mlen + 1).min(cl);
        rebuild_context(&mut block[..d], d - mlen_rup, k, &mut ad, &mut ad_padded);
        CF::export(&st, &mut buf[..cl]);
        xor3(&mut c[..mlen], &m[..mlen], &buf[..mlen]);
        let data = &mut block[d - mlen_rup..d];
        data[..mlen].copy_from_slice(m);
        for b in &mut data[mlen..mlen_rup - 1] {
            *b = 0;
        }
        data[mlen_rup - 1] = mlen as u8;
        m_padded = true;
    }

    // Only an unexhausted AD stream needs its own finalizer block. If AD
    // happened to drain to exactly zero bytes with no remainder (every
    // `load_ad` call along the way consumed a full context region), the
    // reference leaves `ad_padded` false and skips this branch entirely
    // rather than spending an extra compression call on a finalizer-only
    // block; the mode's own "no writes beyond what's needed" invariant
    // carries through the cascade unchanged either way.
    if !ad_padded && !ad.is_empty() {
        CF::update(&mut st, &block[..d], t, true);
        t += 1;
        while ad.len() > d {
            CF::update(&mut st, &ad[..d], t, false);
            t += 1;
            ad = &ad[d..];
        }
        load_ad(&mut block[..d], &mut ad, &mut ad_padded);
    }

    CF::update(&mut st, &block[..d], t, m_padded);

    CF::export(&st, &mut buf[..cl]);
    if ad_padded {
        for b in &mut buf[..taglen] {
            *b ^= TAG_TWEAK;
        }
    }
    tag.copy_from_slice(&buf[..taglen]);
    Ok(())
}

/// Decrypts `c` into `m` under `k`, checking `ad` and `tag.len()` bytes of
/// authenticator. Always writes the recovered plaintext into `m`, even on
/// authentication failure; the caller must not trust `m` unless this returns
/// `Ok(true)`. The family-specific wrapper validates `k.len()` and
/// `tag.len()` before calling this.
pub fn generic_dec<CF: CompressionFunction>(
    k: &[u8],
    ad: &[u8],
    c: &[u8],
    tag: &[u8],
    m: &mut [u8],
) -> Result<bool, EtsError> {
    if c.len() != m.len() {
        return Err(EtsError::LengthMismatch);
    }
    let d = CF::BLOCK_LEN;
    let cl = CF::STATE_LEN;
    let taglen = tag.len();

    let mut block = [0u8; MAX_BLOCK_LEN];
    let mut buf = [0u8; MAX_STATE_LEN];
    let mut ad = ad;
    let mut c = c;
    let mut m = m;
    let mut clen = c.len();
    let mut ad_padded = false;
    let mut m_padded = clen == 0;
    let mut t: u64 = 0;

    rebuild_context(&mut block[..d], d, k, &mut ad, &mut ad_padded);
    let mut st = CF::init(k.len(), taglen);

    while clen >= cl {
        CF::update(&mut st, &block[..d], t, false);
        t += 1;
        rebuild_context(&mut block[..d], d - cl, k, &mut ad, &mut ad_padded);
        CF::export(&st, &mut buf[..cl]);
        let (m_head, m_tail) = m.split_at_mut(cl);
        xor3(m_head, &c[..cl], &buf[..cl]);
        block[d - cl..d].copy_from_slice(m_head);
        m = m_tail;
        c = &c[cl..];
        clen -= cl;
    }

    if clen > 0 {
        CF::update(&mut st, &block[..d], t, false);
        t += 1;
        let mlen_rup = round_up_mav(clen + 1).min(cl);
        rebuild_context(&mut block[..d], d - mlen_rup, k, &mut ad, &mut ad_padded);
        CF::export(&st, &mut buf[..cl]);
        xor3(&mut m[..clen], &c[..clen], &buf[..clen]);
        let data = &mut block[d - mlen_rup..d];
        data[..clen].copy_from_slice(&m[..clen]);
        for b in &mut data[clen..mlen_rup - 1] {
            *b = 0;
        }
        data[mlen_rup - 1] = clen as u8;
        m_padded = true;
    }

    // Only an unexhausted AD stream needs its own finalizer block. If AD
    // happened to drain to exactly zero bytes with no remainder (every
    // `load_ad` call along the way consumed a full context region), the
    // reference leaves `ad_padded` false and skips this branch entirely
    // rather than spending an extra compression call on a finalizer-only
    // block; the mode's own "no writes beyond what's needed" invariant
    // carries through the cascade unchanged either way.
    if !ad_padded && !ad.is_empty() {
        CF::update(&mut st, &block[..d], t, true);
        t += 1;
        while ad.len() > d {
            CF::update(&mut st, &ad[..d], t, false);
            t += 1;
            ad = &ad[d..];
        }
        load_ad(&mut block[..d], &mut ad, &mut ad_padded);
    }

    CF::update(&mut st, &block[..d], t, m_padded);

    CF::export(&st, &mut buf[..cl]);
    if ad_padded {
        for b in &mut buf[..taglen] {
            *b ^= TAG_TWEAK;
        }
    }

    Ok(constant_time_eq::constant_time_eq(&buf[..taglen], tag))
}

/// Thin wrapper over [`generic_dec`] for callers that want a hard error
/// instead of a validity flag on tag mismatch.
pub fn generic_dec_strict<CF: CompressionFunction>(
    k: &[u8],
    ad: &[u8],
    c: &[u8],
    tag: &[u8],
    m: &mut [u8],
) -> Result<(), EtsError> {
    if generic_dec::<CF>(k, ad, c, tag, m)? {
        Ok(())
    } else {
        Err(EtsError::InvalidTag)
    }
}
