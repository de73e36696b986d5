//! SHA-256-instantiated encrypt-to-self: block size `D = 64`, state size `C = 32`.

use crate::ets::{self, CompressionFunction, EtsError};
use crate::sha256;
use arrayref::array_ref;

const ALLOWED_KEY_LENS: [usize; 3] = [16, 24, 32];
const MIN_TAG_LEN: usize = 10;
const MAX_TAG_LEN: usize = sha256::STATE_LEN;

struct Sha256Cf;

impl CompressionFunction for Sha256Cf {
    const BLOCK_LEN: usize = sha256::BLOCK_LEN;
    const STATE_LEN: usize = sha256::STATE_LEN;
    type State = sha256::State;

    fn init(_klen: usize, _taglen: usize) -> Self::State {
        sha256::init()
    }

    fn update(state: &mut Self::State, block: &[u8], _counter: u64, final_block: bool) {
        // The tweak has to land on the chaining value fed into this block's
        // compression, not on its output: SHA-256 has no internal slot like
        // BLAKE2b's `v[14]` to perturb mid-round, so `flip` stands in for it
        // by perturbing the Davies-Meyer input instead.
        if final_block {
            sha256::flip(state);
        }
        sha256::update(state, array_ref!(block, 0, sha256::BLOCK_LEN));
    }

    fn export(state: &Self::State, out: &mut [u8]) {
        let mut digest = [0u8; sha256::STATE_LEN];
        sha256::export(state, &mut digest);
        out[..sha256::STATE_LEN].copy_from_slice(&digest);
    }
}

fn check_params(klen: usize, taglen: usize, mlen: usize, clen: usize) -> Result<(), EtsError> {
    if !ALLOWED_KEY_LENS.contains(&klen) {
        return Err(EtsError::InvalidKeyLength);
    }
    if !(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&taglen) {
        return Err(EtsError::InvalidTagLength);
    }
    if mlen != clen {
        return Err(EtsError::LengthMismatch);
    }
    Ok(())
}

/// Encrypts `m` into `c` under `k`, authenticating `ad`, writing `tag.len()`
/// bytes of authenticator. `k.len()` must be 16, 24, or 32; `tag.len()` must
/// be in `[10, 32]`.
pub fn enc(k: &[u8], ad: &[u8], m: &[u8], c: &mut [u8], tag: &mut [u8]) -> Result<(), EtsError> {
    check_params(k.len(), tag.len(), m.len(), c.len())?;
    ets::generic_enc::<Sha256Cf>(k, ad, m, c, tag)
}

/// Decrypts `c` into `m` under `k`, checking `ad` and `tag`. Always writes
/// `m`; the caller must not trust it unless this returns `Ok(true)`.
pub fn dec(k: &[u8], ad: &[u8], c: &[u8], tag: &[u8], m: &mut [u8]) -> Result<bool, EtsError> {
    check_params(k.len(), tag.len(), c.len(), m.len())?;
    ets::generic_dec::<Sha256Cf>(k, ad, c, tag, m)
}

/// Like [`dec`], but reports a mismatched tag as `Err(EtsError::InvalidTag)`
/// rather than `Ok(false)`.
pub fn dec_strict(k: &[u8], ad: &[u8], c: &[u8], tag: &[u8], m: &mut [u8]) -> Result<(), EtsError> {
    check_params(k.len(), tag.len(), c.len(), m.len())?;
    ets::generic_dec_strict::<Sha256Cf>(k, ad, c, tag, m)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_byte_sum() {
        let key: Vec<u8> = (0u8..16).collect();
        let ad: Vec<u8> = vec![40, 41, 42, 43, 44];
        let m: Vec<u8> = (80u8..93).collect();
        let mut c = vec![0u8; m.len()];
        let mut tag = vec![0u8; 11];
        enc(&key, &ad, &m, &mut c, &mut tag).unwrap();

        let sum: u32 = c.iter().chain(tag.iter()).map(|&b| b as u32).sum();
        assert_eq!(sum, 3184);

        let mut decrypted = vec![0u8; m.len()];
        let valid = dec(&key, &ad, &c, &tag, &mut decrypted).unwrap();
        assert!(valid);
        assert_eq!(decrypted, m);
        dec_strict(&key, &ad, &c, &tag, &mut decrypted).unwrap();
    }

    #[test]
    fn rejects_bad_key_length() {
        let key = vec![0u8; 17];
        let mut c = vec![0u8; 5];
        let mut tag = vec![0u8; 11];
        assert_eq!(
            enc(&key, &[], &[1, 2, 3, 4, 5], &mut c, &mut tag),
            Err(EtsError::InvalidKeyLength)
        );
    }

    #[test]
    fn rejects_bad_tag_length() {
        let key = vec![0u8; 16];
        let mut c = vec![0u8; 5];
        let mut tag = vec![0u8; 9];
        assert_eq!(
            enc(&key, &[], &[1, 2, 3, 4, 5], &mut c, &mut tag),
            Err(EtsError::InvalidTagLength)
        );
        let mut tag = vec![0u8; 33];
        assert_eq!(
            enc(&key, &[], &[1, 2, 3, 4, 5], &mut c, &mut tag),
            Err(EtsError::InvalidTagLength)
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let key = vec![0u8; 16];
        let mut c = vec![0u8; 4];
        let mut tag = vec![0u8; 11];
        assert_eq!(
            enc(&key, &[], &[1, 2, 3, 4, 5], &mut c, &mut tag),
            Err(EtsError::LengthMismatch)
        );
    }

    #[test]
    fn tag_bit_flip_is_rejected() {
        let key = vec![0u8; 16];
        let ad = vec![1, 2, 3];
        let m = vec![9, 9, 9, 9];
        let mut c = vec![0u8; m.len()];
        let mut tag = vec![0u8; 10];
        enc(&key, &ad, &m, &mut c, &mut tag).unwrap();

        tag[0] ^= 1;
        let mut out = vec![0u8; m.len()];
        assert_eq!(dec(&key, &ad, &c, &tag, &mut out).unwrap(), false);
        assert_eq!(
            dec_strict(&key, &ad, &c, &tag, &mut out),
            Err(EtsError::InvalidTag)
        );
    }
}
