//! `ets` implements encrypt-to-self, a one-time authenticated encryption mode
//! built directly on a hash compression function rather than on a block
//! cipher. No nonce is required, because each key is meant to be used for at
//! most one encryption.
//!
//! The crate is organized bottom-up:
//!
//! - [`xor`] has the byte-XOR primitives the mode is built from.
//! - [`sha256`], [`sha512`], [`blake2b`] are raw compression-function
//!   drivers, exposed without Merkle-Damgard padding.
//! - [`ets`] has the generic encrypt-to-self mode, parameterized over any
//!   [`ets::CompressionFunction`].
//! - [`sha256ets`], [`sha512ets`], [`blake2bets`] wire the three drivers into
//!   the mode and validate each family's key/tag-length constraints.
//!
//! Encrypt-to-self is not general-purpose AEAD: a key must never be reused
//! across two encryptions, and there is no mechanism here to enforce that.

#![forbid(unsafe_code)]

pub mod blake2b;
pub mod blake2bets;
pub mod ets;
pub mod sha256;
pub mod sha256ets;
pub mod sha512;
pub mod sha512ets;
pub mod xor;

pub use ets::EtsError;
