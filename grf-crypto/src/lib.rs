//! Decryption support for GRF archive entries.
//!
//! GRF archives protect some entries with a stripped-down DES variant:
//! a single round between the initial and final permutations, applied
//! either to the first blocks of a payload ("header" scheme) or to a
//! cycle-driven selection of blocks ("mixed" scheme). This crate
//! implements:
//! - The single-block transform with the archive family's tables
//! - Header decryption (first 20 blocks at most)
//! - Mixed decryption with the block shuffle and byte substitution
//! - The nibble swap used on encrypted directory-table names

//! The `testkit` feature additionally exposes the packer-direction
//! transforms used by test fixture builders; the decryption direction
//! clears half of every ciphered block, so those are test support, not
//! an encryption API.

pub mod des;
pub mod mixed;

pub use des::{decrypt_block, decrypt_header, nibble_swap};
pub use mixed::decrypt_mixed;

#[cfg(feature = "testkit")]
pub use des::{encrypt_block, encrypt_header};
#[cfg(feature = "testkit")]
pub use mixed::encrypt_mixed;
