//! Mixed-scheme payload decryption.
//!
//! Mixed-encrypted entries only cipher a subset of their 8-byte blocks:
//! the first 20 unconditionally, then every `cycle`-th block. Of the
//! blocks in between, every eighth skipped block is byte-shuffled with a
//! substitution on its last byte instead. Entries whose extension marks
//! them as data-crypted skip the cycle machinery entirely and behave
//! like header decryption over the whole payload.

use tracing::trace;

use crate::des::decrypt_block;

/// Decrypt a mixed-scheme payload in place.
///
/// `cycle` is the base-10 digit count of the entry's stored size and is
/// ignored when `data_crypted` is set (the caller passes 0 there).
/// Trailing bytes that do not fill a block are left untouched.
pub fn decrypt_mixed(buf: &mut [u8], cycle: u32, data_crypted: bool) {
    let cycle = if data_crypted {
        cycle
    } else {
        adjust_cycle(cycle)
    };

    trace!(
        len = buf.len(),
        cycle, data_crypted, "mixed decryption pass"
    );

    let mut skipped = 0u32;
    for (i, chunk) in buf.chunks_exact_mut(8).enumerate() {
        let block: &mut [u8; 8] = chunk.try_into().expect("chunks_exact yields 8 bytes");
        if i < 20 || (!data_crypted && i as u32 % cycle == 0) {
            decrypt_block(block);
        } else if !data_crypted && skipped == 7 {
            shuffle_block(block);
            skipped = 0;
        } else {
            skipped += 1;
        }
    }
}

/// Widen the digit-count cycle the way the archive family expects.
fn adjust_cycle(cycle: u32) -> u32 {
    if cycle < 3 {
        3
    } else if cycle < 5 {
        cycle + 1
    } else if cycle < 7 {
        cycle + 9
    } else {
        cycle + 15
    }
}

/// Reorder a skipped block and substitute its final byte.
fn shuffle_block(block: &mut [u8; 8]) {
    let src = *block;
    block[0] = src[3];
    block[1] = src[4];
    block[2] = src[6];
    block[3] = src[0];
    block[4] = src[1];
    block[5] = src[2];
    block[6] = src[5];
    block[7] = substitute(src[7]);
}

/// Packer-direction counterpart of [`decrypt_mixed`], for fixture
/// construction only: the same block selection, with the forward block
/// transform and the inverse shuffle in the corresponding branches.
/// Ciphered blocks only round-trip the bits the decryption preserves;
/// skipped and shuffled blocks round-trip exactly.
#[cfg(feature = "testkit")]
pub fn encrypt_mixed(buf: &mut [u8], cycle: u32, data_crypted: bool) {
    let cycle = if data_crypted {
        cycle
    } else {
        adjust_cycle(cycle)
    };

    let mut skipped = 0u32;
    for (i, chunk) in buf.chunks_exact_mut(8).enumerate() {
        let block: &mut [u8; 8] = chunk.try_into().expect("chunks_exact yields 8 bytes");
        if i < 20 || (!data_crypted && i as u32 % cycle == 0) {
            crate::des::encrypt_block(block);
        } else if !data_crypted && skipped == 7 {
            unshuffle_block(block);
            skipped = 0;
        } else {
            skipped += 1;
        }
    }
}

/// Inverse of [`shuffle_block`].
#[cfg(feature = "testkit")]
fn unshuffle_block(block: &mut [u8; 8]) {
    let src = *block;
    block[0] = src[3];
    block[1] = src[4];
    block[2] = src[5];
    block[3] = src[0];
    block[4] = src[1];
    block[5] = src[6];
    block[6] = src[2];
    block[7] = substitute(src[7]);
}

/// The pairwise byte substitution applied to byte 7 of shuffled blocks.
fn substitute(b: u8) -> u8 {
    match b {
        0x00 => 0x2b,
        0x2b => 0x00,
        0x01 => 0x68,
        0x68 => 0x01,
        0x48 => 0x77,
        0x77 => 0x48,
        0x60 => 0xff,
        0xff => 0x60,
        0x6c => 0x80,
        0x80 => 0x6c,
        0xb9 => 0xc0,
        0xc0 => 0xb9,
        0xeb => 0xfe,
        0xfe => 0xeb,
        other => other,
    }
}
