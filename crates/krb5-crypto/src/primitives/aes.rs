//! AES in CBC ciphertext-stealing mode (RFC 3962)

use super::{Schedule, xor_in_place};
use crate::error::{CryptoError, Result};

pub(crate) const AES_BLOCK: usize = 16;

/// AES-CTS in place.
///
/// A single-block message is plain ECB and leaves `iv` alone. Longer messages
/// are CBC with the last two ciphertext blocks swapped and the final one
/// truncated. Afterwards `iv` holds the last full ciphertext block, so a
/// following call continues the chain.
pub(crate) fn cts(
    schedule: &Schedule,
    data: &mut [u8],
    iv: &mut [u8; AES_BLOCK],
    encrypt: bool,
) -> Result<()> {
    let len = data.len();
    if len < AES_BLOCK {
        return Err(CryptoError::Internal { reason: "aes-cts input shorter than one block" });
    }
    if len == AES_BLOCK {
        if encrypt {
            schedule.encrypt_block(data);
        } else {
            schedule.decrypt_block(data);
        }
        return Ok(());
    }
    if encrypt { cts_encrypt(schedule, data, iv) } else { cts_decrypt(schedule, data, iv) }
    Ok(())
}

fn cts_encrypt(schedule: &Schedule, data: &mut [u8], iv: &mut [u8; AES_BLOCK]) {
    // Full blocks before the last (possibly partial) one, plain CBC.
    let tail = (data.len() - 1) % AES_BLOCK + 1;
    let head = data.len() - tail;
    for block in data[..head].chunks_exact_mut(AES_BLOCK) {
        xor_in_place(block, iv);
        schedule.encrypt_block(block);
        iv.copy_from_slice(block);
    }

    let mut last = *iv;
    xor_in_place(&mut last[..tail], &data[head..]);
    schedule.encrypt_block(&mut last);

    // C(n-1) truncated moves to the end, C(n) takes its place.
    let prev = head - AES_BLOCK;
    data.copy_within(prev..prev + tail, head);
    data[prev..head].copy_from_slice(&last);
    *iv = last;
}

fn cts_decrypt(schedule: &Schedule, data: &mut [u8], iv: &mut [u8; AES_BLOCK]) {
    let tail = (data.len() - 1) % AES_BLOCK + 1;
    let head = data.len() - tail;
    let prev = head - AES_BLOCK;

    let mut saved = [0u8; AES_BLOCK];
    for block in data[..prev].chunks_exact_mut(AES_BLOCK) {
        saved.copy_from_slice(block);
        schedule.decrypt_block(block);
        xor_in_place(block, iv);
        iv.copy_from_slice(&saved);
    }

    let mut cn = [0u8; AES_BLOCK];
    cn.copy_from_slice(&data[prev..head]);
    let mut dn = cn;
    schedule.decrypt_block(&mut dn);

    // Rebuild C(n-1): its truncated head is in the tail, the rest is in D(n).
    let mut cprev = dn;
    cprev[..tail].copy_from_slice(&data[head..]);

    for i in 0..tail {
        data[head + i] = dn[i] ^ cprev[i];
    }

    let mut pprev = cprev;
    schedule.decrypt_block(&mut pprev);
    xor_in_place(&mut pprev, iv);
    data[prev..head].copy_from_slice(&pprev);
    *iv = cn;
}
