//! DES key hygiene and the legacy DES chaining modes

use super::Schedule;

/// DES block and key length.
pub(crate) const DES_BLOCK: usize = 8;

/// Weak and semi-weak DES keys, with odd parity.
const WEAK_KEYS: [[u8; 8]; 16] = [
    [0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01],
    [0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE],
    [0x1F, 0x1F, 0x1F, 0x1F, 0x0E, 0x0E, 0x0E, 0x0E],
    [0xE0, 0xE0, 0xE0, 0xE0, 0xF1, 0xF1, 0xF1, 0xF1],
    [0x01, 0xFE, 0x01, 0xFE, 0x01, 0xFE, 0x01, 0xFE],
    [0xFE, 0x01, 0xFE, 0x01, 0xFE, 0x01, 0xFE, 0x01],
    [0x1F, 0xE0, 0x1F, 0xE0, 0x0E, 0xF1, 0x0E, 0xF1],
    [0xE0, 0x1F, 0xE0, 0x1F, 0xF1, 0x0E, 0xF1, 0x0E],
    [0x01, 0xE0, 0x01, 0xE0, 0x01, 0xF1, 0x01, 0xF1],
    [0xE0, 0x01, 0xE0, 0x01, 0xF1, 0x01, 0xF1, 0x01],
    [0x1F, 0xFE, 0x1F, 0xFE, 0x0E, 0xFE, 0x0E, 0xFE],
    [0xFE, 0x1F, 0xFE, 0x1F, 0xFE, 0x0E, 0xFE, 0x0E],
    [0x01, 0x1F, 0x01, 0x1F, 0x01, 0x0E, 0x01, 0x0E],
    [0x1F, 0x01, 0x1F, 0x01, 0x0E, 0x01, 0x0E, 0x01],
    [0xE0, 0xFE, 0xE0, 0xFE, 0xF1, 0xFE, 0xF1, 0xFE],
    [0xFE, 0xE0, 0xFE, 0xE0, 0xFE, 0xF1, 0xFE, 0xF1],
];

/// Set the low bit of every byte so each byte has odd parity.
pub(crate) fn set_odd_parity(key: &mut [u8]) {
    for b in key {
        let high = *b & 0xFE;
        *b = high | u8::from(high.count_ones().is_multiple_of(2));
    }
}

/// Whether an 8-byte key (parity adjusted) is weak or semi-weak.
pub(crate) fn is_weak_key(key: &[u8]) -> bool {
    WEAK_KEYS.iter().any(|w| w.as_slice() == key)
}

/// Flip a weak key into a strong one by XORing the last byte with 0xF0.
pub(crate) fn fix_weak_key(key: &mut [u8]) {
    if is_weak_key(key) {
        key[7] ^= 0xF0;
    }
}

/// CBC-MAC of `data`, zero-padded to a whole block. Returns the last block.
pub(crate) fn cbc_cksum(schedule: &Schedule, data: &[u8], iv: [u8; 8]) -> [u8; 8] {
    let mut state = iv;
    for chunk in data.chunks(DES_BLOCK) {
        for (s, d) in state.iter_mut().zip(chunk) {
            *s ^= d;
        }
        schedule.encrypt_block(&mut state);
    }
    state
}

/// DES CFB64 in place. Works on any length.
pub(crate) fn cfb64(schedule: &Schedule, data: &mut [u8], iv: &mut [u8; 8], encrypt: bool) {
    for (n, b) in data.iter_mut().enumerate() {
        let idx = n % DES_BLOCK;
        if idx == 0 {
            schedule.encrypt_block(iv);
        }
        let c = if encrypt { *b ^ iv[idx] } else { *b };
        *b ^= iv[idx];
        iv[idx] = c;
    }
}

/// DES PCBC in place. `data` must be block aligned.
pub(crate) fn pcbc(schedule: &Schedule, data: &mut [u8], iv: &mut [u8; 8], encrypt: bool) {
    for block in data.chunks_exact_mut(DES_BLOCK) {
        let mut saved = [0u8; 8];
        saved.copy_from_slice(block);
        if encrypt {
            super::xor_in_place(block, iv);
            schedule.encrypt_block(block);
        } else {
            schedule.decrypt_block(block);
            super::xor_in_place(block, iv);
        }
        for i in 0..DES_BLOCK {
            iv[i] = saved[i] ^ block[i];
        }
    }
}

/// Expand 21 random bytes into a 24-byte triple-DES key.
///
/// Each 7-byte group becomes 8 bytes: the eighth byte collects the low bits
/// of the first seven, then parity is set and weak keys are fixed.
pub(crate) fn des3_random_to_key(input: &[u8; 21], out: &mut [u8; 24]) {
    for (src, dst) in input.chunks_exact(7).zip(out.chunks_exact_mut(8)) {
        let mut last = 0u8;
        for (j, &b) in src.iter().enumerate() {
            dst[j] = b;
            last |= (b & 1) << (j + 1);
        }
        dst[7] = last;
        set_odd_parity(dst);
        fix_weak_key(dst);
    }
}
