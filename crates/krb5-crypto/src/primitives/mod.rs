//! Block ciphers and the chaining modes built on them
//!
//! The cipher crates only provide single-block encryption. Kerberos needs a
//! handful of legacy chaining modes with specific IV handling, so the modes
//! live here as plain functions over a [`Schedule`].

pub(crate) mod aes;
pub(crate) mod crc32;
pub(crate) mod des;
pub(crate) mod rc4;

use std::fmt;

use ::aes::{Aes128, Aes256};
use ::des::{
    Des, TdesEde3,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};

use crate::{
    error::{CryptoError, Result},
    registry::Keytype,
};

/// Expanded key for one of the supported block ciphers.
///
/// The cipher crates zeroize their round keys on drop. Round keys live on
/// the heap; the AES-256 schedule alone is close to a kilobyte.
pub(crate) enum Schedule {
    Des(Box<Des>),
    Des3(Box<TdesEde3>),
    Aes128(Box<Aes128>),
    Aes256(Box<Aes256>),
}

impl Schedule {
    /// Expand `key` for `keytype`. Stream and null key types have no schedule.
    pub(crate) fn new(keytype: Keytype, key: &[u8]) -> Result<Self> {
        let bad = |_| CryptoError::BadKeySize { expected: keytype.size(), actual: key.len() };
        match keytype {
            Keytype::Des => Des::new_from_slice(key).map(|c| Self::Des(Box::new(c))).map_err(bad),
            Keytype::Des3 => {
                TdesEde3::new_from_slice(key).map(|c| Self::Des3(Box::new(c))).map_err(bad)
            },
            Keytype::Aes128 => {
                Aes128::new_from_slice(key).map(|c| Self::Aes128(Box::new(c))).map_err(bad)
            },
            Keytype::Aes256 => {
                Aes256::new_from_slice(key).map(|c| Self::Aes256(Box::new(c))).map_err(bad)
            },
            Keytype::Null | Keytype::Arcfour => {
                Err(CryptoError::Internal { reason: "key type has no block cipher" })
            },
        }
    }

    pub(crate) fn block_size(&self) -> usize {
        match self {
            Self::Des(_) | Self::Des3(_) => 8,
            Self::Aes128(_) | Self::Aes256(_) => 16,
        }
    }

    /// Encrypt one block in place. `block` must be exactly one block long.
    pub(crate) fn encrypt_block(&self, block: &mut [u8]) {
        match self {
            Self::Des(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Des3(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes128(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes256(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
        }
    }

    /// Decrypt one block in place. `block` must be exactly one block long.
    pub(crate) fn decrypt_block(&self, block: &mut [u8]) {
        match self {
            Self::Des(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Des3(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes128(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes256(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
        }
    }

    /// CBC encrypt in place. `iv` ends up holding the last ciphertext block.
    pub(crate) fn cbc_encrypt(&self, data: &mut [u8], iv: &mut [u8]) -> Result<()> {
        let bs = self.check_aligned(data, iv)?;
        for block in data.chunks_exact_mut(bs) {
            xor_in_place(block, iv);
            self.encrypt_block(block);
            iv.copy_from_slice(block);
        }
        Ok(())
    }

    /// CBC decrypt in place. `iv` ends up holding the last ciphertext block.
    pub(crate) fn cbc_decrypt(&self, data: &mut [u8], iv: &mut [u8]) -> Result<()> {
        let bs = self.check_aligned(data, iv)?;
        let mut saved = [0u8; 16];
        for block in data.chunks_exact_mut(bs) {
            saved[..bs].copy_from_slice(block);
            self.decrypt_block(block);
            xor_in_place(block, iv);
            iv.copy_from_slice(&saved[..bs]);
        }
        Ok(())
    }

    fn check_aligned(&self, data: &[u8], iv: &[u8]) -> Result<usize> {
        let bs = self.block_size();
        if iv.len() != bs {
            return Err(CryptoError::Internal { reason: "iv length differs from block size" });
        }
        if !data.len().is_multiple_of(bs) {
            return Err(CryptoError::Internal { reason: "cbc input not block aligned" });
        }
        Ok(bs)
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cipher = match self {
            Self::Des(_) => "des",
            Self::Des3(_) => "des3",
            Self::Aes128(_) => "aes128",
            Self::Aes256(_) => "aes256",
        };
        f.debug_struct("Schedule").field("cipher", &cipher).finish_non_exhaustive()
    }
}

pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbc_round_trip_updates_iv() {
        let s = Schedule::new(Keytype::Des3, &[0x5Au8; 24]).unwrap();
        let mut data = *b"sixteen byte msg";
        let mut iv = [0u8; 8];
        s.cbc_encrypt(&mut data, &mut iv).unwrap();
        assert_eq!(iv, data[8..]);

        let mut iv = [0u8; 8];
        s.cbc_decrypt(&mut data, &mut iv).unwrap();
        assert_eq!(&data, b"sixteen byte msg");
    }

    #[test]
    fn cbc_rejects_partial_block() {
        let s = Schedule::new(Keytype::Des, &[1u8; 8]).unwrap();
        let mut data = [0u8; 9];
        assert!(s.cbc_encrypt(&mut data, &mut [0u8; 8]).unwrap_err().is_fatal());
    }

    #[test]
    fn stream_keytypes_have_no_schedule() {
        assert!(Schedule::new(Keytype::Arcfour, &[0u8; 16]).is_err());
        assert!(Schedule::new(Keytype::Null, &[]).is_err());
    }

    #[test]
    fn debug_names_cipher_only() {
        let s = Schedule::new(Keytype::Aes128, &[0xC3u8; 16]).unwrap();
        let dbg = format!("{s:?}");
        assert!(dbg.contains("aes128"));
        assert!(!dbg.contains("195"));
    }

    #[test]
    fn wrong_key_length_is_bad_key_size() {
        assert_eq!(
            Schedule::new(Keytype::Aes128, &[0u8; 15]).err(),
            Some(CryptoError::BadKeySize { expected: 16, actual: 15 })
        );
    }
}
