//! Encryption engine
//!
//! Three wire formats, chosen by the encryption type:
//!
//! ```text
//! legacy   E(K,  conf ‖ cksum ‖ plaintext ‖ pad)          cksum over the padded
//!                                                         buffer, slot zeroed
//! derived  E(Ke, conf ‖ plaintext ‖ pad) ‖ HMAC(Ki, conf ‖ plaintext ‖ pad)
//! special  cksum ‖ RC4(K3, conf ‖ plaintext)              see `arcfour`
//! ```
//!
//! Pseudo types go through the legacy path with no confounder and the empty
//! checksum, so they only encrypt.
//!
//! Neither the legacy nor the derived format records the plaintext length.
//! Decryption therefore returns the plaintext with its zero padding whenever
//! the pad size is above one: every legacy type and des3-cbc-sha1. AES and
//! RC4-HMAC never pad, so they return exactly what was encrypted.

use tracing::{debug, trace};

use crate::{
    arcfour::{self, usage2arcfour},
    checksum,
    context::{CryptoContext, derived_key},
    derive::{USAGE_ENCRYPTION, USAGE_INTEGRITY, usage_constant},
    error::{CryptoError, Result, release, try_alloc},
    key::KeyData,
    primitives::{Schedule, aes, des},
    random::RandomSource,
    registry::{CipherMode, Cksumtype, Enctype, WireFormat},
};

impl<R: RandomSource> CryptoContext<R> {
    /// Encrypt `plaintext` for `usage`.
    pub fn encrypt(&mut self, usage: u32, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with(usage, plaintext, None)
    }

    /// Decrypt and verify `ciphertext` for `usage`.
    pub fn decrypt(&mut self, usage: u32, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_with(usage, ciphertext, None)
    }

    /// Encrypt, chaining cipher state through `ivec`.
    ///
    /// `ivec` must be one cipher block long. Triple-DES CBC and AES-CTS read
    /// it and leave the chaining value for the next call in it; ciphers with
    /// a fixed IV ignore it.
    pub fn encrypt_ivec(
        &mut self,
        usage: u32,
        plaintext: &[u8],
        ivec: &mut [u8],
    ) -> Result<Vec<u8>> {
        self.check_ivec(ivec)?;
        self.encrypt_with(usage, plaintext, Some(ivec))
    }

    /// Decrypt, chaining cipher state through `ivec`.
    pub fn decrypt_ivec(
        &mut self,
        usage: u32,
        ciphertext: &[u8],
        ivec: &mut [u8],
    ) -> Result<Vec<u8>> {
        self.check_ivec(ivec)?;
        self.decrypt_with(usage, ciphertext, Some(ivec))
    }

    /// Ciphertext length for a plaintext of `len` bytes.
    pub fn wrapped_length(&self, len: usize) -> usize {
        let e = self.enctype;
        let pad = e.padsize();
        match e.wire_format() {
            WireFormat::Derived => pad_to(e.confounder_size() + len, pad) + keyed_size(e),
            WireFormat::Legacy | WireFormat::Special => {
                pad_to(e.confounder_size() + e.checksum_type().size() + len, pad)
            },
        }
    }

    /// Upper bound on ciphertext expansion.
    pub fn crypto_overhead(&self) -> usize {
        let e = self.enctype;
        let cksum = match e.wire_format() {
            WireFormat::Derived => keyed_size(e),
            WireFormat::Legacy | WireFormat::Special => e.checksum_type().size(),
        };
        let pad = if e.padsize() > 1 { e.padsize() } else { 0 };
        cksum + e.confounder_size() + pad
    }

    fn check_ivec(&self, ivec: &[u8]) -> Result<()> {
        if ivec.len() != self.enctype.blocksize() {
            return Err(CryptoError::BadMessageSize {
                len: ivec.len(),
                reason: "ivec must be one cipher block",
            });
        }
        Ok(())
    }

    fn encrypt_with(
        &mut self,
        usage: u32,
        plaintext: &[u8],
        ivec: Option<&mut [u8]>,
    ) -> Result<Vec<u8>> {
        let enctype = self.enctype.ensure_enabled()?;
        trace!(enctype = enctype.name(), usage, len = plaintext.len(), "encrypt");
        match enctype.wire_format() {
            WireFormat::Derived => self.encrypt_derived(usage, plaintext, ivec),
            WireFormat::Legacy => self.encrypt_legacy(plaintext, ivec),
            WireFormat::Special => {
                enctype.checksum_type().ensure_enabled()?;
                arcfour::encrypt(self.key.key(), usage2arcfour(usage), plaintext, &self.rng)
            },
        }
    }

    fn decrypt_with(
        &mut self,
        usage: u32,
        ciphertext: &[u8],
        ivec: Option<&mut [u8]>,
    ) -> Result<Vec<u8>> {
        let enctype = self.enctype.ensure_enabled()?;
        trace!(enctype = enctype.name(), usage, len = ciphertext.len(), "decrypt");
        let result = match enctype.wire_format() {
            WireFormat::Derived => self.decrypt_derived(usage, ciphertext, ivec),
            WireFormat::Legacy => self.decrypt_legacy(ciphertext, ivec),
            WireFormat::Special => {
                enctype.checksum_type().ensure_enabled()?;
                arcfour::decrypt(self.key.key(), usage2arcfour(usage), ciphertext)
            },
        };
        if matches!(result, Err(CryptoError::BadIntegrity)) {
            debug!(enctype = enctype.name(), usage, "decrypt integrity check failed");
        }
        result
    }

    fn encrypt_legacy(&self, plaintext: &[u8], ivec: Option<&mut [u8]>) -> Result<Vec<u8>> {
        let enctype = self.enctype;
        let cksumtype = enctype.checksum_type().ensure_enabled()?;
        let conf = enctype.confounder_size();
        let cksum_len = cksumtype.size();
        let header = conf + cksum_len;

        let mut buf = try_alloc(pad_to(header + plaintext.len(), enctype.padsize()))?;
        self.rng.random_bytes(&mut buf[..conf]);
        buf[header..header + plaintext.len()].copy_from_slice(plaintext);

        let cksum = checksum::compute(cksumtype, None, 0, &buf, &self.rng)?;
        if cksum.len() != cksum_len {
            return Err(CryptoError::Internal { reason: "checksum produced the wrong length" });
        }
        buf[conf..header].copy_from_slice(&cksum);
        apply_cipher(enctype, &self.key, &mut buf, ivec, true)?;
        Ok(release(buf))
    }

    fn decrypt_legacy(&self, ciphertext: &[u8], ivec: Option<&mut [u8]>) -> Result<Vec<u8>> {
        let enctype = self.enctype;
        let cksumtype = enctype.checksum_type().ensure_enabled()?;
        let conf = enctype.confounder_size();
        let header = conf + cksumtype.size();
        let len = ciphertext.len();
        if len < header {
            return Err(CryptoError::BadMessageSize {
                len,
                reason: "shorter than confounder and checksum",
            });
        }
        if !len.is_multiple_of(enctype.padsize()) {
            return Err(CryptoError::BadMessageSize {
                len,
                reason: "not a multiple of the pad size",
            });
        }

        let mut buf = try_alloc(len)?;
        buf.copy_from_slice(ciphertext);
        apply_cipher(enctype, &self.key, &mut buf, ivec, false)?;

        let received = buf[conf..header].to_vec();
        buf[conf..header].fill(0);
        checksum::verify(cksumtype, None, 0, &buf, &received)?;

        buf.copy_within(header.., 0);
        buf.truncate(len - header);
        Ok(release(buf))
    }

    fn encrypt_derived(
        &mut self,
        usage: u32,
        plaintext: &[u8],
        ivec: Option<&mut [u8]>,
    ) -> Result<Vec<u8>> {
        let enctype = self.enctype;
        let cksumtype = keyed_checksum(enctype)?.ensure_enabled()?;
        let conf = enctype.confounder_size();
        let cksum_len = cksumtype.size();
        let block_len = pad_to(conf + plaintext.len(), enctype.padsize());

        let mut buf = try_alloc(block_len + cksum_len)?;
        self.rng.random_bytes(&mut buf[..conf]);
        buf[conf..conf + plaintext.len()].copy_from_slice(plaintext);

        let ki =
            derived_key(&self.key, &mut self.derived, usage_constant(usage, USAGE_INTEGRITY))?;
        let mac = checksum::compute(cksumtype, Some(ki.key()), 0, &buf[..block_len], &self.rng)?;
        if mac.len() != cksum_len {
            return Err(CryptoError::Internal { reason: "checksum produced the wrong length" });
        }
        buf[block_len..].copy_from_slice(&mac);

        let ke =
            derived_key(&self.key, &mut self.derived, usage_constant(usage, USAGE_ENCRYPTION))?;
        apply_cipher(enctype, ke, &mut buf[..block_len], ivec, true)?;
        Ok(release(buf))
    }

    fn decrypt_derived(
        &mut self,
        usage: u32,
        ciphertext: &[u8],
        ivec: Option<&mut [u8]>,
    ) -> Result<Vec<u8>> {
        let enctype = self.enctype;
        let cksumtype = keyed_checksum(enctype)?.ensure_enabled()?;
        let conf = enctype.confounder_size();
        let cksum_len = cksumtype.size();
        let len = ciphertext.len();
        if len < conf + cksum_len {
            return Err(CryptoError::BadMessageSize {
                len,
                reason: "shorter than confounder and checksum",
            });
        }
        let block_len = len - cksum_len;
        if !block_len.is_multiple_of(enctype.padsize()) {
            return Err(CryptoError::BadMessageSize {
                len,
                reason: "not a multiple of the pad size",
            });
        }

        let mut buf = try_alloc(block_len)?;
        buf.copy_from_slice(&ciphertext[..block_len]);
        let ke =
            derived_key(&self.key, &mut self.derived, usage_constant(usage, USAGE_ENCRYPTION))?;
        apply_cipher(enctype, ke, &mut buf, ivec, false)?;

        let ki =
            derived_key(&self.key, &mut self.derived, usage_constant(usage, USAGE_INTEGRITY))?;
        checksum::verify(cksumtype, Some(ki.key()), 0, &buf, &ciphertext[block_len..])?;

        buf.copy_within(conf.., 0);
        buf.truncate(block_len - conf);
        Ok(release(buf))
    }
}

/// Run the encryption type's cipher over `data` in place.
///
/// `data` must already be a multiple of the pad size.
pub(crate) fn apply_cipher(
    enctype: Enctype,
    key: &KeyData,
    data: &mut [u8],
    ivec: Option<&mut [u8]>,
    encrypt: bool,
) -> Result<()> {
    match enctype.info().cipher {
        CipherMode::Identity => Ok(()),
        CipherMode::DesCbcKeyIv => {
            let mut iv = key_iv(key)?;
            cbc(key.schedule()?, data, &mut iv, encrypt)
        },
        CipherMode::DesCbcZeroIv => cbc(key.schedule()?, data, &mut [0u8; des::DES_BLOCK], encrypt),
        CipherMode::Des3Cbc => {
            let mut iv = [0u8; des::DES_BLOCK];
            if let Some(v) = &ivec {
                iv.copy_from_slice(v);
            }
            cbc(key.schedule()?, data, &mut iv, encrypt)?;
            if let Some(v) = ivec {
                v.copy_from_slice(&iv);
            }
            Ok(())
        },
        CipherMode::DesCfb64 => {
            des::cfb64(key.schedule()?, data, &mut [0u8; des::DES_BLOCK], encrypt);
            Ok(())
        },
        CipherMode::DesPcbcKeyIv => {
            if !data.len().is_multiple_of(des::DES_BLOCK) {
                return Err(CryptoError::Internal { reason: "pcbc input not block aligned" });
            }
            let mut iv = key_iv(key)?;
            des::pcbc(key.schedule()?, data, &mut iv, encrypt);
            Ok(())
        },
        CipherMode::AesCts => {
            let mut iv = [0u8; aes::AES_BLOCK];
            if let Some(v) = &ivec {
                iv.copy_from_slice(v);
            }
            aes::cts(key.schedule()?, data, &mut iv, encrypt)?;
            if let Some(v) = ivec {
                v.copy_from_slice(&iv);
            }
            Ok(())
        },
        CipherMode::Rc4Hmac => {
            Err(CryptoError::Internal { reason: "rc4-hmac has no block cipher" })
        },
    }
}

fn cbc(schedule: &Schedule, data: &mut [u8], iv: &mut [u8], encrypt: bool) -> Result<()> {
    if encrypt { schedule.cbc_encrypt(data, iv) } else { schedule.cbc_decrypt(data, iv) }
}

/// DES modes that use the key itself as IV.
fn key_iv(key: &KeyData) -> Result<[u8; des::DES_BLOCK]> {
    key.key()
        .as_bytes()
        .try_into()
        .map_err(|_| CryptoError::Internal { reason: "key-as-iv needs a single DES key" })
}

fn keyed_checksum(enctype: Enctype) -> Result<Cksumtype> {
    enctype
        .keyed_checksum_type()
        .ok_or(CryptoError::Internal { reason: "derived encryption type without keyed checksum" })
}

fn keyed_size(enctype: Enctype) -> usize {
    enctype.keyed_checksum_type().map_or(0, Cksumtype::size)
}

fn pad_to(len: usize, pad: usize) -> usize {
    len.div_ceil(pad) * pad
}
