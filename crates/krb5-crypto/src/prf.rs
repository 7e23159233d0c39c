//! Pseudo-random function (RFC 3962 section 4)
//!
//! `PRF(K, input) = AES-ECB(DK(K, "prf"), SHA1(input)[..16])`

use sha1::{Digest, Sha1};

use crate::{
    derive::derive_key,
    error::{CryptoError, Result},
    key::Key,
    primitives::Schedule,
    registry::Enctype,
};

const PRF_CONSTANT: &[u8] = b"prf";

/// PRF output length for `enctype`.
pub fn prf_length(enctype: Enctype) -> Result<usize> {
    match enctype.info().prf_length {
        0 => Err(CryptoError::PrfUnsupported { enctype: enctype.id() }),
        len => Ok(len),
    }
}

pub(crate) fn prf(enctype: Enctype, key: &Key, input: &[u8]) -> Result<Vec<u8>> {
    let len = prf_length(enctype)?;
    let digest = Sha1::digest(input);
    if digest.len() < len {
        return Err(CryptoError::Internal { reason: "prf digest shorter than a block" });
    }
    let derived = derive_key(key, PRF_CONSTANT)?;
    let schedule = Schedule::new(enctype.keytype(), derived.as_bytes())?;
    let mut out = digest[..len].to_vec();
    schedule.encrypt_block(&mut out);
    Ok(out)
}
