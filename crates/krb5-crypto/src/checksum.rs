//! Checksum engine
//!
//! Four families share one entry point:
//!
//! ```text
//! unkeyed  crc32, rsa-md4, rsa-md5, sha1      digest(data)
//! variant  rsa-md4-des, rsa-md5-des[3]        CBC(key ^ 0xF0, conf ‖ digest(conf ‖ data))
//! derived  hmac-sha1-des3, hmac-sha1-96-aes*  HMAC-SHA1(Kc, data), truncated
//! windows  hmac-md5, hmac-md5-enc             RFC 4757 two-stage HMAC-MD5
//! ```
//!
//! Key selection (base, derived Kc, variant) happens in the caller; this
//! module only runs the algorithm over the key it is handed.

use hmac::{
    Mac, SimpleHmac,
    digest::{Digest, core_api::BlockSizeUser},
};
use md4::Md4;
use md5::Md5;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{
    error::{CryptoError, Result},
    key::{Checksum, Key},
    primitives::{Schedule, crc32::crc32},
    random::RandomSource,
    registry::{ChecksumAlg, Cksumtype, Keying, Keytype},
};

/// Length of the confounder inside variant checksums.
const VARIANT_CONFOUNDER: usize = 8;

/// Key bytes are XORed with this before a variant checksum.
const VARIANT_MASK: u8 = 0xF0;

const SIGNATURE_KEY: &[u8] = b"signaturekey\0";

/// Compute an unkeyed checksum.
pub fn checksum_unkeyed(cksumtype: Cksumtype, data: &[u8]) -> Result<Checksum> {
    cksumtype.ensure_enabled()?;
    if cksumtype.is_keyed() {
        return Err(CryptoError::KeyedChecksumWithoutKey { cksumtype: cksumtype.id() });
    }
    let bytes = compute_deterministic(cksumtype, None, 0, data)?;
    Ok(Checksum { cksumtype, bytes })
}

/// Verify an unkeyed checksum. Any mismatch is `BadIntegrity`.
pub fn verify_unkeyed(data: &[u8], checksum: &Checksum) -> Result<()> {
    let cksumtype = checksum.cksumtype.ensure_enabled()?;
    if cksumtype.is_keyed() {
        return Err(CryptoError::KeyedChecksumWithoutKey { cksumtype: cksumtype.id() });
    }
    verify(cksumtype, None, 0, data, &checksum.bytes)
}

/// RFC 2104 HMAC over one of the plain digest types (rsa-md4, rsa-md5, sha1).
pub fn hmac(cksumtype: Cksumtype, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    cksumtype.ensure_enabled()?;
    match cksumtype.info().alg {
        ChecksumAlg::Md4 => Ok(hmac_with::<Md4>(key, &[data])),
        ChecksumAlg::Md5 => Ok(hmac_with::<Md5>(key, &[data])),
        ChecksumAlg::Sha1 => Ok(hmac_with::<Sha1>(key, &[data])),
        _ => Err(CryptoError::UnsupportedChecksum { cksumtype: cksumtype.id() }),
    }
}

/// Run `cksumtype` over `data`.
///
/// `key` is the key the algorithm consumes directly: the derived Kc for
/// derived types, the base key otherwise. `usage` is only read by the
/// HMAC-MD5 family.
pub(crate) fn compute<R: RandomSource + ?Sized>(
    cksumtype: Cksumtype,
    key: Option<&Key>,
    usage: u32,
    data: &[u8],
    rng: &R,
) -> Result<Vec<u8>> {
    let info = cksumtype.info();
    if info.keying == Keying::Variant {
        let key = require_key(cksumtype, key)?;
        let schedule = variant_schedule(cksumtype, key)?;
        let mut out = vec![0u8; info.size];
        rng.random_bytes(&mut out[..VARIANT_CONFOUNDER]);
        let digest = plain_digest(info.alg, &[&out[..VARIANT_CONFOUNDER], data])?;
        out[VARIANT_CONFOUNDER..].copy_from_slice(&digest);
        schedule.cbc_encrypt(&mut out, &mut vec![0u8; schedule.block_size()])?;
        return Ok(out);
    }
    compute_deterministic(cksumtype, key, usage, data)
}

/// Check `expected` against `data`. Every failure cause is `BadIntegrity`.
pub(crate) fn verify(
    cksumtype: Cksumtype,
    key: Option<&Key>,
    usage: u32,
    data: &[u8],
    expected: &[u8],
) -> Result<()> {
    let info = cksumtype.info();
    if expected.len() != info.size {
        return Err(CryptoError::BadIntegrity);
    }

    let matches: bool = if info.keying == Keying::Variant {
        let key = require_key(cksumtype, key)?;
        let schedule = variant_schedule(cksumtype, key)?;
        let mut plain = Zeroizing::new(expected.to_vec());
        schedule.cbc_decrypt(&mut plain, &mut vec![0u8; schedule.block_size()])?;
        let digest = plain_digest(info.alg, &[&plain[..VARIANT_CONFOUNDER], data])?;
        digest.ct_eq(&plain[VARIANT_CONFOUNDER..]).into()
    } else {
        let computed = compute_deterministic(cksumtype, key, usage, data)?;
        if computed.len() != info.size {
            return Err(CryptoError::Internal { reason: "checksum produced the wrong length" });
        }
        computed.ct_eq(expected).into()
    };

    if matches { Ok(()) } else { Err(CryptoError::BadIntegrity) }
}

fn compute_deterministic(
    cksumtype: Cksumtype,
    key: Option<&Key>,
    usage: u32,
    data: &[u8],
) -> Result<Vec<u8>> {
    let info = cksumtype.info();
    match info.alg {
        ChecksumAlg::None => Ok(Vec::new()),
        ChecksumAlg::Crc32 => Ok(crc32(data).to_vec()),
        ChecksumAlg::Md4 | ChecksumAlg::Md5 | ChecksumAlg::Sha1 => plain_digest(info.alg, &[data]),
        ChecksumAlg::HmacSha1 => {
            let key = require_key(cksumtype, key)?;
            let mut mac = hmac_with::<Sha1>(key.as_bytes(), &[data]);
            mac.truncate(info.size);
            Ok(mac)
        },
        ChecksumAlg::HmacMd5 => {
            let key = require_key(cksumtype, key)?;
            Ok(hmac_md5_sign(key.as_bytes(), usage, data).to_vec())
        },
        ChecksumAlg::HmacMd5Enc => {
            let key = require_key(cksumtype, key)?;
            Ok(hmac_md5_enc(key.as_bytes(), usage, data).to_vec())
        },
        ChecksumAlg::Md4Des | ChecksumAlg::Md5Des | ChecksumAlg::Md5Des3 => {
            Err(CryptoError::Internal { reason: "variant checksum needs a confounder" })
        },
    }
}

fn require_key(cksumtype: Cksumtype, key: Option<&Key>) -> Result<&Key> {
    key.ok_or(CryptoError::KeyedChecksumWithoutKey { cksumtype: cksumtype.id() })
}

/// Schedule for `key ^ 0xF0`. Built per call and never cached.
fn variant_schedule(cksumtype: Cksumtype, key: &Key) -> Result<Schedule> {
    let keytype = match cksumtype.info().alg {
        ChecksumAlg::Md4Des | ChecksumAlg::Md5Des => Keytype::Des,
        ChecksumAlg::Md5Des3 => Keytype::Des3,
        _ => return Err(CryptoError::Internal { reason: "not a variant checksum" }),
    };
    if key.enctype().keytype() != keytype {
        return Err(CryptoError::UnsupportedChecksum { cksumtype: cksumtype.id() });
    }
    let mut variant = Zeroizing::new(key.as_bytes().to_vec());
    for b in variant.iter_mut() {
        *b ^= VARIANT_MASK;
    }
    Schedule::new(keytype, &variant)
}

/// The digest underneath a plain or variant checksum.
fn plain_digest(alg: ChecksumAlg, parts: &[&[u8]]) -> Result<Vec<u8>> {
    match alg {
        ChecksumAlg::Md4 | ChecksumAlg::Md4Des => Ok(digest_with::<Md4>(parts)),
        ChecksumAlg::Md5 | ChecksumAlg::Md5Des | ChecksumAlg::Md5Des3 => {
            Ok(digest_with::<Md5>(parts))
        },
        ChecksumAlg::Sha1 => Ok(digest_with::<Sha1>(parts)),
        _ => Err(CryptoError::Internal { reason: "checksum has no plain digest" }),
    }
}

fn digest_with<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut h = D::new();
    for part in parts {
        h.update(part);
    }
    h.finalize().to_vec()
}

fn hmac_with<D: Digest + BlockSizeUser>(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let Ok(mut mac) = SimpleHmac::<D>::new_from_slice(key) else {
        unreachable!("HMAC accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// HMAC-MD5 into a fixed array.
pub(crate) fn hmac_md5(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 16]> {
    let mut out = Zeroizing::new([0u8; 16]);
    out.copy_from_slice(&hmac_with::<Md5>(key, parts));
    out
}

/// `HMAC(HMAC(key, "signaturekey\0"), MD5(usage_le ‖ data))`
fn hmac_md5_sign(key: &[u8], usage: u32, data: &[u8]) -> Zeroizing<[u8; 16]> {
    let ksign = hmac_md5(key, &[SIGNATURE_KEY]);
    let inner = digest_with::<Md5>(&[&usage.to_le_bytes(), data]);
    hmac_md5(&*ksign, &[&inner])
}

/// `HMAC(HMAC(key, usage_le), data)`
pub(crate) fn hmac_md5_enc(key: &[u8], usage: u32, data: &[u8]) -> Zeroizing<[u8; 16]> {
    let k1 = hmac_md5(key, &[&usage.to_le_bytes()]);
    hmac_md5(&*k1, &[data])
}
