//! Password to key conversion
//!
//! One algorithm per (key type, salt type) pair. The encryption type decides
//! the family, the salt type picks the variant within it.
//!
//! | family        | pw-salt                          | afs3-salt         |
//! |---------------|----------------------------------|-------------------|
//! | DES           | fan-fold + CBC-MAC               | CMU / Transarc    |
//! | DES3          | n-fold + 3DES self-encryption    | -                 |
//! | DES3 derived  | n-fold + DK("kerberos")          | -                 |
//! | AES           | PBKDF2-HMAC-SHA1 + DK("kerberos")| -                 |
//! | ARCFOUR       | MD4(UTF-16LE password)           | -                 |

use std::sync::atomic::{AtomicU32, Ordering};

use md4::Md4;
use pbkdf2::pbkdf2_hmac;
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::{
    derive::derive_bytes,
    error::{CryptoError, Result, try_alloc},
    key::{Key, Salt},
    nfold::nfold,
    primitives::{
        Schedule,
        des::{cbc_cksum, fix_weak_key, set_odd_parity},
    },
    random::{random_input_len, random_to_key},
    registry::{Enctype, Keytype, S2kFamily, SaltType},
};

/// PBKDF2 iteration count for AES when the salt carries no parameter (RFC 3962).
pub const DEFAULT_AES_ITERATIONS: u32 = 4096;

static AES_ITERATIONS: AtomicU32 = AtomicU32::new(DEFAULT_AES_ITERATIONS);

/// Opaque value selecting the AFS3 algorithm for a DES pw-salt.
const AFS3_SELECTOR: [u8; 1] = [1];

/// Change the AES iteration count used when the opaque parameter is empty.
pub fn set_default_aes_iterations(iterations: u32) {
    AES_ITERATIONS.store(iterations, Ordering::Relaxed);
}

/// Derive a key from a password using the salt's own opaque parameter.
pub fn string_to_key(enctype: Enctype, password: &[u8], salt: &Salt) -> Result<Key> {
    string_to_key_opaque(enctype, password, salt, &salt.opaque)
}

/// Derive a key from a password with an explicit opaque parameter.
pub fn string_to_key_opaque(
    enctype: Enctype,
    password: &[u8],
    salt: &Salt,
    opaque: &[u8],
) -> Result<Key> {
    enctype.ensure_enabled()?;
    let unsupported = CryptoError::UnsupportedSaltType { salttype: salt.salt_type.id() };
    match (enctype.info().s2k, salt.salt_type) {
        (S2kFamily::Des, SaltType::Pw) if opaque == AFS3_SELECTOR => {
            afs3_string_to_key(enctype, password, &salt.value)
        },
        (S2kFamily::Des, SaltType::Pw) => {
            let data = concat(password, &salt.value)?;
            let key = des_string_to_key(&data)?;
            Ok(Key::from_vec(enctype, key))
        },
        (S2kFamily::Des, SaltType::Afs3) => afs3_string_to_key(enctype, password, &salt.value),
        (S2kFamily::Des3, SaltType::Pw) => des3_string_to_key(enctype, password, &salt.value),
        (S2kFamily::Des3Derived, SaltType::Pw) => {
            string_to_key_derived(enctype, &concat(password, &salt.value)?)
        },
        (S2kFamily::Aes, SaltType::Pw) => aes_string_to_key(enctype, password, salt, opaque),
        (S2kFamily::Arcfour, SaltType::Pw) => Ok(arcfour_string_to_key(enctype, password)),
        _ => Err(unsupported),
    }
}

/// n-fold raw bytes to the key's random-input length, then DK("kerberos").
///
/// Only key types that support derivation (triple-DES, AES) are accepted.
pub fn string_to_key_derived(enctype: Enctype, data: &[u8]) -> Result<Key> {
    enctype.ensure_enabled()?;
    let keytype = enctype.keytype();
    if !matches!(keytype, Keytype::Des3 | Keytype::Aes128 | Keytype::Aes256) {
        return Err(CryptoError::UnsupportedEnctype { enctype: enctype.id() });
    }
    let mut folded = try_alloc(random_input_len(keytype))?;
    nfold(data, &mut folded);
    let base = random_to_key(enctype, &folded)?;
    derive_kerberos(enctype, base.as_bytes())
}

fn derive_kerberos(enctype: Enctype, base: &[u8]) -> Result<Key> {
    let schedule = Schedule::new(enctype.keytype(), base)?;
    let bytes = derive_bytes(&schedule, enctype.keytype(), b"kerberos")?;
    Ok(Key::from_vec(enctype, bytes))
}

fn concat(a: &[u8], b: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut out = try_alloc(a.len() + b.len())?;
    out[..a.len()].copy_from_slice(a);
    out[a.len()..].copy_from_slice(b);
    Ok(out)
}

/// Classic DES string-to-key over `password ‖ salt`.
fn des_string_to_key(data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new([0u8; 8]);

    // Fan-fold: forward with each byte shifted left, backward bit-reversed,
    // turning around every 8 bytes.
    let mut pos = 0usize;
    let mut reverse = false;
    for (i, &b) in data.iter().enumerate() {
        if reverse {
            pos -= 1;
            key[pos] ^= b.reverse_bits();
        } else {
            key[pos] ^= b << 1;
            pos += 1;
        }
        if i % 8 == 7 {
            reverse = !reverse;
        }
    }
    set_odd_parity(key.as_mut_slice());
    fix_weak_key(key.as_mut_slice());

    let schedule = Schedule::new(Keytype::Des, key.as_slice())?;
    let mut out = Zeroizing::new(cbc_cksum(&schedule, data, *key).to_vec());
    set_odd_parity(&mut out);
    fix_weak_key(&mut out);
    Ok(out)
}

fn afs3_string_to_key(enctype: Enctype, password: &[u8], cell: &[u8]) -> Result<Key> {
    let key = if password.len() > 8 {
        afs3_transarc(password, cell)?
    } else {
        afs3_cmu(password, cell)?
    };
    Ok(Key::from_vec(enctype, Zeroizing::new(key.to_vec())))
}

/// AFS3 string-to-key for passwords longer than 8 bytes.
fn afs3_transarc(password: &[u8], cell: &[u8]) -> Result<Zeroizing<[u8; 8]>> {
    const MAX: usize = 512;
    let mut buf = try_alloc(MAX)?;
    let pw_len = password.len().min(MAX);
    buf[..pw_len].copy_from_slice(&password[..pw_len]);
    let cell_len = cell.len().min(MAX - pw_len);
    for (dst, src) in buf[pw_len..pw_len + cell_len].iter_mut().zip(cell) {
        *dst = src.to_ascii_lowercase();
    }
    let data = &buf[..pw_len + cell_len];

    let mut temp_key = Zeroizing::new(*b"kerberos");
    set_odd_parity(temp_key.as_mut_slice());
    let schedule = Schedule::new(Keytype::Des, temp_key.as_slice())?;
    let ivec = Zeroizing::new(cbc_cksum(&schedule, data, *b"kerberos"));

    temp_key.copy_from_slice(ivec.as_slice());
    set_odd_parity(temp_key.as_mut_slice());
    let schedule = Schedule::new(Keytype::Des, temp_key.as_slice())?;
    let mut key = Zeroizing::new(cbc_cksum(&schedule, data, *ivec));
    set_odd_parity(key.as_mut_slice());
    Ok(key)
}

/// AFS3 string-to-key for passwords of at most 8 bytes, built on crypt(3).
#[cfg(feature = "afs3-salt")]
fn afs3_cmu(password: &[u8], cell: &[u8]) -> Result<Zeroizing<[u8; 8]>> {
    let mut input = Zeroizing::new([0u8; 8]);
    for (i, c) in input.iter_mut().enumerate() {
        let p = password.get(i).copied().unwrap_or(0);
        let s = cell.get(i).map_or(0, u8::to_ascii_lowercase);
        *c = match p ^ s {
            0 => b'X',
            v => v,
        };
    }

    let hashed = pwhash::unix::crypt(input.as_slice(), "p1")
        .map_err(|_| CryptoError::Internal { reason: "crypt(3) rejected afs3 input" })?;
    let Some(chars) = hashed.as_bytes().get(2..10) else {
        return Err(CryptoError::Internal { reason: "crypt(3) output too short" });
    };

    let mut key = Zeroizing::new([0u8; 8]);
    for (k, &c) in key.iter_mut().zip(chars) {
        *k = c << 1;
    }
    set_odd_parity(key.as_mut_slice());
    Ok(key)
}

#[cfg(not(feature = "afs3-salt"))]
fn afs3_cmu(_password: &[u8], _cell: &[u8]) -> Result<Zeroizing<[u8; 8]>> {
    Err(CryptoError::UnsupportedSaltType { salttype: SaltType::Afs3.id() })
}

/// Non-derived triple-DES string-to-key (`des3-cbc-md5`, `old-des3-cbc-sha1`).
fn des3_string_to_key(enctype: Enctype, password: &[u8], salt: &[u8]) -> Result<Key> {
    let data = concat(password, salt)?;
    let mut folded = Zeroizing::new([0u8; 24]);
    nfold(&data, folded.as_mut_slice());

    let mut keys = Zeroizing::new(*folded);
    for part in keys.chunks_exact_mut(8) {
        set_odd_parity(part);
        fix_weak_key(part);
    }

    // The raw fold, not the adjusted key, is encrypted under the adjusted key.
    let schedule = Schedule::new(Keytype::Des3, keys.as_slice())?;
    let mut iv = [0u8; 8];
    schedule.cbc_encrypt(folded.as_mut_slice(), &mut iv)?;

    let mut out = try_alloc(24)?;
    out.copy_from_slice(folded.as_slice());
    for part in out.chunks_exact_mut(8) {
        set_odd_parity(part);
        fix_weak_key(part);
    }
    Ok(Key::from_vec(enctype, out))
}

/// PBKDF2-HMAC-SHA1 then DK("kerberos") (RFC 3962).
///
/// A count of zero is refused rather than read as 2^32.
fn aes_string_to_key(enctype: Enctype, password: &[u8], salt: &Salt, opaque: &[u8]) -> Result<Key> {
    let iterations = match opaque.len() {
        0 => AES_ITERATIONS.load(Ordering::Relaxed),
        4 => u32::from_be_bytes([opaque[0], opaque[1], opaque[2], opaque[3]]),
        len => return Err(CryptoError::InvalidOpaque { len }),
    };
    if iterations == 0 {
        return Err(CryptoError::ZeroIterations);
    }
    let mut tk = try_alloc(enctype.keysize())?;
    pbkdf2_hmac::<Sha1>(password, &salt.value, iterations, &mut tk);
    derive_kerberos(enctype, &tk)
}

/// MD4 of the password with a zero byte after every byte (RFC 4757).
fn arcfour_string_to_key(enctype: Enctype, password: &[u8]) -> Key {
    let mut h = Md4::new();
    for &b in password {
        h.update([b, 0]);
    }
    Key::from_vec(enctype, Zeroizing::new(h.finalize().to_vec()))
}
