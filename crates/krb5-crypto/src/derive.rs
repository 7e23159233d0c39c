//! Key derivation (RFC 3961 section 5.1)
//!
//! ```text
//! DR(K, c) = E(K, nfold(c)) ‖ E(K, E(K, nfold(c))) ‖ ...   (enough bits)
//! DK(K, c) = random-to-key(DR(K, c))
//! ```
//!
//! Every derivation encrypts single blocks, which for both DES3-CBC with a
//! zero IV and AES-CTS is plain ECB.

use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::{
    error::{CryptoError, Result, try_alloc},
    key::Key,
    nfold::nfold,
    primitives::{Schedule, des::des3_random_to_key},
    random::{random_input_len, random_to_key},
    registry::{Enctype, Keytype},
};

/// Suffix selecting the checksum key (Kc).
pub const USAGE_CHECKSUM: u8 = 0x99;
/// Suffix selecting the encryption key (Ke).
pub const USAGE_ENCRYPTION: u8 = 0xAA;
/// Suffix selecting the integrity key (Ki).
pub const USAGE_INTEGRITY: u8 = 0x55;

/// Derivation constant for a key usage: 32-bit big-endian usage then suffix.
pub fn usage_constant(usage: u32, suffix: u8) -> [u8; 5] {
    let u = usage.to_be_bytes();
    [u[0], u[1], u[2], u[3], suffix]
}

/// Derive a key of the same encryption type as `key` from `constant`.
///
/// Only triple-DES and AES keys can be derived from.
pub fn derive_key(key: &Key, constant: &[u8]) -> Result<Key> {
    let keytype = key.enctype().keytype();
    let schedule = Schedule::new(keytype, key.as_bytes())
        .map_err(|_| CryptoError::Internal { reason: "key type does not support derivation" })?;
    let bytes = derive_bytes(&schedule, keytype, constant)?;
    Ok(Key::from_vec(key.enctype(), bytes))
}

/// DK over an already expanded key schedule.
pub(crate) fn derive_bytes(
    schedule: &Schedule,
    keytype: Keytype,
    constant: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let bs = schedule.block_size();
    let nblocks = keytype.bits().div_ceil(bs * 8);
    let mut k = try_alloc(nblocks * bs)?;
    nfold(constant, &mut k[..bs]);
    for i in 0..nblocks {
        let start = i * bs;
        if i > 0 {
            k.copy_within(start - bs..start, start);
        }
        schedule.encrypt_block(&mut k[start..start + bs]);
    }

    match keytype {
        Keytype::Des3 => {
            let mut out = Zeroizing::new(vec![0u8; 24]);
            let mut raw = Zeroizing::new([0u8; 21]);
            raw.copy_from_slice(&k[..21]);
            let mut expanded = Zeroizing::new([0u8; 24]);
            des3_random_to_key(&raw, &mut expanded);
            out.copy_from_slice(expanded.as_slice());
            Ok(out)
        },
        Keytype::Aes128 | Keytype::Aes256 => {
            k.truncate(keytype.size());
            Ok(k)
        },
        Keytype::Null | Keytype::Des | Keytype::Arcfour => {
            Err(CryptoError::Internal { reason: "derivation on a non-derivable key type" })
        },
    }
}

/// Derive a key from Diffie-Hellman output (PKINIT, RFC 4556 section 3.2.3.1).
///
/// Concatenates `SHA1(counter ‖ dhdata ‖ c_n ‖ k_n)` for counter 0, 1, ...
/// until random-to-key has enough input for the key type, then applies it.
pub fn octetstring_to_key(
    enctype: Enctype,
    dhdata: &[u8],
    c_n: Option<&[u8]>,
    k_n: Option<&[u8]>,
) -> Result<Key> {
    let mut material = try_alloc(random_input_len(enctype.keytype()))?;
    let mut counter = 0u8;
    for chunk in material.chunks_mut(20) {
        let mut h = Sha1::new();
        h.update([counter]);
        h.update(dhdata);
        if let Some(c) = c_n {
            h.update(c);
        }
        if let Some(k) = k_n {
            h.update(k);
        }
        let digest = h.finalize();
        chunk.copy_from_slice(&digest[..chunk.len()]);
        counter = counter.wrapping_add(1);
    }
    random_to_key(enctype, &material)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn des3(hexkey: &str) -> Key {
        Key::new(Enctype::Des3CbcSha1, &hex::decode(hexkey).unwrap()).unwrap()
    }

    #[test]
    fn usage_constant_layout() {
        assert_eq!(usage_constant(1, USAGE_INTEGRITY), [0, 0, 0, 1, 0x55]);
        assert_eq!(usage_constant(0x0102_0304, USAGE_CHECKSUM), [1, 2, 3, 4, 0x99]);
    }

    #[test]
    fn rfc3961_des3_dk_vectors() {
        let cases = [
            (
                "dce06b1f64c857a11c3db57c51899b2cc1791008ce973b92",
                "0000000155",
                "925179d04591a79b5d3192c4a7e9c289b049c71f6ee604cd",
            ),
            (
                "5e13d31c70ef765746578531cb51c15bf11ca82c97cee9f2",
                "00000001aa",
                "9e58e5a146d9942a101c469845d67a20e3c4259ed913f207",
            ),
            (
                "98e6fd8a04a4b6859b75a176540b9752bad3ecd610a252bc",
                "0000000155",
                "13fef80d763e94ec6d13fd2ca1d085070249dad39808eabf",
            ),
            (
                "622aec25a2fe2cad7094680b7c64940280084c1a7cec92b5",
                "00000001aa",
                "f8dfbf04b097e6d9dc0702686bcb3489d91fd9a4516b703e",
            ),
        ];
        for (key, constant, expected) in cases {
            let derived = derive_key(&des3(key), &hex::decode(constant).unwrap()).unwrap();
            assert_eq!(hex::encode(derived.as_bytes()), expected);
        }
    }

    #[test]
    fn des3_dk_with_kerberos_constant() {
        let derived =
            derive_key(&des3("d3f8298ccb166438dcb9b93ee5a7629286a491f838f802fb"), b"kerberos")
                .unwrap();
        assert_eq!(
            hex::encode(derived.as_bytes()),
            "2370da575d2a3da864cebfdc5204d56df779a7df43d9da43"
        );
    }

    #[test]
    fn zero_des3_key_derivations() {
        let zero = Key::new(Enctype::Des3CbcSha1, &[0u8; 24]).unwrap();
        assert_eq!(
            hex::encode(derive_key(&zero, b"kerberos").unwrap().as_bytes()),
            "cea22f9b522cb0156e6b64736264734f6e73cea22f9b5257"
        );
        assert_eq!(
            hex::encode(derive_key(&zero, b"test").unwrap().as_bytes()),
            "c7df348cecc15d5b67756473759ba2d9a22ac7df348cec6e"
        );
    }

    #[test]
    fn aes_derivation() {
        let key = Key::new(
            Enctype::Aes128CtsHmacSha196,
            &hex::decode("42263c6e89f4fc28b8df68ee09799f15").unwrap(),
        )
        .unwrap();
        assert_eq!(
            hex::encode(derive_key(&key, b"kerberos").unwrap().as_bytes()),
            "2fd493269355f890a16db7c3764c94a2"
        );
    }

    #[test]
    fn aes256_derivation_produces_two_blocks() {
        let key = Key::new(Enctype::Aes256CtsHmacSha196, &[7u8; 32]).unwrap();
        let derived = derive_key(&key, b"prf").unwrap();
        assert_eq!(derived.as_bytes().len(), 32);
        assert_ne!(derived.as_bytes()[..16], derived.as_bytes()[16..]);
    }

    #[test]
    fn des_and_arcfour_cannot_derive() {
        let des = Key::new(Enctype::DesCbcMd5, &[0x13; 8]).unwrap();
        assert!(derive_key(&des, b"kerberos").unwrap_err().is_fatal());
        let rc4 = Key::new(Enctype::ArcfourHmacMd5, &[0x13; 16]).unwrap();
        assert!(derive_key(&rc4, b"kerberos").unwrap_err().is_fatal());
    }

    #[test]
    fn octetstring_to_key_fills_key_length() {
        let a = octetstring_to_key(Enctype::Aes256CtsHmacSha196, b"shared", None, None).unwrap();
        let b = octetstring_to_key(Enctype::Aes256CtsHmacSha196, b"shared", Some(b"c"), None)
            .unwrap();
        assert_eq!(a.as_bytes().len(), 32);
        assert_ne!(a, b);

        // first block is SHA1(0x00 ‖ dhdata)
        let mut h = Sha1::new();
        h.update([0u8]);
        h.update(b"shared");
        assert_eq!(a.as_bytes()[..20], h.finalize()[..]);
    }

    #[test]
    fn octetstring_to_key_des3_is_parity_adjusted() {
        let key = octetstring_to_key(Enctype::Des3CbcSha1, b"dh", Some(b"c"), Some(b"k")).unwrap();
        assert_eq!(key.as_bytes().len(), 24);
        assert!(key.as_bytes().iter().all(|b| b.count_ones() % 2 == 1));
    }

    #[test]
    fn octetstring_to_key_des_takes_a_full_block() {
        let key = octetstring_to_key(Enctype::DesCbcMd5, b"shared", None, None).unwrap();
        assert_eq!(key.enctype(), Enctype::DesCbcMd5);
        assert_eq!(key.as_bytes().len(), 8);
        assert!(key.as_bytes().iter().all(|b| b.count_ones() % 2 == 1));

        let mut h = Sha1::new();
        h.update([0u8]);
        h.update(b"shared");
        let digest = h.finalize();
        for (k, d) in key.as_bytes().iter().zip(&digest[..8]) {
            assert_eq!(k & 0xFE, d & 0xFE);
        }
    }
}
