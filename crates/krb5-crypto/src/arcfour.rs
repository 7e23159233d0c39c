//! RC4-HMAC encryption (RFC 4757)
//!
//! ```text
//! K1 = HMAC-MD5(key, usage_le32)          K2 = K1
//! cksum = HMAC-MD5(K2, conf ‖ plaintext)
//! K3 = HMAC-MD5(K1, cksum)
//! wire = cksum(16) ‖ RC4(K3, conf(8) ‖ plaintext)
//! ```
//!
//! Decryption decrypts into a scratch buffer and releases it only after the
//! checksum matches.

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::{
    checksum::{hmac_md5, hmac_md5_enc},
    error::{CryptoError, Result, release, try_alloc},
    key::Key,
    primitives::rc4::Rc4,
    random::RandomSource,
};

const CKSUM_LEN: usize = 16;
const CONFOUNDER_LEN: usize = 8;

/// Map an RFC 4120 key usage onto the number the Microsoft construction
/// expects. Unlisted usages pass through unchanged.
pub fn usage2arcfour(usage: u32) -> u32 {
    match usage {
        3 | 9 => 8,
        22 => 13,
        23 => 15,
        24 => 0,
        1 | 2 | 4..=8 | 10..=21 => usage,
        _ => {
            debug!(usage, "no arcfour mapping for key usage, using it as is");
            usage
        },
    }
}

/// Encrypt `plaintext` for an already remapped `usage`.
pub(crate) fn encrypt<R: RandomSource + ?Sized>(
    key: &Key,
    usage: u32,
    plaintext: &[u8],
    rng: &R,
) -> Result<Vec<u8>> {
    let total = CKSUM_LEN + CONFOUNDER_LEN + plaintext.len();
    let mut out = try_alloc(total)?;
    let (cksum_slot, body) = out.split_at_mut(CKSUM_LEN);
    let (confounder, data) = body.split_at_mut(CONFOUNDER_LEN);
    rng.random_bytes(confounder);
    data.copy_from_slice(plaintext);

    let k1 = hmac_md5(key.as_bytes(), &[&usage.to_le_bytes()]);
    let cksum = hmac_md5(&*k1, &[&*body]);
    let k3 = hmac_md5(&*k1, &[&*cksum]);
    Rc4::new(&*k3).apply_keystream(body);
    cksum_slot.copy_from_slice(&*cksum);
    Ok(release(out))
}

/// Decrypt and verify. Returns the plaintext without the confounder.
pub(crate) fn decrypt(key: &Key, usage: u32, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < CKSUM_LEN + CONFOUNDER_LEN {
        return Err(CryptoError::BadMessageSize {
            len: ciphertext.len(),
            reason: "shorter than arcfour checksum and confounder",
        });
    }
    let (cksum, body) = ciphertext.split_at(CKSUM_LEN);

    let k1 = hmac_md5(key.as_bytes(), &[&usage.to_le_bytes()]);
    let k3 = hmac_md5(&*k1, &[cksum]);
    let mut scratch = try_alloc(body.len())?;
    scratch.copy_from_slice(body);
    Rc4::new(&*k3).apply_keystream(&mut scratch);

    let expected = hmac_md5_enc(key.as_bytes(), usage, &scratch);
    if !bool::from(expected[..].ct_eq(cksum)) {
        return Err(CryptoError::BadIntegrity);
    }
    let keep = scratch.len() - CONFOUNDER_LEN;
    scratch.copy_within(CONFOUNDER_LEN.., 0);
    scratch.truncate(keep);
    Ok(release(scratch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Enctype;

    struct Counting;

    impl RandomSource for Counting {
        fn random_bytes(&self, buffer: &mut [u8]) {
            for (i, b) in buffer.iter_mut().enumerate() {
                *b = i as u8;
            }
        }
    }

    fn rc4_key() -> Key {
        Key::new(Enctype::ArcfourHmacMd5, &hex::decode("8846f7eaee8fb117ad06bdd830b7586c").unwrap())
            .unwrap()
    }

    #[test]
    fn usage_remap_table() {
        assert_eq!(usage2arcfour(3), 8);
        assert_eq!(usage2arcfour(9), 8);
        assert_eq!(usage2arcfour(22), 13);
        assert_eq!(usage2arcfour(23), 15);
        assert_eq!(usage2arcfour(24), 0);
        assert_eq!(usage2arcfour(7), 7);
        assert_eq!(usage2arcfour(1026), 1026);
    }

    #[test]
    fn known_answers() {
        let key = rc4_key();
        let ct = encrypt(&key, usage2arcfour(3), b"kerberos test", &Counting).unwrap();
        assert_eq!(
            hex::encode(&ct),
            "bb7a558ee7731f7bc79cf926d731e4bbdea5381ef3f7ed30cd344cab24e89788639a8aa86e"
        );
        let ct = encrypt(&key, usage2arcfour(7), b"kerberos test", &Counting).unwrap();
        assert_eq!(
            hex::encode(&ct),
            "5591bd81b6da632d2a3490fe7751706c33aaf1fc9e9c9b25a29f0689b2d131fbb73c72ca11"
        );
    }

    #[test]
    fn round_trip_strips_confounder() {
        let key = rc4_key();
        let ct = encrypt(&key, 8, b"", &Counting).unwrap();
        assert_eq!(ct.len(), 24);
        assert_eq!(decrypt(&key, 8, &ct).unwrap(), b"");

        let ct = encrypt(&key, 8, b"attack at dawn", &Counting).unwrap();
        assert_eq!(decrypt(&key, 8, &ct).unwrap(), b"attack at dawn");
    }

    #[test]
    fn tampering_is_detected() {
        let key = rc4_key();
        let mut ct = encrypt(&key, 8, b"attack at dawn", &Counting).unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert_eq!(decrypt(&key, 8, &ct).unwrap_err(), CryptoError::BadIntegrity);

        let ct = encrypt(&key, 8, b"attack at dawn", &Counting).unwrap();
        assert_eq!(decrypt(&key, 13, &ct).unwrap_err(), CryptoError::BadIntegrity);
    }

    #[test]
    fn short_ciphertext_is_bad_size() {
        let err = decrypt(&rc4_key(), 8, &[0u8; 23]).unwrap_err();
        assert!(matches!(err, CryptoError::BadMessageSize { len: 23, .. }));
    }
}
