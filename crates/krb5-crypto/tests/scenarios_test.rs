//! End-to-end scenarios through the public API.

use krb5_crypto::{
    CryptoContext, CryptoError, Enctype, ErrorKind, Key, Keytype, Salt, SeededRandom, derive_key,
    generate_random_key, generate_random_key_with, keytype_to_enctypes, octetstring_to_key,
    set_seed_file, string_to_key, string_to_key_derived, string_to_key_opaque,
};

/// Keep the process-wide generator away from `$HOME/.rnd`.
fn isolate_seed_file() {
    let name = format!("krb5-crypto-scenarios-{}.rnd", std::process::id());
    set_seed_file(Some(std::env::temp_dir().join(name)));
}

/// Zero 3DES key, des3-cbc-sha1, usage 3: decrypt returns the input followed
/// by the zero padding up to the 8-byte block.
#[test]
fn des3_zero_key_round_trip() {
    isolate_seed_file();
    let key = Key::new(Enctype::Des3CbcSha1, &[0u8; 24]).unwrap();
    let mut ctx = CryptoContext::new(&key, None).unwrap();
    let ct = ctx.encrypt(3, b"hello").unwrap();
    assert_eq!(ct.len(), 8 + 8 + 20);
    assert_eq!(ctx.decrypt(3, &ct).unwrap(), b"hello\0\0\0");
    ctx.destroy();
}

/// A ciphertext shorter than one block is a size error, never a panic.
#[test]
fn ciphertext_shorter_than_a_block() {
    isolate_seed_file();
    for enctype in [
        Enctype::DesCbcCrc,
        Enctype::DesCbcMd5,
        Enctype::Des3CbcSha1,
        Enctype::Aes128CtsHmacSha196,
        Enctype::Aes256CtsHmacSha196,
        Enctype::ArcfourHmacMd5,
    ] {
        let key = generate_random_key(enctype).unwrap();
        let mut ctx = CryptoContext::new(&key, None).unwrap();
        let short = vec![0u8; enctype.blocksize().max(8) - 1];
        let err = ctx.decrypt(3, &short).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadMessageSize, "{enctype:?}");
    }
}

/// RFC 3961 A.3: DK of a 3DES key with constant "kerberos".
#[test]
fn des3_kerberos_derivation() {
    let key = Key::new(
        Enctype::Des3CbcSha1,
        &hex::decode("d3f8298ccb166438dcb9b93ee5a7629286a491f838f802fb").unwrap(),
    )
    .unwrap();
    let derived = derive_key(&key, b"kerberos").unwrap();
    assert_eq!(
        hex::encode(derived.as_bytes()),
        "2370da575d2a3da864cebfdc5204d56df779a7df43d9da43"
    );
}

/// Regression vector: DK of the all-zero 3DES key with constant "kerberos",
/// as produced by this crate. Not from a published source.
#[test]
fn zero_des3_key_kerberos_derivation() {
    let key = Key::new(Enctype::Des3CbcSha1, &[0u8; 24]).unwrap();
    let derived = derive_key(&key, b"kerberos").unwrap();
    assert_eq!(
        hex::encode(derived.as_bytes()),
        "cea22f9b522cb0156e6b64736264734f6e73cea22f9b5257"
    );
}

/// PBKDF2 with one iteration via the explicit opaque parameter (RFC 3962 B).
#[test]
fn aes_one_iteration_through_opaque() {
    let salt = Salt::pw("ATHENA.MIT.EDUraeburn");
    let key =
        string_to_key_opaque(Enctype::Aes128CtsHmacSha196, b"password", &salt, &[0, 0, 0, 1])
            .unwrap();
    assert_eq!(hex::encode(key.as_bytes()), "42263c6e89f4fc28b8df68ee09799f15");

    let key = string_to_key_opaque(Enctype::Aes256CtsHmacSha196, b"password", &salt, &[0, 0, 0, 2])
        .unwrap();
    assert_eq!(
        hex::encode(key.as_bytes()),
        "a2e16d16b36069c135d5e9d2e25f896102685618b95914b467c67622225824ff"
    );
}

#[test]
fn password_key_encrypts_for_every_enctype_sharing_its_keytype() {
    isolate_seed_file();
    let salt = Salt::for_principal("EXAMPLE.COM", &["host", "kdc.example.com"]);
    let key = string_to_key(Enctype::DesCbcMd5, b"secret", &salt).unwrap();
    for enctype in keytype_to_enctypes(Keytype::Des) {
        let mut ctx = CryptoContext::new(&key, Some(enctype)).unwrap();
        let ct = ctx.encrypt(2, b"ticket").unwrap();
        assert_eq!(&ctx.decrypt(2, &ct).unwrap()[..6], b"ticket", "{enctype:?}");
    }
}

#[test]
fn seeded_random_keys_are_reproducible() {
    let a = generate_random_key_with(Enctype::Des3CbcSha1, &SeededRandom::from_seed([7; 32]))
        .unwrap();
    let b = generate_random_key_with(Enctype::Des3CbcSha1, &SeededRandom::from_seed([7; 32]))
        .unwrap();
    assert_eq!(a, b);
    assert!(a.as_bytes().iter().all(|b| b.count_ones() % 2 == 1));
}

#[test]
fn system_random_keys_differ() {
    isolate_seed_file();
    let a = generate_random_key(Enctype::Aes256CtsHmacSha196).unwrap();
    let b = generate_random_key(Enctype::Aes256CtsHmacSha196).unwrap();
    assert_ne!(a, b);
}

#[test]
fn derived_string_to_key_matches_password_path() {
    let from_password = string_to_key(
        Enctype::Des3CbcSha1,
        b"password",
        &Salt::pw("ATHENA.MIT.EDUraeburn"),
    )
    .unwrap();
    let from_bytes =
        string_to_key_derived(Enctype::Des3CbcSha1, b"passwordATHENA.MIT.EDUraeburn").unwrap();
    assert_eq!(from_password, from_bytes);
}

#[test]
fn pkinit_des_key_feeds_a_context() {
    isolate_seed_file();
    let key = octetstring_to_key(Enctype::DesCbcMd5, b"dh shared secret", None, None).unwrap();
    assert_eq!(key.as_bytes().len(), 8);
    let mut ctx = CryptoContext::new(&key, None).unwrap();
    let ct = ctx.encrypt(3, b"as-rep").unwrap();
    assert_eq!(&ctx.decrypt(3, &ct).unwrap()[..6], b"as-rep");
}

#[test]
fn pkinit_key_feeds_a_context() {
    isolate_seed_file();
    let key =
        octetstring_to_key(Enctype::Aes128CtsHmacSha196, b"dh shared secret", None, None).unwrap();
    let mut ctx = CryptoContext::new(&key, None).unwrap();
    let ct = ctx.encrypt(3, b"as-rep").unwrap();
    assert_eq!(ctx.decrypt(3, &ct).unwrap(), b"as-rep");
}

#[test]
fn wrong_key_is_an_integrity_failure() {
    isolate_seed_file();
    let alice = generate_random_key(Enctype::Aes128CtsHmacSha196).unwrap();
    let mallory = generate_random_key(Enctype::Aes128CtsHmacSha196).unwrap();
    let ct = CryptoContext::new(&alice, None).unwrap().encrypt(11, b"authenticator").unwrap();
    let err = CryptoContext::new(&mallory, None).unwrap().decrypt(11, &ct).unwrap_err();
    assert_eq!(err, CryptoError::BadIntegrity);
}
