//! Fuzz target for CryptoContext::decrypt
//!
//! Feeds arbitrary ciphertexts to every encryption type.
//!
//! # Invariants
//!
//! - Decryption never panics, only returns an error
//! - Arbitrary ciphertext almost never passes the integrity check
//! - A genuine ciphertext for the same key always decrypts to its plaintext,
//!   followed by less than one pad unit of zeros

#![no_main]

use arbitrary::Arbitrary;
use krb5_crypto::{CryptoContext, Enctype, SeededRandom, random_to_key};
use libfuzzer_sys::fuzz_target;

const ENCTYPES: [Enctype; 11] = [
    Enctype::DesCbcCrc,
    Enctype::DesCbcMd4,
    Enctype::DesCbcMd5,
    Enctype::DesCbcNone,
    Enctype::DesCfb64None,
    Enctype::DesPcbcNone,
    Enctype::Des3CbcMd5,
    Enctype::Des3CbcSha1,
    Enctype::Aes128CtsHmacSha196,
    Enctype::Aes256CtsHmacSha196,
    Enctype::ArcfourHmacMd5,
];

#[derive(Debug, Arbitrary)]
struct DecryptScenario {
    enctype: u8,
    seed: [u8; 32],
    usage: u32,
    ciphertext: Vec<u8>,
    plaintext: Vec<u8>,
}

fuzz_target!(|scenario: DecryptScenario| {
    let enctype = ENCTYPES[usize::from(scenario.enctype) % ENCTYPES.len()];
    let Ok(key) = random_to_key(enctype, &scenario.seed) else {
        return;
    };
    let rng = SeededRandom::from_seed(scenario.seed);
    let Ok(mut ctx) = CryptoContext::with_random(&key, None, rng) else {
        return;
    };

    let _ = ctx.decrypt(scenario.usage, &scenario.ciphertext);

    let ct = ctx.encrypt(scenario.usage, &scenario.plaintext).expect("encrypt must succeed");
    let pt = ctx.decrypt(scenario.usage, &ct).expect("genuine ciphertext must decrypt");
    if enctype.padsize() > 1 {
        let len = scenario.plaintext.len();
        assert!(pt.len() >= len && pt.len() - len < enctype.padsize());
        assert_eq!(&pt[..len], &scenario.plaintext[..]);
        assert!(pt[len..].iter().all(|&b| b == 0));
    } else {
        assert_eq!(pt, scenario.plaintext);
    }
});
