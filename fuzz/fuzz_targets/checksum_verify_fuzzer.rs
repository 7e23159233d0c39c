//! Fuzz target for checksum verification
//!
//! Verifies arbitrary checksum bytes of arbitrary types against arbitrary
//! data, with and without a key.
//!
//! # Invariants
//!
//! - Verification never panics on any length or type combination
//! - A checksum created by the context always verifies

#![no_main]

use arbitrary::Arbitrary;
use krb5_crypto::{
    Checksum, Cksumtype, CryptoContext, Enctype, SeededRandom, random_to_key, verify_unkeyed,
};
use libfuzzer_sys::fuzz_target;

const ENCTYPES: [Enctype; 8] = [
    Enctype::DesCbcCrc,
    Enctype::DesCbcMd4,
    Enctype::DesCbcMd5,
    Enctype::Des3CbcMd5,
    Enctype::Des3CbcSha1,
    Enctype::Aes128CtsHmacSha196,
    Enctype::Aes256CtsHmacSha196,
    Enctype::ArcfourHmacMd5,
];

#[derive(Debug, Arbitrary)]
struct ChecksumScenario {
    enctype: u8,
    cksumtype: i32,
    seed: [u8; 32],
    usage: u32,
    data: Vec<u8>,
    bytes: Vec<u8>,
}

fuzz_target!(|scenario: ChecksumScenario| {
    let Ok(cksumtype) = Cksumtype::from_id(scenario.cksumtype) else {
        return;
    };
    let forged = Checksum { cksumtype, bytes: scenario.bytes };
    let _ = verify_unkeyed(&scenario.data, &forged);

    let enctype = ENCTYPES[usize::from(scenario.enctype) % ENCTYPES.len()];
    let Ok(key) = random_to_key(enctype, &scenario.seed) else {
        return;
    };
    let rng = SeededRandom::from_seed(scenario.seed);
    let Ok(mut ctx) = CryptoContext::with_random(&key, None, rng) else {
        return;
    };
    let _ = ctx.verify_checksum(scenario.usage, &forged, &scenario.data);

    let genuine = ctx.create_checksum(scenario.usage, None, &scenario.data).expect("create");
    ctx.verify_checksum(scenario.usage, &genuine, &scenario.data).expect("genuine checksum");
});
