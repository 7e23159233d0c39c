//! Fuzz target for n-fold
//!
//! # Invariants
//!
//! - Never panics for any non-empty input and output length
//! - Output is a pure function of input and length
//! - Folding to the input's own length is the identity

#![no_main]

use arbitrary::Arbitrary;
use krb5_crypto::nfold;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct NfoldInput {
    input: Vec<u8>,
    out_len: u8,
}

fuzz_target!(|case: NfoldInput| {
    if case.input.is_empty() || case.out_len == 0 {
        return;
    }
    let mut a = vec![0u8; usize::from(case.out_len)];
    let mut b = vec![0xFFu8; usize::from(case.out_len)];
    nfold(&case.input, &mut a);
    nfold(&case.input, &mut b);
    assert_eq!(a, b);

    let mut same = vec![0u8; case.input.len()];
    nfold(&case.input, &mut same);
    assert_eq!(same, case.input);
});
