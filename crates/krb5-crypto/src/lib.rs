//! Kerberos 5 Cryptographic Framework
//!
//! Turns a raw symmetric key and a Kerberos encryption type into
//! authenticated encryption, keyed and unkeyed checksums, key derivation and
//! a PRF, as defined by RFC 3961 (framework), RFC 3962 (AES) and RFC 4757
//! (RC4-HMAC). Protocol message encoding is out of scope: callers hand in
//! bytes and get bytes back.
//!
//! # Architecture
//!
//! Every supported algorithm is a variant of a closed enum backed by a static
//! descriptor table. A [`CryptoContext`] binds one [`Key`] to one
//! [`Enctype`] and dispatches each call through that descriptor.
//!
//! ```text
//! password + Salt ──string_to_key──► Key ◄──random_to_key── random bytes
//!                                     │
//!                                     ▼
//!                              CryptoContext ──── derived-key cache
//!                                     │            (usage ‖ 0xAA/0x55/0x99)
//!        ┌──────────────┬─────────────┼──────────────┬──────────────┐
//!        ▼              ▼             ▼              ▼              ▼
//!     legacy         derived       special        checksum         prf
//!   (DES, 3DES)    (3DES, AES)    (RC4-HMAC)    create/verify     (AES)
//! ```
//!
//! # Security
//!
//! Integrity:
//! - Every decrypting format verifies its checksum before releasing plaintext
//! - All verification failures surface as the same [`CryptoError::BadIntegrity`]
//! - Checksums are compared in constant time
//!
//! Key hygiene:
//! - Keys, derived keys and cipher schedules are zeroized on drop
//! - [`Key`]'s `Debug` output never contains key bytes
//! - Scratch buffers holding plaintext are zeroized on every error path
//!
//! Type policy:
//! - Types can be disabled process-wide and never re-enabled
//! - Every operation re-checks the flags, including on open contexts
//!
//! # Determinism
//!
//! Confounders come from a [`RandomSource`]. Production code uses
//! [`SystemRandom`]; tests inject a fixed source to reproduce ciphertexts.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod arcfour;
pub mod checksum;
pub mod config;
pub mod context;
pub mod derive;
pub mod encryption;
pub mod error;
pub mod key;
pub mod nfold;
pub mod prf;
mod primitives;
pub mod random;
pub mod registry;
pub mod string_to_key;

pub use arcfour::usage2arcfour;
pub use checksum::{checksum_unkeyed, hmac, verify_unkeyed};
pub use config::CryptoConfig;
pub use context::CryptoContext;
pub use derive::{
    USAGE_CHECKSUM, USAGE_ENCRYPTION, USAGE_INTEGRITY, derive_key, octetstring_to_key,
    usage_constant,
};
pub use error::{CryptoError, ErrorKind, Result};
pub use key::{Checksum, Key, Salt};
pub use nfold::nfold;
pub use prf::prf_length;
pub use random::{
    RandomSource, SeededRandom, SystemRandom, generate_random_key, generate_random_key_with,
    random_to_key, set_seed_file,
};
pub use registry::{
    Cksumtype, Enctype, Keytype, SaltType, WireFormat, cksumtype_valid, enctype_valid,
    enctypes_compatible_keys, keytype_to_enctypes,
};
pub use string_to_key::{
    DEFAULT_AES_ITERATIONS, set_default_aes_iterations, string_to_key, string_to_key_derived,
    string_to_key_opaque,
};
