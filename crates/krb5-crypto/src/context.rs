//! Crypto context
//!
//! A [`CryptoContext`] binds one key to one encryption type. Derived keys
//! are computed on first use and memoized for the life of the context, keyed
//! by the full five-byte derivation constant.
//!
//! ```text
//! CryptoContext
//! ├── enctype      (re-checked against the disable flags on every call)
//! ├── key          (base key + lazily expanded schedule)
//! ├── derived      {usage‖0xAA → Ke, usage‖0x55 → Ki, usage‖0x99 → Kc, ...}
//! └── rng          (confounders, variant checksum confounders)
//! ```
//!
//! Encryption and decryption live in [`crate::encryption`].

use std::collections::{HashMap, hash_map::Entry};

use tracing::debug;

use crate::{
    arcfour::usage2arcfour,
    checksum,
    derive::{USAGE_CHECKSUM, derive_bytes, usage_constant},
    error::{CryptoError, Result},
    key::{Checksum, Key, KeyData},
    prf,
    random::{RandomSource, SystemRandom},
    registry::{ChecksumAlg, Cksumtype, Enctype, Keying, Keytype},
};

/// A key bound to an encryption type, with its derived-key cache.
///
/// Dropping the context wipes the base key, every derived key and every
/// expanded schedule.
pub struct CryptoContext<R: RandomSource = SystemRandom> {
    pub(crate) enctype: Enctype,
    pub(crate) key: KeyData,
    pub(crate) derived: HashMap<[u8; 5], KeyData>,
    pub(crate) rng: R,
}

impl CryptoContext<SystemRandom> {
    /// Create a context for `key`. `enctype` defaults to the key's own.
    pub fn new(key: &Key, enctype: Option<Enctype>) -> Result<Self> {
        Self::with_random(key, enctype, SystemRandom)
    }
}

impl<R: RandomSource> CryptoContext<R> {
    /// Create a context drawing confounders from `rng`.
    pub fn with_random(key: &Key, enctype: Option<Enctype>, rng: R) -> Result<Self> {
        let enctype = enctype.unwrap_or(key.enctype()).ensure_enabled()?;
        let key = key.with_enctype(enctype)?;
        debug!(enctype = enctype.name(), "crypto context created");
        Ok(Self { enctype, key: KeyData::new(key), derived: HashMap::new(), rng })
    }

    /// Wipe all key material. Dropping the context does the same.
    pub fn destroy(self) {
        drop(self);
    }

    /// Encryption type of this context.
    pub fn enctype(&self) -> Enctype {
        self.enctype
    }

    /// Cipher block size in bytes.
    pub fn blocksize(&self) -> usize {
        self.enctype.blocksize()
    }

    /// Plaintext padding granularity in bytes.
    pub fn padsize(&self) -> usize {
        self.enctype.padsize()
    }

    /// Confounder length in bytes.
    pub fn confounder_size(&self) -> usize {
        self.enctype.confounder_size()
    }

    /// Checksum type used when none is requested: the keyed one if the
    /// encryption type has one, otherwise the unkeyed one.
    pub fn checksum_type(&self) -> Cksumtype {
        self.enctype.keyed_checksum_type().unwrap_or(self.enctype.checksum_type())
    }

    /// Checksum `data` for `usage`.
    pub fn create_checksum(
        &mut self,
        usage: u32,
        cksumtype: Option<Cksumtype>,
        data: &[u8],
    ) -> Result<Checksum> {
        self.enctype.ensure_enabled()?;
        let cksumtype = cksumtype.unwrap_or(self.checksum_type()).ensure_enabled()?;
        let (key, alg_usage) =
            checksum_key(&self.key, &mut self.derived, self.enctype, cksumtype, usage)?;
        let bytes = checksum::compute(cksumtype, key, alg_usage, data, &self.rng)?;
        if bytes.len() != cksumtype.size() {
            return Err(CryptoError::Internal { reason: "checksum produced the wrong length" });
        }
        Ok(Checksum { cksumtype, bytes })
    }

    /// Verify `checksum` over `data` for `usage`.
    ///
    /// Every mismatch, including a wrong length, is `BadIntegrity`.
    pub fn verify_checksum(&mut self, usage: u32, checksum: &Checksum, data: &[u8]) -> Result<()> {
        self.enctype.ensure_enabled()?;
        let cksumtype = checksum.cksumtype.ensure_enabled()?;
        let (key, alg_usage) =
            checksum_key(&self.key, &mut self.derived, self.enctype, cksumtype, usage)?;
        checksum::verify(cksumtype, key, alg_usage, data, &checksum.bytes).inspect_err(|e| {
            if *e == CryptoError::BadIntegrity {
                debug!(cksumtype = cksumtype.name(), usage, "checksum verification failed");
            }
        })
    }

    /// Pseudo-random function output for `input`.
    pub fn prf(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.enctype.ensure_enabled()?;
        prf::prf(self.enctype, self.key.key(), input)
    }

    /// Output length of [`Self::prf`].
    pub fn prf_length(&self) -> Result<usize> {
        prf::prf_length(self.enctype)
    }
}

impl<R: RandomSource> Drop for CryptoContext<R> {
    fn drop(&mut self) {
        debug!(
            enctype = self.enctype.name(),
            derived = self.derived.len(),
            "crypto context destroyed"
        );
    }
}

/// Memoized derived key for `constant`.
pub(crate) fn derived_key<'a>(
    base: &KeyData,
    cache: &'a mut HashMap<[u8; 5], KeyData>,
    constant: [u8; 5],
) -> Result<&'a KeyData> {
    match cache.entry(constant) {
        Entry::Occupied(e) => Ok(e.into_mut()),
        Entry::Vacant(e) => {
            let key = base.key();
            let keytype = key.enctype().keytype();
            let bytes = derive_bytes(base.schedule()?, keytype, &constant)?;
            debug!(constant = ?constant, "derived key cached");
            Ok(e.insert(KeyData::new(Key::from_vec(key.enctype(), bytes))))
        },
    }
}

/// Pick the key a checksum algorithm consumes and the usage number it sees.
fn checksum_key<'a>(
    base: &'a KeyData,
    cache: &'a mut HashMap<[u8; 5], KeyData>,
    enctype: Enctype,
    cksumtype: Cksumtype,
    usage: u32,
) -> Result<(Option<&'a Key>, u32)> {
    let info = cksumtype.info();
    if info.keying == Keying::None {
        return Ok((None, 0));
    }

    let alg_usage = if info.alg == ChecksumAlg::HmacMd5 && enctype.keytype() == Keytype::Arcfour {
        usage2arcfour(usage)
    } else {
        (usage << 8) | u32::from(USAGE_CHECKSUM)
    };

    if info.keying == Keying::Derived {
        if !matches!(enctype.keytype(), Keytype::Des3 | Keytype::Aes128 | Keytype::Aes256) {
            return Err(CryptoError::UnsupportedChecksum { cksumtype: cksumtype.id() });
        }
        let kc = derived_key(base, cache, usage_constant(usage, USAGE_CHECKSUM))?;
        return Ok((Some(kc.key()), alg_usage));
    }
    Ok((Some(base.key()), alg_usage))
}
