//! Randomness and random keys
//!
//! Confounders and fresh keys come from a [`RandomSource`]. The production
//! source is [`SystemRandom`]: a master seed is derived once per process from
//! the OS and, when present, a seed file. Each thread then runs its own
//! `ChaCha20` generator on a distinct stream of that seed, so no lock is held
//! while bytes are generated. Tests plug in their own source to make
//! encryption output reproducible.
//!
//! ```text
//! getrandom ──┐
//!             ├─► SHA-256 ─► master seed (once) ─┬─► thread A: ChaCha20, stream 0
//! seed file ──┘                 │                 ├─► thread B: ChaCha20, stream 1
//!     ▲                         │                 └─► ...
//!     └──── refreshed ◄─────────┘
//! ```

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    sync::{
        Mutex, OnceLock, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::{
    error::{CryptoError, Result, try_alloc},
    key::Key,
    primitives::des::{des3_random_to_key, fix_weak_key, is_weak_key, set_odd_parity},
    registry::{Enctype, Keytype},
};

/// Largest prefix of the seed file mixed into the master seed.
const SEED_FILE_BYTES: usize = 1024;

/// Stream reserved for refreshing the seed file.
const SEED_FILE_STREAM: u64 = u64::MAX;

static MASTER_SEED: OnceLock<Zeroizing<[u8; 32]>> = OnceLock::new();
static NEXT_STREAM: AtomicU64 = AtomicU64::new(0);
static SEED_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);

thread_local! {
    static THREAD_RNG: RefCell<Option<ChaCha20Rng>> = const { RefCell::new(None) };
}

/// Supplier of random bytes.
pub trait RandomSource: Send + Sync {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Production sources are cryptographically secure
    /// - Deterministic sources produce the same bytes for the same seed
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Process-wide cryptographic generator.
///
/// Seeding happens on first use, exactly once. Failures while seeding are
/// logged and never fatal: a missing seed file is normal, and if the OS RNG
/// is unavailable the seed falls back to the seed file and clock with a
/// warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn random_bytes(&self, buffer: &mut [u8]) {
        THREAD_RNG.with(|cell| {
            let mut slot = cell.borrow_mut();
            let rng = slot.get_or_insert_with(|| {
                let seed = MASTER_SEED.get_or_init(seed_master);
                let mut rng = ChaCha20Rng::from_seed(**seed);
                rng.set_stream(NEXT_STREAM.fetch_add(1, Ordering::Relaxed));
                rng
            });
            rng.fill_bytes(buffer);
        });
    }
}

/// Deterministic generator for simulation and tests.
pub struct SeededRandom {
    rng: Mutex<ChaCha20Rng>,
}

impl SeededRandom {
    /// Generator whose output depends only on `seed`.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { rng: Mutex::new(ChaCha20Rng::from_seed(seed)) }
    }
}

impl RandomSource for SeededRandom {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

/// Override the seed file consulted when the process-wide generator is first
/// used. `None` restores the default (`$RANDFILE`, then `$HOME/.rnd`).
///
/// Has no effect once the generator is seeded.
pub fn set_seed_file(path: Option<PathBuf>) {
    if MASTER_SEED.get().is_some() {
        debug!("generator already seeded, seed file setting ignored");
    }
    *SEED_FILE.lock().unwrap_or_else(PoisonError::into_inner) = path;
}

fn seed_file_path() -> Option<PathBuf> {
    if let Some(path) = SEED_FILE.lock().unwrap_or_else(PoisonError::into_inner).clone() {
        return Some(path);
    }
    if let Some(path) = std::env::var_os("RANDFILE") {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".rnd"))
}

fn seed_master() -> Zeroizing<[u8; 32]> {
    seed_from(seed_file_path().as_deref())
}

/// Mix OS entropy and the seed file at `path`, then refresh that file.
fn seed_from(path: Option<&Path>) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha256::new();

    let mut os = Zeroizing::new([0u8; 32]);
    let os_ok = match getrandom::fill(os.as_mut_slice()) {
        Ok(()) => {
            hasher.update(os.as_slice());
            true
        },
        Err(error) => {
            warn!(%error, "OS entropy unavailable, seeding from seed file and clock");
            let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos());
            hasher.update(nanos.to_le_bytes());
            hasher.update(std::process::id().to_le_bytes());
            false
        },
    };

    // The seed file is untrusted. It is mixed in, never used alone.
    let seed_file = path.and_then(|path| match fs::read(path) {
        Ok(bytes) => {
            hasher.update(&bytes[..bytes.len().min(SEED_FILE_BYTES)]);
            Some(path)
        },
        Err(error) => {
            debug!(path = %path.display(), %error, "no usable seed file");
            None
        },
    });
    if !os_ok && seed_file.is_none() {
        warn!("random generator seeded without OS entropy or seed file");
    }

    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&hasher.finalize());

    if let Some(path) = seed_file {
        let mut rng = ChaCha20Rng::from_seed(*seed);
        rng.set_stream(SEED_FILE_STREAM);
        let mut fresh = Zeroizing::new([0u8; SEED_FILE_BYTES]);
        rng.fill_bytes(fresh.as_mut_slice());
        if let Err(error) = fs::write(path, fresh.as_slice()) {
            warn!(path = %path.display(), %error, "failed to refresh seed file");
        }
    }
    debug!(os_entropy = os_ok, seed_file = seed_file.is_some(), "random generator seeded");
    seed
}

/// Bytes of random input needed to build a key of `keytype`.
pub(crate) fn random_input_len(keytype: Keytype) -> usize {
    match keytype {
        Keytype::Des3 => 21,
        _ => keytype.size(),
    }
}

/// Turn uniformly random bytes into a key.
///
/// DES keys get odd parity and weak keys fixed. Triple-DES expands 21 bytes
/// into 24. Other key types copy the leading key-length bytes.
pub fn random_to_key(enctype: Enctype, data: &[u8]) -> Result<Key> {
    let keytype = enctype.keytype();
    let needed = random_input_len(keytype);
    if data.len() < needed {
        return Err(CryptoError::InsufficientRandom { needed, actual: data.len() });
    }

    let mut bytes = try_alloc(keytype.size())?;
    match keytype {
        Keytype::Des => {
            bytes.copy_from_slice(&data[..8]);
            set_odd_parity(&mut bytes);
            fix_weak_key(&mut bytes);
        },
        Keytype::Des3 => {
            let mut input = Zeroizing::new([0u8; 21]);
            input.copy_from_slice(&data[..21]);
            let mut out = Zeroizing::new([0u8; 24]);
            des3_random_to_key(&input, &mut out);
            bytes.copy_from_slice(out.as_slice());
        },
        Keytype::Null | Keytype::Aes128 | Keytype::Aes256 | Keytype::Arcfour => {
            bytes.copy_from_slice(&data[..needed]);
        },
    }
    Ok(Key::from_vec(enctype, bytes))
}

/// Fresh random key from the process-wide generator.
pub fn generate_random_key(enctype: Enctype) -> Result<Key> {
    generate_random_key_with(enctype, &SystemRandom)
}

/// Fresh random key from `rng`.
///
/// DES and triple-DES keys are redrawn until no component is weak.
pub fn generate_random_key_with<R: RandomSource + ?Sized>(
    enctype: Enctype,
    rng: &R,
) -> Result<Key> {
    let mut bytes = try_alloc(enctype.keysize())?;
    match enctype.keytype() {
        Keytype::Des | Keytype::Des3 => loop {
            rng.random_bytes(&mut bytes);
            set_odd_parity(&mut bytes);
            if !bytes.chunks_exact(8).any(is_weak_key) {
                break;
            }
            debug!(enctype = enctype.name(), "drew weak DES key, retrying");
        },
        _ => rng.random_bytes(&mut bytes),
    }
    Ok(Key::from_vec(enctype, bytes))
}
