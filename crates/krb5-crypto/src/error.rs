//! Error types for the crypto framework

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Coarse error category.
///
/// Callers that only need to decide between "try another enctype", "reject
/// the message" and "report a bug" match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown or administratively disabled type, or an operation the type
    /// does not provide.
    Unsupported,
    /// Key length does not match its key type.
    BadKeySize,
    /// Ciphertext length is not aligned or shorter than the mandatory overhead.
    BadMessageSize,
    /// Checksum verification failed.
    Integrity,
    /// Caller supplied a malformed parameter (string-to-key opaque, random input).
    InvalidInput,
    /// Allocation failed.
    ResourceExhausted,
    /// Internal invariant violated.
    Internal,
}

/// Errors from Kerberos crypto operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Encryption type is unknown or disabled
    #[error("encryption type {enctype} not supported")]
    UnsupportedEnctype {
        /// Protocol id of the encryption type
        enctype: i32,
    },

    /// Checksum type is unknown or disabled
    #[error("checksum type {cksumtype} not supported")]
    UnsupportedChecksum {
        /// Protocol id of the checksum type
        cksumtype: i32,
    },

    /// Key type is unknown
    #[error("key type {keytype} not supported")]
    UnsupportedKeytype {
        /// Protocol id of the key type
        keytype: i32,
    },

    /// Salt type is unknown or not usable with the key type
    #[error("salt type {salttype} not supported")]
    UnsupportedSaltType {
        /// Protocol id of the salt type
        salttype: i32,
    },

    /// No type is registered under this name
    #[error("unknown type name: {name}")]
    UnknownName {
        /// The name that was looked up
        name: String,
    },

    /// A keyed checksum was requested without key material
    #[error("checksum type {cksumtype} is keyed but no key was given")]
    KeyedChecksumWithoutKey {
        /// Protocol id of the checksum type
        cksumtype: i32,
    },

    /// The encryption type defines no PRF
    #[error("prf not supported for encryption type {enctype}")]
    PrfUnsupported {
        /// Protocol id of the encryption type
        enctype: i32,
    },

    /// Key length does not match the key type
    #[error("bad key size: expected {expected}, got {actual}")]
    BadKeySize {
        /// Byte length the key type requires
        expected: usize,
        /// Byte length that was supplied
        actual: usize,
    },

    /// Ciphertext length is invalid for the encryption type
    #[error("bad message size {len}: {reason}")]
    BadMessageSize {
        /// Length of the rejected buffer
        len: usize,
        /// Which length rule was violated
        reason: &'static str,
    },

    /// Checksum mismatch. Carries no detail on purpose.
    #[error("integrity check failed")]
    BadIntegrity,

    /// String-to-key opaque parameter has an invalid length
    #[error("invalid string-to-key parameter of {len} bytes")]
    InvalidOpaque {
        /// Length of the supplied opaque parameter
        len: usize,
    },

    /// PBKDF2 iteration count of zero
    #[error("string-to-key iteration count must be at least 1")]
    ZeroIterations,

    /// Not enough random input to build a key
    #[error("random-to-key needs {needed} bytes, got {actual}")]
    InsufficientRandom {
        /// Minimum byte length
        needed: usize,
        /// Byte length that was supplied
        actual: usize,
    },

    /// Buffer allocation failed
    #[error("out of memory allocating {requested} bytes")]
    ResourceExhausted {
        /// Requested allocation size
        requested: usize,
    },

    /// Internal invariant violated
    #[error("internal crypto error: {reason}")]
    Internal {
        /// Which invariant failed
        reason: &'static str,
    },
}

impl CryptoError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedEnctype { .. }
            | Self::UnsupportedChecksum { .. }
            | Self::UnsupportedKeytype { .. }
            | Self::UnsupportedSaltType { .. }
            | Self::UnknownName { .. }
            | Self::KeyedChecksumWithoutKey { .. }
            | Self::PrfUnsupported { .. } => ErrorKind::Unsupported,
            Self::BadKeySize { .. } => ErrorKind::BadKeySize,
            Self::BadMessageSize { .. } => ErrorKind::BadMessageSize,
            Self::BadIntegrity => ErrorKind::Integrity,
            Self::InvalidOpaque { .. }
            | Self::ZeroIterations
            | Self::InsufficientRandom { .. } => ErrorKind::InvalidInput,
            Self::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Only internal invariant violations are fatal. Everything else is a
    /// property of the input and the caller may fall back to another type.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Allocate a zero-filled buffer, surfacing allocation failure as an error.
pub(crate) fn try_alloc(len: usize) -> Result<zeroize::Zeroizing<Vec<u8>>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| CryptoError::ResourceExhausted { requested: len })?;
    buf.resize(len, 0);
    Ok(zeroize::Zeroizing::new(buf))
}

/// Hand a finished buffer to the caller without copying it.
pub(crate) fn release(mut buf: zeroize::Zeroizing<Vec<u8>>) -> Vec<u8> {
    std::mem::take(&mut *buf)
}
