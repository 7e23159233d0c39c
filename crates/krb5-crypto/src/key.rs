//! Keys, salts and checksums

use std::{cell::OnceCell, fmt};

use zeroize::Zeroizing;

use crate::{
    error::{CryptoError, Result},
    primitives::Schedule,
    registry::{Cksumtype, Enctype, SaltType},
};

/// Symmetric key tagged with its encryption type.
///
/// Key bytes are zeroized on drop. `Debug` does not print them.
#[derive(Clone, PartialEq, Eq)]
pub struct Key {
    enctype: Enctype,
    bytes: Zeroizing<Vec<u8>>,
}

impl Key {
    /// Wrap raw key material, checking its length against the key type.
    pub fn new(enctype: Enctype, bytes: &[u8]) -> Result<Self> {
        let expected = enctype.keysize();
        if bytes.len() != expected {
            return Err(CryptoError::BadKeySize { expected, actual: bytes.len() });
        }
        Ok(Self { enctype, bytes: Zeroizing::new(bytes.to_vec()) })
    }

    pub(crate) fn from_vec(enctype: Enctype, bytes: Zeroizing<Vec<u8>>) -> Self {
        Self { enctype, bytes }
    }

    /// Encryption type this key belongs to.
    pub fn enctype(&self) -> Enctype {
        self.enctype
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Same key bytes, relabelled with a compatible encryption type.
    pub fn with_enctype(&self, enctype: Enctype) -> Result<Self> {
        Self::new(enctype, &self.bytes)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("enctype", &self.enctype)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// A key plus its cipher schedule, expanded on first use.
pub(crate) struct KeyData {
    key: Key,
    schedule: OnceCell<Schedule>,
}

impl KeyData {
    pub(crate) fn new(key: Key) -> Self {
        Self { key, schedule: OnceCell::new() }
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn schedule(&self) -> Result<&Schedule> {
        if let Some(schedule) = self.schedule.get() {
            return Ok(schedule);
        }
        let schedule = Schedule::new(self.key.enctype().keytype(), self.key.as_bytes())?;
        Ok(self.schedule.get_or_init(|| schedule))
    }
}

/// String-to-key salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt {
    /// How `value` is interpreted
    pub salt_type: SaltType,
    /// Salt bytes: realm and principal components, or an AFS cell name
    pub value: Vec<u8>,
    /// Algorithm parameter (AES iteration count, DES AFS3 selector). Empty means default.
    pub opaque: Vec<u8>,
}

impl Salt {
    /// Standard password salt.
    pub fn pw(value: impl Into<Vec<u8>>) -> Self {
        Self { salt_type: SaltType::Pw, value: value.into(), opaque: Vec::new() }
    }

    /// AFS3 salt carrying a cell name.
    pub fn afs3(cell: impl Into<Vec<u8>>) -> Self {
        Self { salt_type: SaltType::Afs3, value: cell.into(), opaque: Vec::new() }
    }

    /// Same salt with an explicit algorithm parameter.
    #[must_use]
    pub fn with_opaque(mut self, opaque: impl Into<Vec<u8>>) -> Self {
        self.opaque = opaque.into();
        self
    }

    /// Default salt for a principal: realm followed by each component, no separators.
    pub fn for_principal<S: AsRef<[u8]>>(realm: &str, components: &[S]) -> Self {
        let mut value = realm.as_bytes().to_vec();
        for c in components {
            value.extend_from_slice(c.as_ref());
        }
        Self::pw(value)
    }
}

/// Checksum value tagged with its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    /// Algorithm that produced `bytes`
    pub cksumtype: Cksumtype,
    /// Checksum value
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_length_is_checked() {
        assert!(Key::new(Enctype::DesCbcMd5, &[0u8; 8]).is_ok());
        assert_eq!(
            Key::new(Enctype::Aes256CtsHmacSha196, &[0u8; 16]).unwrap_err(),
            CryptoError::BadKeySize { expected: 32, actual: 16 }
        );
    }

    #[test]
    fn debug_hides_key_bytes() {
        let key = Key::new(Enctype::DesCbcMd5, &[0xAB; 8]).unwrap();
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("171"));
        assert!(!dbg.to_lowercase().contains("ab, "));
        assert!(dbg.contains("DesCbcMd5"));
    }

    #[test]
    fn principal_salt_concatenates_components() {
        let salt = Salt::for_principal("ATHENA.MIT.EDU", &["raeburn"]);
        assert_eq!(salt.value, b"ATHENA.MIT.EDUraeburn");
        assert_eq!(salt.salt_type, SaltType::Pw);
        assert!(salt.opaque.is_empty());

        let salt = Salt::for_principal("EXAMPLE.COM", &["host", "www.example.com"]);
        assert_eq!(salt.value, b"EXAMPLE.COMhostwww.example.com");
    }

    #[test]
    fn schedule_is_built_once() {
        let data = KeyData::new(Key::new(Enctype::Aes128CtsHmacSha196, &[9u8; 16]).unwrap());
        let first: *const Schedule = data.schedule().unwrap();
        let second: *const Schedule = data.schedule().unwrap();
        assert_eq!(first, second);
        assert_eq!(data.key().as_bytes(), [9u8; 16]);
    }

    #[test]
    fn arcfour_key_has_no_schedule() {
        let data = KeyData::new(Key::new(Enctype::ArcfourHmacMd5, &[9u8; 16]).unwrap());
        assert!(data.schedule().unwrap_err().is_fatal());
    }

    #[test]
    fn relabel_requires_same_length() {
        let key = Key::new(Enctype::DesCbcCrc, &[1u8; 8]).unwrap();
        assert_eq!(key.with_enctype(Enctype::DesCbcMd5).unwrap().enctype(), Enctype::DesCbcMd5);
        assert!(key.with_enctype(Enctype::Aes128CtsHmacSha196).is_err());
    }
}
