//! Static type registry
//!
//! Every encryption, checksum, key and salt type the framework knows is a
//! variant of a closed enum. Each variant maps to one immutable descriptor in
//! a table built at compile time. The only mutable state is one "disabled"
//! flag per encryption and checksum type, which can be set but never cleared.
//!
//! ```text
//! Enctype ──► EnctypeInfo ─┬─► Keytype   (key length, string-to-key family)
//!                          ├─► Cksumtype (unkeyed, used by legacy format)
//!                          ├─► Cksumtype (keyed, optional)
//!                          └─► CipherMode / WireFormat
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{CryptoError, Result};

/// Encryption types, in registry (preference) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Enctype {
    /// `null` (always disabled)
    Null,
    /// `des-cbc-crc`
    DesCbcCrc,
    /// `des-cbc-md4`
    DesCbcMd4,
    /// `des-cbc-md5`
    DesCbcMd5,
    /// `arcfour-hmac-md5` (RFC 4757)
    ArcfourHmacMd5,
    /// `des3-cbc-md5`
    Des3CbcMd5,
    /// `des3-cbc-sha1` (RFC 3961 derived)
    Des3CbcSha1,
    /// `old-des3-cbc-sha1`
    OldDes3CbcSha1,
    /// `aes128-cts-hmac-sha1-96` (RFC 3962)
    Aes128CtsHmacSha196,
    /// `aes256-cts-hmac-sha1-96` (RFC 3962)
    Aes256CtsHmacSha196,
    /// `des-cbc-none` pseudo type
    DesCbcNone,
    /// `des-cfb64-none` pseudo type
    DesCfb64None,
    /// `des-pcbc-none` pseudo type
    DesPcbcNone,
    /// `des3-cbc-none` pseudo type
    Des3CbcNone,
}

/// Checksum types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cksumtype {
    /// `none`
    None,
    /// `crc32`
    Crc32,
    /// `rsa-md4`
    RsaMd4,
    /// `rsa-md4-des`
    RsaMd4Des,
    /// `rsa-md5`
    RsaMd5,
    /// `rsa-md5-des`
    RsaMd5Des,
    /// `rsa-md5-des3`
    RsaMd5Des3,
    /// `sha1`
    Sha1,
    /// `hmac-sha1-des3`
    HmacSha1Des3,
    /// `hmac-sha1-96-aes128`
    HmacSha196Aes128,
    /// `hmac-sha1-96-aes256`
    HmacSha196Aes256,
    /// `hmac-md5` (RFC 4757)
    HmacMd5,
    /// `hmac-md5-enc` pseudo type
    HmacMd5Enc,
}

/// Key types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keytype {
    /// No key
    Null,
    /// Single DES
    Des,
    /// Triple DES (EDE3)
    Des3,
    /// AES with a 128-bit key
    Aes128,
    /// AES with a 256-bit key
    Aes256,
    /// RC4 with an MD4 password hash
    Arcfour,
}

/// Salt types for string-to-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaltType {
    /// Standard password salt (realm and principal components)
    Pw,
    /// AFS3 salt (cell name)
    Afs3,
}

/// Layout of an encrypted buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `confounder ‖ checksum ‖ plaintext ‖ pad`, all encrypted under the base key
    Legacy,
    /// `E(confounder ‖ plaintext ‖ pad) ‖ HMAC`, RFC 3961 derived keys
    Derived,
    /// `HMAC ‖ RC4(confounder ‖ plaintext)`, RFC 4757
    Special,
}

/// Block or stream construction used by an encryption type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CipherMode {
    Identity,
    DesCbcKeyIv,
    DesCbcZeroIv,
    Des3Cbc,
    DesCfb64,
    DesPcbcKeyIv,
    AesCts,
    Rc4Hmac,
}

/// String-to-key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum S2kFamily {
    None,
    Des,
    Des3,
    Des3Derived,
    Aes,
    Arcfour,
}

/// Digest or MAC construction behind a checksum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChecksumAlg {
    None,
    Crc32,
    Md4,
    Md5,
    Sha1,
    Md4Des,
    Md5Des,
    Md5Des3,
    HmacSha1,
    HmacMd5,
    HmacMd5Enc,
}

pub(crate) struct EnctypeInfo {
    pub(crate) id: i32,
    pub(crate) name: &'static str,
    pub(crate) blocksize: usize,
    pub(crate) padsize: usize,
    pub(crate) confounder_size: usize,
    pub(crate) keytype: Keytype,
    pub(crate) checksum: Cksumtype,
    pub(crate) keyed_checksum: Option<Cksumtype>,
    pub(crate) format: WireFormat,
    pub(crate) pseudo: bool,
    pub(crate) cipher: CipherMode,
    pub(crate) s2k: S2kFamily,
    pub(crate) prf_length: usize,
}

/// Which key a checksum consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keying {
    /// No key
    None,
    /// The base key as is
    Direct,
    /// Kc derived from the base key per usage
    Derived,
    /// The base key XOR 0xF0, confounded and encrypted with DES/DES3 CBC
    Variant,
}

pub(crate) struct ChecksumInfo {
    pub(crate) id: i32,
    pub(crate) name: &'static str,
    pub(crate) size: usize,
    pub(crate) collision_proof: bool,
    pub(crate) keying: Keying,
    pub(crate) alg: ChecksumAlg,
}

pub(crate) struct KeytypeInfo {
    pub(crate) id: i32,
    pub(crate) name: &'static str,
    pub(crate) bits: usize,
    pub(crate) size: usize,
}

const fn legacy(
    id: i32,
    name: &'static str,
    keytype: Keytype,
    checksum: Cksumtype,
    keyed_checksum: Option<Cksumtype>,
    cipher: CipherMode,
    s2k: S2kFamily,
) -> EnctypeInfo {
    EnctypeInfo {
        id,
        name,
        blocksize: 8,
        padsize: 8,
        confounder_size: 8,
        keytype,
        checksum,
        keyed_checksum,
        format: WireFormat::Legacy,
        pseudo: false,
        cipher,
        s2k,
        prf_length: 0,
    }
}

const fn pseudo(
    id: i32,
    name: &'static str,
    block: usize,
    keytype: Keytype,
    cipher: CipherMode,
    s2k: S2kFamily,
) -> EnctypeInfo {
    EnctypeInfo {
        id,
        name,
        blocksize: block,
        padsize: block,
        confounder_size: 0,
        keytype,
        checksum: Cksumtype::None,
        keyed_checksum: None,
        format: WireFormat::Legacy,
        pseudo: true,
        cipher,
        s2k,
        prf_length: 0,
    }
}

const fn aes(id: i32, name: &'static str, keytype: Keytype, keyed: Cksumtype) -> EnctypeInfo {
    EnctypeInfo {
        id,
        name,
        blocksize: 16,
        padsize: 1,
        confounder_size: 16,
        keytype,
        checksum: Cksumtype::Sha1,
        keyed_checksum: Some(keyed),
        format: WireFormat::Derived,
        pseudo: false,
        cipher: CipherMode::AesCts,
        s2k: S2kFamily::Aes,
        prf_length: 16,
    }
}

static ENCTYPES: [EnctypeInfo; Enctype::ALL.len()] = [
    EnctypeInfo {
        id: 0,
        name: "null",
        blocksize: 1,
        padsize: 1,
        confounder_size: 0,
        keytype: Keytype::Null,
        checksum: Cksumtype::None,
        keyed_checksum: None,
        format: WireFormat::Legacy,
        pseudo: false,
        cipher: CipherMode::Identity,
        s2k: S2kFamily::None,
        prf_length: 0,
    },
    legacy(
        1,
        "des-cbc-crc",
        Keytype::Des,
        Cksumtype::Crc32,
        None,
        CipherMode::DesCbcKeyIv,
        S2kFamily::Des,
    ),
    legacy(
        2,
        "des-cbc-md4",
        Keytype::Des,
        Cksumtype::RsaMd4,
        Some(Cksumtype::RsaMd4Des),
        CipherMode::DesCbcZeroIv,
        S2kFamily::Des,
    ),
    legacy(
        3,
        "des-cbc-md5",
        Keytype::Des,
        Cksumtype::RsaMd5,
        Some(Cksumtype::RsaMd5Des),
        CipherMode::DesCbcZeroIv,
        S2kFamily::Des,
    ),
    EnctypeInfo {
        id: 23,
        name: "arcfour-hmac-md5",
        blocksize: 1,
        padsize: 1,
        confounder_size: 8,
        keytype: Keytype::Arcfour,
        checksum: Cksumtype::HmacMd5,
        keyed_checksum: None,
        format: WireFormat::Special,
        pseudo: false,
        cipher: CipherMode::Rc4Hmac,
        s2k: S2kFamily::Arcfour,
        prf_length: 0,
    },
    legacy(
        5,
        "des3-cbc-md5",
        Keytype::Des3,
        Cksumtype::RsaMd5,
        Some(Cksumtype::RsaMd5Des3),
        CipherMode::Des3Cbc,
        S2kFamily::Des3,
    ),
    EnctypeInfo {
        id: 16,
        name: "des3-cbc-sha1",
        blocksize: 8,
        padsize: 8,
        confounder_size: 8,
        keytype: Keytype::Des3,
        checksum: Cksumtype::Sha1,
        keyed_checksum: Some(Cksumtype::HmacSha1Des3),
        format: WireFormat::Derived,
        pseudo: false,
        cipher: CipherMode::Des3Cbc,
        s2k: S2kFamily::Des3Derived,
        prf_length: 0,
    },
    legacy(
        7,
        "old-des3-cbc-sha1",
        Keytype::Des3,
        Cksumtype::Sha1,
        Some(Cksumtype::HmacSha1Des3),
        CipherMode::Des3Cbc,
        S2kFamily::Des3,
    ),
    aes(17, "aes128-cts-hmac-sha1-96", Keytype::Aes128, Cksumtype::HmacSha196Aes128),
    aes(18, "aes256-cts-hmac-sha1-96", Keytype::Aes256, Cksumtype::HmacSha196Aes256),
    pseudo(-0x1000, "des-cbc-none", 8, Keytype::Des, CipherMode::DesCbcZeroIv, S2kFamily::Des),
    pseudo(-0x1002, "des-cfb64-none", 1, Keytype::Des, CipherMode::DesCfb64, S2kFamily::Des),
    pseudo(-0x1003, "des-pcbc-none", 8, Keytype::Des, CipherMode::DesPcbcKeyIv, S2kFamily::Des),
    pseudo(
        -0x1001,
        "des3-cbc-none",
        8,
        Keytype::Des3,
        CipherMode::Des3Cbc,
        S2kFamily::Des3Derived,
    ),
];

const fn unkeyed(
    id: i32,
    name: &'static str,
    size: usize,
    collision_proof: bool,
    alg: ChecksumAlg,
) -> ChecksumInfo {
    ChecksumInfo { id, name, size, collision_proof, keying: Keying::None, alg }
}

const fn keyed(
    id: i32,
    name: &'static str,
    size: usize,
    keying: Keying,
    alg: ChecksumAlg,
) -> ChecksumInfo {
    ChecksumInfo { id, name, size, collision_proof: true, keying, alg }
}

static CHECKSUMS: [ChecksumInfo; Cksumtype::ALL.len()] = [
    unkeyed(0, "none", 0, false, ChecksumAlg::None),
    unkeyed(1, "crc32", 4, false, ChecksumAlg::Crc32),
    unkeyed(2, "rsa-md4", 16, true, ChecksumAlg::Md4),
    keyed(3, "rsa-md4-des", 24, Keying::Variant, ChecksumAlg::Md4Des),
    unkeyed(7, "rsa-md5", 16, true, ChecksumAlg::Md5),
    keyed(8, "rsa-md5-des", 24, Keying::Variant, ChecksumAlg::Md5Des),
    keyed(9, "rsa-md5-des3", 24, Keying::Variant, ChecksumAlg::Md5Des3),
    unkeyed(14, "sha1", 20, true, ChecksumAlg::Sha1),
    keyed(12, "hmac-sha1-des3", 20, Keying::Derived, ChecksumAlg::HmacSha1),
    keyed(15, "hmac-sha1-96-aes128", 12, Keying::Derived, ChecksumAlg::HmacSha1),
    keyed(16, "hmac-sha1-96-aes256", 12, Keying::Derived, ChecksumAlg::HmacSha1),
    keyed(-138, "hmac-md5", 16, Keying::Direct, ChecksumAlg::HmacMd5),
    keyed(-1138, "hmac-md5-enc", 16, Keying::Direct, ChecksumAlg::HmacMd5Enc),
];

static KEYTYPES: [KeytypeInfo; Keytype::ALL.len()] = [
    KeytypeInfo { id: 0, name: "null", bits: 0, size: 0 },
    KeytypeInfo { id: 1, name: "des", bits: 56, size: 8 },
    KeytypeInfo { id: 7, name: "des3", bits: 168, size: 24 },
    KeytypeInfo { id: 17, name: "aes-128", bits: 128, size: 16 },
    KeytypeInfo { id: 18, name: "aes-256", bits: 256, size: 32 },
    KeytypeInfo { id: 23, name: "arcfour", bits: 128, size: 16 },
];

static ENCTYPE_DISABLED: [AtomicBool; Enctype::ALL.len()] =
    [const { AtomicBool::new(false) }; Enctype::ALL.len()];

static CHECKSUM_DISABLED: [AtomicBool; Cksumtype::ALL.len()] =
    [const { AtomicBool::new(false) }; Cksumtype::ALL.len()];

impl Enctype {
    /// Every encryption type, in registry order.
    pub const ALL: [Enctype; 14] = [
        Enctype::Null,
        Enctype::DesCbcCrc,
        Enctype::DesCbcMd4,
        Enctype::DesCbcMd5,
        Enctype::ArcfourHmacMd5,
        Enctype::Des3CbcMd5,
        Enctype::Des3CbcSha1,
        Enctype::OldDes3CbcSha1,
        Enctype::Aes128CtsHmacSha196,
        Enctype::Aes256CtsHmacSha196,
        Enctype::DesCbcNone,
        Enctype::DesCfb64None,
        Enctype::DesPcbcNone,
        Enctype::Des3CbcNone,
    ];

    pub(crate) fn info(self) -> &'static EnctypeInfo {
        &ENCTYPES[self as usize]
    }

    /// Look up an encryption type by protocol id.
    pub fn from_id(id: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.info().id == id)
            .ok_or(CryptoError::UnsupportedEnctype { enctype: id })
    }

    /// Look up an encryption type by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.info().name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CryptoError::UnknownName { name: name.to_string() })
    }

    /// Protocol id.
    pub fn id(self) -> i32 {
        self.info().id
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Cipher block size in bytes.
    pub fn blocksize(self) -> usize {
        self.info().blocksize
    }

    /// Ciphertext alignment in bytes.
    pub fn padsize(self) -> usize {
        self.info().padsize
    }

    /// Confounder length in bytes.
    pub fn confounder_size(self) -> usize {
        self.info().confounder_size
    }

    /// Key type used by this encryption type.
    pub fn keytype(self) -> Keytype {
        self.info().keytype
    }

    /// Unkeyed checksum type.
    pub fn checksum_type(self) -> Cksumtype {
        self.info().checksum
    }

    /// Keyed checksum type, if any.
    pub fn keyed_checksum_type(self) -> Option<Cksumtype> {
        self.info().keyed_checksum
    }

    /// Encrypted buffer layout.
    pub fn wire_format(self) -> WireFormat {
        self.info().format
    }

    /// Pseudo types have no confounder and no checksum.
    pub fn is_pseudo(self) -> bool {
        self.info().pseudo
    }

    /// Key length in bytes.
    pub fn keysize(self) -> usize {
        self.keytype().size()
    }

    /// Effective key length in bits.
    pub fn keybits(self) -> usize {
        self.keytype().bits()
    }

    /// Whether this type has been disabled.
    pub fn is_disabled(self) -> bool {
        self == Enctype::Null || ENCTYPE_DISABLED[self as usize].load(Ordering::Acquire)
    }

    /// Disable this type for the rest of the process.
    pub fn disable(self) {
        ENCTYPE_DISABLED[self as usize].store(true, Ordering::Release);
        debug!(enctype = self.name(), "encryption type disabled");
    }

    /// Fails with `UnsupportedEnctype` if the type is disabled.
    pub fn ensure_enabled(self) -> Result<Self> {
        if self.is_disabled() {
            return Err(CryptoError::UnsupportedEnctype { enctype: self.id() });
        }
        Ok(self)
    }
}

impl Cksumtype {
    /// Every checksum type, in registry order.
    pub const ALL: [Cksumtype; 13] = [
        Cksumtype::None,
        Cksumtype::Crc32,
        Cksumtype::RsaMd4,
        Cksumtype::RsaMd4Des,
        Cksumtype::RsaMd5,
        Cksumtype::RsaMd5Des,
        Cksumtype::RsaMd5Des3,
        Cksumtype::Sha1,
        Cksumtype::HmacSha1Des3,
        Cksumtype::HmacSha196Aes128,
        Cksumtype::HmacSha196Aes256,
        Cksumtype::HmacMd5,
        Cksumtype::HmacMd5Enc,
    ];

    pub(crate) fn info(self) -> &'static ChecksumInfo {
        &CHECKSUMS[self as usize]
    }

    /// Look up a checksum type by protocol id.
    pub fn from_id(id: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.info().id == id)
            .ok_or(CryptoError::UnsupportedChecksum { cksumtype: id })
    }

    /// Look up a checksum type by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.info().name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CryptoError::UnknownName { name: name.to_string() })
    }

    /// Protocol id.
    pub fn id(self) -> i32 {
        self.info().id
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Output length in bytes.
    pub fn size(self) -> usize {
        self.info().size
    }

    /// Whether the checksum needs a key.
    pub fn is_keyed(self) -> bool {
        self.info().keying != Keying::None
    }

    /// Whether the checksum is collision-proof.
    pub fn is_collision_proof(self) -> bool {
        self.info().collision_proof
    }

    /// Whether this type has been disabled.
    pub fn is_disabled(self) -> bool {
        CHECKSUM_DISABLED[self as usize].load(Ordering::Acquire)
    }

    /// Disable this type for the rest of the process.
    pub fn disable(self) {
        CHECKSUM_DISABLED[self as usize].store(true, Ordering::Release);
        debug!(cksumtype = self.name(), "checksum type disabled");
    }

    /// Fails with `UnsupportedChecksum` if the type is disabled.
    pub fn ensure_enabled(self) -> Result<Self> {
        if self.is_disabled() {
            return Err(CryptoError::UnsupportedChecksum { cksumtype: self.id() });
        }
        Ok(self)
    }
}

impl Keytype {
    /// Every key type.
    pub const ALL: [Keytype; 6] = [
        Keytype::Null,
        Keytype::Des,
        Keytype::Des3,
        Keytype::Aes128,
        Keytype::Aes256,
        Keytype::Arcfour,
    ];

    fn info(self) -> &'static KeytypeInfo {
        &KEYTYPES[self as usize]
    }

    /// Look up a key type by protocol id.
    pub fn from_id(id: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.info().id == id)
            .ok_or(CryptoError::UnsupportedKeytype { keytype: id })
    }

    /// Look up a key type by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.info().name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CryptoError::UnknownName { name: name.to_string() })
    }

    /// Protocol id.
    pub fn id(self) -> i32 {
        self.info().id
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Effective key length in bits.
    pub fn bits(self) -> usize {
        self.info().bits
    }

    /// Key length in bytes.
    pub fn size(self) -> usize {
        self.info().size
    }
}

impl SaltType {
    /// Protocol id.
    pub fn id(self) -> i32 {
        match self {
            SaltType::Pw => 3,
            SaltType::Afs3 => 10,
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            SaltType::Pw => "pw-salt",
            SaltType::Afs3 => "afs3-salt",
        }
    }

    /// Look up a salt type by protocol id.
    pub fn from_id(id: i32) -> Result<Self> {
        [SaltType::Pw, SaltType::Afs3]
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or(CryptoError::UnsupportedSaltType { salttype: id })
    }

    /// Look up a salt type by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        [SaltType::Pw, SaltType::Afs3]
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CryptoError::UnknownName { name: name.to_string() })
    }
}

/// Check that an encryption type id is known and enabled.
pub fn enctype_valid(id: i32) -> Result<Enctype> {
    Enctype::from_id(id)?.ensure_enabled()
}

/// Check that a checksum type id is known and enabled.
pub fn cksumtype_valid(id: i32) -> Result<Cksumtype> {
    Cksumtype::from_id(id)?.ensure_enabled()
}

/// Non-pseudo encryption types using `keytype`, most preferred first.
pub fn keytype_to_enctypes(keytype: Keytype) -> Vec<Enctype> {
    Enctype::ALL.into_iter().rev().filter(|e| e.keytype() == keytype && !e.is_pseudo()).collect()
}

/// Whether keys of `a` can be used with `b`.
pub fn enctypes_compatible_keys(a: Enctype, b: Enctype) -> bool {
    a.keytype() == b.keytype()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_indexed_by_variant() {
        for (i, e) in Enctype::ALL.into_iter().enumerate() {
            assert_eq!(e as usize, i);
        }
        for (i, c) in Cksumtype::ALL.into_iter().enumerate() {
            assert_eq!(c as usize, i);
        }
        for (i, k) in Keytype::ALL.into_iter().enumerate() {
            assert_eq!(k as usize, i);
        }
    }

    #[test]
    fn ids_round_trip_through_lookup() {
        for e in Enctype::ALL {
            assert_eq!(Enctype::from_id(e.id()).unwrap(), e);
            assert_eq!(Enctype::from_name(e.name()).unwrap(), e);
        }
        for c in Cksumtype::ALL {
            assert_eq!(Cksumtype::from_id(c.id()).unwrap(), c);
        }
        for k in Keytype::ALL {
            assert_eq!(Keytype::from_id(k.id()).unwrap(), k);
        }
    }

    #[test]
    fn protocol_ids_match_assigned_numbers() {
        assert_eq!(Enctype::DesCbcCrc.id(), 1);
        assert_eq!(Enctype::Des3CbcSha1.id(), 16);
        assert_eq!(Enctype::Aes128CtsHmacSha196.id(), 17);
        assert_eq!(Enctype::Aes256CtsHmacSha196.id(), 18);
        assert_eq!(Enctype::ArcfourHmacMd5.id(), 23);
        assert_eq!(Enctype::DesCbcNone.id(), -4096);
        assert_eq!(Cksumtype::HmacSha196Aes256.id(), 16);
        assert_eq!(Cksumtype::HmacMd5.id(), -138);
    }

    #[test]
    fn unknown_id_is_unsupported() {
        assert_eq!(
            Enctype::from_id(99).unwrap_err(),
            CryptoError::UnsupportedEnctype { enctype: 99 }
        );
        assert_eq!(
            Cksumtype::from_id(4).unwrap_err(),
            CryptoError::UnsupportedChecksum { cksumtype: 4 }
        );
        assert!(matches!(Enctype::from_name("rot13"), Err(CryptoError::UnknownName { .. })));
    }

    #[test]
    fn name_lookup_ignores_case() {
        assert_eq!(Enctype::from_name("AES256-CTS-HMAC-SHA1-96").unwrap(), Enctype::Aes256CtsHmacSha196);
        assert_eq!(SaltType::from_name("AFS3-SALT").unwrap(), SaltType::Afs3);
        assert_eq!(Keytype::from_name("aes-128").unwrap(), Keytype::Aes128);
    }

    #[test]
    fn null_enctype_is_always_disabled() {
        assert!(Enctype::Null.is_disabled());
        assert!(enctype_valid(0).is_err());
    }

    #[test]
    fn keytype_to_enctypes_prefers_later_entries() {
        assert_eq!(
            keytype_to_enctypes(Keytype::Des),
            vec![Enctype::DesCbcMd5, Enctype::DesCbcMd4, Enctype::DesCbcCrc]
        );
        assert_eq!(
            keytype_to_enctypes(Keytype::Des3),
            vec![Enctype::OldDes3CbcSha1, Enctype::Des3CbcSha1, Enctype::Des3CbcMd5]
        );
    }

    #[test]
    fn compatible_keys_share_keytype() {
        assert!(enctypes_compatible_keys(Enctype::DesCbcCrc, Enctype::DesCbcMd5));
        assert!(enctypes_compatible_keys(Enctype::Des3CbcSha1, Enctype::Des3CbcNone));
        assert!(!enctypes_compatible_keys(Enctype::Aes128CtsHmacSha196, Enctype::Aes256CtsHmacSha196));
    }

    #[test]
    fn checksum_properties() {
        assert!(Cksumtype::RsaMd5Des.is_keyed());
        assert!(!Cksumtype::Crc32.is_keyed());
        assert!(!Cksumtype::Crc32.is_collision_proof());
        assert!(Cksumtype::Sha1.is_collision_proof());
        assert_eq!(Cksumtype::HmacSha196Aes128.size(), 12);
        assert_eq!(Cksumtype::HmacSha1Des3.size(), 20);
    }

    #[test]
    fn checksum_keying() {
        assert_eq!(Cksumtype::Sha1.info().keying, Keying::None);
        assert_eq!(Cksumtype::RsaMd4Des.info().keying, Keying::Variant);
        assert_eq!(Cksumtype::RsaMd5Des3.info().keying, Keying::Variant);
        assert_eq!(Cksumtype::HmacSha196Aes256.info().keying, Keying::Derived);
        assert_eq!(Cksumtype::HmacMd5Enc.info().keying, Keying::Direct);
        assert!(Cksumtype::HmacMd5Enc.is_keyed());
    }

    #[test]
    fn key_sizes() {
        assert_eq!(Enctype::DesCbcMd5.keysize(), 8);
        assert_eq!(Enctype::Des3CbcSha1.keysize(), 24);
        assert_eq!(Enctype::Des3CbcSha1.keybits(), 168);
        assert_eq!(Enctype::Aes256CtsHmacSha196.keysize(), 32);
        assert_eq!(Enctype::ArcfourHmacMd5.keysize(), 16);
    }
}
