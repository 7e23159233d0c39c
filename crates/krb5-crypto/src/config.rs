//! Process-wide crypto settings

use std::path::PathBuf;

use tracing::debug;

use crate::{
    random::set_seed_file,
    registry::{Cksumtype, Enctype},
    string_to_key::{DEFAULT_AES_ITERATIONS, set_default_aes_iterations},
};

/// Settings a configuration layer hands to the crypto framework.
///
/// Nothing takes effect until [`CryptoConfig::apply`] is called. Disabling a
/// type is permanent for the process, so applying a second config can add to
/// the disabled set but never shrink it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoConfig {
    /// Encryption types to disable
    pub disabled_enctypes: Vec<Enctype>,
    /// Checksum types to disable
    pub disabled_checksums: Vec<Cksumtype>,
    /// PBKDF2 iteration count for AES string-to-key when the salt carries none
    pub default_aes_iterations: u32,
    /// RNG seed file. `None` uses `$RANDFILE`, then `$HOME/.rnd`.
    pub seed_file: Option<PathBuf>,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            disabled_enctypes: Vec::new(),
            disabled_checksums: Vec::new(),
            default_aes_iterations: DEFAULT_AES_ITERATIONS,
            seed_file: None,
        }
    }
}

impl CryptoConfig {
    /// Add an encryption type to disable.
    #[must_use]
    pub fn with_disabled_enctype(mut self, enctype: Enctype) -> Self {
        self.disabled_enctypes.push(enctype);
        self
    }

    /// Add a checksum type to disable.
    #[must_use]
    pub fn with_disabled_checksum(mut self, cksumtype: Cksumtype) -> Self {
        self.disabled_checksums.push(cksumtype);
        self
    }

    /// Set the default AES iteration count.
    #[must_use]
    pub fn with_default_aes_iterations(mut self, iterations: u32) -> Self {
        self.default_aes_iterations = iterations;
        self
    }

    /// Set the RNG seed file.
    #[must_use]
    pub fn with_seed_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_file = Some(path.into());
        self
    }

    /// Install these settings process-wide.
    ///
    /// The seed file only matters if the system RNG has not been seeded yet.
    pub fn apply(&self) {
        for enctype in &self.disabled_enctypes {
            enctype.disable();
        }
        for cksumtype in &self.disabled_checksums {
            cksumtype.disable();
        }
        set_default_aes_iterations(self.default_aes_iterations);
        set_seed_file(self.seed_file.clone());
        debug!(
            disabled_enctypes = self.disabled_enctypes.len(),
            disabled_checksums = self.disabled_checksums.len(),
            aes_iterations = self.default_aes_iterations,
            "crypto config applied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_rfc3962() {
        let config = CryptoConfig::default();
        assert_eq!(config.default_aes_iterations, 4096);
        assert!(config.disabled_enctypes.is_empty());
        assert!(config.disabled_checksums.is_empty());
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn builder_collects_settings() {
        let config = CryptoConfig::default()
            .with_disabled_enctype(Enctype::DesCbcCrc)
            .with_disabled_enctype(Enctype::DesCbcMd4)
            .with_disabled_checksum(Cksumtype::Crc32)
            .with_default_aes_iterations(1000)
            .with_seed_file("/tmp/krb5-seed");
        assert_eq!(config.disabled_enctypes, [Enctype::DesCbcCrc, Enctype::DesCbcMd4]);
        assert_eq!(config.disabled_checksums, [Cksumtype::Crc32]);
        assert_eq!(config.default_aes_iterations, 1000);
        assert_eq!(config.seed_file, Some(PathBuf::from("/tmp/krb5-seed")));
    }
}
