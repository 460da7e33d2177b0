//! Secure credential storage via the OS keychain.
//!
//! Provides functions to load and save Kite credentials stored in
//! the system keychain. At startup, [`populate_env_from_keychain`] copies
//! any stored credentials into environment variables so the config flow
//! picks them up transparently.

use std::str::FromStr;

use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Keychain service name used for all stored credentials.
const SERVICE: &str = "gttwatch";

/// Known API credential keys managed by this module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKey {
    KiteApiKey,
    KiteApiSecret,
    KiteAccessToken,
}

impl CredentialKey {
    /// Returns the keychain entry identifier.
    pub fn keyring_id(self) -> &'static str {
        match self {
            Self::KiteApiKey => "kite_api_key",
            Self::KiteApiSecret => "kite_api_secret",
            Self::KiteAccessToken => "kite_access_token",
        }
    }

    /// Returns the environment variable name for this credential.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::KiteApiKey => "KITE_API_KEY",
            Self::KiteApiSecret => "KITE_API_SECRET",
            Self::KiteAccessToken => "KITE_ACCESS_TOKEN",
        }
    }

    /// All credential keys in display order.
    pub const ALL: [CredentialKey; 3] = [
        Self::KiteApiKey,
        Self::KiteApiSecret,
        Self::KiteAccessToken,
    ];
}

impl FromStr for CredentialKey {
    type Err = crate::GttError;

    /// Accepts either the keychain id (`kite_api_key`) or the env var name.
    fn from_str(s: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.keyring_id() == s || k.env_var() == s)
            .ok_or_else(|| crate::GttError::Config(format!("unknown credential key {s:?}")))
    }
}

/// Loads a credential from the keychain, returning `None` if not set.
pub fn load(key: CredentialKey) -> Option<Zeroizing<String>> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id()).ok()?;
    match entry.get_password() {
        Ok(password) => Some(Zeroizing::new(password)),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key = key.keyring_id(), error = %e, "failed to read keychain entry");
            None
        }
    }
}

/// Saves a credential to the keychain.
pub fn save(key: CredentialKey, value: &str) -> crate::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.keyring_id())
        .map_err(|e| crate::GttError::Config(format!("keyring entry error: {e}")))?;
    entry
        .set_password(value)
        .map_err(|e| crate::GttError::Config(format!("failed to save to keychain: {e}")))
}

/// Populates environment variables from the keychain for any
/// credentials not already set in the environment.
///
/// Call this at startup before [`crate::config::fetch_config`], and before
/// any async runtime or other thread is started: it writes the process
/// environment.
pub fn populate_env_from_keychain() {
    for key in CredentialKey::ALL {
        if std::env::var(key.env_var()).is_err()
            && let Some(value) = load(key)
        {
            debug!(key = key.env_var(), "loaded credential from keychain");
            // SAFETY: the binary calls this from a synchronous `main` before it
            // builds the tokio runtime, so no other thread reads the environment.
            unsafe {
                std::env::set_var(key.env_var(), value.as_str());
            }
        }
    }
}
