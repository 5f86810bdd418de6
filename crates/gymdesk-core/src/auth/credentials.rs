//! Login passwords remembered between runs, held in the OS keychain.

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const KEYCHAIN_SERVICE: &str = "gymdesk";

/// Keychain entries keyed by login e-mail. Addresses are compared
/// case-insensitively, so `Ada@Gym.test` and `ada@gym.test` share one entry.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(email: &str) -> Result<Entry> {
        let account = account_name(email);
        Entry::new(KEYCHAIN_SERVICE, &account)
            .with_context(|| format!("Keychain unavailable for {}", account))
    }

    pub fn remember(email: &str, password: &str) -> Result<()> {
        Self::entry(email)?
            .set_password(password)
            .context("Could not save the password to the keychain")?;
        debug!(email, "Password remembered");
        Ok(())
    }

    /// The remembered password, `None` if there is none
    pub fn recall(email: &str) -> Result<Option<String>> {
        let stored = Self::entry(email)?.get_password();
        absent_as_none(stored).context("Could not read the password from the keychain")
    }

    /// Drop the remembered password, if any
    pub fn forget(email: &str) -> Result<()> {
        match Self::entry(email)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(email, "Password forgotten");
                Ok(())
            }
            Err(e) => Err(e).context("Could not remove the password from the keychain"),
        }
    }
}

fn account_name(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn absent_as_none(stored: keyring::Result<String>) -> keyring::Result<Option<String>> {
    match stored {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e),
    }
}
