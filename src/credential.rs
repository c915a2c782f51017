//! # Credentials
//!
//! The credential objects a binding consumes. Lookup and storage belong to
//! the caller; these types only carry the secret material for the duration of
//! one bind call. Every secret is held in [`Zeroizing`] storage and `Debug`
//! output is redacted.

use crate::error::{BindError, Result};
use std::fmt;
use zeroize::Zeroizing;

/// Private key text plus its passphrase, extracted for a single bind call.
pub struct KeyMaterial {
    raw_text: Zeroizing<String>,
    passphrase: Zeroizing<String>,
}

impl KeyMaterial {
    pub fn new(raw_text: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            raw_text: Zeroizing::new(raw_text.into()),
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Passphrase, empty when the credential has none.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("raw_text", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// An SSH username with one or more private keys and an optional passphrase.
pub struct SshUserPrivateKey {
    id: String,
    username: String,
    private_keys: Vec<Zeroizing<String>>,
    passphrase: Option<Zeroizing<String>>,
}

impl SshUserPrivateKey {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            private_keys: Vec::new(),
            passphrase: None,
        }
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_keys.push(Zeroizing::new(key.into()));
        self
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.into()));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn key_count(&self) -> usize {
        self.private_keys.len()
    }

    /// Extract the material for one bind call. Only the first key is used.
    pub fn key_material(&self) -> Result<KeyMaterial> {
        let key = self.private_keys.first().ok_or(BindError::MissingKey)?;
        let passphrase = self
            .passphrase
            .as_ref()
            .map(|p| p.as_str())
            .unwrap_or_default();
        Ok(KeyMaterial::new(key.as_str(), passphrase))
    }
}

impl fmt::Debug for SshUserPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshUserPrivateKey")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("private_keys", &self.private_keys.len())
            .field("has_passphrase", &self.passphrase.is_some())
            .finish()
    }
}

/// A username and password pair for HTTPS remotes.
pub struct UsernamePassword {
    id: String,
    username: String,
    password: Zeroizing<String>,
}

impl UsernamePassword {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for UsernamePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePassword")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
