use std::fmt;

// === VaultCryptoError ===

/// Errors produced while sealing or opening a vault token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCryptoError {
    /// The token is not `v1.<salt>.<nonce>.<ciphertext>` or a field does not decode.
    InvalidFormat(String),
    /// The AEAD tag did not verify. Wrong password and tampering are not distinguished.
    AuthenticationFailed,
    /// The token opened but the plaintext is not the expected JSON shape.
    CorruptPayload(String),
    /// Failed to derive the key from the password.
    KeyDerivation(String),
    /// Sealing the payload failed.
    Encryption(String),
    /// The system random source failed.
    RandomGeneration(String),
    /// A raw key had the wrong length.
    InvalidKey(String),
}

impl fmt::Display for VaultCryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultCryptoError::InvalidFormat(msg) => write!(f, "Invalid vault token: {}", msg),
            VaultCryptoError::AuthenticationFailed => {
                write!(f, "Vault authentication failed: wrong password or corrupted data")
            }
            VaultCryptoError::CorruptPayload(msg) => write!(f, "Corrupt vault payload: {}", msg),
            VaultCryptoError::KeyDerivation(msg) => write!(f, "Key derivation failed: {}", msg),
            VaultCryptoError::Encryption(msg) => write!(f, "Encryption failed: {}", msg),
            VaultCryptoError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
            VaultCryptoError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
        }
    }
}

impl std::error::Error for VaultCryptoError {}

// === KvError ===

/// Errors raised by a key-value persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The backend rejected the read or write.
    Backend(String),
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::Backend(msg) => write!(f, "Key-value store error: {}", msg),
        }
    }
}

impl std::error::Error for KvError {}

// === StoreError ===

/// Errors returned by link store commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Link with the given ID was not found.
    LinkNotFound(String),
    /// Category with the given ID was not found.
    CategoryNotFound(String),
    /// The command is not allowed, e.g. deleting the `common` category.
    ForbiddenOperation(String),
    /// The link draft or patch failed validation.
    InvalidLink(String),
    /// The snapshot could not be written. In-memory state is ahead of disk; retry.
    Persistence(String),
    /// Failed to serialize or deserialize the snapshot.
    Serialization(String),
}

impl StoreError {
    /// Returns true when repeating the command may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Persistence(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::LinkNotFound(id) => write!(f, "Link not found: {}", id),
            StoreError::CategoryNotFound(id) => write!(f, "Category not found: {}", id),
            StoreError::ForbiddenOperation(msg) => write!(f, "Operation not allowed: {}", msg),
            StoreError::InvalidLink(msg) => write!(f, "Invalid link: {}", msg),
            StoreError::Persistence(msg) => write!(f, "Failed to persist links: {}", msg),
            StoreError::Serialization(msg) => {
                write!(f, "Link snapshot serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<KvError> for StoreError {
    fn from(err: KvError) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

// === VaultError ===

/// Errors returned by the private vault session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The vault must be unlocked for this command.
    Locked,
    /// Unlock or re-key was rejected. The cause is deliberately not reported.
    UnlockFailed,
    /// Private link with the given ID was not found.
    LinkNotFound(String),
    /// The link draft or patch failed validation.
    InvalidLink(String),
    /// Sealing the vault failed.
    Crypto(String),
    /// The token could not be written. Retry the command.
    Persistence(String),
    /// The background key derivation task did not complete.
    Cancelled,
}

impl VaultError {
    /// Returns true when repeating the command may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::Persistence(_) | VaultError::Cancelled)
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::Locked => write!(f, "Private vault is locked"),
            VaultError::UnlockFailed => write!(f, "Unlock failed"),
            VaultError::LinkNotFound(id) => write!(f, "Private link not found: {}", id),
            VaultError::InvalidLink(msg) => write!(f, "Invalid link: {}", msg),
            VaultError::Crypto(msg) => write!(f, "Vault crypto error: {}", msg),
            VaultError::Persistence(msg) => write!(f, "Failed to persist vault: {}", msg),
            VaultError::Cancelled => write!(f, "Vault operation cancelled"),
        }
    }
}

impl std::error::Error for VaultError {}

impl From<KvError> for VaultError {
    fn from(err: KvError) -> Self {
        VaultError::Persistence(err.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
