//! Vault token codec.
//!
//! Seals any serde payload into a self-describing ASCII token:
//!
//! ```text
//! v1.<base64 salt (16 bytes)>.<base64 nonce (12 bytes)>.<base64 ciphertext||tag>
//! ```
//!
//! `v1` pins PBKDF2-HMAC-SHA256 with 100 000 iterations and AES-256-GCM.
//! A fresh salt and nonce are drawn for every token, so no key/nonce pair
//! is ever reused.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroize;

use crate::services::crypto_service::{
    CryptoService, CryptoServiceTrait, SealedData, NONCE_LENGTH, SALT_LENGTH,
};
use crate::types::errors::VaultCryptoError;

/// Version tag of the only token format this build reads and writes.
pub const VAULT_VERSION: &str = "v1";

const TOKEN_SEPARATOR: char = '.';

/// Stateless password-based encryption of JSON payloads into vault tokens.
#[derive(Clone, Default)]
pub struct VaultCrypto<C = CryptoService> {
    crypto: C,
}

impl VaultCrypto<CryptoService> {
    pub fn new() -> Self {
        Self {
            crypto: CryptoService::new(),
        }
    }
}

impl<C: CryptoServiceTrait> VaultCrypto<C> {
    /// Builds a codec over a custom KDF/AEAD backend.
    pub fn with_backend(crypto: C) -> Self {
        Self { crypto }
    }

    /// Serializes `payload` to JSON and seals it under `password`.
    pub fn encrypt<T: Serialize>(&self, password: &str, payload: &T) -> Result<String, VaultCryptoError> {
        let salt = self.crypto.generate_salt()?;
        let mut key = self.crypto.derive_key(password, &salt)?;

        let mut plaintext = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.crypto.zeroize_memory(&mut key);
                return Err(VaultCryptoError::Encryption(e.to_string()));
            }
        };
        let sealed = self.crypto.encrypt_aes256gcm(&plaintext, &key);
        self.crypto.zeroize_memory(&mut plaintext);
        self.crypto.zeroize_memory(&mut key);
        let sealed = sealed?;

        Ok(format!(
            "{}{sep}{}{sep}{}{sep}{}",
            VAULT_VERSION,
            BASE64.encode(salt),
            BASE64.encode(sealed.nonce),
            BASE64.encode(&sealed.ciphertext),
            sep = TOKEN_SEPARATOR,
        ))
    }

    /// Opens `token` with `password` and parses the plaintext as `T`.
    ///
    /// A wrong password and a tampered token both yield
    /// [`VaultCryptoError::AuthenticationFailed`].
    pub fn decrypt<T: DeserializeOwned>(&self, password: &str, token: &str) -> Result<T, VaultCryptoError> {
        let parsed = ParsedToken::parse(token)?;

        let mut key = self.crypto.derive_key(password, &parsed.salt)?;
        let opened = self.crypto.decrypt_aes256gcm(&parsed.sealed, &key);
        self.crypto.zeroize_memory(&mut key);
        let mut plaintext = opened?;

        let payload = serde_json::from_slice::<T>(&plaintext)
            .map_err(|e| VaultCryptoError::CorruptPayload(e.to_string()));
        plaintext.zeroize();
        payload
    }
}

/// The decoded fields of a `v1` token.
struct ParsedToken {
    salt: Vec<u8>,
    sealed: SealedData,
}

impl ParsedToken {
    fn parse(token: &str) -> Result<Self, VaultCryptoError> {
        let fields: Vec<&str> = token.trim().split(TOKEN_SEPARATOR).collect();
        if fields.len() != 4 {
            return Err(VaultCryptoError::InvalidFormat(format!(
                "expected 4 fields, got {}",
                fields.len()
            )));
        }
        if fields[0] != VAULT_VERSION {
            return Err(VaultCryptoError::InvalidFormat(format!(
                "unsupported version '{}'",
                fields[0]
            )));
        }

        let salt = decode_field("salt", fields[1])?;
        if salt.len() != SALT_LENGTH {
            return Err(VaultCryptoError::InvalidFormat(format!(
                "salt must be {} bytes, got {}",
                SALT_LENGTH,
                salt.len()
            )));
        }

        let nonce_bytes = decode_field("nonce", fields[2])?;
        let nonce: [u8; NONCE_LENGTH] = nonce_bytes.as_slice().try_into().map_err(|_| {
            VaultCryptoError::InvalidFormat(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LENGTH,
                nonce_bytes.len()
            ))
        })?;

        let ciphertext = decode_field("ciphertext", fields[3])?;

        Ok(Self {
            salt,
            sealed: SealedData { nonce, ciphertext },
        })
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, VaultCryptoError> {
    if value.is_empty() {
        return Err(VaultCryptoError::InvalidFormat(format!("empty {} field", name)));
    }
    BASE64
        .decode(value)
        .map_err(|e| VaultCryptoError::InvalidFormat(format!("{} is not base64: {}", name, e)))
}
