use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;
use zeroize::Zeroize;

use crate::types::errors::VaultCryptoError;

/// PBKDF2 iteration count for key derivation.
///
/// Part of the `v1` token format: changing it makes existing vaults unreadable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes for PBKDF2.
pub const SALT_LENGTH: usize = 16;

/// AES-256-GCM key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce/IV length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Output of a single AEAD seal. `ciphertext` carries the tag in its last 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedData {
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

/// KDF + AEAD capability used by the vault.
pub trait CryptoServiceTrait {
    /// Derives a 256-bit key from a password and salt using PBKDF2-HMAC-SHA256.
    fn derive_key(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, VaultCryptoError>;

    /// Encrypts plaintext with AES-256-GCM under a fresh random nonce.
    fn encrypt_aes256gcm(&self, plaintext: &[u8], key: &[u8]) -> Result<SealedData, VaultCryptoError>;

    /// Opens data sealed by `encrypt_aes256gcm`.
    fn decrypt_aes256gcm(&self, sealed: &SealedData, key: &[u8]) -> Result<Vec<u8>, VaultCryptoError>;

    /// Generates a random PBKDF2 salt.
    fn generate_salt(&self) -> Result<[u8; SALT_LENGTH], VaultCryptoError>;

    /// Overwrites sensitive data with zeros.
    fn zeroize_memory(&self, data: &mut [u8]);
}

/// A nonce sequence that yields exactly one nonce.
struct SingleNonce {
    nonce: Option<[u8; NONCE_LENGTH]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_LENGTH]) -> Self {
        Self {
            nonce: Some(nonce_bytes),
        }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.nonce
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

/// `ring`-backed implementation. Cheap to clone; clones share the system RNG.
#[derive(Clone)]
pub struct CryptoService {
    rng: SystemRandom,
}

impl CryptoService {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    fn check_key(key: &[u8]) -> Result<(), VaultCryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(VaultCryptoError::InvalidKey(format!(
                "Key must be {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }
        Ok(())
    }
}

impl Default for CryptoService {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoServiceTrait for CryptoService {
    fn derive_key(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, VaultCryptoError> {
        let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
            .ok_or_else(|| VaultCryptoError::KeyDerivation("Invalid iteration count".to_string()))?;

        let mut key = vec![0u8; KEY_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            password.as_bytes(),
            &mut key,
        );
        Ok(key)
    }

    fn encrypt_aes256gcm(&self, plaintext: &[u8], key: &[u8]) -> Result<SealedData, VaultCryptoError> {
        Self::check_key(key)?;

        let mut nonce = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| VaultCryptoError::RandomGeneration("Failed to generate nonce".to_string()))?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| VaultCryptoError::Encryption("Failed to create encryption key".to_string()))?;
        let mut sealing_key = aead::SealingKey::new(unbound_key, SingleNonce::new(nonce));

        let mut in_out = plaintext.to_vec();
        if sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .is_err()
        {
            in_out.zeroize();
            return Err(VaultCryptoError::Encryption("Encryption operation failed".to_string()));
        }

        Ok(SealedData {
            nonce,
            ciphertext: in_out,
        })
    }

    fn decrypt_aes256gcm(&self, sealed: &SealedData, key: &[u8]) -> Result<Vec<u8>, VaultCryptoError> {
        Self::check_key(key)?;

        if sealed.ciphertext.len() < TAG_LENGTH {
            return Err(VaultCryptoError::InvalidFormat(format!(
                "Ciphertext must be at least {} bytes, got {}",
                TAG_LENGTH,
                sealed.ciphertext.len()
            )));
        }

        let unbound_key = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| VaultCryptoError::InvalidKey("Failed to create decryption key".to_string()))?;
        let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce::new(sealed.nonce));

        let mut in_out = sealed.ciphertext.clone();
        let plaintext = match opening_key.open_in_place(Aad::empty(), &mut in_out) {
            Ok(plaintext) => plaintext.to_vec(),
            Err(_) => return Err(VaultCryptoError::AuthenticationFailed),
        };
        in_out.zeroize();
        Ok(plaintext)
    }

    fn generate_salt(&self) -> Result<[u8; SALT_LENGTH], VaultCryptoError> {
        let mut salt = [0u8; SALT_LENGTH];
        self.rng
            .fill(&mut salt)
            .map_err(|_| VaultCryptoError::RandomGeneration("Failed to generate salt".to_string()))?;
        Ok(salt)
    }

    fn zeroize_memory(&self, data: &mut [u8]) {
        data.zeroize();
    }
}
