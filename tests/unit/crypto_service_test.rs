//! Unit tests for the ring-backed KDF + AEAD service.

use linkdeck::services::crypto_service::{
    CryptoService, CryptoServiceTrait, KEY_LENGTH, NONCE_LENGTH, SALT_LENGTH, TAG_LENGTH,
};
use linkdeck::types::errors::VaultCryptoError;

#[test]
fn test_derived_key_is_deterministic() {
    let service = CryptoService::new();
    let a = service.derive_key("password", b"saltsaltsaltsalt").unwrap();
    let b = service.derive_key("password", b"saltsaltsaltsalt").unwrap();
    assert_eq!(a.len(), KEY_LENGTH);
    assert_eq!(a, b);
}

#[test]
fn test_different_passwords_produce_different_keys() {
    let service = CryptoService::new();
    let salt = service.generate_salt().unwrap();
    assert_ne!(
        service.derive_key("correct", &salt).unwrap(),
        service.derive_key("wrong", &salt).unwrap()
    );
}

#[test]
fn test_empty_password_still_derives() {
    let service = CryptoService::new();
    let key = service.derive_key("", &[0u8; SALT_LENGTH]).unwrap();
    assert_eq!(key.len(), KEY_LENGTH);
}

#[test]
fn test_seal_open_with_derived_key() {
    let service = CryptoService::new();
    let salt = service.generate_salt().unwrap();
    let key = service.derive_key("hunter2", &salt).unwrap();

    let sealed = service.encrypt_aes256gcm(br#"{"links":[]}"#, &key).unwrap();
    assert_eq!(sealed.nonce.len(), NONCE_LENGTH);
    assert_eq!(sealed.ciphertext.len(), br#"{"links":[]}"#.len() + TAG_LENGTH);

    let opened = service.decrypt_aes256gcm(&sealed, &key).unwrap();
    assert_eq!(opened, br#"{"links":[]}"#);
}

#[test]
fn test_nonces_are_fresh_per_seal() {
    let service = CryptoService::new();
    let key = vec![7u8; KEY_LENGTH];
    let a = service.encrypt_aes256gcm(b"same", &key).unwrap();
    let b = service.encrypt_aes256gcm(b"same", &key).unwrap();
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn test_swapped_nonce_fails_authentication() {
    let service = CryptoService::new();
    let key = vec![9u8; KEY_LENGTH];
    let mut sealed = service.encrypt_aes256gcm(b"payload", &key).unwrap();
    sealed.nonce[0] ^= 0xFF;
    assert_eq!(
        service.decrypt_aes256gcm(&sealed, &key),
        Err(VaultCryptoError::AuthenticationFailed)
    );
}

#[test]
fn test_decrypt_rejects_short_key() {
    let service = CryptoService::new();
    let sealed = service.encrypt_aes256gcm(b"x", &[1u8; KEY_LENGTH]).unwrap();
    assert!(matches!(
        service.decrypt_aes256gcm(&sealed, &[1u8; 31]),
        Err(VaultCryptoError::InvalidKey(_))
    ));
}
