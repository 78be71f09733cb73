use linkdeck::types::errors::*;

// === VaultCryptoError Tests ===

#[test]
fn vault_crypto_error_display_variants() {
    assert_eq!(
        VaultCryptoError::InvalidFormat("expected 4 fields, got 3".to_string()).to_string(),
        "Invalid vault token: expected 4 fields, got 3"
    );
    assert_eq!(
        VaultCryptoError::AuthenticationFailed.to_string(),
        "Vault authentication failed: wrong password or corrupted data"
    );
    assert_eq!(
        VaultCryptoError::CorruptPayload("missing field `links`".to_string()).to_string(),
        "Corrupt vault payload: missing field `links`"
    );
    assert_eq!(
        VaultCryptoError::InvalidKey("wrong length".to_string()).to_string(),
        "Invalid key: wrong length"
    );
}

#[test]
fn vault_crypto_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(VaultCryptoError::AuthenticationFailed);
    assert!(err.source().is_none());
}

// === StoreError Tests ===

#[test]
fn store_error_display_variants() {
    assert_eq!(StoreError::LinkNotFound("l-1".to_string()).to_string(), "Link not found: l-1");
    assert_eq!(
        StoreError::CategoryNotFound("c-1".to_string()).to_string(),
        "Category not found: c-1"
    );
    assert_eq!(
        StoreError::ForbiddenOperation("the common category cannot be deleted".to_string()).to_string(),
        "Operation not allowed: the common category cannot be deleted"
    );
    assert_eq!(
        StoreError::Persistence("disk full".to_string()).to_string(),
        "Failed to persist links: disk full"
    );
}

#[test]
fn store_error_only_persistence_is_retryable() {
    assert!(StoreError::Persistence("x".to_string()).is_retryable());
    assert!(!StoreError::ForbiddenOperation("x".to_string()).is_retryable());
    assert!(!StoreError::LinkNotFound("x".to_string()).is_retryable());
}

#[test]
fn kv_error_converts_to_retryable_store_error() {
    let err: StoreError = KvError::Backend("locked".to_string()).into();
    assert_eq!(err, StoreError::Persistence("Key-value store error: locked".to_string()));
    assert!(err.is_retryable());
}

// === VaultError Tests ===

#[test]
fn vault_error_display_variants() {
    assert_eq!(VaultError::Locked.to_string(), "Private vault is locked");
    assert_eq!(VaultError::UnlockFailed.to_string(), "Unlock failed");
    assert_eq!(VaultError::Cancelled.to_string(), "Vault operation cancelled");
    assert_eq!(
        VaultError::LinkNotFound("p-1".to_string()).to_string(),
        "Private link not found: p-1"
    );
}

#[test]
fn vault_error_retryable_variants() {
    assert!(VaultError::Persistence("x".to_string()).is_retryable());
    assert!(VaultError::Cancelled.is_retryable());
    assert!(!VaultError::UnlockFailed.is_retryable());
    assert!(!VaultError::Locked.is_retryable());
}

#[test]
fn kv_error_converts_to_vault_persistence() {
    let err: VaultError = KvError::Backend("io".to_string()).into();
    assert!(matches!(err, VaultError::Persistence(_)));
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::InvalidKey("vault.color".to_string()).to_string(),
        "Invalid settings key: vault.color"
    );
}
