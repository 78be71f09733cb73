//! Unit tests for the `v1` vault token codec.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rstest::rstest;
use serde::{Deserialize, Serialize};

use linkdeck::services::crypto_service::{CryptoService, CryptoServiceTrait};
use linkdeck::services::vault_crypto::{VaultCrypto, VAULT_VERSION};
use linkdeck::types::errors::VaultCryptoError;
use linkdeck::types::link::{Link, PrivateVaultPayload};

fn private_link(id: &str) -> Link {
    Link {
        id: id.to_string(),
        url: "https://bank.example".to_string(),
        title: "Bank".to_string(),
        description: Some("statements".to_string()),
        category_id: "private".to_string(),
        icon: None,
        pinned: false,
        order: Some(0),
        pinned_order: None,
        created_at: 1_700_000_000_000,
    }
}

/// Builds a token by hand from the documented layout.
fn hand_built_token(password: &str, plaintext: &[u8]) -> String {
    let crypto = CryptoService::new();
    let salt = crypto.generate_salt().unwrap();
    let key = crypto.derive_key(password, &salt).unwrap();
    let sealed = crypto.encrypt_aes256gcm(plaintext, &key).unwrap();
    format!(
        "v1.{}.{}.{}",
        BASE64.encode(salt),
        BASE64.encode(sealed.nonce),
        BASE64.encode(&sealed.ciphertext)
    )
}

#[test]
fn test_empty_vault_opens_with_correct_password_only() {
    let codec = VaultCrypto::new();
    let token = codec.encrypt("correct", &PrivateVaultPayload::default()).unwrap();

    let opened: PrivateVaultPayload = codec.decrypt("correct", &token).unwrap();
    assert!(opened.links.is_empty());

    let wrong = codec.decrypt::<PrivateVaultPayload>("wrong", &token);
    assert_eq!(wrong, Err(VaultCryptoError::AuthenticationFailed));
}

#[test]
fn test_payload_roundtrip_preserves_links() {
    let codec = VaultCrypto::new();
    let payload = PrivateVaultPayload {
        links: vec![private_link("a"), private_link("b")],
    };
    let token = codec.encrypt("pw", &payload).unwrap();
    assert!(token.starts_with(&format!("{}.", VAULT_VERSION)));
    assert!(token.is_ascii());

    let opened: PrivateVaultPayload = codec.decrypt("pw", &token).unwrap();
    assert_eq!(opened, payload);
}

#[test]
fn test_decrypts_hand_built_token() {
    let token = hand_built_token("correct", br#"{"links":[]}"#);
    let opened: PrivateVaultPayload = VaultCrypto::new().decrypt("correct", &token).unwrap();
    assert!(opened.links.is_empty());
}

#[test]
fn test_valid_tag_with_non_json_plaintext_is_corrupt_payload() {
    let token = hand_built_token("pw", b"not json at all");
    let result = VaultCrypto::new().decrypt::<PrivateVaultPayload>("pw", &token);
    assert!(matches!(result, Err(VaultCryptoError::CorruptPayload(_))));
}

#[test]
fn test_payload_without_links_field_is_corrupt() {
    let token = hand_built_token("pw", br#"{"items":[]}"#);
    let result = VaultCrypto::new().decrypt::<PrivateVaultPayload>("pw", &token);
    assert!(matches!(result, Err(VaultCryptoError::CorruptPayload(_))));
}

#[test]
fn test_codec_is_generic_over_payload() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }
    let codec = VaultCrypto::new();
    let token = codec.encrypt("pw", &Note { text: "hi".to_string() }).unwrap();
    let note: Note = codec.decrypt("pw", &token).unwrap();
    assert_eq!(note.text, "hi");
}

#[test]
fn test_flipped_ciphertext_byte_fails() {
    let codec = VaultCrypto::new();
    let token = codec.encrypt("pw", &PrivateVaultPayload::default()).unwrap();
    let fields: Vec<&str> = token.split('.').collect();
    let mut ciphertext = BASE64.decode(fields[3]).unwrap();
    ciphertext[0] ^= 0x80;
    let tampered = format!("{}.{}.{}.{}", fields[0], fields[1], fields[2], BASE64.encode(ciphertext));

    assert_eq!(
        codec.decrypt::<PrivateVaultPayload>("pw", &tampered),
        Err(VaultCryptoError::AuthenticationFailed)
    );
}

#[rstest]
#[case::empty("")]
#[case::three_fields("v1.AAAA.AAAA")]
#[case::five_fields("v1.AAAA.AAAA.AAAA.AAAA")]
#[case::wrong_version("v2.AAAAAAAAAAAAAAAAAAAAAA==.AAAAAAAAAAAAAAAA.AAAAAAAAAAAAAAAAAAAAAA==")]
#[case::empty_salt("v1..AAAAAAAAAAAAAAAA.AAAAAAAAAAAAAAAAAAAAAA==")]
#[case::not_base64("v1.!!!!.AAAAAAAAAAAAAAAA.AAAAAAAAAAAAAAAAAAAAAA==")]
#[case::short_salt("v1.AAAA.AAAAAAAAAAAAAAAA.AAAAAAAAAAAAAAAAAAAAAA==")]
#[case::short_nonce("v1.AAAAAAAAAAAAAAAAAAAAAA==.AAAA.AAAAAAAAAAAAAAAAAAAAAA==")]
fn test_malformed_tokens_are_invalid_format(#[case] token: &str) {
    let result = VaultCrypto::new().decrypt::<PrivateVaultPayload>("pw", token);
    assert!(
        matches!(result, Err(VaultCryptoError::InvalidFormat(_))),
        "expected InvalidFormat for {:?}, got {:?}",
        token,
        result
    );
}

#[test]
fn test_truncated_ciphertext_is_invalid_format() {
    // 16-byte salt, 12-byte nonce, 8-byte ciphertext (shorter than the tag).
    let token = format!(
        "v1.{}.{}.{}",
        BASE64.encode([0u8; 16]),
        BASE64.encode([0u8; 12]),
        BASE64.encode([0u8; 8])
    );
    let result = VaultCrypto::new().decrypt::<PrivateVaultPayload>("pw", &token);
    assert!(matches!(result, Err(VaultCryptoError::InvalidFormat(_))));
}
