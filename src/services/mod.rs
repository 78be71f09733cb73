// LinkDeck services
// Services provide self-contained functionality: crypto, the vault codec, ordering and settings.

pub mod crypto_service;
pub mod ordering;
pub mod settings_engine;
pub mod vault_crypto;
