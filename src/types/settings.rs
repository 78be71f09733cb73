use serde::{Deserialize, Serialize};

/// Top-level application settings, stored as `settings.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub vault: VaultSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the key-value store lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Overrides `<data dir>/linkdeck.db` when set.
    pub database_path: Option<String>,
}

/// Private vault preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaultSettings {
    pub enabled: bool,
    /// Idle minutes before the host should call `lock`. Enforced by the host UI.
    pub auto_lock_minutes: Option<u32>,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_lock_minutes: None,
        }
    }
}

/// Log output preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. `"info"` or `"linkdeck=debug"`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Vault flags persisted next to the token in the key-value store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultFlags {
    pub enabled: bool,
    /// The host may offer to unlock at startup. No secret is stored.
    #[serde(default)]
    pub auto_unlock_hint: bool,
}
