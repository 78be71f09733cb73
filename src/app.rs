//! App Core for LinkDeck.
//!
//! Owns the settings, the public link store and the private vault session.
//! Both managers share one SQLite key-value store.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::database::connection::Database;
use crate::managers::link_store::LinkStore;
use crate::managers::vault_session::VaultSession;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// Central application struct. Commands reach it through `rpc_handler`.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub store: LinkStore<Arc<Database>>,
    pub vault: VaultSession<Arc<Database>>,
}

impl App {
    /// Opens the database at `db_path` and loads settings from the default
    /// config location.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(None);
        if let Err(e) = settings_engine.load() {
            warn!(error = %e, "settings unreadable, using defaults");
        }
        Self::with_settings(db_path, settings_engine)
    }

    /// Opens the database at `db_path` with an already prepared settings engine.
    pub fn with_settings(db_path: &str, settings_engine: SettingsEngine) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Arc::new(Database::open(db_path)?);
        info!(path = db_path, "database opened");
        Ok(Self::assemble(db, settings_engine))
    }

    /// An app over a throwaway in-memory database. Settings are not loaded.
    pub fn in_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open_in_memory()?);
        Ok(Self::assemble(db, SettingsEngine::new(None)))
    }

    fn assemble(db: Arc<Database>, settings_engine: SettingsEngine) -> Self {
        let store = LinkStore::open(db.clone());
        let vault = VaultSession::new(db.clone());
        Self {
            db,
            settings_engine,
            store,
            vault,
        }
    }

    /// False when `vault.enabled` is switched off in settings.
    pub fn vault_enabled(&self) -> bool {
        self.settings_engine.get_settings().vault.enabled
    }

    /// Locks the vault and retries any link snapshot write that failed earlier.
    pub fn shutdown(&mut self) {
        self.vault.lock();
        if self.store.is_dirty() {
            if let Err(e) = self.store.flush() {
                warn!(error = %e, "could not persist links on shutdown");
            }
        }
        info!("linkdeck shut down");
    }
}
