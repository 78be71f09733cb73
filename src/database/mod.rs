//! LinkDeck persistence layer.
//!
//! A whole-value key-value interface ([`KeyValueStore`]) with a SQLite
//! backend and an in-memory one.
//!
//! # Usage
//!
//! ```no_run
//! use linkdeck::database::{Database, KeyValueStore, DATA_KEY};
//!
//! let db = Database::open("linkdeck.db").expect("failed to open database");
//! let snapshot = db.get(DATA_KEY).expect("read failed");
//! ```

pub mod connection;
pub mod kv_store;
pub mod migrations;

pub use connection::Database;
pub use kv_store::{KeyValueStore, MemoryStore, DATA_KEY, VAULT_FLAGS_KEY, VAULT_TOKEN_KEY};
