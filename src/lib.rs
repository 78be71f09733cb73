//! LinkDeck: a local-first link dashboard core.
//!
//! Public links live in a [`managers::link_store::LinkStore`]; private links
//! live in an encrypted vault opened through
//! [`managers::vault_session::VaultSession`]. Both persist whole values into a
//! [`database::KeyValueStore`]. The UI talks to this crate through the
//! `linkdeck-rpc` binary.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod rpc_handler;
pub mod types;
