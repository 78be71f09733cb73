// LinkDeck state managers
// Managers own mutable state: the public link collection and the private vault session.

pub mod link_store;
pub mod vault_session;
