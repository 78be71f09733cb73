//! Private vault session for LinkDeck.
//!
//! Holds the decrypted private links only while unlocked. Every mutation
//! re-seals the whole list under the session password on the blocking pool
//! and overwrites the stored token before the new list becomes visible. Locking zeroizes the
//! plaintext and the password.

use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::{Zeroize, Zeroizing};

use crate::database::kv_store::{KeyValueStore, VAULT_FLAGS_KEY, VAULT_TOKEN_KEY};
use crate::managers::link_store::{now_millis, require_title, require_url};
use crate::services::ordering;
use crate::services::vault_crypto::VaultCrypto;
use crate::types::errors::{StoreError, VaultCryptoError, VaultError};
use crate::types::link::{Link, LinkDraft, LinkUpdate, PrivateVaultPayload, ReorderScope, PRIVATE_CATEGORY_ID};
use crate::types::settings::VaultFlags;

/// Lifecycle of a vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Locked,
    /// Key derivation is running. Dropping the unlock future returns to `Locked`.
    Unlocking,
    Unlocked,
}

/// Resets the state to `Locked` if an unlock is abandoned mid-flight.
struct UnlockingGuard<'a> {
    state: &'a mut VaultState,
}

impl<'a> UnlockingGuard<'a> {
    fn enter(state: &'a mut VaultState) -> Self {
        *state = VaultState::Unlocking;
        Self { state }
    }

    fn finish(self, next: VaultState) {
        *self.state = next;
    }
}

impl Drop for UnlockingGuard<'_> {
    fn drop(&mut self) {
        if *self.state == VaultState::Unlocking {
            *self.state = VaultState::Locked;
        }
    }
}

/// Runs token decryption on the blocking pool.
async fn open_in_background(
    codec: VaultCrypto,
    password: Zeroizing<String>,
    token: String,
) -> Result<PrivateVaultPayload, VaultCryptoError> {
    tokio::task::spawn_blocking(move || codec.decrypt::<PrivateVaultPayload>(&password, &token))
        .await
        .map_err(|e| VaultCryptoError::KeyDerivation(e.to_string()))?
}

/// Runs token sealing on the blocking pool, handing the payload back with the token.
async fn seal_in_background(
    codec: VaultCrypto,
    password: Zeroizing<String>,
    mut payload: PrivateVaultPayload,
) -> Result<(PrivateVaultPayload, String), VaultError> {
    tokio::task::spawn_blocking(move || match codec.encrypt(&password, &payload) {
        Ok(token) => Ok((payload, token)),
        Err(e) => {
            payload.zeroize();
            Err(VaultError::Crypto(e.to_string()))
        }
    })
    .await
    .map_err(|_| VaultError::Cancelled)?
}

/// Maps a decrypt result onto the unlock policy.
///
/// A corrupt payload behind a valid tag opens as an empty vault.
fn accept_payload(result: Result<PrivateVaultPayload, VaultCryptoError>) -> Option<PrivateVaultPayload> {
    match result {
        Ok(payload) => Some(payload),
        Err(VaultCryptoError::CorruptPayload(_)) => {
            warn!("vault payload is not valid JSON, opening as empty");
            Some(PrivateVaultPayload::default())
        }
        Err(_) => None,
    }
}

fn invalid_link(err: StoreError) -> VaultError {
    match err {
        StoreError::InvalidLink(msg) => VaultError::InvalidLink(msg),
        other => VaultError::InvalidLink(other.to_string()),
    }
}

/// Encrypted private link partition bound to a [`KeyValueStore`].
pub struct VaultSession<S: KeyValueStore> {
    kv: S,
    codec: VaultCrypto,
    state: VaultState,
    password: Option<Zeroizing<String>>,
    links: Vec<Link>,
}

impl<S: KeyValueStore> VaultSession<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            codec: VaultCrypto::new(),
            state: VaultState::Locked,
            password: None,
            links: Vec::new(),
        }
    }

    pub fn state(&self) -> VaultState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == VaultState::Unlocked
    }

    /// True once a token has been written.
    pub fn is_initialized(&self) -> Result<bool, VaultError> {
        Ok(self.kv.get(VAULT_TOKEN_KEY)?.is_some())
    }

    /// Decrypts the stored token with `password`.
    ///
    /// Returns `false` on any failure without saying why. A vault that was
    /// never written unlocks with an empty list.
    pub async fn unlock(&mut self, password: &str) -> bool {
        self.lock();

        let token = match self.kv.get(VAULT_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read vault token");
                return false;
            }
        };

        let guard = UnlockingGuard::enter(&mut self.state);
        let payload = match token {
            None => Some(PrivateVaultPayload::default()),
            Some(token) => {
                let result = open_in_background(
                    self.codec.clone(),
                    Zeroizing::new(password.to_string()),
                    token,
                )
                .await;
                accept_payload(result)
            }
        };

        match payload {
            Some(mut payload) => {
                self.links = std::mem::take(&mut payload.links);
                self.password = Some(Zeroizing::new(password.to_string()));
                guard.finish(VaultState::Unlocked);
                info!(links = self.links.len(), "vault unlocked");
                true
            }
            None => {
                guard.finish(VaultState::Locked);
                info!("vault unlock rejected");
                false
            }
        }
    }

    /// Zeroizes and drops the plaintext list and password.
    pub fn lock(&mut self) {
        let was_unlocked = self.is_unlocked();
        self.links.zeroize();
        self.password = None;
        self.state = VaultState::Locked;
        if was_unlocked {
            info!("vault locked");
        }
    }

    /// Re-seals the vault under `new_password`.
    ///
    /// Fails with [`VaultError::UnlockFailed`] and leaves the token untouched
    /// if `old_password` does not open it. An unlocked session keeps running
    /// under the new password.
    pub async fn change_password(&mut self, old_password: &str, new_password: &str) -> Result<(), VaultError> {
        let token = self.kv.get(VAULT_TOKEN_KEY)?;
        let codec = self.codec.clone();
        let old = Zeroizing::new(old_password.to_string());
        let new = Zeroizing::new(new_password.to_string());

        let rekeyed = tokio::task::spawn_blocking(move || {
            let opened = match token {
                Some(token) => codec.decrypt::<PrivateVaultPayload>(&old, &token),
                None => Ok(PrivateVaultPayload::default()),
            };
            let Some(mut payload) = accept_payload(opened) else {
                return Err(VaultError::UnlockFailed);
            };
            let sealed = codec
                .encrypt(&new, &payload)
                .map_err(|e| VaultError::Crypto(e.to_string()));
            payload.zeroize();
            sealed
        })
        .await
        .map_err(|_| VaultError::Cancelled)??;

        self.kv.set(VAULT_TOKEN_KEY, &rekeyed)?;
        if self.is_unlocked() {
            self.password = Some(Zeroizing::new(new_password.to_string()));
        }
        info!("vault password changed");
        Ok(())
    }

    /// Persisted vault flags, or defaults when none are stored.
    pub fn flags(&self) -> Result<VaultFlags, VaultError> {
        match self.kv.get(VAULT_FLAGS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "vault flags are corrupt, using defaults");
                VaultFlags::default()
            })),
            None => Ok(VaultFlags::default()),
        }
    }

    pub fn set_flags(&self, flags: &VaultFlags) -> Result<(), VaultError> {
        let json = serde_json::to_string(flags).map_err(|e| VaultError::Persistence(e.to_string()))?;
        self.kv.set(VAULT_FLAGS_KEY, &json)?;
        Ok(())
    }

    /// Private links in presentation order.
    pub fn links(&self) -> Result<&[Link], VaultError> {
        if !self.is_unlocked() {
            return Err(VaultError::Locked);
        }
        Ok(&self.links)
    }

    pub async fn add_link(&mut self, draft: LinkDraft) -> Result<String, VaultError> {
        self.require_unlocked()?;
        let link = Link {
            id: Uuid::new_v4().to_string(),
            url: require_url(&draft.url).map_err(invalid_link)?,
            title: require_title(&draft.title).map_err(invalid_link)?,
            description: draft.description.filter(|d| !d.is_empty()),
            category_id: PRIVATE_CATEGORY_ID.to_string(),
            icon: draft.icon.filter(|i| !i.is_empty()),
            pinned: draft.pinned,
            order: None,
            pinned_order: None,
            created_at: now_millis(),
        };
        let id = link.id.clone();
        let next = ordering::insert(&self.links, link);
        self.commit(next).await?;
        debug!("added private link");
        Ok(id)
    }

    pub async fn update_link(&mut self, update: LinkUpdate) -> Result<(), VaultError> {
        self.require_unlocked()?;
        let index = self
            .links
            .iter()
            .position(|l| l.id == update.id)
            .ok_or_else(|| VaultError::LinkNotFound(update.id.clone()))?;

        let mut next = self.links.clone();
        let link = &mut next[index];
        if let Some(url) = update.url.as_deref() {
            link.url = require_url(url).map_err(invalid_link)?;
        }
        if let Some(title) = update.title.as_deref() {
            link.title = require_title(title).map_err(invalid_link)?;
        }
        if let Some(description) = update.description {
            link.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(icon) = update.icon {
            link.icon = Some(icon).filter(|i| !i.is_empty());
        }
        let pin_changed = update.pinned.is_some_and(|p| p != link.pinned);
        if pin_changed {
            let toggled = ordering::toggle_pin(&next, &update.id);
            next.zeroize();
            next = toggled.ok_or_else(|| VaultError::LinkNotFound(update.id.clone()))?;
        }
        self.commit(next).await
    }

    pub async fn delete_link(&mut self, id: &str) -> Result<(), VaultError> {
        self.require_unlocked()?;
        let next = ordering::remove(&self.links, id).ok_or_else(|| VaultError::LinkNotFound(id.to_string()))?;
        self.commit(next).await
    }

    pub async fn toggle_pin(&mut self, id: &str) -> Result<(), VaultError> {
        self.require_unlocked()?;
        let next = ordering::toggle_pin(&self.links, id).ok_or_else(|| VaultError::LinkNotFound(id.to_string()))?;
        self.commit(next).await
    }

    pub async fn reorder_links(&mut self, active_id: &str, over_id: &str) -> Result<(), VaultError> {
        self.reorder(active_id, over_id, &ReorderScope::Category(PRIVATE_CATEGORY_ID.to_string()))
            .await
    }

    pub async fn reorder_pinned_links(&mut self, active_id: &str, over_id: &str) -> Result<(), VaultError> {
        self.reorder(active_id, over_id, &ReorderScope::Pinned).await
    }

    async fn reorder(&mut self, active_id: &str, over_id: &str, scope: &ReorderScope) -> Result<(), VaultError> {
        self.require_unlocked()?;
        let mut next = ordering::reorder(&self.links, active_id, over_id, scope);
        if next == self.links {
            next.zeroize();
            return Ok(());
        }
        self.commit(next).await
    }

    fn require_unlocked(&self) -> Result<&Zeroizing<String>, VaultError> {
        match (&self.password, self.state) {
            (Some(password), VaultState::Unlocked) => Ok(password),
            _ => Err(VaultError::Locked),
        }
    }

    /// Seals `next` off the async workers, writes the token, then swaps `next` in.
    ///
    /// On failure the previous list stays current and `next` is zeroized.
    /// Dropping the future before the write leaves both token and list as they were.
    async fn commit(&mut self, next: Vec<Link>) -> Result<(), VaultError> {
        let password = self.require_unlocked()?.clone();
        let payload = PrivateVaultPayload { links: next };
        let (mut payload, token) = seal_in_background(self.codec.clone(), password, payload).await?;

        if let Err(e) = self.kv.set(VAULT_TOKEN_KEY, &token) {
            payload.zeroize();
            warn!(error = %e, "failed to persist vault token");
            return Err(e.into());
        }

        let mut previous = std::mem::replace(&mut self.links, std::mem::take(&mut payload.links));
        previous.zeroize();
        Ok(())
    }
}

impl<S: KeyValueStore> Drop for VaultSession<S> {
    fn drop(&mut self) {
        self.links.zeroize();
    }
}
