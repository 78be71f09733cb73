//! RPC method handler for the LinkDeck JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdin/stdout.
//! `handle_method` dispatches one call to the link store, the vault session
//! or the settings engine held by [`App`].

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::managers::link_store::LinkStoreTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::link::{Category, Link, LinkDraft, LinkUpdate};
use crate::types::settings::VaultFlags;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {}", e))
}

fn parse_field<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    let value = params.get(key).cloned().ok_or_else(|| format!("missing {}", key))?;
    serde_json::from_value(value).map_err(|e| format!("invalid {}: {}", key, e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn require_vault(app: &App) -> Result<(), String> {
    if app.vault_enabled() {
        Ok(())
    } else {
        Err("private vault is disabled".to_string())
    }
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with a user-facing message.
/// Vault calls that run key derivation suspend while holding the app lock.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Links ───
        "link.list" => {
            let a = app.lock().await;
            match params.get("categoryId").and_then(|v| v.as_str()) {
                Some(category_id) => to_json(&a.store.links_in_category(category_id)),
                None => to_json(&a.store.links()),
            }
        }
        "link.pinned" => {
            let a = app.lock().await;
            to_json(&a.store.pinned_links())
        }
        "link.add" => {
            let draft: LinkDraft = parse_params(params)?;
            let mut a = app.lock().await;
            let id = a.store.add_link(draft).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "link.update" => {
            let update: LinkUpdate = parse_params(params)?;
            let mut a = app.lock().await;
            a.store.update_link(update).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.delete" => {
            let id = str_param(params, "id")?;
            let mut a = app.lock().await;
            a.store.delete_link(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.togglePin" => {
            let id = str_param(params, "id")?;
            let mut a = app.lock().await;
            a.store.toggle_pin(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.reorder" => {
            let active_id = str_param(params, "activeId")?;
            let over_id = str_param(params, "overId")?;
            let category_id = str_param(params, "categoryId")?;
            let mut a = app.lock().await;
            a.store
                .reorder_links(active_id, over_id, category_id)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.reorderPinned" => {
            let active_id = str_param(params, "activeId")?;
            let over_id = str_param(params, "overId")?;
            let mut a = app.lock().await;
            a.store
                .reorder_pinned_links(active_id, over_id)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Categories ───
        "category.list" => {
            let a = app.lock().await;
            to_json(&a.store.categories())
        }
        "category.add" => {
            let name = str_param(params, "name")?;
            let icon = params.get("icon").and_then(|v| v.as_str()).unwrap_or("Folder");
            let mut a = app.lock().await;
            let id = a.store.add_category(name, icon).map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "category.update" => {
            let category: Category = parse_params(params)?;
            let mut a = app.lock().await;
            a.store.update_category(category).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "category.delete" => {
            let id = str_param(params, "id")?;
            let mut a = app.lock().await;
            a.store.delete_category(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Import / export ───
        "data.import" => {
            let links: Vec<Link> = parse_field(params, "links")?;
            let categories: Vec<Category> = match params.get("categories") {
                Some(_) => parse_field(params, "categories")?,
                None => Vec::new(),
            };
            let mut a = app.lock().await;
            let summary = a.store.import_data(links, categories).map_err(|e| e.to_string())?;
            Ok(json!({
                "linksAdded": summary.links_added,
                "categoriesAdded": summary.categories_added,
                "idsReassigned": summary.ids_reassigned,
                "linksSkipped": summary.links_skipped,
            }))
        }
        "data.export" => {
            let a = app.lock().await;
            to_json(&a.store.snapshot())
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().await;
            to_json(a.settings_engine.get_settings())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().await;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            if key == "vault.enabled" && !a.vault_enabled() {
                a.vault.lock();
            }
            Ok(json!({"ok": true}))
        }

        // ─── Private vault ───
        "vault.status" => {
            let a = app.lock().await;
            let initialized = a.vault.is_initialized().map_err(|e| e.to_string())?;
            Ok(json!({
                "enabled": a.vault_enabled(),
                "initialized": initialized,
                "unlocked": a.vault.is_unlocked(),
            }))
        }
        "vault.unlock" => {
            let password = str_param(params, "password")?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            let ok = a.vault.unlock(password).await;
            Ok(json!({"ok": ok}))
        }
        "vault.lock" => {
            let mut a = app.lock().await;
            a.vault.lock();
            Ok(json!({"ok": true}))
        }
        "vault.changePassword" => {
            let old_password = str_param(params, "oldPassword")?;
            let new_password = str_param(params, "newPassword")?;
            if new_password.is_empty() {
                return Err("new password must not be empty".to_string());
            }
            let mut a = app.lock().await;
            require_vault(&a)?;
            a.vault
                .change_password(old_password, new_password)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "vault.links" => {
            let a = app.lock().await;
            let links = a.vault.links().map_err(|e| e.to_string())?;
            to_json(&links)
        }
        "vault.add" => {
            let draft: LinkDraft = parse_params(params)?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            let id = a.vault.add_link(draft).await.map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "vault.update" => {
            let update: LinkUpdate = parse_params(params)?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            a.vault.update_link(update).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "vault.delete" => {
            let id = str_param(params, "id")?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            a.vault.delete_link(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "vault.togglePin" => {
            let id = str_param(params, "id")?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            a.vault.toggle_pin(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "vault.reorder" => {
            let active_id = str_param(params, "activeId")?;
            let over_id = str_param(params, "overId")?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            a.vault.reorder_links(active_id, over_id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "vault.reorderPinned" => {
            let active_id = str_param(params, "activeId")?;
            let over_id = str_param(params, "overId")?;
            let mut a = app.lock().await;
            require_vault(&a)?;
            a.vault
                .reorder_pinned_links(active_id, over_id)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "vault.flags.get" => {
            let a = app.lock().await;
            let flags = a.vault.flags().map_err(|e| e.to_string())?;
            to_json(&flags)
        }
        "vault.flags.set" => {
            let flags: VaultFlags = parse_params(params)?;
            let a = app.lock().await;
            a.vault.set_flags(&flags).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
