// LinkDeck platform paths
// Config and data directories per OS, chosen with `cfg(target_os)`.
//
// - Linux:   $XDG_CONFIG_HOME/linkdeck, $XDG_DATA_HOME/linkdeck
//            (falling back to ~/.config and ~/.local/share)
// - macOS:   ~/Library/Application Support/LinkDeck for both
// - Windows: %APPDATA%\LinkDeck for both

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    let var = if cfg!(target_os = "windows") { "USERPROFILE" } else { "HOME" };
    PathBuf::from(env::var(var).unwrap_or_else(|_| env::temp_dir().to_string_lossy().to_string()))
}

#[cfg(target_os = "linux")]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join("linkdeck"),
        _ => fallback
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join("linkdeck"),
    }
}

#[cfg(target_os = "macos")]
fn app_support_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("LinkDeck")
}

#[cfg(target_os = "windows")]
fn app_data_dir() -> PathBuf {
    match env::var("APPDATA") {
        Ok(dir) => PathBuf::from(dir).join("LinkDeck"),
        Err(_) => home_dir().join("AppData").join("Roaming").join("LinkDeck"),
    }
}

/// Directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        app_data_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        home_dir().join(".linkdeck")
    }
}

/// Directory holding the SQLite key-value store.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        app_data_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        home_dir().join(".linkdeck")
    }
}
