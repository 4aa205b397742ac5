//! Config file resolution and parsing.
//!
//! Layered resolution in priority order:
//! 1. User-specified path via arguments
//! 2. Local default file in the current working directory
//! 3. The fallback path under `~/.ritual/`
//!
//! Parsed documents are memoized per resolved path, so repeated loads
//! return the cached document without re-reading the file.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use super::error::{ConfigError, ConfigResult};

/// A parsed config document, normalized to a JSON mapping regardless of
/// the on-disk format.
pub type RawDocument = serde_json::Map<String, Value>;

pub const SITE_CONFIG_FILENAME: &str = "site_config.toml";
pub const SITE_ACCOUNTS_FILENAME: &str = "site_accounts.toml";

/// Application config directory (`~/.ritual/`).
pub fn app_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".ritual")
}

pub fn site_config_fallback() -> PathBuf {
    app_config_dir().join(SITE_CONFIG_FILENAME)
}

pub fn site_accounts_fallback() -> PathBuf {
    app_config_dir().join(SITE_ACCOUNTS_FILENAME)
}

/// Resolve the file path to use based on the prioritized lookup order.
pub fn resolve_file_path(
    user_path: Option<&Path>,
    local_filename: &str,
    fallback_path: &Path,
) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_in(&cwd, user_path, local_filename, fallback_path)
}

fn resolve_in(
    cwd: &Path,
    user_path: Option<&Path>,
    local_filename: &str,
    fallback_path: &Path,
) -> Option<PathBuf> {
    if let Some(user_path) = user_path {
        if user_path.is_file() {
            return Some(user_path.to_path_buf());
        }
        tracing::warn!("specified file not found: {}", user_path.display());
    }

    let local_path = cwd.join(local_filename);
    if local_path.is_file() {
        tracing::debug!("using local file: {}", local_path.display());
        return Some(local_path);
    }

    if fallback_path.is_file() {
        tracing::debug!("using fallback file: {}", fallback_path.display());
        return Some(fallback_path.to_path_buf());
    }

    tracing::warn!("no file found at any location for: {local_filename}");
    None
}

/// Parse a config file by extension (`.toml` or `.json`).
///
/// A parsed top-level value that is not a mapping is treated as an empty
/// mapping (logged, not fatal), so a partial or malformed config degrades
/// instead of aborting the run.
pub fn load_document(path: &Path) -> ConfigResult<RawDocument> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" | "toml" => {}
        _ => return Err(ConfigError::UnsupportedFormat(ext)),
    }

    let text = std::fs::read_to_string(path)?;
    let value: Value = match ext.as_str() {
        "json" => serde_json::from_str(&text)?,
        _ => toml::from_str(&text)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => {
            tracing::warn!(
                "{} content is not a mapping: {}",
                ext.to_uppercase(),
                path.display()
            );
            Ok(RawDocument::new())
        }
    }
}

fn document_cache() -> &'static Mutex<HashMap<PathBuf, Arc<RawDocument>>> {
    static CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<RawDocument>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn load_with_cache(path: PathBuf) -> ConfigResult<Arc<RawDocument>> {
    // Key on the canonical path so an explicit path and a cwd resolution
    // pointing at the same file share one parse.
    let key = path.canonicalize().unwrap_or(path);

    let mut cache = document_cache()
        .lock()
        .expect("config document cache poisoned");
    if let Some(doc) = cache.get(&key) {
        tracing::debug!("config cache hit: {}", key.display());
        return Ok(Arc::clone(doc));
    }

    let doc = Arc::new(load_document(&key)?);
    cache.insert(key, Arc::clone(&doc));
    Ok(doc)
}

/// Load the site configuration document, resolving the path from user
/// input, the working directory, or the `~/.ritual/` fallback.
pub fn load_site_config(config_path: Option<&Path>) -> ConfigResult<Arc<RawDocument>> {
    let path = resolve_file_path(config_path, SITE_CONFIG_FILENAME, &site_config_fallback())
        .ok_or(ConfigError::NotFound("site config"))?;
    load_with_cache(path)
}

/// Load the site accounts document, resolving the path the same way.
pub fn load_site_accounts(accounts_path: Option<&Path>) -> ConfigResult<Arc<RawDocument>> {
    let path = resolve_file_path(accounts_path, SITE_ACCOUNTS_FILENAME, &site_accounts_fallback())
        .ok_or(ConfigError::NotFound("site accounts"))?;
    load_with_cache(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, "answer = 42\n").unwrap();
    }

    #[test]
    fn test_path_priority_user_first() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let cwd = dir.path().join("cwd");
        fs::create_dir(&cwd).unwrap();
        let local = cwd.join("site_config.toml");
        let fallback = dir.path().join("fallback.toml");
        touch(&user);
        touch(&local);
        touch(&fallback);

        let resolved = resolve_in(&cwd, Some(&user), "site_config.toml", &fallback);
        assert_eq!(resolved, Some(user));
    }

    #[test]
    fn test_path_priority_local_then_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().join("cwd");
        fs::create_dir(&cwd).unwrap();
        let local = cwd.join("site_config.toml");
        let fallback = dir.path().join("fallback.toml");
        touch(&local);
        touch(&fallback);

        // Missing user path falls through to the local file.
        let missing = dir.path().join("missing.toml");
        let resolved = resolve_in(&cwd, Some(&missing), "site_config.toml", &fallback);
        assert_eq!(resolved, Some(local.clone()));

        // Without the local file, the fallback wins.
        fs::remove_file(&local).unwrap();
        let resolved = resolve_in(&cwd, None, "site_config.toml", &fallback);
        assert_eq!(resolved, Some(fallback.clone()));

        // With nothing present, resolution reports not-found.
        fs::remove_file(&fallback).unwrap();
        let resolved = resolve_in(&cwd, None, "site_config.toml", &fallback);
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "a: 1\n").unwrap();

        let result = load_document(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
    }

    #[test]
    fn test_non_mapping_soft_fails_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let doc = load_document(&path).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_toml_and_json_parse_to_same_shape() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("a.toml");
        let json_path = dir.path().join("a.json");
        fs::write(&toml_path, "[global.requests]\nretry_times = 2\n").unwrap();
        fs::write(&json_path, r#"{"global": {"requests": {"retry_times": 2}}}"#).unwrap();

        let from_toml = load_document(&toml_path).unwrap();
        let from_json = load_document(&json_path).unwrap();
        assert_eq!(from_toml, from_json);
    }

    #[test]
    fn test_load_is_memoized_per_resolved_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.toml");
        fs::write(&path, "first = 1\n").unwrap();

        let first = load_with_cache(path.clone()).unwrap();
        assert!(first.contains_key("first"));

        // Rewriting the file must not invalidate the cached parse.
        fs::write(&path, "second = 2\n").unwrap();
        let again = load_with_cache(path).unwrap();
        assert!(again.contains_key("first"));
        assert!(Arc::ptr_eq(&first, &again));
    }
}
