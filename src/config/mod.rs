//! Layered configuration: file resolution, parsing, and typed
//! materialization with explicit diagnostics.

pub mod adapter;
pub mod cookies;
pub mod error;
pub mod loader;
pub mod models;

pub use adapter::{AccountRegistry, AccountsAdapter, ConfigAdapter, Materialized};
pub use cookies::{resolve_cookies, CookieSource};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_site_accounts, load_site_config, resolve_file_path, RawDocument};
pub use models::{Account, DebugConfig, LogLevel, RequesterConfig, SiteConfig, TaskerConfig};
