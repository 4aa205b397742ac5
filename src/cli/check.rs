//! Configuration readiness check: resolves both files, materializes
//! every record, and lists the configured sites without running anything.

use anyhow::Result;
use std::path::Path;

use crate::client::browser::find_chromium;
use crate::config::{loader, AccountsAdapter, ConfigAdapter};
use crate::site::SiteRegistry;

pub async fn run(config_path: Option<&Path>, accounts_path: Option<&Path>) -> Result<()> {
    println!("Ritual Check");
    println!("============");
    println!();

    let config_file = loader::resolve_file_path(
        config_path,
        loader::SITE_CONFIG_FILENAME,
        &loader::site_config_fallback(),
    );
    match &config_file {
        Some(path) => println!("[OK] site config:   {}", path.display()),
        None => println!("[!!] site config:   not found at any location"),
    }

    let accounts_file = loader::resolve_file_path(
        accounts_path,
        loader::SITE_ACCOUNTS_FILENAME,
        &loader::site_accounts_fallback(),
    );
    match &accounts_file {
        Some(path) => println!("[OK] site accounts: {}", path.display()),
        None => println!("[!!] site accounts: not found at any location"),
    }

    match find_chromium() {
        Some(path) => println!("[OK] chromium:      {}", path.display()),
        None => println!("[--] chromium:      not found (browser tasks unavailable)"),
    }
    println!();

    let registry = SiteRegistry::with_builtin();
    println!("Registered variants: {}", registry.variants().join(", "));

    if config_file.is_none() {
        println!();
        println!("Status: NOT READY");
        return Ok(());
    }

    let adapter = ConfigAdapter::new(loader::load_site_config(config_path)?);
    for (name, dropped) in [
        ("RequesterConfig", adapter.requester_config()?.dropped_keys),
        ("TaskerConfig", adapter.tasker_config()?.dropped_keys),
        ("DebugConfig", adapter.debug_config()?.dropped_keys),
    ] {
        if dropped.is_empty() {
            println!("[OK] {name}");
        } else {
            println!("[??] {name}: dropped unknown keys: {}", dropped.join(", "));
        }
    }
    println!();

    let accounts = accounts_file
        .is_some()
        .then(|| loader::load_site_accounts(accounts_path))
        .transpose()?
        .map(AccountsAdapter::new);

    let site_names = adapter.site_names();
    println!("Sites ({}):", site_names.len());
    for site in &site_names {
        let conf = adapter.site_config(site)?;
        let account_count = accounts.as_ref().map(|a| a.accounts(site).len()).unwrap_or(0);
        let extras: Vec<&str> = conf.extension_keys().collect();
        println!(
            "  {} {site}: {} account(s), extensions: [{}]",
            if conf.enabled { "[OK]" } else { "[--]" },
            account_count,
            extras.join(", ")
        );
    }

    println!();
    println!("Status: READY");
    Ok(())
}
