//! Execute the configured daily tasks for every site and account.

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::BrowserClient;
use crate::config::{
    load_site_accounts, load_site_config, AccountsAdapter, ConfigAdapter, DebugConfig,
};
use crate::site::SiteRegistry;
use crate::tasker::{AccountJob, Tasker, TaskStatus};

pub async fn run(
    config_path: Option<&Path>,
    accounts_path: Option<&Path>,
    site_filter: &[String],
    verbose: bool,
) -> Result<()> {
    let adapter = ConfigAdapter::new(load_site_config(config_path)?);

    let debug = adapter.debug_config()?.value;
    init_tracing(&debug, verbose);
    info!("starting ritual v{}", env!("CARGO_PKG_VERSION"));

    let request_conf = adapter.requester_config()?.value;
    let tasker_conf = adapter.tasker_config()?.value;
    let accounts = AccountsAdapter::new(load_site_accounts(accounts_path)?);

    let mut jobs = Vec::new();
    let mut needs_browser = false;
    for site in adapter.site_names() {
        if !site_filter.is_empty() && !site_filter.contains(&site) {
            continue;
        }
        let site_conf = adapter.site_config(&site)?;
        let site_accounts = accounts.accounts(&site);
        if site_accounts.is_empty() {
            warn!("no accounts configured for site '{site}'");
            continue;
        }
        if site_conf.enabled && site_conf.wants_browser() {
            needs_browser = true;
        }
        for (key, account) in site_accounts {
            jobs.push(AccountJob {
                site: site.clone(),
                account_key: key.clone(),
                account: account.clone(),
                site_conf: site_conf.clone(),
            });
        }
    }

    if jobs.is_empty() {
        bail!("nothing to run: no configured site has accounts");
    }
    info!("built {} job(s)", jobs.len());

    // At most one browser per run, launched only when some job needs it.
    let browser = if needs_browser {
        match BrowserClient::launch(&request_conf).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("browser unavailable, browser tasks will fail: {e:#}");
                None
            }
        }
    } else {
        None
    };

    let mut tasker = Tasker::new(
        request_conf.clone(),
        tasker_conf,
        SiteRegistry::with_builtin(),
    );
    if let Some(browser) = browser.clone() {
        tasker = tasker.with_browser(browser);
    }

    let summary = tasker.run(jobs).await?;
    drop(tasker);

    if let Some(browser) = browser {
        if request_conf.auto_close {
            match Arc::try_unwrap(browser) {
                Ok(client) => client.close().await?,
                Err(_) => warn!("browser handle still shared, leaving it running"),
            }
        }
    }

    println!();
    for o in &summary.outcomes {
        let mark = match o.status {
            TaskStatus::Succeeded => "[OK]",
            TaskStatus::Failed => "[!!]",
            TaskStatus::Skipped => "[--]",
        };
        match &o.error {
            Some(err) => println!("  {mark} {}/{} ({}ms): {err}", o.site, o.account, o.elapsed_ms),
            None => println!("  {mark} {}/{} ({}ms)", o.site, o.account, o.elapsed_ms),
        }
    }
    println!(
        "  {} succeeded, {} failed, {} skipped",
        summary.succeeded(),
        summary.failed(),
        summary.skipped()
    );

    if summary.has_failures() {
        bail!("{} account run(s) failed", summary.failed());
    }
    Ok(())
}

fn init_tracing(debug: &DebugConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        debug.log_level.as_filter()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("ritual={level}").parse().unwrap()),
        )
        .try_init();
}
