//! Browser client using chromiumoxide.
//!
//! One `BrowserClient` is launched by the orchestrator and passed
//! explicitly to every site context that drives a real page, so the
//! browser lifecycle (launch, reuse, shutdown) is an owned contract.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::client::http::DEFAULT_USER_AGENT;
use crate::config::{loader, RequesterConfig};

const DEFAULT_PROFILE_NAME: &str = "Profile_1";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. RITUAL_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("RITUAL_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.ritual/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".ritual/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".ritual/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".ritual/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".ritual/chromium/chrome-linux64/chrome"),
                home.join(".ritual/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A launched browser profile shared across the task runners of one run.
pub struct BrowserClient {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserClient {
    /// Launch Chromium with options derived from the requester config.
    pub async fn launch(config: &RequesterConfig) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Set RITUAL_CHROMIUM_PATH or install Chrome.")?;

        let user_data_dir = if config.user_data_folder.is_empty() {
            loader::app_config_dir().join("browser_data")
        } else {
            PathBuf::from(&config.user_data_folder)
        };
        std::fs::create_dir_all(&user_data_dir)
            .with_context(|| format!("failed to create {}", user_data_dir.display()))?;

        let profile_name: &str = if config.profile_name.is_empty() {
            DEFAULT_PROFILE_NAME
        } else {
            config.profile_name.as_str()
        };

        let user_agent: &str = if config.user_agent.is_empty() {
            DEFAULT_USER_AGENT
        } else {
            config.user_agent.as_str()
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .request_timeout(Duration::from_secs_f64(config.timeout.max(0.0)))
            .arg(format!("--profile-directory={profile_name}"))
            .arg(format!("--user-agent={user_agent}"))
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");

        if config.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        if config.disable_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }
        if config.mute_audio {
            builder = builder.arg("--mute-audio");
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events for the browser's lifetime
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        tracing::info!("browser launched (profile {profile_name})");
        Ok(Self { browser, handler })
    }

    /// Open a new tab at the given URL for a task body to drive.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        self.browser
            .new_page(url)
            .await
            .context("failed to create new page")
    }

    /// Explicit shutdown. The orchestrator calls this at end of run when
    /// `auto_close` is set.
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed: {e}");
        }
        self.handler.abort();
        Ok(())
    }
}
