//! Cross-account orchestration.
//!
//! One account's sequence runs strictly in order; across accounts the
//! tasker either loops sequentially or fans out over a bounded worker
//! pool. Each job gets an isolated context (own HTTP session and cookie
//! state); the only shared state is the read-only configs and the
//! optional browser handle.

pub mod outcome;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::client::BrowserClient;
use crate::config::{Account, RequesterConfig, SiteConfig, TaskerConfig};
use crate::site::{SiteContext, SiteRegistry};

pub use outcome::{RunSummary, TaskOutcome, TaskStatus};

/// One unit of the run: a site name, an account key, and their configs.
#[derive(Debug, Clone)]
pub struct AccountJob {
    pub site: String,
    pub account_key: String,
    pub account: Account,
    pub site_conf: SiteConfig,
}

pub struct Tasker {
    request_conf: RequesterConfig,
    tasker_conf: TaskerConfig,
    registry: SiteRegistry,
    browser: Option<Arc<BrowserClient>>,
}

impl Tasker {
    pub fn new(
        request_conf: RequesterConfig,
        tasker_conf: TaskerConfig,
        registry: SiteRegistry,
    ) -> Self {
        Self {
            request_conf,
            tasker_conf,
            registry,
            browser: None,
        }
    }

    /// Attach the run's shared browser handle; contexts for sites that
    /// want a browser receive a clone of it.
    pub fn with_browser(mut self, browser: Arc<BrowserClient>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Run all jobs to completion and return the collected outcomes.
    /// One account's failure never affects its siblings.
    pub async fn run(&self, jobs: Vec<AccountJob>) -> Result<RunSummary> {
        let outcomes = if self.tasker_conf.parallel {
            // A configured value of 0 would stall the stream.
            let workers = self.tasker_conf.max_workers.max(1);
            tracing::info!("running {} job(s) with up to {workers} worker(s)", jobs.len());
            stream::iter(jobs)
                .map(|job| self.run_job(job))
                .buffer_unordered(workers)
                .collect::<Vec<_>>()
                .await
        } else {
            tracing::info!("running {} job(s) sequentially", jobs.len());
            let mut outcomes = Vec::with_capacity(jobs.len());
            for job in jobs {
                outcomes.push(self.run_job(job).await);
            }
            outcomes
        };

        let summary = RunSummary::new(outcomes);

        if self.tasker_conf.save_results {
            let path =
                outcome::save_results(Path::new(&self.tasker_conf.results_path), &summary)?;
            tracing::info!("results saved to {}", path.display());
        }
        if self.tasker_conf.generate_report {
            let path =
                outcome::write_report(Path::new(&self.tasker_conf.results_path), &summary)?;
            tracing::info!("report written to {}", path.display());
        }

        Ok(summary)
    }

    async fn run_job(&self, job: AccountJob) -> TaskOutcome {
        if !job.site_conf.enabled {
            tracing::info!(site = %job.site, account = %job.account_key, "site disabled, skipping");
            return TaskOutcome {
                site: job.site,
                account: job.account_key,
                status: TaskStatus::Skipped,
                error: None,
                elapsed_ms: 0,
            };
        }

        let started = Instant::now();
        let result = self.execute(&job).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => TaskOutcome {
                site: job.site,
                account: job.account_key,
                status: TaskStatus::Succeeded,
                error: None,
                elapsed_ms,
            },
            Err(e) => {
                tracing::error!(
                    site = %job.site,
                    account = %job.account_key,
                    "account run failed: {e:#}"
                );
                TaskOutcome {
                    site: job.site,
                    account: job.account_key,
                    status: TaskStatus::Failed,
                    error: Some(format!("{e:#}")),
                    elapsed_ms,
                }
            }
        }
    }

    async fn execute(&self, job: &AccountJob) -> Result<()> {
        let browser = if job.site_conf.wants_browser() {
            self.browser.clone()
        } else {
            None
        };
        let use_browser = browser.is_some();

        let ctx = SiteContext::new(
            self.request_conf.clone(),
            job.site_conf.clone(),
            job.account.clone(),
            use_browser,
            browser,
        )?;
        let runner = self.registry.build_runner(&job.site, ctx)?;
        runner.run_all_tasks().await
    }
}
