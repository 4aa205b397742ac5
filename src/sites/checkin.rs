//! `http_checkin` — a config-driven daily check-in over plain HTTP.
//!
//! Tasks: `signin` establishes the session against `signin_url`, then
//! `checkin` posts the account to the `checkin_url` extension attribute.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::site::{Site, SiteContext, TaskStep};

pub struct CheckinSite {
    ctx: SiteContext,
}

pub fn build(ctx: SiteContext) -> Result<Box<dyn Site>> {
    Ok(Box::new(CheckinSite { ctx }))
}

#[async_trait]
impl Site for CheckinSite {
    fn context(&self) -> &SiteContext {
        &self.ctx
    }

    fn build_task_sequence(&self) -> Vec<TaskStep> {
        vec![TaskStep::new("signin"), TaskStep::new("checkin")]
    }

    async fn run_task(&self, name: &str) -> Result<()> {
        match name {
            "signin" => self.signin().await,
            "checkin" => self.checkin().await,
            _ => bail!("unknown task '{name}' for http_checkin"),
        }
    }
}

impl CheckinSite {
    async fn signin(&self) -> Result<()> {
        let url = self
            .ctx
            .site_conf()
            .signin_url()
            .context("signin_url not configured")?;

        let resp = self.ctx.http().get(url, &[]).await?;
        tracing::info!(
            user = %self.ctx.username(),
            status = %resp.status(),
            "signed in"
        );
        Ok(())
    }

    async fn checkin(&self) -> Result<()> {
        let value = self.ctx.site_conf().attr("checkin_url")?;
        let url = value.as_str().context("checkin_url must be a string")?;

        let form = [("username", self.ctx.username())];
        let resp = self.ctx.http().post_form(url, &form).await?;
        tracing::info!(
            user = %self.ctx.username(),
            status = %resp.status(),
            "checked in"
        );
        Ok(())
    }
}
