//! Fail-fast execution of one account's task sequence.

use anyhow::Result;

use super::{Site, TaskStep};

/// Executes one account's declared task sequence in order.
///
/// The sequence is built once at construction via the site's
/// `build_task_sequence` hook and never reordered.
pub struct SiteRunner {
    site: Box<dyn Site>,
    sequence: Vec<TaskStep>,
}

impl std::fmt::Debug for SiteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteRunner")
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl SiteRunner {
    pub fn new(site: Box<dyn Site>) -> Self {
        let sequence = site.build_task_sequence();
        Self { site, sequence }
    }

    pub fn sequence(&self) -> &[TaskStep] {
        &self.sequence
    }

    pub fn site(&self) -> &dyn Site {
        self.site.as_ref()
    }

    /// Run every step in declaration order, synchronously. A failing step
    /// aborts the remaining sequence and its error propagates unchanged.
    pub async fn run_all_tasks(&self) -> Result<()> {
        for step in &self.sequence {
            tracing::info!(task = %step.name, "running task");
            self.site.run_task(&step.name).await?;
        }
        Ok(())
    }
}
