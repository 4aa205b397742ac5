//! The Site capability interface: per-account context, declared task
//! sequence, fail-fast runner, and the name → implementation registry.

pub mod context;
pub mod registry;
pub mod runner;

use anyhow::Result;
use async_trait::async_trait;

pub use context::SiteContext;
pub use registry::SiteRegistry;
pub use runner::SiteRunner;

/// One unit of work in a site's sequence. Execution order is the
/// declaration order; there is no reordering and no per-step retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStep {
    pub name: String,
}

impl TaskStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A site implementation bound to one account.
///
/// Implementations declare their ordered task sequence and execute steps
/// by name; credentials, cookies, and config records come from the
/// embedded [`SiteContext`].
#[async_trait]
pub trait Site: Send + Sync {
    /// The per-account context this instance is bound to.
    fn context(&self) -> &SiteContext;

    /// The ordered list of task steps for this account.
    fn build_task_sequence(&self) -> Vec<TaskStep>;

    /// Execute one named step from the sequence.
    async fn run_task(&self, name: &str) -> Result<()>;
}
