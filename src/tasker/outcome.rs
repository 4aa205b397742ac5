//! Per-account outcomes, result persistence, and the text report.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// The result of one account's run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskOutcome {
    pub site: String,
    pub account: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// All outcomes of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub finished_at: String,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunSummary {
    pub fn new(outcomes: Vec<TaskOutcome>) -> Self {
        Self {
            finished_at: Utc::now().to_rfc3339(),
            outcomes,
        }
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(TaskStatus::Skipped)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

fn run_stamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Serialize the run's outcomes as pretty JSON under `dir`.
pub fn save_results(dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create results dir: {}", dir.display()))?;

    let path = dir.join(format!("run-{}.json", run_stamp()));
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write results file: {}", path.display()))?;
    Ok(path)
}

/// Write a plain text summary next to the JSON results.
pub fn write_report(dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create results dir: {}", dir.display()))?;

    let mut lines = vec![
        format!("ritual run report ({})", summary.finished_at),
        format!(
            "{} succeeded, {} failed, {} skipped",
            summary.succeeded(),
            summary.failed(),
            summary.skipped()
        ),
        String::new(),
    ];
    for o in &summary.outcomes {
        let status = match o.status {
            TaskStatus::Succeeded => "ok",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "skipped",
        };
        let mut line = format!("{}/{}: {} [{}ms]", o.site, o.account, status, o.elapsed_ms);
        if let Some(err) = &o.error {
            line.push_str(&format!(" {err}"));
        }
        lines.push(line);
    }

    let path = dir.join(format!("run-{}.txt", run_stamp()));
    std::fs::write(&path, lines.join("\n"))
        .with_context(|| format!("failed to write report file: {}", path.display()))?;
    Ok(path)
}
