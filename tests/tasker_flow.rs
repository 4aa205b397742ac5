//! End-to-end flow: config files on disk → adapters → registry →
//! runner, covering fail-fast sequencing and cross-account isolation.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use ritual::config::{
    load_site_accounts, load_site_config, Account, AccountsAdapter, ConfigAdapter, CookieSource,
    RequesterConfig, SiteConfig,
};
use ritual::site::{Site, SiteContext, SiteRegistry, SiteRunner, TaskStep};
use ritual::tasker::{AccountJob, RunSummary, Tasker, TaskStatus};

type StepLog = Arc<Mutex<Vec<String>>>;

/// Three fixed steps; fails on "two" for the configured user.
struct RecordingSite {
    ctx: SiteContext,
    log: StepLog,
    fail_user: Option<String>,
}

#[async_trait]
impl Site for RecordingSite {
    fn context(&self) -> &SiteContext {
        &self.ctx
    }

    fn build_task_sequence(&self) -> Vec<TaskStep> {
        vec![
            TaskStep::new("one"),
            TaskStep::new("two"),
            TaskStep::new("three"),
        ]
    }

    async fn run_task(&self, name: &str) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{name}", self.ctx.username()));
        if name == "two" && self.fail_user.as_deref() == Some(self.ctx.username()) {
            bail!("boom");
        }
        Ok(())
    }
}

fn recording_registry(log: &StepLog, fail_user: Option<&str>) -> SiteRegistry {
    let mut registry = SiteRegistry::new();
    let log = Arc::clone(log);
    let fail_user = fail_user.map(str::to_string);
    registry.register("recording", move |ctx| {
        Ok(Box::new(RecordingSite {
            ctx,
            log: Arc::clone(&log),
            fail_user: fail_user.clone(),
        }))
    });
    registry
}

fn context_for(username: &str, site_conf: SiteConfig) -> SiteContext {
    let account = Account::new(username, "pw", CookieSource::default());
    SiteContext::new(RequesterConfig::default(), site_conf, account, false, None).unwrap()
}

fn job_for(site: &str, username: &str, site_conf: SiteConfig) -> AccountJob {
    AccountJob {
        site: site.to_string(),
        account_key: username.to_string(),
        account: Account::new(username, "pw", CookieSource::default()),
        site_conf,
    }
}

fn recording_site_conf() -> SiteConfig {
    serde_json::from_value(serde_json::json!({ "variant": "recording" })).unwrap()
}

#[tokio::test]
async fn failing_step_aborts_remaining_sequence() {
    let log: StepLog = Arc::new(Mutex::new(Vec::new()));
    let registry = recording_registry(&log, Some("alice"));

    let runner = registry
        .build_runner("demo", context_for("alice", recording_site_conf()))
        .unwrap();
    assert_eq!(runner.sequence().len(), 3);

    let err = runner.run_all_tasks().await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert_eq!(*log.lock().unwrap(), vec!["alice:one", "alice:two"]);
}

#[tokio::test]
async fn variant_attribute_overrides_site_name_lookup() {
    let log: StepLog = Arc::new(Mutex::new(Vec::new()));
    let registry = recording_registry(&log, None);

    // The site is not named "recording", but its variant attribute is.
    let runner = registry.build_runner("some-site", context_for("alice", recording_site_conf()));
    assert!(runner.is_ok());

    let missing = registry.build_runner("some-site", context_for("alice", SiteConfig::default()));
    let err = missing.unwrap_err().to_string();
    assert!(err.contains("unknown site variant 'some-site'"));
    assert!(err.contains("recording"));
}

#[tokio::test]
async fn one_account_failure_leaves_siblings_unaffected() {
    let log: StepLog = Arc::new(Mutex::new(Vec::new()));
    let registry = recording_registry(&log, Some("bob"));

    let tasker_conf = serde_json::from_value(serde_json::json!({
        "parallel": true,
        "max_workers": 4,
    }))
    .unwrap();
    let tasker = Tasker::new(RequesterConfig::default(), tasker_conf, registry);

    let jobs = vec![
        job_for("demo", "alice", recording_site_conf()),
        job_for("demo", "bob", recording_site_conf()),
    ];
    let summary = tasker.run(jobs).await.unwrap();

    let status_of = |user: &str| {
        summary
            .outcomes
            .iter()
            .find(|o| o.account == user)
            .unwrap()
            .clone()
    };
    assert_eq!(status_of("alice").status, TaskStatus::Succeeded);
    let bob = status_of("bob");
    assert_eq!(bob.status, TaskStatus::Failed);
    assert!(bob.error.unwrap().contains("boom"));

    let log = log.lock().unwrap();
    assert_eq!(
        log.iter().filter(|l| l.starts_with("alice:")).count(),
        3,
        "alice runs her whole sequence"
    );
    assert_eq!(
        log.iter().filter(|l| l.starts_with("bob:")).count(),
        2,
        "bob stops at the failing step"
    );
}

#[tokio::test]
async fn disabled_site_short_circuits_to_skipped() {
    let log: StepLog = Arc::new(Mutex::new(Vec::new()));
    let registry = recording_registry(&log, None);
    let tasker = Tasker::new(
        RequesterConfig::default(),
        Default::default(),
        registry,
    );

    let site_conf: SiteConfig =
        serde_json::from_value(serde_json::json!({ "enabled": false, "variant": "recording" }))
            .unwrap();
    let summary = tasker
        .run(vec![job_for("demo", "alice", site_conf)])
        .await
        .unwrap();

    assert_eq!(summary.outcomes[0].status, TaskStatus::Skipped);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn full_flow_from_files_to_persisted_results() {
    let dir = tempfile::tempdir().unwrap();
    let results_dir = dir.path().join("results");

    let config_path = dir.path().join("flow_config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[global.requests]
retry_times = 0
retry_interval = 0.0

[global.runtime]
parallel = false
save_results = true
generate_report = true
results_path = "{}"

[global.debug]
log_level = "WARNING"

[sites.demo]
variant = "recording"
greeting = "hello"
"#,
            results_dir.display()
        ),
    )
    .unwrap();

    let accounts_path = dir.path().join("flow_accounts.toml");
    fs::write(
        &accounts_path,
        r#"
[demo.accounts.alice]
username = "alice"
password = "pw"
cookies = "sid=1; theme=dark"

[demo.accounts.bob]
username = "bob"
password = "pw2"
"#,
    )
    .unwrap();

    let adapter = ConfigAdapter::new(load_site_config(Some(&config_path)).unwrap());
    let accounts = AccountsAdapter::new(load_site_accounts(Some(&accounts_path)).unwrap());

    let request_conf = adapter.requester_config().unwrap().value;
    let tasker_conf = adapter.tasker_config().unwrap().value;
    assert!(tasker_conf.save_results);

    let mut jobs = Vec::new();
    for site in adapter.site_names() {
        let site_conf = adapter.site_config(&site).unwrap();
        for (key, account) in accounts.accounts(&site) {
            jobs.push(AccountJob {
                site: site.clone(),
                account_key: key.clone(),
                account: account.clone(),
                site_conf: site_conf.clone(),
            });
        }
    }
    assert_eq!(jobs.len(), 2);
    assert_eq!(
        jobs[0].account.cookies.get("sid").map(String::as_str),
        Some("1")
    );

    let log: StepLog = Arc::new(Mutex::new(Vec::new()));
    let registry = recording_registry(&log, None);
    let tasker = Tasker::new(request_conf, tasker_conf, registry);
    let summary = tasker.run(jobs).await.unwrap();

    assert_eq!(summary.succeeded(), 2);
    assert!(!summary.has_failures());

    // Persisted outcomes round-trip.
    let saved: Vec<_> = fs::read_dir(&results_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(saved.len(), 2, "one JSON result plus one text report");

    let json_path = saved
        .iter()
        .find(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .unwrap();
    let loaded: RunSummary =
        serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(loaded.outcomes, summary.outcomes);

    let report_path = saved
        .iter()
        .find(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
        .unwrap();
    assert!(fs::read_to_string(report_path)
        .unwrap()
        .contains("2 succeeded, 0 failed, 0 skipped"));
}

#[tokio::test]
async fn context_exposes_bound_account_and_configs() {
    let site_conf: SiteConfig = serde_json::from_value(serde_json::json!({
        "signin_url": "https://example.test/login",
        "variant": "recording",
    }))
    .unwrap();
    let account = Account::new("alice", "pw", CookieSource::Header("sid=1".to_string()));
    let ctx = SiteContext::new(
        RequesterConfig::default(),
        site_conf,
        account,
        false,
        None,
    )
    .unwrap();

    assert_eq!(ctx.username(), "alice");
    assert_eq!(ctx.password(), "pw");
    assert_eq!(ctx.cookies().get("sid").map(String::as_str), Some("1"));
    assert!(ctx.enabled());
    assert_eq!(ctx.site_conf().signin_url(), Some("https://example.test/login"));
    assert!(!ctx.use_browser());
    assert!(ctx.browser().is_none());
}

#[tokio::test]
async fn runner_sequence_is_declaration_order() {
    let log: StepLog = Arc::new(Mutex::new(Vec::new()));
    let site = RecordingSite {
        ctx: context_for("alice", recording_site_conf()),
        log: Arc::clone(&log),
        fail_user: None,
    };
    let runner = SiteRunner::new(Box::new(site));

    let names: Vec<&str> = runner.sequence().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["one", "two", "three"]);

    runner.run_all_tasks().await.unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["alice:one", "alice:two", "alice:three"]
    );
}

// Guards against the loader silently picking up a stray file from the
// repository when an explicit path is wrong.
#[test]
fn explicit_path_must_exist_to_win_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = dir.path().join("fallback.toml");
    fs::write(&fallback, "x = 1\n").unwrap();

    let resolved = ritual::config::resolve_file_path(
        Some(Path::new("/definitely/not/here.toml")),
        "no_such_local_file.toml",
        &fallback,
    );
    assert_eq!(resolved, Some(fallback));
}
