//! Reconciliation worker
//!
//! Drives a batch of app configs to their desired state in five phases:
//! build the resource groups, filter the flattened resources, confirm with
//! the operator, execute against the backend API, and report. Execution
//! order follows [`ResourceKind::creation_weight`] for create/update and its
//! exact reverse for delete.
//!
//! Failures during execution are recorded per resource; whether the run
//! continues past one is a per-operation policy. A run is successful only
//! when every attempted call succeeded.

use std::fmt;

use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::context::BuildContext;
use crate::resources::{Resource, ResourceGroup, ResourceKind};
use crate::{build::build_resource_group, Result};

/// What the worker should do to each resource
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Create resources that should exist
    Create,
    /// Update resources in place
    Update,
    /// Delete resources, in reverse creation order
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Backend API surface the worker executes against
///
/// Each call returns `Ok(true)` when the backend applied the change,
/// `Ok(false)` when it refused without an error (counted as a failure), and
/// `Err` for transport or API errors.
pub trait ApiClient {
    /// Create one resource
    fn create(&mut self, resource: &Resource) -> Result<bool>;
    /// Update one resource
    fn update(&mut self, resource: &Resource) -> Result<bool>;
    /// Delete one resource
    fn delete(&mut self, resource: &Resource) -> Result<bool>;
}

/// Operator confirmation before execution
pub trait ConfirmPrompt {
    /// Show the plan and ask whether to proceed
    fn confirm(&mut self, plan: &[String], context: &str) -> bool;
}

/// Prompt that always proceeds
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoConfirm;

impl ConfirmPrompt for AutoConfirm {
    fn confirm(&mut self, _plan: &[String], _context: &str) -> bool {
        true
    }
}

/// Prompt on the controlling terminal
///
/// Prints the plan and the target context, then reads one line from stdin.
/// Anything other than an explicit yes declines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalConfirm;

impl ConfirmPrompt for TerminalConfirm {
    fn confirm(&mut self, plan: &[String], context: &str) -> bool {
        use std::io::{BufRead, Write};

        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "About to touch {} resources on {context}:", plan.len());
        for line in plan {
            let _ = writeln!(out, "  {line}");
        }
        let _ = write!(out, "Proceed? [y/N] ");
        let _ = out.flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

/// Worker behavior knobs
#[derive(Clone, Debug)]
pub struct WorkerOptions {
    /// Only run groups whose app name contains this substring
    pub app_filter: Option<String>,
    /// Only execute resources whose name contains this substring
    pub name_filter: Option<String>,
    /// Only execute resources of this kind
    pub kind_filter: Option<ResourceKind>,
    /// Skip the confirmation prompt
    pub auto_confirm: bool,
    /// Run every phase except execution
    pub dry_run: bool,
    /// Keep going after a failed create
    pub continue_on_create_failure: bool,
    /// Keep going after a failed update
    pub continue_on_update_failure: bool,
    /// Keep going after a failed delete
    pub continue_on_delete_failure: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            app_filter: None,
            name_filter: None,
            kind_filter: None,
            auto_confirm: false,
            dry_run: false,
            continue_on_create_failure: false,
            continue_on_update_failure: false,
            // teardown keeps going so one stuck resource doesn't strand
            // everything behind it
            continue_on_delete_failure: true,
        }
    }
}

impl WorkerOptions {
    fn continue_on_failure(&self, op: Operation) -> bool {
        match op {
            Operation::Create => self.continue_on_create_failure,
            Operation::Update => self.continue_on_update_failure,
            Operation::Delete => self.continue_on_delete_failure,
        }
    }
}

/// Outcome of one worker run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Apps and prebuilt groups considered, including disabled ones
    pub expected: usize,
    /// Groups the build phase actually produced
    pub built: usize,
    /// Resources left in the plan after filtering
    pub planned: usize,
    /// Resources the worker called the API for
    pub attempted: usize,
    /// Calls the API applied
    pub succeeded: usize,
    /// True when the operator declined the plan
    pub cancelled: bool,
    /// True when execution was skipped
    pub dry_run: bool,
}

impl RunReport {
    /// A run succeeds only when every attempted call was applied
    pub fn success(&self) -> bool {
        self.succeeded == self.attempted
    }
}

/// The reconciliation worker itself
pub struct ReconcileWorker<'a> {
    client: &'a mut dyn ApiClient,
    prompt: &'a mut dyn ConfirmPrompt,
    options: WorkerOptions,
}

impl<'a> ReconcileWorker<'a> {
    /// Create a worker over a backend client and a confirmation prompt
    pub fn new(
        client: &'a mut dyn ApiClient,
        prompt: &'a mut dyn ConfirmPrompt,
        options: WorkerOptions,
    ) -> Self {
        Self {
            client,
            prompt,
            options,
        }
    }

    /// Run one reconciliation pass
    ///
    /// Groups are built from `apps` on the given context; `prebuilt` groups
    /// are taken as-is. A build error aborts the whole run before any API
    /// call is made.
    pub fn run(
        &mut self,
        op: Operation,
        apps: &[AppConfig],
        ctx: &BuildContext,
        prebuilt: &[ResourceGroup],
    ) -> Result<RunReport> {
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        // Build
        let mut groups: Vec<ResourceGroup> = Vec::new();
        for cfg in apps {
            if let Some(filter) = &self.options.app_filter {
                if !cfg.name.contains(filter.as_str()) {
                    continue;
                }
            }
            report.expected += 1;
            if !cfg.enabled {
                info!(app = %cfg.name, "app disabled, skipping");
                continue;
            }
            groups.push(build_resource_group(cfg, ctx)?);
            report.built += 1;
        }
        for group in prebuilt {
            if let Some(filter) = &self.options.app_filter {
                if !group.name.contains(filter.as_str()) {
                    continue;
                }
            }
            report.expected += 1;
            report.built += 1;
            groups.push(group.clone());
        }

        // Filter and order
        let mut plan: Vec<&Resource> = Vec::new();
        for group in &groups {
            if !group.enabled {
                info!(group = %group.name, "group disabled, skipping");
                continue;
            }
            for resource in &group.resources {
                if let Some(name) = &self.options.name_filter {
                    // substring match so an app name also picks up its
                    // derived resources (web-env, web-env-secret, ...)
                    if !resource.name().contains(name.as_str()) {
                        continue;
                    }
                }
                if let Some(kind) = self.options.kind_filter {
                    if resource.kind() != kind {
                        continue;
                    }
                }
                plan.push(resource);
            }
        }
        plan.sort_by_key(|r| r.kind().creation_weight());
        if op == Operation::Delete {
            plan.reverse();
        }
        report.planned = plan.len();

        if plan.is_empty() {
            info!(%op, "nothing to do");
            return Ok(report);
        }

        // Confirm
        if !self.options.auto_confirm && !self.options.dry_run {
            let lines: Vec<String> = plan.iter().map(|r| r.describe()).collect();
            if !self.prompt.confirm(&lines, &ctx.summary()) {
                info!(%op, "run cancelled by operator");
                report.cancelled = true;
                return Ok(report);
            }
        }

        if self.options.dry_run {
            for resource in &plan {
                info!(%op, resource = %resource.describe(), "dry run");
            }
            return Ok(report);
        }

        // Execute
        let continue_on_failure = self.options.continue_on_failure(op);
        for resource in plan {
            report.attempted += 1;
            let outcome = match op {
                Operation::Create => self.client.create(resource),
                Operation::Update => self.client.update(resource),
                Operation::Delete => self.client.delete(resource),
            };
            match outcome {
                Ok(true) => {
                    info!(%op, resource = %resource.describe(), "applied");
                    report.succeeded += 1;
                }
                Ok(false) => {
                    warn!(%op, resource = %resource.describe(), "backend refused");
                    if !continue_on_failure {
                        break;
                    }
                }
                Err(e) => {
                    error!(%op, resource = %resource.describe(), error = %e, "call failed");
                    if !continue_on_failure {
                        break;
                    }
                }
            }
        }

        // Report
        info!(
            %op,
            expected = report.expected,
            built = report.built,
            planned = report.planned,
            attempted = report.attempted,
            succeeded = report.succeeded,
            success = report.success(),
            "run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PortSpec, ServiceConfig};
    use crate::context::{DockerBuildContext, K8sBuildContext};
    use crate::resources::k8s;
    use crate::Error;

    /// Records every call; names matching `fail` return Ok(false), names
    /// matching `error` return Err
    #[derive(Default)]
    struct FakeClient {
        calls: Vec<(Operation, String)>,
        fail: Option<String>,
        error: Option<String>,
    }

    impl FakeClient {
        fn respond(&mut self, op: Operation, resource: &Resource) -> Result<bool> {
            self.calls.push((op, resource.describe()));
            if self.error.as_deref() == Some(resource.name()) {
                return Err(Error::api(format!("boom on {}", resource.name())));
            }
            Ok(self.fail.as_deref() != Some(resource.name()))
        }
    }

    impl ApiClient for FakeClient {
        fn create(&mut self, resource: &Resource) -> Result<bool> {
            self.respond(Operation::Create, resource)
        }
        fn update(&mut self, resource: &Resource) -> Result<bool> {
            self.respond(Operation::Update, resource)
        }
        fn delete(&mut self, resource: &Resource) -> Result<bool> {
            self.respond(Operation::Delete, resource)
        }
    }

    struct Decline {
        asked: bool,
    }

    impl ConfirmPrompt for Decline {
        fn confirm(&mut self, _plan: &[String], _context: &str) -> bool {
            self.asked = true;
            false
        }
    }

    fn k8s_ctx() -> BuildContext {
        BuildContext::Kubernetes(K8sBuildContext::new("default", "default"))
    }

    fn web_app() -> AppConfig {
        let mut cfg = AppConfig::new("web", "nginx")
            .with_env("FOO", "bar")
            .with_port(PortSpec::new(80));
        cfg.service = Some(ServiceConfig::default());
        cfg
    }

    fn auto_options() -> WorkerOptions {
        WorkerOptions {
            auto_confirm: true,
            ..Default::default()
        }
    }

    #[test]
    fn create_runs_in_creation_order() {
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        let report = worker
            .run(Operation::Create, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        assert!(report.success());
        assert_eq!(report.built, 1);
        assert_eq!(report.attempted, report.planned);
        let kinds: Vec<&str> = client
            .calls
            .iter()
            .map(|(_, d)| d.split('/').next().unwrap())
            .collect();
        assert_eq!(kinds, vec!["ConfigMap", "Deployment", "Service"]);
    }

    #[test]
    fn delete_runs_in_exact_reverse() {
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        worker
            .run(Operation::Delete, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        let kinds: Vec<&str> = client
            .calls
            .iter()
            .map(|(_, d)| d.split('/').next().unwrap())
            .collect();
        assert_eq!(kinds, vec!["Service", "Deployment", "ConfigMap"]);
    }

    #[test]
    fn declined_confirmation_makes_no_api_calls() {
        let mut client = FakeClient::default();
        let mut prompt = Decline { asked: false };
        let mut worker =
            ReconcileWorker::new(&mut client, &mut prompt, WorkerOptions::default());
        let report = worker
            .run(Operation::Create, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        assert!(prompt.asked);
        assert!(report.cancelled);
        assert_eq!(report.attempted, 0);
        assert!(client.calls.is_empty());
    }

    #[test]
    fn dry_run_skips_confirmation_and_execution() {
        let mut client = FakeClient::default();
        let mut prompt = Decline { asked: false };
        let options = WorkerOptions {
            dry_run: true,
            ..Default::default()
        };
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, options);
        let report = worker
            .run(Operation::Create, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        assert!(!prompt.asked);
        assert!(report.dry_run);
        assert!(report.planned > 0);
        assert_eq!(report.attempted, 0);
        assert!(client.calls.is_empty());
    }

    #[test]
    fn create_failure_aborts_by_default() {
        let mut client = FakeClient {
            fail: Some("web-env".to_string()),
            ..Default::default()
        };
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        let report = worker
            .run(Operation::Create, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        // the ConfigMap is first in creation order, so nothing else ran
        assert_eq!(report.attempted, 1);
        assert_eq!(report.succeeded, 0);
        assert!(!report.success());
    }

    #[test]
    fn delete_failure_continues_by_default() {
        let mut client = FakeClient {
            error: Some("web".to_string()),
            ..Default::default()
        };
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        let report = worker
            .run(Operation::Delete, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        // "web" names both the Service and the Deployment; the ConfigMap
        // behind them is still attempted
        assert_eq!(report.attempted, report.planned);
        assert!(!report.success());
        assert!(report.attempted > report.succeeded);
    }

    #[test]
    fn disabled_apps_are_counted_but_skipped() {
        let mut disabled = web_app();
        disabled.enabled = false;
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        let report = worker
            .run(Operation::Create, &[web_app(), disabled], &k8s_ctx(), &[])
            .unwrap();

        assert_eq!(report.expected, 2);
        assert_eq!(report.built, 1);
        assert!(report.success());
        assert!(client.calls.iter().all(|(_, d)| !d.contains("disabled")));
    }

    #[test]
    fn filters_narrow_the_plan() {
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let options = WorkerOptions {
            auto_confirm: true,
            kind_filter: Some(ResourceKind::Service),
            ..Default::default()
        };
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, options);
        let report = worker
            .run(Operation::Create, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        assert_eq!(report.planned, 1);
        assert_eq!(client.calls.len(), 1);
        assert!(client.calls[0].1.starts_with("Service/"));
    }

    #[test]
    fn app_filter_limits_builds() {
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let options = WorkerOptions {
            auto_confirm: true,
            app_filter: Some("post".to_string()),
            ..Default::default()
        };
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, options);
        let apps = [web_app(), AppConfig::new("postgres", "postgres:16")];
        let report = worker
            .run(Operation::Create, &apps, &k8s_ctx(), &[])
            .unwrap();

        assert_eq!(report.expected, 1);
        assert!(client.calls.iter().all(|(_, d)| !d.contains("web")));
    }

    #[test]
    fn prebuilt_groups_ride_along() {
        let mut group = ResourceGroup::new("extra");
        group.push(Resource::ConfigMap(k8s::ConfigMap::new("extra-cm", "default")));
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        let report = worker
            .run(Operation::Create, &[], &k8s_ctx(), &[group])
            .unwrap();

        assert_eq!(report.expected, 1);
        assert_eq!(report.built, 1);
        assert_eq!(report.planned, 1);
        assert!(client.calls[0].1.contains("extra-cm"));
    }

    #[test]
    fn name_filter_matches_derived_resource_names() {
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let options = WorkerOptions {
            auto_confirm: true,
            name_filter: Some("web".to_string()),
            ..Default::default()
        };
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, options);
        worker
            .run(Operation::Create, &[web_app()], &k8s_ctx(), &[])
            .unwrap();

        // "web-env" is derived from the app name and must stay in the plan
        let names: Vec<&str> = client.calls.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(names, vec!["ConfigMap/web-env", "Deployment/web", "Service/web"]);
    }

    #[test]
    fn app_filter_applies_to_prebuilt_groups() {
        let mut group = ResourceGroup::new("extra");
        group.push(Resource::ConfigMap(k8s::ConfigMap::new("extra-cm", "default")));
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let options = WorkerOptions {
            auto_confirm: true,
            app_filter: Some("post".to_string()),
            ..Default::default()
        };
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, options);
        let report = worker
            .run(Operation::Create, &[], &k8s_ctx(), &[group])
            .unwrap();

        assert_eq!(report.expected, 0);
        assert_eq!(report.built, 0);
        assert!(client.calls.is_empty());
    }

    #[test]
    fn build_errors_abort_before_any_call() {
        let cfg = web_app();
        let docker = BuildContext::Docker(DockerBuildContext::new("net"));
        let mut client = FakeClient::default();
        let mut prompt = AutoConfirm;
        let mut worker = ReconcileWorker::new(&mut client, &mut prompt, auto_options());
        // k8s-shaped app against a docker context still builds (docker
        // builder accepts any app), so force a failure with a bad workspace
        let mut bad = cfg;
        bad.workspace = Some(crate::config::WorkspaceSpec::new("   "));
        let err = worker.run(Operation::Create, &[bad], &docker, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidWorkspaceRoot(_)));
        assert!(client.calls.is_empty());
    }
}
