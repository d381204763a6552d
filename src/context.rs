//! Build contexts: ambient per-backend defaults
//!
//! A build context carries the deploy-pass-wide defaults every builder needs:
//! the Docker network, the K8s namespace/service-account/labels, or the AWS
//! region/profile. The orchestrator creates one context per backend per
//! deploy pass and passes it by reference; builders never mutate it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Backend;

/// Ambient defaults for Docker builds
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerBuildContext {
    /// Docker network all app containers join
    pub network: String,
}

impl DockerBuildContext {
    /// Create a context for the given network
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }
}

/// Ambient defaults for Kubernetes builds
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sBuildContext {
    /// Namespace for namespaced resources (unless RBAC isolation overrides it)
    pub namespace: String,
    /// Default service-account name
    pub service_account: String,
    /// Labels stamped on every built resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_labels: BTreeMap<String, String>,
}

impl K8sBuildContext {
    /// Create a context for the given namespace and service account
    pub fn new(namespace: impl Into<String>, service_account: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service_account: service_account.into(),
            common_labels: BTreeMap::new(),
        }
    }

    /// Add a common label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.common_labels.insert(key.into(), value.into());
        self
    }
}

/// Ambient defaults for AWS builds
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsBuildContext {
    /// AWS region
    pub region: String,
    /// Credentials profile name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// ECS cluster name
    pub cluster: String,
}

impl AwsBuildContext {
    /// Create a context for the given region and ECS cluster
    pub fn new(region: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: None,
            cluster: cluster.into(),
        }
    }

    /// Set the credentials profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// A build context for exactly one backend
///
/// Builders validate the variant first and fail with
/// [`Error::InvalidBuildContext`](crate::Error::InvalidBuildContext) when
/// handed the wrong one.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", tag = "backend")]
pub enum BuildContext {
    /// Docker defaults
    Docker(DockerBuildContext),
    /// Kubernetes defaults
    Kubernetes(K8sBuildContext),
    /// AWS defaults
    Aws(AwsBuildContext),
}

impl BuildContext {
    /// The backend this context belongs to
    pub fn backend(&self) -> Backend {
        match self {
            Self::Docker(_) => Backend::Docker,
            Self::Kubernetes(_) => Backend::Kubernetes,
            Self::Aws(_) => Backend::Aws,
        }
    }

    /// Human-readable summary for confirmation prompts and logs
    pub fn summary(&self) -> String {
        match self {
            Self::Docker(ctx) => format!("docker network={}", ctx.network),
            Self::Kubernetes(ctx) => format!("kubernetes namespace={}", ctx.namespace),
            Self::Aws(ctx) => match &ctx.profile {
                Some(profile) => {
                    format!("aws region={} profile={} cluster={}", ctx.region, profile, ctx.cluster)
                }
                None => format!("aws region={} cluster={}", ctx.region, ctx.cluster),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_reports_its_backend() {
        let ctx = BuildContext::Docker(DockerBuildContext::new("apps-net"));
        assert_eq!(ctx.backend(), Backend::Docker);
        let ctx = BuildContext::Kubernetes(K8sBuildContext::new("default", "default"));
        assert_eq!(ctx.backend(), Backend::Kubernetes);
    }

    #[test]
    fn aws_summary_includes_region_and_profile() {
        let ctx = BuildContext::Aws(AwsBuildContext::new("eu-west-1", "apps").with_profile("prod"));
        let summary = ctx.summary();
        assert!(summary.contains("eu-west-1"));
        assert!(summary.contains("prod"));
    }
}
