//! RBAC bootstrapping for isolated apps
//!
//! When an app requests RBAC isolation, the K8s builder derives a dedicated
//! Namespace, ServiceAccount, ClusterRole, and ClusterRoleBinding from the
//! app name. Each name can be overridden independently; an override
//! short-circuits derivation for that object only.

use std::collections::BTreeMap;

use crate::config::RbacConfig;
use crate::resources::k8s::{
    ClusterRole, ClusterRoleBinding, Namespace, PolicyRule, ServiceAccount,
};

/// The four bootstrapped RBAC objects, bound to each other by name
#[derive(Clone, Debug)]
pub struct RbacBundle {
    /// Dedicated namespace
    pub namespace: Namespace,
    /// Dedicated service account
    pub service_account: ServiceAccount,
    /// Cluster role with the app's permission set
    pub cluster_role: ClusterRole,
    /// Binding of the role to the service account
    pub cluster_role_binding: ClusterRoleBinding,
}

impl RbacBundle {
    /// Bootstrap RBAC objects for an app
    ///
    /// The ClusterRole grants full verbs on pods, secrets, and configmaps
    /// plus read-only access to pod logs — the minimum an app needs to run
    /// log-fetching sidecars (e.g. Airflow workers reading peer logs).
    pub fn bootstrap(app: &str, cfg: &RbacConfig, common_labels: &BTreeMap<String, String>) -> Self {
        let ns_name = cfg
            .namespace
            .clone()
            .unwrap_or_else(|| format!("{app}-ns"));
        let sa_name = cfg
            .service_account
            .clone()
            .unwrap_or_else(|| format!("{app}-sa"));
        let role_name = cfg
            .cluster_role
            .clone()
            .unwrap_or_else(|| format!("{app}-cr"));
        let binding_name = cfg
            .cluster_role_binding
            .clone()
            .unwrap_or_else(|| format!("{app}-crb"));

        let mut namespace = Namespace::new(&ns_name);
        namespace.metadata = namespace.metadata.with_labels(common_labels);

        let mut service_account = ServiceAccount::new(&sa_name, &ns_name);
        service_account.metadata = service_account.metadata.with_labels(common_labels);

        let rules = vec![
            PolicyRule::core(
                &["pods", "secrets", "configmaps"],
                &["get", "list", "watch", "create", "update", "patch", "delete"],
            ),
            PolicyRule::core(&["pods/log"], &["get", "list", "watch"]),
        ];
        let mut cluster_role = ClusterRole::new(&role_name, rules);
        cluster_role.metadata = cluster_role.metadata.with_labels(common_labels);

        let mut cluster_role_binding =
            ClusterRoleBinding::new(&binding_name, &role_name, &sa_name, &ns_name);
        cluster_role_binding.metadata = cluster_role_binding.metadata.with_labels(common_labels);

        Self {
            namespace,
            service_account,
            cluster_role,
            cluster_role_binding,
        }
    }

    /// Name of the resolved namespace
    pub fn namespace_name(&self) -> &str {
        &self.namespace.metadata.name
    }

    /// Name of the resolved service account
    pub fn service_account_name(&self) -> &str {
        &self.service_account.metadata.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_derive_from_app() {
        let bundle = RbacBundle::bootstrap("airflow", &RbacConfig::default(), &BTreeMap::new());
        assert_eq!(bundle.namespace.metadata.name, "airflow-ns");
        assert_eq!(bundle.service_account.metadata.name, "airflow-sa");
        assert_eq!(bundle.cluster_role.metadata.name, "airflow-cr");
        assert_eq!(bundle.cluster_role_binding.metadata.name, "airflow-crb");
    }

    #[test]
    fn overrides_are_independent() {
        // Explicit role, everything else still derived
        let cfg = RbacConfig {
            cluster_role: Some("ops-role".to_string()),
            ..Default::default()
        };
        let bundle = RbacBundle::bootstrap("airflow", &cfg, &BTreeMap::new());
        assert_eq!(bundle.cluster_role.metadata.name, "ops-role");
        assert_eq!(bundle.namespace.metadata.name, "airflow-ns");

        // Explicit namespace, role still derived
        let cfg = RbacConfig {
            namespace: Some("shared".to_string()),
            ..Default::default()
        };
        let bundle = RbacBundle::bootstrap("airflow", &cfg, &BTreeMap::new());
        assert_eq!(bundle.namespace.metadata.name, "shared");
        assert_eq!(bundle.cluster_role.metadata.name, "airflow-cr");
        // namespaced objects follow the override
        assert_eq!(bundle.service_account.metadata.namespace.as_deref(), Some("shared"));
        assert_eq!(bundle.cluster_role_binding.subjects[0].namespace, "shared");
    }

    #[test]
    fn role_rules_pair_verbs_with_resources() {
        let bundle = RbacBundle::bootstrap("airflow", &RbacConfig::default(), &BTreeMap::new());
        let rules = &bundle.cluster_role.rules;
        assert_eq!(rules.len(), 2);

        let full = &rules[0];
        assert!(full.resources.iter().any(|r| r == "secrets"));
        assert!(full.verbs.iter().any(|v| v == "delete"));

        // pod logs are read-only, never writable
        let logs = &rules[1];
        assert_eq!(logs.resources, vec!["pods/log".to_string()]);
        assert!(!logs.verbs.iter().any(|v| v == "create" || v == "delete"));
    }

    #[test]
    fn binding_references_role_and_service_account() {
        let bundle = RbacBundle::bootstrap("airflow", &RbacConfig::default(), &BTreeMap::new());
        let binding = &bundle.cluster_role_binding;
        assert_eq!(binding.role_ref.name, "airflow-cr");
        assert_eq!(binding.subjects[0].name, "airflow-sa");
        assert_eq!(binding.subjects[0].namespace, "airflow-ns");
    }
}
