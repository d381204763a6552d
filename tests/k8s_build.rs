//! End-to-end Kubernetes builds through the public API

use stevedore::build::build_k8s_resource_group;
use stevedore::config::{
    AppConfig, EbsVolume, GitSyncConfig, PortSpec, RbacConfig, ServiceConfig, VolumeBinding,
    VolumeSource, WorkspaceSpec, WorkspaceSync,
};
use stevedore::context::{BuildContext, K8sBuildContext};
use stevedore::resources::{k8s, Resource, ResourceGroup, ResourceKind};

fn ctx() -> BuildContext {
    BuildContext::Kubernetes(K8sBuildContext::new("default", "default"))
}

fn deployment(group: &ResourceGroup) -> &k8s::Deployment {
    let Some(Resource::Deployment(d)) = group.of_kind(ResourceKind::Deployment).next() else {
        panic!("group should contain a deployment");
    };
    d
}

/// An Airflow-shaped app touching most of the surface: isolated RBAC, a
/// git-synced workspace, a declared EBS volume with topology pinning, a
/// secrets file, and an exposed service.
fn airflow(secrets: &std::path::Path) -> AppConfig {
    let mut cfg = AppConfig::new("airflow", "apache/airflow:2.9")
        .with_port(PortSpec::new(8080).with_name("web").with_service_port(80));
    cfg.rbac = Some(RbacConfig {
        isolated: true,
        ..Default::default()
    });
    let mut ws = WorkspaceSpec::new("/projects/analytics");
    ws.sync = WorkspaceSync::GitSync(GitSyncConfig {
        repo: Some("https://example.com/dags.git".to_string()),
        ..Default::default()
    });
    cfg.workspace = Some(ws);
    cfg.volumes.push(VolumeBinding::new(
        "/opt/airflow/logs",
        VolumeSource::AwsEbs(EbsVolume {
            volume_id: Some("vol-0abc".to_string()),
            region: Some("us-east-1".to_string()),
            availability_zone: Some("us-east-1a".to_string()),
            schedule_in_topology: true,
            ..Default::default()
        }),
    ));
    cfg.secrets_file = Some(secrets.to_path_buf());
    cfg.service = Some(ServiceConfig::default());
    cfg
}

#[test]
fn full_airflow_group_holds_every_expected_kind() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("secrets.yaml");
    std::fs::write(&secrets, "FERNET_KEY: hush\n").unwrap();
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();

    for (kind, name) in [
        (ResourceKind::Namespace, "airflow-ns"),
        (ResourceKind::ServiceAccount, "airflow-sa"),
        (ResourceKind::ClusterRole, "airflow-cr"),
        (ResourceKind::ClusterRoleBinding, "airflow-crb"),
        (ResourceKind::ConfigMap, "airflow-env"),
        (ResourceKind::Secret, "airflow-env-secret"),
        (ResourceKind::Deployment, "airflow"),
        (ResourceKind::Service, "airflow"),
    ] {
        assert!(group.find(kind, name).is_some(), "missing {kind}/{name}");
    }
}

#[test]
fn isolated_rbac_redirects_all_namespaced_resources() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("secrets.yaml");
    std::fs::write(&secrets, "FERNET_KEY: hush\n").unwrap();
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();

    for resource in &group.resources {
        let ns = match resource {
            Resource::ConfigMap(r) => r.metadata.namespace.as_deref(),
            Resource::Secret(r) => r.metadata.namespace.as_deref(),
            Resource::Deployment(r) => r.metadata.namespace.as_deref(),
            Resource::Service(r) => r.metadata.namespace.as_deref(),
            _ => continue,
        };
        assert_eq!(ns, Some("airflow-ns"), "{}", resource.describe());
    }
    let d = deployment(&group);
    assert_eq!(
        d.spec.template.spec.service_account_name.as_deref(),
        Some("airflow-sa")
    );
}

#[test]
fn topology_pinning_lands_on_the_pod_node_selector() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("none.yaml");
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();
    let selector = &deployment(&group).spec.template.spec.node_selector;
    assert_eq!(
        selector.get("topology.kubernetes.io/region").map(String::as_str),
        Some("us-east-1")
    );
    assert_eq!(
        selector.get("topology.kubernetes.io/zone").map(String::as_str),
        Some("us-east-1a")
    );
}

#[test]
fn pinning_disabled_leaves_the_selector_alone() {
    let mut cfg = AppConfig::new("qdrant", "qdrant/qdrant:latest");
    cfg.volumes.push(VolumeBinding::new(
        "/qdrant/storage",
        VolumeSource::AwsEbs(EbsVolume {
            volume_id: Some("vol-0abc".to_string()),
            region: Some("us-east-1".to_string()),
            availability_zone: Some("us-east-1a".to_string()),
            schedule_in_topology: false,
            ..Default::default()
        }),
    ));
    let group = build_k8s_resource_group(&cfg, &ctx()).unwrap();
    assert!(deployment(&group).spec.template.spec.node_selector.is_empty());
}

#[test]
fn secrets_file_portion_becomes_a_secret_resource() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("secrets.yaml");
    std::fs::write(&secrets, "FERNET_KEY: hush\n").unwrap();
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();

    let Some(Resource::Secret(secret)) = group.find(ResourceKind::Secret, "airflow-env-secret")
    else {
        panic!("secret expected");
    };
    assert_eq!(secret.string_data.get("FERNET_KEY").map(String::as_str), Some("hush"));
    let Some(Resource::ConfigMap(cm)) = group.find(ResourceKind::ConfigMap, "airflow-env")
    else {
        panic!("config map expected");
    };
    assert!(!cm.data.contains_key("FERNET_KEY"));
}

#[test]
fn workspace_paths_are_exported_to_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("none.yaml");
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();
    let Some(Resource::ConfigMap(cm)) = group.find(ResourceKind::ConfigMap, "airflow-env")
    else {
        panic!("config map expected");
    };
    assert_eq!(
        cm.data.get("WORKSPACE_ROOT").map(String::as_str),
        Some("/workspace/analytics")
    );
    assert_eq!(cm.data.get("DEPLOY_BACKEND").map(String::as_str), Some("kubernetes"));
}

#[test]
fn managed_by_labels_are_stamped_on_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("none.yaml");
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();
    let d = deployment(&group);
    assert_eq!(
        d.metadata.labels.get(stevedore::LABEL_NAME).map(String::as_str),
        Some("airflow")
    );
    assert_eq!(
        d.metadata
            .labels
            .get(stevedore::LABEL_MANAGED_BY)
            .map(String::as_str),
        Some(stevedore::MANAGED_BY)
    );
}

#[test]
fn manifest_yaml_serializes_the_whole_group() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("secrets.yaml");
    std::fs::write(&secrets, "FERNET_KEY: hush\n").unwrap();
    let group = build_k8s_resource_group(&airflow(&secrets), &ctx()).unwrap();
    let yaml = group.to_manifest_yaml().unwrap();

    assert_eq!(yaml.matches("---\n").count(), group.len());
    assert!(yaml.contains("kind: Deployment"));
    assert!(yaml.contains("apiVersion: apps/v1"));
    assert!(yaml.contains("serviceAccountName: airflow-sa"));
    // camelCase wire names, not rust field names
    assert!(!yaml.contains("service_account_name"));
}
