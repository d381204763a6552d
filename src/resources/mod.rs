//! Typed infrastructure resources and resource groups
//!
//! A [`Resource`] is a single addressable infrastructure object with a kind,
//! a name, and a desired-state payload. A [`ResourceGroup`] is the output of
//! one build call: the full ordered bag of resources for one app on one
//! backend. Groups are assembled in creation order; the reconciliation
//! worker re-sorts by [`ResourceKind::creation_weight`] when flattening
//! several groups and reverses the order for deletion.

pub mod aws;
pub mod docker;
pub mod k8s;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Kind of an infrastructure resource, across all backends
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ResourceKind {
    /// K8s Namespace
    Namespace,
    /// K8s ServiceAccount
    ServiceAccount,
    /// K8s ClusterRole
    ClusterRole,
    /// K8s ClusterRoleBinding
    ClusterRoleBinding,
    /// K8s StorageClass
    StorageClass,
    /// K8s PersistentVolume
    PersistentVolume,
    /// K8s PersistentVolumeClaim
    PersistentVolumeClaim,
    /// K8s ConfigMap
    ConfigMap,
    /// K8s Secret
    Secret,
    /// K8s Deployment
    Deployment,
    /// K8s Service
    Service,
    /// K8s custom object (CRD instance)
    CustomObject,
    /// Docker network
    DockerNetwork,
    /// Docker named volume
    DockerVolume,
    /// Docker container
    DockerContainer,
    /// AWS ECS task definition
    TaskDefinition,
    /// AWS ECS service
    EcsService,
    /// AWS load balancer
    LoadBalancer,
    /// AWS target group
    TargetGroup,
    /// AWS listener
    Listener,
}

impl ResourceKind {
    /// Position of this kind in the dependency-respecting creation order
    ///
    /// Cluster-scoped objects come before namespaced objects, configuration
    /// before workloads, workloads before the things that route to them.
    /// Deletion uses the exact reverse.
    pub fn creation_weight(&self) -> u8 {
        match self {
            Self::Namespace | Self::DockerNetwork => 0,
            Self::ServiceAccount => 10,
            Self::ClusterRole => 20,
            Self::ClusterRoleBinding => 30,
            Self::StorageClass => 40,
            Self::PersistentVolume | Self::DockerVolume => 45,
            Self::PersistentVolumeClaim => 50,
            Self::LoadBalancer => 55,
            Self::TargetGroup => 56,
            Self::Listener => 57,
            Self::ConfigMap => 60,
            Self::Secret => 62,
            Self::TaskDefinition => 70,
            Self::Deployment | Self::DockerContainer => 80,
            Self::EcsService => 85,
            Self::Service => 90,
            Self::CustomObject => 95,
        }
    }
}

impl fmt::Display for ResourceKind {
    // Debug names match the API kinds we emit
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single addressable infrastructure object
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Resource {
    /// K8s Namespace
    Namespace(k8s::Namespace),
    /// K8s ServiceAccount
    ServiceAccount(k8s::ServiceAccount),
    /// K8s ClusterRole
    ClusterRole(k8s::ClusterRole),
    /// K8s ClusterRoleBinding
    ClusterRoleBinding(k8s::ClusterRoleBinding),
    /// K8s StorageClass
    StorageClass(k8s::StorageClass),
    /// K8s PersistentVolume
    PersistentVolume(k8s::PersistentVolume),
    /// K8s PersistentVolumeClaim
    PersistentVolumeClaim(k8s::PersistentVolumeClaim),
    /// K8s ConfigMap
    ConfigMap(k8s::ConfigMap),
    /// K8s Secret
    Secret(k8s::Secret),
    /// K8s Deployment
    Deployment(k8s::Deployment),
    /// K8s Service
    Service(k8s::Service),
    /// K8s custom object
    CustomObject(k8s::CustomObject),
    /// Docker network
    DockerNetwork(docker::Network),
    /// Docker named volume
    DockerVolume(docker::Volume),
    /// Docker container
    DockerContainer(docker::Container),
    /// ECS task definition
    TaskDefinition(aws::TaskDefinition),
    /// ECS service
    EcsService(aws::EcsService),
    /// AWS load balancer
    LoadBalancer(aws::LoadBalancer),
    /// AWS target group
    TargetGroup(aws::TargetGroup),
    /// AWS listener
    Listener(aws::Listener),
}

impl Resource {
    /// The resource's kind
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Namespace(_) => ResourceKind::Namespace,
            Self::ServiceAccount(_) => ResourceKind::ServiceAccount,
            Self::ClusterRole(_) => ResourceKind::ClusterRole,
            Self::ClusterRoleBinding(_) => ResourceKind::ClusterRoleBinding,
            Self::StorageClass(_) => ResourceKind::StorageClass,
            Self::PersistentVolume(_) => ResourceKind::PersistentVolume,
            Self::PersistentVolumeClaim(_) => ResourceKind::PersistentVolumeClaim,
            Self::ConfigMap(_) => ResourceKind::ConfigMap,
            Self::Secret(_) => ResourceKind::Secret,
            Self::Deployment(_) => ResourceKind::Deployment,
            Self::Service(_) => ResourceKind::Service,
            Self::CustomObject(_) => ResourceKind::CustomObject,
            Self::DockerNetwork(_) => ResourceKind::DockerNetwork,
            Self::DockerVolume(_) => ResourceKind::DockerVolume,
            Self::DockerContainer(_) => ResourceKind::DockerContainer,
            Self::TaskDefinition(_) => ResourceKind::TaskDefinition,
            Self::EcsService(_) => ResourceKind::EcsService,
            Self::LoadBalancer(_) => ResourceKind::LoadBalancer,
            Self::TargetGroup(_) => ResourceKind::TargetGroup,
            Self::Listener(_) => ResourceKind::Listener,
        }
    }

    /// The resource's name
    pub fn name(&self) -> &str {
        match self {
            Self::Namespace(r) => &r.metadata.name,
            Self::ServiceAccount(r) => &r.metadata.name,
            Self::ClusterRole(r) => &r.metadata.name,
            Self::ClusterRoleBinding(r) => &r.metadata.name,
            Self::StorageClass(r) => &r.metadata.name,
            Self::PersistentVolume(r) => &r.metadata.name,
            Self::PersistentVolumeClaim(r) => &r.metadata.name,
            Self::ConfigMap(r) => &r.metadata.name,
            Self::Secret(r) => &r.metadata.name,
            Self::Deployment(r) => &r.metadata.name,
            Self::Service(r) => &r.metadata.name,
            Self::CustomObject(r) => &r.metadata.name,
            Self::DockerNetwork(r) => &r.name,
            Self::DockerVolume(r) => &r.name,
            Self::DockerContainer(r) => &r.name,
            Self::TaskDefinition(r) => &r.family,
            Self::EcsService(r) => &r.name,
            Self::LoadBalancer(r) => &r.name,
            Self::TargetGroup(r) => &r.name,
            Self::Listener(r) => &r.name,
        }
    }

    /// `Kind/name` description for logs and confirmation prompts
    pub fn describe(&self) -> String {
        format!("{}/{}", self.kind(), self.name())
    }

    /// Serialize the desired-state payload as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        let doc = match self {
            Self::Namespace(r) => serde_yaml::to_string(r),
            Self::ServiceAccount(r) => serde_yaml::to_string(r),
            Self::ClusterRole(r) => serde_yaml::to_string(r),
            Self::ClusterRoleBinding(r) => serde_yaml::to_string(r),
            Self::StorageClass(r) => serde_yaml::to_string(r),
            Self::PersistentVolume(r) => serde_yaml::to_string(r),
            Self::PersistentVolumeClaim(r) => serde_yaml::to_string(r),
            Self::ConfigMap(r) => serde_yaml::to_string(r),
            Self::Secret(r) => serde_yaml::to_string(r),
            Self::Deployment(r) => serde_yaml::to_string(r),
            Self::Service(r) => serde_yaml::to_string(r),
            Self::CustomObject(r) => serde_yaml::to_string(r),
            Self::DockerNetwork(r) => serde_yaml::to_string(r),
            Self::DockerVolume(r) => serde_yaml::to_string(r),
            Self::DockerContainer(r) => serde_yaml::to_string(r),
            Self::TaskDefinition(r) => serde_yaml::to_string(r),
            Self::EcsService(r) => serde_yaml::to_string(r),
            Self::LoadBalancer(r) => serde_yaml::to_string(r),
            Self::TargetGroup(r) => serde_yaml::to_string(r),
            Self::Listener(r) => serde_yaml::to_string(r),
        };
        doc.map_err(|e| crate::Error::serialization(format!("{}: {e}", self.describe())))
    }
}

/// The output of one build call: all resources for one app on one backend
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Group name (normally the app name)
    pub name: String,
    /// Disabled groups are skipped (but counted) by the worker
    pub enabled: bool,
    /// Resources, in creation order
    pub resources: Vec<Resource>,
}

impl ResourceGroup {
    /// Create an empty enabled group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            resources: Vec::new(),
        }
    }

    /// Append a resource
    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Append pre-built resources verbatim
    pub fn extend(&mut self, resources: impl IntoIterator<Item = Resource>) {
        self.resources.extend(resources);
    }

    /// Number of resources in the group
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when the group holds no resources
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Find a resource by kind and name
    pub fn find(&self, kind: ResourceKind, name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.kind() == kind && r.name() == name)
    }

    /// All resources of one kind
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind() == kind)
    }

    /// Serialize the group as a multi-document YAML manifest
    pub fn to_manifest_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for resource in &self.resources {
            out.push_str("---\n");
            out.push_str(&resource.to_yaml()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_weights_respect_dependencies() {
        let order = [
            ResourceKind::Namespace,
            ResourceKind::ServiceAccount,
            ResourceKind::ClusterRole,
            ResourceKind::ClusterRoleBinding,
            ResourceKind::ConfigMap,
            ResourceKind::Deployment,
            ResourceKind::Service,
        ];
        for pair in order.windows(2) {
            assert!(
                pair[0].creation_weight() < pair[1].creation_weight(),
                "{} should be created before {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn group_lookup_by_kind_and_name() {
        let mut group = ResourceGroup::new("postgres");
        group.push(Resource::ConfigMap(k8s::ConfigMap::new("postgres-env", "default")));
        assert!(group.find(ResourceKind::ConfigMap, "postgres-env").is_some());
        assert!(group.find(ResourceKind::Secret, "postgres-env").is_none());
    }

    #[test]
    fn manifest_yaml_has_one_document_per_resource() {
        let mut group = ResourceGroup::new("postgres");
        group.push(Resource::Namespace(k8s::Namespace::new("postgres-ns")));
        group.push(Resource::ConfigMap(k8s::ConfigMap::new("postgres-env", "postgres-ns")));
        let yaml = group.to_manifest_yaml().unwrap();
        assert_eq!(yaml.matches("---\n").count(), 2);
        assert!(yaml.contains("kind: Namespace"));
        assert!(yaml.contains("kind: ConfigMap"));
    }
}
