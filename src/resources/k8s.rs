//! Kubernetes resource types
//!
//! Hand-modeled serde structs shaped like the Kubernetes API objects the
//! builders emit. Serialization uses camelCase field names so a resource can
//! be submitted to the API or written out as a manifest unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// ObjectMeta
// =============================================================================

/// Standard Kubernetes ObjectMeta
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace; unset for cluster-scoped resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create namespaced metadata with standard management labels
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let mut meta = Self::cluster_scoped(name);
        meta.namespace = Some(namespace.into());
        meta
    }

    /// Create cluster-scoped metadata with standard management labels
    pub fn cluster_scoped(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut labels = BTreeMap::new();
        labels.insert(crate::LABEL_NAME.to_string(), name.clone());
        labels.insert(
            crate::LABEL_MANAGED_BY.to_string(),
            crate::MANAGED_BY.to_string(),
        );
        Self {
            name,
            namespace: None,
            labels,
            annotations: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Merge a set of labels
    pub fn with_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        for (k, v) in labels {
            self.labels.insert(k.clone(), v.clone());
        }
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Namespace / ServiceAccount
// =============================================================================

/// Kubernetes Namespace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
}

impl Namespace {
    /// Create a new Namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Namespace".to_string(),
            metadata: ObjectMeta::cluster_scoped(name),
        }
    }
}

/// Kubernetes ServiceAccount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
}

impl ServiceAccount {
    /// Create a new ServiceAccount
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "ServiceAccount".to_string(),
            metadata: ObjectMeta::new(name, namespace),
        }
    }
}

// =============================================================================
// RBAC
// =============================================================================

/// A single RBAC policy rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// API groups ("" is the core group)
    pub api_groups: Vec<String>,
    /// Resource names (e.g. pods, secrets)
    pub resources: Vec<String>,
    /// Allowed verbs
    pub verbs: Vec<String>,
}

impl PolicyRule {
    /// Create a rule on core-group resources
    pub fn core(resources: &[&str], verbs: &[&str]) -> Self {
        Self {
            api_groups: vec![String::new()],
            resources: resources.iter().map(|s| s.to_string()).collect(),
            verbs: verbs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Kubernetes ClusterRole
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Policy rules
    pub rules: Vec<PolicyRule>,
}

impl ClusterRole {
    /// Create a new ClusterRole with the given rules
    pub fn new(name: impl Into<String>, rules: Vec<PolicyRule>) -> Self {
        Self {
            api_version: "rbac.authorization.k8s.io/v1".to_string(),
            kind: "ClusterRole".to_string(),
            metadata: ObjectMeta::cluster_scoped(name),
            rules,
        }
    }
}

/// Reference to the role a binding grants
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    /// API group of the referenced role
    pub api_group: String,
    /// Kind (ClusterRole)
    pub kind: String,
    /// Role name
    pub name: String,
}

/// Subject a binding grants to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Subject kind (ServiceAccount)
    pub kind: String,
    /// Subject name
    pub name: String,
    /// Subject namespace
    pub namespace: String,
}

/// Kubernetes ClusterRoleBinding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Referenced role
    pub role_ref: RoleRef,
    /// Granted subjects
    pub subjects: Vec<Subject>,
}

impl ClusterRoleBinding {
    /// Bind a ClusterRole to a ServiceAccount in a namespace
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        service_account: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            api_version: "rbac.authorization.k8s.io/v1".to_string(),
            kind: "ClusterRoleBinding".to_string(),
            metadata: ObjectMeta::cluster_scoped(name),
            role_ref: RoleRef {
                api_group: "rbac.authorization.k8s.io".to_string(),
                kind: "ClusterRole".to_string(),
                name: role.into(),
            },
            subjects: vec![Subject {
                kind: "ServiceAccount".to_string(),
                name: service_account.into(),
                namespace: namespace.into(),
            }],
        }
    }
}

// =============================================================================
// ConfigMap and Secret
// =============================================================================

/// Kubernetes ConfigMap for non-sensitive configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// String data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    /// Create a new ConfigMap
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            metadata: ObjectMeta::new(name, namespace),
            data: BTreeMap::new(),
        }
    }
}

/// Kubernetes Secret for sensitive configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// String data (encoded to base64 by the API server)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,
    /// Secret type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

impl Secret {
    /// Create a new Opaque Secret
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
            metadata: ObjectMeta::new(name, namespace),
            string_data: BTreeMap::new(),
            type_: Some("Opaque".to_string()),
        }
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Kubernetes StorageClass
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Provisioner
    pub provisioner: String,
    /// Reclaim policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<String>,
    /// Parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl StorageClass {
    /// Create a new StorageClass
    pub fn new(name: impl Into<String>, provisioner: impl Into<String>) -> Self {
        Self {
            api_version: "storage.k8s.io/v1".to_string(),
            kind: "StorageClass".to_string(),
            metadata: ObjectMeta::cluster_scoped(name),
            provisioner: provisioner.into(),
            reclaim_policy: None,
            parameters: BTreeMap::new(),
        }
    }
}

/// CSI source of an explicit PersistentVolume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CsiVolumeSource {
    /// CSI driver name
    pub driver: String,
    /// Backing volume handle
    pub volume_handle: String,
}

/// PersistentVolume spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeSpec {
    /// Capacity, keyed by resource name ("storage")
    pub capacity: BTreeMap<String, String>,
    /// Access modes
    pub access_modes: Vec<String>,
    /// Reclaim policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_reclaim_policy: Option<String>,
    /// Storage class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    /// Mount options
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_options: Vec<String>,
    /// CSI source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csi: Option<CsiVolumeSource>,
}

/// Kubernetes PersistentVolume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PersistentVolumeSpec,
}

impl PersistentVolume {
    /// Create a new PersistentVolume with the given capacity
    pub fn new(name: impl Into<String>, size: impl Into<String>) -> Self {
        let mut capacity = BTreeMap::new();
        capacity.insert("storage".to_string(), size.into());
        Self {
            api_version: "v1".to_string(),
            kind: "PersistentVolume".to_string(),
            metadata: ObjectMeta::cluster_scoped(name),
            spec: PersistentVolumeSpec {
                capacity,
                access_modes: vec!["ReadWriteOnce".to_string()],
                persistent_volume_reclaim_policy: None,
                storage_class_name: None,
                mount_options: Vec::new(),
                csi: None,
            },
        }
    }
}

/// PersistentVolumeClaim spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    /// Access modes
    pub access_modes: Vec<String>,
    /// Requested resources
    pub resources: VolumeResourceRequests,
    /// Storage class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    /// Bind to a specific PV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
}

/// Storage resource requests for a claim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResourceRequests {
    /// Requests, keyed by resource name ("storage")
    pub requests: BTreeMap<String, String>,
}

/// Kubernetes PersistentVolumeClaim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PersistentVolumeClaimSpec,
}

impl PersistentVolumeClaim {
    /// Create a new claim requesting the given size
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        let mut requests = BTreeMap::new();
        requests.insert("storage".to_string(), size.into());
        Self {
            api_version: "v1".to_string(),
            kind: "PersistentVolumeClaim".to_string(),
            metadata: ObjectMeta::new(name, namespace),
            spec: PersistentVolumeClaimSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                resources: VolumeResourceRequests { requests },
                storage_class_name: None,
                volume_name: None,
            },
        }
    }
}

// =============================================================================
// Container
// =============================================================================

/// Environment variable with a literal value
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Literal value
    pub value: String,
}

impl EnvVar {
    /// Create an env var with a literal value
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Reference to a ConfigMap or Secret for loading env vars wholesale
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
    /// ConfigMap reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<NameRef>,
    /// Secret reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<NameRef>,
}

impl EnvFromSource {
    /// Reference a ConfigMap
    pub fn config_map(name: impl Into<String>) -> Self {
        Self {
            config_map_ref: Some(NameRef { name: name.into() }),
            secret_ref: None,
        }
    }

    /// Reference a Secret
    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            config_map_ref: None,
            secret_ref: Some(NameRef { name: name.into() }),
        }
    }
}

/// A bare name reference
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameRef {
    /// Referenced object name
    pub name: String,
}

/// Container port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub container_port: u16,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Mount of a volume into a container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Volume name
    pub name: String,
    /// Mount path inside the container
    pub mount_path: String,
    /// Mount read-only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// Container spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Command (entrypoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Args
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Environment from ConfigMap/Secret references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvFromSource>,
    /// Ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Volume mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

impl Container {
    /// Create a new container
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: None,
            args: None,
            env: Vec::new(),
            env_from: Vec::new(),
            ports: Vec::new(),
            volume_mounts: Vec::new(),
        }
    }

    /// Add a literal env var
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar::literal(name, value));
        self
    }

    /// Add a volume mount
    pub fn with_mount(mut self, mount: VolumeMount) -> Self {
        self.volume_mounts.push(mount);
        self
    }
}

// =============================================================================
// Pod volumes
// =============================================================================

/// A pod volume: exactly one source set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    pub name: String,
    /// Host-path source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
    /// EmptyDir source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    /// AWS EBS source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_elastic_block_store: Option<AwsEbsVolumeSource>,
    /// PVC source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PvcVolumeSource>,
}

impl Volume {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_path: None,
            empty_dir: None,
            aws_elastic_block_store: None,
            persistent_volume_claim: None,
        }
    }

    /// Host-path volume
    pub fn host_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host_path: Some(HostPathVolumeSource { path: path.into() }),
            ..Self::named(name)
        }
    }

    /// EmptyDir volume
    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            empty_dir: Some(EmptyDirVolumeSource {}),
            ..Self::named(name)
        }
    }

    /// AWS EBS volume
    pub fn aws_ebs(name: impl Into<String>, volume_id: impl Into<String>) -> Self {
        Self {
            aws_elastic_block_store: Some(AwsEbsVolumeSource {
                volume_id: volume_id.into(),
                fs_type: None,
            }),
            ..Self::named(name)
        }
    }

    /// PVC-backed volume
    pub fn pvc(name: impl Into<String>, claim: impl Into<String>) -> Self {
        Self {
            persistent_volume_claim: Some(PvcVolumeSource {
                claim_name: claim.into(),
            }),
            ..Self::named(name)
        }
    }
}

/// Host-path volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostPathVolumeSource {
    /// Path on the node
    pub path: String,
}

/// EmptyDir volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EmptyDirVolumeSource {}

/// AWS EBS volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsEbsVolumeSource {
    /// EBS volume id
    #[serde(rename = "volumeID")]
    pub volume_id: String,
    /// Filesystem type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
}

/// PVC volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PvcVolumeSource {
    /// Claim name
    pub claim_name: String,
}

// =============================================================================
// Deployment
// =============================================================================

/// Label selector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Match labels
    pub match_labels: BTreeMap<String, String>,
}

/// Topology-spread constraint in pod-spec form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopologySpreadConstraint {
    /// Maximum skew
    pub max_skew: u32,
    /// Topology key
    pub topology_key: String,
    /// DoNotSchedule or ScheduleAnyway
    pub when_unsatisfiable: String,
    /// Pods counted for skew
    pub label_selector: LabelSelector,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Service account running the pod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    /// Init containers, run to completion in order before `containers`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_containers: Vec<Container>,
    /// Containers; the app's own container is always first
    pub containers: Vec<Container>,
    /// Pod volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    /// Node selector
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    /// Topology-spread constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topology_spread_constraints: Vec<TopologySpreadConstraint>,
}

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Template metadata (labels select pods; annotations ride along)
    pub metadata: ObjectMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Deployment spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Replica count
    pub replicas: u32,
    /// Pod selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
}

/// Kubernetes Deployment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DeploymentSpec,
}

impl Deployment {
    /// Create a deployment wrapping the given pod spec
    ///
    /// The pod selector matches the standard name label; the
    /// default-container annotation points at the first container.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, pod: PodSpec) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let mut match_labels = BTreeMap::new();
        match_labels.insert(crate::LABEL_NAME.to_string(), name.clone());

        let mut template_meta = ObjectMeta::new(&name, &namespace);
        if let Some(main) = pod.containers.first() {
            template_meta = template_meta
                .with_annotation(crate::DEFAULT_CONTAINER_ANNOTATION, main.name.clone());
        }

        Self {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata: ObjectMeta::new(&name, &namespace),
            spec: DeploymentSpec {
                replicas: 1,
                selector: LabelSelector { match_labels },
                template: PodTemplateSpec {
                    metadata: template_meta,
                    spec: pod,
                },
            },
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port the service listens on
    pub port: u16,
    /// Target container port
    pub target_port: u16,
    /// Node port (NodePort/LoadBalancer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<u16>,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Service spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Service type
    #[serde(rename = "type")]
    pub type_: String,
    /// Pod selector
    pub selector: BTreeMap<String, String>,
    /// Ports
    pub ports: Vec<ServicePort>,
}

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

impl Service {
    /// Create a service selecting the app's pods by the standard name label
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, ports: Vec<ServicePort>) -> Self {
        let name = name.into();
        let mut selector = BTreeMap::new();
        selector.insert(crate::LABEL_NAME.to_string(), name.clone());
        Self {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata: ObjectMeta::new(&name, namespace),
            spec: ServiceSpec {
                type_: "ClusterIP".to_string(),
                selector,
                ports,
            },
        }
    }
}

// =============================================================================
// Custom objects
// =============================================================================

/// An arbitrary custom object (CRD instance) carried as raw JSON
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomObject {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Raw spec payload
    pub spec: serde_json::Value,
}

impl CustomObject {
    /// Create a custom object with the given raw spec
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        spec: serde_json::Value,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: ObjectMeta::new(name, namespace),
            spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_meta_carries_management_labels() {
        let meta = ObjectMeta::new("postgres", "default");
        assert_eq!(meta.labels.get(crate::LABEL_NAME).map(String::as_str), Some("postgres"));
        assert_eq!(
            meta.labels.get(crate::LABEL_MANAGED_BY).map(String::as_str),
            Some(crate::MANAGED_BY)
        );
    }

    #[test]
    fn deployment_annotates_default_container() {
        let pod = PodSpec {
            service_account_name: Some("default".to_string()),
            init_containers: Vec::new(),
            containers: vec![Container::new("airflow", "apache/airflow:2.9")],
            volumes: Vec::new(),
            node_selector: BTreeMap::new(),
            topology_spread_constraints: Vec::new(),
        };
        let deploy = Deployment::new("airflow", "default", pod);
        assert_eq!(
            deploy
                .spec
                .template
                .metadata
                .annotations
                .get(crate::DEFAULT_CONTAINER_ANNOTATION)
                .map(String::as_str),
            Some("airflow")
        );
    }

    #[test]
    fn resources_serialize_in_api_shape() {
        let cm = ConfigMap::new("airflow-env", "default");
        let json = serde_json::to_value(&cm).unwrap();
        assert_eq!(json["apiVersion"], "v1");
        assert_eq!(json["kind"], "ConfigMap");
        assert_eq!(json["metadata"]["name"], "airflow-env");

        let vol = Volume::aws_ebs("data", "vol-0abc");
        let json = serde_json::to_value(&vol).unwrap();
        assert_eq!(json["awsElasticBlockStore"]["volumeID"], "vol-0abc");
    }
}
