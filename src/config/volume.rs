//! Volume declarations for app configs
//!
//! A volume declaration is a tagged union: exactly one source type is active
//! per declared volume, and the source determines which fields are required.
//! Requirements are validated at build time by the volume resolver, not at
//! mount time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::volume::EbsVolumeSource;

/// A declared volume: a source plus the container path it mounts at
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBinding {
    /// Explicit volume name; derived from the app name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mount path inside the container
    pub mount_path: String,
    /// Mount read-only
    #[serde(default)]
    pub read_only: bool,
    /// Volume source
    #[serde(default)]
    pub source: VolumeSource,
}

impl VolumeBinding {
    /// Create a binding with the given source mounted at `mount_path`
    pub fn new(mount_path: impl Into<String>, source: VolumeSource) -> Self {
        Self {
            name: None,
            mount_path: mount_path.into(),
            read_only: false,
            source,
        }
    }

    /// Set an explicit volume name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the mount read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Volume source, dispatched on by the volume resolver
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum VolumeSource {
    /// Bind a path on the node/host into the container
    HostPath {
        /// Absolute path on the host
        path: String,
    },
    /// Pod-lifetime scratch volume
    #[default]
    EmptyDir,
    /// AWS EBS-backed volume
    AwsEbs(EbsVolume),
    /// PersistentVolumeClaim-backed volume
    PersistentVolume(PersistentVolumeConfig),
}

/// AWS EBS volume declaration
///
/// The volume id, region, and availability zone may be given explicitly or
/// resolved lazily through an [`EbsVolumeSource`] reference (an already-built
/// volume object from the AWS layer). Region falls back to the ambient AWS
/// region of the build context.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbsVolume {
    /// Explicit EBS volume id (`vol-...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
    /// Explicit region override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Explicit availability-zone override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Pin the pod to the volume's region/zone via node-selector keys
    #[serde(default)]
    pub schedule_in_topology: bool,
    /// Live reference that can supply id/region/zone when not set explicitly
    #[serde(skip)]
    pub source: Option<Arc<dyn EbsVolumeSource>>,
}

impl fmt::Debug for EbsVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EbsVolume")
            .field("volume_id", &self.volume_id)
            .field("region", &self.region)
            .field("availability_zone", &self.availability_zone)
            .field("schedule_in_topology", &self.schedule_in_topology)
            .field("source", &self.source.as_ref().map(|_| "<ref>"))
            .finish()
    }
}

/// PersistentVolume/Claim declaration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeConfig {
    /// Requested storage size (e.g. "10Gi")
    pub size: String,
    /// Access modes; defaults to ReadWriteOnce
    #[serde(default = "default_access_modes")]
    pub access_modes: Vec<String>,
    /// Storage class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    /// Reclaim policy (Retain, Delete, Recycle); validated at build time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<String>,
    /// Mount options for the PV
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_options: Vec<String>,
    /// Concrete volume handle; when set, an explicit PV is built alongside the PVC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_handle: Option<String>,
    /// CSI driver for the explicit PV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

impl Default for PersistentVolumeConfig {
    fn default() -> Self {
        Self {
            size: "1Gi".to_string(),
            access_modes: default_access_modes(),
            storage_class: None,
            reclaim_policy: None,
            mount_options: Vec::new(),
            volume_handle: None,
            driver: None,
        }
    }
}

fn default_access_modes() -> Vec<String> {
    vec!["ReadWriteOnce".to_string()]
}

/// Validated PV reclaim policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Keep the volume after claim release
    Retain,
    /// Delete the volume after claim release
    Delete,
    /// Scrub and reuse (legacy)
    Recycle,
}

impl std::str::FromStr for ReclaimPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Retain" => Ok(Self::Retain),
            "Delete" => Ok(Self::Delete),
            "Recycle" => Ok(Self::Recycle),
            other => Err(crate::Error::InvalidReclaimPolicy(format!(
                "{other}, expected one of: Retain, Delete, Recycle"
            ))),
        }
    }
}

impl fmt::Display for ReclaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retain => write!(f, "Retain"),
            Self::Delete => write!(f, "Delete"),
            Self::Recycle => write!(f, "Recycle"),
        }
    }
}
