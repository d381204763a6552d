//! Volume resolution
//!
//! Dispatches on a declared volume's source to produce the pod volume and
//! mount descriptors, plus claim/PV objects for persistent volumes. EBS
//! volumes additionally pin the pod to the volume's region and availability
//! zone through the [`NodeSelector`] accumulator so the pod cannot schedule
//! away from its block storage.
//!
//! The node selector is an explicit single-writer accumulator owned by one
//! build call; it is never shared across builds.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::debug;

use crate::config::{ReclaimPolicy, VolumeBinding, VolumeSource};
use crate::resources::k8s;
use crate::{Error, Result};

/// Accessor capability for an already-provisioned EBS volume
///
/// Lets a declared volume reference a live AWS-layer object and resolve its
/// id, region, and availability zone lazily at build time.
pub trait EbsVolumeSource: Send + Sync {
    /// EBS volume id
    fn volume_id(&self) -> Option<String>;
    /// Region the volume lives in
    fn region(&self) -> Option<String>;
    /// Availability zone the volume lives in
    fn availability_zone(&self) -> Option<String>;
}

/// Node-selector accumulator threaded through volume resolution
///
/// Single writer, scoped to one build call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSelector(BTreeMap<String, String>);

impl NodeSelector {
    /// Start from the app's declared node selector
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    /// Add a selector key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a selector key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True when no keys are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the plain map the pod spec carries
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Result of resolving one declared volume
#[derive(Clone, Debug)]
pub struct ResolvedVolume {
    /// Pod volume descriptor
    pub volume: k8s::Volume,
    /// Mount for the main container
    pub mount: k8s::VolumeMount,
    /// Claim to create, for persistent volumes
    pub claim: Option<k8s::PersistentVolumeClaim>,
    /// Explicit PV to create, when a concrete volume handle was given
    pub persistent_volume: Option<k8s::PersistentVolume>,
}

/// Derive the volume's name
///
/// Explicit names win; otherwise `"<app>-volume"`, qualified by the
/// workspace name when one is present. Stable across repeated builds so
/// re-deploys target the same volume.
pub fn volume_name(binding: &VolumeBinding, app: &str, workspace: Option<&str>) -> String {
    if let Some(name) = &binding.name {
        return name.clone();
    }
    match workspace {
        Some(ws) => format!("{ws}-{app}-volume"),
        None => format!("{app}-volume"),
    }
}

/// Resolve a declared volume into pod volume/mount descriptors
///
/// `ambient_region` is the build context's AWS region, used as the last
/// fallback for EBS topology pinning. `selector` accumulates topology keys
/// when `schedule_in_topology` is set.
pub fn resolve_volume(
    binding: &VolumeBinding,
    app: &str,
    workspace: Option<&str>,
    namespace: &str,
    ambient_region: Option<&str>,
    selector: &mut NodeSelector,
) -> Result<ResolvedVolume> {
    let name = volume_name(binding, app, workspace);
    let mount = k8s::VolumeMount {
        name: name.clone(),
        mount_path: binding.mount_path.clone(),
        read_only: binding.read_only,
    };

    match &binding.source {
        VolumeSource::HostPath { path } => {
            if path.trim().is_empty() {
                return Err(Error::MissingHostPath(format!(
                    "volume '{name}' on app '{app}' declares a host-path source without a path"
                )));
            }
            Ok(ResolvedVolume {
                volume: k8s::Volume::host_path(&name, path),
                mount,
                claim: None,
                persistent_volume: None,
            })
        }
        VolumeSource::EmptyDir => Ok(ResolvedVolume {
            volume: k8s::Volume::empty_dir(&name),
            mount,
            claim: None,
            persistent_volume: None,
        }),
        VolumeSource::AwsEbs(ebs) => {
            let source = ebs.source.as_deref();
            let volume_id = ebs
                .volume_id
                .clone()
                .or_else(|| source.and_then(|s| s.volume_id()))
                .ok_or_else(|| {
                    Error::MissingVolumeId(format!(
                        "volume '{name}' on app '{app}' has neither an explicit EBS volume id \
                         nor a resolvable volume reference"
                    ))
                })?;

            if ebs.schedule_in_topology {
                let region = ebs
                    .region
                    .clone()
                    .or_else(|| source.and_then(|s| s.region()))
                    .or_else(|| ambient_region.map(str::to_string));
                let zone = ebs
                    .availability_zone
                    .clone()
                    .or_else(|| source.and_then(|s| s.availability_zone()));
                if let Some(region) = region {
                    selector.insert(crate::TOPOLOGY_REGION_KEY, region);
                }
                if let Some(zone) = zone {
                    selector.insert(crate::TOPOLOGY_ZONE_KEY, zone);
                }
                debug!(volume = %name, "pinned pod topology to EBS volume location");
            }

            Ok(ResolvedVolume {
                volume: k8s::Volume::aws_ebs(&name, volume_id),
                mount,
                claim: None,
                persistent_volume: None,
            })
        }
        VolumeSource::PersistentVolume(pv_cfg) => {
            let reclaim = pv_cfg
                .reclaim_policy
                .as_deref()
                .map(ReclaimPolicy::from_str)
                .transpose()?;

            let mut claim = k8s::PersistentVolumeClaim::new(&name, namespace, &pv_cfg.size);
            claim.spec.access_modes = pv_cfg.access_modes.clone();
            claim.spec.storage_class_name = pv_cfg.storage_class.clone();

            let persistent_volume = pv_cfg.volume_handle.as_ref().map(|handle| {
                let pv_name = format!("{name}-pv");
                let mut pv = k8s::PersistentVolume::new(&pv_name, &pv_cfg.size);
                pv.spec.access_modes = pv_cfg.access_modes.clone();
                pv.spec.persistent_volume_reclaim_policy = reclaim.map(|r| r.to_string());
                pv.spec.storage_class_name = pv_cfg.storage_class.clone();
                pv.spec.mount_options = pv_cfg.mount_options.clone();
                pv.spec.csi = Some(k8s::CsiVolumeSource {
                    driver: pv_cfg
                        .driver
                        .clone()
                        .unwrap_or_else(|| "ebs.csi.aws.com".to_string()),
                    volume_handle: handle.clone(),
                });
                pv
            });
            if let Some(pv) = &persistent_volume {
                claim.spec.volume_name = Some(pv.metadata.name.clone());
            }

            Ok(ResolvedVolume {
                volume: k8s::Volume::pvc(&name, &name),
                mount,
                claim: Some(claim),
                persistent_volume,
            })
        }
    }
}
