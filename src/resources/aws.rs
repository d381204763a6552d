//! AWS resource types
//!
//! Descriptors for the ECS/ELB shapes the AWS backend emits: a task
//! definition with container definitions, an ECS service, and the load
//! balancer / target group / listener trio for exposed apps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Port mapping on an ECS container definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    /// Container port
    pub container_port: u16,
    /// Host port
    pub host_port: u16,
    /// Protocol ("tcp"/"udp")
    pub protocol: String,
}

/// ECS container definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    /// Container name
    pub name: String,
    /// Image reference
    pub image: String,
    /// Essential containers stop the task when they exit
    pub essential: bool,
    /// Entry point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<Vec<String>>,
    /// Command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Port mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
}

impl ContainerDefinition {
    /// Create an essential container definition
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            essential: true,
            entry_point: None,
            command: None,
            environment: BTreeMap::new(),
            port_mappings: Vec::new(),
        }
    }
}

/// ECS task definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    /// Task family name
    pub family: String,
    /// Container definitions; the app's own container is always first
    pub container_definitions: Vec<ContainerDefinition>,
    /// Task CPU units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Task memory (MiB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl TaskDefinition {
    /// Create a task definition for the given family
    pub fn new(family: impl Into<String>, containers: Vec<ContainerDefinition>) -> Self {
        Self {
            family: family.into(),
            container_definitions: containers,
            cpu: None,
            memory: None,
        }
    }
}

/// ECS service running a task definition on a cluster
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EcsService {
    /// Service name
    pub name: String,
    /// ECS cluster name
    pub cluster: String,
    /// Task definition family
    pub task_definition: String,
    /// Desired task count
    pub desired_count: u32,
    /// Target group the service registers with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group: Option<String>,
}

/// Application load balancer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    /// Load balancer name
    pub name: String,
    /// Scheme ("internet-facing"/"internal")
    pub scheme: String,
}

impl LoadBalancer {
    /// Create an internet-facing load balancer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scheme: "internet-facing".to_string(),
        }
    }
}

/// Target group the load balancer forwards to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    /// Target group name
    pub name: String,
    /// Target port
    pub port: u16,
    /// Protocol ("HTTP"/"TCP")
    pub protocol: String,
}

/// Listener binding a load balancer port to a target group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    /// Listener name
    pub name: String,
    /// Load balancer name
    pub load_balancer: String,
    /// Listening port
    pub port: u16,
    /// Protocol
    pub protocol: String,
    /// Forward target group
    pub target_group: String,
}
