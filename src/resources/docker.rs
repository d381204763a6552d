//! Docker resource types
//!
//! Compose-shaped descriptors for the Docker backend: a user network, named
//! volumes, and containers. Serialization matches what the engine-facing
//! client expects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Docker user network
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Network name
    pub name: String,
    /// Network driver
    #[serde(default = "default_bridge")]
    pub driver: String,
}

fn default_bridge() -> String {
    "bridge".to_string()
}

impl Network {
    /// Create a bridge network
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: default_bridge(),
        }
    }
}

/// Docker named volume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    pub name: String,
    /// Volume driver
    #[serde(default = "default_local")]
    pub driver: String,
}

fn default_local() -> String {
    "local".to_string()
}

impl Volume {
    /// Create a local named volume
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: default_local(),
        }
    }
}

/// A bind or named-volume mount on a container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
    /// Host path or volume name
    pub source: String,
    /// Path inside the container
    pub target: String,
    /// Mount read-only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// Docker container
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name (also its alias on the network)
    pub name: String,
    /// Image reference
    pub image: String,
    /// Network the container joins
    pub network: String,
    /// Entrypoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Command override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Port publishing: container port -> host port
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ports: BTreeMap<u16, u16>,
    /// Mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    /// Restart policy
    #[serde(default = "default_restart")]
    pub restart: String,
}

fn default_restart() -> String {
    "unless-stopped".to_string()
}

impl Container {
    /// Create a container on the given network
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            network: network.into(),
            entrypoint: None,
            command: None,
            env: BTreeMap::new(),
            ports: BTreeMap::new(),
            mounts: Vec::new(),
            restart: default_restart(),
        }
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Publish a container port on a host port
    pub fn with_port(mut self, container_port: u16, host_port: u16) -> Self {
        self.ports.insert(container_port, host_port);
        self
    }

    /// Add a mount
    pub fn with_mount(mut self, mount: Mount) -> Self {
        self.mounts.push(mount);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_defaults() {
        let c = Container::new("postgres", "postgres:16", "apps-net");
        assert_eq!(c.restart, "unless-stopped");
        assert!(c.ports.is_empty());
    }

    #[test]
    fn port_map_is_container_to_host() {
        let c = Container::new("web", "nginx", "apps-net").with_port(80, 8080);
        assert_eq!(c.ports.get(&80), Some(&8080));
    }
}
