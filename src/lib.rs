//! Stevedore - declarative app-to-infrastructure translation
//!
//! Stevedore turns declarative app descriptions (Airflow, Jupyter, Postgres,
//! Qdrant, anything container-shaped) into concrete infrastructure resource
//! groups for Docker, Kubernetes, or AWS, and reconciles them against the
//! target backend.
//!
//! # Pipeline
//!
//! An [`config::AppConfig`] plus a backend [`context::BuildContext`] goes
//! through a builder ([`build`]) that resolves container paths, composes the
//! layered environment, resolves volumes, and bootstraps RBAC, producing a
//! [`resources::ResourceGroup`]. The [`worker::ReconcileWorker`] then drives
//! groups to the backend in dependency order.
//!
//! # Modules
//!
//! - [`config`] - Declarative app descriptions (ports, volumes, workspace, database, RBAC)
//! - [`context`] - Per-backend ambient build settings
//! - [`paths`] - Container path resolution from workspace specs
//! - [`env`] - Layered environment composition and connection URLs
//! - [`volume`] - Volume resolution and EBS topology pinning
//! - [`rbac`] - RBAC bootstrapping for isolated apps
//! - [`resources`] - Typed resource descriptors and resource groups
//! - [`build`] - Per-backend resource-group builders
//! - [`worker`] - Reconciliation worker (build, filter, confirm, execute, report)
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod build;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod paths;
pub mod rbac;
pub mod resources;
pub mod volume;
pub mod worker;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================
// Shared across builders, resource constructors, and test fixtures.

/// Label carrying the app name on every built resource
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

/// Label marking resources as managed by this tool
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of the managed-by label
pub const MANAGED_BY: &str = "stevedore";

/// Annotation selecting the default container for kubectl
pub const DEFAULT_CONTAINER_ANNOTATION: &str = "kubectl.kubernetes.io/default-container";

/// Node label for the AWS region a node runs in
pub const TOPOLOGY_REGION_KEY: &str = "topology.kubernetes.io/region";

/// Node label for the availability zone a node runs in
pub const TOPOLOGY_ZONE_KEY: &str = "topology.kubernetes.io/zone";

/// Environment variable telling the app which backend it runs on
pub const ENV_BACKEND: &str = "DEPLOY_BACKEND";

/// Default git-sync image for synced workspaces
pub const DEFAULT_GIT_SYNC_IMAGE: &str = "registry.k8s.io/git-sync/git-sync:v4.2.3";
