//! Resource-group builders
//!
//! One builder per backend turns an [`AppConfig`] plus a [`BuildContext`]
//! into a [`ResourceGroup`]. All three follow the same algorithm: validate
//! the context, resolve container paths, bootstrap RBAC when requested,
//! compose the environment, resolve volumes and ports, construct the main
//! container first, then the workload, then the service, and finally merge
//! caller-supplied extras.
//!
//! Builds are all-or-nothing: any precondition failure aborts the whole
//! build and returns no group, never a partial one.

mod aws;
mod docker;
mod k8s;

pub use aws::build_aws_resource_group;
pub use docker::build_docker_resource_group;
pub use k8s::build_k8s_resource_group;

use std::collections::BTreeMap;

use crate::config::{AppConfig, Backend, PortSpec, VolumeBinding};
use crate::context::BuildContext;
use crate::env::{ComposedEnv, EnvComposer};
use crate::paths::ContainerPaths;
use crate::resources::ResourceGroup;
use crate::Result;

/// Build the resource group for whichever backend the context belongs to
pub fn build_resource_group(cfg: &AppConfig, ctx: &BuildContext) -> Result<ResourceGroup> {
    match ctx {
        BuildContext::Docker(_) => build_docker_resource_group(cfg, ctx),
        BuildContext::Kubernetes(_) => build_k8s_resource_group(cfg, ctx),
        BuildContext::Aws(_) => build_aws_resource_group(cfg, ctx),
    }
}

/// Resolve container paths when a workspace is configured
pub(crate) fn resolve_paths(cfg: &AppConfig) -> Result<Option<ContainerPaths>> {
    cfg.workspace
        .as_ref()
        .map(ContainerPaths::resolve)
        .transpose()
}

/// All declared ports: the app's own plus extras
pub(crate) fn all_ports(cfg: &AppConfig) -> Vec<&PortSpec> {
    cfg.ports.iter().chain(cfg.extras.ports.iter()).collect()
}

/// All declared volumes: the app's own plus extras
pub(crate) fn all_volumes(cfg: &AppConfig) -> Vec<&VolumeBinding> {
    cfg.volumes.iter().chain(cfg.extras.volumes.iter()).collect()
}

/// Base/runtime environment: backend tag, workspace path variables, and the
/// port-binding variables declared on port specs
///
/// Port variables are written in the same pass that appends the port
/// descriptors, so the process always binds a routed port.
pub(crate) fn base_env(
    cfg: &AppConfig,
    backend: Backend,
    paths: Option<&ContainerPaths>,
) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert(crate::ENV_BACKEND.to_string(), backend.to_string());

    if let Some(paths) = paths {
        vars.insert("WORKSPACE_ROOT".to_string(), paths.workspace_root.clone());
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                vars.insert(key.to_string(), v.clone());
            }
        };
        put("WORKSPACE_SCRIPTS", &paths.scripts);
        put("WORKSPACE_STORAGE", &paths.storage);
        put("WORKSPACE_META", &paths.meta);
        put("WORKSPACE_PRODUCTS", &paths.products);
        put("WORKSPACE_NOTEBOOKS", &paths.notebooks);
        put("WORKSPACE_WORKFLOWS", &paths.workflows);
        put("WORKSPACE_CONFIG", &paths.config);
        put("REQUIREMENTS_FILE", &paths.requirements_file);
    }

    for port in all_ports(cfg) {
        if let Some(var) = &port.env_var {
            vars.insert(var.clone(), port.container_port.to_string());
        }
    }

    vars
}

/// Variables a database-serving app exports so its own process initializes
/// the right user/password/schema
///
/// Each variable is emitted independently and only when its field is set.
pub(crate) fn database_server_env(cfg: &AppConfig) -> Vec<(String, String)> {
    let Some(db) = &cfg.database else {
        return Vec::new();
    };
    // Postgres images use the POSTGRES_* convention; everything else gets
    // the generic names
    let (user_key, password_key, schema_key) = if db.driver.starts_with("postgres") {
        ("POSTGRES_USER", "POSTGRES_PASSWORD", "POSTGRES_DB")
    } else {
        ("DATABASE_USER", "DATABASE_PASSWORD", "DATABASE_NAME")
    };
    let mut vars = Vec::new();
    if let Some(user) = &db.user {
        vars.push((user_key.to_string(), user.clone()));
    }
    if let Some(password) = &db.password {
        vars.push((password_key.to_string(), password.clone()));
    }
    if let Some(schema) = &db.schema {
        vars.push((schema_key.to_string(), schema.clone()));
    }
    vars
}

/// Compose the full container environment for an app on a backend
///
/// Layering, low to high precedence: base/runtime vars, derived connection
/// vars, env file, secrets file, user env.
pub(crate) fn compose_env(
    cfg: &AppConfig,
    backend: Backend,
    paths: Option<&ContainerPaths>,
) -> Result<ComposedEnv> {
    let mut composer = EnvComposer::new().base(&base_env(cfg, backend, paths));
    for (key, value) in database_server_env(cfg) {
        composer = composer.connection_var(key, value);
    }
    for connection in &cfg.connections {
        composer = composer.connection(connection, backend);
    }
    composer = composer
        .env_file(cfg.env_file.as_deref())?
        .secrets_file(cfg.secrets_file.as_deref())?;
    Ok(composer.user(&cfg.env).compose())
}
