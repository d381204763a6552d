//! Docker resource-group builder

use tracing::debug;

use crate::config::{AppConfig, Backend, VolumeSource, WorkspaceSync};
use crate::context::BuildContext;
use crate::resources::{docker, Resource, ResourceGroup};
use crate::volume::volume_name;
use crate::{Error, Result};

use super::{all_ports, all_volumes, compose_env, resolve_paths};

/// Build the Docker resource group for an app
///
/// Emits the network, any named volumes, and the app's containers. The
/// composed environment is inlined on the container; Docker has no
/// ConfigMap/Secret split.
pub fn build_docker_resource_group(cfg: &AppConfig, ctx: &BuildContext) -> Result<ResourceGroup> {
    let BuildContext::Docker(dctx) = ctx else {
        return Err(Error::InvalidBuildContext(format!(
            "docker builder for app '{}' got a {} context",
            cfg.name,
            ctx.backend()
        )));
    };

    let paths = resolve_paths(cfg)?;
    let env = compose_env(cfg, Backend::Docker, paths.as_ref())?;

    let mut group = ResourceGroup::new(&cfg.name);
    group.push(Resource::DockerNetwork(docker::Network::new(&dctx.network)));

    let mut main = docker::Container::new(&cfg.name, &cfg.image, &dctx.network);
    main.entrypoint = cfg.entrypoint.clone();
    main.command = cfg.command.clone();
    main.env = env.merged();

    let mut named_volumes: Vec<docker::Volume> = Vec::new();
    let mut sidecars: Vec<docker::Container> = Vec::new();

    // Workspace volume: direct bind of the host root, or a named volume
    // kept in sync from git by a sidecar container
    if let (Some(ws), Some(paths)) = (&cfg.workspace, &paths) {
        match &ws.sync {
            WorkspaceSync::HostPath => {
                main.mounts.push(docker::Mount {
                    source: ws.root.clone(),
                    target: paths.workspace_root.clone(),
                    read_only: false,
                });
            }
            WorkspaceSync::GitSync(git) => {
                let repo = git.repo.as_ref().ok_or_else(|| {
                    Error::MissingGitSyncRepo(format!(
                        "app '{}' requests git-sync for its workspace without a repository",
                        cfg.name
                    ))
                })?;
                let vol = format!("{}-workspace", cfg.name);
                named_volumes.push(docker::Volume::new(&vol));
                main.mounts.push(docker::Mount {
                    source: vol.clone(),
                    target: paths.workspace_root.clone(),
                    read_only: false,
                });
                let sidecar = docker::Container::new(
                    format!("{}-git-sync", cfg.name),
                    &git.image,
                    &dctx.network,
                )
                .with_env("GITSYNC_REPO", repo)
                .with_env("GITSYNC_REF", &git.revision)
                .with_env("GITSYNC_ROOT", &paths.workspace_root)
                .with_mount(docker::Mount {
                    source: vol,
                    target: paths.workspace_root.clone(),
                    read_only: false,
                });
                sidecars.push(sidecar);
            }
        }
    }

    let workspace = cfg.workspace_name();
    for binding in all_volumes(cfg) {
        let name = volume_name(binding, &cfg.name, workspace);
        let source = match &binding.source {
            VolumeSource::HostPath { path } => {
                if path.trim().is_empty() {
                    return Err(Error::MissingHostPath(format!(
                        "volume '{name}' on app '{}' declares a host-path source without a path",
                        cfg.name
                    )));
                }
                path.clone()
            }
            VolumeSource::EmptyDir => {
                named_volumes.push(docker::Volume::new(&name));
                name.clone()
            }
            VolumeSource::AwsEbs(_) | VolumeSource::PersistentVolume(_) => {
                return Err(Error::UnsupportedVolumeType(format!(
                    "volume '{name}' on app '{}' uses a source the docker backend cannot mount",
                    cfg.name
                )));
            }
        };
        main.mounts.push(docker::Mount {
            source,
            target: binding.mount_path.clone(),
            read_only: binding.read_only,
        });
    }

    for port in all_ports(cfg) {
        let host = port.host_port.unwrap_or(port.container_port);
        main.ports.insert(port.container_port, host);
    }

    for vol in named_volumes {
        group.push(Resource::DockerVolume(vol));
    }
    // Main container always precedes its sidecars
    group.push(Resource::DockerContainer(main));
    for sidecar in sidecars {
        group.push(Resource::DockerContainer(sidecar));
    }

    if !cfg.extras.resources.is_empty() {
        debug!(app = %cfg.name, count = cfg.extras.resources.len(), "merging extra resources");
        group.extend(cfg.extras.resources.iter().cloned());
    }

    Ok(group)
}
