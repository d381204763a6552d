//! Kubernetes resource-group builder

use tracing::debug;

use crate::config::{AppConfig, Backend, WorkspaceSync};
use crate::context::BuildContext;
use crate::rbac::RbacBundle;
use crate::resources::{k8s, Resource, ResourceGroup};
use crate::volume::{resolve_volume, NodeSelector};
use crate::{Error, Result};

use super::{all_ports, all_volumes, compose_env, resolve_paths};

/// Build the Kubernetes resource group for an app
///
/// Order within the group follows creation order: RBAC objects first (when
/// isolation is requested), then storage, then the env ConfigMap/Secret,
/// then the Deployment, then the Service. The app's own container is always
/// first in the pod's container list and the default-container annotation
/// points at it.
pub fn build_k8s_resource_group(cfg: &AppConfig, ctx: &BuildContext) -> Result<ResourceGroup> {
    let BuildContext::Kubernetes(kctx) = ctx else {
        return Err(Error::InvalidBuildContext(format!(
            "kubernetes builder for app '{}' got a {} context",
            cfg.name,
            ctx.backend()
        )));
    };

    let paths = resolve_paths(cfg)?;

    // RBAC isolation redirects every namespaced object that follows
    let rbac = cfg
        .rbac
        .as_ref()
        .filter(|r| r.isolated)
        .map(|r| RbacBundle::bootstrap(&cfg.name, r, &kctx.common_labels));
    let (namespace, service_account) = match &rbac {
        Some(bundle) => (
            bundle.namespace_name().to_string(),
            bundle.service_account_name().to_string(),
        ),
        None => (kctx.namespace.clone(), kctx.service_account.clone()),
    };

    let env = compose_env(cfg, Backend::Kubernetes, paths.as_ref())?;

    let mut group = ResourceGroup::new(&cfg.name);
    if let Some(bundle) = rbac {
        group.push(Resource::Namespace(bundle.namespace));
        group.push(Resource::ServiceAccount(bundle.service_account));
        group.push(Resource::ClusterRole(bundle.cluster_role));
        group.push(Resource::ClusterRoleBinding(bundle.cluster_role_binding));
    }

    let mut main = k8s::Container::new(&cfg.name, &cfg.image);
    main.command = cfg.entrypoint.clone();
    main.args = cfg.command.clone();

    let mut pod_volumes: Vec<k8s::Volume> = Vec::new();
    let mut init_containers: Vec<k8s::Container> = Vec::new();
    let mut sidecars: Vec<k8s::Container> = Vec::new();
    let mut claims: Vec<k8s::PersistentVolumeClaim> = Vec::new();
    let mut pvs: Vec<k8s::PersistentVolume> = Vec::new();
    let mut selector = NodeSelector::from_map(cfg.node_selector.clone());

    // Workspace volume: EmptyDir synced from git (sidecar, plus a one-shot
    // init sync when requested) or a direct host-path bind
    if let (Some(ws), Some(paths)) = (&cfg.workspace, &paths) {
        let vol_name = format!("{}-workspace", cfg.name);
        let mount = k8s::VolumeMount {
            name: vol_name.clone(),
            mount_path: paths.workspace_root.clone(),
            read_only: false,
        };
        match &ws.sync {
            WorkspaceSync::HostPath => {
                pod_volumes.push(k8s::Volume::host_path(&vol_name, &ws.root));
                main.volume_mounts.push(mount);
            }
            WorkspaceSync::GitSync(git) => {
                let repo = git.repo.as_ref().ok_or_else(|| {
                    Error::MissingGitSyncRepo(format!(
                        "app '{}' requests git-sync for its workspace without a repository",
                        cfg.name
                    ))
                })?;
                pod_volumes.push(k8s::Volume::empty_dir(&vol_name));
                main.volume_mounts.push(mount.clone());

                let sync_container = |name: String, one_time: bool| {
                    let mut c = k8s::Container::new(name, &git.image)
                        .with_env("GITSYNC_REPO", repo)
                        .with_env("GITSYNC_REF", &git.revision)
                        .with_env("GITSYNC_ROOT", &paths.workspace_root)
                        .with_mount(mount.clone());
                    if one_time {
                        c = c.with_env("GITSYNC_ONE_TIME", "true");
                    }
                    c
                };
                if git.one_shot_init {
                    // Initial sync must finish before the main container
                    // starts, so it goes in the init list
                    init_containers.push(sync_container(format!("{}-git-sync-init", cfg.name), true));
                }
                sidecars.push(sync_container(format!("{}-git-sync", cfg.name), false));
            }
        }
    }

    let workspace = cfg.workspace_name();
    for binding in all_volumes(cfg) {
        let resolved = resolve_volume(
            binding,
            &cfg.name,
            workspace,
            &namespace,
            None,
            &mut selector,
        )?;
        main.volume_mounts.push(resolved.mount);
        pod_volumes.push(resolved.volume);
        claims.extend(resolved.claim);
        pvs.extend(resolved.persistent_volume);
    }

    for port in all_ports(cfg) {
        main.ports.push(k8s::ContainerPort {
            name: port.name.clone(),
            container_port: port.container_port,
            protocol: Some(port.protocol.to_string()),
        });
    }

    // Non-secret env goes in a ConfigMap, the secrets-file portion in a
    // Secret; the container references both wholesale
    if !env.plain.is_empty() {
        let cm_name = format!("{}-env", cfg.name);
        let mut cm = k8s::ConfigMap::new(&cm_name, &namespace);
        cm.metadata = cm.metadata.with_labels(&kctx.common_labels).with_labels(&cfg.labels);
        cm.data = env.plain.clone();
        group.push(Resource::ConfigMap(cm));
        main.env_from.push(k8s::EnvFromSource::config_map(cm_name));
    }
    if !env.secret.is_empty() {
        let secret_name = format!("{}-env-secret", cfg.name);
        let mut secret = k8s::Secret::new(&secret_name, &namespace);
        secret.metadata = secret
            .metadata
            .with_labels(&kctx.common_labels)
            .with_labels(&cfg.labels);
        secret.string_data = env.secret.clone();
        group.push(Resource::Secret(secret));
        main.env_from.push(k8s::EnvFromSource::secret(secret_name));
    }

    for mut pv in pvs {
        pv.metadata = pv.metadata.with_labels(&kctx.common_labels).with_labels(&cfg.labels);
        group.push(Resource::PersistentVolume(pv));
    }
    for mut claim in claims {
        claim.metadata = claim
            .metadata
            .with_labels(&kctx.common_labels)
            .with_labels(&cfg.labels);
        group.push(Resource::PersistentVolumeClaim(claim));
    }

    // Main container first; extras follow in declared order
    let mut containers = vec![main];
    containers.extend(sidecars);
    containers.extend(cfg.extras.containers.iter().cloned());
    init_containers.extend(cfg.extras.init_containers.iter().cloned());

    let pod = k8s::PodSpec {
        service_account_name: Some(service_account),
        init_containers,
        containers,
        volumes: pod_volumes,
        node_selector: selector.into_map(),
        topology_spread_constraints: topology_constraints(cfg),
    };
    let mut deployment = k8s::Deployment::new(&cfg.name, &namespace, pod);
    deployment.spec.replicas = cfg.replicas;
    deployment.metadata = deployment
        .metadata
        .with_labels(&kctx.common_labels)
        .with_labels(&cfg.labels);
    for (key, value) in &cfg.annotations {
        deployment.metadata = deployment.metadata.with_annotation(key.clone(), value.clone());
    }
    if let Some(version) = &cfg.version {
        deployment.metadata = deployment.metadata.with_label("app.kubernetes.io/version", version.clone());
    }
    group.push(Resource::Deployment(deployment));

    if let Some(svc_cfg) = &cfg.service {
        let ports = all_ports(cfg)
            .iter()
            .map(|p| k8s::ServicePort {
                name: p.name.clone(),
                port: p.service_port.unwrap_or(p.container_port),
                target_port: p.container_port,
                node_port: p.node_port,
                protocol: Some(p.protocol.to_string()),
            })
            .collect();
        let mut service = k8s::Service::new(&cfg.name, &namespace, ports);
        service.spec.type_ = svc_cfg.service_type.to_string();
        service.metadata = service
            .metadata
            .with_labels(&kctx.common_labels)
            .with_labels(&cfg.labels);
        for (key, value) in &svc_cfg.annotations {
            service.metadata = service.metadata.with_annotation(key.clone(), value.clone());
        }
        group.push(Resource::Service(service));
    }

    if !cfg.extras.resources.is_empty() {
        debug!(app = %cfg.name, count = cfg.extras.resources.len(), "merging extra resources");
        group.extend(cfg.extras.resources.iter().cloned());
    }

    Ok(group)
}

fn topology_constraints(cfg: &AppConfig) -> Vec<k8s::TopologySpreadConstraint> {
    let Some(spread) = &cfg.topology_spread else {
        return Vec::new();
    };
    let mut match_labels = std::collections::BTreeMap::new();
    match_labels.insert(crate::LABEL_NAME.to_string(), cfg.name.clone());
    vec![k8s::TopologySpreadConstraint {
        max_skew: spread.max_skew,
        topology_key: spread.key.clone(),
        when_unsatisfiable: spread.when_unsatisfiable.to_string(),
        label_selector: k8s::LabelSelector { match_labels },
    }]
}
