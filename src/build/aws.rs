//! AWS resource-group builder

use tracing::{debug, warn};

use crate::config::{AppConfig, Backend, Protocol};
use crate::context::BuildContext;
use crate::resources::{aws, Resource, ResourceGroup};
use crate::{Error, Result};

use super::{all_ports, all_volumes, compose_env, resolve_paths};

/// Build the AWS resource group for an app
///
/// Emits an ECS task definition plus a service on the ambient cluster; apps
/// with a service config additionally get the load balancer, target group,
/// and listener trio. The composed environment is inlined on the container
/// definition. Volume bindings have no ECS counterpart here and are skipped
/// with a warning.
pub fn build_aws_resource_group(cfg: &AppConfig, ctx: &BuildContext) -> Result<ResourceGroup> {
    let BuildContext::Aws(actx) = ctx else {
        return Err(Error::InvalidBuildContext(format!(
            "aws builder for app '{}' got a {} context",
            cfg.name,
            ctx.backend()
        )));
    };

    let paths = resolve_paths(cfg)?;
    let env = compose_env(cfg, Backend::Aws, paths.as_ref())?;

    let mut main = aws::ContainerDefinition::new(&cfg.name, &cfg.image);
    main.entry_point = cfg.entrypoint.clone();
    main.command = cfg.command.clone();
    main.environment = env.merged();

    for port in all_ports(cfg) {
        main.port_mappings.push(aws::PortMapping {
            container_port: port.container_port,
            host_port: port.host_port.unwrap_or(port.container_port),
            protocol: match port.protocol {
                Protocol::Tcp => "tcp".to_string(),
                Protocol::Udp => "udp".to_string(),
            },
        });
    }

    for binding in all_volumes(cfg) {
        warn!(
            app = %cfg.name,
            mount = %binding.mount_path,
            "aws backend has no task-level volume support, skipping binding"
        );
    }

    let mut group = ResourceGroup::new(&cfg.name);

    // Exposure plumbing first: LB, then target group, then the listener
    // tying them together
    let target_group = cfg.service.as_ref().map(|_| {
        let lb_name = format!("{}-lb", cfg.name);
        let tg_name = format!("{}-tg", cfg.name);
        let port = all_ports(cfg)
            .first()
            .map(|p| p.service_port.unwrap_or(p.container_port))
            .unwrap_or(80);
        group.push(Resource::LoadBalancer(aws::LoadBalancer::new(&lb_name)));
        group.push(Resource::TargetGroup(aws::TargetGroup {
            name: tg_name.clone(),
            port,
            protocol: "HTTP".to_string(),
        }));
        group.push(Resource::Listener(aws::Listener {
            name: format!("{}-listener", cfg.name),
            load_balancer: lb_name,
            port,
            protocol: "HTTP".to_string(),
            target_group: tg_name.clone(),
        }));
        tg_name
    });

    group.push(Resource::TaskDefinition(aws::TaskDefinition::new(
        &cfg.name,
        vec![main],
    )));
    group.push(Resource::EcsService(aws::EcsService {
        name: cfg.name.clone(),
        cluster: actx.cluster.clone(),
        task_definition: cfg.name.clone(),
        desired_count: cfg.replicas,
        target_group,
    }));

    if !cfg.extras.resources.is_empty() {
        debug!(app = %cfg.name, count = cfg.extras.resources.len(), "merging extra resources");
        group.extend(cfg.extras.resources.iter().cloned());
    }

    Ok(group)
}
