//! Container path resolution
//!
//! Derives the in-container filesystem layout of an app's workspace from its
//! [`WorkspaceSpec`]: the workspace root under the mount parent, plus any
//! configured subdirectories. Pure and deterministic; performs no I/O.

use crate::config::WorkspaceSpec;
use crate::{Error, Result};

/// Resolved in-container paths for a workspace
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerPaths {
    /// Workspace root inside the container
    pub workspace_root: String,
    /// Scripts directory, when configured
    pub scripts: Option<String>,
    /// Storage directory, when configured
    pub storage: Option<String>,
    /// Metadata directory, when configured
    pub meta: Option<String>,
    /// Products directory, when configured
    pub products: Option<String>,
    /// Notebooks directory, when configured
    pub notebooks: Option<String>,
    /// Workflows directory, when configured
    pub workflows: Option<String>,
    /// Workspace-config directory, when configured
    pub config: Option<String>,
    /// Requirements file, when configured
    pub requirements_file: Option<String>,
}

impl ContainerPaths {
    /// Resolve container paths from a workspace spec
    ///
    /// The workspace root is `mount_parent/<workspace name>` where the
    /// workspace name is the base name of the host root directory; when
    /// `suffix_workspace_name` is disabled the mount parent is used as the
    /// root directly. Unset subdirectories stay unset, they are not
    /// defaulted.
    pub fn resolve(spec: &WorkspaceSpec) -> Result<Self> {
        if spec.root.trim().is_empty() {
            return Err(Error::InvalidWorkspaceRoot(
                "workspace root path is empty".to_string(),
            ));
        }

        let workspace_root = if spec.suffix_workspace_name {
            let name = std::path::Path::new(&spec.root)
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    Error::InvalidWorkspaceRoot(format!(
                        "cannot derive a workspace name from '{}'",
                        spec.root
                    ))
                })?;
            join(&spec.mount_parent, name)
        } else {
            spec.mount_parent.clone()
        };

        let under_root = |sub: &Option<String>| sub.as_deref().map(|s| join(&workspace_root, s));

        Ok(Self {
            scripts: under_root(&spec.scripts_dir),
            storage: under_root(&spec.storage_dir),
            meta: under_root(&spec.meta_dir),
            products: under_root(&spec.products_dir),
            notebooks: under_root(&spec.notebooks_dir),
            workflows: under_root(&spec.workflows_dir),
            config: under_root(&spec.config_dir),
            requirements_file: under_root(&spec.requirements_file),
            workspace_root,
        })
    }
}

/// Join container paths without doubling separators
fn join(parent: &str, child: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), child.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(root: &str) -> WorkspaceSpec {
        WorkspaceSpec::new(root)
    }

    #[test]
    fn root_is_mount_parent_plus_workspace_name() {
        let paths = ContainerPaths::resolve(&spec("/home/me/projects/analytics")).unwrap();
        assert_eq!(paths.workspace_root, "/workspace/analytics");
    }

    #[test]
    fn suffixing_can_be_disabled() {
        let mut s = spec("/home/me/projects/analytics");
        s.suffix_workspace_name = false;
        s.mount_parent = "/srv/app".to_string();
        let paths = ContainerPaths::resolve(&s).unwrap();
        assert_eq!(paths.workspace_root, "/srv/app");
    }

    #[test]
    fn empty_root_is_rejected() {
        let err = ContainerPaths::resolve(&spec("  ")).unwrap_err();
        assert!(matches!(err, Error::InvalidWorkspaceRoot(_)));
    }

    #[test]
    fn configured_subdirs_join_under_root_and_unset_stay_unset() {
        let mut s = spec("/projects/analytics");
        s.scripts_dir = Some("scripts".to_string());
        s.notebooks_dir = Some("notebooks".to_string());
        s.requirements_file = Some("requirements.txt".to_string());
        let paths = ContainerPaths::resolve(&s).unwrap();
        assert_eq!(paths.scripts.as_deref(), Some("/workspace/analytics/scripts"));
        assert_eq!(paths.notebooks.as_deref(), Some("/workspace/analytics/notebooks"));
        assert_eq!(
            paths.requirements_file.as_deref(),
            Some("/workspace/analytics/requirements.txt")
        );
        assert!(paths.storage.is_none());
        assert!(paths.meta.is_none());
        assert!(paths.products.is_none());
        assert!(paths.workflows.is_none());
        assert!(paths.config.is_none());
    }

    #[test]
    fn resolution_is_deterministic() {
        let s = {
            let mut s = spec("/projects/analytics");
            s.storage_dir = Some("storage".to_string());
            s
        };
        assert_eq!(ContainerPaths::resolve(&s).unwrap(), ContainerPaths::resolve(&s).unwrap());
    }
}
