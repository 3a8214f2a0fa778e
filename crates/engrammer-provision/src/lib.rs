//! Docker-backed Neo4j provisioning: one isolated database container per
//! tenant, on a private bridge network, with dynamic host ports.
//!
//! `ensure` is idempotent: an existing running container is reused as-is, an
//! existing stopped container is started in place, and only a missing
//! container is created. The provider-level "already exists" condition on
//! create is treated as success (benign race between concurrent callers).

use async_trait::async_trait;
use bollard::container::{Config, CreateContainerOptions, InspectContainerOptions, StartContainerOptions};
use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions};
use bollard::Docker;
use engrammer_core::{Error, ProvisionedEndpoint, Provisioner, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BOLT_PORT: &str = "7687/tcp";
const HTTP_PORT: &str = "7474/tcp";
const GRAPH_USER: &str = "neo4j";

/// Secret assigned when a container is created and the caller supplied none.
const DEFAULT_SECRET: &str = "123456789";

/// Placeholder returned when an existing container is reused and its
/// original secret is unknown to this call.
const UNKNOWN_SECRET: &str = "unknown";

/// Deterministic, collision-free container name for a tenant: lowercased,
/// non-alphanumeric mapped to hyphen.
pub fn container_name(tenant_id: &str) -> String {
    let slug: String = tenant_id
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("engrammer-neo4j-{}", slug)
}

/// Host directory triple mounted into a tenant's container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDirs {
    pub data: PathBuf,
    pub logs: PathBuf,
    pub plugins: PathBuf,
}

/// Paths for a tenant's volumes under the data root (not yet created).
pub fn tenant_dirs(data_dir: &Path, tenant_id: &str) -> TenantDirs {
    let base = data_dir.join("neo4j").join(tenant_id);
    TenantDirs {
        data: base.join("data"),
        logs: base.join("logs"),
        plugins: base.join("plugins"),
    }
}

fn bolt_uri(host_port: &str) -> String {
    format!("bolt://localhost:{}", host_port)
}

/// Provisioner over the local Docker daemon.
pub struct DockerNeo4jProvisioner {
    data_dir: PathBuf,
    network: String,
    image: String,
    with_apoc: bool,
}

impl DockerNeo4jProvisioner {
    pub fn new(data_dir: PathBuf, network: String, image: String, with_apoc: bool) -> Self {
        Self {
            data_dir,
            network,
            image,
            with_apoc,
        }
    }

    /// Wiring helper using the core configuration. `None` when
    /// auto-provisioning is disabled; tenants must then register with
    /// explicit credentials.
    pub fn from_config(cfg: &engrammer_core::CoreConfig) -> Option<Self> {
        if !cfg.auto_provision {
            return None;
        }
        Some(Self::new(
            cfg.data_dir.clone(),
            cfg.docker_network.clone(),
            cfg.neo4j_image.clone(),
            cfg.neo4j_with_apoc,
        ))
    }

    async fn client(&self) -> Result<Docker> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::Config(format!("cannot reach the Docker daemon: {e}")))?;
        docker
            .ping()
            .await
            .map_err(|e| Error::Config(format!("cannot reach the Docker daemon: {e}")))?;
        Ok(docker)
    }

    async fn ensure_network(&self, docker: &Docker) -> Result<()> {
        match docker
            .inspect_network(&self.network, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(_) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                let opts = CreateNetworkOptions {
                    name: self.network.as_str(),
                    driver: "bridge",
                    ..Default::default()
                };
                match docker.create_network(opts).await {
                    Ok(_) => Ok(()),
                    // Concurrent caller won the create race.
                    Err(bollard::errors::Error::DockerResponseServerError {
                        status_code: 409, ..
                    }) => Ok(()),
                    Err(e) => Err(Error::Connectivity(format!("network create failed: {e}"))),
                }
            }
            Err(e) => Err(Error::Connectivity(format!("network inspect failed: {e}"))),
        }
    }

    fn make_dirs(&self, tenant_id: &str) -> Result<TenantDirs> {
        let dirs = tenant_dirs(&self.data_dir, tenant_id);
        for d in [&dirs.data, &dirs.logs, &dirs.plugins] {
            std::fs::create_dir_all(d)
                .map_err(|e| Error::Config(format!("cannot create volume dir {}: {e}", d.display())))?;
        }
        Ok(dirs)
    }

    fn env_vars(&self, secret: &str) -> Vec<String> {
        let mut env = vec![format!("NEO4J_AUTH={}/{}", GRAPH_USER, secret)];
        if self.with_apoc {
            env.push("NEO4J_PLUGINS=[\"apoc\"]".to_string());
            env.push("NEO4J_dbms_security_procedures_unrestricted=apoc.*".to_string());
        }
        env
    }

    async fn create_container(
        &self,
        docker: &Docker,
        name: &str,
        dirs: &TenantDirs,
        secret: &str,
    ) -> Result<()> {
        let dynamic_binding = Some(vec![PortBinding {
            host_ip: Some("0.0.0.0".to_string()),
            host_port: Some(String::new()),
        }]);
        let mut port_bindings = HashMap::new();
        port_bindings.insert(BOLT_PORT.to_string(), dynamic_binding.clone());
        port_bindings.insert(HTTP_PORT.to_string(), dynamic_binding);

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(BOLT_PORT.to_string(), HashMap::new());
        exposed_ports.insert(HTTP_PORT.to_string(), HashMap::new());

        let host_config = HostConfig {
            binds: Some(vec![
                format!("{}:/data", dirs.data.display()),
                format!("{}:/logs", dirs.logs.display()),
                format!("{}:/plugins", dirs.plugins.display()),
            ]),
            network_mode: Some(self.network.clone()),
            port_bindings: Some(port_bindings),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        let config = Config {
            image: Some(self.image.clone()),
            env: Some(self.env_vars(secret)),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: name.to_string(),
            ..Default::default()
        };

        match docker.create_container(Some(opts), config).await {
            Ok(_) => {}
            // Same-name collision: another caller created it for this
            // tenant; the name is deterministic, so reuse.
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 409, .. }) => {
                return Ok(());
            }
            Err(e) => return Err(Error::Connectivity(format!("container create failed: {e}"))),
        }

        docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Connectivity(format!("container start failed: {e}")))?;
        Ok(())
    }

    /// Host port mapped to the given container port, read back from the
    /// daemon after start.
    async fn host_port(&self, docker: &Docker, name: &str, container_port: &str) -> Result<String> {
        let inspect = docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(|e| Error::Connectivity(format!("container inspect failed: {e}")))?;
        inspect
            .network_settings
            .and_then(|ns| ns.ports)
            .and_then(|ports| ports.get(container_port).cloned().flatten())
            .and_then(|bindings| bindings.into_iter().find_map(|b| b.host_port))
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::Connectivity(format!(
                    "no host port mapped for {container_port} on {name}"
                ))
            })
    }
}

#[async_trait]
impl Provisioner for DockerNeo4jProvisioner {
    async fn ensure(
        &self,
        tenant_id: &str,
        existing_secret: Option<&str>,
    ) -> Result<ProvisionedEndpoint> {
        let docker = self.client().await?;
        self.ensure_network(&docker).await?;

        let dirs = self.make_dirs(tenant_id)?;
        let name = container_name(tenant_id);

        let existing = match docker
            .inspect_container(&name, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => Some(inspect),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => None,
            Err(e) => return Err(Error::Connectivity(format!("container inspect failed: {e}"))),
        };

        let secret = match existing {
            Some(inspect) => {
                let running = inspect
                    .state
                    .as_ref()
                    .and_then(|s| s.running)
                    .unwrap_or(false);
                if !running {
                    docker
                        .start_container(&name, None::<StartContainerOptions<String>>)
                        .await
                        .map_err(|e| {
                            Error::Connectivity(format!("container start failed: {e}"))
                        })?;
                    tracing::info!(target: "engrammer::provision", container = %name, "started stopped container");
                }
                // The caller-supplied secret is authoritative; without one
                // the original secret cannot be recovered from the daemon.
                existing_secret.unwrap_or(UNKNOWN_SECRET).to_string()
            }
            None => {
                let secret = existing_secret.unwrap_or(DEFAULT_SECRET).to_string();
                self.create_container(&docker, &name, &dirs, &secret).await?;
                tracing::info!(target: "engrammer::provision", container = %name, "created tenant container");
                secret
            }
        };

        let bolt = self.host_port(&docker, &name, BOLT_PORT).await?;
        // Read back for symmetry with bolt; the http endpoint is not part
        // of the returned credential but must be mapped for the container
        // to be usable from a browser.
        let _http = self.host_port(&docker, &name, HTTP_PORT).await?;

        Ok(ProvisionedEndpoint {
            uri: bolt_uri(&bolt),
            user: GRAPH_USER.to_string(),
            secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_is_deterministic_and_sanitized() {
        assert_eq!(container_name("t1"), "engrammer-neo4j-t1");
        assert_eq!(container_name("t1"), container_name("t1"));
        assert_eq!(container_name("My_Tenant"), "engrammer-neo4j-my-tenant");
        assert_eq!(container_name("a.b c"), "engrammer-neo4j-a-b-c");
    }

    #[test]
    fn tenant_dirs_layout() {
        let dirs = tenant_dirs(Path::new("/srv/data"), "t1");
        assert_eq!(dirs.data, PathBuf::from("/srv/data/neo4j/t1/data"));
        assert_eq!(dirs.logs, PathBuf::from("/srv/data/neo4j/t1/logs"));
        assert_eq!(dirs.plugins, PathBuf::from("/srv/data/neo4j/t1/plugins"));
    }

    #[test]
    fn bolt_uri_shape() {
        assert_eq!(bolt_uri("32771"), "bolt://localhost:32771");
    }

    #[test]
    fn from_config_honors_the_auto_provision_toggle() {
        let mut cfg = engrammer_core::CoreConfig::default();
        let provisioner = DockerNeo4jProvisioner::from_config(&cfg).unwrap();
        assert_eq!(provisioner.network, cfg.docker_network);
        assert_eq!(provisioner.image, cfg.neo4j_image);

        cfg.auto_provision = false;
        assert!(DockerNeo4jProvisioner::from_config(&cfg).is_none());
    }
}
