use anyhow::Result;
use dockgate_docker::{list_containers, DockerTarget};
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli, host: &str, port: u16) -> Result<()> {
    let config = load_config(&cli.config)?;

    let target = DockerTarget::Daemon {
        host: host.to_owned(),
        port,
    };

    match list_containers(&config.docker, &config.ssh, &target).await {
        Ok(containers) => {
            info!("Connection successful, {} container(s) running", containers.len());
            for container in containers {
                info!(
                    "  {} {} {} ({})",
                    container.id, container.name, container.image, container.status
                );
            }
            Ok(())
        }
        Err(error) => {
            error!(%error, "Could not list containers");
            anyhow::bail!("Connection test failed")
        }
    }
}
