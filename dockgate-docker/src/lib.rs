use std::process::Stdio;

use dockgate_common::{DockerConfig, SshClientConfig, SshTargetOptions};
use dockgate_ssh::{exec_capture, SshClientError};
use poem_openapi::Object;
use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::*;

/// Field order matters: [`parse_ps_line`] consumes fields positionally.
/// `|` as the separator because the ports column contains `:` itself.
pub const PS_FORMAT: &str = "{{.ID}}|{{.Image}}|{{.Names}}|{{.Status}}|{{.Ports}}";

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Object)]
#[oai(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct ContainerEntry {
    pub id: String,
    pub image: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<u16>,
}

/// Where to run the listing command.
#[derive(Debug)]
pub enum DockerTarget {
    /// Local `docker` CLI against a remote daemon at `tcp://host:port`.
    Daemon { host: String, port: u16 },
    /// `docker ps` executed on the remote host itself, over SSH.
    Ssh(SshTargetOptions),
}

#[derive(thiserror::Error, Debug)]
pub enum DockerError {
    #[error("failed to run {bin}: {error}")]
    Spawn {
        bin: String,
        #[source]
        error: std::io::Error,
    },
    #[error("docker exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },
    #[error("timed out listing containers")]
    Timeout,
    #[error("unparseable `docker ps` line: {0:?}")]
    Parse(String),
    #[error("docker output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Ssh(#[from] SshClientError),
}

pub async fn list_containers(
    docker_config: &DockerConfig,
    ssh_config: &SshClientConfig,
    target: &DockerTarget,
) -> Result<Vec<ContainerEntry>, DockerError> {
    let stdout = match target {
        DockerTarget::Daemon { host, port } => {
            list_via_daemon(docker_config, host, *port).await?
        }
        DockerTarget::Ssh(options) => list_via_ssh(ssh_config, options).await?,
    };
    parse_ps_output(&stdout)
}

async fn list_via_daemon(
    config: &DockerConfig,
    host: &str,
    port: u16,
) -> Result<String, DockerError> {
    debug!(%host, %port, "Listing containers via daemon socket");

    let output = timeout(
        config.list_timeout,
        Command::new(&config.docker_bin)
            .arg("-H")
            .arg(format!("tcp://{host}:{port}"))
            .args(["ps", "--format", PS_FORMAT])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| DockerError::Timeout)?
    .map_err(|error| DockerError::Spawn {
        bin: config.docker_bin.clone(),
        error,
    })?;

    if !output.status.success() {
        return Err(DockerError::CommandFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8(output.stdout)?)
}

async fn list_via_ssh(
    ssh_config: &SshClientConfig,
    options: &SshTargetOptions,
) -> Result<String, DockerError> {
    debug!(host = %options.host, port = %options.port, "Listing containers over SSH");

    let command = format!("docker ps --format '{PS_FORMAT}'");
    let output = exec_capture(options, ssh_config, &command).await?;
    Ok(String::from_utf8(output.stdout)?)
}

pub fn parse_ps_output(output: &str) -> Result<Vec<ContainerEntry>, DockerError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_ps_line)
        .collect()
}

fn parse_ps_line(line: &str) -> Result<ContainerEntry, DockerError> {
    let fields = line.splitn(5, '|').map(str::trim).collect::<Vec<_>>();
    let [id, image, name, status, ..] = fields[..] else {
        return Err(DockerError::Parse(line.to_owned()));
    };
    if id.is_empty() {
        return Err(DockerError::Parse(line.to_owned()));
    }

    Ok(ContainerEntry {
        id: id.to_owned(),
        image: image.to_owned(),
        name: name.to_owned(),
        status: status.to_owned(),
        ssh_port: fields.get(4).copied().and_then(ssh_port_from_mappings),
    })
}

/// Picks the published host port that maps to the container's SSH port,
/// e.g. `0.0.0.0:32768->22/tcp, :::32768->22/tcp` yields 32768.
fn ssh_port_from_mappings(ports: &str) -> Option<u16> {
    for mapping in ports.split(',') {
        let Some((public, private)) = mapping.trim().split_once("->") else {
            continue;
        };
        if private.trim() != "22/tcp" {
            continue;
        }
        if let Some(port) = public.rsplit(':').next().and_then(|p| p.parse().ok()) {
            return Some(port);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_line() {
        let entries =
            parse_ps_output("abc123|nginx:latest|web|Up 2 hours|80/tcp\n").unwrap();
        assert_eq!(
            entries,
            vec![ContainerEntry {
                id: "abc123".into(),
                image: "nginx:latest".into(),
                name: "web".into(),
                status: "Up 2 hours".into(),
                ssh_port: None,
            }]
        );
    }

    #[test]
    fn test_parse_extracts_ssh_port() {
        let entries = parse_ps_output(
            "abc123|sshbox|dev|Up 5 minutes|0.0.0.0:32768->22/tcp, :::32768->22/tcp\n",
        )
        .unwrap();
        assert_eq!(entries[0].ssh_port, Some(32768));
    }

    #[test]
    fn test_parse_ignores_non_ssh_mappings() {
        let entries =
            parse_ps_output("abc123|nginx|web|Up|0.0.0.0:8080->80/tcp\n").unwrap();
        assert_eq!(entries[0].ssh_port, None);
    }

    #[test]
    fn test_parse_preserves_order_and_skips_blank_lines() {
        let entries = parse_ps_output("a|i1|n1|Up\n\nb|i2|n2|Exited (0)\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[1].id, "b");
    }

    #[test]
    fn test_parse_rejects_short_line() {
        assert!(matches!(
            parse_ps_output("abc123|nginx\n"),
            Err(DockerError::Parse(_))
        ));
    }

    #[test]
    fn test_image_names_with_registry_ports_survive() {
        // the original `:`-separated format broke on these
        let entries =
            parse_ps_output("abc|registry.local:5000/app:v1|app|Up\n").unwrap();
        assert_eq!(entries[0].image, "registry.local:5000/app:v1");
    }

    #[test]
    fn test_ipv6_only_mapping() {
        assert_eq!(ssh_port_from_mappings(":::32770->22/tcp"), Some(32770));
    }
}
