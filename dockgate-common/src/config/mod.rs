mod defaults;
mod target;

use std::time::Duration;

use defaults::*;
use serde::{Deserialize, Serialize};
pub use target::*;
use tracing::warn;

use crate::ListenEndpoint;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "_default_http_listen")]
    pub listen: ListenEndpoint,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen: _default_http_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq, Copy)]
pub enum SshHostKeyVerificationMode {
    #[serde(rename = "auto_accept")]
    #[default]
    AutoAccept,
    #[serde(rename = "auto_reject")]
    AutoReject,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SshClientConfig {
    #[serde(default = "_default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "_default_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,

    #[serde(default, with = "humantime_serde")]
    pub keepalive_interval: Option<Duration>,

    #[serde(default)]
    pub host_key_verification: SshHostKeyVerificationMode,
}

impl Default for SshClientConfig {
    fn default() -> Self {
        SshClientConfig {
            connect_timeout: _default_connect_timeout(),
            idle_timeout: _default_idle_timeout(),
            keepalive_interval: None,
            host_key_verification: Default::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DockerConfig {
    #[serde(default = "_default_docker_bin")]
    pub docker_bin: String,

    #[serde(default = "_default_list_timeout", with = "humantime_serde")]
    pub list_timeout: Duration,
}

impl Default for DockerConfig {
    fn default() -> Self {
        DockerConfig {
            docker_bin: _default_docker_bin(),
            list_timeout: _default_list_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DockgateConfig {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub ssh: SshClientConfig,

    #[serde(default)]
    pub docker: DockerConfig,
}

impl DockgateConfig {
    pub fn validate(&self) {
        if self.ssh.connect_timeout.is_zero() {
            warn!("`ssh.connect_timeout` is zero - session establishment will always fail");
        }
        if self.ssh.idle_timeout.is_zero() {
            warn!("`ssh.idle_timeout` is zero - sessions will be closed immediately");
        }
        if self.docker.docker_bin.is_empty() {
            warn!("`docker.docker_bin` is empty - container listing will always fail");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: DockgateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.http.listen.port(), 5000);
        assert_eq!(config.ssh.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.ssh.keepalive_interval, None);
        assert_eq!(
            config.ssh.host_key_verification,
            SshHostKeyVerificationMode::AutoAccept
        );
        assert_eq!(config.docker.docker_bin, "docker");
    }

    #[test]
    fn test_humantime_durations() {
        let config: DockgateConfig = serde_json::from_str(
            r#"{"ssh": {"connect_timeout": "5s", "keepalive_interval": "1m"}}"#,
        )
        .unwrap();
        assert_eq!(config.ssh.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.ssh.keepalive_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_target_port_defaults_to_22() {
        let target: SshTargetOptions =
            serde_json::from_str(r#"{"host": "10.0.0.5", "username": "root", "password": "x"}"#)
                .unwrap();
        assert_eq!(target.port, 22);
    }
}
