use serde::{Deserialize, Serialize};

use super::defaults::_default_ssh_port;
use crate::Secret;

/// Connection parameters for one remote shell target, as supplied by the
/// caller. Never persisted.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SshTargetOptions {
    pub host: String,

    #[serde(default = "_default_ssh_port")]
    pub port: u16,

    pub username: String,

    pub password: Secret<String>,
}
