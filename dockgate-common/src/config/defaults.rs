use std::net::ToSocketAddrs;
use std::time::Duration;

use crate::ListenEndpoint;

pub(crate) const fn _default_ssh_port() -> u16 {
    22
}

#[inline]
pub(crate) fn _default_docker_bin() -> String {
    "docker".to_owned()
}

#[inline]
pub(crate) fn _default_http_listen() -> ListenEndpoint {
    #[allow(clippy::unwrap_used)]
    ListenEndpoint("0.0.0.0:5000".to_socket_addrs().unwrap().next().unwrap())
}

#[inline]
pub(crate) fn _default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

#[inline]
pub(crate) fn _default_idle_timeout() -> Duration {
    Duration::from_secs(60 * 60)
}

#[inline]
pub(crate) fn _default_list_timeout() -> Duration {
    Duration::from_secs(15)
}
