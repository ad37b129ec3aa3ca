mod error;
mod handler;

use std::sync::Arc;

use bytes::Bytes;
use dockgate_common::{SshClientConfig, SshTargetOptions};
pub use error::SshClientError;
use handler::ClientHandler;
use russh::client::{AuthResult, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tokio::time::timeout;
use tracing::*;

/// One event out of a live shell channel.
#[derive(Debug)]
pub enum ShellEvent {
    Output(Bytes),
    Eof,
    Closed,
    ExitStatus(u32),
}

/// An established interactive shell on a remote host.
///
/// Owns both the SSH connection and the shell channel; dropping it tears the
/// connection down, [`RemoteShell::shutdown`] does so gracefully.
pub struct RemoteShell {
    session: Handle<ClientHandler>,
    channel: Channel<Msg>,
}

impl RemoteShell {
    pub async fn connect(
        options: &SshTargetOptions,
        config: &SshClientConfig,
    ) -> Result<Self, SshClientError> {
        let session = connect_and_authenticate(options, config).await?;

        let channel = session.channel_open_session().await?;
        channel
            .request_pty(true, "xterm-256color", 80, 24, 0, 0, &[])
            .await?;
        channel.request_shell(true).await?;

        info!(host = %options.host, port = %options.port, "Shell open");
        Ok(RemoteShell { session, channel })
    }

    /// Writes raw bytes into the shell's input.
    pub async fn data(&mut self, bytes: &[u8]) -> Result<(), SshClientError> {
        self.channel.data(bytes).await?;
        Ok(())
    }

    /// Waits for the next shell event; `None` once the channel is gone.
    pub async fn wait(&mut self) -> Option<ShellEvent> {
        loop {
            return Some(match self.channel.wait().await? {
                ChannelMsg::Data { data } => ShellEvent::Output(Bytes::copy_from_slice(&data)),
                ChannelMsg::ExtendedData { data, .. } => {
                    ShellEvent::Output(Bytes::copy_from_slice(&data))
                }
                ChannelMsg::Eof => ShellEvent::Eof,
                ChannelMsg::Close => ShellEvent::Closed,
                ChannelMsg::ExitStatus { exit_status } => ShellEvent::ExitStatus(exit_status),
                _ => continue,
            });
        }
    }

    /// Graceful double teardown: signal end-of-input to the remote shell,
    /// then close the connection underneath it. A shell may ignore the EOF
    /// alone, so both steps always run.
    pub async fn shutdown(self) {
        let _ = self.channel.eof().await;
        let _ = self
            .session
            .disconnect(Disconnect::ByApplication, "", "")
            .await;
        debug!("Shell closed");
    }
}

/// Output of a one-shot remote command.
#[derive(Debug, Default)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_status: Option<u32>,
}

/// Runs a single command on the remote host and captures its output.
pub async fn exec_capture(
    options: &SshTargetOptions,
    config: &SshClientConfig,
    command: &str,
) -> Result<ExecOutput, SshClientError> {
    let session = connect_and_authenticate(options, config).await?;

    let mut channel = session.channel_open_session().await?;
    channel.exec(true, command).await?;

    let mut output = ExecOutput::default();
    loop {
        match channel.wait().await {
            Some(ChannelMsg::Data { data }) => output.stdout.extend_from_slice(&data),
            Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                output.stderr.extend_from_slice(&data)
            }
            Some(ChannelMsg::ExitStatus { exit_status }) => {
                output.exit_status = Some(exit_status)
            }
            Some(ChannelMsg::Close) | None => break,
            Some(_) => (),
        }
    }

    let _ = session
        .disconnect(Disconnect::ByApplication, "", "")
        .await;

    if let Some(status) = output.exit_status.filter(|&s| s != 0) {
        return Err(SshClientError::CommandFailed {
            status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output)
}

async fn connect_and_authenticate(
    options: &SshTargetOptions,
    config: &SshClientConfig,
) -> Result<Handle<ClientHandler>, SshClientError> {
    let russh_config = Arc::new(russh::client::Config {
        inactivity_timeout: None,
        keepalive_interval: config.keepalive_interval,
        ..Default::default()
    });

    let handler = ClientHandler {
        host: options.host.clone(),
        port: options.port,
        verification: config.host_key_verification,
    };

    info!(host = %options.host, port = %options.port, username = %options.username, "Connecting");

    let mut session = timeout(
        config.connect_timeout,
        russh::client::connect(
            russh_config,
            (options.host.as_str(), options.port),
            handler,
        ),
    )
    .await
    .map_err(|_| SshClientError::ConnectionTimeout)??;

    let auth_result = timeout(
        config.connect_timeout,
        session.authenticate_password(
            options.username.as_str(),
            options.password.expose_secret().as_str(),
        ),
    )
    .await
    .map_err(|_| SshClientError::ConnectionTimeout)??;

    match auth_result {
        AuthResult::Success => Ok(session),
        AuthResult::Failure { .. } => {
            error!(host = %options.host, username = %options.username, "Auth rejected");
            let _ = session
                .disconnect(Disconnect::ByApplication, "", "")
                .await;
            Err(SshClientError::AuthenticationFailed(
                options.username.clone(),
            ))
        }
    }
}
