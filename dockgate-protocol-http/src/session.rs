use std::sync::Arc;

use anyhow::Result;
use dockgate_common::{Services, SessionId, SessionState, SshTargetOptions, TargetSnapshot};
use dockgate_ssh::{RemoteShell, ShellEvent};
use futures::future::OptionFuture;
use futures::{Sink, SinkExt, Stream, StreamExt};
use poem::web::websocket::Message;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::*;

use crate::protocol::{ClientMessage, ServerMessage, StartRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStage {
    Connecting,
    Active,
    Closing,
    /// Absorbing for a given shell; also the idle state before the first
    /// `start` and between sessions on the same connection.
    Closed,
}

/// One relay session scoped to one client connection.
///
/// Owns the shell handle exclusively and the sending half of the client
/// connection; all events for the session are multiplexed through the single
/// select loop in [`ShellSession::run`].
pub struct ShellSession<TX> {
    id: SessionId,
    services: Services,
    state: Arc<Mutex<SessionState>>,
    stage: SessionStage,
    shell: Option<RemoteShell>,
    tx: TX,
}

impl<TX> ShellSession<TX>
where
    TX: Sink<Message> + Unpin,
    TX::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(
        id: SessionId,
        services: Services,
        state: Arc<Mutex<SessionState>>,
        tx: TX,
    ) -> Self {
        ShellSession {
            id,
            services,
            state,
            stage: SessionStage::Closed,
            shell: None,
            tx,
        }
    }

    pub async fn run<RX, E>(mut self, rx: RX) -> Result<()>
    where
        RX: Stream<Item = Result<Message, E>> + Unpin,
        E: std::error::Error + Send + Sync + 'static,
    {
        let result = self.relay(rx).await;
        // the shell must not outlive the connection, whatever ended the loop
        if let Some(shell) = self.shell.take() {
            shell.shutdown().await;
            self.stage = SessionStage::Closed;
        }
        result
    }

    async fn relay<RX, E>(&mut self, mut rx: RX) -> Result<()>
    where
        RX: Stream<Item = Result<Message, E>> + Unpin,
        E: std::error::Error + Send + Sync + 'static,
    {
        let idle_timeout = { self.services.config.lock().await.ssh.idle_timeout };
        let idle = tokio::time::sleep(idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                message = rx.next() => {
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_client_message(&text).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!(session=%self.id, "Client connection closed");
                            self.teardown("Session closed").await;
                            break;
                        }
                        Some(Ok(_)) => (),
                        Some(Err(error)) => {
                            warn!(session=%self.id, ?error, "Client connection error");
                            self.teardown("Session closed").await;
                            break;
                        }
                    }
                }
                Some(event) = OptionFuture::from(self.shell.as_mut().map(RemoteShell::wait)) => {
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                    match event {
                        Some(ShellEvent::Output(data)) => {
                            self.send(ServerMessage::Output {
                                data: String::from_utf8_lossy(&data).into_owned(),
                            })
                            .await?;
                        }
                        Some(ShellEvent::ExitStatus(status)) => {
                            debug!(session=%self.id, status, "Remote shell exited");
                        }
                        Some(ShellEvent::Eof) | Some(ShellEvent::Closed) | None => {
                            debug!(session=%self.id, "Remote stream ended");
                            self.teardown("Remote session ended").await;
                        }
                    }
                }
                () = &mut idle => {
                    info!(session=%self.id, "Session idle for {idle_timeout:?}, closing");
                    self.teardown("Session closed due to inactivity").await;
                    break;
                }
            }
        }
        Ok(())
    }

    async fn handle_client_message(&mut self, text: &str) -> Result<()> {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(error) => {
                debug!(session=%self.id, %error, "Malformed client message");
                self.send(ServerMessage::Error {
                    message: format!("unsupported message: {error}"),
                })
                .await?;
                return Ok(());
            }
        };

        match message {
            ClientMessage::Start(request) => self.start(request).await,
            ClientMessage::Command { command } => self.command(command).await,
            ClientMessage::End => {
                if self.shell.is_some() {
                    self.teardown("Session closed").await;
                }
                Ok(())
            }
        }
    }

    async fn start(&mut self, request: StartRequest) -> Result<()> {
        if self.stage != SessionStage::Closed {
            warn!(session=%self.id, stage=?self.stage, "Rejecting start: session in progress");
            self.send(ServerMessage::Error {
                message: "a session is already active".to_owned(),
            })
            .await?;
            return Ok(());
        }

        let options = SshTargetOptions::from(request);
        let ssh_config = { self.services.config.lock().await.ssh.clone() };

        self.stage = SessionStage::Connecting;
        info!(session=%self.id, host=%options.host, port=%options.port, "Establishing session");

        match RemoteShell::connect(&options, &ssh_config).await {
            Ok(shell) => {
                self.shell = Some(shell);
                self.stage = SessionStage::Active;
                {
                    let mut state = self.state.lock().await;
                    state.username = Some(options.username.clone());
                    state.target = Some(TargetSnapshot {
                        host: options.host.clone(),
                        port: options.port,
                    });
                }
                self.send(ServerMessage::Status {
                    message: format!("Connected to {}:{}", options.host, options.port),
                })
                .await?;
            }
            Err(error) => {
                error!(session=%self.id, %error, "Session establishment failed");
                self.stage = SessionStage::Closed;
                self.send(ServerMessage::Error {
                    message: error.to_string(),
                })
                .await?;
            }
        }
        Ok(())
    }

    async fn command(&mut self, command: String) -> Result<()> {
        let Some(shell) = self.shell.as_mut() else {
            self.send(ServerMessage::Error {
                message: "no active session".to_owned(),
            })
            .await?;
            return Ok(());
        };

        let mut line = command.into_bytes();
        line.push(b'\n');

        if let Err(error) = shell.data(&line).await {
            warn!(session=%self.id, %error, "Failed to write to remote shell");
            self.teardown("Remote session failed").await;
        }
        Ok(())
    }

    /// Tears the current session down, notifying the client best-effort.
    /// Idempotent: a second invocation after reaching Closed is a no-op.
    async fn teardown(&mut self, reason: &str) {
        if self.stage == SessionStage::Closed {
            return;
        }
        self.stage = SessionStage::Closing;

        if let Some(shell) = self.shell.take() {
            shell.shutdown().await;
        }
        {
            let mut state = self.state.lock().await;
            state.username = None;
            state.target = None;
        }

        self.stage = SessionStage::Closed;
        let _ = self
            .send(ServerMessage::Status {
                message: reason.to_owned(),
            })
            .await;
        info!(session=%self.id, %reason, "Session closed");
    }

    async fn send(&mut self, message: ServerMessage) -> Result<()> {
        let text = serde_json::to_string(&message)?;
        self.tx
            .send(Message::Text(text))
            .await
            .map_err(anyhow::Error::new)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockgate_common::DockgateConfig;
    use futures::channel::mpsc;
    use uuid::Uuid;

    type TestSession = ShellSession<mpsc::UnboundedSender<Message>>;

    fn test_session() -> (TestSession, mpsc::UnboundedReceiver<Message>) {
        let services = Services::new(DockgateConfig::default());
        let state = Arc::new(Mutex::new(SessionState::new(None)));
        let (tx, out) = mpsc::unbounded();
        (
            ShellSession::new(Uuid::new_v4(), services, state, tx),
            out,
        )
    }

    fn drain(out: &mut mpsc::UnboundedReceiver<Message>) -> Vec<ServerMessage> {
        let mut messages = vec![];
        while let Ok(Some(Message::Text(text))) = out.try_next() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }

    #[tokio::test]
    async fn test_malformed_message_rejected() {
        let (mut session, mut out) = test_session();

        session
            .handle_client_message(r#"{"type": "reboot"}"#)
            .await
            .unwrap();

        let messages = drain(&mut out);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ServerMessage::Error { .. }));
        assert_eq!(session.stage, SessionStage::Closed);
    }

    #[tokio::test]
    async fn test_malformed_start_creates_no_session() {
        let (mut session, mut out) = test_session();

        session
            .handle_client_message(r#"{"type": "start", "host": "vm"}"#)
            .await
            .unwrap();

        assert!(matches!(drain(&mut out)[..], [ServerMessage::Error { .. }]));
        assert!(session.shell.is_none());
        assert_eq!(session.stage, SessionStage::Closed);
    }

    #[tokio::test]
    async fn test_command_without_session_rejected() {
        let (mut session, mut out) = test_session();

        session
            .handle_client_message(r#"{"type": "command", "command": "ls"}"#)
            .await
            .unwrap();

        let messages = drain(&mut out);
        assert_eq!(
            messages,
            vec![ServerMessage::Error {
                message: "no active session".to_owned()
            }]
        );
    }

    #[tokio::test]
    async fn test_second_start_rejected_without_touching_session() {
        let (mut session, mut out) = test_session();
        session.stage = SessionStage::Active;

        session
            .handle_client_message(
                r#"{"type": "start", "host": "10.0.0.9",
                    "containerUser": "root", "containerPassword": "x"}"#,
            )
            .await
            .unwrap();

        let messages = drain(&mut out);
        assert_eq!(
            messages,
            vec![ServerMessage::Error {
                message: "a session is already active".to_owned()
            }]
        );
        assert_eq!(session.stage, SessionStage::Active);
    }

    #[tokio::test]
    async fn test_end_without_session_is_silent() {
        let (mut session, mut out) = test_session();

        session
            .handle_client_message(r#"{"type": "end"}"#)
            .await
            .unwrap();

        assert!(drain(&mut out).is_empty());
        assert_eq!(session.stage, SessionStage::Closed);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (mut session, mut out) = test_session();
        session.stage = SessionStage::Active;

        session.teardown("Session closed").await;
        session.teardown("Session closed").await;

        let messages = drain(&mut out);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ServerMessage::Status { .. }));
        assert_eq!(session.stage, SessionStage::Closed);
    }

    #[tokio::test]
    async fn test_start_against_unreachable_host() {
        let (mut session, mut out) = test_session();

        // nothing listens on tcpmux in the test environment
        session
            .handle_client_message(
                r#"{"type": "start", "host": "127.0.0.1", "port": 1,
                    "containerUser": "root", "containerPassword": "x"}"#,
            )
            .await
            .unwrap();

        let messages = drain(&mut out);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ServerMessage::Error { .. }));
        assert!(session.shell.is_none());
        assert_eq!(session.stage, SessionStage::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_connection_is_reaped() {
        let (session, mut out) = test_session();

        // keep a sender alive so the client stream stays pending
        let (_client_tx, client_rx) = mpsc::unbounded::<Result<Message, std::io::Error>>();
        session.run(client_rx).await.unwrap();

        // no session was ever started, so the reaper has nothing to report
        assert!(drain(&mut out).is_empty());
    }
}
