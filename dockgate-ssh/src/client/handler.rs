use dockgate_common::SshHostKeyVerificationMode;
use russh::keys::PublicKey;
use tracing::*;

use super::error::SshClientError;

pub struct ClientHandler {
    pub host: String,
    pub port: u16,
    pub verification: SshHostKeyVerificationMode,
}

impl russh::client::Handler for ClientHandler {
    type Error = SshClientError;

    async fn check_server_key(&mut self, key: &PublicKey) -> Result<bool, Self::Error> {
        match self.verification {
            SshHostKeyVerificationMode::AutoAccept => Ok(true),
            SshHostKeyVerificationMode::AutoReject => {
                warn!(
                    host = %self.host,
                    port = %self.port,
                    fingerprint = %key.fingerprint(Default::default()),
                    "Rejecting server key"
                );
                Ok(false)
            }
        }
    }
}
