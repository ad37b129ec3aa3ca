use std::sync::Arc;

use dockgate_common::{Services, SessionState};
use futures::StreamExt;
use poem::web::websocket::WebSocket;
use poem::web::{Data, RemoteAddr};
use poem::{handler, IntoResponse};
use tokio::sync::Mutex;
use tracing::*;
use uuid::Uuid;

use crate::session::ShellSession;

#[handler]
pub async fn api_shell_ws(
    ws: WebSocket,
    services: Data<&Services>,
    remote_address: &RemoteAddr,
) -> impl IntoResponse {
    let services = services.0.clone();
    let remote_address = remote_address.0.as_socket_addr().cloned();

    ws.on_upgrade(move |socket| async move {
        let id = Uuid::new_v4();
        let session_state = Arc::new(Mutex::new(SessionState::new(remote_address)));
        services
            .state
            .lock()
            .await
            .register_session(id, &session_state);

        debug!(session=%id, ?remote_address, "Client connected");

        let (sink, stream) = socket.split();
        let session = ShellSession::new(id, services.clone(), session_state, sink);
        if let Err(error) = session.run(stream).await {
            warn!(session=%id, ?error, "Session ended with error");
        }

        services.state.lock().await.remove_session(id);

        Ok::<(), anyhow::Error>(())
    })
}
