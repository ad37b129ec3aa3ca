use dockgate_common::Services;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use uuid::Uuid;

pub struct Api;

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct SessionSnapshot {
    id: Uuid,
    remote_address: Option<String>,
    username: Option<String>,
    target: Option<SessionTarget>,
}

#[derive(Object)]
pub struct SessionTarget {
    host: String,
    port: u16,
}

#[OpenApi]
impl Api {
    #[oai(path = "/sessions", method = "get", operation_id = "get_sessions")]
    async fn api_get_all_sessions(
        &self,
        services: Data<&Services>,
    ) -> poem::Result<Json<Vec<SessionSnapshot>>> {
        let state = services.state.lock().await;

        let mut sessions = Vec::with_capacity(state.sessions.len());
        for (id, session) in &state.sessions {
            let session = session.lock().await;
            sessions.push(SessionSnapshot {
                id: *id,
                remote_address: session.remote_address.map(|a| a.to_string()),
                username: session.username.clone(),
                target: session.target.as_ref().map(|t| SessionTarget {
                    host: t.host.clone(),
                    port: t.port,
                }),
            });
        }

        Ok(Json(sessions))
    }
}
