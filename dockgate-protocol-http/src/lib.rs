mod api;
mod protocol;
mod session;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use dockgate_common::Services;
use poem::listener::TcpListener;
use poem::{get, EndpointExt, Route, Server};
use poem_openapi::OpenApiService;
use tracing::*;

pub use crate::protocol::{ClientMessage, ServerMessage, StartRequest};
pub use crate::session::{SessionStage, ShellSession};

#[derive(Clone)]
pub struct HTTPProtocolServer {
    services: Services,
}

impl HTTPProtocolServer {
    pub async fn new(services: &Services) -> Result<Self> {
        Ok(HTTPProtocolServer {
            services: services.clone(),
        })
    }

    pub async fn run(self, address: SocketAddr) -> Result<()> {
        let api_service = OpenApiService::new(
            api::get(),
            "Dockgate",
            env!("CARGO_PKG_VERSION"),
        )
        .server("/api");

        let app = Route::new()
            .at("/api/shell", get(api::shell::api_shell_ws))
            .nest("/api", api_service)
            .data(self.services.clone());

        info!(?address, "Listening");
        Server::new(TcpListener::bind(address))
            .run(app)
            .await
            .context("Failed to run the HTTP server")
    }
}
