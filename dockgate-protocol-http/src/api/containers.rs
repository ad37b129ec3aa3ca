use dockgate_common::{Secret, Services, SshTargetOptions};
use dockgate_docker::{list_containers, ContainerEntry, DockerTarget};
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};
use tracing::*;

pub struct Api;

#[derive(Debug, Object)]
#[oai(rename_all = "camelCase")]
pub struct ContainerListRequest {
    host: String,
    /// Docker daemon port, or the SSH port when credentials are given.
    port: Option<u16>,
    username: Option<String>,
    password: Option<Secret<String>>,
}

#[derive(Object)]
pub struct ListingError {
    error: String,
}

#[derive(ApiResponse)]
enum ListContainersResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<ContainerEntry>>),
    #[oai(status = 502)]
    Failed(Json<ListingError>),
}

#[OpenApi]
impl Api {
    #[oai(
        path = "/docker/containers",
        method = "post",
        operation_id = "list_containers"
    )]
    async fn api_list_containers(
        &self,
        services: Data<&Services>,
        body: Json<ContainerListRequest>,
    ) -> poem::Result<ListContainersResponse> {
        let (docker_config, ssh_config) = {
            let config = services.config.lock().await;
            (config.docker.clone(), config.ssh.clone())
        };

        let request = body.0;
        let target = match (request.username, request.password) {
            (Some(username), Some(password)) => DockerTarget::Ssh(SshTargetOptions {
                host: request.host,
                port: request.port.unwrap_or(22),
                username,
                password,
            }),
            _ => DockerTarget::Daemon {
                host: request.host,
                port: request.port.unwrap_or(2375),
            },
        };

        match list_containers(&docker_config, &ssh_config, &target).await {
            Ok(containers) => Ok(ListContainersResponse::Ok(Json(containers))),
            Err(error) => {
                warn!(%error, "Container listing failed");
                Ok(ListContainersResponse::Failed(Json(ListingError {
                    error: error.to_string(),
                })))
            }
        }
    }
}
