use poem_openapi::OpenApi;

pub mod containers;
pub mod sessions;
pub mod shell;

pub fn get() -> impl OpenApi {
    (containers::Api, sessions::Api)
}
