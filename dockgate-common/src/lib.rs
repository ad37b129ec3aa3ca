mod config;
mod services;
mod state;
mod types;

pub use config::*;
pub use services::Services;
pub use state::{SessionState, State, TargetSnapshot};
pub use types::*;
