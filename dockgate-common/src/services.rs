use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{DockgateConfig, State};

#[derive(Clone)]
pub struct Services {
    pub config: Arc<Mutex<DockgateConfig>>,
    pub state: Arc<Mutex<State>>,
}

impl Services {
    pub fn new(config: DockgateConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            state: Arc::new(Mutex::new(State::new())),
        }
    }
}
