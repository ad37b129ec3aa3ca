use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::SessionId;

/// In-memory registry of open relay sessions.
pub struct State {
    pub sessions: HashMap<SessionId, Arc<Mutex<SessionState>>>,
}

impl State {
    pub fn new() -> Self {
        State {
            sessions: HashMap::new(),
        }
    }

    pub fn register_session(&mut self, id: SessionId, session: &Arc<Mutex<SessionState>>) {
        self.sessions.insert(id, session.clone());
    }

    pub fn remove_session(&mut self, id: SessionId) {
        self.sessions.remove(&id);
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct TargetSnapshot {
    pub host: String,
    pub port: u16,
}

pub struct SessionState {
    pub remote_address: Option<SocketAddr>,
    pub username: Option<String>,
    pub target: Option<TargetSnapshot>,
}

impl SessionState {
    pub fn new(remote_address: Option<SocketAddr>) -> Self {
        SessionState {
            remote_address,
            username: None,
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_register_and_remove() {
        let mut state = State::new();
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(SessionState::new(None)));

        state.register_session(id, &session);
        assert!(state.sessions.contains_key(&id));

        state.remove_session(id);
        assert!(state.sessions.is_empty());
    }
}
