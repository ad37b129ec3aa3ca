use dockgate_common::{Secret, SshTargetOptions};
use serde::{Deserialize, Serialize};

fn _default_ssh_port() -> u16 {
    22
}

/// Messages arriving from the client, tagged by their `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Start(StartRequest),
    Command { command: String },
    End,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub host: String,

    #[serde(default = "_default_ssh_port")]
    pub port: u16,

    #[serde(rename = "containerUser")]
    pub username: String,

    #[serde(rename = "containerPassword")]
    pub password: Secret<String>,
}

impl From<StartRequest> for SshTargetOptions {
    fn from(request: StartRequest) -> Self {
        SshTargetOptions {
            host: request.host,
            port: request.port,
            username: request.username,
            password: request.password,
        }
    }
}

/// Messages sent back to the client, tagged by their `type` field.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Status { message: String },
    Output { data: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"type": "start", "host": "10.0.0.5", "port": 2222,
                "containerUser": "root", "containerPassword": "x"}"#,
        )
        .unwrap();
        let ClientMessage::Start(request) = message else {
            panic!("expected a start message");
        };
        assert_eq!(request.host, "10.0.0.5");
        assert_eq!(request.port, 2222);
        assert_eq!(request.username, "root");
        assert_eq!(request.password.expose_secret(), "x");
    }

    #[test]
    fn test_start_port_defaults_to_22() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"type": "start", "host": "vm", "containerUser": "u", "containerPassword": "p"}"#,
        )
        .unwrap();
        let ClientMessage::Start(request) = message else {
            panic!("expected a start message");
        };
        assert_eq!(request.port, 22);
    }

    #[test]
    fn test_parse_command_and_end() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type": "command", "command": "ls"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Command { command } if command == "ls"));

        let message: ClientMessage = serde_json::from_str(r#"{"type": "end"}"#).unwrap();
        assert!(matches!(message, ClientMessage::End));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "reboot"}"#).is_err());
    }

    #[test]
    fn test_start_missing_credentials_rejected() {
        assert!(
            serde_json::from_str::<ClientMessage>(r#"{"type": "start", "host": "vm"}"#).is_err()
        );
    }

    #[test]
    fn test_command_missing_field_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "command"}"#).is_err());
    }

    #[test]
    fn test_server_message_wire_shape() {
        assert_eq!(
            serde_json::to_string(&ServerMessage::Output { data: "hi\r\n".into() }).unwrap(),
            r#"{"type":"output","data":"hi\r\n"}"#
        );
        assert_eq!(
            serde_json::to_string(&ServerMessage::Error {
                message: "nope".into()
            })
            .unwrap(),
            r#"{"type":"error","message":"nope"}"#
        );
    }
}
