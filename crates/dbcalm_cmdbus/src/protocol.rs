//! Wire types for the command bus: one JSON object per request, one JSON
//! object per response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{"cmd": "<name>", "args": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub cmd: String,
    pub args: Value,
}

impl CommandRequest {
    #[must_use]
    pub const fn new(cmd: String, args: Value) -> Self {
        Self { cmd, args }
    }
}

/// Either `{"code": 202, "status": "Accepted", "id": "<command_id>"}` or
/// `{"code": <4xx|5xx>, "status": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    pub code: u16,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CommandResponse {
    #[must_use]
    pub fn accepted(command_id: String) -> Self {
        Self { code: 202, status: "Accepted".to_string(), id: Some(command_id) }
    }

    #[must_use]
    pub fn rejected(code: u16, status: impl Into<String>) -> Self {
        Self { code, status: status.into(), id: None }
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.code == 202
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_response_serializes_with_id() {
        let resp = CommandResponse::accepted("cmd-1".into());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], 202);
        assert_eq!(json["id"], "cmd-1");
    }

    #[test]
    fn rejected_response_omits_id() {
        let resp = CommandResponse::rejected(409, "conflict");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn request_round_trips_through_json() {
        let req = CommandRequest::new("full_backup".into(), serde_json::json!({"id": "x"}));
        let encoded = serde_json::to_string(&req).unwrap();
        let decoded: CommandRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.cmd, "full_backup");
    }
}
