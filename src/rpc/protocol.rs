use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub seq: u64,
    #[serde(flatten)]
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Request {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Value>,
    },
    Response {
        request_seq: u64,
        success: bool,
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
    Event {
        event: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
}

/// Requests the editor sends us.
pub mod commands {
    pub const INITIALIZE: &str = "initialize";
    pub const START: &str = "MacroBug";
    pub const SAVE: &str = "MacroSave";
    pub const QUIT: &str = "MacroQuit";
    pub const STEP_FORWARD: &str = "MacroStepForward";
    pub const STEP_BACKWARD: &str = "MacroStepBackward";
    pub const SHUTDOWN: &str = "shutdown";
}

/// Notifications the editor sends us.
pub mod events {
    pub const QUIT: &str = "macrobug:quit";
    pub const CURSOR_MOVE: &str = "macrobug:cursormove";
}

/// Requests and notifications we send the editor.
pub mod host {
    pub const API: &str = "api";
    pub const CALL: &str = "call";
    pub const COMMAND: &str = "command";
}
