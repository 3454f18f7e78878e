//! What the plugin needs from the editor it runs inside.
//!
//! The controller only talks to these two traits, so it can be driven by the
//! real editor connection ([`RpcHost`]) or by a fake in tests.

mod remote;

pub use remote::RpcHost;

use crate::debugger::{Cursor, State};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Editor window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

/// Editor buffer handle (the buffer number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(pub i64);

/// Editor primitives: windows, buffers, cursors, registers, commands.
pub trait Host {
    fn current_window(&mut self) -> Result<WindowId>;
    fn set_current_window(&mut self, window: WindowId) -> Result<()>;
    fn window_buffer(&mut self, window: WindowId) -> Result<BufferId>;
    fn window_is_valid(&mut self, window: WindowId) -> Result<bool>;
    /// Screen number of the window, as used by `:windo`.
    fn window_number(&mut self, window: WindowId) -> Result<i64>;
    fn window_cursor(&mut self, window: WindowId) -> Result<Cursor>;
    fn set_window_cursor(&mut self, window: WindowId, cursor: Cursor) -> Result<()>;
    fn set_window_height(&mut self, window: WindowId, height: u32) -> Result<()>;
    fn buffer_lines(&mut self, buffer: BufferId) -> Result<Vec<String>>;

    /// `undotree().seq_cur` of the current buffer, if the editor has one.
    fn undo_sequence(&mut self) -> Result<Option<i64>>;

    fn set_register(&mut self, name: char, contents: &str) -> Result<()>;

    /// Runs an ex command and waits for it to finish.
    fn command(&mut self, command: &str) -> Result<()>;

    /// Runs an ex command without waiting. Ordering against later calls is
    /// not guaranteed.
    fn command_async(&mut self, command: &str) -> Result<()>;

    fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value>;

    fn echo_error(&mut self, message: &str) -> Result<()>;

    /// Channel the editor uses to route notifications back to us.
    fn channel_id(&self) -> u64;
}

/// Arguments for one macro replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRequest {
    pub target_winnr: i64,
    pub winnr: i64,
    pub change_root: i64,
    pub cursor_root: Cursor,
    pub keys: String,
}

/// Where a replay left the target window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReplayOutcome {
    #[serde(rename = "undotree_seq_cur")]
    pub change_root: i64,
    #[serde(rename = "cursor_pos")]
    pub cursor: Cursor,
}

impl From<ReplayOutcome> for State {
    fn from(outcome: ReplayOutcome) -> Self {
        State::new(outcome.change_root, outcome.cursor)
    }
}

/// Replay and rewind, implemented by editor-side script functions.
pub trait MacroExecutor {
    /// Undo the target back to `change_root`, put the cursor at
    /// `cursor_root`, then feed `keys`.
    fn replay_keys(&mut self, request: &ReplayRequest) -> Result<ReplayOutcome>;

    /// Put the target window back to `state`.
    fn restore_state(&mut self, target_winnr: i64, state: &State) -> Result<()>;
}
