use super::{BufferId, Host, MacroExecutor, ReplayOutcome, ReplayRequest, WindowId};
use crate::debugger::{Cursor, State};
use crate::error::Result;
use crate::rpc::protocol::host as wire;
use crate::rpc::Connection;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use tracing::debug;

const EXECUTE_MACRO_CHUNK: &str = "macrobug#execute_macro_chunk";
const APPLY_STATE: &str = "macrobug#apply_state";

/// [`Host`] backed by the editor on the other end of a [`Connection`].
pub struct RpcHost<R, W> {
    conn: Connection<R, W>,
    channel_id: u64,
}

impl<R: BufRead, W: Write> RpcHost<R, W> {
    pub fn new(conn: Connection<R, W>) -> Self {
        Self {
            conn,
            channel_id: 0,
        }
    }

    pub fn connection_mut(&mut self) -> &mut Connection<R, W> {
        &mut self.conn
    }

    pub fn set_channel_id(&mut self, channel_id: u64) {
        self.channel_id = channel_id;
    }

    fn api<T: DeserializeOwned>(&mut self, method: &str, params: Value) -> Result<T> {
        debug!(method, "api {params}");
        let body = self.conn.request(
            wire::API,
            Some(json!({ "method": method, "params": params })),
        )?;
        Ok(serde_json::from_value(body)?)
    }

    fn replace_termcodes(&mut self, keys: &str) -> Result<String> {
        self.api("nvim_replace_termcodes", json!([keys, true, true, true]))
    }
}

impl<R: BufRead, W: Write> Host for RpcHost<R, W> {
    fn current_window(&mut self) -> Result<WindowId> {
        self.api("nvim_get_current_win", json!([]))
    }

    fn set_current_window(&mut self, window: WindowId) -> Result<()> {
        self.api::<Value>("nvim_set_current_win", json!([window]))?;
        Ok(())
    }

    fn window_buffer(&mut self, window: WindowId) -> Result<BufferId> {
        self.api("nvim_win_get_buf", json!([window]))
    }

    fn window_is_valid(&mut self, window: WindowId) -> Result<bool> {
        self.api("nvim_win_is_valid", json!([window]))
    }

    fn window_number(&mut self, window: WindowId) -> Result<i64> {
        self.api("nvim_win_get_number", json!([window]))
    }

    fn window_cursor(&mut self, window: WindowId) -> Result<Cursor> {
        self.api("nvim_win_get_cursor", json!([window]))
    }

    fn set_window_cursor(&mut self, window: WindowId, cursor: Cursor) -> Result<()> {
        self.api::<Value>("nvim_win_set_cursor", json!([window, cursor]))?;
        Ok(())
    }

    fn set_window_height(&mut self, window: WindowId, height: u32) -> Result<()> {
        self.api::<Value>("nvim_win_set_height", json!([window, height]))?;
        Ok(())
    }

    fn buffer_lines(&mut self, buffer: BufferId) -> Result<Vec<String>> {
        self.api("nvim_buf_get_lines", json!([buffer, 0, -1, false]))
    }

    fn undo_sequence(&mut self) -> Result<Option<i64>> {
        let tree = self.call_function("undotree", Vec::new())?;
        Ok(tree.get("seq_cur").and_then(Value::as_i64))
    }

    fn set_register(&mut self, name: char, contents: &str) -> Result<()> {
        self.call_function("setreg", vec![json!(name.to_string()), json!(contents)])?;
        Ok(())
    }

    fn command(&mut self, command: &str) -> Result<()> {
        debug!(command, "command");
        self.conn
            .request(wire::COMMAND, Some(json!({ "command": command })))?;
        Ok(())
    }

    fn command_async(&mut self, command: &str) -> Result<()> {
        debug!(command, "command (async)");
        self.conn
            .notify(wire::COMMAND, Some(json!({ "command": command })))
    }

    fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        debug!(function = name, "call");
        self.conn.request(
            wire::CALL,
            Some(json!({ "function": name, "args": args })),
        )
    }

    fn echo_error(&mut self, message: &str) -> Result<()> {
        let escaped = message
            .replace(['\r', '\n'], " ")
            .replace('\\', "\\\\")
            .replace('"', "\\\"");
        self.command_async(&format!(
            "echohl ErrorMsg | echom \"MacroBug Error: {escaped}\" | echohl None"
        ))
    }

    fn channel_id(&self) -> u64 {
        self.channel_id
    }
}

impl<R: BufRead, W: Write> MacroExecutor for RpcHost<R, W> {
    fn replay_keys(&mut self, request: &ReplayRequest) -> Result<ReplayOutcome> {
        let keys = self.replace_termcodes(&request.keys)?;
        let request = ReplayRequest {
            keys,
            ..request.clone()
        };
        let result = self.call_function(EXECUTE_MACRO_CHUNK, vec![serde_json::to_value(&request)?])?;
        Ok(serde_json::from_value(result)?)
    }

    fn restore_state(&mut self, target_winnr: i64, state: &State) -> Result<()> {
        self.call_function(
            APPLY_STATE,
            vec![
                json!(target_winnr),
                json!(state.change_root()),
                json!(state.cursor_root()),
            ],
        )?;
        Ok(())
    }
}
