#![allow(dead_code)]

use macrobug::debugger::{Cursor, State};
use macrobug::host::{BufferId, Host, MacroExecutor, ReplayOutcome, ReplayRequest, WindowId};
use macrobug::{MacroBugError, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

pub const TARGET_WIN: WindowId = WindowId(1000);
pub const TARGET_BUF: BufferId = BufferId(1);
pub const INPUT_WIN: WindowId = WindowId(1001);
pub const INPUT_BUF: BufferId = BufferId(2);

/// Everything the fake editor was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Command(String),
    CommandAsync(String),
    Function(String),
    SetRegister(char, String),
    SetCursor(WindowId, Cursor),
    Focus(WindowId),
    Replay(ReplayRequest),
    Restore(i64, State),
    Echo(String),
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub buffer: BufferId,
    pub cursor: Cursor,
    pub valid: bool,
    pub number: i64,
    pub height: u32,
}

/// In-memory editor with one target window. `:new` opens the input window
/// seeded from the pasted register; `:Nwindo q!` closes window N.
pub struct FakeHost {
    pub windows: HashMap<WindowId, FakeWindow>,
    pub buffers: HashMap<BufferId, Vec<String>>,
    pub current: WindowId,
    pub undo_seq: Option<i64>,
    pub registers: HashMap<char, String>,
    pub replays: VecDeque<ReplayOutcome>,
    pub fail_function: Option<String>,
    /// Window whose buffer lookup fails.
    pub fail_buffer_of: Option<WindowId>,
    pub calls: Vec<Call>,
}

impl FakeHost {
    pub fn new(undo_seq: i64, cursor: Cursor) -> Self {
        let mut windows = HashMap::new();
        windows.insert(
            TARGET_WIN,
            FakeWindow {
                buffer: TARGET_BUF,
                cursor,
                valid: true,
                number: 1,
                height: 20,
            },
        );
        let mut buffers = HashMap::new();
        buffers.insert(TARGET_BUF, vec!["hello world".to_string()]);

        Self {
            windows,
            buffers,
            current: TARGET_WIN,
            undo_seq: Some(undo_seq),
            registers: HashMap::new(),
            replays: VecDeque::new(),
            fail_function: None,
            fail_buffer_of: None,
            calls: Vec::new(),
        }
    }

    pub fn with_register(mut self, name: char, contents: &str) -> Self {
        self.registers.insert(name, contents.to_string());
        self
    }

    pub fn queue_replay(&mut self, change_root: i64, cursor: Cursor) {
        self.replays.push_back(ReplayOutcome {
            change_root,
            cursor,
        });
    }

    pub fn close_window(&mut self, window: WindowId) {
        if let Some(win) = self.windows.get_mut(&window) {
            win.valid = false;
        }
    }

    pub fn move_input_cursor(&mut self, col: usize) {
        if let Some(win) = self.windows.get_mut(&INPUT_WIN) {
            win.cursor = Cursor::new(1, col);
        }
    }

    pub fn restores(&self) -> Vec<(i64, State)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Restore(winnr, state) => Some((*winnr, *state)),
                _ => None,
            })
            .collect()
    }

    pub fn replays_seen(&self) -> Vec<ReplayRequest> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Replay(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Command(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn echoes(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Echo(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn register_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::SetRegister(..)))
            .count()
    }

    fn window(&self, window: WindowId) -> Result<&FakeWindow> {
        self.windows
            .get(&window)
            .filter(|w| w.valid)
            .ok_or_else(|| MacroBugError::host(format!("Invalid window id: {}", window.0)))
    }

    fn open_input(&mut self, register: char) {
        let contents = self.registers.get(&register).cloned().unwrap_or_default();
        let lines = contents.split('\n').map(str::to_string).collect();
        self.buffers.insert(INPUT_BUF, lines);
        self.windows.insert(
            INPUT_WIN,
            FakeWindow {
                buffer: INPUT_BUF,
                cursor: Cursor::new(1, 0),
                valid: true,
                number: 1,
                height: 10,
            },
        );
        if let Some(target) = self.windows.get_mut(&TARGET_WIN) {
            target.number = 2;
        }
        self.current = INPUT_WIN;
    }
}

impl Host for FakeHost {
    fn current_window(&mut self) -> Result<WindowId> {
        Ok(self.current)
    }

    fn set_current_window(&mut self, window: WindowId) -> Result<()> {
        self.window(window)?;
        self.calls.push(Call::Focus(window));
        self.current = window;
        Ok(())
    }

    fn window_buffer(&mut self, window: WindowId) -> Result<BufferId> {
        if self.fail_buffer_of == Some(window) {
            return Err(MacroBugError::host(format!("Invalid window id: {}", window.0)));
        }
        Ok(self.window(window)?.buffer)
    }

    fn window_is_valid(&mut self, window: WindowId) -> Result<bool> {
        Ok(self.windows.get(&window).is_some_and(|w| w.valid))
    }

    fn window_number(&mut self, window: WindowId) -> Result<i64> {
        Ok(self.window(window)?.number)
    }

    fn window_cursor(&mut self, window: WindowId) -> Result<Cursor> {
        Ok(self.window(window)?.cursor)
    }

    fn set_window_cursor(&mut self, window: WindowId, cursor: Cursor) -> Result<()> {
        self.window(window)?;
        self.calls.push(Call::SetCursor(window, cursor));
        if let Some(win) = self.windows.get_mut(&window) {
            win.cursor = cursor;
        }
        Ok(())
    }

    fn set_window_height(&mut self, window: WindowId, height: u32) -> Result<()> {
        self.window(window)?;
        if let Some(win) = self.windows.get_mut(&window) {
            win.height = height;
        }
        Ok(())
    }

    fn buffer_lines(&mut self, buffer: BufferId) -> Result<Vec<String>> {
        self.buffers
            .get(&buffer)
            .cloned()
            .ok_or_else(|| MacroBugError::host(format!("Invalid buffer id: {}", buffer.0)))
    }

    fn undo_sequence(&mut self) -> Result<Option<i64>> {
        Ok(self.undo_seq)
    }

    fn set_register(&mut self, name: char, contents: &str) -> Result<()> {
        self.calls.push(Call::SetRegister(name, contents.to_string()));
        self.registers.insert(name, contents.to_string());
        Ok(())
    }

    fn command(&mut self, command: &str) -> Result<()> {
        self.calls.push(Call::Command(command.to_string()));

        if let Some(register) = command.strip_prefix("new +normal!\\ V\"") {
            if let Some(name) = register.chars().next() {
                self.open_input(name);
            }
        } else if let Some(number) = command.strip_suffix("windo q!") {
            let number: i64 = number
                .parse()
                .map_err(|_| MacroBugError::host("E16: Invalid range"))?;
            let closed: Vec<WindowId> = self
                .windows
                .iter()
                .filter(|(_, w)| w.valid && w.number == number)
                .map(|(id, _)| *id)
                .collect();
            for id in closed {
                self.close_window(id);
            }
            self.current = TARGET_WIN;
        } else if let Some(seq) = command.strip_prefix("undo ") {
            self.undo_seq = seq.parse().ok();
        }
        Ok(())
    }

    fn command_async(&mut self, command: &str) -> Result<()> {
        self.calls.push(Call::CommandAsync(command.to_string()));
        Ok(())
    }

    fn call_function(&mut self, name: &str, _args: Vec<Value>) -> Result<Value> {
        self.calls.push(Call::Function(name.to_string()));
        if self.fail_function.as_deref() == Some(name) {
            return Err(MacroBugError::host(format!("E117: Unknown function: {name}")));
        }
        Ok(Value::Null)
    }

    fn echo_error(&mut self, message: &str) -> Result<()> {
        self.calls.push(Call::Echo(message.to_string()));
        Ok(())
    }

    fn channel_id(&self) -> u64 {
        7
    }
}

impl MacroExecutor for FakeHost {
    fn replay_keys(&mut self, request: &ReplayRequest) -> Result<ReplayOutcome> {
        self.calls.push(Call::Replay(request.clone()));
        let outcome = self
            .replays
            .pop_front()
            .ok_or_else(|| MacroBugError::host("no replay scripted"))?;
        self.undo_seq = Some(outcome.change_root);
        Ok(outcome)
    }

    fn restore_state(&mut self, target_winnr: i64, state: &State) -> Result<()> {
        self.calls.push(Call::Restore(target_winnr, *state));
        self.undo_seq = Some(state.change_root());
        Ok(())
    }
}
