use super::keys::macro_prefix;
use super::state::{State, StateStack};
use crate::error::{MacroBugError, Result};
use crate::host::{BufferId, Host, MacroExecutor, ReplayRequest, WindowId};
use tracing::{debug, info};

pub const DEFAULT_WINDOW_HEIGHT: u32 = 2;

/// Lifecycle of a debugging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Root captured, input window not opened yet.
    Uninitialized,
    Active,
    /// Terminal. Start a new session to debug again.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub window_height: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            window_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// The small window holding the macro text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSurface {
    pub window: WindowId,
    pub buffer: BufferId,
}

/// One macro debugging session against one target window.
///
/// Holds no editor handle itself; every operation borrows the host for the
/// duration of the call.
#[derive(Debug)]
pub struct MacroSession {
    register_key: char,
    target: WindowId,
    input_window: Option<WindowId>,
    input_buffer: Option<BufferId>,
    states: StateStack,
    last_col: usize,
    status: SessionStatus,
    options: SessionOptions,
}

impl MacroSession {
    /// Validates the register and captures the root state of the focused
    /// window. Touches nothing in the editor.
    pub fn new<H: Host>(host: &mut H, register_key: &str, options: SessionOptions) -> Result<Self> {
        let mut chars = register_key.chars();
        let register_key = match (chars.next(), chars.next()) {
            (Some(key), None) => key,
            _ => {
                return Err(MacroBugError::invalid_argument(
                    "Expecting a register as parameter. See :help register",
                ))
            }
        };

        let target = host.current_window()?;
        let change_root = host.undo_sequence()?.ok_or_else(|| {
            MacroBugError::precondition("Cannot find current sequence of the undotree")
        })?;
        let cursor_root = host.window_cursor(target)?;

        Ok(Self {
            register_key,
            target,
            input_window: None,
            input_buffer: None,
            states: StateStack::new(State::new(change_root, cursor_root)),
            last_col: 0,
            status: SessionStatus::Uninitialized,
            options,
        })
    }

    /// Locks the target, opens the input window seeded from the register
    /// and wires its events back to us.
    pub fn open<H: Host>(&mut self, host: &mut H) -> Result<()> {
        host.call_function("macrobug#draw_cursor_and_visual", Vec::new())?;
        host.command("setlocal nomodifiable")?;

        // `normal!` ignores user mappings; the `V` keeps the paste from
        // opening a new line.
        host.command(&format!("new +normal!\\ V\"{}p0", self.register_key))?;
        let window = host.current_window()?;
        self.input_window = Some(window);
        let buffer = host.window_buffer(window)?;
        self.input_buffer = Some(buffer);

        if host.buffer_lines(buffer)?.len() > 1 {
            return Err(MacroBugError::precondition(
                "Unexpected carriage return in macro",
            ));
        }

        host.set_window_height(window, self.options.window_height)?;
        self.last_col = host.window_cursor(window)?.col;

        let channel = host.channel_id();
        host.command_async("setlocal noswapfile")?;
        host.command_async(&format!(
            "autocmd CursorMoved,CursorMovedI <buffer={}> :call rpcnotify({channel}, \"macrobug:cursormove\")",
            buffer.0
        ))?;
        host.command_async(&format!(
            "autocmd BufUnload <buffer={}> :call rpcnotify({channel}, \"macrobug:quit\")",
            buffer.0
        ))?;
        host.command_async("inoremap <silent><buffer> <cr> <lt>cr>")?;

        host.call_function("macrobug#map_keys", Vec::new())?;

        self.status = SessionStatus::Active;
        info!(
            register = %self.register_key,
            change_root = self.states.root().change_root(),
            "macro session opened"
        );
        Ok(())
    }

    /// Undoes whatever a failed [`open`](Self::open) left behind.
    pub fn abort<H: Host>(&mut self, host: &mut H) -> Result<()> {
        self.quit(host)?;
        self.on_closed(host)
    }

    pub fn register_key(&self) -> char {
        self.register_key
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn states(&self) -> &StateStack {
        &self.states
    }

    pub fn target(&self) -> WindowId {
        self.target
    }

    pub fn input(&self) -> Option<InputSurface> {
        Some(InputSurface {
            window: self.input_window?,
            buffer: self.input_buffer?,
        })
    }

    fn input_surface(&self) -> Result<InputSurface> {
        self.input()
            .ok_or_else(|| MacroBugError::precondition("Cannot access debugger window"))
    }

    fn input_is_valid<H: Host>(&self, host: &mut H) -> Result<bool> {
        match self.input_window {
            Some(window) => host.window_is_valid(window),
            None => Ok(false),
        }
    }

    fn macro_line<H: Host>(&self, host: &mut H) -> Result<String> {
        let input = self.input_surface()?;
        Ok(host.buffer_lines(input.buffer)?.into_iter().next().unwrap_or_default())
    }

    fn current_col<H: Host>(&self, host: &mut H) -> Result<usize> {
        let input = self.input_surface()?;
        Ok(host.window_cursor(input.window)?.col)
    }

    pub fn save_register<H: Host>(&self, host: &mut H) -> Result<()> {
        if !self.input_is_valid(host)? {
            return Err(MacroBugError::precondition("Cannot access debugger window"));
        }
        let macro_line = self.macro_line(host)?;
        host.set_register(self.register_key, &macro_line)?;
        debug!(register = %self.register_key, "register saved");
        Ok(())
    }

    /// Closes the input window. The editor then reports the unload, which
    /// ends up in [`on_closed`](Self::on_closed).
    pub fn quit<H: Host>(&self, host: &mut H) -> Result<()> {
        let Some(window) = self.input_window else {
            return Ok(());
        };
        if !host.window_is_valid(window)? {
            return Ok(());
        }
        let winnr = host.window_number(window)?;
        host.command(&format!("{winnr}windo q!"))
    }

    /// True when the input cursor column changed since the last check.
    pub fn check_cursor_moved<H: Host>(&mut self, host: &mut H) -> Result<bool> {
        let col = self.current_col(host)?;
        if col == self.last_col {
            return Ok(false);
        }
        self.last_col = col;
        Ok(true)
    }

    /// Previews the macro up to and including the key under the cursor.
    /// The state stack is left alone.
    pub fn run_macro_chunk<H: Host + MacroExecutor>(&mut self, host: &mut H) -> Result<State> {
        let keys_to = self.current_col(host)? + 1;
        self.run_macro_to_pos(host, keys_to)
    }

    fn run_macro_to_pos<H: Host + MacroExecutor>(
        &mut self,
        host: &mut H,
        keys_to: usize,
    ) -> Result<State> {
        let input = self.input_surface()?;
        let macro_line = self.macro_line(host)?;
        let current = *self.states.current();

        host.set_window_cursor(self.target, current.cursor_root())?;
        debug!(change_root = current.change_root(), keys_to, "replaying macro");

        let request = ReplayRequest {
            target_winnr: host.window_number(self.target)?,
            winnr: host.window_number(input.window)?,
            change_root: current.change_root(),
            cursor_root: current.cursor_root(),
            keys: macro_prefix(&macro_line, keys_to).to_string(),
        };
        Ok(host.replay_keys(&request)?.into())
    }

    /// Replays the whole macro from the current state and records the result.
    pub fn step_forward<H: Host + MacroExecutor>(&mut self, host: &mut H) -> Result<()> {
        let len = self.macro_line(host)?.len();
        let state = self.run_macro_to_pos(host, len)?;
        self.states.push(state);
        debug!(depth = self.states.len(), "stepped forward");
        Ok(())
    }

    /// Drops the last state and rewinds the target to the one below it.
    /// Does nothing at the root.
    pub fn step_backward<H: Host + MacroExecutor>(&mut self, host: &mut H) -> Result<()> {
        if self.states.pop().is_none() {
            debug!("already at the root state");
            return Ok(());
        }
        let target_winnr = host.window_number(self.target)?;
        let current = *self.states.current();
        host.restore_state(target_winnr, &current)?;
        debug!(depth = self.states.len(), "stepped backward");
        Ok(())
    }

    /// Hands the target window back at the last recorded state, once the
    /// input window is gone.
    pub fn on_closed<H: Host>(&mut self, host: &mut H) -> Result<()> {
        if self.input_is_valid(host)? {
            return Ok(());
        }
        if !host.window_is_valid(self.target)? {
            self.status = SessionStatus::Closed;
            return Ok(());
        }

        let focused = host.current_window()?;
        host.set_current_window(self.target)?;
        host.command("setlocal modifiable")?;
        let current = *self.states.current();
        host.command(&format!("undo {}", current.change_root()))?;
        host.call_function("macrobug#unset_cursor_and_visual", Vec::new())?;
        host.set_current_window(focused)?;

        let root = *self.states.root();
        self.states = StateStack::new(root);
        self.status = SessionStatus::Closed;
        info!(change_root = current.change_root(), "macro session closed");
        Ok(())
    }
}
