use super::protocol::{commands, events};
use crate::debugger::{MacroSession, SessionOptions};
use crate::error::{MacroBugError, Result};
use crate::host::{Host, MacroExecutor};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Routes editor commands and notifications to the (at most one) open
/// debugging session.
pub struct PluginServer<H> {
    host: H,
    session: Option<MacroSession>,
    options: SessionOptions,
}

impl<H: Host + MacroExecutor> PluginServer<H> {
    pub fn new(host: H, options: SessionOptions) -> Self {
        Self {
            host,
            session: None,
            options,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn session(&self) -> Option<&MacroSession> {
        self.session.as_ref()
    }

    /// Runs one user command. Failures are shown to the user before being
    /// handed back for the response.
    pub fn handle_command(&mut self, command: &str, arguments: Option<&Value>) -> Result<Option<Value>> {
        let outcome = match command {
            commands::START => register_argument(arguments).and_then(|key| self.start_session(&key)),
            commands::SAVE => self.save_register(),
            commands::QUIT => self.quit(),
            commands::STEP_FORWARD => self.step_forward(),
            commands::STEP_BACKWARD => self.step_backward(),
            other => Err(MacroBugError::invalid_argument(format!(
                "Unknown command '{other}'"
            ))),
        };

        match outcome {
            Ok(()) => Ok(None),
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Handles one editor notification. Only transport failures escape.
    pub fn handle_event(&mut self, event: &str) -> Result<()> {
        let outcome = match event {
            events::QUIT => self.on_quit(),
            events::CURSOR_MOVE => self.on_cursor_move(),
            other => {
                debug!(event = other, "ignoring unknown event");
                Ok(())
            }
        };

        match outcome {
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.report(&e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn report(&mut self, err: &MacroBugError) {
        warn!(error = %err, "command failed");
        if err.is_fatal() {
            return;
        }
        if let Err(echo_err) = self.host.echo_error(&err.to_string()) {
            warn!(error = %echo_err, "could not display error");
        }
    }

    pub fn start_session(&mut self, register_key: &str) -> Result<()> {
        if self.session.is_some() {
            return Err(MacroBugError::precondition(
                "MacroBug debugger instance already open!",
            ));
        }

        let mut session = MacroSession::new(&mut self.host, register_key, self.options)?;
        if let Err(e) = session.open(&mut self.host) {
            if let Err(cleanup) = session.abort(&mut self.host) {
                warn!(error = %cleanup, "cleanup after failed start also failed");
            }
            return Err(e);
        }

        info!(register = %session.register_key(), "session started");
        self.session = Some(session);
        Ok(())
    }

    pub fn save_register(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or_else(not_open)?;
        session.save_register(&mut self.host)
    }

    pub fn quit(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or_else(not_open)?;
        session.quit(&mut self.host)
    }

    pub fn step_forward(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or_else(not_open)?;
        session.step_forward(&mut self.host)
    }

    pub fn step_backward(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or_else(not_open)?;
        session.step_backward(&mut self.host)
    }

    /// The input buffer was unloaded: restore the target and forget the
    /// session.
    pub fn on_quit(&mut self) -> Result<()> {
        match self.session.take() {
            Some(mut session) => session.on_closed(&mut self.host),
            None => {
                debug!("quit notification without a session");
                Ok(())
            }
        }
    }

    pub fn on_cursor_move(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.check_cursor_moved(&mut self.host)? {
            session.run_macro_chunk(&mut self.host)?;
        }
        Ok(())
    }
}

fn not_open() -> MacroBugError {
    MacroBugError::precondition("MacroBug is not open")
}

/// Pulls the single register argument out of a `MacroBug` request. Accepts
/// either the raw argument string or an already split list.
fn register_argument(arguments: Option<&Value>) -> Result<String> {
    let usage = || MacroBugError::invalid_argument("Expecting a register as parameter. See :help register");

    let args: Vec<String> = match arguments.and_then(|a| a.get("args")) {
        Some(Value::String(raw)) => raw.split_whitespace().map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(usage))
            .collect::<Result<_>>()?,
        _ => return Err(usage()),
    };

    match <[String; 1]>::try_from(args) {
        Ok([key]) => Ok(key),
        Err(_) => Err(usage()),
    }
}
