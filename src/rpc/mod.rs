mod connection;
pub mod protocol;
mod server;

pub use connection::Connection;
pub use protocol::{Message, MessageContent};
pub use server::PluginServer;

use crate::debugger::SessionOptions;
use crate::error::Result;
use crate::host::RpcHost;
use protocol::commands;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

/// Serves the editor over this process's stdin/stdout until it hangs up.
pub fn run_rpc_mode(options: SessionOptions) -> Result<()> {
    info!("rpc server starting on stdio");
    let conn = Connection::new(io::stdin().lock(), io::stdout().lock());
    serve(conn, options)
}

/// Message loop: one inbound message at a time, each fully handled
/// (including any calls back into the editor) before the next is read.
pub fn serve<R: BufRead, W: Write>(conn: Connection<R, W>, options: SessionOptions) -> Result<()> {
    let mut server = PluginServer::new(RpcHost::new(conn), options);
    let mut msg_count = 0u64;

    loop {
        let Some(msg) = server.host_mut().connection_mut().next_inbound()? else {
            info!(messages = msg_count, "editor closed the channel");
            break;
        };
        msg_count += 1;
        debug!(seq = msg.seq, "received {:?}", msg.content);

        match msg.content {
            MessageContent::Request { command, arguments } => match command.as_str() {
                commands::INITIALIZE => {
                    let channel_id = arguments
                        .as_ref()
                        .and_then(|a| a.get("channelId"))
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    server.host_mut().set_channel_id(channel_id);
                    info!(channel_id, "initialized");

                    let body = json!({
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                        "commands": [
                            commands::START,
                            commands::SAVE,
                            commands::QUIT,
                            commands::STEP_FORWARD,
                            commands::STEP_BACKWARD,
                        ],
                    });
                    server
                        .host_mut()
                        .connection_mut()
                        .respond(msg.seq, &command, Ok(Some(body)))?;
                }
                commands::SHUTDOWN => {
                    server
                        .host_mut()
                        .connection_mut()
                        .respond(msg.seq, &command, Ok(None))?;
                    info!("shutdown requested");
                    break;
                }
                _ => {
                    let outcome = server.handle_command(&command, arguments.as_ref());
                    let outcome = match outcome {
                        Err(e) if e.is_fatal() => return Err(e),
                        other => other.map_err(|e| e.to_string()),
                    };
                    server
                        .host_mut()
                        .connection_mut()
                        .respond(msg.seq, &command, outcome)?;
                }
            },
            MessageContent::Event { event, .. } => server.handle_event(&event)?,
            MessageContent::Response { request_seq, .. } => {
                warn!(request_seq, "stray response with nothing waiting on it");
            }
        }
    }

    Ok(())
}
