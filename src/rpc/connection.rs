use super::protocol::{Message, MessageContent};
use crate::error::{MacroBugError, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::io::{BufRead, Read, Write};
use tracing::{debug, trace};

const CONTENT_LENGTH: &str = "Content-Length:";
const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// Framed JSON channel to the editor.
///
/// Everything is single-threaded: while we wait for the answer to one of our
/// own requests, whatever else the editor sends is parked in `inbound` and
/// handed out later by [`Connection::next_inbound`], in arrival order.
pub struct Connection<R, W> {
    reader: R,
    writer: W,
    seq: u64,
    inbound: VecDeque<Message>,
}

impl<R: BufRead, W: Write> Connection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            seq: 0,
            inbound: VecDeque::new(),
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Next editor request or event. `None` once the editor hangs up.
    pub fn next_inbound(&mut self) -> Result<Option<Message>> {
        if let Some(msg) = self.inbound.pop_front() {
            return Ok(Some(msg));
        }
        self.read_message()
    }

    /// Sends a request and blocks until the matching response arrives.
    pub fn request(&mut self, command: &str, arguments: Option<Value>) -> Result<Value> {
        let seq = self.next_seq();
        self.send(Message {
            seq,
            content: MessageContent::Request {
                command: command.to_string(),
                arguments,
            },
        })?;

        loop {
            let msg = self.read_message()?.ok_or_else(|| {
                MacroBugError::Protocol(format!("editor closed the channel during '{command}'"))
            })?;

            match msg.content {
                MessageContent::Response {
                    request_seq,
                    success,
                    message,
                    body,
                    ..
                } => {
                    if request_seq != seq {
                        debug!(request_seq, "dropping response to unknown request");
                        continue;
                    }
                    if success {
                        return Ok(body.unwrap_or(Value::Null));
                    }
                    return Err(MacroBugError::host(
                        message.unwrap_or_else(|| format!("'{command}' failed")),
                    ));
                }
                content => {
                    trace!(seq = msg.seq, "queueing inbound message");
                    self.inbound.push_back(Message {
                        seq: msg.seq,
                        content,
                    });
                }
            }
        }
    }

    /// Fire-and-forget notification.
    pub fn notify(&mut self, event: &str, body: Option<Value>) -> Result<()> {
        let seq = self.next_seq();
        self.send(Message {
            seq,
            content: MessageContent::Event {
                event: event.to_string(),
                body,
            },
        })
    }

    pub fn respond(
        &mut self,
        request_seq: u64,
        command: &str,
        outcome: std::result::Result<Option<Value>, String>,
    ) -> Result<()> {
        let seq = self.next_seq();
        let (success, message, body) = match outcome {
            Ok(body) => (true, None, body),
            Err(message) => (false, Some(message), None),
        };
        self.send(Message {
            seq,
            content: MessageContent::Response {
                request_seq,
                success,
                command: command.to_string(),
                message,
                body,
            },
        })
    }

    fn send(&mut self, msg: Message) -> Result<()> {
        let json = serde_json::to_string(&msg)?;
        write!(self.writer, "{CONTENT_LENGTH} {}\r\n\r\n{json}", json.len())?;
        self.writer.flush()?;
        trace!(seq = msg.seq, bytes = json.len(), "sent");
        Ok(())
    }

    fn read_message(&mut self) -> Result<Option<Message>> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut first = true;

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                if first {
                    return Ok(None);
                }
                return Err(MacroBugError::Protocol(
                    "unexpected end of input in frame header".to_string(),
                ));
            }
            first = false;

            let header = line.trim_end_matches(['\r', '\n']);
            if header.is_empty() {
                break;
            }
            if let Some(value) = header.strip_prefix(CONTENT_LENGTH) {
                let len = value.trim().parse().map_err(|_| {
                    MacroBugError::Protocol(format!("bad content length '{}'", value.trim()))
                })?;
                content_length = Some(len);
            }
        }

        let len = content_length
            .ok_or_else(|| MacroBugError::Protocol("missing Content-Length header".to_string()))?;
        if len > MAX_CONTENT_LENGTH {
            return Err(MacroBugError::Protocol(format!(
                "content length {len} exceeds {MAX_CONTENT_LENGTH}"
            )));
        }
        let mut buffer = vec![0u8; len];
        self.reader.read_exact(&mut buffer)?;

        let msg: Message = serde_json::from_slice(&buffer)
            .map_err(|e| MacroBugError::Protocol(format!("malformed message: {e}")))?;
        trace!(seq = msg.seq, bytes = len, "received");
        Ok(Some(msg))
    }
}
