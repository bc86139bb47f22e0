use super::messages::{read_message, write_message, Message, MessageContent};
use crate::cursor::FrameKind;
use crate::error::{Result, ViewerError};
use crate::projector::LoopMarker;
use crate::session::{EditorFrame, Session};
use crate::viewer::ViewerContext;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;

type Reply = std::result::Result<Option<Value>, String>;

#[derive(Debug, Deserialize)]
struct LoadArguments {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LinesArguments {
    frame: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoopArguments {
    loop_index: usize,
    iteration: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameSummary<'a> {
    index: usize,
    script_id: &'a str,
    name: &'a str,
    kind: FrameKind,
    ip_offset: usize,
    line_count: usize,
    loops: &'a [LoopMarker],
    has_error: bool,
}

impl<'a> FrameSummary<'a> {
    fn new(index: usize, frame: &'a EditorFrame) -> Self {
        Self {
            index,
            script_id: &frame.script_id,
            name: &frame.name,
            kind: frame.kind,
            ip_offset: frame.ip_offset,
            line_count: frame.lines.len(),
            loops: &frame.loops,
            has_error: frame.has_error,
        }
    }
}

fn arguments<T: for<'de> Deserialize<'de>>(arguments: Option<Value>) -> std::result::Result<T, String> {
    serde_json::from_value(arguments.unwrap_or(Value::Null))
        .map_err(|err| format!("invalid arguments: {}", err))
}

/// Answers viewer requests read from a framed message stream.
pub struct ProtocolServer<W: Write> {
    seq: u64,
    writer: W,
    context: Option<ViewerContext>,
}

impl<W: Write> ProtocolServer<W> {
    pub fn new(writer: W, context: Option<ViewerContext>) -> Self {
        Self {
            seq: 0,
            writer,
            context,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub fn send_response(
        &mut self,
        request_seq: u64,
        command: String,
        reply: Reply,
    ) -> Result<()> {
        let (success, message, body) = match reply {
            Ok(body) => (true, None, body),
            Err(message) => (false, Some(message), None),
        };
        let msg = Message {
            seq: self.next_seq(),
            msg_type: "response".to_string(),
            content: MessageContent::Response {
                request_seq,
                success,
                command,
                message,
                body,
            },
        };
        write_message(&mut self.writer, &msg)
    }

    pub fn send_event(&mut self, event: &str, body: Option<Value>) -> Result<()> {
        let msg = Message {
            seq: self.next_seq(),
            msg_type: "event".to_string(),
            content: MessageContent::Event {
                event: event.to_string(),
                body,
            },
        };
        write_message(&mut self.writer, &msg)
    }

    /// Reads and answers requests until `disconnect` or end of input.
    pub fn serve<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        loop {
            match read_message(&mut reader) {
                Ok(Some(message)) => {
                    if !self.handle(message)? {
                        break;
                    }
                }
                Ok(None) => break,
                Err(ViewerError::Json(err)) => log::warn!("ignoring malformed message: {}", err),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Returns `false` once the client disconnected.
    pub fn handle(&mut self, message: Message) -> Result<bool> {
        let MessageContent::Request { command, arguments } = message.content else {
            log::debug!("ignoring non-request message {}", message.seq);
            return Ok(true);
        };
        log::debug!("request {}: {}", message.seq, command);

        match command.as_str() {
            "initialize" => {
                let body = json!({ "supportsLoopNavigation": true });
                self.send_response(message.seq, command, Ok(Some(body)))?;
                self.send_event("initialized", None)?;
            }
            "load" => {
                let reply = self.handle_load(arguments);
                self.send_response(message.seq, command, reply)?;
            }
            "frames" => {
                let reply = self.handle_frames();
                self.send_response(message.seq, command, reply)?;
            }
            "lines" => {
                let reply = self.handle_lines(arguments);
                self.send_response(message.seq, command, reply)?;
            }
            "setLoopIteration" => self.handle_set_loop_iteration(message.seq, command, arguments)?,
            "disconnect" => {
                self.send_response(message.seq, command, Ok(None))?;
                return Ok(false);
            }
            _ => {
                log::warn!("unsupported command: {}", command);
                let reply = Err(format!("unsupported command: {}", command));
                self.send_response(message.seq, command, reply)?;
            }
        }
        Ok(true)
    }

    fn context(&mut self) -> std::result::Result<&mut ViewerContext, String> {
        self.context
            .as_mut()
            .ok_or_else(|| "no session loaded".to_string())
    }

    fn handle_load(&mut self, args: Option<Value>) -> Reply {
        let LoadArguments { path } = arguments(args)?;
        let session = Session::from_path(&path).map_err(|err| err.to_string())?;
        match self.context.as_mut() {
            Some(context) => context.load(session),
            None => self.context = Some(ViewerContext::new(session)),
        }
        self.handle_frames()
    }

    fn handle_frames(&mut self) -> Reply {
        let frames = self.context()?.frames().map_err(|err| err.to_string())?;
        let summaries: Vec<FrameSummary> = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| FrameSummary::new(index, frame))
            .collect();
        Ok(Some(json!({ "frames": summaries })))
    }

    fn handle_lines(&mut self, args: Option<Value>) -> Reply {
        let LinesArguments { frame: index } = arguments(args)?;
        let frame = self
            .context()?
            .frame(index)
            .map_err(|err| err.to_string())?;
        Ok(Some(json!({ "frame": index, "lines": frame.lines })))
    }

    fn handle_set_loop_iteration(
        &mut self,
        seq: u64,
        command: String,
        args: Option<Value>,
    ) -> Result<()> {
        let selected = arguments::<LoopArguments>(args).and_then(|args| {
            let changed = self.context()?.set_loop_iteration(args.loop_index, args.iteration);
            Ok((args, changed))
        });
        match selected {
            Ok((args, changed)) => {
                self.send_response(seq, command, Ok(Some(json!({ "changed": changed }))))?;
                if changed {
                    self.send_event(
                        "linesChanged",
                        Some(json!({ "loopIndex": args.loop_index, "iteration": args.iteration })),
                    )?;
                }
                Ok(())
            }
            Err(message) => self.send_response(seq, command, Err(message)),
        }
    }
}
