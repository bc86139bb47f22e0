use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Read, Write};

const CONTENT_LENGTH: &str = "Content-Length:";
/// Largest message body accepted from a client.
const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub seq: u64,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(flatten)]
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
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

/// Writes `message` framed as `Content-Length: <n>\r\n\r\n<json>`.
pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<()> {
    let json = serde_json::to_string(message)?;
    write!(writer, "{} {}\r\n\r\n{}", CONTENT_LENGTH, json.len(), json)?;
    writer.flush()?;
    log::trace!("sent {} bytes", json.len());
    Ok(())
}

/// Reads the next framed message; `None` at end of input.
///
/// Frames without a usable length, or longer than 16 MiB, are skipped.
pub fn read_message<R: BufRead>(reader: &mut R) -> Result<Option<Message>> {
    read_message_with_limit(reader, MAX_CONTENT_LENGTH)
}

pub(crate) fn read_message_with_limit<R: BufRead>(
    reader: &mut R,
    max_content_length: usize,
) -> Result<Option<Message>> {
    loop {
        let mut content_length = 0;
        let mut header = String::new();
        loop {
            header.clear();
            if reader.read_line(&mut header)? == 0 {
                return Ok(None);
            }
            let line = header.trim();
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix(CONTENT_LENGTH) {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }

        if content_length == 0 {
            log::warn!("skipping message without content length");
            continue;
        }
        if content_length > max_content_length {
            log::warn!(
                "skipping {} byte message, limit is {}",
                content_length,
                max_content_length
            );
            io::copy(&mut reader.by_ref().take(content_length as u64), &mut io::sink())?;
            continue;
        }
        let mut buffer = vec![0u8; content_length];
        reader.read_exact(&mut buffer)?;
        return Ok(Some(serde_json::from_slice(&buffer)?));
    }
}
