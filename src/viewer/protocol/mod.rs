//! Content-Length framed JSON requests over stdio.

mod messages;
mod server;

pub use messages::{read_message, write_message, Message, MessageContent};
pub use server::ProtocolServer;

use crate::error::Result;
use crate::viewer::ViewerContext;
use std::io;

/// Serves requests on stdin/stdout until the client disconnects.
pub fn run_protocol_mode(context: Option<ViewerContext>) -> Result<()> {
    log::info!("protocol server starting");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut server = ProtocolServer::new(stdout.lock(), context);
    server.serve(stdin.lock())?;
    log::info!("protocol server exiting");
    Ok(())
}
