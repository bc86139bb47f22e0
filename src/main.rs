use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use script_trace_viewer::session::Session;
use script_trace_viewer::viewer::{self, LoopSelection, ViewerContext};

#[derive(Parser, Debug)]
#[command(name = "trace-viewer")]
#[command(version, about = "Inspect program states line by line across the frames of a script evaluation")]
struct Cli {
    /// Session document (JSON) to open
    session: Option<PathBuf>,

    /// Serve Content-Length framed requests on stdin/stdout
    #[arg(long)]
    protocol: bool,

    /// Iteration to show for each loop, in discovery order
    #[arg(long, value_delimiter = ',')]
    loops: Vec<usize>,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.format_timestamp(None);
    if let Some(path) = log_file {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().ok();
    Ok(())
}

fn open(path: &Path, loops: Vec<usize>) -> Result<ViewerContext> {
    let session = Session::from_path(path)
        .with_context(|| format!("cannot load session {}", path.display()))?;
    let mut context = ViewerContext::new(session);
    context.set_selection(LoopSelection::from_indexes(loops));
    Ok(context)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;
    log::debug!("{:?}", cli);

    let context = cli
        .session
        .as_ref()
        .map(|path| open(path, cli.loops.clone()))
        .transpose()?;

    if cli.protocol {
        viewer::protocol::run_protocol_mode(context)?;
        return Ok(());
    }

    let Some(mut context) = context else {
        bail!("a session document is required outside protocol mode");
    };
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    viewer::run_interactive(&mut context, stdin.lock(), &mut stdout)?;
    Ok(())
}
