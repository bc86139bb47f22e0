use super::context::ViewerContext;
use super::render::render_frame;
use crate::error::{Result, ViewerError};
use crate::extract::SampleExtractor;
use std::io::{BufRead, Write};

const HELP: &str = "Commands: (f)rame <index>, (l)oop <loop> <iteration>, (p)rint, (q)uit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Frame(usize),
    Loop { loop_index: usize, iteration: usize },
    Print,
    Quit,
}

fn parse_index(token: &str) -> std::result::Result<usize, String> {
    token
        .parse()
        .map_err(|_| format!("not an index: {}", token))
}

fn parse_command(input: &str) -> std::result::Result<Option<Command>, String> {
    let tokens = shlex::split(input).ok_or_else(|| "unbalanced quotes".to_string())?;
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let command = match tokens.as_slice() {
        [] => return Ok(None),
        ["f" | "frame", index] => Command::Frame(parse_index(index)?),
        ["l" | "loop", loop_index, iteration] => Command::Loop {
            loop_index: parse_index(loop_index)?,
            iteration: parse_index(iteration)?,
        },
        ["p" | "print"] => Command::Print,
        ["q" | "quit"] => Command::Quit,
        _ => return Err(format!("unknown command: {}", input.trim())),
    };
    Ok(Some(command))
}

fn print_frames<E: SampleExtractor, W: Write>(
    context: &mut ViewerContext<E>,
    output: &mut W,
) -> Result<()> {
    let labels = context.labels()?;
    for (index, frame) in context.frames()?.iter().enumerate() {
        writeln!(output, "{}\n", render_frame(index, frame, &labels))?;
    }
    Ok(())
}

/// Prints every frame, then reads commands from `input` until `q` or end
/// of input.
pub fn run_interactive<E, R, W>(
    context: &mut ViewerContext<E>,
    input: R,
    output: &mut W,
) -> Result<()>
where
    E: SampleExtractor,
    R: BufRead,
    W: Write,
{
    print_frames(context, output)?;

    let mut lines = input.lines();
    loop {
        writeln!(output, "{}", HELP)?;
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let command = match parse_command(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(output, "❓ {}", message)?;
                continue;
            }
        };

        match command {
            Command::Frame(index) => {
                let labels = context.labels()?;
                match context.frame(index) {
                    Ok(frame) => writeln!(output, "{}\n", render_frame(index, frame, &labels))?,
                    Err(err @ ViewerError::FrameOutOfRange { .. }) => {
                        writeln!(output, "❌ {}", err)?
                    }
                    Err(err) => return Err(err),
                }
            }
            Command::Loop {
                loop_index,
                iteration,
            } => {
                if context.set_loop_iteration(loop_index, iteration) {
                    print_frames(context, output)?;
                } else {
                    writeln!(output, "loop {} already shows iteration {}", loop_index, iteration)?;
                }
            }
            Command::Print => print_frames(context, output)?,
            Command::Quit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_tokenized_like_a_shell() {
        assert_eq!(parse_command("  f 2 "), Ok(Some(Command::Frame(2))));
        assert_eq!(
            parse_command("loop '1' 3"),
            Ok(Some(Command::Loop {
                loop_index: 1,
                iteration: 3
            }))
        );
        assert_eq!(parse_command("q"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn malformed_commands_are_reported() {
        assert!(parse_command("f x").unwrap_err().contains("not an index"));
        assert!(parse_command("l 1").unwrap_err().contains("unknown command"));
        assert_eq!(parse_command("f \"1"), Err("unbalanced quotes".to_string()));
    }
}
