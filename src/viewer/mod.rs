//! Presentation surfaces driving the core: loop selection, memoized frame
//! computation, text rendering, interactive prompt and protocol server.

mod context;
mod interactive;
pub mod protocol;
mod render;
mod selection;

pub use context::ViewerContext;
pub use interactive::run_interactive;
pub use render::{describe_state, render_frame, render_line, StackLabels};
pub use selection::LoopSelection;
