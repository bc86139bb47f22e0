//! Projects a virtual-machine execution trace onto the source lines of the
//! script frames that were concatenated to produce it.
//!
//! [`cursor::TraceCursor`] splits the shared trace between frames,
//! a [`extract::SampleExtractor`] turns each frame's states into samples, and
//! [`projector::samples_to_evaluation_lines`] lays those samples out one per
//! source line. [`session::compute_frames`] runs the three for a whole
//! session.

pub mod cursor;
pub mod error;
pub mod extract;
pub mod model;
pub mod projector;
pub mod session;
pub mod viewer;

pub use error::{Result, ViewerError};
