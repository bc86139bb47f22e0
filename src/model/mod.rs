mod bytes;
mod range;
mod types;

pub use range::Range;
pub use types::{
    ControlEntry, EvaluationSample, ProgramState, ReductionNode, StackItemLabel,
};
