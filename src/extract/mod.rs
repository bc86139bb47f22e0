//! The seam between trace partitioning and sample extraction.

mod instructions;

pub use instructions::InstructionExtractor;

use crate::model::{EvaluationSample, ProgramState, Range, ReductionNode, StackItemLabel};

/// One frame's share of the trace together with the reduction it produced.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    /// Range of the whole script; every returned sample belongs to it or to
    /// an evaluation nested inside it.
    pub evaluation_range: Range,
    /// Instruction pointers in `trace` are relative to this value.
    pub ip_offset: usize,
    pub nodes: &'a [ReductionNode],
    pub trace: &'a [ProgramState],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Sorted by ending position.
    pub samples: Vec<EvaluationSample>,
    /// States after the end of this frame, in trace order.
    pub unmatched_states: Vec<ProgramState>,
    pub labeled_stack_items: Vec<StackItemLabel>,
}

/// Attributes trace states to the source constructs that produced them.
pub trait SampleExtractor {
    fn extract(&self, request: ExtractionRequest<'_>) -> ExtractionResult;
}
