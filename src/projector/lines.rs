use crate::model::{ControlEntry, ProgramState};
use serde::{Deserialize, Serialize};

/// Navigation data for one loop, shown on the first line the loop reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopMarker {
    pub loop_index: usize,
    pub iteration_index: usize,
    pub maximum_iteration_index: usize,
}

/// One level of indentation drawn in front of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Spacer {
    /// Entered a nested evaluation.
    Evaluation,
    Loop,
    ExecutedConditional,
    SkippedConditional,
    /// Replaces the `Loop` tag on the line where a loop is first shown.
    LoopMarker(LoopMarker),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    Success,
}

/// The display model of one source line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ProgramState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacers: Option<Vec<Spacer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

impl ViewerLine {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.spacers.is_none() && self.highlight.is_none()
    }

    pub fn loop_markers(&self) -> impl Iterator<Item = &LoopMarker> {
        self.spacers.iter().flatten().filter_map(|spacer| match spacer {
            Spacer::LoopMarker(marker) => Some(marker),
            _ => None,
        })
    }
}

pub(crate) fn execution_spacers(control_stack: &[ControlEntry]) -> impl Iterator<Item = Spacer> + '_ {
    control_stack.iter().map(|entry| match entry {
        ControlEntry::LoopStart(_) => Spacer::Loop,
        ControlEntry::Conditional(true) => Spacer::ExecutedConditional,
        ControlEntry::Conditional(false) => Spacer::SkippedConditional,
    })
}
