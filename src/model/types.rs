use super::Range;
use serde::{Deserialize, Serialize};

/// One entry of a program state's control stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlEntry {
    /// Instruction pointer at which an open loop begins.
    LoopStart(usize),
    /// Whether the enclosing conditional branch is being executed.
    Conditional(bool),
}

/// A snapshot of the virtual machine after one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramState {
    #[serde(alias = "instructionPointer")]
    pub ip: usize,
    #[serde(default)]
    pub control_stack: Vec<ControlEntry>,
    #[serde(default, with = "super::bytes::list")]
    pub stack: Vec<Vec<u8>>,
    #[serde(default, with = "super::bytes::list")]
    pub alternate_stack: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgramState {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The loop opened most recently, if it is the innermost control entry.
    pub fn innermost_loop(&self) -> Option<usize> {
        match self.control_stack.last() {
            Some(ControlEntry::LoopStart(ip)) => Some(*ip),
            _ => None,
        }
    }
}

/// A program state attributed to the source construct that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSample {
    pub state: ProgramState,
    pub range: Range,
    pub evaluation_range: Range,
    /// States captured after each repetition beyond the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<Vec<ProgramState>>,
}

impl EvaluationSample {
    /// Number of captured states for one full traversal of this sample.
    pub fn iteration_state_count(&self) -> usize {
        1 + self.iterations.as_ref().map_or(0, Vec::len)
    }

    /// The state captured at `offset` in execution order (0 is `state`).
    pub fn state_at(&self, offset: usize) -> Option<&ProgramState> {
        match offset {
            0 => Some(&self.state),
            n => self.iterations.as_ref().and_then(|it| it.get(n - 1)),
        }
    }
}

/// A node of the compiler's reduction tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionNode {
    #[serde(with = "super::bytes")]
    pub bytecode: Vec<u8>,
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Vec<ReductionNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<Box<ReductionNode>>,
    /// Present when this node was produced by compiling a referenced script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Box<ReductionNode>>,
}

impl ReductionNode {
    pub fn leaf(bytecode: Vec<u8>, range: Range) -> Self {
        Self {
            bytecode,
            range,
            script: None,
            push: None,
            source: None,
        }
    }

    pub fn children(&self) -> &[ReductionNode] {
        self.script.as_deref().unwrap_or(&[])
    }
}

/// A stack item the extractor was able to name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackItemLabel {
    pub label: String,
    #[serde(with = "super::bytes")]
    pub value: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn control_entries_decode_from_numbers_and_booleans() {
        let state: ProgramState = serde_json::from_value(json!({
            "ip": 4,
            "controlStack": [2, true, false],
            "stack": ["", "0x01", "ab"],
        }))
        .unwrap();
        assert_eq!(
            state.control_stack,
            vec![
                ControlEntry::LoopStart(2),
                ControlEntry::Conditional(true),
                ControlEntry::Conditional(false),
            ]
        );
        assert_eq!(state.stack, vec![vec![], vec![1], vec![0xab]]);
        assert!(state.alternate_stack.is_empty());
        assert!(!state.has_error());
        assert_eq!(state.innermost_loop(), None);
    }

    #[test]
    fn innermost_loop_only_reads_the_top_entry() {
        let state = ProgramState {
            control_stack: vec![ControlEntry::Conditional(true), ControlEntry::LoopStart(7)],
            ..Default::default()
        };
        assert_eq!(state.innermost_loop(), Some(7));
    }

    #[test]
    fn state_at_walks_iterations() {
        let state = |ip| ProgramState {
            ip,
            ..Default::default()
        };
        let sample = EvaluationSample {
            state: state(1),
            range: Range::new(1, 1, 1, 2),
            evaluation_range: Range::new(1, 1, 3, 1),
            iterations: Some(vec![state(2), state(3)]),
        };
        assert_eq!(sample.iteration_state_count(), 3);
        assert_eq!(sample.state_at(0).map(|s| s.ip), Some(1));
        assert_eq!(sample.state_at(2).map(|s| s.ip), Some(3));
        assert_eq!(sample.state_at(3), None);
    }

    #[test]
    fn reduction_nodes_nest_scripts() {
        let node: ReductionNode = serde_json::from_value(json!({
            "bytecode": "5152",
            "range": {"startLineNumber": 1, "startColumn": 1, "endLineNumber": 2, "endColumn": 4},
            "script": [
                {"bytecode": "51", "range": {"startLineNumber": 1, "startColumn": 1, "endLineNumber": 1, "endColumn": 4}},
                {"bytecode": "52", "range": {"startLineNumber": 2, "startColumn": 1, "endLineNumber": 2, "endColumn": 4}}
            ]
        }))
        .unwrap();
        assert_eq!(node.children().len(), 2);
        assert!(node.children()[0].children().is_empty());
        assert_eq!(node.children()[1].bytecode, vec![0x52]);
    }
}
