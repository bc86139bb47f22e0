//! Session documents: the compiled frames of one scenario and the trace
//! produced by evaluating them.

mod frames;

pub use frames::{compute_frames, EditorFrame};

use crate::cursor::{EditorMode, FrameKind};
use crate::error::{Result, ViewerError};
use crate::model::{ProgramState, ReductionNode, StackItemLabel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One compiled script participating in the evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameScript {
    pub id: String,
    pub name: String,
    pub kind: FrameKind,
    /// Absent while the script does not compile.
    #[serde(default)]
    pub reduction: Option<ReductionNode>,
    /// Highest source line number of the script.
    pub last_source_line: usize,
}

/// Result of verifying the evaluated scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerifyOutcome {
    /// Evaluation ran to completion; `true` when it left a valid result.
    Completed(bool),
    /// Evaluation was rejected with this message.
    Failed(String),
}

impl VerifyOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, VerifyOutcome::Completed(true))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub mode: EditorMode,
    pub frames: Vec<FrameScript>,
    /// Missing while the evaluation has not run.
    #[serde(default)]
    pub trace: Option<Vec<ProgramState>>,
    #[serde(default)]
    pub verify_result: Option<VerifyOutcome>,
    /// Whether the scenario is supposed to pass verification.
    #[serde(default)]
    pub expected_to_pass: Option<bool>,
    /// Names the user gave to values, shown in place of their bytes.
    #[serde(default)]
    pub identifiers: Vec<StackItemLabel>,
}

impl Session {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading session from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let session: Session = serde_json::from_str(contents)?;
        session.validate()?;
        Ok(session)
    }

    /// Frames must appear in the order the editor mode evaluates them.
    pub fn validate(&self) -> Result<()> {
        let expected = self.mode.evaluation_order();
        let found: Vec<FrameKind> = self.frames.iter().map(|frame| frame.kind).collect();
        if found != expected {
            return Err(ViewerError::FrameOrderMismatch {
                expected: join_kinds(expected),
                found: join_kinds(&found),
            });
        }
        Ok(())
    }

    /// Isolated scripts have no verifiable result, so nothing is expected
    /// of them unless stated.
    pub fn expects_success(&self) -> bool {
        self.expected_to_pass
            .unwrap_or(self.mode != EditorMode::Isolated)
    }

    pub fn passed(&self) -> bool {
        self.verify_result
            .as_ref()
            .is_some_and(VerifyOutcome::passed)
    }
}

fn join_kinds(kinds: &[FrameKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(kind: &str) -> serde_json::Value {
        json!({ "id": kind, "name": kind, "kind": kind, "lastSourceLine": 1 })
    }

    #[test]
    fn parses_a_script_pair() {
        let session = Session::from_json(
            &json!({
                "mode": { "type": "script-pair", "lockingType": "p2sh20" },
                "frames": [frame("unlocking"), frame("locking")],
                "verifyResult": true,
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(session.frames.len(), 2);
        assert!(session.trace.is_none());
        assert!(session.passed());
        assert!(session.expects_success());
    }

    #[test]
    fn failed_verification_carries_its_message() {
        let session = Session::from_json(
            &json!({
                "mode": { "type": "isolated" },
                "frames": [frame("isolated")],
                "verifyResult": "Unsatisfied verification",
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(
            session.verify_result,
            Some(VerifyOutcome::Failed("Unsatisfied verification".to_string()))
        );
        assert!(!session.passed());
        assert!(!session.expects_success());
    }

    #[test]
    fn frames_out_of_evaluation_order_are_rejected() {
        let err = Session::from_json(
            &json!({
                "mode": { "type": "tested-script" },
                "frames": [frame("tested"), frame("test-setup"), frame("test-check")],
            })
            .to_string(),
        )
        .unwrap_err();

        assert!(matches!(err, ViewerError::FrameOrderMismatch { .. }));
        assert!(err.to_string().contains("[test-setup, tested, test-check]"));
    }

    #[test]
    fn unknown_frame_kinds_fail_to_parse() {
        let err = Session::from_json(
            &json!({ "mode": { "type": "isolated" }, "frames": [frame("redeem")] }).to_string(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("redeem"));
    }
}
