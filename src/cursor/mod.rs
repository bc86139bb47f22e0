//! Partitioning of one shared execution trace into per-frame slices.

mod frame;
mod push;

pub use frame::{EditorMode, FrameKind, LockingType};
pub use push::{encode_data_push, wrap_in_push};

use crate::error::{Result, ViewerError};
use crate::extract::{ExtractionRequest, ExtractionResult, SampleExtractor};
use crate::model::{EvaluationSample, ProgramState, ReductionNode};

/// States run by redemption-script bookkeeping, never shown.
pub const REDEMPTION_STATES: usize = 5;

/// The states a frame claimed and the offset its instruction pointers are
/// relative to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSlice {
    pub states: Vec<ProgramState>,
    pub ip_offset: usize,
}

/// Walks the trace left to right, handing each frame the states not yet
/// claimed by an earlier frame.
#[derive(Debug, Clone)]
pub struct TraceCursor {
    mode: EditorMode,
    remaining: Vec<ProgramState>,
    last_tested_state: Option<ProgramState>,
    ip_offset: usize,
}

impl TraceCursor {
    pub fn new(trace: Vec<ProgramState>, mode: EditorMode) -> Self {
        Self {
            mode,
            remaining: trace,
            last_tested_state: None,
            ip_offset: 0,
        }
    }

    pub fn remaining(&self) -> &[ProgramState] {
        &self.remaining
    }

    /// Takes every remaining state for a frame of `kind`, trimming states
    /// with no source line and restoring the implicit initial state of an
    /// unpushed check script.
    pub fn claim(&mut self, kind: FrameKind, frame: &str) -> Result<FrameSlice> {
        let mut states = std::mem::take(&mut self.remaining);
        let boilerplate = self.mode.locking_type().has_redemption_boilerplate();

        match kind {
            FrameKind::Isolated | FrameKind::Locking | FrameKind::Tested if boilerplate => {
                // the virtual empty unlocking script of an isolated script
                let skipped = usize::from(kind == FrameKind::Isolated) + REDEMPTION_STATES;
                states.drain(..skipped.min(states.len()));
                log::debug!("{}: skipped {} boilerplate states", frame, skipped);
            }
            FrameKind::TestCheck if !self.mode.is_pushed() => {
                if !states.is_empty() {
                    let tested = self.last_tested_state.as_ref().ok_or_else(|| {
                        ViewerError::MissingTestedState {
                            frame: frame.to_string(),
                        }
                    })?;
                    states.insert(0, tested.clone());
                    self.ip_offset = tested.ip;
                    log::debug!(
                        "{}: restored initial state, instruction pointers offset by {}",
                        frame,
                        self.ip_offset
                    );
                }
            }
            FrameKind::Isolated
            | FrameKind::Locking
            | FrameKind::Tested
            | FrameKind::TestCheck
            | FrameKind::Unlocking
            | FrameKind::TestSetup => {}
        }

        Ok(FrameSlice {
            states,
            ip_offset: self.ip_offset,
        })
    }

    /// Hands the states the frame did not match to the next frame.
    pub fn advance(
        &mut self,
        kind: FrameKind,
        samples: &[EvaluationSample],
        unmatched_states: Vec<ProgramState>,
    ) {
        self.remaining = unmatched_states;
        if kind == FrameKind::Tested {
            if let Some(last) = samples.last() {
                self.last_tested_state = Some(last.state.clone());
            }
        }
    }

    /// Claims, extracts and advances for one frame.
    pub fn evaluate<E: SampleExtractor + ?Sized>(
        &mut self,
        kind: FrameKind,
        frame: &str,
        reduction: &ReductionNode,
        extractor: &E,
    ) -> Result<(usize, ExtractionResult)> {
        let slice = self.claim(kind, frame)?;
        let wrapped;
        let root = if kind == FrameKind::Tested && self.mode.is_pushed() {
            wrapped = wrap_in_push(reduction);
            &wrapped
        } else {
            reduction
        };

        let mut extraction = extractor.extract(ExtractionRequest {
            evaluation_range: reduction.range,
            ip_offset: slice.ip_offset,
            nodes: root.children(),
            trace: &slice.states,
        });
        log::debug!(
            "{}: {} samples from {} states, {} left for later frames",
            frame,
            extraction.samples.len(),
            slice.states.len(),
            extraction.unmatched_states.len()
        );

        let unmatched = std::mem::take(&mut extraction.unmatched_states);
        self.advance(kind, &extraction.samples, unmatched);
        Ok((slice.ip_offset, extraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Range;

    fn trace(ips: &[usize]) -> Vec<ProgramState> {
        ips.iter()
            .map(|&ip| ProgramState {
                ip,
                ..Default::default()
            })
            .collect()
    }

    fn ips(states: &[ProgramState]) -> Vec<usize> {
        states.iter().map(|state| state.ip).collect()
    }

    fn sample(ip: usize) -> EvaluationSample {
        EvaluationSample {
            state: ProgramState {
                ip,
                ..Default::default()
            },
            range: Range::new(1, 1, 1, 2),
            evaluation_range: Range::new(1, 1, 1, 2),
            iterations: None,
        }
    }

    #[test]
    fn standard_pairs_claim_everything() {
        let mut cursor = TraceCursor::new(
            trace(&[0, 1, 2, 0, 1]),
            EditorMode::ScriptPair {
                locking_type: LockingType::Standard,
            },
        );
        let slice = cursor.claim(FrameKind::Unlocking, "unlock").unwrap();
        assert_eq!(ips(&slice.states), vec![0, 1, 2, 0, 1]);
        assert_eq!(slice.ip_offset, 0);
        assert!(cursor.remaining().is_empty());

        cursor.advance(FrameKind::Unlocking, &[], trace(&[0, 1]));
        let slice = cursor.claim(FrameKind::Locking, "lock").unwrap();
        assert_eq!(ips(&slice.states), vec![0, 1]);
    }

    #[test]
    fn redemption_boilerplate_is_trimmed_from_locking_frames() {
        let mode = EditorMode::ScriptPair {
            locking_type: LockingType::P2sh32,
        };
        let mut cursor = TraceCursor::new(trace(&[0, 1, 2, 3, 0, 0, 1, 2]), mode);
        let slice = cursor.claim(FrameKind::Locking, "lock").unwrap();
        assert_eq!(ips(&slice.states), vec![0, 1, 2]);
    }

    #[test]
    fn isolated_frames_also_skip_the_virtual_unlocking_state() {
        let mut cursor = TraceCursor::new(trace(&[9, 0, 1, 2, 3, 0, 0, 1]), EditorMode::Isolated);
        let slice = cursor.claim(FrameKind::Isolated, "isolated").unwrap();
        assert_eq!(ips(&slice.states), vec![0, 1]);
    }

    #[test]
    fn short_traces_trim_to_nothing() {
        let mut cursor = TraceCursor::new(trace(&[0, 1]), EditorMode::Isolated);
        let slice = cursor.claim(FrameKind::Isolated, "isolated").unwrap();
        assert!(slice.states.is_empty());
    }

    #[test]
    fn check_frames_start_from_the_tested_frames_final_state() {
        let mode = EditorMode::TestedScript { pushed: false };
        let mut cursor = TraceCursor::new(Vec::new(), mode);
        cursor.advance(FrameKind::Tested, &[sample(0), sample(9)], trace(&[10, 11]));

        let slice = cursor.claim(FrameKind::TestCheck, "check").unwrap();
        assert_eq!(ips(&slice.states), vec![9, 10, 11]);
        assert_eq!(slice.ip_offset, 9);
    }

    #[test]
    fn pushed_check_frames_are_not_shifted() {
        let mode = EditorMode::TestedScript { pushed: true };
        let mut cursor = TraceCursor::new(Vec::new(), mode);
        cursor.advance(FrameKind::Tested, &[sample(1)], trace(&[2, 3]));

        let slice = cursor.claim(FrameKind::TestCheck, "check").unwrap();
        assert_eq!(ips(&slice.states), vec![2, 3]);
        assert_eq!(slice.ip_offset, 0);
    }

    #[test]
    fn check_frame_without_tested_state_is_an_invariant_violation() {
        let mode = EditorMode::TestedScript { pushed: false };
        let mut cursor = TraceCursor::new(trace(&[4, 5]), mode);
        let err = cursor.claim(FrameKind::TestCheck, "check").unwrap_err();
        assert!(matches!(err, ViewerError::MissingTestedState { ref frame } if frame == "check"));
    }

    #[test]
    fn exhausted_trace_needs_no_tested_state() {
        let mode = EditorMode::TestedScript { pushed: false };
        let mut cursor = TraceCursor::new(Vec::new(), mode);
        let slice = cursor.claim(FrameKind::TestCheck, "check").unwrap();
        assert!(slice.states.is_empty());
    }
}
