use super::render::StackLabels;
use super::selection::LoopSelection;
use crate::error::{Result, ViewerError};
use crate::extract::{InstructionExtractor, SampleExtractor};
use crate::session::{compute_frames, EditorFrame, Session};

/// A loaded session plus the user's loop selection, with the frames
/// computed for that selection kept until either changes.
pub struct ViewerContext<E = InstructionExtractor> {
    session: Session,
    selection: LoopSelection,
    extractor: E,
    frames: Option<Vec<EditorFrame>>,
}

impl ViewerContext<InstructionExtractor> {
    pub fn new(session: Session) -> Self {
        Self::with_extractor(session, InstructionExtractor)
    }
}

impl<E: SampleExtractor> ViewerContext<E> {
    pub fn with_extractor(session: Session, extractor: E) -> Self {
        Self {
            session,
            selection: LoopSelection::new(),
            extractor,
            frames: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn selection(&self) -> &LoopSelection {
        &self.selection
    }

    /// Replaces the session; the loop selection starts over.
    pub fn load(&mut self, session: Session) {
        self.session = session;
        self.selection.clear();
        self.frames = None;
    }

    pub fn set_selection(&mut self, selection: LoopSelection) {
        if selection != self.selection {
            self.selection = selection;
            self.frames = None;
        }
    }

    /// Returns `false` if the iteration was already shown.
    pub fn set_loop_iteration(&mut self, loop_index: usize, iteration: usize) -> bool {
        let changed = self.selection.set(loop_index, iteration);
        if changed {
            self.frames = None;
        }
        changed
    }

    pub fn frames(&mut self) -> Result<&[EditorFrame]> {
        let frames = match self.frames.take() {
            Some(frames) => frames,
            None => {
                log::debug!(
                    "computing frames for loop selection {:?}",
                    self.selection.as_slice()
                );
                compute_frames(&self.session, self.selection.as_slice(), &self.extractor)?
            }
        };
        Ok(self.frames.insert(frames).as_slice())
    }

    pub fn frame(&mut self, index: usize) -> Result<&EditorFrame> {
        let frames = self.frames()?;
        let count = frames.len();
        frames
            .get(index)
            .ok_or(ViewerError::FrameOutOfRange { index, count })
    }

    /// The session's identifiers merged with every label the extractor
    /// found.
    pub fn labels(&mut self) -> Result<StackLabels> {
        let mut labels = StackLabels::new();
        labels.extend(&self.session.identifiers);
        for frame in self.frames()? {
            labels.extend(&frame.labeled_stack_items);
        }
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session::from_json(
            &json!({
                "mode": { "type": "isolated" },
                "frames": [{
                    "id": "main",
                    "name": "main",
                    "kind": "isolated",
                    "lastSourceLine": 1,
                    "reduction": {
                        "bytecode": "51",
                        "range": { "startLineNumber": 1, "startColumn": 1, "endLineNumber": 1, "endColumn": 5 },
                        "script": [{
                            "bytecode": "51",
                            "range": { "startLineNumber": 1, "startColumn": 1, "endLineNumber": 1, "endColumn": 5 }
                        }]
                    }
                }],
                "trace": [{ "ip": 0 }, { "ip": 0 }, { "ip": 1 }, { "ip": 2 }, { "ip": 3 }, { "ip": 4 }, { "ip": 0 }, { "ip": 1, "stack": ["01"] }],
                "identifiers": [{ "label": "answer", "value": "2a" }]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn frames_are_reused_until_the_selection_changes() {
        let mut context = ViewerContext::new(session());
        let first = context.frames().unwrap().as_ptr();
        assert_eq!(context.frames().unwrap().as_ptr(), first);

        assert!(!context.set_loop_iteration(0, 0));
        assert_eq!(context.frames().unwrap().as_ptr(), first);

        assert!(context.set_loop_iteration(0, 1));
        assert!(context.frames.is_none());
        assert_eq!(context.frames().unwrap().len(), 1);
    }

    #[test]
    fn isolated_frames_skip_boilerplate_states() {
        let mut context = ViewerContext::new(session());
        let frame = context.frame(0).unwrap();
        assert_eq!(frame.samples.len(), 2);
        assert_eq!(frame.samples[1].state.stack, vec![vec![1]]);
    }

    #[test]
    fn out_of_range_frames_are_reported() {
        let mut context = ViewerContext::new(session());
        let err = context.frame(3).unwrap_err();
        assert!(matches!(err, ViewerError::FrameOutOfRange { index: 3, count: 1 }));
    }

    #[test]
    fn identifiers_label_stack_items() {
        let mut context = ViewerContext::new(session());
        let labels = context.labels().unwrap();
        assert_eq!(labels.get(&[0x2a]), Some("answer"));
    }
}
