use super::{FrameScript, Session};
use crate::cursor::{FrameKind, TraceCursor};
use crate::error::{Result, ViewerError};
use crate::extract::SampleExtractor;
use crate::model::{EvaluationSample, StackItemLabel};
use crate::projector::{project, Highlight, LoopMarker, ViewerLine};
use serde::Serialize;

/// Everything the viewer shows for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorFrame {
    pub script_id: String,
    pub name: String,
    pub kind: FrameKind,
    pub ip_offset: usize,
    pub samples: Vec<EvaluationSample>,
    /// One line per source line plus two, empty until the trace is known.
    pub lines: Vec<ViewerLine>,
    pub loops: Vec<LoopMarker>,
    pub labeled_stack_items: Vec<StackItemLabel>,
    pub has_error: bool,
}

impl EditorFrame {
    fn pending(script: &FrameScript) -> Self {
        Self {
            script_id: script.id.clone(),
            name: script.name.clone(),
            kind: script.kind,
            ip_offset: 0,
            samples: Vec::new(),
            lines: Vec::new(),
            loops: Vec::new(),
            labeled_stack_items: Vec::new(),
            has_error: false,
        }
    }
}

/// Splits the session's trace between its frames and projects each frame's
/// samples onto its lines.
///
/// `loop_viewing_indexes` is shared by all frames. Without a trace every
/// frame is returned without samples or lines.
pub fn compute_frames<E: SampleExtractor + ?Sized>(
    session: &Session,
    loop_viewing_indexes: &[usize],
    extractor: &E,
) -> Result<Vec<EditorFrame>> {
    let Some(trace) = &session.trace else {
        log::debug!("no trace yet, {} frames pending", session.frames.len());
        return Ok(session.frames.iter().map(EditorFrame::pending).collect());
    };

    let mut cursor = TraceCursor::new(trace.clone(), session.mode);
    let mut frames = Vec::with_capacity(session.frames.len());
    for script in &session.frames {
        let reduction =
            script
                .reduction
                .as_ref()
                .ok_or_else(|| ViewerError::MissingReduction {
                    frame: script.name.clone(),
                })?;

        let (ip_offset, extraction) =
            cursor.evaluate(script.kind, &script.name, reduction, extractor)?;
        let projection = project(
            &extraction.samples,
            script.last_source_line + 2,
            loop_viewing_indexes,
        );

        frames.push(EditorFrame {
            ip_offset,
            samples: extraction.samples,
            lines: projection.lines,
            loops: projection.loops,
            labeled_stack_items: extraction.labeled_stack_items,
            has_error: projection.has_error,
            ..EditorFrame::pending(script)
        });
    }

    if !cursor.remaining().is_empty() {
        log::warn!(
            "{} trace states were not claimed by any frame",
            cursor.remaining().len()
        );
    }
    if session.expects_success() && session.passed() {
        highlight_success(&mut frames);
    }
    Ok(frames)
}

fn highlight_success(frames: &mut [EditorFrame]) {
    let last_line = frames
        .last_mut()
        .and_then(|frame| frame.lines.iter_mut().rfind(|line| line.state.is_some()));
    if let Some(line) = last_line {
        line.highlight = Some(Highlight::Success);
    }
}
