//! Projection of one frame's samples onto its source lines.

mod evaluations;
mod lines;
mod loops;

pub use lines::{Highlight, LoopMarker, Spacer, ViewerLine};

use crate::model::EvaluationSample;
use evaluations::EvaluationTree;
use lines::execution_spacers;
use loops::{discover_loops, resolve_loops, SampleView};
use std::collections::BTreeMap;

/// The lines of one frame together with its loop navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub lines: Vec<ViewerLine>,
    /// One marker per loop, in discovery order.
    pub loops: Vec<LoopMarker>,
    /// Set once any sample reported an execution error.
    pub has_error: bool,
}

struct LineEntry<'a> {
    sample: &'a EvaluationSample,
    view: Option<&'a SampleView>,
    spacers: Option<Vec<Spacer>>,
}

impl LineEntry<'_> {
    fn active_loops(&self) -> &[usize] {
        self.view.map_or(&[][..], |view| view.active_loops.as_slice())
    }

    fn state_offset(&self) -> usize {
        self.view.map_or(0, |view| view.state_offset)
    }
}

/// Produces one line per source line number in `0..total_lines`.
///
/// `samples` must be ordered by ending position. `loop_viewing_indexes`
/// holds the iteration to show for each loop in discovery order; missing or
/// stale entries show the first iteration.
pub fn samples_to_evaluation_lines(
    samples: &[EvaluationSample],
    total_lines: usize,
    loop_viewing_indexes: &[usize],
) -> Vec<ViewerLine> {
    project(samples, total_lines, loop_viewing_indexes).lines
}

/// Like [`samples_to_evaluation_lines`], also reporting loops and errors.
pub fn project(
    samples: &[EvaluationSample],
    total_lines: usize,
    loop_viewing_indexes: &[usize],
) -> Projection {
    if samples.is_empty() {
        return Projection::default();
    }
    debug_assert!(
        samples
            .windows(2)
            .all(|pair| pair[0].range.end() <= pair[1].range.end()),
        "samples must be ordered by ending position"
    );

    let evaluations = EvaluationTree::build(samples);
    let mut loops = discover_loops(samples);
    let views = resolve_loops(samples, &mut loops, loop_viewing_indexes);

    let mut has_error = false;
    let mut entries: BTreeMap<usize, LineEntry> = BTreeMap::new();
    // line 0 always shows the frame's initial state
    entries.insert(
        0,
        LineEntry {
            sample: &samples[0],
            view: None,
            spacers: None,
        },
    );

    for (sample, view) in samples.iter().zip(&views) {
        let spacers = if has_error {
            Vec::new()
        } else {
            let mut spacers = evaluations.spacers_for(&sample.evaluation_range).to_vec();
            spacers.extend(execution_spacers(&sample.state.control_stack));
            spacers
        };
        if !has_error && sample.state.has_error() {
            log::debug!(
                "execution error at line {}: {}",
                sample.range.end_line,
                sample.state.error.as_deref().unwrap_or_default()
            );
            has_error = true;
        }

        let line = sample.range.end_line;
        if line == 0 {
            continue;
        }
        entries.insert(
            line,
            LineEntry {
                sample,
                view: Some(view),
                spacers: Some(spacers),
            },
        );
    }

    let mut lines = Vec::with_capacity(total_lines);
    let mut line_loops: Vec<&[usize]> = Vec::with_capacity(total_lines);
    for line_number in 0..total_lines {
        let Some((&defined_at, entry)) = entries.range(..=line_number).next_back() else {
            lines.push(ViewerLine::default());
            line_loops.push(&[]);
            continue;
        };
        let state = if defined_at == line_number {
            let state = entry.sample.state_at(entry.state_offset()).cloned();
            if state.is_none() {
                log::warn!(
                    "line {}: no state captured at iteration offset {}",
                    line_number,
                    entry.state_offset()
                );
            }
            state
        } else {
            None
        };
        lines.push(ViewerLine {
            state,
            spacers: entry.spacers.clone(),
            highlight: None,
        });
        line_loops.push(entry.active_loops());
    }

    let mut marked = vec![false; loops.len()];
    for (line, active_loops) in lines.iter_mut().zip(&line_loops) {
        let Some(spacers) = line.spacers.as_mut() else {
            continue;
        };
        // innermost loop owns the rightmost loop spacer
        let mut loop_spacers = spacers
            .iter()
            .enumerate()
            .filter(|(_, spacer)| **spacer == Spacer::Loop)
            .map(|(position, _)| position)
            .collect::<Vec<_>>();
        for &loop_index in active_loops.iter().rev() {
            let Some(position) = loop_spacers.pop() else {
                break;
            };
            if !marked[loop_index] {
                spacers[position] = Spacer::LoopMarker(loops[loop_index].marker(loop_index));
                marked[loop_index] = true;
            }
        }
    }

    if has_error {
        for line in lines.iter_mut().filter(|line| line.state.is_none()) {
            *line = ViewerLine::default();
        }
    }

    Projection {
        lines,
        loops: loops
            .iter()
            .enumerate()
            .map(|(index, descriptor)| descriptor.marker(index))
            .collect(),
        has_error,
    }
}
