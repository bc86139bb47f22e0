use super::lines::LoopMarker;
use crate::model::{ControlEntry, EvaluationSample, ProgramState, Range};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Loops are identified by their evaluation's start and the loop's start ip.
type LoopKey = (usize, usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoopDescriptor {
    pub evaluation_range: Range,
    /// Instruction pointer the loop jumps back to.
    pub loop_start: usize,
    pub begins_at: usize,
    pub ends_at: usize,
    /// States captured for one full traversal of the opening sample.
    pub iteration_state_count: usize,
    pub viewing_iteration: usize,
    pub maximum_iteration_index: usize,
}

impl LoopDescriptor {
    pub fn marker(&self, loop_index: usize) -> LoopMarker {
        LoopMarker {
            loop_index,
            iteration_index: self.viewing_iteration,
            maximum_iteration_index: self.maximum_iteration_index,
        }
    }

    fn iterations_per_parent(&self) -> usize {
        self.maximum_iteration_index + 1
    }
}

/// Per-sample loop bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SampleView {
    /// Loops covering the sample, outermost first.
    pub active_loops: Vec<usize>,
    /// Index into the sample's states (`state` followed by `iterations`).
    pub state_offset: usize,
}

/// Finds every loop in discovery order. Discovery order is the index space
/// of the caller's loop viewing indexes.
pub(crate) fn discover_loops(samples: &[EvaluationSample]) -> Vec<LoopDescriptor> {
    let mut loops: Vec<LoopDescriptor> = Vec::new();
    let mut by_key: HashMap<LoopKey, usize> = HashMap::new();

    for (index, sample) in samples.iter().enumerate() {
        let Some(loop_start) = sample.state.innermost_loop() else {
            continue;
        };
        let (line, column) = sample.evaluation_range.start();
        match by_key.entry((line, column, loop_start)) {
            Entry::Occupied(existing) => {
                loops[*existing.get()].ends_at = index;
            }
            Entry::Vacant(slot) => {
                slot.insert(loops.len());
                loops.push(LoopDescriptor {
                    evaluation_range: sample.evaluation_range,
                    loop_start,
                    begins_at: index,
                    ends_at: index + 1,
                    iteration_state_count: sample.iteration_state_count(),
                    viewing_iteration: 0,
                    maximum_iteration_index: 0,
                });
            }
        }
    }

    loops
}

/// Marks loop membership, derives each loop's maximum iteration index,
/// applies the requested iterations (resetting stale ones to 0) and returns
/// the state offset every sample should display.
pub(crate) fn resolve_loops(
    samples: &[EvaluationSample],
    loops: &mut [LoopDescriptor],
    loop_viewing_indexes: &[usize],
) -> Vec<SampleView> {
    let mut views = vec![SampleView::default(); samples.len()];
    let last_sample = samples.len().saturating_sub(1);

    for (loop_index, descriptor) in loops.iter().enumerate() {
        for index in descriptor.begins_at..=descriptor.ends_at.min(last_sample) {
            let sample = &samples[index];
            if sample.evaluation_range == descriptor.evaluation_range
                && stack_position(&sample.state, descriptor.loop_start).is_some()
            {
                views[index].active_loops.push(loop_index);
            }
        }
    }
    for (view, sample) in views.iter_mut().zip(samples) {
        view.active_loops.sort_by_key(|&loop_index| {
            stack_position(&sample.state, loops[loop_index].loop_start)
        });
    }

    for loop_index in 0..loops.len() {
        let parent = enclosing_loop(&views[loops[loop_index].begins_at].active_loops, loop_index);
        let count = loops[loop_index].iteration_state_count;
        let per_parent = match parent {
            None => count,
            Some(parent) => {
                let parent_count = loops[parent].iteration_state_count;
                debug_assert!(
                    count % parent_count == 0,
                    "loop {} captured {} states, not a multiple of its parent's {}",
                    loop_index,
                    count,
                    parent_count
                );
                if count % parent_count != 0 {
                    log::warn!(
                        "loop {} captured {} states across {} parent iterations",
                        loop_index,
                        count,
                        parent_count
                    );
                }
                count / parent_count
            }
        };
        loops[loop_index].maximum_iteration_index = per_parent.saturating_sub(1);
    }

    for loop_index in 0..loops.len() {
        let requested = loop_viewing_indexes.get(loop_index).copied().unwrap_or(0);
        loops[loop_index].viewing_iteration = requested;

        let begins_at = loops[loop_index].begins_at;
        let offset = state_offset(&views[begins_at].active_loops, loops);
        let available = requested <= loops[loop_index].maximum_iteration_index
            && samples[begins_at].state_at(offset).is_some();
        if !available {
            log::debug!(
                "loop {}: iteration {} is not available, showing iteration 0",
                loop_index,
                requested
            );
            loops[loop_index].viewing_iteration = 0;
        }
    }

    for view in &mut views {
        view.state_offset = state_offset(&view.active_loops, loops);
    }

    views
}

/// Where the loop starting at `loop_start` sits in the control stack; a sample
/// only belongs to loops it is still inside of.
fn stack_position(state: &ProgramState, loop_start: usize) -> Option<usize> {
    state
        .control_stack
        .iter()
        .position(|entry| *entry == ControlEntry::LoopStart(loop_start))
}

fn enclosing_loop(active_loops: &[usize], loop_index: usize) -> Option<usize> {
    let position = active_loops.iter().position(|&active| active == loop_index)?;
    position.checked_sub(1).map(|parent| active_loops[parent])
}

/// Flattens the viewed iteration of each active loop into one offset. The
/// innermost loop varies fastest, matching execution order.
fn state_offset(active_loops: &[usize], loops: &[LoopDescriptor]) -> usize {
    let mut offset = 0;
    let mut multiple = 1;
    for &loop_index in active_loops.iter().rev() {
        let descriptor = &loops[loop_index];
        offset += multiple * descriptor.viewing_iteration;
        multiple *= descriptor.iterations_per_parent();
    }
    offset
}
