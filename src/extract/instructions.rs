use super::{ExtractionRequest, ExtractionResult, SampleExtractor};
use crate::model::{EvaluationSample, ProgramState, Range, ReductionNode};
use std::collections::HashMap;

/// Extractor for flat instruction lists: every leaf of the reduction is one
/// instruction, and a state's instruction pointer names the leaf that ran
/// last.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionExtractor;

fn collect_leaves<'a>(nodes: &'a [ReductionNode], leaves: &mut Vec<&'a ReductionNode>) {
    for node in nodes {
        match &node.script {
            Some(children) if node.push.is_none() => collect_leaves(children, leaves),
            _ => leaves.push(node),
        }
    }
}

fn sample(state: &ProgramState, range: Range, evaluation_range: Range) -> EvaluationSample {
    EvaluationSample {
        state: state.clone(),
        range,
        evaluation_range,
        iterations: None,
    }
}

impl SampleExtractor for InstructionExtractor {
    fn extract(&self, request: ExtractionRequest<'_>) -> ExtractionResult {
        let Some((initial, rest)) = request.trace.split_first() else {
            return ExtractionResult::default();
        };

        let mut leaves = Vec::new();
        collect_leaves(request.nodes, &mut leaves);

        let evaluation_range = request.evaluation_range;
        let mut samples = vec![sample(
            initial,
            evaluation_range.start_marker(),
            evaluation_range,
        )];
        let mut sample_for_leaf: HashMap<usize, usize> = HashMap::new();
        let mut last_range = evaluation_range.start_marker();
        let mut consumed = 1;

        for state in rest {
            let leaf = state
                .ip
                .checked_sub(request.ip_offset)
                .filter(|relative| (1..=leaves.len()).contains(relative))
                .map(|relative| relative - 1);

            if state.has_error() {
                // an error always gets its own sample so it is never hidden
                // behind an unselected loop iteration
                let range = leaf.map_or(last_range, |leaf| leaves[leaf].range);
                samples.push(sample(state, range, evaluation_range));
                consumed += 1;
                break;
            }
            let Some(leaf) = leaf else {
                break;
            };

            match sample_for_leaf.get(&leaf) {
                Some(&index) => samples[index]
                    .iterations
                    .get_or_insert_with(Vec::new)
                    .push(state.clone()),
                None => {
                    sample_for_leaf.insert(leaf, samples.len());
                    samples.push(sample(state, leaves[leaf].range, evaluation_range));
                }
            }
            last_range = leaves[leaf].range;
            consumed += 1;
        }

        log::debug!(
            "matched {} of {} states to {} instructions",
            consumed,
            request.trace.len(),
            leaves.len()
        );
        samples.sort_by(|a, b| a.range.cmp_by_end(&b.range));

        ExtractionResult {
            samples,
            unmatched_states: request.trace[consumed..].to_vec(),
            labeled_stack_items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ControlEntry;

    fn state(ip: usize) -> ProgramState {
        ProgramState {
            ip,
            ..Default::default()
        }
    }

    fn line(number: usize) -> ReductionNode {
        ReductionNode::leaf(vec![0x51], Range::new(number, 1, number, 5))
    }

    fn extract(nodes: &[ReductionNode], trace: &[ProgramState], ip_offset: usize) -> ExtractionResult {
        InstructionExtractor.extract(ExtractionRequest {
            evaluation_range: Range::new(1, 1, 3, 5),
            ip_offset,
            nodes,
            trace,
        })
    }

    #[test]
    fn states_are_attributed_to_the_instruction_that_ran_last() {
        let nodes = [line(1), line(2), line(3)];
        let result = extract(&nodes, &[state(0), state(1), state(2), state(3)], 0);

        let ends: Vec<usize> = result.samples.iter().map(|s| s.range.end_line).collect();
        assert_eq!(ends, vec![1, 1, 2, 3]);
        assert_eq!(result.samples[0].range, Range::new(1, 1, 1, 1));
        assert!(result.unmatched_states.is_empty());
    }

    #[test]
    fn the_next_scripts_initial_state_is_left_unmatched() {
        let nodes = [line(1), line(2)];
        let result = extract(&nodes, &[state(0), state(1), state(2), state(0), state(1)], 0);

        assert_eq!(result.samples.len(), 3);
        let rest: Vec<usize> = result.unmatched_states.iter().map(|s| s.ip).collect();
        assert_eq!(rest, vec![0, 1]);
    }

    #[test]
    fn instruction_pointers_are_read_relative_to_the_offset() {
        let nodes = [line(1), line(2)];
        let result = extract(&nodes, &[state(9), state(10), state(11)], 9);

        assert_eq!(result.samples.len(), 3);
        assert_eq!(result.samples[0].state.ip, 9);
        assert_eq!(result.samples[2].range.end_line, 2);
    }

    #[test]
    fn repeated_instructions_become_iterations() {
        let nodes = [line(1), line(2)];
        let mut repeated = state(2);
        repeated.control_stack = vec![ControlEntry::LoopStart(1)];
        let result = extract(&nodes, &[state(0), state(1), state(2), repeated.clone()], 0);

        assert_eq!(result.samples.len(), 3);
        assert_eq!(result.samples[2].iterations, Some(vec![repeated]));
    }

    #[test]
    fn nested_scripts_are_flattened_and_pushes_kept_whole() {
        let mut group = line(1);
        group.script = Some(vec![line(1), line(2)]);
        let mut push = line(3);
        push.script = Some(vec![line(3)]);
        push.push = Some(Box::new(line(3)));

        let result = extract(&[group, push], &[state(0), state(1), state(2), state(3)], 0);
        assert_eq!(result.samples.len(), 4);
        assert!(result.unmatched_states.is_empty());
    }

    #[test]
    fn an_error_is_the_last_state_consumed() {
        let nodes = [line(1), line(2), line(3)];
        let mut failed = state(2);
        failed.error = Some("failed verify".to_string());
        let result = extract(&nodes, &[state(0), state(1), failed, state(3)], 0);

        assert_eq!(result.samples.len(), 3);
        assert!(result.samples[2].state.has_error());
        assert_eq!(result.unmatched_states.len(), 1);
    }

    #[test]
    fn empty_slices_produce_nothing() {
        assert_eq!(extract(&[line(1)], &[], 0), ExtractionResult::default());
    }
}
