use super::lines::{execution_spacers, Spacer};
use crate::model::{EvaluationSample, Range};
use std::collections::HashMap;

/// An evaluation is identified by the position where it begins.
type EvaluationId = (usize, usize);

struct Evaluation<'a> {
    range: Range,
    latest_sample: &'a EvaluationSample,
    spacers: Vec<Spacer>,
}

/// The evaluations found in one frame's samples, in discovery order.
pub(crate) struct EvaluationTree<'a> {
    evaluations: Vec<Evaluation<'a>>,
    by_start: HashMap<EvaluationId, usize>,
}

impl<'a> EvaluationTree<'a> {
    pub fn build(samples: &'a [EvaluationSample]) -> Self {
        let mut tree = Self {
            evaluations: Vec::new(),
            by_start: HashMap::new(),
        };
        for sample in samples {
            tree.observe(sample);
        }
        tree
    }

    fn observe(&mut self, sample: &'a EvaluationSample) {
        let id = sample.evaluation_range.start();
        if let Some(&index) = self.by_start.get(&id) {
            self.evaluations[index].latest_sample = sample;
            return;
        }

        let mut spacers = match self.direct_parent(&sample.evaluation_range) {
            None => Vec::new(),
            Some(parent) => {
                let parent = &self.evaluations[parent];
                let mut spacers = parent.spacers.clone();
                spacers.extend(execution_spacers(
                    &parent.latest_sample.state.control_stack,
                ));
                spacers.push(Spacer::Evaluation);
                spacers
            }
        };
        spacers.extend(execution_spacers(&sample.state.control_stack));

        log::trace!(
            "evaluation #{} opened at {:?} with depth {}",
            self.evaluations.len(),
            id,
            spacers.len()
        );
        self.by_start.insert(id, self.evaluations.len());
        self.evaluations.push(Evaluation {
            range: sample.evaluation_range,
            latest_sample: sample,
            spacers,
        });
    }

    /// Samples arrive sorted, so the last containing evaluation is the
    /// innermost one still open.
    fn direct_parent(&self, range: &Range) -> Option<usize> {
        debug_assert!(
            !self
                .evaluations
                .iter()
                .any(|evaluation| evaluation.range.partially_overlaps(range)),
            "evaluation ranges must nest: {:?} overlaps an earlier evaluation",
            range
        );
        self.evaluations
            .iter()
            .rposition(|evaluation| evaluation.range.contains(range))
    }

    /// Indentation inherited by every line of the evaluation `range` opens.
    pub fn spacers_for(&self, range: &Range) -> &[Spacer] {
        self.by_start
            .get(&range.start())
            .map_or(&[][..], |&index| self.evaluations[index].spacers.as_slice())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.evaluations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ControlEntry, ProgramState};

    fn sample(evaluation_range: Range, control_stack: Vec<ControlEntry>, end_line: usize) -> EvaluationSample {
        EvaluationSample {
            state: ProgramState {
                control_stack,
                ..Default::default()
            },
            range: Range::new(end_line, 1, end_line, 5),
            evaluation_range,
            iterations: None,
        }
    }

    #[test]
    fn root_evaluation_has_no_entry_marker() {
        let root = Range::new(1, 1, 5, 1);
        let samples = vec![sample(root, vec![], 1), sample(root, vec![], 2)];
        let tree = EvaluationTree::build(&samples);
        assert_eq!(tree.len(), 1);
        assert!(tree.spacers_for(&root).is_empty());
    }

    #[test]
    fn nested_evaluation_inherits_parent_markers() {
        let root = Range::new(1, 1, 9, 1);
        let nested = Range::new(3, 2, 4, 8);
        let samples = vec![
            sample(root, vec![], 1),
            sample(root, vec![ControlEntry::Conditional(true)], 2),
            sample(nested, vec![], 3),
            sample(root, vec![ControlEntry::Conditional(true)], 5),
        ];
        let tree = EvaluationTree::build(&samples);
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.spacers_for(&nested),
            &[Spacer::ExecutedConditional, Spacer::Evaluation]
        );
    }

    #[test]
    fn doubly_nested_evaluations_stack_entry_markers() {
        let root = Range::new(1, 1, 9, 1);
        let outer = Range::new(2, 1, 6, 1);
        let inner = Range::new(3, 1, 4, 1);
        let samples = vec![
            sample(root, vec![], 1),
            sample(outer, vec![], 2),
            sample(inner, vec![], 3),
        ];
        let tree = EvaluationTree::build(&samples);
        assert_eq!(
            tree.spacers_for(&inner),
            &[Spacer::Evaluation, Spacer::Evaluation]
        );
    }

    #[test]
    fn markers_are_fixed_at_first_discovery() {
        let root = Range::new(1, 1, 9, 1);
        let samples = vec![
            sample(root, vec![], 1),
            sample(root, vec![ControlEntry::LoopStart(3)], 2),
        ];
        let tree = EvaluationTree::build(&samples);
        assert!(tree.spacers_for(&root).is_empty());
    }
}
