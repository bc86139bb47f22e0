use crate::model::{ProgramState, StackItemLabel};
use crate::projector::{Highlight, Spacer, ViewerLine};
use crate::session::EditorFrame;
use std::collections::HashMap;

/// Names for stack values, keyed by their bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackLabels {
    names: HashMap<Vec<u8>, String>,
}

impl StackLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds labels not yet known. Empty values and `01` are too common to
    /// name.
    pub fn extend(&mut self, items: &[StackItemLabel]) {
        for item in items {
            if item.value.is_empty() || item.value == [0x01] {
                continue;
            }
            self.names
                .entry(item.value.clone())
                .or_insert_with(|| item.label.clone());
        }
    }

    pub fn get(&self, value: &[u8]) -> Option<&str> {
        self.names.get(value).map(String::as_str)
    }

    pub fn describe(&self, value: &[u8]) -> String {
        match self.get(value) {
            Some(label) => label.to_string(),
            None => format!("0x{}", hex::encode(value)),
        }
    }
}

fn glyph(spacer: &Spacer) -> String {
    match spacer {
        Spacer::Evaluation => "┃ ".to_string(),
        Spacer::Loop => "↻ ".to_string(),
        Spacer::ExecutedConditional => "│ ".to_string(),
        Spacer::SkippedConditional => "┆ ".to_string(),
        Spacer::LoopMarker(marker) => format!(
            "[{}/{}] ",
            marker.iteration_index, marker.maximum_iteration_index
        ),
    }
}

fn describe_items(items: &[Vec<u8>], labels: &StackLabels) -> String {
    items
        .iter()
        .map(|item| labels.describe(item))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stack bottom first, so the top item is the last one printed.
pub fn describe_state(state: &ProgramState, labels: &StackLabels) -> String {
    if let Some(error) = &state.error {
        return format!("error: {}", error);
    }
    let mut text = if state.stack.is_empty() {
        "(empty)".to_string()
    } else {
        describe_items(&state.stack, labels)
    };
    if !state.alternate_stack.is_empty() {
        text.push_str(" | alt: ");
        text.push_str(&describe_items(&state.alternate_stack, labels));
    }
    text
}

pub fn render_line(number: usize, line: &ViewerLine, labels: &StackLabels) -> String {
    let mark = match line.highlight {
        Some(Highlight::Success) => '✔',
        None => ' ',
    };
    let mut row = format!("{:>4} {} ", number, mark);
    for spacer in line.spacers.iter().flatten() {
        row.push_str(&glyph(spacer));
    }
    if let Some(state) = &line.state {
        row.push_str(&describe_state(state, labels));
    }
    row.trim_end().to_string()
}

pub fn render_frame(index: usize, frame: &EditorFrame, labels: &StackLabels) -> String {
    let mut rows = vec![format!("== #{} {} ({}) ==", index, frame.name, frame.kind)];
    if frame.lines.is_empty() {
        rows.push("     (not evaluated)".to_string());
    }
    rows.extend(
        frame
            .lines
            .iter()
            .enumerate()
            .map(|(number, line)| render_line(number, line, labels)),
    );
    if !frame.loops.is_empty() {
        let loops: Vec<String> = frame
            .loops
            .iter()
            .map(|marker| {
                format!(
                    "loop {}: {}/{}",
                    marker.loop_index, marker.iteration_index, marker.maximum_iteration_index
                )
            })
            .collect();
        rows.push(format!("     {}", loops.join(", ")));
    }
    rows.join("\n")
}
