use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A source span as reported by the editor (lines and columns share the
/// editor's indexing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "startLineNumber")]
    pub start_line: usize,
    #[serde(rename = "startColumn")]
    pub start_column: usize,
    #[serde(rename = "endLineNumber")]
    pub end_line: usize,
    #[serde(rename = "endColumn")]
    pub end_column: usize,
}

impl Range {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Zero-width span at the start of `self`.
    pub fn start_marker(&self) -> Self {
        Self::new(
            self.start_line,
            self.start_column,
            self.start_line,
            self.start_column,
        )
    }

    pub fn start(&self) -> (usize, usize) {
        (self.start_line, self.start_column)
    }

    pub fn end(&self) -> (usize, usize) {
        (self.end_line, self.end_column)
    }

    /// `true` when `inner` lies entirely inside `self`; equal bounds count as
    /// contained.
    pub fn contains(&self, inner: &Range) -> bool {
        self.start() <= inner.start() && inner.end() <= self.end()
    }

    /// `true` when the two spans share positions but neither contains the
    /// other.
    pub fn partially_overlaps(&self, other: &Range) -> bool {
        let disjoint = self.end() < other.start() || other.end() < self.start();
        !disjoint && !self.contains(other) && !other.contains(self)
    }

    /// Orders ranges by ending position, the order samples are supplied in.
    pub fn cmp_by_end(&self, other: &Range) -> Ordering {
        self.end()
            .cmp(&other.end())
            .then_with(|| self.start().cmp(&other.start()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_inclusive() {
        let outer = Range::new(1, 1, 4, 10);
        assert!(outer.contains(&outer));
        assert!(outer.contains(&Range::new(2, 3, 3, 1)));
        assert!(outer.contains(&Range::new(1, 1, 1, 1)));
        assert!(!outer.contains(&Range::new(1, 1, 4, 11)));
        assert!(!Range::new(2, 1, 2, 5).contains(&outer));
    }

    #[test]
    fn column_breaks_ties_on_shared_lines() {
        let outer = Range::new(2, 5, 2, 20);
        assert!(!outer.contains(&Range::new(2, 4, 2, 10)));
        assert!(outer.contains(&Range::new(2, 5, 2, 10)));
    }

    #[test]
    fn overlap_without_nesting() {
        let a = Range::new(1, 1, 3, 1);
        let b = Range::new(2, 1, 5, 1);
        assert!(a.partially_overlaps(&b));
        assert!(!a.partially_overlaps(&Range::new(1, 2, 2, 1)));
        assert!(!a.partially_overlaps(&Range::new(4, 1, 5, 1)));
    }

    #[test]
    fn start_marker_is_zero_width() {
        let marker = Range::new(3, 7, 9, 2).start_marker();
        assert_eq!(marker, Range::new(3, 7, 3, 7));
    }
}
