/// The iteration the user chose for each loop, by loop discovery index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSelection {
    indexes: Vec<usize>,
}

impl LoopSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_indexes(indexes: Vec<usize>) -> Self {
        Self { indexes }
    }

    /// Missing slots read as the first iteration.
    pub fn get(&self, loop_index: usize) -> usize {
        self.indexes.get(loop_index).copied().unwrap_or(0)
    }

    /// Returns `false` when `iteration` was already selected.
    pub fn set(&mut self, loop_index: usize, iteration: usize) -> bool {
        if self.get(loop_index) == iteration {
            return false;
        }
        if self.indexes.len() <= loop_index {
            self.indexes.resize(loop_index + 1, 0);
        }
        self.indexes[loop_index] = iteration;
        log::debug!("loop {} now shows iteration {}", loop_index, iteration);
        true
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indexes
    }

    pub fn clear(&mut self) {
        self.indexes.clear();
    }
}
