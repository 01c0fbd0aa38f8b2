/// Upper-triangular boolean matrix over slot-index pairs, tracking which
/// pairs are currently inside a flagged conflict episode.
///
/// A cell going false -> true is the edge that raises an alert; while the
/// cell stays true the pair is in the same episode and must not re-fire.
#[derive(Debug, Clone)]
pub struct ConflictMatrix {
    n: usize,
    cells: Vec<bool>,
}

impl ConflictMatrix {
    pub fn new(capacity: usize) -> Self {
        let cells = vec![false; capacity * capacity.saturating_sub(1) / 2];
        Self { n: capacity, cells }
    }

    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.n);
        // Row-major packing of the strict upper triangle.
        i * (2 * self.n - i - 1) / 2 + (j - i - 1)
    }

    /// Whether pair (i, j) is inside a flagged episode. Order-insensitive.
    pub fn get(&self, i: usize, j: usize) -> bool {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.cells[self.index(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, flagged: bool) {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        let idx = self.index(i, j);
        self.cells[idx] = flagged;
    }

    /// Clear every cell involving one slot; used when that slot goes
    /// inactive so a reused slot starts with a clean episode history.
    pub fn clear_involving(&mut self, k: usize) {
        for other in 0..self.n {
            if other != k {
                self.set(k, other, false);
            }
        }
    }

    pub fn clear_all(&mut self) {
        self.cells.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_order_insensitive() {
        let mut matrix = ConflictMatrix::new(5);
        matrix.set(3, 1, true);
        assert!(matrix.get(1, 3));
        assert!(matrix.get(3, 1));
        assert!(!matrix.get(1, 2));
    }

    #[test]
    fn test_clear_involving_only_touches_one_slot() {
        let mut matrix = ConflictMatrix::new(4);
        matrix.set(0, 1, true);
        matrix.set(1, 2, true);
        matrix.set(2, 3, true);

        matrix.clear_involving(1);
        assert!(!matrix.get(0, 1));
        assert!(!matrix.get(1, 2));
        assert!(matrix.get(2, 3));
    }

    #[test]
    fn test_all_pairs_addressable() {
        let n = 7;
        let mut matrix = ConflictMatrix::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                matrix.set(i, j, true);
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                assert!(matrix.get(i, j));
            }
        }
        matrix.clear_all();
        assert!(!matrix.get(0, n - 1));
    }
}
