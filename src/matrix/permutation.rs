//! Row swap records produced by pivoting.

/// Sequence of transpositions `k <-> P[k]` with `P[k] >= k`.
///
/// Pivot searches record into it while running sequentially; the parallel
/// phases only ever borrow it immutably.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    swaps: Vec<usize>,
}

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Self {
            swaps: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.swaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }

    /// Records that position `k` was exchanged with `pos`.
    pub fn record(&mut self, k: usize, pos: usize) {
        debug_assert!(pos >= k);
        self.swaps[k] = pos;
    }

    #[inline]
    pub fn target(&self, k: usize) -> usize {
        self.swaps[k]
    }

    pub fn is_identity(&self) -> bool {
        self.swaps.iter().enumerate().all(|(k, &p)| k == p)
    }

    /// Undoes every swap, last first.
    pub fn apply_reverse<T>(&self, items: &mut [T]) {
        for k in (0..self.swaps.len()).rev() {
            items.swap(k, self.swaps[k]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_undoes_recorded_swaps() {
        let mut p = Permutation::identity(5);
        p.record(0, 3);
        p.record(1, 4);
        p.record(3, 3);
        assert!(!p.is_identity());

        let mut v = vec!['a', 'b', 'c', 'd', 'e'];
        for k in 0..5 {
            v.swap(k, p.target(k));
        }
        assert_eq!(v, vec!['d', 'e', 'c', 'a', 'b']);
        p.apply_reverse(&mut v);
        assert_eq!(v, vec!['a', 'b', 'c', 'd', 'e']);
    }
}
