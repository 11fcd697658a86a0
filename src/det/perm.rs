use alloc::vec;
use alloc::vec::Vec;

/// Table mapping logical row (or column) indices to internal storage slots.
///
/// Reordering rows or columns of the tracked matrix only rewrites this table;
/// the inverse stored by [`DetManip`](super::DetManip) never moves. The table
/// is always a bijection on `0..len`.
///
/// ```
/// use detflow::det::Permutation;
///
/// let p = Permutation::identity(3);
/// assert_eq!(p.as_slice(), &[0, 1, 2]);
/// assert!(p.is_even());
///
/// let q = Permutation::from_slots(vec![1, 0, 2]).unwrap();
/// assert!(!q.is_even());
/// assert!(Permutation::from_slots(vec![0, 0, 1]).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permutation {
    slots: Vec<usize>,
}

impl Permutation {
    /// Empty table.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// `i -> i` on `0..n`.
    pub fn identity(n: usize) -> Self {
        Self {
            slots: (0..n).collect(),
        }
    }

    /// Build from an explicit slot list. Returns `None` unless the list is a
    /// bijection on `0..len`.
    pub fn from_slots(slots: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; slots.len()];
        for &s in &slots {
            if s >= slots.len() || seen[s] {
                return None;
            }
            seen[s] = true;
        }
        Some(Self { slots })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Internal slot of logical index `i`.
    #[inline]
    pub fn slot(&self, i: usize) -> usize {
        self.slots[i]
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.slots
    }

    /// Whether the permutation is even, by cycle counting.
    pub fn is_even(&self) -> bool {
        let n = self.slots.len();
        let mut visited = vec![false; n];
        let mut cycles = 0;
        for start in 0..n {
            if visited[start] {
                continue;
            }
            cycles += 1;
            let mut k = start;
            while !visited[k] {
                visited[k] = true;
                k = self.slots[k];
            }
        }
        (n - cycles) % 2 == 0
    }

    /// `+1` for even, `-1` for odd.
    #[inline]
    pub fn sign(&self) -> i32 {
        if self.is_even() {
            1
        } else {
            -1
        }
    }

    /// Open logical position `pos` and map it to `slot`; later positions shift up.
    pub(crate) fn insert(&mut self, pos: usize, slot: usize) {
        self.slots.insert(pos, slot);
    }

    /// Drop logical position `pos`; later positions shift down.
    pub(crate) fn remove(&mut self, pos: usize) -> usize {
        self.slots.remove(pos)
    }

    /// Drop several logical positions at once. `sorted` must be strictly increasing.
    pub(crate) fn remove_positions(&mut self, sorted: &[usize]) {
        let mut next = 0;
        let mut pos = 0;
        self.slots.retain(|_| {
            let doomed = next < sorted.len() && sorted[next] == pos;
            if doomed {
                next += 1;
            }
            pos += 1;
            !doomed
        });
    }

    /// Redirect every logical index that points at `from` to `to`.
    pub(crate) fn replace_slot(&mut self, from: usize, to: usize) {
        for s in self.slots.iter_mut() {
            if *s == from {
                *s = to;
            }
        }
    }

    #[inline]
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.slots.swap(a, b);
    }

    /// Last logical index becomes the first.
    pub(crate) fn roll_forward(&mut self) {
        self.slots.rotate_right(1);
    }

    /// First logical index becomes the last.
    pub(crate) fn roll_backward(&mut self) {
        self.slots.rotate_left(1);
    }

    pub(crate) fn reset_identity(&mut self, n: usize) {
        self.slots.clear();
        self.slots.extend(0..n);
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Direction for [`DetManip::roll_matrix`](super::DetManip::roll_matrix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roll {
    None,
    /// First row moves to the bottom.
    Up,
    /// Last row moves to the top.
    Down,
    /// First column moves to the right end.
    Left,
    /// Last column moves to the left end.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_by_cycles() {
        assert!(Permutation::identity(0).is_even());
        assert!(Permutation::identity(5).is_even());
        // 3-cycle is even
        let p = Permutation::from_slots(vec![1, 2, 0]).unwrap();
        assert!(p.is_even());
        // transposition times 3-cycle is odd
        let q = Permutation::from_slots(vec![1, 2, 0, 4, 3]).unwrap();
        assert_eq!(q.sign(), -1);
    }

    #[test]
    fn insert_and_remove_shift() {
        let mut p = Permutation::identity(3);
        p.insert(1, 3);
        assert_eq!(p.as_slice(), &[0, 3, 1, 2]);
        assert_eq!(p.remove(0), 0);
        assert_eq!(p.as_slice(), &[3, 1, 2]);
    }

    #[test]
    fn remove_many_positions() {
        let mut p = Permutation::from_slots(vec![4, 2, 0, 1, 3, 5]).unwrap();
        p.remove_positions(&[0, 3, 5]);
        assert_eq!(p.as_slice(), &[2, 0, 3]);
    }

    #[test]
    fn replace_slot_redirects() {
        let mut p = Permutation::from_slots(vec![2, 0, 1]).unwrap();
        p.replace_slot(2, 7);
        assert_eq!(p.as_slice(), &[7, 0, 1]);
    }

    #[test]
    fn rolls_are_inverse() {
        let mut p = Permutation::from_slots(vec![3, 1, 0, 2]).unwrap();
        p.roll_forward();
        assert_eq!(p.as_slice(), &[2, 3, 1, 0]);
        p.roll_backward();
        assert_eq!(p.as_slice(), &[3, 1, 0, 2]);
    }

    #[test]
    fn roll_parity_is_cycle_length() {
        for n in 1..7 {
            let mut p = Permutation::identity(n);
            p.roll_forward();
            let expected = if (n - 1) % 2 == 0 { 1 } else { -1 };
            assert_eq!(p.sign(), expected, "n = {}", n);
        }
    }
}
