//! Set algebra over atom index lists.

use glam::Vec3;

use crate::Frame;

/// A sorted, deduplicated list of atom indices.
///
/// Selections come out of [`Topology`](crate::Topology) queries and compose
/// through [`union`](Selection::union), [`intersection`](Selection::intersection),
/// and [`difference`](Selection::difference). All three are linear merges over
/// the sorted lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<u32>,
}

impl Selection {
    /// Build a selection from arbitrary indices; sorts and deduplicates.
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        let mut indices: Vec<u32> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Wrap a list that is already sorted and free of duplicates.
    pub(crate) fn from_sorted(indices: Vec<u32>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self { indices }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Atoms in `self` or `other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = Vec::with_capacity(self.len().max(other.len()));
        let (mut left, mut right) = (self.indices.iter().peekable(), other.indices.iter().peekable());
        loop {
            match (left.peek(), right.peek()) {
                (Some(&&a), Some(&&b)) => {
                    merged.push(a.min(b));
                    if a <= b {
                        left.next();
                    }
                    if b <= a {
                        right.next();
                    }
                }
                (Some(&&a), None) => {
                    merged.push(a);
                    left.next();
                }
                (None, Some(&&b)) => {
                    merged.push(b);
                    right.next();
                }
                (None, None) => break,
            }
        }
        Self { indices: merged }
    }

    /// Atoms in both `self` and `other`.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut merged = Vec::new();
        let (mut left, mut right) = (self.indices.iter().peekable(), other.indices.iter().peekable());
        while let (Some(&&a), Some(&&b)) = (left.peek(), right.peek()) {
            match a.cmp(&b) {
                std::cmp::Ordering::Less => {
                    left.next();
                }
                std::cmp::Ordering::Greater => {
                    right.next();
                }
                std::cmp::Ordering::Equal => {
                    merged.push(a);
                    left.next();
                    right.next();
                }
            }
        }
        Self { indices: merged }
    }

    /// Atoms in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut merged = Vec::new();
        let mut right = other.indices.iter().peekable();
        for &a in &self.indices {
            while right.next_if(|&&b| b < a).is_some() {}
            if right.peek() != Some(&&a) {
                merged.push(a);
            }
        }
        Self { indices: merged }
    }

    /// Pull the selected coordinates out of a frame.
    ///
    /// Indices beyond the frame's atom count are skipped.
    pub fn gather(&self, frame: &Frame) -> Vec<Vec3> {
        self.indices
            .iter()
            .filter_map(|&idx| {
                frame
                    .positions
                    .get(idx as usize * 3..idx as usize * 3 + 3)
                    .map(Vec3::from_slice)
            })
            .collect()
    }
}
