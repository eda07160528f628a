//! Fixed-capacity node sets for the clique search.
//!
//! HOG graphs are small, so a node set is a handful of `u64` words and set
//! algebra is word-wise.

#[inline]
const fn calculate_bit_position(bit_index: usize) -> (usize, u64) {
    (bit_index >> 6, 1 << (bit_index & 0x3f))
}

/// A set of node indices `< capacity`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeSet {
    words: Vec<u64>,
    capacity: usize,
}

impl NodeSet {
    /// Empty set able to hold indices `0..capacity`
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
        }
    }

    /// Set containing every index `0..capacity`
    #[must_use]
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::new(capacity);
        for index in 0..capacity {
            set.insert(index);
        }
        set
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Test if an index is a member
    #[must_use]
    pub fn contains(&self, bit_index: usize) -> bool {
        let (word_index, bit_mask) = calculate_bit_position(bit_index);
        (self.words[word_index] & bit_mask) != 0
    }

    /// Add an index to the set
    pub fn insert(&mut self, bit_index: usize) {
        let (word_index, bit_mask) = calculate_bit_position(bit_index);
        self.words[word_index] |= bit_mask;
    }

    /// Remove an index from the set
    pub fn remove(&mut self, bit_index: usize) {
        let (word_index, bit_mask) = calculate_bit_position(bit_index);
        self.words[word_index] &= !bit_mask;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Members present in both sets
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
            capacity: self.capacity,
        }
    }

    /// Size of the intersection without allocating it
    #[must_use]
    pub fn intersection_len(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Members of `self` not in `other`
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & !b)
                .collect(),
            capacity: self.capacity,
        }
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_index, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(word_index * 64 + bit)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_bit_position() {
        assert_eq!(calculate_bit_position(0), (0, 1));
        assert_eq!(calculate_bit_position(1), (0, 2));
        assert_eq!(calculate_bit_position(63), (0, 1 << 63));
        assert_eq!(calculate_bit_position(64), (1, 1));
        assert_eq!(calculate_bit_position(130), (2, 4));
    }

    #[test]
    fn test_insert_contains_remove() {
        let mut set = NodeSet::new(70);
        assert!(set.is_empty());

        set.insert(0);
        set.insert(65);
        assert!(set.contains(0));
        assert!(set.contains(65));
        assert!(!set.contains(64));
        assert_eq!(set.len(), 2);

        set.insert(0);
        assert_eq!(set.len(), 2);

        set.remove(0);
        assert!(!set.contains(0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_full() {
        let set = NodeSet::full(67);
        assert_eq!(set.len(), 67);
        assert_eq!(set.iter().last(), Some(66));
        assert!(NodeSet::full(0).is_empty());
    }

    #[test]
    fn test_set_algebra() {
        let mut a = NodeSet::new(100);
        let mut b = NodeSet::new(100);
        for i in [1, 5, 64, 99] {
            a.insert(i);
        }
        for i in [5, 64, 70] {
            b.insert(i);
        }

        assert_eq!(a.intersection(&b).iter().collect::<Vec<_>>(), vec![5, 64]);
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![1, 99]);
        assert_eq!(b.difference(&a).iter().collect::<Vec<_>>(), vec![70]);
    }

    #[test]
    fn test_iter_ascending() {
        let mut set = NodeSet::new(200);
        for i in [150, 3, 64, 63, 128] {
            set.insert(i);
        }
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 63, 64, 128, 150]);
    }
}
