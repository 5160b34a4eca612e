//! Sparse bitset over the 32-bit unsigned index space
//!
//! Sparse arrays use this to record which indices hold an element so that
//! iteration and `length` truncation never scan the whole index range.
//! Bits live in 64-bit words keyed by word index; a word that is absent from
//! the map is equivalent to a zero word, and zero words are never stored.

use std::collections::BTreeMap;

const WORD_BITS: u64 = 64;

/// A sparse set of `u32` indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UInt32BitSet {
    words: BTreeMap<u32, u64>,
}

#[inline]
fn split(index: u32) -> (u32, u64) {
    (index / WORD_BITS as u32, 1u64 << (index as u64 % WORD_BITS))
}

impl UInt32BitSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no bit is set
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of set bits
    pub fn count(&self) -> usize {
        self.words.values().map(|w| w.count_ones() as usize).sum()
    }

    /// Test a single bit
    pub fn get(&self, index: u32) -> bool {
        let (word, mask) = split(index);
        self.words.get(&word).is_some_and(|w| w & mask != 0)
    }

    /// Set a single bit
    pub fn set(&mut self, index: u32) {
        let (word, mask) = split(index);
        *self.words.entry(word).or_insert(0) |= mask;
    }

    /// Clear a single bit
    pub fn clear(&mut self, index: u32) {
        let (word, mask) = split(index);
        if let Some(w) = self.words.get_mut(&word) {
            *w &= !mask;
            if *w == 0 {
                self.words.remove(&word);
            }
        }
    }

    /// Set every bit in `[from, to)`
    pub fn set_range(&mut self, from: u32, to: u32) {
        if from >= to {
            return;
        }
        let last = to - 1;
        let (first_word, last_word) = (from / 64, last / 64);
        for word in first_word..=last_word {
            let lo = if word == first_word { from % 64 } else { 0 };
            let hi = if word == last_word { last % 64 } else { 63 };
            let mask = if hi - lo == 63 {
                u64::MAX
            } else {
                ((1u64 << (hi - lo + 1)) - 1) << lo
            };
            *self.words.entry(word).or_insert(0) |= mask;
        }
    }

    /// Clear every bit at or above `from`
    pub fn clear_from(&mut self, from: u32) {
        let (word, _) = split(from);
        let tail: Vec<u32> = self.words.range(word..).map(|(k, _)| *k).collect();
        for key in tail {
            if key == word && from % 64 != 0 {
                let keep = (1u64 << (from % 64)) - 1;
                if let Some(w) = self.words.get_mut(&key) {
                    *w &= keep;
                    if *w == 0 {
                        self.words.remove(&key);
                    }
                }
            } else {
                self.words.remove(&key);
            }
        }
    }

    /// Highest set bit at or before `index`, or -1 when there is none
    pub fn last_set_bit(&self, index: u32) -> i64 {
        let (word, _) = split(index);
        let offset = index % 64;
        let mut range = self.words.range(..=word);
        while let Some((&k, &w)) = range.next_back() {
            let masked = if k == word {
                if offset == 63 {
                    w
                } else {
                    w & ((1u64 << (offset + 1)) - 1)
                }
            } else {
                w
            };
            if masked != 0 {
                let bit = 63 - masked.leading_zeros() as i64;
                return k as i64 * 64 + bit;
            }
        }
        -1
    }

    /// Lowest set bit at or after `index`, if any
    pub fn next_set_bit(&self, index: u32) -> Option<u32> {
        let (word, _) = split(index);
        let offset = index % 64;
        for (&k, &w) in self.words.range(word..) {
            let masked = if k == word { w & (u64::MAX << offset) } else { w };
            if masked != 0 {
                return Some(k * 64 + masked.trailing_zeros());
            }
        }
        None
    }

    /// Iterate set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().flat_map(|(&k, &w)| {
            (0..64u32).filter(move |b| w & (1u64 << b) != 0).map(move |b| k * 64 + b)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_range_bounds() {
        let mut set = UInt32BitSet::new();
        set.set_range(60, 70);
        for i in 60..70 {
            assert!(set.get(i), "bit {} should be set", i);
        }
        assert!(!set.get(59));
        assert!(!set.get(70));
        assert_eq!(set.count(), 10);
    }

    #[test]
    fn test_last_set_bit() {
        let mut set = UInt32BitSet::new();
        assert_eq!(set.last_set_bit(200), -1);
        set.set(100);
        assert_eq!(set.last_set_bit(200), 100);
        assert_eq!(set.last_set_bit(100), 100);
        assert_eq!(set.last_set_bit(99), -1);
    }

    #[test]
    fn test_clear_removes_zero_words() {
        let mut set = UInt32BitSet::new();
        set.set(5);
        set.clear(5);
        assert!(set.is_empty());
        assert!(!set.get(5));
    }

    #[test]
    fn test_high_indices() {
        let mut set = UInt32BitSet::new();
        set.set(u32::MAX - 1);
        set.set(3);
        assert_eq!(set.last_set_bit(u32::MAX), (u32::MAX - 1) as i64);
        assert_eq!(set.next_set_bit(4), Some(u32::MAX - 1));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, u32::MAX - 1]);
    }

    #[test]
    fn test_clear_from_truncates() {
        let mut set = UInt32BitSet::new();
        set.set_range(0, 200);
        set.clear_from(130);
        assert!(set.get(129));
        assert!(!set.get(130));
        assert_eq!(set.last_set_bit(u32::MAX), 129);
        set.clear_from(0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_full_word_range() {
        let mut set = UInt32BitSet::new();
        set.set_range(64, 128);
        assert_eq!(set.count(), 64);
        assert_eq!(set.next_set_bit(0), Some(64));
        assert_eq!(set.last_set_bit(1000), 127);
    }
}
