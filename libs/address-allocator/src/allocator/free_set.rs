// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Ordering;

use thiserror::Error;

/// Errors of free set updates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FreeSetError {
    /// Ordinal already in the set.
    #[error("ordinal {0} is already free")]
    AlreadyFree(u128),
    /// Ordinal not in the set.
    #[error("ordinal {0} is not free")]
    NotFree(u128),
}

/// The free ordinals of an address range.
///
/// Stored as spans sorted by start. Spans never overlap and never touch, so
/// the lowest free ordinal is always the start of the first span.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct FreeSet {
    spans: Vec<Span>,
}

impl FreeSet {
    /// A set where the ordinals `0..len` are all free.
    pub fn full(len: u128) -> Self {
        let spans = if len == 0 {
            Vec::new()
        } else {
            vec![Span::new(0, len)]
        };
        Self { spans }
    }

    /// Returns the number of free ordinals.
    pub fn len(&self) -> u128 {
        self.spans.iter().map(Span::len).sum()
    }

    /// Returns the spans in the set.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The lowest free ordinal.
    pub fn first(&self) -> Option<u128> {
        self.spans.first().map(|span| span.start)
    }

    /// Removes and returns the lowest free ordinal.
    pub fn pop_first(&mut self) -> Option<u128> {
        let span = self.spans.first_mut()?;
        let ordinal = span.start;
        span.start += 1;
        if span.is_empty() {
            self.spans.remove(0);
        }
        Some(ordinal)
    }

    /// Returns true if the ordinal is free.
    pub fn contains(&self, ordinal: u128) -> bool {
        self.spans
            .binary_search_by(|span| span.compare(ordinal))
            .is_ok()
    }

    /// Marks an ordinal as free, merging it with adjacent spans.
    pub fn insert(&mut self, ordinal: u128) -> Result<(), FreeSetError> {
        let i = match self.spans.binary_search_by(|span| span.compare(ordinal)) {
            Ok(_) => return Err(FreeSetError::AlreadyFree(ordinal)),
            Err(i) => i,
        };
        // spans[..i] end at or before ordinal, spans[i..] start after it.
        let joins_prev = i > 0 && self.spans[i - 1].end == ordinal;
        let joins_next = i < self.spans.len() && self.spans[i].start == ordinal + 1;

        match (joins_prev, joins_next) {
            (true, true) => {
                self.spans[i - 1].end = self.spans[i].end;
                self.spans.remove(i);
            }
            (true, false) => self.spans[i - 1].end = ordinal + 1,
            (false, true) => self.spans[i].start = ordinal,
            (false, false) => self.spans.insert(i, Span::new(ordinal, ordinal + 1)),
        }
        Ok(())
    }

    /// Takes an ordinal out of the set, splitting its span if needed.
    pub fn remove(&mut self, ordinal: u128) -> Result<(), FreeSetError> {
        let i = self
            .spans
            .binary_search_by(|span| span.compare(ordinal))
            .map_err(|_| FreeSetError::NotFree(ordinal))?;
        let span = &mut self.spans[i];

        if span.start == ordinal {
            span.start += 1;
            if span.is_empty() {
                self.spans.remove(i);
            }
        } else if span.end - 1 == ordinal {
            span.end = ordinal;
        } else {
            // split in the middle
            let lower = Span::new(span.start, ordinal);
            span.start = ordinal + 1;
            self.spans.insert(i, lower);
        }
        Ok(())
    }
}

/// A half-open span of ordinals.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct Span {
    /// Start of the span.
    pub start: u128,
    /// End of the span, excluded.
    pub end: u128,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: u128, end: u128) -> Self {
        Self { start, end }
    }

    /// Return the length of the span.
    pub fn len(&self) -> u128 {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Compare the span to an ordinal.
    fn compare(&self, ordinal: u128) -> Ordering {
        if self.end <= ordinal {
            Ordering::Less
        } else if self.start > ordinal {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn check_free_set_invariants(set: &FreeSet) {
        let spans = set.spans();
        for span in spans {
            assert!(span.start < span.end, "Empty span: {span:?}");
        }
        for i in 1..spans.len() {
            // Strictly less: touching spans must have been merged.
            assert!(
                spans[i - 1].end < spans[i].start,
                "Spans not disjoint or not merged: {:?} and {:?}",
                spans[i - 1],
                spans[i]
            );
        }
    }

    #[test_log::test]
    fn should_hand_out_lowest_ordinal_first() {
        let mut set = FreeSet::full(3);
        assert_eq!(set.pop_first(), Some(0));
        assert_eq!(set.pop_first(), Some(1));
        assert_eq!(set.pop_first(), Some(2));
        assert_eq!(set.pop_first(), None);
        assert_eq!(set.first(), None);
    }

    #[test_log::test]
    fn should_split_and_merge_spans() {
        let mut set = FreeSet::full(10);

        set.remove(5).unwrap();
        assert_eq!(set.spans(), &[Span::new(0, 5), Span::new(6, 10)]);
        set.remove(9).unwrap();
        set.remove(0).unwrap();
        assert_eq!(set.spans(), &[Span::new(1, 5), Span::new(6, 9)]);
        assert_eq!(set.len(), 7);

        set.insert(5).unwrap();
        assert_eq!(set.spans(), &[Span::new(1, 9)]);
        set.insert(0).unwrap();
        set.insert(9).unwrap();
        assert_eq!(set.spans(), &[Span::new(0, 10)]);
    }

    #[test_log::test]
    fn should_reject_double_insert_and_double_remove() {
        let mut set = FreeSet::full(4);
        assert_eq!(set.insert(2), Err(FreeSetError::AlreadyFree(2)));
        assert_eq!(set.remove(4), Err(FreeSetError::NotFree(4)));

        set.remove(2).unwrap();
        assert_eq!(set.remove(2), Err(FreeSetError::NotFree(2)));
        assert!(!set.contains(2));
        assert_eq!(set.len(), 3);
    }

    #[test_log::test]
    fn should_handle_the_largest_ordinals() {
        let mut set = FreeSet::full(u128::MAX);
        set.remove(u128::MAX - 1).unwrap();
        assert_eq!(set.len(), u128::MAX - 1);
        assert!(!set.contains(u128::MAX - 1));
        set.insert(u128::MAX - 1).unwrap();
        assert_eq!(set.spans(), &[Span::new(0, u128::MAX)]);
    }

    #[test_log::test]
    fn should_match_a_naive_model_under_random_operations() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let len = 512;
        let mut set = FreeSet::full(len);
        let mut model: BTreeSet<u128> = (0..len).collect();

        for _ in 0..10_000 {
            let ordinal = rng.random_range(0..len);
            if rng.random_bool(0.5) {
                assert_eq!(set.remove(ordinal).is_ok(), model.remove(&ordinal));
            } else {
                assert_eq!(set.insert(ordinal).is_ok(), model.insert(ordinal));
            }
            check_free_set_invariants(&set);
            assert_eq!(set.len(), model.len() as u128);
            assert_eq!(set.first(), model.first().copied());
        }
    }
}
