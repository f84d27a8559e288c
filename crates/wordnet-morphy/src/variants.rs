//! Underscore/dash alternation over multi-word candidates.

use thiserror::Error;

/// Widest alternation the `u128` state counter can enumerate.
pub const MAX_POSITIONS: usize = 127;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{positions} alternation positions exceed the limit of {MAX_POSITIONS}")]
pub struct TooManyPositions {
    pub positions: usize,
}

/// Every way of writing a string's `_`/`-` separators as either character.
///
/// With N separator positions there are 2^N variants. Variant `k` sets
/// position `j` (counted from the left) to `-` when bit `j` of `k` is set, so
/// the leftmost position changes fastest and variant 0 uses underscores
/// everywhere. Iteration is lazy, restartable and keeps O(N) state.
#[derive(Clone, Debug)]
pub struct VariantEnumerator {
    template: Vec<char>,
    positions: Vec<usize>,
}

impl VariantEnumerator {
    pub fn new(source: &str) -> Result<Self, TooManyPositions> {
        let template: Vec<char> = source.chars().collect();
        let positions: Vec<usize> = template
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, '_' | '-'))
            .map(|(i, _)| i)
            .collect();
        if positions.len() > MAX_POSITIONS {
            return Err(TooManyPositions {
                positions: positions.len(),
            });
        }
        Ok(Self {
            template,
            positions,
        })
    }

    /// Number of alternation positions.
    pub fn positions(&self) -> usize {
        self.positions.len()
    }

    /// Number of variants (2^positions).
    pub fn variant_count(&self) -> u128 {
        1u128 << self.positions.len()
    }

    /// The variant for counter value `state`, if `state` is in range.
    pub fn variant(&self, state: u128) -> Option<String> {
        if state >= self.variant_count() {
            return None;
        }
        let mut chars = self.template.clone();
        for (bit, &idx) in self.positions.iter().enumerate() {
            chars[idx] = if (state >> bit) & 1 == 1 { '-' } else { '_' };
        }
        Some(chars.into_iter().collect())
    }

    /// Fresh iterator starting from variant 0.
    pub fn iter(&self) -> Variants<'_> {
        Variants {
            source: self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for &'a VariantEnumerator {
    type Item = String;
    type IntoIter = Variants<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Variants<'a> {
    source: &'a VariantEnumerator,
    next: u128,
}

impl Iterator for Variants<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let variant = self.source.variant(self.next)?;
        self.next += 1;
        Some(variant)
    }
}
