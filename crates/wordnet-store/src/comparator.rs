//! Ordering used by every sorted dictionary file.
//!
//! Spaces and underscores compare equal, and (by default) ASCII case is
//! ignored, so a user-typed "Hot Dog" lands on the `hot_dog` index line.

use std::cmp::Ordering;
use std::fmt;
use std::io;

use crate::LineStream;

/// Ordering over the first token of a line.
pub trait LineComparator: Send + Sync + fmt::Debug {
    fn compare(&self, target: &[u8], word: &[u8]) -> Ordering;
}

/// Space/underscore-insensitive comparator, optionally case-insensitive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LexicalComparator {
    fold_case: bool,
}

impl LexicalComparator {
    /// The comparator every index and exception file is sorted by.
    pub const TO_LOWERCASE: Self = Self { fold_case: true };
    /// Exact-case variant for files whose keys are case-significant.
    pub const GIVEN_CASE: Self = Self { fold_case: false };
}

impl Default for LexicalComparator {
    fn default() -> Self {
        Self::TO_LOWERCASE
    }
}

impl LineComparator for LexicalComparator {
    fn compare(&self, target: &[u8], word: &[u8]) -> Ordering {
        for (&a, &b) in target.iter().zip(word) {
            let (mut a, mut b) = (space_to_underscore(a), space_to_underscore(b));
            if a == b {
                continue;
            }
            if self.fold_case {
                a = a.to_ascii_lowercase();
                b = b.to_ascii_lowercase();
            }
            match a.cmp(&b) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        target.len().cmp(&word.len())
    }
}

fn space_to_underscore(b: u8) -> u8 {
    if b == b' ' { b'_' } else { b }
}

/// Fold a key to the form the comparator treats as canonical: ASCII
/// lowercase with spaces as underscores. Keys that compare equal under
/// [`LexicalComparator::TO_LOWERCASE`] fold to the same bytes.
pub fn fold_key(key: &str) -> Vec<u8> {
    key.bytes()
        .map(|b| space_to_underscore(b).to_ascii_lowercase())
        .collect()
}

/// A line that sorts before the line preceding it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unsorted {
    pub offset: usize,
    pub previous: String,
    pub word: String,
}

/// Scan `stream` from the start and report the first out-of-order line.
///
/// License preamble lines (two leading spaces) are ignored.
pub fn first_unsorted(
    stream: &mut LineStream,
    comparator: &dyn LineComparator,
) -> io::Result<Option<Unsorted>> {
    stream.seek(0);
    let mut previous: Option<String> = None;
    loop {
        let offset = stream.position();
        let Some(line) = stream.read_line()? else {
            return Ok(None);
        };
        if line.starts_with("  ") || line.is_empty() {
            continue;
        }
        let word = line.split(' ').next().unwrap_or_default().to_string();
        if let Some(prev) = &previous
            && comparator.compare(prev.as_bytes(), word.as_bytes()) == Ordering::Greater
        {
            return Ok(Some(Unsorted {
                offset,
                previous: prev.clone(),
                word,
            }));
        }
        previous = Some(word);
    }
}
