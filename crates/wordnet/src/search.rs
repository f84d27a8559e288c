//! Iteration over the entries of one part of speech.
//!
//! Every iterator yields `Result` items and stops after the first error.

use std::sync::Arc;

use regex::Regex;
use wordnet_morphy::normalize;
use wordnet_store::{IndexEngine, StoreError};
use wordnet_types::Pos;

use crate::dictionary::WordNet;
use crate::entity::{Synset, Word};
use crate::error::Result;

/// License lines at the top of each file start with two spaces.
fn is_preamble(line: &str) -> bool {
    line.starts_with("  ")
}

/// Steps through the entry lines of one file.
struct LineCursor<'a> {
    engine: &'a IndexEngine,
    file: String,
    next: Option<usize>,
}

impl<'a> LineCursor<'a> {
    fn new(engine: &'a IndexEngine, file: String) -> Self {
        Self {
            engine,
            file,
            next: Some(0),
        }
    }

    fn next_entry(&mut self) -> Result<Option<(usize, String)>> {
        while let Some(offset) = self.next {
            self.next = None;
            let Some(line) = self.engine.read_line_at(offset, &self.file)? else {
                return Ok(None);
            };
            self.next = self.engine.next_line_pointer(offset, &self.file)?;
            if line.is_empty() || is_preamble(&line) {
                continue;
            }
            return Ok(Some((offset, line)));
        }
        Ok(None)
    }
}

/// Every entry of `index.<pos>`, in file order.
pub struct Words<'a> {
    wordnet: &'a WordNet,
    pos: Pos,
    cursor: LineCursor<'a>,
}

impl Iterator for Words<'_> {
    type Item = Result<Arc<Word>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next_entry() {
            Ok(Some((offset, line))) => Some(self.wordnet.word_from_line(self.pos, offset, &line)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Every synset of `data.<pos>`, in file order.
pub struct Synsets<'a> {
    wordnet: &'a WordNet,
    pos: Pos,
    cursor: LineCursor<'a>,
}

impl Iterator for Synsets<'_> {
    type Item = Result<Arc<Synset>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next_entry() {
            Ok(Some((offset, line))) => {
                Some(self.wordnet.synset_from_line(self.pos, offset, &line))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Index entries whose lemma starts with a prefix, found by binary search.
pub struct PrefixSearch<'a> {
    wordnet: &'a WordNet,
    pos: Pos,
    file: String,
    prefix: String,
    next: Option<usize>,
}

impl PrefixSearch<'_> {
    fn advance(&mut self) -> Result<Option<Arc<Word>>> {
        let Some(start) = self.next.take() else {
            return Ok(None);
        };
        let engine = &self.wordnet.engine;
        let Some(offset) = engine.prefix_match(&self.prefix, start, &self.file)? else {
            return Ok(None);
        };
        let word = self.wordnet.word_at(self.pos, offset)?;
        self.next = engine.next_line_pointer(offset, &self.file)?;
        Ok(Some(word))
    }
}

impl Iterator for PrefixSearch<'_> {
    type Item = Result<Arc<Word>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

/// Index entries whose lemma matches a regular expression, found by a
/// linear scan.
pub struct SubstringSearch<'a> {
    wordnet: &'a WordNet,
    pos: Pos,
    file: String,
    pattern: Regex,
    next: Option<usize>,
    started: bool,
}

impl SubstringSearch<'_> {
    fn advance(&mut self) -> Result<Option<Arc<Word>>> {
        let engine = &self.wordnet.engine;
        if !self.started {
            self.started = true;
            let mut cursor = LineCursor::new(engine, self.file.clone());
            self.next = cursor.next_entry()?.map(|(offset, _)| offset);
        }
        let Some(start) = self.next.take() else {
            return Ok(None);
        };
        let Some(offset) = engine.substring_match(start, &self.pattern, &self.file)? else {
            return Ok(None);
        };
        let word = self.wordnet.word_at(self.pos, offset)?;
        self.next = engine.next_line_pointer(offset, &self.file)?;
        Ok(Some(word))
    }
}

impl Iterator for SubstringSearch<'_> {
    type Item = Result<Arc<Word>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

impl WordNet {
    pub fn words(&self, pos: Pos) -> Words<'_> {
        Words {
            wordnet: self,
            pos,
            cursor: LineCursor::new(&self.engine, pos.index_file()),
        }
    }

    pub fn synsets(&self, pos: Pos) -> Synsets<'_> {
        Synsets {
            wordnet: self,
            pos,
            cursor: LineCursor::new(&self.engine, pos.data_file()),
        }
    }

    /// Index entries starting with `prefix`, after [`normalize`].
    pub fn search_by_prefix(&self, prefix: &str, pos: Pos) -> Result<PrefixSearch<'_>> {
        let prefix = normalize(prefix);
        let file = pos.index_file();
        if prefix.is_empty() {
            return Err(StoreError::EmptyKey(file).into());
        }
        Ok(PrefixSearch {
            wordnet: self,
            pos,
            file,
            prefix,
            next: Some(0),
        })
    }

    /// Index entries whose lemma matches `pattern` anywhere. The pattern is
    /// [`normalize`]d first, so `"   "` searches for `_` and a lone `-`
    /// survives.
    pub fn search_by_substring(&self, pattern: &str, pos: Pos) -> Result<SubstringSearch<'_>> {
        let normalized = normalize(pattern);
        let file = pos.index_file();
        if normalized.is_empty() {
            return Err(StoreError::EmptyKey(file).into());
        }
        let pattern = Regex::new(&normalized).map_err(StoreError::from)?;
        Ok(SubstringSearch {
            wordnet: self,
            pos,
            file,
            pattern,
            next: None,
            started: false,
        })
    }
}
