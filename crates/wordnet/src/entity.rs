//! Entities decoded from single dictionary lines.
//!
//! `index.<pos>` lines become [`Word`]s and `data.<pos>` lines become
//! [`Synset`]s. Parsing is pure: the same line always yields an equal value,
//! so an entity evicted from a cache can be rebuilt at any time.

use std::sync::{Arc, OnceLock};

use tracing::warn;
use wordnet_morphy::normalize;
use wordnet_types::{AdjPosition, Pos, RelationType, SynsetId, SynsetType, decode_st};

use crate::dictionary::WordNet;
use crate::error::{Error, Result};

/// A lemma's entry in `index.<pos>`.
///
/// Synsets are fetched on first use of [`Word::synsets`] and kept for the
/// life of the value.
#[derive(Debug)]
pub struct Word {
    lemma: String,
    pos: Pos,
    offset: usize,
    pointer_symbols: Vec<String>,
    tagged_sense_count: u32,
    synset_offsets: Vec<u32>,
    synsets: OnceLock<Vec<Arc<Synset>>>,
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.offset == other.offset && self.lemma == other.lemma
    }
}

impl Eq for Word {}

impl Word {
    pub(crate) fn parse(line: &str, pos: Pos, offset: usize, file: &str) -> Result<Self> {
        let bad = |message: String| Error::parse(file, offset, message);
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        if tokens.len() < 6 {
            return Err(bad("malformed index line (too few tokens)".into()));
        }

        let synset_cnt: usize = tokens[2]
            .parse()
            .map_err(|_| bad(format!("invalid synset_cnt {:?}", tokens[2])))?;
        let p_cnt: usize = tokens[3]
            .parse()
            .map_err(|_| bad(format!("invalid p_cnt {:?}", tokens[3])))?;
        let mut idx = 4;
        if !p_cnt.checked_add(idx + 2).is_some_and(|n| n <= tokens.len()) {
            return Err(bad("pointer count mismatch".into()));
        }
        let pointer_symbols = tokens[idx..idx + p_cnt]
            .iter()
            .map(|s| s.to_string())
            .collect();
        idx += p_cnt;
        // sense_cnt duplicates synset_cnt; only the tagged count is kept.
        idx += 1;
        let tagged_sense_count: u32 = tokens[idx]
            .parse()
            .map_err(|_| bad(format!("invalid tagsense_cnt {:?}", tokens[idx])))?;
        idx += 1;

        let synset_offsets = tokens[idx..]
            .iter()
            .map(|t| {
                t.parse::<u32>()
                    .map_err(|_| bad(format!("invalid synset offset {t:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        if synset_offsets.len() != synset_cnt {
            return Err(bad(format!(
                "synset_cnt mismatch (expected {synset_cnt}, got {})",
                synset_offsets.len()
            )));
        }

        Ok(Self {
            lemma: tokens[0].replace('_', " "),
            pos,
            offset,
            pointer_symbols,
            tagged_sense_count,
            synset_offsets,
            synsets: OnceLock::new(),
        })
    }

    /// Lowercased lemma with spaces between words.
    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Offset of this entry's line in `index.<pos>`.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn pointer_symbols(&self) -> &[String] {
        &self.pointer_symbols
    }

    pub fn tagged_sense_count(&self) -> u32 {
        self.tagged_sense_count
    }

    pub fn synset_offsets(&self) -> &[u32] {
        &self.synset_offsets
    }

    pub fn synset_ids(&self) -> impl Iterator<Item = SynsetId> + '_ {
        self.synset_offsets.iter().map(|&offset| SynsetId {
            pos: self.pos,
            offset,
        })
    }

    /// Whether [`Word::synsets`] has already resolved the offsets.
    pub fn is_resolved(&self) -> bool {
        self.synsets.get().is_some()
    }

    /// The synsets this lemma belongs to, in sense order.
    pub fn synsets(&self, wordnet: &WordNet) -> Result<&[Arc<Synset>]> {
        if let Some(resolved) = self.synsets.get() {
            return Ok(resolved);
        }
        let resolved = self.resolve_synsets(wordnet)?;
        Ok(self.synsets.get_or_init(|| resolved))
    }

    fn resolve_synsets(&self, wordnet: &WordNet) -> Result<Vec<Arc<Synset>>> {
        self.synset_offsets
            .iter()
            .map(|&offset| wordnet.synset_at(self.pos, offset as usize))
            .collect()
    }

    /// This lemma's sense inside each of its synsets.
    pub fn senses(&self, wordnet: &WordNet) -> Result<Vec<WordSense>> {
        Ok(self
            .synsets(wordnet)?
            .iter()
            .filter_map(|synset| synset.sense_for(&self.lemma).cloned())
            .collect())
    }
}

/// One synset line of `data.<pos>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Synset {
    id: SynsetId,
    lex_filenum: u8,
    synset_type: SynsetType,
    senses: Vec<WordSense>,
    relations: Vec<Relation>,
    gloss: String,
}

impl Synset {
    pub(crate) fn parse(line: &str, pos: Pos, offset: usize, file: &str) -> Result<Self> {
        let bad = |message: String| Error::parse(file, offset, message);
        let (left, gloss) = match line.split_once('|') {
            Some((l, r)) => (l.trim(), r.trim()),
            None => (line.trim(), ""),
        };
        let tokens: Vec<&str> = left.split_ascii_whitespace().collect();
        if tokens.len() < 5 {
            return Err(bad("malformed data line".into()));
        }

        let declared: usize = tokens[0]
            .parse()
            .map_err(|_| bad(format!("invalid offset {:?}", tokens[0])))?;
        if declared != offset {
            return Err(bad(format!("line declares offset {declared}")));
        }
        let id = SynsetId {
            pos,
            offset: u32::try_from(offset).map_err(|_| bad("offset exceeds u32".into()))?,
        };
        let lex_filenum: u8 = tokens[1]
            .parse()
            .map_err(|_| bad(format!("invalid lex_filenum {:?}", tokens[1])))?;
        let synset_type = tokens[2]
            .chars()
            .next()
            .and_then(SynsetType::from_char)
            .filter(|t| t.pos() == pos)
            .ok_or_else(|| bad(format!("invalid ss_type {:?}", tokens[2])))?;
        let w_cnt = usize::from_str_radix(tokens[3], 16)
            .map_err(|_| bad(format!("invalid w_cnt {:?}", tokens[3])))?;

        let mut idx = 4;
        // Counts are checked against the token supply before anything is
        // sized from them.
        let needed = w_cnt.checked_mul(2).and_then(|n| n.checked_add(idx + 1));
        if !needed.is_some_and(|n| n <= tokens.len()) || w_cnt > usize::from(u16::MAX) {
            return Err(bad("not enough word/lex_id pairs".into()));
        }
        let mut senses = Vec::with_capacity(w_cnt);
        for n in 0..w_cnt {
            let (text, adj_position) = AdjPosition::strip_marker(tokens[idx]);
            let lex_id = u8::from_str_radix(tokens[idx + 1], 16)
                .map_err(|_| bad(format!("invalid lex_id {:?}", tokens[idx + 1])))?;
            senses.push(WordSense {
                synset: id,
                synset_type,
                lex_filenum,
                index: (n + 1) as u16,
                lemma: text.replace('_', " "),
                lex_id,
                adj_position,
                verb_frames: Vec::new(),
            });
            idx += 2;
        }

        let p_cnt: usize = tokens[idx]
            .parse()
            .map_err(|_| bad(format!("invalid p_cnt {:?}", tokens[idx])))?;
        idx += 1;
        let needed = p_cnt.checked_mul(4).and_then(|n| n.checked_add(idx));
        if !needed.is_some_and(|n| n <= tokens.len()) {
            return Err(bad(format!("p_cnt {p_cnt} exceeds the pointer block")));
        }
        let mut relations = Vec::with_capacity(p_cnt);
        for _ in 0..p_cnt {
            let symbol = tokens[idx];
            let target_offset: u32 = tokens[idx + 1]
                .parse()
                .map_err(|_| bad(format!("invalid pointer offset {:?}", tokens[idx + 1])))?;
            let target_pos = tokens[idx + 2]
                .chars()
                .next()
                .and_then(Pos::from_char)
                .ok_or_else(|| bad(format!("invalid pointer pos {:?}", tokens[idx + 2])))?;
            let (source_index, target_index) = decode_st(tokens[idx + 3]);
            idx += 4;
            let Some(relation_type) = RelationType::parse(symbol, pos) else {
                warn!("{file}:{offset}: skipping unknown pointer symbol {symbol:?}");
                continue;
            };
            relations.push(Relation {
                relation_type,
                source: id,
                source_index,
                target: SynsetId {
                    pos: target_pos,
                    offset: target_offset,
                },
                target_index,
            });
        }

        if pos == Pos::Verb && idx < tokens.len() {
            let f_cnt: usize = tokens[idx]
                .parse()
                .map_err(|_| bad(format!("invalid f_cnt {:?}", tokens[idx])))?;
            idx += 1;
            for _ in 0..f_cnt {
                if tokens.len() < idx + 3 || tokens[idx] != "+" {
                    return Err(bad("malformed frame entry".into()));
                }
                let frame: u16 = tokens[idx + 1]
                    .parse()
                    .map_err(|_| bad(format!("invalid frame number {:?}", tokens[idx + 1])))?;
                let word = u16::from_str_radix(tokens[idx + 2], 16)
                    .map_err(|_| bad(format!("invalid frame word {:?}", tokens[idx + 2])))?;
                for sense in senses
                    .iter_mut()
                    .filter(|s| word == 0 || s.index == word)
                {
                    if !sense.verb_frames.contains(&frame) {
                        sense.verb_frames.push(frame);
                    }
                }
                idx += 3;
            }
        }

        Ok(Self {
            id,
            lex_filenum,
            synset_type,
            senses,
            relations,
            gloss: gloss.to_string(),
        })
    }

    pub fn id(&self) -> SynsetId {
        self.id
    }

    pub fn pos(&self) -> Pos {
        self.id.pos
    }

    pub fn offset(&self) -> u32 {
        self.id.offset
    }

    pub fn lex_filenum(&self) -> u8 {
        self.lex_filenum
    }

    pub fn synset_type(&self) -> SynsetType {
        self.synset_type
    }

    /// True for satellite adjectives, which belong to a head synset's cluster.
    pub fn is_adjective_cluster(&self) -> bool {
        self.synset_type == SynsetType::AdjSatellite
    }

    pub fn senses(&self) -> &[WordSense] {
        &self.senses
    }

    /// Sense by its 1-based position in the synset.
    pub fn sense(&self, index: u16) -> Option<&WordSense> {
        self.senses.get(usize::from(index).checked_sub(1)?)
    }

    /// The sense whose lemma matches `lemma`, ignoring case and treating
    /// spaces and underscores alike.
    pub fn sense_for(&self, lemma: &str) -> Option<&WordSense> {
        let wanted = normalize(lemma);
        self.senses.iter().find(|s| normalize(&s.lemma) == wanted)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relations_of(&self, kind: RelationType) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(move |r| r.relation_type == kind)
    }

    pub fn gloss(&self) -> &str {
        &self.gloss
    }

    /// Gloss text before the first `;` outside quotes.
    pub fn definition(&self) -> &str {
        let mut in_quote = false;
        for (idx, ch) in self.gloss.char_indices() {
            match ch {
                '"' => in_quote = !in_quote,
                ';' if !in_quote => return self.gloss[..idx].trim(),
                _ => {}
            }
        }
        self.gloss.trim()
    }
}

/// One lemma of one synset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WordSense {
    synset: SynsetId,
    synset_type: SynsetType,
    lex_filenum: u8,
    index: u16,
    lemma: String,
    lex_id: u8,
    adj_position: Option<AdjPosition>,
    verb_frames: Vec<u16>,
}

impl WordSense {
    pub fn synset_id(&self) -> SynsetId {
        self.synset
    }

    pub fn pos(&self) -> Pos {
        self.synset.pos
    }

    pub fn synset_type(&self) -> SynsetType {
        self.synset_type
    }

    pub fn lex_filenum(&self) -> u8 {
        self.lex_filenum
    }

    /// 1-based position inside the synset.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// True-cased lemma with spaces between words.
    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn lex_id(&self) -> u8 {
        self.lex_id
    }

    pub fn adj_position(&self) -> Option<AdjPosition> {
        self.adj_position
    }

    /// Generic `frames.vrb` numbers that apply to this sense.
    pub fn verb_frame_numbers(&self) -> &[u16] {
        &self.verb_frames
    }
}

/// Typed edge between two synsets or two senses.
///
/// Endpoints are addresses only; [`WordNet::relation_target`] resolves them
/// on every call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Relation {
    relation_type: RelationType,
    source: SynsetId,
    source_index: Option<u16>,
    target: SynsetId,
    target_index: Option<u16>,
}

impl Relation {
    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn source(&self) -> SynsetId {
        self.source
    }

    /// 1-based source sense; `None` for a relation between whole synsets.
    pub fn source_index(&self) -> Option<u16> {
        self.source_index
    }

    pub fn target(&self) -> SynsetId {
        self.target
    }

    pub fn target_index(&self) -> Option<u16> {
        self.target_index
    }

    /// Lexical relations connect individual senses.
    pub fn is_lexical(&self) -> bool {
        self.source_index.is_some() || self.target_index.is_some()
    }
}

/// Either end of a [`Relation`], resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RelationEnd {
    Synset(Arc<Synset>),
    Sense(WordSense),
}
