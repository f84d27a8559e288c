use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use wordnet_morphy::{Lexicon, Morphy, normalize};
use wordnet_store::{BloomGate, IndexEngine, Probe};
use wordnet_types::{Pos, RelationType, SynsetId, SynsetType};

use crate::cache::{CacheKey, EntityCache};
use crate::config::Config;
use crate::entity::{Relation, RelationEnd, Synset, Word, WordSense};
use crate::error::{Error, Result};

const CNTLIST: &str = "cntlist.rev";
const SENTENCE_INDEX: &str = "sentidx.vrb";
const SENTENCES: &str = "sents.vrb";
const FRAMES: &str = "frames.vrb";

/// Number of entries currently held by each entity cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub words: usize,
    pub synsets: usize,
    pub capacity: usize,
}

/// An opened dictionary directory.
///
/// Lookups search the sorted files in place; parsed entities are kept in
/// bounded LRU caches. The value is `Send + Sync` and meant to be shared.
pub struct WordNet {
    config: Config,
    pub(crate) engine: IndexEngine,
    bloom: BloomGate,
    morphy: Morphy,
    words: EntityCache<Arc<Word>>,
    synsets: EntityCache<Arc<Synset>>,
}

impl WordNet {
    /// Open the dictionary described by `config`.
    ///
    /// Fails if the directory or any `index.<pos>`/`data.<pos>` file is
    /// missing. Exception lists and auxiliary files are optional.
    pub fn open(config: Config) -> Result<Self> {
        let dir = config.dict_dir();
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "dictionary directory {} does not exist",
                dir.display()
            )));
        }
        for pos in Pos::ALL {
            for name in [pos.index_file(), pos.data_file()] {
                let path = dir.join(&name);
                if !path.is_file() {
                    return Err(Error::Config(format!(
                        "missing required WordNet file: {}",
                        path.display()
                    )));
                }
            }
        }

        let engine = IndexEngine::new(dir, config.load_mode());
        let bloom = BloomGate::load(config.bloom_dir());
        let capacity = config.cache_capacity();
        info!(
            "opened WordNet at {} ({:?}, cache capacity {capacity})",
            dir.display(),
            config.load_mode()
        );
        Ok(Self {
            engine,
            bloom,
            morphy: Morphy::new(capacity),
            words: EntityCache::new(capacity),
            synsets: EntityCache::new(capacity),
            config,
        })
    }

    /// Open the dictionary named by the environment; see [`Config::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::open(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying search engine, for raw offset-level access.
    pub fn engine(&self) -> &IndexEngine {
        &self.engine
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            words: self.words.len(),
            synsets: self.synsets.len(),
            capacity: self.words.capacity(),
        }
    }

    /// The index entry for `lemma`, matched case-insensitively with spaces
    /// and underscores treated alike. No inflection handling; see
    /// [`WordNet::lookup_base_forms`].
    pub fn lookup_word(&self, lemma: &str, pos: Pos) -> Result<Option<Arc<Word>>> {
        let key = normalize(lemma);
        if key.is_empty() {
            return Ok(None);
        }
        let cache_key = CacheKey::ByKey {
            text: key.clone(),
            pos,
        };
        if let Some(word) = self.words.get(&cache_key) {
            return Ok(Some(word));
        }
        if !self.bloom.maybe_defined(&key, pos) {
            debug!("bloom filter rules out {key:?} ({pos})");
            return Ok(None);
        }
        match self.engine.exact_match(&key, 0, &pos.index_file())? {
            Probe::Found(offset) => {
                let word = self.word_at(pos, offset)?;
                self.words.put(cache_key, Arc::clone(&word));
                Ok(Some(word))
            }
            Probe::Missing { .. } => Ok(None),
        }
    }

    /// The index entry whose line starts at `offset` in `index.<pos>`.
    pub fn word_at(&self, pos: Pos, offset: usize) -> Result<Arc<Word>> {
        let key = CacheKey::ByOffset { pos, offset };
        if let Some(word) = self.words.get(&key) {
            return Ok(word);
        }
        let file = pos.index_file();
        let line = self
            .engine
            .read_line_at(offset, &file)?
            .ok_or_else(|| Error::parse(&file, offset, "no line at offset"))?;
        self.word_from_line(pos, offset, &line)
    }

    pub(crate) fn word_from_line(&self, pos: Pos, offset: usize, line: &str) -> Result<Arc<Word>> {
        let key = CacheKey::ByOffset { pos, offset };
        if let Some(word) = self.words.get(&key) {
            return Ok(word);
        }
        let word = Arc::new(Word::parse(line, pos, offset, &pos.index_file())?);
        self.words.put(key, Arc::clone(&word));
        Ok(word)
    }

    /// The synset whose line starts at `offset` in `data.<pos>`.
    pub fn synset_at(&self, pos: Pos, offset: usize) -> Result<Arc<Synset>> {
        let key = CacheKey::ByOffset { pos, offset };
        if let Some(synset) = self.synsets.get(&key) {
            return Ok(synset);
        }
        let file = pos.data_file();
        let line = self
            .engine
            .read_line_at(offset, &file)?
            .ok_or_else(|| Error::parse(&file, offset, "no line at offset"))?;
        self.synset_from_line(pos, offset, &line)
    }

    pub(crate) fn synset_from_line(
        &self,
        pos: Pos,
        offset: usize,
        line: &str,
    ) -> Result<Arc<Synset>> {
        let key = CacheKey::ByOffset { pos, offset };
        if let Some(synset) = self.synsets.get(&key) {
            return Ok(synset);
        }
        let synset = Arc::new(Synset::parse(line, pos, offset, &pos.data_file())?);
        self.synsets.put(key, Arc::clone(&synset));
        Ok(synset)
    }

    pub fn synset(&self, id: SynsetId) -> Result<Arc<Synset>> {
        self.synset_at(id.pos, id.offset as usize)
    }

    /// Tokens of the `<pos>.exc` line for `form`: the form itself followed
    /// by its roots. Empty when `form` is not an exceptional inflection or
    /// the exception list is absent.
    pub fn exceptions(&self, form: &str, pos: Pos) -> Result<Vec<String>> {
        let key = normalize(form);
        if key.is_empty() || !self.bloom.maybe_exception(&key, pos) {
            return Ok(Vec::new());
        }
        let file = pos.exception_file();
        let offset = match self.engine.exact_match(&key, 0, &file) {
            Ok(Probe::Found(offset)) => offset,
            Ok(Probe::Missing { .. }) => return Ok(Vec::new()),
            Err(err) if err.is_configuration() => {
                debug!("no exception list for {pos}: {err}");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self
            .engine
            .read_line_at(offset, &file)?
            .map(|line| line.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Dictionary base forms of `text` (morphy), true-cased and without
    /// duplicates.
    pub fn lookup_base_forms(&self, text: &str, pos: Pos) -> Result<Vec<String>> {
        self.morphy.base_forms(self, text, pos)
    }

    /// [`WordNet::lookup_base_forms`] for every part of speech.
    pub fn lookup_base_forms_all(&self, text: &str) -> Result<Vec<String>> {
        let mut forms: Vec<String> = Vec::new();
        for pos in Pos::ALL {
            for form in self.lookup_base_forms(text, pos)? {
                if !forms.contains(&form) {
                    forms.push(form);
                }
            }
        }
        Ok(forms)
    }

    /// Synsets of every base form of `text`.
    pub fn lookup_synsets(&self, text: &str, pos: Pos) -> Result<Vec<Arc<Synset>>> {
        let mut synsets: Vec<Arc<Synset>> = Vec::new();
        for word in self.base_words(text, pos)? {
            for synset in word.synsets(self)? {
                if !synsets.iter().any(|s| s.id() == synset.id()) {
                    synsets.push(Arc::clone(synset));
                }
            }
        }
        Ok(synsets)
    }

    pub fn lookup_synsets_all(&self, text: &str) -> Result<Vec<Arc<Synset>>> {
        let mut all = Vec::new();
        for pos in Pos::ALL {
            all.extend(self.lookup_synsets(text, pos)?);
        }
        Ok(all)
    }

    /// Senses of every base form of `text`.
    pub fn lookup_word_senses(&self, text: &str, pos: Pos) -> Result<Vec<WordSense>> {
        let mut senses: Vec<WordSense> = Vec::new();
        for word in self.base_words(text, pos)? {
            for sense in word.senses(self)? {
                if !senses.contains(&sense) {
                    senses.push(sense);
                }
            }
        }
        Ok(senses)
    }

    pub fn lookup_word_senses_all(&self, text: &str) -> Result<Vec<WordSense>> {
        let mut all = Vec::new();
        for pos in Pos::ALL {
            all.extend(self.lookup_word_senses(text, pos)?);
        }
        Ok(all)
    }

    fn base_words(&self, text: &str, pos: Pos) -> Result<Vec<Arc<Word>>> {
        let mut words: Vec<Arc<Word>> = Vec::new();
        for form in self.lookup_base_forms(text, pos)? {
            if let Some(word) = self.lookup_word(&form, pos)?
                && !words.contains(&word)
            {
                words.push(word);
            }
        }
        Ok(words)
    }

    /// Resolve the target end of `relation`.
    pub fn relation_target(&self, relation: &Relation) -> Result<RelationEnd> {
        self.relation_end(relation.target(), relation.target_index())
    }

    /// Resolve the source end of `relation`.
    pub fn relation_source(&self, relation: &Relation) -> Result<RelationEnd> {
        self.relation_end(relation.source(), relation.source_index())
    }

    fn relation_end(&self, id: SynsetId, index: Option<u16>) -> Result<RelationEnd> {
        let synset = self.synset(id)?;
        let Some(index) = index else {
            return Ok(RelationEnd::Synset(synset));
        };
        synset
            .sense(index)
            .cloned()
            .map(RelationEnd::Sense)
            .ok_or_else(|| {
                Error::parse(
                    &id.pos.data_file(),
                    id.offset as usize,
                    format!("relation names missing sense {index}"),
                )
            })
    }

    /// The sense key, `lemma%ss_type:lex_filenum:lex_id:head_word:head_id`.
    ///
    /// Head fields are only filled for satellite adjectives, from the first
    /// sense of the cluster head they are similar to.
    pub fn sense_key(&self, sense: &WordSense) -> Result<String> {
        let lemma = normalize(sense.lemma());
        let code = sense.synset_type().sense_key_code();
        let (filenum, lex_id) = (sense.lex_filenum(), sense.lex_id());
        if sense.synset_type() != SynsetType::AdjSatellite {
            return Ok(format!("{lemma}%{code}:{filenum:02}:{lex_id:02}::"));
        }

        let id = sense.synset_id();
        let missing_head = || {
            Error::parse(
                &id.pos.data_file(),
                id.offset as usize,
                "satellite adjective without a cluster head",
            )
        };
        let synset = self.synset(id)?;
        let head = synset
            .relations_of(RelationType::SimilarTo)
            .next()
            .ok_or_else(missing_head)?;
        let head = self.synset(head.target())?;
        let head_sense = head.senses().first().ok_or_else(missing_head)?;
        Ok(format!(
            "{lemma}%{code}:{filenum:02}:{lex_id:02}:{}:{:02}",
            normalize(head_sense.lemma()),
            head_sense.lex_id()
        ))
    }

    /// Times `sense` was tagged in the semantic concordance (`cntlist.rev`),
    /// or 0 when it never was or the file is absent.
    pub fn tagged_sense_frequency(&self, sense: &WordSense) -> Result<u32> {
        let key = self.sense_key(sense)?;
        let Some((offset, line)) = self.auxiliary_line(CNTLIST, &key)? else {
            return Ok(0);
        };
        line.split_ascii_whitespace()
            .last()
            .and_then(|count| count.parse().ok())
            .ok_or_else(|| Error::parse(CNTLIST, offset, "invalid tag count"))
    }

    /// Illustrative sentences (`sents.vrb`) followed by the generic frames
    /// (`frames.vrb`) for a verb sense. Empty for other parts of speech.
    pub fn verb_frames(&self, sense: &WordSense) -> Result<Vec<String>> {
        if sense.pos() != Pos::Verb {
            return Ok(Vec::new());
        }
        let mut frames = Vec::new();
        let key = self.sense_key(sense)?;
        if let Some((_, line)) = self.auxiliary_line(SENTENCE_INDEX, &key)? {
            for number in strip_number(&line).split(',').filter(|n| !n.is_empty()) {
                match self.auxiliary_line(SENTENCES, number)? {
                    Some((_, sentence)) => frames.push(strip_number(&sentence).to_string()),
                    None => warn!("{SENTENCES} has no sentence {number} for {key}"),
                }
            }
        }

        let mut numbers = sense.verb_frame_numbers().to_vec();
        numbers.sort_unstable();
        for number in numbers {
            let Some(index) = usize::from(number).checked_sub(1) else {
                continue;
            };
            match self.engine.read_line_number(index, FRAMES) {
                Ok(Some(line)) => frames.push(strip_number(&line).to_string()),
                Ok(None) => warn!("{FRAMES} has no frame {number}"),
                Err(err) if err.is_configuration() => {
                    debug!("generic verb frames unavailable: {err}");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(frames)
    }

    /// Binary search an optional sorted auxiliary file by its first token.
    fn auxiliary_line(&self, file: &str, key: &str) -> Result<Option<(usize, String)>> {
        let offset = match self.engine.exact_match(key, 0, file) {
            Ok(Probe::Found(offset)) => offset,
            Ok(Probe::Missing { .. }) => return Ok(None),
            Err(err) if err.is_configuration() => {
                debug!("{file} unavailable: {err}");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self
            .engine
            .read_line_at(offset, file)?
            .map(|line| (offset, line)))
    }
}

impl Lexicon for WordNet {
    type Error = Error;

    fn exceptions(&self, form: &str, pos: Pos) -> Result<Vec<String>> {
        WordNet::exceptions(self, form, pos)
    }

    fn is_defined(&self, lemma: &str, pos: Pos) -> Result<bool> {
        Ok(self.lookup_word(lemma, pos)?.is_some())
    }

    fn true_case_lemmas(&self, lemma: &str, pos: Pos) -> Result<Option<Vec<String>>> {
        let Some(word) = self.lookup_word(lemma, pos)? else {
            return Ok(None);
        };
        let lemmas = word
            .senses(self)?
            .iter()
            .map(|sense| sense.lemma().to_string())
            .collect();
        Ok(Some(lemmas))
    }
}

impl fmt::Debug for WordNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordNet")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("cache", &self.cache_stats())
            .finish()
    }
}

/// Text after a line's leading number and its separating spaces.
fn strip_number(line: &str) -> &str {
    line.split_once(' ')
        .map_or("", |(_, rest)| rest.trim_start())
}
