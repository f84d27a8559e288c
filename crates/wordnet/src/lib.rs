//! Read WordNet dictionaries straight from their sorted text files.
//!
//! [`WordNet`] binary-searches `index.*`, `data.*` and `*.exc` in place
//! instead of loading them into tables, decodes the lines it lands on into
//! [`Word`] and [`Synset`] values, and keeps those in bounded LRU caches.
//! Free-form input goes through morphy first, so inflected words and
//! phrases still find their entries.
//!
//! # Features
//! - Exact, prefix and regex lookups over the index files.
//! - Morphological base forms (exception lists, suffix rules, verb +
//!   preposition idioms, collocations with mixed `_`/`-` separators).
//! - Optional per-POS Bloom filters that turn most misses into a bit test.
//! - Sense keys, tagged sense frequencies and verb frames from the auxiliary
//!   files when present.
//!
//! # Example
//! ```no_run
//! use wordnet::{Config, Pos, WordNet};
//!
//! # fn main() -> Result<(), wordnet::Error> {
//! let wn = WordNet::open(Config::new("/usr/share/wordnet/dict"))?;
//! for synset in wn.lookup_synsets("geese", Pos::Noun)? {
//!     println!("{}: {}", synset.id(), synset.definition());
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p wordnet --example lookup -- <dict> <word>`.

mod cache;
mod config;
mod dictionary;
mod entity;
mod error;
mod search;

pub use cache::{CacheKey, EntityCache};
pub use config::{Config, DEFAULT_CACHE_CAPACITY};
pub use dictionary::{CacheStats, WordNet};
pub use entity::{Relation, RelationEnd, Synset, Word, WordSense};
pub use error::{Error, Result};
pub use search::{PrefixSearch, SubstringSearch, Synsets, Words};

pub use wordnet_morphy::{Lexicon, Morphy, normalize};
pub use wordnet_store::{IndexEngine, LoadMode, Probe, StoreError};
pub use wordnet_types::{AdjPosition, Pos, RelationType, SynsetId, SynsetType};
