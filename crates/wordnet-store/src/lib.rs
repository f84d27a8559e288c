//! Storage engine for WordNet-format dictionaries.
//!
//! The dictionary files are sorted, newline-delimited text. Rather than parse
//! them into tables up front, this crate searches them in place:
//!
//! - [`LineStream`] reads lines at arbitrary byte offsets through one of three
//!   interchangeable backends ([`LoadMode::Mmap`], [`LoadMode::Owned`],
//!   [`LoadMode::Direct`]).
//! - [`IndexEngine`] owns one lazily opened stream per file name and offers
//!   binary search ([`IndexEngine::exact_match`], [`IndexEngine::prefix_match`]),
//!   linear regex scans ([`IndexEngine::substring_match`]) and line stepping
//!   ([`IndexEngine::read_line_at`], [`IndexEngine::next_line_pointer`]).
//! - [`LexicalComparator`] is the ordering the files are sorted by: case
//!   insensitive, with space and underscore treated as the same character.
//! - [`BloomGate`] holds optional per-POS filters consulted before a search so
//!   that most misses never touch the file.
//!
//! # Example
//! ```no_run
//! use wordnet_store::{IndexEngine, LoadMode, Probe};
//!
//! # fn main() -> Result<(), wordnet_store::StoreError> {
//! let engine = IndexEngine::new("/path/to/wordnet/dict", LoadMode::Mmap);
//! if let Probe::Found(offset) = engine.exact_match("hot dog", 0, "index.noun")? {
//!     println!("{:?}", engine.read_line_at(offset, "index.noun")?);
//! }
//! # Ok(()) }
//! ```

pub mod bloom;
pub mod comparator;
mod engine;
mod error;
mod line_stream;

pub use bloom::{BloomFilter, BloomGate};
pub use comparator::{LexicalComparator, LineComparator, fold_key};
pub use engine::{IndexEngine, Probe};
pub use error::{Result, StoreError};
pub use line_stream::{LineStream, LoadMode};
