//! Bloom filters used as a negative pre-filter in front of binary search.
//!
//! A filter that answers "absent" lets a lookup skip the file entirely. A
//! missing or unreadable filter resource never hides content: the gate then
//! answers "maybe present" and the real search runs.

use std::f64::consts::LN_2;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wordnet_types::Pos;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::comparator::fold_key;
use crate::error::{Result, StoreError};
use crate::line_stream::LineStream;

/// Default false-positive rate for filters built from dictionary files.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.001;

const SECOND_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

type BitSet = BitVec<u64, Lsb0>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomFilter {
    capacity: usize,
    false_positive_rate: f64,
    hashes: u32,
    bits: BitSet,
}

impl BloomFilter {
    /// Size a filter for `capacity` keys at the requested false-positive rate.
    pub fn with_capacity(capacity: usize, false_positive_rate: f64) -> Self {
        let capacity = capacity.max(1);
        let p = if false_positive_rate > 0.0 && false_positive_rate < 1.0 {
            false_positive_rate
        } else {
            DEFAULT_FALSE_POSITIVE_RATE
        };
        let raw_bits = ((capacity as f64 * p.ln()).abs() / (LN_2 * LN_2)).ceil() as usize;
        let bit_len = raw_bits.max(1).div_ceil(64) * 64;
        let hashes = ((bit_len as f64 / capacity as f64) * LN_2).ceil().max(1.0) as u32;
        Self {
            capacity,
            false_positive_rate: p,
            hashes,
            bits: bitvec![u64, Lsb0; 0; bit_len],
        }
    }

    /// Build a filter holding the first token of every non-preamble line.
    pub fn from_stream(stream: &mut LineStream, false_positive_rate: f64) -> io::Result<Self> {
        let mut keys = Vec::new();
        stream.seek(0);
        loop {
            let Some(line) = stream.read_line()? else {
                break;
            };
            if line.starts_with("  ") {
                continue;
            }
            if let Some(word) = line.split(' ').next().filter(|w| !w.is_empty()) {
                keys.push(word.to_string());
            }
        }
        let mut filter = Self::with_capacity(keys.len(), false_positive_rate);
        for key in &keys {
            filter.insert(key);
        }
        Ok(filter)
    }

    pub fn insert(&mut self, key: &str) {
        for idx in self.positions(key) {
            self.bits.set(idx, true);
        }
    }

    /// `false` means the key was never inserted. `true` means it may have been.
    pub fn might_contain(&self, key: &str) -> bool {
        self.positions(key).all(|idx| self.bits[idx])
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hash_count(&self) -> u32 {
        self.hashes
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    fn positions(&self, key: &str) -> impl Iterator<Item = usize> + use<> {
        let folded = fold_key(key);
        let h1 = xxh3_64_with_seed(&folded, 0);
        let h2 = xxh3_64_with_seed(&folded, SECOND_SEED) | 1;
        let len = self.bits.len() as u64;
        (0..u64::from(self.hashes))
            .map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % len) as usize)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|e| StoreError::Bloom {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        writer
            .flush()
            .map_err(|source| StoreError::io(&path.display().to_string(), source))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let filter: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::Bloom {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if filter.bits.is_empty() || filter.hashes == 0 {
            return Err(StoreError::Bloom {
                path: path.to_path_buf(),
                reason: "empty bit vector or zero hash functions".into(),
            });
        }
        Ok(filter)
    }
}

/// Per-part-of-speech filters for index lemmas and exception forms.
#[derive(Debug, Default)]
pub struct BloomGate {
    index: [Option<BloomFilter>; 4],
    exceptions: [Option<BloomFilter>; 4],
}

impl BloomGate {
    /// A gate with no filters; every query answers "maybe".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `<pos>.bloom` and `<pos>.exc.bloom` from `dir`.
    ///
    /// Missing or unreadable resources leave that slot open.
    pub fn load(dir: &Path) -> Self {
        let index = array_init::array_init(|i| load_slot(&index_filter_path(dir, Pos::ALL[i])));
        let exceptions =
            array_init::array_init(|i| load_slot(&exception_filter_path(dir, Pos::ALL[i])));
        let gate = Self { index, exceptions };
        info!(
            "bloom filters loaded from {} ({} index, {} exception)",
            dir.display(),
            gate.index.iter().flatten().count(),
            gate.exceptions.iter().flatten().count()
        );
        gate
    }

    pub fn set_index_filter(&mut self, pos: Pos, filter: BloomFilter) {
        self.index[pos.index()] = Some(filter);
    }

    pub fn set_exception_filter(&mut self, pos: Pos, filter: BloomFilter) {
        self.exceptions[pos.index()] = Some(filter);
    }

    /// `false` only when `lemma` is certainly absent from `index.<pos>`.
    pub fn maybe_defined(&self, lemma: &str, pos: Pos) -> bool {
        self.index[pos.index()]
            .as_ref()
            .is_none_or(|f| f.might_contain(lemma))
    }

    /// `false` only when `form` is certainly absent from `<pos>.exc`.
    pub fn maybe_exception(&self, form: &str, pos: Pos) -> bool {
        self.exceptions[pos.index()]
            .as_ref()
            .is_none_or(|f| f.might_contain(form))
    }
}

pub fn index_filter_path(dir: &Path, pos: Pos) -> PathBuf {
    dir.join(format!("{}.bloom", pos.file_suffix()))
}

pub fn exception_filter_path(dir: &Path, pos: Pos) -> PathBuf {
    dir.join(format!("{}.exc.bloom", pos.file_suffix()))
}

fn load_slot(path: &Path) -> Option<BloomFilter> {
    if !path.exists() {
        debug!("no bloom filter at {}", path.display());
        return None;
    }
    match BloomFilter::load(path) {
        Ok(filter) => Some(filter),
        Err(err) => {
            warn!("ignoring bloom filter: {err}");
            None
        }
    }
}
