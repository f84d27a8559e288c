//! Where a dictionary lives and how it is read.

use std::env;
use std::path::{Path, PathBuf};

use wordnet_store::LoadMode;

use crate::error::{Error, Result};

/// Default bound for each entity cache and for the morphy result cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    dict_dir: PathBuf,
    load_mode: LoadMode,
    cache_capacity: usize,
    bloom_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(dict_dir: impl Into<PathBuf>) -> Self {
        Self {
            dict_dir: dict_dir.into(),
            load_mode: LoadMode::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            bloom_dir: None,
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// The dictionary directory comes from `WORDNET_DIR`, `WNSEARCHDIR` or
    /// `$WNHOME/dict`, in that order. `WORDNET_LOAD_MODE`,
    /// `WORDNET_CACHE_CAPACITY` and `WORDNET_BLOOM_DIR` override the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let dict_dir = var("WORDNET_DIR")
            .map(PathBuf::from)
            .or_else(|| var("WNSEARCHDIR").map(PathBuf::from))
            .or_else(|| var("WNHOME").map(|home| Path::new(&home).join("dict")))
            .ok_or_else(|| {
                Error::Config("set WORDNET_DIR, WNSEARCHDIR or WNHOME to a dictionary".into())
            })?;

        let mut config = Self::new(dict_dir);
        if let Some(mode) = var("WORDNET_LOAD_MODE") {
            config.load_mode = LoadMode::parse(&mode).ok_or_else(|| {
                Error::Config(format!(
                    "WORDNET_LOAD_MODE must be mmap, owned or direct (got {mode:?})"
                ))
            })?;
        }
        if let Some(capacity) = var("WORDNET_CACHE_CAPACITY") {
            config.cache_capacity = capacity.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "WORDNET_CACHE_CAPACITY must be a non-negative integer (got {capacity:?})"
                ))
            })?;
        }
        config.bloom_dir = var("WORDNET_BLOOM_DIR").map(PathBuf::from);
        Ok(config)
    }

    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    /// Zero disables caching.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_bloom_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bloom_dir = Some(dir.into());
        self
    }

    pub fn dict_dir(&self) -> &Path {
        &self.dict_dir
    }

    pub fn load_mode(&self) -> LoadMode {
        self.load_mode
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Directory searched for Bloom filter resources; defaults to the
    /// dictionary directory.
    pub fn bloom_dir(&self) -> &Path {
        self.bloom_dir.as_deref().unwrap_or(&self.dict_dir)
    }
}
