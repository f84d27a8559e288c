//! Search primitives over named, sorted dictionary files.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info, trace, warn};

use crate::comparator::{LexicalComparator, LineComparator};
use crate::error::{Result, StoreError};
use crate::line_stream::{LineStream, LoadMode};

type SharedStream = Arc<Mutex<LineStream>>;

/// Outcome of a binary search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Probe {
    /// Offset of the line whose first token equals the target.
    Found(usize),
    /// Offset of the line the target would be inserted before.
    Missing { insertion_point: usize },
}

impl Probe {
    /// Decode the classic `offset` / `-(insertion_point) - 1` convention.
    pub fn from_encoded(encoded: i64) -> Self {
        if encoded >= 0 {
            Probe::Found(encoded as usize)
        } else {
            Probe::Missing {
                insertion_point: (-(encoded + 1)) as usize,
            }
        }
    }

    /// Found offsets are non-negative; misses encode as `-(insertion_point) - 1`.
    pub fn encoded(self) -> i64 {
        match self {
            Probe::Found(offset) => offset as i64,
            Probe::Missing { insertion_point } => -(insertion_point as i64) - 1,
        }
    }

    pub fn found(self) -> Option<usize> {
        match self {
            Probe::Found(offset) => Some(offset),
            Probe::Missing { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct NextLineOffset {
    file: String,
    offset: usize,
    next: Option<usize>,
    valid: bool,
}

impl NextLineOffset {
    fn set(&mut self, file: &str, offset: usize, next: Option<usize>) {
        if self.file != file {
            self.file.clear();
            self.file.push_str(file);
        }
        self.offset = offset;
        self.next = next;
        self.valid = true;
    }

    fn matching(&self, file: &str, offset: usize) -> Option<Option<usize>> {
        (self.valid && self.offset == offset && self.file == file).then_some(self.next)
    }
}

/// Binary-search and linear-scan engine over the files of one dictionary
/// directory.
///
/// Streams are opened lazily on first use and kept for the engine's lifetime.
/// Every operation on a file runs under that file's lock; the registry itself
/// is only written on first open.
pub struct IndexEngine {
    root: PathBuf,
    mode: LoadMode,
    comparator: Box<dyn LineComparator>,
    streams: DashMap<String, Option<SharedStream>>,
    next_line: Mutex<NextLineOffset>,
}

impl IndexEngine {
    pub fn new(root: impl Into<PathBuf>, mode: LoadMode) -> Self {
        Self::with_comparator(root, mode, Box::new(LexicalComparator::TO_LOWERCASE))
    }

    pub fn with_comparator(
        root: impl Into<PathBuf>,
        mode: LoadMode,
        comparator: Box<dyn LineComparator>,
    ) -> Self {
        Self {
            root: root.into(),
            mode,
            comparator,
            streams: DashMap::new(),
            next_line: Mutex::new(NextLineOffset::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_mode(&self) -> LoadMode {
        self.mode
    }

    /// Whether `file` can be opened. Opens (and retains) it as a side effect.
    pub fn is_available(&self, file: &str) -> bool {
        self.stream(file).is_ok()
    }

    /// Byte length of `file`.
    pub fn file_len(&self, file: &str) -> Result<usize> {
        Ok(self.stream(file)?.lock().len())
    }

    /// Binary search for the line whose first token equals `target`,
    /// considering only lines starting at or after `start`.
    pub fn exact_match(&self, target: &str, start: usize, file: &str) -> Result<Probe> {
        if target.is_empty() {
            return Err(StoreError::EmptyKey(file.to_string()));
        }
        let stream = self.stream(file)?;
        let mut stream = stream.lock();
        check_offset(&stream, start, file)?;
        self.bisect(&mut stream, target.as_bytes(), start)
            .map_err(|e| StoreError::io(file, e))
    }

    fn bisect(
        &self,
        stream: &mut LineStream,
        target: &[u8],
        mut start: usize,
    ) -> std::io::Result<Probe> {
        let mut stop = stream.len();
        loop {
            let midpoint = start + (stop.saturating_sub(start)) / 2;
            stream.seek(midpoint);
            stream.skip_line()?;
            let offset = stream.position().min(stream.len());
            trace!(start, midpoint, stop, offset, "probe");
            if offset == start {
                return Ok(Probe::Missing {
                    insertion_point: start,
                });
            }
            if offset == stop {
                if start != 0 && stream.char_at(start - 1)? != Some(b'\n') {
                    stream.seek(start + 1);
                    stream.skip_line()?;
                } else {
                    stream.seek(start);
                }
                while stream.position() < stop {
                    let result = stream.position();
                    let word = stream.read_line_word()?.unwrap_or_default();
                    match self.comparator.compare(target, word.as_bytes()) {
                        Ordering::Equal => return Ok(Probe::Found(result)),
                        Ordering::Less => {
                            return Ok(Probe::Missing {
                                insertion_point: result,
                            });
                        }
                        Ordering::Greater => {}
                    }
                }
                return Ok(Probe::Missing {
                    insertion_point: stop,
                });
            }
            let result = stream.position();
            let word = stream.read_line_word()?.unwrap_or_default();
            match self.comparator.compare(target, word.as_bytes()) {
                Ordering::Equal => return Ok(Probe::Found(result)),
                Ordering::Greater => start = offset,
                Ordering::Less => stop = offset,
            }
        }
    }

    /// Offset of the first line at or after `start` whose text begins with
    /// `prefix`, found in logarithmic time.
    pub fn prefix_match(&self, prefix: &str, start: usize, file: &str) -> Result<Option<usize>> {
        let insertion_point = match self.exact_match(prefix, start, file)? {
            Probe::Found(offset) => return Ok(Some(offset)),
            Probe::Missing { insertion_point } => insertion_point,
        };
        let Some(line) = self.read_line_at(insertion_point, file)? else {
            return Ok(None);
        };
        Ok(line.starts_with(prefix).then_some(insertion_point))
    }

    /// Linear scan from `start` for the first line whose first token matches
    /// `pattern`.
    pub fn substring_match(
        &self,
        start: usize,
        pattern: &Regex,
        file: &str,
    ) -> Result<Option<usize>> {
        if pattern.as_str().is_empty() {
            return Err(StoreError::EmptyKey(file.to_string()));
        }
        let stream = self.stream(file)?;
        let mut stream = stream.lock();
        check_offset(&stream, start, file)?;
        stream.seek(start);
        loop {
            let offset = stream.position();
            let Some(word) = stream.read_line_word().map_err(|e| StoreError::io(file, e))? else {
                return Ok(None);
            };
            let next = stream.position();
            self.next_line.lock().set(file, offset, Some(next));
            if pattern.is_match(&word) {
                return Ok(Some(offset));
            }
        }
    }

    /// The line starting at `offset`, or `None` at end-of-file.
    pub fn read_line_at(&self, offset: usize, file: &str) -> Result<Option<String>> {
        let stream = self.stream(file)?;
        let mut stream = stream.lock();
        check_offset(&stream, offset, file)?;
        stream.seek(offset);
        let line = stream.read_line().map_err(|e| StoreError::io(file, e))?;
        let next = line.as_ref().map(|_| stream.position());
        self.next_line.lock().set(file, offset, next);
        Ok(line)
    }

    /// Offset of the line following the one at `offset`, or `None` when the
    /// line at `offset` is the last one.
    pub fn next_line_pointer(&self, offset: usize, file: &str) -> Result<Option<usize>> {
        let stream = self.stream(file)?;
        let mut stream = stream.lock();
        check_offset(&stream, offset, file)?;
        if let Some(next) = self.next_line.lock().matching(file, offset) {
            return Ok(next.filter(|n| *n < stream.len()));
        }
        stream.seek(offset);
        stream.skip_line().map_err(|e| StoreError::io(file, e))?;
        let next = stream.position();
        Ok((next < stream.len()).then_some(next))
    }

    /// Line `n` (0-based) of a small auxiliary file.
    pub fn read_line_number(&self, n: usize, file: &str) -> Result<Option<String>> {
        let stream = self.stream(file)?;
        let mut stream = stream.lock();
        stream
            .read_line_number(n)
            .map_err(|e| StoreError::io(file, e))
    }

    fn stream(&self, file: &str) -> Result<SharedStream> {
        if let Some(entry) = self.streams.get(file) {
            return entry
                .value()
                .clone()
                .ok_or_else(|| StoreError::Unavailable(file.to_string()));
        }
        match self.streams.entry(file.to_string()) {
            Entry::Occupied(entry) => entry
                .get()
                .clone()
                .ok_or_else(|| StoreError::Unavailable(file.to_string())),
            Entry::Vacant(entry) => {
                let opened = self.open(file);
                entry.insert(opened.as_ref().ok().cloned());
                opened
            }
        }
    }

    fn open(&self, file: &str) -> Result<SharedStream> {
        let path = self.root.join(file);
        match LineStream::open(&path, self.mode) {
            Ok(stream) => {
                info!("opened {} ({} bytes, {:?})", path.display(), stream.len(), self.mode);
                Ok(Arc::new(Mutex::new(stream)))
            }
            Err(source) => {
                warn!("cannot open {}: {source}", path.display());
                Err(StoreError::Open { path, source })
            }
        }
    }
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .field("comparator", &self.comparator)
            .field("streams", &self.streams.len())
            .finish()
    }
}

fn check_offset(stream: &LineStream, offset: usize, file: &str) -> Result<()> {
    if offset > stream.len() {
        debug!("offset {offset} beyond {file}");
        return Err(StoreError::InvalidOffset {
            file: file.to_string(),
            offset,
            len: stream.len(),
        });
    }
    Ok(())
}
