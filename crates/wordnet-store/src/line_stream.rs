//! Cursor-based line reader over a single dictionary file.
//!
//! A [`LineStream`] is not synchronized; the [`IndexEngine`](crate::IndexEngine)
//! wraps each one in its own lock and holds it for one logical record read.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;

/// Strategy for backing a [`LineStream`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (resident, zero-copy).
    #[default]
    Mmap,
    /// Read the whole file into an owned buffer (resident, portable fallback).
    Owned,
    /// Keep only a file handle and read through a small seekable window.
    Direct,
}

impl LoadMode {
    /// Parse the textual names used in configuration (`mmap`, `owned`, `direct`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mmap" => Some(LoadMode::Mmap),
            "owned" => Some(LoadMode::Owned),
            "direct" => Some(LoadMode::Direct),
            _ => None,
        }
    }
}

const DIRECT_WINDOW: usize = 8 * 1024;

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

struct DirectFile {
    file: File,
    len: usize,
    window_start: usize,
    window: Vec<u8>,
    window_size: usize,
}

impl DirectFile {
    fn byte_at(&mut self, pos: usize) -> io::Result<Option<u8>> {
        if pos >= self.len {
            return Ok(None);
        }
        if pos < self.window_start || pos >= self.window_start + self.window.len() {
            self.fill(pos)?;
        }
        Ok(self.window.get(pos - self.window_start).copied())
    }

    fn fill(&mut self, pos: usize) -> io::Result<()> {
        let want = self.window_size.min(self.len - pos);
        self.file.seek(SeekFrom::Start(pos as u64))?;
        self.window.resize(want, 0);
        self.file.read_exact(&mut self.window)?;
        self.window_start = pos;
        Ok(())
    }
}

enum Backend {
    Resident(Buffer),
    Direct(DirectFile),
}

/// Byte-addressable line reader with a mutable cursor.
///
/// Lines end at `\r\n`, a bare `\r` or `\n`. All backends behave identically;
/// only their memory and syscall profiles differ.
pub struct LineStream {
    name: String,
    position: usize,
    backend: Backend,
    scratch: Vec<u8>,
}

impl LineStream {
    /// Open `path` with the requested backend.
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut file = File::open(path)?;
        let backend = match mode {
            LoadMode::Mmap => Backend::Resident(Buffer::Mmap(unsafe { Mmap::map(&file) }?)),
            LoadMode::Owned => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Backend::Resident(Buffer::Owned(buf))
            }
            LoadMode::Direct => Self::direct_backend(file, DIRECT_WINDOW)?,
        };
        Ok(Self::with_backend(name, backend))
    }

    /// Wrap an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::with_backend(name.into(), Backend::Resident(Buffer::Owned(bytes)))
    }

    /// Drain `reader` to its end and serve lines from the resulting buffer.
    pub fn from_reader(name: impl Into<String>, mut reader: impl Read) -> io::Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self::from_bytes(name, buf))
    }

    fn direct_backend(file: File, window_size: usize) -> io::Result<Backend> {
        let len = usize::try_from(file.metadata()?.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file too large"))?;
        Ok(Backend::Direct(DirectFile {
            file,
            len,
            window_start: 0,
            window: Vec::new(),
            window_size: window_size.max(1),
        }))
    }

    fn with_backend(name: String, backend: Backend) -> Self {
        Self {
            name,
            position: 0,
            backend,
            scratch: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Resident(buf) => buf.as_slice().len(),
            Backend::Direct(direct) => direct.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor. Positions at or past the end read as end-of-file.
    pub fn seek(&mut self, pos: usize) {
        self.position = pos;
    }

    /// Byte at `pos` without moving the cursor; `None` past the end.
    pub fn char_at(&mut self, pos: usize) -> io::Result<Option<u8>> {
        self.byte(pos)
    }

    /// Read from the cursor through the next line terminator.
    ///
    /// Returns `None` only when the cursor is already at end-of-file.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        if !self.advance_line(Keep::Line)? {
            return Ok(None);
        }
        Ok(Some(self.take_scratch()))
    }

    /// Advance past the current line; `false` when already at end-of-file.
    pub fn skip_line(&mut self) -> io::Result<bool> {
        self.advance_line(Keep::Nothing)
    }

    /// First space-delimited token of the current line. The cursor still
    /// moves past the whole line.
    pub fn read_line_word(&mut self) -> io::Result<Option<String>> {
        if !self.advance_line(Keep::FirstWord)? {
            return Ok(None);
        }
        Ok(Some(self.take_scratch()))
    }

    /// Line number `n` (0-based) by scanning from the start of the file.
    pub fn read_line_number(&mut self, n: usize) -> io::Result<Option<String>> {
        self.seek(0);
        for _ in 0..n {
            if !self.skip_line()? {
                return Ok(None);
            }
        }
        self.read_line()
    }

    fn byte(&mut self, pos: usize) -> io::Result<Option<u8>> {
        match &mut self.backend {
            Backend::Resident(buf) => Ok(buf.as_slice().get(pos).copied()),
            Backend::Direct(direct) => direct.byte_at(pos),
        }
    }

    fn advance_line(&mut self, keep: Keep) -> io::Result<bool> {
        if self.position >= self.len() {
            return Ok(false);
        }
        self.scratch.clear();
        let mut collecting = keep != Keep::Nothing;
        while let Some(b) = self.byte(self.position)? {
            self.position += 1;
            match b {
                b'\n' => break,
                b'\r' => {
                    if self.byte(self.position)? == Some(b'\n') {
                        self.position += 1;
                    }
                    break;
                }
                b' ' if keep == Keep::FirstWord => collecting = false,
                _ if collecting => self.scratch.push(b),
                _ => {}
            }
        }
        Ok(true)
    }

    fn take_scratch(&mut self) -> String {
        String::from_utf8_lossy(&self.scratch).into_owned()
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Keep {
    Nothing,
    FirstWord,
    Line,
}

impl std::fmt::Debug for LineStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.backend {
            Backend::Resident(Buffer::Mmap(_)) => "mmap",
            Backend::Resident(Buffer::Owned(_)) => "owned",
            Backend::Direct(_) => "direct",
        };
        f.debug_struct("LineStream")
            .field("name", &self.name)
            .field("backend", &backend)
            .field("len", &self.len())
            .field("position", &self.position)
            .finish()
    }
}
