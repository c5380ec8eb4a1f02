//! Boundary delimiters and the chunk-split tolerant boundary scanner.
//!
//! A delimiter is `CRLF "--" boundary`. What follows it decides its meaning:
//!
//! ```text
//! CRLF--boundary CRLF       next part
//! CRLF--boundary--CRLF      close of this nesting level
//! CRLF--boundaryXYZ         literal content
//! ```
//!
//! The scanner never commits to "no delimiter here" for the last
//! [`Boundary::margin`] bytes of a window, because a delimiter starting there
//! cannot be classified yet.

use crate::error::{Error, Result};
use memchr::memmem::Finder;
use std::fmt;

const CRLF: &[u8] = b"\r\n";
const DASHES: &[u8] = b"--";

/// Maximum boundary length allowed by RFC 2046.
pub const MAX_BOUNDARY_LENGTH: usize = 70;

/// Bytes after a delimiter needed to classify it (`--` CRLF).
const TRAILING_CONTEXT: usize = 4;

/// What a delimiter occurrence turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    /// Followed by CRLF: a new part starts.
    Part,
    /// Followed by `--` CRLF: the terminal trailer of this level.
    Close,
    /// Anything else: the bytes are content.
    Literal,
}

/// Outcome of scanning a window for a delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// A classified delimiter starts at `index`.
    Delimiter {
        /// Offset of the delimiter's leading CR.
        index: usize,
        /// Classification of the occurrence.
        kind: DelimiterKind,
    },
    /// The first `safe` bytes contain no delimiter; the rest is undecided.
    Clear {
        /// Number of bytes that can be committed as data.
        safe: usize,
    },
}

/// Outcome of checking the start of a window for a delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScan {
    /// The window starts with a delimiter of this kind.
    Delimiter(DelimiterKind),
    /// The window does not start with a delimiter.
    Absent,
    /// More bytes are needed to tell.
    Undecided,
}

/// A multipart boundary scoped to one nesting level.
#[derive(Clone)]
pub struct Boundary {
    /// `CRLF "--" value`.
    delimiter: Vec<u8>,
    finder: Finder<'static>,
}

impl Boundary {
    /// Creates a boundary from its parameter value (without leading dashes).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] for an empty value and
    /// [`Error::InvalidBoundary`] if it is longer than 70 bytes or contains
    /// CR or LF.
    pub fn new(value: impl AsRef<[u8]>) -> Result<Self> {
        let value = value.as_ref();
        if value.is_empty() {
            return Err(Error::MissingBoundary);
        }
        if value.len() > MAX_BOUNDARY_LENGTH {
            return Err(Error::InvalidBoundary(format!(
                "{} bytes exceeds the maximum of {MAX_BOUNDARY_LENGTH}",
                value.len()
            )));
        }
        if value.iter().any(|&b| b == b'\r' || b == b'\n') {
            return Err(Error::InvalidBoundary(
                "line breaks are not allowed".to_string(),
            ));
        }

        let mut delimiter = Vec::with_capacity(CRLF.len() + DASHES.len() + value.len());
        delimiter.extend_from_slice(CRLF);
        delimiter.extend_from_slice(DASHES);
        delimiter.extend_from_slice(value);
        let finder = Finder::new(&delimiter).into_owned();

        Ok(Self { delimiter, finder })
    }

    /// Returns the boundary parameter value.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.delimiter[CRLF.len() + DASHES.len()..]
    }

    /// Returns the full delimiter, `CRLF "--" value`.
    #[must_use]
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// Number of trailing bytes that cannot be classified yet.
    #[must_use]
    pub fn margin(&self) -> usize {
        self.delimiter.len() + TRAILING_CONTEXT - 1
    }

    /// Finds the first delimiter in `window` and classifies it.
    ///
    /// With `eof` set no more bytes will follow, so everything is decided.
    #[must_use]
    pub fn scan(&self, window: &[u8], eof: bool) -> Scan {
        let Some(index) = self.finder.find(window) else {
            let safe = if eof {
                window.len()
            } else {
                window.len().saturating_sub(self.margin())
            };
            return Scan::Clear { safe };
        };

        let after = &window[index + self.delimiter.len()..];
        match classify(after, eof) {
            Some(kind) => Scan::Delimiter { index, kind },
            None => Scan::Clear { safe: index },
        }
    }

    /// Checks whether `window` starts with a delimiter.
    #[must_use]
    pub fn scan_start(&self, window: &[u8], eof: bool) -> StartScan {
        if window.len() < self.delimiter.len() {
            return if !eof && self.delimiter.starts_with(window) {
                StartScan::Undecided
            } else {
                StartScan::Absent
            };
        }
        if !window.starts_with(&self.delimiter) {
            return StartScan::Absent;
        }
        match classify(&window[self.delimiter.len()..], eof) {
            Some(DelimiterKind::Literal) => StartScan::Absent,
            Some(kind) => StartScan::Delimiter(kind),
            None => StartScan::Undecided,
        }
    }
}

/// Classifies the bytes following a delimiter, or `None` if more are needed.
#[must_use]
pub fn classify(after: &[u8], eof: bool) -> Option<DelimiterKind> {
    if after.starts_with(CRLF) {
        return Some(DelimiterKind::Part);
    }
    if let Some(rest) = after.strip_prefix(DASHES) {
        if rest.starts_with(CRLF) {
            return Some(DelimiterKind::Close);
        }
        if CRLF.starts_with(rest) {
            // "--" at the very end of input closes without the final CRLF
            return if eof {
                Some(DelimiterKind::Close)
            } else {
                None
            };
        }
        return Some(DelimiterKind::Literal);
    }
    if !eof && (CRLF.starts_with(after) || DASHES.starts_with(after)) {
        return None;
    }
    Some(DelimiterKind::Literal)
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        self.delimiter == other.delimiter
    }
}

impl Eq for Boundary {}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Boundary")
            .field(&String::from_utf8_lossy(self.value()))
            .finish()
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.value()))
    }
}
