//! Part headers and the incremental header block scanner.

use memchr::{memchr, memmem};
use std::collections::HashMap;

const CRLF: &[u8] = b"\r\n";

/// A completed `(name, value)` header pair. Names are lowercase.
pub type HeaderPair = (String, String);

/// Headers of a single part.
///
/// Names are case-insensitive and unique: setting a name that already exists
/// replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: HashMap<String, String>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header value, returning the value it replaced.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into().to_ascii_lowercase();
        self.headers.insert(name, value.into())
    }

    /// Gets the value of a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns the number of distinct headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Extend<HeaderPair> for Headers {
    fn extend<T: IntoIterator<Item = HeaderPair>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

/// Result of feeding bytes to a [`HeaderBlockScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderEvent {
    /// Header lines completed by this call. May be empty.
    Pairs(Vec<HeaderPair>),
    /// The block is finished; these are the last pairs.
    Complete(Vec<HeaderPair>),
    /// A line at this block offset has no `:` delimiter.
    MalformedHeader {
        /// Byte offset of the line within the block.
        offset: usize,
    },
    /// The block grew past the configured limit.
    TooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
}

/// Incremental scanner for a header block.
///
/// The input is fed in arbitrary pieces; lines are split on CRLF and each
/// line at its first colon. A line that starts with a space or tab continues
/// the previous value. A pair is only reported once the next line shows it
/// is not continued, so the last pair arrives with [`HeaderEvent::Complete`].
///
/// Blank lines are skipped: the caller locates the block terminator and only
/// feeds the bytes in front of it.
#[derive(Debug, Clone)]
pub struct HeaderBlockScanner {
    /// Bytes after the last CRLF.
    pending: Vec<u8>,
    /// Block offset of `pending[0]`.
    pending_offset: usize,
    /// Total bytes fed so far.
    fed: usize,
    /// Last header seen; it may still be continued.
    current: Option<HeaderPair>,
    limit: usize,
}

impl HeaderBlockScanner {
    /// Creates a scanner that rejects blocks larger than `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            pending_offset: 0,
            fed: 0,
            current: None,
            limit,
        }
    }

    /// Returns the number of bytes fed so far.
    #[must_use]
    pub const fn bytes_fed(&self) -> usize {
        self.fed
    }

    /// Feeds the next piece of the block.
    pub fn feed(&mut self, bytes: &[u8]) -> HeaderEvent {
        self.fed = self.fed.saturating_add(bytes.len());
        if self.fed > self.limit {
            return HeaderEvent::TooLarge { limit: self.limit };
        }

        self.pending.extend_from_slice(bytes);

        let mut pairs = Vec::new();
        let mut start = 0;
        while let Some(pos) = memmem::find(&self.pending[start..], CRLF) {
            let end = start + pos;
            let offset = self.pending_offset + start;
            if let Err(offset) =
                accept_line(&mut self.current, &self.pending[start..end], offset, &mut pairs)
            {
                return HeaderEvent::MalformedHeader { offset };
            }
            start = end + CRLF.len();
        }

        self.pending.drain(..start);
        self.pending_offset += start;
        HeaderEvent::Pairs(pairs)
    }

    /// Finishes the block, flushing the last line and the last pair.
    pub fn finish(&mut self) -> HeaderEvent {
        let rest = std::mem::take(&mut self.pending);
        let mut pairs = Vec::new();
        if let Err(offset) = accept_line(&mut self.current, &rest, self.pending_offset, &mut pairs) {
            return HeaderEvent::MalformedHeader { offset };
        }
        self.pending_offset += rest.len();
        pairs.extend(self.current.take());
        HeaderEvent::Complete(pairs)
    }
}

fn accept_line(
    current: &mut Option<HeaderPair>,
    line: &[u8],
    offset: usize,
    pairs: &mut Vec<HeaderPair>,
) -> std::result::Result<(), usize> {
    let Some(&first) = line.first() else {
        return Ok(());
    };

    if first == b' ' || first == b'\t' {
        let (_, value) = current.as_mut().ok_or(offset)?;
        let continuation = String::from_utf8_lossy(line);
        let continuation = continuation.trim();
        if !continuation.is_empty() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(continuation);
        }
        return Ok(());
    }

    let colon = memchr(b':', line).ok_or(offset)?;
    let name = String::from_utf8_lossy(&line[..colon])
        .trim()
        .to_ascii_lowercase();
    if name.is_empty() {
        return Err(offset);
    }
    let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();

    pairs.extend(current.replace((name, value)));
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect
)]
mod tests {
    use super::*;

    fn pair(name: &str, value: &str) -> HeaderPair {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_headers_set_get() {
        let mut headers = Headers::new();
        assert_eq!(headers.set("Content-Type", "text/plain"), None);
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_headers_unique() {
        let mut headers = Headers::new();
        headers.set("To", "alice@example.com");
        let previous = headers.set("to", "bob@example.com");
        assert_eq!(previous.as_deref(), Some("alice@example.com"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("To"), Some("bob@example.com"));
    }

    #[test]
    fn test_scanner_leading_crlf() {
        let mut scanner = HeaderBlockScanner::new(1024);
        assert_eq!(
            scanner.feed(b"\r\nA: 1\r\nB:2"),
            HeaderEvent::Pairs(vec![pair("a", "1")])
        );
        assert_eq!(scanner.finish(), HeaderEvent::Complete(vec![pair("b", "2")]));
    }

    #[test]
    fn test_scanner_empty_block() {
        let mut scanner = HeaderBlockScanner::new(1024);
        assert_eq!(scanner.feed(b""), HeaderEvent::Pairs(vec![]));
        assert_eq!(scanner.finish(), HeaderEvent::Complete(vec![]));
    }

    #[test]
    fn test_scanner_split_everywhere() {
        let block = b"\r\nContent-Type: text/html\r\nX-Long: a\r\n\tb\r\nX-Last: z";
        for split in 0..=block.len() {
            let mut scanner = HeaderBlockScanner::new(1024);
            let mut pairs = Vec::new();
            for event in [
                scanner.feed(&block[..split]),
                scanner.feed(&block[split..]),
                scanner.finish(),
            ] {
                match event {
                    HeaderEvent::Pairs(p) | HeaderEvent::Complete(p) => pairs.extend(p),
                    other => panic!("unexpected {other:?} at split {split}"),
                }
            }
            assert_eq!(
                pairs,
                vec![
                    pair("content-type", "text/html"),
                    pair("x-long", "a b"),
                    pair("x-last", "z"),
                ],
                "split at {split}"
            );
        }
    }

    #[test]
    fn test_scanner_malformed_offset() {
        let mut scanner = HeaderBlockScanner::new(1024);
        assert_eq!(
            scanner.feed(b"\r\nA: 1\r\nbroken\r\n"),
            HeaderEvent::MalformedHeader { offset: 8 }
        );
    }

    #[test]
    fn test_scanner_malformed_last_line() {
        let mut scanner = HeaderBlockScanner::new(1024);
        assert_eq!(scanner.feed(b"\r\n: empty name"), HeaderEvent::Pairs(vec![]));
        assert_eq!(scanner.finish(), HeaderEvent::MalformedHeader { offset: 2 });
    }

    #[test]
    fn test_scanner_continuation_without_header() {
        let mut scanner = HeaderBlockScanner::new(1024);
        assert_eq!(
            scanner.feed(b"\r\n  orphan\r\n"),
            HeaderEvent::MalformedHeader { offset: 2 }
        );
    }

    #[test]
    fn test_scanner_too_large() {
        let mut scanner = HeaderBlockScanner::new(8);
        assert_eq!(scanner.feed(b"\r\nA: 1"), HeaderEvent::Pairs(vec![]));
        assert_eq!(scanner.bytes_fed(), 6);
        assert_eq!(scanner.feed(b"234"), HeaderEvent::TooLarge { limit: 8 });
    }
}
