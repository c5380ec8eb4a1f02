//! The incremental multipart parser.
//!
//! Bytes are pushed in with [`MultipartParser::write`] in chunks of any size.
//! The parser keeps a small lookbehind buffer of bytes it could not decide
//! on yet (a delimiter may be split across two writes) and hands everything
//! else to the part tree as soon as it is unambiguous.
//!
//! # Example
//!
//! ```ignore
//! use multiparse::{CollectingObserver, MultipartParser, PartPath};
//!
//! let mut parser = MultipartParser::with_observer("boundary", CollectingObserver::new())?;
//! parser.write(b"--boundary\r\nContent-Type: text/plain\r\n\r\nhel")?;
//! parser.write(b"lo\r\n--boundary--\r\n")?;
//! parser.end(None)?;
//!
//! let part = parser.part(&PartPath::root().child(0)).unwrap();
//! assert_eq!(part.body(), b"hello");
//! ```

use crate::boundary::{Boundary, DelimiterKind, Scan, StartScan};
use crate::config::ParserConfig;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::{HeaderBlockScanner, HeaderEvent};
use crate::observer::{NoopObserver, PartObserver};
use crate::part::{MessagePart, PartPath};
use crate::stack::PathStack;
use bytes::{Buf, BytesMut};
use memchr::memmem;
use std::fmt;

const CRLF: &[u8] = b"\r\n";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Where the parser is within the current part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    /// At the start of a body, before its first delimiter or data byte.
    #[default]
    Start,
    /// Inside a header block.
    Headers,
    /// Inside a body, scanning for the active delimiter.
    Body,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Headers => write!(f, "headers"),
            Self::Body => write!(f, "body"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Running,
    Failed,
    Ended,
}

/// Incremental parser for a (possibly nested) multipart body.
///
/// The parser owns the part tree and a single [`PartObserver`] that sees the
/// activity of every part in it.
#[derive(Debug)]
pub struct MultipartParser<O: PartObserver = NoopObserver> {
    config: ParserConfig,
    root: MessagePart,
    stack: PathStack,
    state: ParserState,
    status: Status,
    lookbehind: BytesMut,
    /// Part receiving body bytes and headers.
    current: PartPath,
    headers: HeaderBlockScanner,
    /// A trailer was just consumed; its line break is still buffered.
    trailer_crlf: bool,
    congested: bool,
    observer: O,
}

impl MultipartParser<NoopObserver> {
    /// Creates a parser for a body delimited by `boundary`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] for an empty boundary and
    /// [`Error::InvalidBoundary`] for one longer than 70 bytes or containing
    /// a line break.
    pub fn new(boundary: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_observer(boundary, NoopObserver)
    }
}

impl<O: PartObserver> MultipartParser<O> {
    /// Creates a parser that reports to `observer`.
    ///
    /// # Errors
    ///
    /// Same as [`MultipartParser::new`].
    pub fn with_observer(boundary: impl AsRef<[u8]>, observer: O) -> Result<Self> {
        Self::with_config(boundary, ParserConfig::default(), observer)
    }

    /// Creates a parser with explicit limits.
    ///
    /// # Errors
    ///
    /// Same as [`MultipartParser::new`].
    pub fn with_config(boundary: impl AsRef<[u8]>, config: ParserConfig, observer: O) -> Result<Self> {
        let boundary = Boundary::new(boundary)?;
        let mut root = MessagePart::root(config.high_water_mark);
        root.set_boundary(boundary.clone());

        let mut lookbehind = BytesMut::with_capacity(boundary.margin() * 2);
        // The first delimiter of a body may omit its leading line break.
        lookbehind.extend_from_slice(CRLF);

        tracing::debug!(%boundary, "multipart parser created");

        Ok(Self {
            headers: HeaderBlockScanner::new(config.max_header_size),
            stack: PathStack::new(boundary),
            config,
            root,
            state: ParserState::Start,
            status: Status::Running,
            lookbehind,
            current: PartPath::root(),
            trailer_crlf: false,
            congested: false,
            observer,
        })
    }

    /// Creates a parser from a `Content-Type` header value.
    ///
    /// The value is also recorded as the root's `content-type` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the value cannot be parsed,
    /// [`Error::NotMultipart`] if it is not `multipart/*` and
    /// [`Error::MissingBoundary`] if it has no boundary parameter.
    pub fn from_content_type(value: &str, observer: O) -> Result<Self> {
        let content_type = ContentType::parse(value)?;
        if !content_type.is_multipart() {
            return Err(Error::NotMultipart(value.to_string()));
        }
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

        let mut parser = Self::with_config(boundary, ParserConfig::default(), observer)?;
        parser.root.headers_mut().set("content-type", value);
        Ok(parser)
    }

    /// Feeds the next chunk of input.
    ///
    /// Returns `Ok(true)` when a part that received data during this call, or
    /// the part currently receiving input, is at or above its high-water
    /// mark; the caller should drain it before writing more. Data errors are
    /// reported to the observer, not here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ended`] after [`end`](Self::end),
    /// [`Error::Aborted`] after a fatal data error and [`Error::Invariant`]
    /// if the parser's state is inconsistent.
    pub fn write(&mut self, chunk: &[u8]) -> Result<bool> {
        match self.status {
            Status::Ended => return Err(Error::Ended),
            Status::Failed => return Err(Error::Aborted),
            Status::Running => {}
        }

        tracing::trace!(len = chunk.len(), state = %self.state, "write");
        self.congested = false;
        self.lookbehind.extend_from_slice(chunk);
        self.process(false)?;

        Ok(self.congested || self.is_congested())
    }

    /// Feeds an optional last chunk and finishes the input.
    ///
    /// The root part is always closed and the observer always receives
    /// `on_finished`, so partial results stay inspectable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnterminatedMultipart`] if containers are still open
    /// (also reported to the observer), [`Error::Ended`] if called twice and
    /// [`Error::Aborted`] if a fatal data error occurred.
    pub fn end(&mut self, chunk: Option<&[u8]>) -> Result<()> {
        match self.status {
            Status::Ended => return Err(Error::Ended),
            Status::Failed => {
                self.finish();
                return Err(Error::Aborted);
            }
            Status::Running => {}
        }

        self.congested = false;
        if let Some(chunk) = chunk {
            self.lookbehind.extend_from_slice(chunk);
        }
        self.process(true)?;

        if self.status == Status::Failed {
            self.finish();
            return Err(Error::Aborted);
        }

        let depth = self.stack.depth();
        let result = if depth > 0 {
            let error = Error::UnterminatedMultipart { depth };
            tracing::warn!(%error, "input ended inside a multipart body");
            self.observer.on_error(&error);
            Err(error)
        } else {
            Ok(())
        };

        self.finish();
        result
    }

    /// Returns the root part.
    #[must_use]
    pub const fn root(&self) -> &MessagePart {
        &self.root
    }

    /// Returns the part at `path`.
    #[must_use]
    pub fn part(&self, path: &PartPath) -> Option<&MessagePart> {
        self.root.find(path)
    }

    /// Returns the part at `path` mutably, to drain its buffer.
    pub fn part_mut(&mut self, path: &PartPath) -> Option<&mut MessagePart> {
        self.root.find_mut(path)
    }

    /// Returns the path of the part currently receiving input.
    #[must_use]
    pub const fn current_path(&self) -> &PartPath {
        &self.current
    }

    /// Returns the scanning state.
    #[must_use]
    pub const fn state(&self) -> ParserState {
        self.state
    }

    /// Returns the number of open multipart containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Returns the active boundary.
    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        self.stack.current_boundary()
    }

    /// Returns the lookahead the active boundary needs.
    #[must_use]
    pub fn margin(&self) -> usize {
        self.stack.current_boundary().margin()
    }

    /// Returns the bytes held back for the next write.
    #[must_use]
    pub fn lookbehind(&self) -> &[u8] {
        &self.lookbehind
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns the observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Returns the observer mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Returns `true` while the part currently receiving input is congested.
    #[must_use]
    pub fn is_congested(&self) -> bool {
        self.root
            .find(&self.current)
            .is_some_and(MessagePart::is_congested)
    }

    /// Returns `true` once [`end`](Self::end) has run.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.status == Status::Ended
    }

    /// Returns `true` after a fatal data error.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.status == Status::Failed
    }

    /// Consumes the parser, returning the part tree and the observer.
    pub fn into_parts(self) -> (MessagePart, O) {
        (self.root, self.observer)
    }

    fn process(&mut self, eof: bool) -> Result<()> {
        while self.status == Status::Running {
            let progressed = match self.state {
                ParserState::Start => self.step_start(eof)?,
                ParserState::Headers => self.step_headers(eof)?,
                ParserState::Body => self.step_body(eof)?,
            };
            if !progressed {
                break;
            }
        }
        Ok(())
    }

    fn step_start(&mut self, eof: bool) -> Result<bool> {
        match self.stack.current_boundary().scan_start(&self.lookbehind, eof) {
            StartScan::Delimiter(kind) => {
                self.on_delimiter(kind)?;
                Ok(true)
            }
            StartScan::Undecided => Ok(false),
            StartScan::Absent => {
                let skip = CRLF.len().min(self.lookbehind.len());
                self.lookbehind.advance(skip);
                self.state = ParserState::Body;
                Ok(true)
            }
        }
    }

    fn step_body(&mut self, eof: bool) -> Result<bool> {
        if self.trailer_crlf {
            if !self.strip_trailer_crlf(eof) {
                return Ok(false);
            }
            self.trailer_crlf = false;
        }

        if self.stack.is_empty() {
            // Epilogue of the outermost body.
            self.emit(self.lookbehind.len())?;
            return Ok(false);
        }

        match self.stack.current_boundary().scan(&self.lookbehind, eof) {
            Scan::Clear { safe } => {
                self.emit(safe)?;
                Ok(false)
            }
            Scan::Delimiter {
                index,
                kind: DelimiterKind::Literal,
            } => {
                tracing::trace!(index, "boundary-like content");
                self.emit(index + 1)?;
                Ok(true)
            }
            Scan::Delimiter { index, kind } => {
                self.emit(index)?;
                self.on_delimiter(kind)?;
                Ok(true)
            }
        }
    }

    /// Drops the line break ending a trailer unless it opens the next
    /// delimiter. Returns `false` while more input is needed to tell.
    fn strip_trailer_crlf(&mut self, eof: bool) -> bool {
        if !self.stack.is_empty() {
            match self.stack.current_boundary().scan_start(&self.lookbehind, eof) {
                StartScan::Undecided => return false,
                StartScan::Delimiter(_) => return true,
                StartScan::Absent => {}
            }
        } else if self.lookbehind.len() < CRLF.len() && !eof {
            return false;
        }

        let skip = CRLF.len().min(self.lookbehind.len());
        self.lookbehind.advance(skip);
        true
    }

    fn step_headers(&mut self, eof: bool) -> Result<bool> {
        if let Some(index) = memmem::find(&self.lookbehind, HEADER_TERMINATOR) {
            let event = self.headers.feed(&self.lookbehind[..index]);
            if !self.apply_headers(event)? {
                return Ok(false);
            }
            // Keep the second line break; it precedes an immediate delimiter.
            self.lookbehind.advance(index + CRLF.len());
            self.complete_headers()?;
            self.check_left_headers()?;
            return Ok(true);
        }

        if eof {
            let event = self.headers.feed(&self.lookbehind);
            if !self.apply_headers(event)? {
                return Ok(false);
            }
            self.lookbehind.clear();
            self.complete_headers()?;
            self.check_left_headers()?;
            return Ok(true);
        }

        // The last bytes may be the start of the terminator.
        let len = self
            .lookbehind
            .len()
            .saturating_sub(HEADER_TERMINATOR.len() - 1);
        if len > 0 {
            let event = self.headers.feed(&self.lookbehind[..len]);
            self.lookbehind.advance(len);
            self.apply_headers(event)?;
        }
        Ok(false)
    }

    /// Applies scanned pairs to the current part. Returns `false` if the
    /// block was rejected.
    fn apply_headers(&mut self, event: HeaderEvent) -> Result<bool> {
        match event {
            HeaderEvent::Pairs(pairs) | HeaderEvent::Complete(pairs) => {
                self.current_part_mut()?.headers_mut().extend(pairs);
                Ok(true)
            }
            HeaderEvent::MalformedHeader { offset } => {
                self.fail(Error::MalformedHeader { offset });
                Ok(false)
            }
            HeaderEvent::TooLarge { limit } => {
                self.fail(Error::HeaderTooLarge { limit });
                Ok(false)
            }
        }
    }

    fn complete_headers(&mut self) -> Result<()> {
        let event = self.headers.finish();
        if !self.apply_headers(event)? {
            return Ok(());
        }
        self.state = ParserState::Start;

        let part = self
            .root
            .find_mut(&self.current)
            .ok_or_else(|| missing_part(&self.current))?;
        self.observer.on_headers(part);

        let Some(content_type) = part.content_type().filter(ContentType::is_multipart) else {
            return Ok(());
        };
        let Some(value) = content_type.boundary() else {
            return Ok(());
        };

        let boundary = match Boundary::new(value) {
            Ok(boundary) => boundary,
            Err(error) => {
                // The part is kept as an opaque leaf.
                tracing::warn!(part = %self.current, %error, "unusable nested boundary");
                self.observer.on_error(&error);
                return Ok(());
            }
        };

        if self.stack.depth() >= self.config.max_depth {
            self.fail(Error::NestingTooDeep {
                limit: self.config.max_depth,
            });
            return Ok(());
        }

        tracing::debug!(part = %self.current, %boundary, "nested multipart");
        part.set_boundary(boundary.clone());
        self.observer.on_multipart(part);
        self.stack.push(self.current.clone(), boundary);
        Ok(())
    }

    /// A completed header block must move the parser out of `Headers`
    /// unless it was rejected.
    fn check_left_headers(&self) -> Result<()> {
        if self.status == Status::Running && self.state == ParserState::Headers {
            return Err(Error::Invariant(format!(
                "header block of part {} completed without leaving the header state",
                self.current
            )));
        }
        Ok(())
    }

    fn on_delimiter(&mut self, kind: DelimiterKind) -> Result<()> {
        let delimiter_len = self.stack.current_boundary().delimiter().len();
        let container = self.stack.current_part().clone();

        match kind {
            DelimiterKind::Part => {
                self.lookbehind.advance(delimiter_len);
                let parent = self
                    .root
                    .find_mut(&container)
                    .ok_or_else(|| missing_part(&container))?;
                let child = parent.add_child(&mut self.observer);
                self.current = child.path().clone();
                self.headers = HeaderBlockScanner::new(self.config.max_header_size);
                self.state = ParserState::Headers;
                tracing::trace!(part = %self.current, "delimiter");
            }
            DelimiterKind::Close => {
                self.lookbehind.advance(delimiter_len + 2);
                self.root
                    .find_mut(&container)
                    .ok_or_else(|| missing_part(&container))?
                    .mark_trailer(&mut self.observer);
                self.stack.pop()?;
                tracing::trace!(part = %container, depth = self.stack.depth(), "trailer");
                // Epilogue bytes belong to the container that just closed.
                self.current = container;
                self.trailer_crlf = true;
                self.state = ParserState::Body;
            }
            DelimiterKind::Literal => {
                return Err(Error::Invariant(
                    "literal delimiter handled as a boundary".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Moves the first `len` buffered bytes to the current part.
    fn emit(&mut self, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let part = self
            .root
            .find_mut(&self.current)
            .ok_or_else(|| missing_part(&self.current))?;
        if part.is_closed() {
            return Err(Error::Invariant(format!(
                "data for closed part {}",
                self.current
            )));
        }
        if part.append_data(&self.lookbehind[..len], &mut self.observer) {
            self.congested = true;
        }
        self.lookbehind.advance(len);
        Ok(())
    }

    fn current_part_mut(&mut self) -> Result<&mut MessagePart> {
        self.root
            .find_mut(&self.current)
            .ok_or_else(|| missing_part(&self.current))
    }

    fn fail(&mut self, error: Error) {
        tracing::warn!(part = %self.current, %error, "multipart data error");
        self.observer.on_error(&error);
        self.status = Status::Failed;
        self.lookbehind.clear();
    }

    fn finish(&mut self) {
        self.root.close(&mut self.observer);
        self.observer.on_finished(&self.root);
        self.status = Status::Ended;
        tracing::debug!(parts = self.root.children().len(), "multipart parser ended");
    }
}

fn missing_part(path: &PartPath) -> Error {
    Error::Invariant(format!("part {path} is not in the tree"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::observer::{CollectingObserver, ParseEvent};

    fn collecting(boundary: &str) -> MultipartParser<CollectingObserver> {
        MultipartParser::with_observer(boundary, CollectingObserver::new()).unwrap()
    }

    #[test]
    fn test_new_parser() {
        let parser = MultipartParser::new("boundary").unwrap();
        assert_eq!(parser.lookbehind(), b"\r\n");
        assert_eq!(parser.state(), ParserState::Start);
        assert_eq!(parser.depth(), 1);
        assert_eq!(parser.margin(), 15);
        assert!(parser.root().is_multipart());
        assert!(!parser.is_ended());
    }

    #[test]
    fn test_new_parser_rejects_bad_boundary() {
        assert_eq!(MultipartParser::new("").unwrap_err(), Error::MissingBoundary);
        assert!(matches!(
            MultipartParser::new("x".repeat(71)),
            Err(Error::InvalidBoundary(_))
        ));
    }

    #[test]
    fn test_margin_is_retained() {
        let mut parser = MultipartParser::new("boundary").unwrap();
        parser
            .write(b"some body text before the buffer contents")
            .unwrap();

        assert_eq!(parser.state(), ParserState::Body);
        assert_eq!(parser.root().body(), b"some body text before the ");
        assert_eq!(parser.lookbehind(), b"buffer contents");
    }

    #[test]
    fn test_single_part() {
        let mut parser = collecting("boundary");
        parser
            .write(b"--boundary\r\nX-Name: value\r\n\r\nhello\r\n--boundary--\r\n")
            .unwrap();
        parser.end(None).unwrap();

        let first = PartPath::root().child(0);
        let part = parser.part(&first).unwrap();
        assert_eq!(part.headers().get("x-name"), Some("value"));
        assert_eq!(part.body(), b"hello");
        assert!(part.is_closed());
        assert!(parser.root().has_trailer());
        assert!(parser.root().is_closed());
        assert!(parser.root().body().is_empty());

        assert_eq!(
            parser.observer().events,
            vec![
                ParseEvent::PartStarted(first.clone()),
                ParseEvent::HeadersComplete(first.clone()),
                ParseEvent::DataAvailable(first.clone(), bytes::Bytes::from_static(b"hello")),
                ParseEvent::PartClosed(first.clone()),
                ParseEvent::TrailerReached(PartPath::root()),
                ParseEvent::PartClosed(PartPath::root()),
                ParseEvent::Finished,
            ]
        );
    }

    #[test]
    fn test_header_block_keeps_possible_terminator() {
        let mut parser = MultipartParser::new("boundary").unwrap();
        parser.write(b"--boundary\r\nContent-Type: te").unwrap();

        assert_eq!(parser.state(), ParserState::Headers);
        assert_eq!(parser.lookbehind(), b" te");

        parser.write(b"xt/plain\r\n\r\nbody").unwrap();
        let part = parser.part(&PartPath::root().child(0)).unwrap();
        assert_eq!(part.headers().get("content-type"), Some("text/plain"));
        assert_eq!(parser.state(), ParserState::Body);
    }

    #[test]
    fn test_boundary_like_text_is_data() {
        let mut parser = MultipartParser::new("boundary").unwrap();
        parser
            .write(b"--boundary\r\n\r\nA\r\n--boundaryX\r\n--boundary--\r\n")
            .unwrap();
        parser.end(None).unwrap();

        let part = parser.part(&PartPath::root().child(0)).unwrap();
        assert_eq!(part.body(), b"A\r\n--boundaryX");
    }

    #[test]
    fn test_preamble_and_epilogue_go_to_root() {
        let mut parser = MultipartParser::new("b").unwrap();
        parser
            .write(b"preamble\r\n--b\r\n\r\nbody\r\n--b--\r\nepilogue")
            .unwrap();
        parser.end(None).unwrap();

        assert_eq!(parser.root().body(), b"preambleepilogue");
        assert_eq!(parser.root().children().len(), 1);
    }

    #[test]
    fn test_write_after_end() {
        let mut parser = MultipartParser::new("boundary").unwrap();
        parser.end(Some(&b"--boundary--"[..])).unwrap();
        assert_eq!(parser.write(b"more"), Err(Error::Ended));
        assert_eq!(parser.end(None), Err(Error::Ended));
    }

    #[test]
    fn test_malformed_header_aborts() {
        let mut parser = collecting("boundary");
        parser
            .write(b"--boundary\r\nnot a header\r\n\r\nbody")
            .unwrap();

        assert!(parser.is_aborted());
        assert_eq!(
            parser.observer().errors(),
            vec![&Error::MalformedHeader { offset: 2 }]
        );
        assert_eq!(parser.write(b"x"), Err(Error::Aborted));
        assert_eq!(parser.end(None), Err(Error::Aborted));
        assert!(parser.root().is_closed());
        assert_eq!(parser.observer().events.last(), Some(&ParseEvent::Finished));
    }

    #[test]
    fn test_header_too_large() {
        let config = ParserConfig::builder().max_header_size(16).build();
        let mut parser =
            MultipartParser::with_config("boundary", config, CollectingObserver::new()).unwrap();
        parser
            .write(b"--boundary\r\nX-Long: aaaaaaaaaaaaaaaaaaaaaaaa")
            .unwrap();

        assert!(parser.is_aborted());
        assert_eq!(
            parser.observer().errors(),
            vec![&Error::HeaderTooLarge { limit: 16 }]
        );
    }

    #[test]
    fn test_nesting_too_deep() {
        let config = ParserConfig::builder().max_depth(1).build();
        let mut parser =
            MultipartParser::with_config("outer", config, CollectingObserver::new()).unwrap();
        parser
            .write(b"--outer\r\nContent-Type: multipart/mixed; boundary=inner\r\n\r\n")
            .unwrap();

        assert!(parser.is_aborted());
        assert_eq!(
            parser.observer().errors(),
            vec![&Error::NestingTooDeep { limit: 1 }]
        );
    }

    #[test]
    fn test_unusable_nested_boundary_is_a_leaf() {
        let mut parser = collecting("outer");
        let long = "x".repeat(80);
        let input = format!(
            "--outer\r\nContent-Type: multipart/mixed; boundary={long}\r\n\r\nbody\r\n--outer--\r\n"
        );
        parser.write(input.as_bytes()).unwrap();
        parser.end(None).unwrap();

        let part = parser.part(&PartPath::root().child(0)).unwrap();
        assert!(!part.is_multipart());
        assert_eq!(part.body(), b"body");
        assert_eq!(parser.observer().errors().len(), 1);
    }

    #[test]
    fn test_nested_container_is_pushed() {
        let mut parser = MultipartParser::new("outer").unwrap();
        parser
            .write(b"--outer\r\nContent-Type: multipart/mixed; boundary=inner\r\n\r\n")
            .unwrap();

        assert_eq!(parser.depth(), 2);
        assert_eq!(parser.boundary().value(), b"inner");
        assert_eq!(parser.margin(), "\r\n--inner".len() + 3);
        assert_eq!(parser.current_path(), &PartPath::root().child(0));
    }

    #[test]
    fn test_congestion_signal() {
        let config = ParserConfig::builder().high_water_mark(4).build();
        let mut parser = MultipartParser::with_config("b", config, NoopObserver).unwrap();

        let congested = parser.write(b"--b\r\n\r\n0123456789abcdef").unwrap();
        assert!(congested);
        assert!(parser.is_congested());

        let path = PartPath::root().child(0);
        parser.part_mut(&path).unwrap().read_all();
        assert!(!parser.is_congested());
    }

    #[test]
    fn test_congestion_persists_until_drained() {
        let config = ParserConfig::builder().high_water_mark(4).build();
        let mut parser = MultipartParser::with_config("b", config, NoopObserver).unwrap();

        assert!(parser.write(b"--b\r\n\r\n0123456789abcdefghij").unwrap());
        assert!(parser.write(b"\r\n--b").unwrap());

        // Completes nothing and delivers no data; the part is still full.
        assert!(parser.write(b"-").unwrap());
        assert_eq!(parser.lookbehind(), b"\r\n--b-");

        let path = PartPath::root().child(0);
        parser.part_mut(&path).unwrap().read_all();
        assert!(!parser.write(b"").unwrap());
    }

    #[test]
    fn test_data_for_closed_part_is_invariant_violation() {
        let mut parser = MultipartParser::new("boundary").unwrap();
        parser.write(b"--boundary\r\n\r\n").unwrap();

        let path = PartPath::root().child(0);
        parser.part_mut(&path).unwrap().close(&mut NoopObserver);

        assert!(matches!(
            parser.write(b"body text that is long enough to be emitted"),
            Err(Error::Invariant(_))
        ));
    }

    #[test]
    fn test_header_state_must_be_left() {
        let mut parser = MultipartParser::new("boundary").unwrap();
        assert!(parser.check_left_headers().is_ok());

        parser.state = ParserState::Headers;
        assert!(matches!(parser.check_left_headers(), Err(Error::Invariant(_))));

        parser.status = Status::Failed;
        assert!(parser.check_left_headers().is_ok());
    }

    #[test]
    fn test_from_content_type() {
        let parser = MultipartParser::from_content_type(
            "multipart/form-data; boundary=\"abc\"",
            NoopObserver,
        )
        .unwrap();
        assert_eq!(parser.boundary().value(), b"abc");
        assert!(parser.root().headers().contains("content-type"));

        assert!(matches!(
            MultipartParser::from_content_type("text/plain", NoopObserver),
            Err(Error::NotMultipart(_))
        ));
        assert_eq!(
            MultipartParser::from_content_type("multipart/mixed", NoopObserver).unwrap_err(),
            Error::MissingBoundary
        );
        assert!(matches!(
            MultipartParser::from_content_type("garbage", NoopObserver),
            Err(Error::InvalidContentType(_))
        ));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ParserState::Start.to_string(), "start");
        assert_eq!(ParserState::Headers.to_string(), "headers");
        assert_eq!(ParserState::Body.to_string(), "body");
    }
}
