//! Message parts and their place in the tree.

use crate::boundary::Boundary;
use crate::content_type::ContentType;
use crate::header::Headers;
use crate::observer::PartObserver;
use bytes::{Bytes, BytesMut};
use std::fmt;

/// Address of a part in the tree: child indices from the root.
///
/// Displayed 1-based and dot-separated like IMAP section numbers, so the
/// second child of the first part is `1.2`. The root displays as `root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartPath(Vec<usize>);

impl PartPath {
    /// The path of the root part.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Creates a path from zero-based child indices.
    #[must_use]
    pub const fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Returns the path of the child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, parent)| Self(parent.to_vec()))
    }

    /// Returns the zero-based child indices.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Returns the number of steps from the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PartPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.0.split_first() else {
            return f.write_str("root");
        };
        write!(f, "{}", first + 1)?;
        for index in rest {
            write!(f, ".{}", index + 1)?;
        }
        Ok(())
    }
}

/// Lifecycle of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartState {
    /// Still receiving data or children.
    #[default]
    Open,
    /// Finished; closed exactly once.
    Closed,
}

/// A node of the message tree.
///
/// A part holds its headers, its children (for multipart containers) and a
/// buffer of body bytes that have not been read yet. Reading the buffer is
/// how a consumer makes room: once the unread bytes reach the high-water
/// mark the part reports congestion and the parser asks its caller to pause.
#[derive(Debug, Clone)]
pub struct MessagePart {
    path: PartPath,
    headers: Headers,
    children: Vec<Self>,
    buffer: BytesMut,
    high_water_mark: usize,
    received: u64,
    state: PartState,
    trailer: bool,
    boundary: Option<Boundary>,
}

impl MessagePart {
    /// Creates an open root part.
    #[must_use]
    pub fn root(high_water_mark: usize) -> Self {
        Self::new(PartPath::root(), high_water_mark)
    }

    fn new(path: PartPath, high_water_mark: usize) -> Self {
        Self {
            path,
            headers: Headers::new(),
            children: Vec::new(),
            buffer: BytesMut::new(),
            high_water_mark,
            received: 0,
            state: PartState::Open,
            trailer: false,
            boundary: None,
        }
    }

    /// Returns the part's address in the tree.
    #[must_use]
    pub const fn path(&self) -> &PartPath {
        &self.path
    }

    /// Returns the part's headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    pub(crate) fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Parses the `Content-Type` header, if present and well formed.
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
    }

    /// Returns the child parts in order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Self> {
        self.children.get(index)
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PartState {
        self.state
    }

    /// Returns `true` once the part is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, PartState::Closed)
    }

    /// Returns `true` once the container reached its closing boundary.
    #[must_use]
    pub const fn has_trailer(&self) -> bool {
        self.trailer
    }

    /// Returns the nested boundary if this part is a multipart container.
    #[must_use]
    pub const fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    /// Returns `true` if this part is a multipart container.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        self.boundary.is_some()
    }

    pub(crate) fn set_boundary(&mut self, boundary: Boundary) {
        self.boundary = Some(boundary);
    }

    /// Finds a descendant (or this part, for an empty path) by path
    /// relative to this part.
    #[must_use]
    pub fn find(&self, path: &PartPath) -> Option<&Self> {
        path.indices()
            .iter()
            .try_fold(self, |part, &index| part.children.get(index))
    }

    /// Mutable variant of [`MessagePart::find`].
    pub fn find_mut(&mut self, path: &PartPath) -> Option<&mut Self> {
        path.indices()
            .iter()
            .try_fold(self, |part, &index| part.children.get_mut(index))
    }

    /// Closes the open child, if any, and appends a new open child.
    pub fn add_child<O>(&mut self, observer: &mut O) -> &mut Self
    where
        O: PartObserver + ?Sized,
    {
        if let Some(previous) = self.children.last_mut() {
            previous.close(observer);
        }

        let index = self.children.len();
        let child = Self::new(self.path.child(index), self.high_water_mark);
        self.children.push(child);

        let child = &mut self.children[index];
        observer.on_part_started(child);
        child
    }

    /// Appends body bytes and reports whether the part is now congested.
    pub fn append_data<O>(&mut self, data: &[u8], observer: &mut O) -> bool
    where
        O: PartObserver + ?Sized,
    {
        if data.is_empty() {
            return self.is_congested();
        }

        self.buffer.extend_from_slice(data);
        self.received += data.len() as u64;
        observer.on_data(self, data);
        self.is_congested()
    }

    /// Closes the part, closing its open child first.
    ///
    /// Closing a closed part does nothing.
    pub fn close<O>(&mut self, observer: &mut O)
    where
        O: PartObserver + ?Sized,
    {
        if self.is_closed() {
            return;
        }
        if let Some(last) = self.children.last_mut() {
            last.close(observer);
        }
        self.state = PartState::Closed;
        observer.on_part_closed(self);
    }

    /// Records that the container reached its closing boundary.
    ///
    /// The open child is closed; the container itself stays open for its
    /// epilogue and is closed by its parent or at the end of input.
    pub fn mark_trailer<O>(&mut self, observer: &mut O)
    where
        O: PartObserver + ?Sized,
    {
        if self.trailer {
            return;
        }
        if let Some(last) = self.children.last_mut() {
            last.close(observer);
        }
        self.trailer = true;
        observer.on_trailer(self);
    }

    /// Returns the unread body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the number of unread body bytes.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the total number of body bytes ever appended.
    #[must_use]
    pub const fn bytes_received(&self) -> u64 {
        self.received
    }

    /// Returns the unread byte count at which the part reports congestion.
    #[must_use]
    pub const fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Returns `true` while the unread bytes are at or above the high-water
    /// mark.
    #[must_use]
    pub fn is_congested(&self) -> bool {
        self.buffer.len() >= self.high_water_mark
    }

    /// Takes up to `max` unread bytes.
    pub fn read(&mut self, max: usize) -> Bytes {
        let len = max.min(self.buffer.len());
        self.buffer.split_to(len).freeze()
    }

    /// Takes all unread bytes.
    pub fn read_all(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::observer::{CollectingObserver, NoopObserver, ParseEvent};

    #[test]
    fn test_part_path() {
        let root = PartPath::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "root");
        assert_eq!(root.parent(), None);

        let path = root.child(0).child(1);
        assert_eq!(path.indices(), &[0, 1]);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.to_string(), "1.2");
        assert_eq!(path.parent(), Some(PartPath::from_indices(vec![0])));
    }

    #[test]
    fn test_new_part_is_empty() {
        let root = MessagePart::root(8);
        assert!(root.headers().is_empty());
        assert!(root.children().is_empty());
        assert_eq!(root.state(), PartState::Open);
        assert!(!root.has_trailer());
        assert!(!root.is_multipart());
    }

    #[test]
    fn test_add_child_closes_previous() {
        let mut observer = CollectingObserver::new();
        let mut root = MessagePart::root(8);

        root.add_child(&mut observer);
        root.add_child(&mut observer);

        let first = PartPath::root().child(0);
        let second = PartPath::root().child(1);
        assert_eq!(
            observer.events,
            vec![
                ParseEvent::PartStarted(first.clone()),
                ParseEvent::PartClosed(first),
                ParseEvent::PartStarted(second),
            ]
        );
        assert!(root.children()[0].is_closed());
        assert!(!root.children()[1].is_closed());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut observer = CollectingObserver::new();
        let mut root = MessagePart::root(8);

        root.close(&mut observer);
        root.close(&mut observer);

        assert_eq!(
            observer.events,
            vec![ParseEvent::PartClosed(PartPath::root())]
        );
    }

    #[test]
    fn test_close_cascades_to_open_descendants() {
        let mut observer = CollectingObserver::new();
        let mut root = MessagePart::root(8);
        root.add_child(&mut observer).add_child(&mut observer);
        observer.clear();

        root.close(&mut observer);

        assert_eq!(
            observer.events,
            vec![
                ParseEvent::PartClosed(PartPath::from_indices(vec![0, 0])),
                ParseEvent::PartClosed(PartPath::from_indices(vec![0])),
                ParseEvent::PartClosed(PartPath::root()),
            ]
        );
    }

    #[test]
    fn test_mark_trailer_closes_last_child_only() {
        let mut observer = CollectingObserver::new();
        let mut root = MessagePart::root(8);
        root.add_child(&mut observer);
        observer.clear();

        root.mark_trailer(&mut observer);
        root.mark_trailer(&mut observer);

        assert_eq!(
            observer.events,
            vec![
                ParseEvent::PartClosed(PartPath::root().child(0)),
                ParseEvent::TrailerReached(PartPath::root()),
            ]
        );
        assert!(root.has_trailer());
        assert!(!root.is_closed());
    }

    #[test]
    fn test_congestion_and_read() {
        let mut observer = NoopObserver;
        let mut part = MessagePart::root(4);

        assert!(!part.append_data(b"ab", &mut observer));
        assert!(part.append_data(b"cd", &mut observer));
        assert!(part.is_congested());

        assert_eq!(part.read(3), Bytes::from_static(b"abc"));
        assert!(!part.is_congested());
        assert_eq!(part.body(), b"d");
        assert_eq!(part.read(10), Bytes::from_static(b"d"));
        assert_eq!(part.bytes_received(), 4);
        assert_eq!(part.buffered_len(), 0);
    }

    #[test]
    fn test_find() {
        let mut observer = NoopObserver;
        let mut root = MessagePart::root(8);
        root.add_child(&mut observer);
        root.add_child(&mut observer)
            .add_child(&mut observer)
            .headers_mut()
            .set("X-Mark", "deep");

        let path = PartPath::from_indices(vec![1, 0]);
        assert_eq!(root.find(&path).unwrap().headers().get("x-mark"), Some("deep"));
        assert_eq!(root.find(&PartPath::root()).unwrap().path(), &PartPath::root());
        assert!(root.find(&PartPath::from_indices(vec![2])).is_none());
        assert!(root.find_mut(&path).is_some());
    }

    #[test]
    fn test_content_type() {
        let mut part = MessagePart::root(8);
        assert!(part.content_type().is_none());
        part.headers_mut()
            .set("Content-Type", "multipart/mixed; boundary=inner");
        assert_eq!(part.content_type().unwrap().boundary(), Some("inner"));
    }
}
