//! Notifications from the part tree.
//!
//! Every change to the tree is reported through a [`PartObserver`] owned by
//! the parser. A single observer sees the activity of the root and of every
//! nested container, so callers never have to walk the tree to find out what
//! happened.
//!
//! # Example
//!
//! ```ignore
//! use multiparse::{MessagePart, MultipartParser, PartObserver};
//!
//! struct Uploads {
//!     files: usize,
//! }
//!
//! impl PartObserver for Uploads {
//!     fn on_headers(&mut self, part: &MessagePart) {
//!         if part.headers().get("content-type").is_some() {
//!             self.files += 1;
//!         }
//!     }
//! }
//!
//! let mut parser = MultipartParser::with_observer("boundary", Uploads { files: 0 })?;
//! ```

use crate::error::Error;
use crate::part::{MessagePart, PartPath};
use bytes::Bytes;

/// Receiver of part tree notifications.
///
/// All methods have empty defaults; implement the ones you need.
pub trait PartObserver {
    /// A new part was appended to a container. Its headers are still empty.
    fn on_part_started(&mut self, part: &MessagePart) {
        let _ = part;
    }

    /// The header block of a part was parsed.
    fn on_headers(&mut self, part: &MessagePart) {
        let _ = part;
    }

    /// A part turned out to be a multipart container with its own boundary.
    fn on_multipart(&mut self, part: &MessagePart) {
        let _ = part;
    }

    /// Body bytes were appended to a part.
    fn on_data(&mut self, part: &MessagePart, data: &[u8]) {
        let _ = (part, data);
    }

    /// A part was closed; no more data or children will arrive for it.
    fn on_part_closed(&mut self, part: &MessagePart) {
        let _ = part;
    }

    /// A container reached its closing boundary; no more children follow.
    fn on_trailer(&mut self, container: &MessagePart) {
        let _ = container;
    }

    /// A data error occurred.
    fn on_error(&mut self, error: &Error) {
        let _ = error;
    }

    /// The parser ended and the root is closed.
    fn on_finished(&mut self, root: &MessagePart) {
        let _ = root;
    }
}

impl<O: PartObserver + ?Sized> PartObserver for &mut O {
    fn on_part_started(&mut self, part: &MessagePart) {
        (**self).on_part_started(part);
    }

    fn on_headers(&mut self, part: &MessagePart) {
        (**self).on_headers(part);
    }

    fn on_multipart(&mut self, part: &MessagePart) {
        (**self).on_multipart(part);
    }

    fn on_data(&mut self, part: &MessagePart, data: &[u8]) {
        (**self).on_data(part, data);
    }

    fn on_part_closed(&mut self, part: &MessagePart) {
        (**self).on_part_closed(part);
    }

    fn on_trailer(&mut self, container: &MessagePart) {
        (**self).on_trailer(container);
    }

    fn on_error(&mut self, error: &Error) {
        (**self).on_error(error);
    }

    fn on_finished(&mut self, root: &MessagePart) {
        (**self).on_finished(root);
    }
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PartObserver for NoopObserver {}

/// An observer that logs notifications using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl PartObserver for LoggingObserver {
    fn on_part_started(&mut self, part: &MessagePart) {
        tracing::debug!(part = %part.path(), "part started");
    }

    fn on_headers(&mut self, part: &MessagePart) {
        tracing::debug!(part = %part.path(), headers = part.headers().len(), "headers parsed");
    }

    fn on_multipart(&mut self, part: &MessagePart) {
        tracing::debug!(part = %part.path(), boundary = ?part.boundary(), "multipart container");
    }

    fn on_data(&mut self, part: &MessagePart, data: &[u8]) {
        tracing::trace!(part = %part.path(), len = data.len(), "data");
    }

    fn on_part_closed(&mut self, part: &MessagePart) {
        tracing::debug!(part = %part.path(), bytes = part.bytes_received(), "part closed");
    }

    fn on_trailer(&mut self, container: &MessagePart) {
        tracing::debug!(part = %container.path(), children = container.children().len(), "trailer");
    }

    fn on_error(&mut self, error: &Error) {
        tracing::warn!(%error, "multipart error");
    }

    fn on_finished(&mut self, root: &MessagePart) {
        tracing::info!(children = root.children().len(), "multipart finished");
    }
}

/// A notification recorded by [`CollectingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A part was added.
    PartStarted(PartPath),
    /// A part's headers were parsed.
    HeadersComplete(PartPath),
    /// A part became a multipart container.
    MultipartStarted(PartPath),
    /// Bytes were appended to a part.
    DataAvailable(PartPath, Bytes),
    /// A part was closed.
    PartClosed(PartPath),
    /// A container reached its trailer.
    TrailerReached(PartPath),
    /// A data error occurred.
    Error(Error),
    /// The parser ended.
    Finished,
}

/// An observer that records events for later processing.
///
/// Useful for testing or for handing the events to another task.
#[derive(Debug, Default, Clone)]
pub struct CollectingObserver {
    /// Collected events.
    pub events: Vec<ParseEvent>,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all collected events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Takes all collected events, leaving the observer empty.
    pub fn take(&mut self) -> Vec<ParseEvent> {
        std::mem::take(&mut self.events)
    }

    /// Concatenates all data recorded for one part.
    #[must_use]
    pub fn data_for(&self, path: &PartPath) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ParseEvent::DataAvailable(p, data) if p == path => Some(&data[..]),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Returns the recorded errors.
    #[must_use]
    pub fn errors(&self) -> Vec<&Error> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ParseEvent::Error(error) => Some(error),
                _ => None,
            })
            .collect()
    }
}

impl PartObserver for CollectingObserver {
    fn on_part_started(&mut self, part: &MessagePart) {
        self.events.push(ParseEvent::PartStarted(part.path().clone()));
    }

    fn on_headers(&mut self, part: &MessagePart) {
        self.events
            .push(ParseEvent::HeadersComplete(part.path().clone()));
    }

    fn on_multipart(&mut self, part: &MessagePart) {
        self.events
            .push(ParseEvent::MultipartStarted(part.path().clone()));
    }

    fn on_data(&mut self, part: &MessagePart, data: &[u8]) {
        self.events.push(ParseEvent::DataAvailable(
            part.path().clone(),
            Bytes::copy_from_slice(data),
        ));
    }

    fn on_part_closed(&mut self, part: &MessagePart) {
        self.events.push(ParseEvent::PartClosed(part.path().clone()));
    }

    fn on_trailer(&mut self, container: &MessagePart) {
        self.events
            .push(ParseEvent::TrailerReached(container.path().clone()));
    }

    fn on_error(&mut self, error: &Error) {
        self.events.push(ParseEvent::Error(error.clone()));
    }

    fn on_finished(&mut self, _root: &MessagePart) {
        self.events.push(ParseEvent::Finished);
    }
}
