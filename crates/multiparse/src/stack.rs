//! Nesting ancestry of open multipart containers.

use crate::boundary::Boundary;
use crate::error::{Error, Result};
use crate::part::PartPath;

/// One open multipart container and the boundary that delimits its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Path of the container part.
    pub container: PartPath,
    /// Boundary of the container's body.
    pub boundary: Boundary,
}

/// Stack of open containers; the top is the innermost one.
///
/// The outermost frame (root part and outer boundary) is kept after it is
/// popped, so [`PathStack::top`] always has an answer. [`PathStack::depth`]
/// counts only the containers that are still open.
#[derive(Debug, Clone)]
pub struct PathStack {
    outer: Frame,
    frames: Vec<Frame>,
}

impl PathStack {
    /// Creates a stack with the root open under `boundary`.
    #[must_use]
    pub fn new(boundary: Boundary) -> Self {
        let outer = Frame {
            container: PartPath::root(),
            boundary,
        };
        Self {
            frames: vec![outer.clone()],
            outer,
        }
    }

    /// Makes `container` the innermost open level.
    pub fn push(&mut self, container: PartPath, boundary: Boundary) {
        tracing::trace!(part = %container, %boundary, depth = self.frames.len() + 1, "push");
        self.frames.push(Frame {
            container,
            boundary,
        });
    }

    /// Closes the innermost level and returns the frame that becomes active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] if no level is open.
    pub fn pop(&mut self) -> Result<&Frame> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| Error::Invariant("pop on an empty path stack".to_string()))?;
        tracing::trace!(part = %frame.container, depth = self.frames.len(), "pop");
        Ok(self.top())
    }

    /// Returns the innermost open frame, or the outermost once all are closed.
    #[must_use]
    pub fn top(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.outer)
    }

    /// Returns the boundary of the innermost level.
    #[must_use]
    pub fn current_boundary(&self) -> &Boundary {
        &self.top().boundary
    }

    /// Returns the container of the innermost level.
    #[must_use]
    pub fn current_part(&self) -> &PartPath {
        &self.top().container
    }

    /// Returns the number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` once every container is closed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let outer = Boundary::new("outer").unwrap();
        let inner = Boundary::new("inner").unwrap();
        let mut stack = PathStack::new(outer.clone());
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current_part(), &PartPath::root());

        let path = PartPath::root().child(1);
        stack.push(path.clone(), inner.clone());
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_boundary(), &inner);
        assert_eq!(stack.current_part(), &path);

        let active = stack.pop().unwrap();
        assert_eq!(active.boundary, outer);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_outer_frame_survives() {
        let outer = Boundary::new("outer").unwrap();
        let mut stack = PathStack::new(outer.clone());

        stack.pop().unwrap();
        assert!(stack.is_empty());
        assert_eq!(stack.current_boundary(), &outer);
        assert_eq!(stack.current_part(), &PartPath::root());
    }

    #[test]
    fn test_pop_empty_is_invariant_violation() {
        let mut stack = PathStack::new(Boundary::new("outer").unwrap());
        stack.pop().unwrap();
        assert!(matches!(stack.pop(), Err(Error::Invariant(_))));
    }
}
