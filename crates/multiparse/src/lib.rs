//! # multiparse
//!
//! Incremental parser for nested multipart MIME bodies (RFC 2046).
//!
//! ## Features
//!
//! - **Streaming**: bytes are pushed in chunks of any size; a delimiter split
//!   across two writes is still found
//! - **Nesting**: `multipart/*` parts with their own boundary are parsed
//!   recursively into a tree
//! - **Backpressure**: each part buffers its body up to a high-water mark and
//!   `write` tells the caller when to pause
//! - **Observation**: one [`PartObserver`] sees the activity of every part
//!
//! ## Quick Start
//!
//! ```ignore
//! use multiparse::{MultipartParser, PartPath};
//!
//! let mut parser = MultipartParser::new("boundary")?;
//! parser.write(b"--boundary\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n")?;
//! parser.write(b"text default\r\n--boundary--\r\n")?;
//! parser.end(None)?;
//!
//! let part = parser.part(&PartPath::root().child(0)).unwrap();
//! assert_eq!(part.body(), b"text default");
//! ```
//!
//! ### Backpressure
//!
//! ```ignore
//! use multiparse::MultipartParser;
//!
//! let mut parser = MultipartParser::new("boundary")?;
//! for chunk in chunks {
//!     if parser.write(chunk)? {
//!         let path = parser.current_path().clone();
//!         let part = parser.part_mut(&path).unwrap();
//!         consume(part.read_all());
//!     }
//! }
//! parser.end(None)?;
//! ```
//!
//! ### Starting from a request header
//!
//! ```ignore
//! use multiparse::{LoggingObserver, MultipartParser};
//!
//! let parser = MultipartParser::from_content_type(
//!     "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW",
//!     LoggingObserver,
//! )?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod config;
mod content_type;
mod error;
mod header;
mod observer;
mod parser;
mod part;
mod stack;

pub use boundary::{Boundary, DelimiterKind, MAX_BOUNDARY_LENGTH, Scan, StartScan, classify};
pub use config::{
    DEFAULT_HIGH_WATER_MARK, DEFAULT_MAX_DEPTH, DEFAULT_MAX_HEADER_SIZE, ParserConfig,
    ParserConfigBuilder,
};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{HeaderBlockScanner, HeaderEvent, HeaderPair, Headers};
pub use observer::{CollectingObserver, LoggingObserver, NoopObserver, ParseEvent, PartObserver};
pub use parser::{MultipartParser, ParserState};
pub use part::{MessagePart, PartPath, PartState};
pub use stack::{Frame, PathStack};
