//! Pull based JSON tokenizer
//!
//! The tokenizer yields a flat stream of [`JsonEvent`] without building a
//! tree. The stream is always well formed: brackets are balanced and every
//! object value is preceded by exactly one [`JsonEvent::Key`]. Separators
//! (commas and colons) don't produce events.
//!
//! ```
//! use acechart::json::{JsonEvent, JsonParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = br#"{"l": [[1.5, -2], []]}"#;
//! let mut depth = 0;
//! let mut max_depth = 0;
//! for event in JsonParser::new(data) {
//!     match event? {
//!         JsonEvent::StartObject | JsonEvent::StartArray => {
//!             depth += 1;
//!             max_depth = max_depth.max(depth);
//!         }
//!         JsonEvent::EndObject | JsonEvent::EndArray => depth -= 1,
//!         _ => {}
//!     }
//! }
//! assert_eq!(max_depth, 3);
//! # Ok(())
//! # }
//! ```
//!
//! Syntax errors carry the byte offset where they were detected.
//!
//! ```
//! use acechart::json::{JsonErrorKind, JsonParser};
//!
//! let err = JsonParser::new(b"[1,]").find_map(|x| x.err()).unwrap();
//! assert_eq!(err.kind(), &JsonErrorKind::Unexpected(b']'));
//! assert_eq!(err.offset(), 3);
//! ```

mod event;
mod parser;

pub use self::event::JsonEvent;
pub use self::parser::{JsonError, JsonErrorKind, JsonParser};
pub(crate) use self::parser::is_whitespace;
