//! Schema driven streaming decoder
//!
//! The importer walks the events of a [`JsonParser`](crate::json::JsonParser)
//! and routes each one to the frame on top of a stack. Frames are created
//! from the [`Schema`] of the type being decoded: an object key looks up a
//! [`Field`], and the field hands out the frame that decodes the value. No
//! intermediate tree is built.
//!
//! ```
//! use acechart::importer::{Field, Importer, Schema};
//! use once_cell::sync::Lazy;
//!
//! #[derive(Debug, Default)]
//! struct Serum {
//!     name: String,
//!     homologous: Vec<usize>,
//! }
//!
//! #[derive(Debug, Default)]
//! struct Table {
//!     sera: Vec<Serum>,
//! }
//!
//! static SERUM: Lazy<Schema<Serum>> = Lazy::new(|| {
//!     Schema::new("Serum")
//!         .field(Field::setter("N", |x: &mut Serum, v: String| x.name = v))
//!         .field(Field::array("h", |x: &mut Serum| &mut x.homologous))
//! });
//!
//! static TABLE: Lazy<Schema<Table>> = Lazy::new(|| {
//!     Schema::new("Table").field(Field::array_of_objects(
//!         "s",
//!         |x: &mut Table| &mut x.sera,
//!         || &SERUM,
//!     ))
//! });
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = br#"{"s": [{"N": "A/X/2/2020", "h": [0, 3]}]}"#;
//! let table = Importer::new().with_max_depth(8).import(data, &TABLE)?;
//! assert_eq!(table.sera[0].homologous, vec![0, 3]);
//!
//! let err = Importer::new().import(br#"{"s": [{"N": []}]}"#, &TABLE).unwrap_err();
//! assert_eq!(err.path(), Some("s[0].N"));
//! # Ok(())
//! # }
//! ```

mod frame;
mod passthrough;
mod scalar;
mod schema;

pub use self::frame::{
    downcast, ArrayFrame, FieldPath, Frame, FrameError, ObjectFrame, PathSegment, RowsFrame, Step,
    Storer, ValuesFrame,
};
pub use self::passthrough::PassthroughFrame;
pub use self::scalar::{ScalarKind, ScalarValue, Sequence, SetError, ValueError};
pub use self::schema::{CustomFrame, Descriptor, Field, FieldKind, Schema};

use crate::json::{JsonEvent, JsonParser};
use crate::{Error, ErrorKind};
use tracing::trace;

/// Default limit on the number of nested frames
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Runs the frame stack over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Importer {
    max_depth: usize,
}

impl Default for Importer {
    fn default() -> Self {
        Importer {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Importer {
    pub fn new() -> Self {
        Importer::default()
    }

    /// Sets how many frames may be active at once. Documents nested deeper
    /// fail with a structural error.
    pub fn with_max_depth(mut self, max_depth: usize) -> Importer {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decodes a JSON object into a default constructed `T`
    pub fn import<T>(&self, data: &[u8], schema: &'static Schema<T>) -> Result<T, Error>
    where
        T: Default + 'static,
    {
        let mut result = T::default();
        self.import_into(data, &mut result, schema)?;
        Ok(result)
    }

    /// Decodes a JSON object into an existing `T`. Fields absent from the
    /// document keep their value. On error the target is left in an
    /// unspecified state and should be discarded.
    pub fn import_into<T>(
        &self,
        data: &[u8],
        target: &mut T,
        schema: &'static Schema<T>,
    ) -> Result<(), Error>
    where
        T: Default + 'static,
    {
        let root = ObjectFrame::new(std::mem::take(target), schema);
        let root = self.run(data, Box::new(root))?;
        *target = downcast::<ObjectFrame<T>>(root)
            .map_err(|_| structural(schema.name(), "end of input", &FieldPath::new(), data.len()))?
            .into_target();
        Ok(())
    }

    /// Feeds every event of the document through the frame stack rooted at
    /// `root` and returns the root once it completes
    pub fn run(&self, data: &[u8], root: Box<dyn Frame>) -> Result<Box<dyn Frame>, Error> {
        let mut parser = JsonParser::new(data);
        let mut path = FieldPath::new();
        let mut frames: Vec<Box<dyn Frame>> = vec![root];
        let mut done: Option<Box<dyn Frame>> = None;

        while let Some(event) = parser.next_event()? {
            let offset = parser.token_start();
            let top = match frames.last_mut() {
                Some(top) => top,
                None => return Err(structural("document", &event, &path, offset)),
            };

            let name = top.name();
            let step = top
                .event(&event)
                .map_err(|e| frame_error(e, name, &event, &path, offset))?;

            match step {
                Step::Continue => {}
                Step::Push(child, segment) => {
                    if frames.len() >= self.max_depth {
                        path.push(segment);
                        return Err(structural(
                            child.name(),
                            format!("{} beyond max depth of {}", event, self.max_depth),
                            &path,
                            offset,
                        ));
                    }

                    path.push(segment);
                    trace!(path = %path, frame = child.name(), "push frame");
                    frames.push(child);
                }
                Step::Complete => {
                    let child = match frames.pop() {
                        Some(child) => child,
                        None => return Err(structural(name, &event, &path, offset)),
                    };

                    match frames.last_mut() {
                        Some(parent) => {
                            let parent_name = parent.name();
                            parent
                                .resume(child)
                                .map_err(|e| frame_error(e, parent_name, &event, &path, offset))?;
                            trace!(path = %path, frame = name, "pop frame");
                            path.pop();
                        }
                        None => done = Some(child),
                    }
                }
            }
        }

        match done {
            Some(root) if frames.is_empty() => Ok(root),
            _ => {
                let name = frames.last().map_or("document", |x| x.name());
                Err(structural(name, "end of input", &path, data.len()))
            }
        }
    }
}

/// Decodes a JSON object into `T` with the default options
pub fn import<T>(data: &[u8], schema: &'static Schema<T>) -> Result<T, Error>
where
    T: Default + 'static,
{
    Importer::new().import(data, schema)
}

/// Decodes a JSON object into an existing `T` with the default options
pub fn import_into<T>(data: &[u8], target: &mut T, schema: &'static Schema<T>) -> Result<(), Error>
where
    T: Default + 'static,
{
    Importer::new().import_into(data, target, schema)
}

fn structural(
    frame: &'static str,
    token: impl ToString,
    path: &FieldPath,
    offset: usize,
) -> Error {
    Error::new(ErrorKind::Structural {
        frame,
        token: token.to_string(),
        path: path.to_string(),
        offset,
    })
}

fn frame_error(
    err: FrameError,
    frame: &'static str,
    event: &JsonEvent,
    path: &FieldPath,
    offset: usize,
) -> Error {
    match err {
        FrameError::Unexpected => structural(frame, event, path, offset),
        FrameError::Kind { expected, found } => Error::new(ErrorKind::ValueKind {
            path: path.to_string(),
            expected,
            found,
            offset,
        }),
        FrameError::Invalid(message) => Error::new(ErrorKind::InvalidValue {
            path: path.to_string(),
            message,
            offset,
        }),
        FrameError::Version(found) => Error::new(ErrorKind::VersionMismatch { found }),
    }
}
