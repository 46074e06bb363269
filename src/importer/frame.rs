use super::scalar::{ScalarKind, ScalarValue, SetError, ValueError};
use super::schema::Schema;
use crate::json::JsonEvent;
use std::any::Any;
use std::fmt;

/// One step of a field path: the object key or array index a frame was
/// pushed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    Key(&'static str),
    Index(usize),
}

/// Dotted path of the fields currently being decoded (eg: `c.a[3].N`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn new() -> Self {
        FieldPath::default()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }

        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }

        Ok(())
    }
}

/// What the dispatcher should do after a frame consumed an event
pub enum Step {
    /// The frame stays active
    Continue,

    /// The given frame receives events until it completes
    Push(Box<dyn Frame>, PathSegment),

    /// The frame is finished and is handed back to its parent
    Complete,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Step::Continue => f.write_str("Continue"),
            Step::Push(frame, segment) => write!(f, "Push({}, {:?})", frame.name(), segment),
            Step::Complete => f.write_str("Complete"),
        }
    }
}

/// Failure raised by a frame. The dispatcher adds the field path, the
/// offending token and the offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The frame can't interpret the token
    Unexpected,

    /// A scalar of the wrong kind
    Kind {
        expected: ScalarKind,
        found: &'static str,
    },

    /// A value was refused
    Invalid(String),

    /// The document version is not recognized
    Version(Option<String>),
}

impl FrameError {
    pub fn from_value<V: ScalarValue>(err: ValueError) -> FrameError {
        match err {
            ValueError::Kind(found) => FrameError::Kind {
                expected: V::KIND,
                found,
            },
            ValueError::Invalid(msg) => FrameError::Invalid(msg),
        }
    }
}

impl From<SetError> for FrameError {
    fn from(err: SetError) -> Self {
        match err {
            SetError::Version(x) => FrameError::Version(x),
            SetError::Value(x) => FrameError::Invalid(x),
        }
    }
}

#[doc(hidden)]
pub trait AsAny {
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A decode context bound to one nesting level of the document.
///
/// A frame owns the value it is building. When it pushes a child, the child
/// takes what it decodes out of the frame (or starts from a default) and the
/// frame gets it back through [`Frame::resume`] once the child completes.
pub trait Frame: AsAny {
    /// Name reported in structural errors
    fn name(&self) -> &'static str;

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError>;

    /// Receives a child that this frame pushed, after it completed
    fn resume(&mut self, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let _ = child;
        Err(FrameError::Unexpected)
    }
}

/// Recovers the concrete frame behind a completed child
pub fn downcast<F: Frame + 'static>(child: Box<dyn Frame>) -> Result<F, FrameError> {
    child
        .into_any()
        .downcast::<F>()
        .map(|x| *x)
        .map_err(|_| FrameError::Unexpected)
}

/// Terminal frame accepting exactly one scalar
#[derive(Debug)]
pub struct Storer<V> {
    value: Option<V>,
}

impl<V: ScalarValue> Storer<V> {
    pub fn new() -> Self {
        Storer { value: None }
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }
}

impl<V: ScalarValue> Default for Storer<V> {
    fn default() -> Self {
        Storer::new()
    }
}

impl<V: ScalarValue> Frame for Storer<V> {
    fn name(&self) -> &'static str {
        "value"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        let value = V::from_event(event).map_err(FrameError::from_value::<V>)?;
        self.value = Some(value);
        Ok(Step::Complete)
    }
}

/// Decodes a JSON object into `T` through the schema of `T`
pub struct ObjectFrame<T: 'static> {
    target: T,
    schema: &'static Schema<T>,
    started: bool,
    pending: Option<usize>,
}

impl<T: 'static> ObjectFrame<T> {
    /// A frame that expects the object's opening brace as its first event
    pub fn new(target: T, schema: &'static Schema<T>) -> Self {
        ObjectFrame {
            target,
            schema,
            started: false,
            pending: None,
        }
    }

    /// A frame whose opening brace was already consumed by the parent
    pub fn started(target: T, schema: &'static Schema<T>) -> Self {
        ObjectFrame {
            started: true,
            ..ObjectFrame::new(target, schema)
        }
    }

    pub fn into_target(self) -> T {
        self.target
    }
}

impl<T: 'static> Frame for ObjectFrame<T> {
    fn name(&self) -> &'static str {
        self.schema.name()
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        match (self.started, event) {
            (false, JsonEvent::StartObject) => {
                self.started = true;
                Ok(Step::Continue)
            }
            (true, JsonEvent::Key(key)) => {
                let (index, field) = self.schema.find(key).ok_or(FrameError::Unexpected)?;
                field.check(&self.target)?;
                self.pending = Some(index);
                let child = field.open(&mut self.target);
                Ok(Step::Push(child, PathSegment::Key(field.key())))
            }
            (true, JsonEvent::EndObject) => Ok(Step::Complete),
            _ => Err(FrameError::Unexpected),
        }
    }

    fn resume(&mut self, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let index = self.pending.take().ok_or(FrameError::Unexpected)?;
        let field = self.schema.field_at(index).ok_or(FrameError::Unexpected)?;
        field.close(&mut self.target, child)
    }
}

/// Decodes a JSON array of objects, each through the schema of `T`
pub struct ArrayFrame<T: 'static> {
    items: Vec<T>,
    schema: &'static Schema<T>,
    started: bool,
}

impl<T: Default + 'static> ArrayFrame<T> {
    pub fn new(mut items: Vec<T>, schema: &'static Schema<T>) -> Self {
        items.clear();
        ArrayFrame {
            items,
            schema,
            started: false,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T: Default + 'static> Frame for ArrayFrame<T> {
    fn name(&self) -> &'static str {
        "object array"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        match (self.started, event) {
            (false, JsonEvent::StartArray) => {
                self.started = true;
                Ok(Step::Continue)
            }
            (true, JsonEvent::StartObject) => {
                let child = ObjectFrame::started(T::default(), self.schema);
                let segment = PathSegment::Index(self.items.len());
                Ok(Step::Push(Box::new(child), segment))
            }
            (true, JsonEvent::EndArray) => Ok(Step::Complete),
            _ => Err(FrameError::Unexpected),
        }
    }

    fn resume(&mut self, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let child = downcast::<ObjectFrame<T>>(child)?;
        self.items.push(child.into_target());
        Ok(())
    }
}

/// Collects a JSON array of scalars
#[derive(Debug)]
pub struct ValuesFrame<V> {
    items: Vec<V>,
    started: bool,
}

impl<V: ScalarValue> ValuesFrame<V> {
    pub fn new() -> Self {
        ValuesFrame {
            items: Vec::new(),
            started: false,
        }
    }

    pub fn started() -> Self {
        ValuesFrame {
            items: Vec::new(),
            started: true,
        }
    }

    pub fn into_items(self) -> Vec<V> {
        self.items
    }
}

impl<V: ScalarValue> Default for ValuesFrame<V> {
    fn default() -> Self {
        ValuesFrame::new()
    }
}

impl<V: ScalarValue> Frame for ValuesFrame<V> {
    fn name(&self) -> &'static str {
        "scalar array"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        match (self.started, event) {
            (false, JsonEvent::StartArray) => {
                self.started = true;
                Ok(Step::Continue)
            }
            (false, _) => Err(FrameError::Unexpected),
            (true, JsonEvent::EndArray) => Ok(Step::Complete),
            (true, event) => {
                let value = V::from_event(event).map_err(FrameError::from_value::<V>)?;
                self.items.push(value);
                Ok(Step::Continue)
            }
        }
    }
}

/// Collects a JSON array of scalar arrays, one row per inner array
#[derive(Debug)]
pub struct RowsFrame<V> {
    rows: Vec<Vec<V>>,
    started: bool,
}

impl<V: ScalarValue> RowsFrame<V> {
    pub fn new(mut rows: Vec<Vec<V>>) -> Self {
        rows.clear();
        RowsFrame {
            rows,
            started: false,
        }
    }

    pub fn into_rows(self) -> Vec<Vec<V>> {
        self.rows
    }
}

impl<V: ScalarValue> Frame for RowsFrame<V> {
    fn name(&self) -> &'static str {
        "array of arrays"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        match (self.started, event) {
            (false, JsonEvent::StartArray) => {
                self.started = true;
                Ok(Step::Continue)
            }
            (true, JsonEvent::StartArray) => {
                let segment = PathSegment::Index(self.rows.len());
                Ok(Step::Push(Box::new(ValuesFrame::<V>::started()), segment))
            }
            (true, JsonEvent::EndArray) => Ok(Step::Complete),
            _ => Err(FrameError::Unexpected),
        }
    }

    fn resume(&mut self, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let child = downcast::<ValuesFrame<V>>(child)?;
        self.rows.push(child.into_items());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(&[], "$")]
    #[case(&[PathSegment::Key("c")], "c")]
    #[case(&[PathSegment::Key("c"), PathSegment::Key("a"), PathSegment::Index(3), PathSegment::Key("N")], "c.a[3].N")]
    #[case(&[PathSegment::Key("l"), PathSegment::Index(0), PathSegment::Index(1)], "l[0][1]")]
    fn test_field_path_display(#[case] segments: &[PathSegment], #[case] expected: &str) {
        let mut path = FieldPath::new();
        for segment in segments {
            path.push(*segment);
        }
        assert_eq!(path.to_string(), expected);
    }

    #[test]
    fn test_storer_completes_on_scalar() {
        let mut storer = Storer::<String>::new();
        let step = storer.event(&JsonEvent::String("A/X/1/2020".into())).unwrap();
        assert!(matches!(step, Step::Complete));
        assert_eq!(storer.into_value().as_deref(), Some("A/X/1/2020"));
    }

    #[test]
    fn test_storer_kind_mismatch() {
        let mut storer = Storer::<String>::new();
        assert_eq!(
            storer.event(&JsonEvent::StartArray).unwrap_err(),
            FrameError::Kind {
                expected: ScalarKind::Text,
                found: "StartArray"
            }
        );
    }

    #[test]
    fn test_values_frame_requires_array() {
        let mut frame = ValuesFrame::<f64>::new();
        assert_eq!(
            frame.event(&JsonEvent::Double(1.0)).unwrap_err(),
            FrameError::Unexpected
        );
    }

    #[test]
    fn test_rows_frame_pushes_indexed_rows() {
        let mut frame = RowsFrame::<f64>::new(vec![vec![9.0]]);
        assert!(matches!(
            frame.event(&JsonEvent::StartArray).unwrap(),
            Step::Continue
        ));
        match frame.event(&JsonEvent::StartArray).unwrap() {
            Step::Push(mut child, PathSegment::Index(0)) => {
                child.event(&JsonEvent::Double(1.0)).unwrap();
                child.event(&JsonEvent::Int(-2)).unwrap();
                assert!(matches!(
                    child.event(&JsonEvent::EndArray).unwrap(),
                    Step::Complete
                ));
                frame.resume(child).unwrap();
            }
            x => panic!("unexpected {:?}", x),
        }
        assert!(matches!(
            frame.event(&JsonEvent::EndArray).unwrap(),
            Step::Complete
        ));
        assert_eq!(frame.into_rows(), vec![vec![1.0, -2.0]]);
    }

    #[test]
    fn test_downcast_mismatch() {
        let child: Box<dyn Frame> = Box::new(Storer::<f64>::new());
        assert!(downcast::<Storer<String>>(child).is_err());
    }
}
