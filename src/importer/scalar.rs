use crate::json::JsonEvent;
use std::fmt;

/// The primitive kind a field setter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Double,
    Signed,
    Unsigned,
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScalarKind::Text => "text",
            ScalarKind::Double => "double",
            ScalarKind::Signed => "signed",
            ScalarKind::Unsigned => "unsigned",
            ScalarKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Why an event could not be converted into a scalar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The event is of a kind the value can't be built from. Contains the
    /// name of the event kind that was found.
    Kind(&'static str),

    /// The event is of the right kind but its content is unacceptable
    Invalid(String),
}

/// Why a setter or a precondition refused a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetError {
    /// The document version is unrecognized (or was not seen yet)
    Version(Option<String>),

    /// The value is unacceptable for the field
    Value(String),
}

/// A value that can be built from a single scalar [`JsonEvent`].
///
/// The kind is a constant so that a schema knows what a setter accepts when
/// it is built rather than by probing at decode time.
///
/// ```
/// use acechart::importer::{ScalarKind, ScalarValue, ValueError};
/// use acechart::json::JsonEvent;
///
/// assert_eq!(<f64 as ScalarValue>::KIND, ScalarKind::Double);
/// assert_eq!(f64::from_event(&JsonEvent::Uint(3)), Ok(3.0));
/// assert_eq!(i64::from_event(&JsonEvent::Bool(true)), Err(ValueError::Kind("Bool")));
/// ```
pub trait ScalarValue: Sized + 'static {
    const KIND: ScalarKind;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError>;
}

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::Text;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        match event {
            JsonEvent::String(x) => Ok(x.to_string()),
            x => Err(ValueError::Kind(x.kind_name())),
        }
    }
}

impl ScalarValue for f64 {
    const KIND: ScalarKind = ScalarKind::Double;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        match *event {
            JsonEvent::Double(x) => Ok(x),
            JsonEvent::Int(x) => Ok(x as f64),
            JsonEvent::Uint(x) => Ok(x as f64),
            ref x => Err(ValueError::Kind(x.kind_name())),
        }
    }
}

impl ScalarValue for i64 {
    const KIND: ScalarKind = ScalarKind::Signed;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        match *event {
            JsonEvent::Int(x) => Ok(x),
            JsonEvent::Uint(x) => i64::try_from(x)
                .map_err(|_| ValueError::Invalid(format!("{} does not fit a signed integer", x))),
            ref x => Err(ValueError::Kind(x.kind_name())),
        }
    }
}

impl ScalarValue for u64 {
    const KIND: ScalarKind = ScalarKind::Unsigned;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        match *event {
            JsonEvent::Uint(x) => Ok(x),
            ref x => Err(ValueError::Kind(x.kind_name())),
        }
    }
}

impl ScalarValue for usize {
    const KIND: ScalarKind = ScalarKind::Unsigned;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        let x = u64::from_event(event)?;
        usize::try_from(x).map_err(|_| ValueError::Invalid(format!("{} is too large", x)))
    }
}

impl ScalarValue for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        match *event {
            JsonEvent::Bool(x) => Ok(x),
            JsonEvent::Uint(x) => Ok(x != 0),
            ref x => Err(ValueError::Kind(x.kind_name())),
        }
    }
}

/// An ordered collection decoded from a JSON array of scalars.
///
/// Decoding an array always replaces the previous contents: the items of one
/// array occurrence are collected and handed over together, so a key that is
/// repeated in an object leaves only the last array behind.
pub trait Sequence: 'static {
    type Item: ScalarValue;

    fn replace(&mut self, items: Vec<Self::Item>) -> Result<(), SetError>;
}

impl<V: ScalarValue> Sequence for Vec<V> {
    type Item = V;

    fn replace(&mut self, items: Vec<V>) -> Result<(), SetError> {
        *self = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::*;

    #[rstest]
    #[case(JsonEvent::Int(-3), Ok(-3))]
    #[case(JsonEvent::Uint(7), Ok(7))]
    #[case(JsonEvent::Uint(u64::MAX), Err(ValueError::Invalid(String::from("18446744073709551615 does not fit a signed integer"))))]
    #[case(JsonEvent::Double(1.5), Err(ValueError::Kind("Double")))]
    #[case(JsonEvent::String("1".into()), Err(ValueError::Kind("String")))]
    fn test_signed_widening(#[case] event: JsonEvent, #[case] expected: Result<i64, ValueError>) {
        assert_eq!(i64::from_event(&event), expected);
    }

    #[rstest]
    #[case(JsonEvent::Bool(true), Ok(true))]
    #[case(JsonEvent::Uint(0), Ok(false))]
    #[case(JsonEvent::Uint(2), Ok(true))]
    #[case(JsonEvent::Int(-1), Err(ValueError::Kind("Int")))]
    #[case(JsonEvent::Null, Err(ValueError::Kind("Null")))]
    fn test_bool_from_unsigned(#[case] event: JsonEvent, #[case] expected: Result<bool, ValueError>) {
        assert_eq!(bool::from_event(&event), expected);
    }

    #[test]
    fn test_text_rejects_containers() {
        assert_eq!(
            String::from_event(&JsonEvent::StartArray),
            Err(ValueError::Kind("StartArray"))
        );
    }

    #[test]
    fn test_vec_sequence_replaces() {
        let mut data = vec![1.0, 2.0];
        data.replace(vec![3.0]).unwrap();
        assert_eq!(data, vec![3.0]);
    }

    #[quickcheck]
    fn double_accepts_any_integer(data: i64) -> bool {
        f64::from_event(&JsonEvent::Int(data)) == Ok(data as f64)
    }
}
