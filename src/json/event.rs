use std::borrow::Cow;
use std::fmt;

/// A single primitive JSON token.
///
/// Integers without a fraction or exponent are split by sign: non-negative
/// values are reported as [`JsonEvent::Uint`], negative ones as
/// [`JsonEvent::Int`]. Anything else numeric, including integers that do not
/// fit in 64 bits, is a [`JsonEvent::Double`].
///
/// ```
/// use acechart::json::{JsonEvent, JsonParser};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let events = JsonParser::new(br#"{"s":-1}"#).collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(
///     events,
///     vec![
///         JsonEvent::StartObject,
///         JsonEvent::Key("s".into()),
///         JsonEvent::Int(-1),
///         JsonEvent::EndObject,
///     ]
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Clone)]
pub enum JsonEvent<'a> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Key(Cow<'a, str>),
    String(Cow<'a, str>),
    Int(i64),
    Uint(u64),
    Double(f64),
    Bool(bool),
    Null,
}

impl<'a> JsonEvent<'a> {
    /// Short name of the event kind, used in error reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            JsonEvent::StartObject => "StartObject",
            JsonEvent::EndObject => "EndObject",
            JsonEvent::StartArray => "StartArray",
            JsonEvent::EndArray => "EndArray",
            JsonEvent::Key(_) => "Key",
            JsonEvent::String(_) => "String",
            JsonEvent::Int(_) => "Int",
            JsonEvent::Uint(_) => "Uint",
            JsonEvent::Double(_) => "Double",
            JsonEvent::Bool(_) => "Bool",
            JsonEvent::Null => "Null",
        }
    }

    /// Returns true for string, number, bool and null events
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            JsonEvent::StartObject
                | JsonEvent::EndObject
                | JsonEvent::StartArray
                | JsonEvent::EndArray
                | JsonEvent::Key(_)
        )
    }
}

impl<'a> fmt::Display for JsonEvent<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JsonEvent::Key(x) => write!(f, "Key \"{}\"", x),
            JsonEvent::String(x) => write!(f, "String \"{}\"", x),
            JsonEvent::Int(x) => write!(f, "Int {}", x),
            JsonEvent::Uint(x) => write!(f, "Uint {}", x),
            JsonEvent::Double(x) => write!(f, "Double {}", x),
            JsonEvent::Bool(x) => write!(f, "Bool {}", x),
            x => f.write_str(x.kind_name()),
        }
    }
}
