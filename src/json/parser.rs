use super::JsonEvent;
use std::borrow::Cow;
use std::error;
use std::fmt;

/// The kind of syntax error found in the JSON input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonErrorKind {
    /// Input ended in the middle of a value
    Eof,

    /// A byte that can't start or continue the expected production
    Unexpected(u8),

    /// Unrecognized escape sequence in a string
    InvalidEscape,

    /// Malformed `\u` escape or unpaired surrogate
    InvalidUnicode,

    /// String contents are not valid utf-8
    InvalidUtf8,

    /// Number does not follow the JSON number grammar
    InvalidNumber,

    /// Unescaped control character inside a string
    ControlCharacter,

    /// Non-whitespace data after the top level value
    TrailingData,
}

/// A syntax error with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonError {
    kind: JsonErrorKind,
    offset: usize,
}

impl JsonError {
    fn new(kind: JsonErrorKind, offset: usize) -> Self {
        JsonError { kind, offset }
    }

    /// Return the specific type of syntax error
    pub fn kind(&self) -> &JsonErrorKind {
        &self.kind
    }

    /// Byte offset into the input
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            JsonErrorKind::Eof => write!(f, "unexpected end of json input"),
            JsonErrorKind::Unexpected(b) if b.is_ascii_graphic() => {
                write!(f, "unexpected character '{}'", b as char)
            }
            JsonErrorKind::Unexpected(b) => write!(f, "unexpected byte 0x{:02x}", b),
            JsonErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            JsonErrorKind::InvalidUnicode => write!(f, "invalid unicode escape"),
            JsonErrorKind::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            JsonErrorKind::InvalidNumber => write!(f, "invalid number"),
            JsonErrorKind::ControlCharacter => write!(f, "control character in string"),
            JsonErrorKind::TrailingData => write!(f, "trailing data after json value"),
        }?;

        write!(f, " (offset: {})", self.offset)
    }
}

impl error::Error for JsonError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Expect {
    /// A value: the document root, after a colon, or after a comma in an array
    Value,

    /// After `[`: a value or `]`
    FirstValue,

    /// After `{`: a key or `}`
    FirstKey,

    /// After a comma in an object
    Key,

    /// After a value inside a container: a comma or the closing bracket
    Separator,

    /// The root value has been read
    Done,

    /// An error was returned, the parser is fused
    Failed,
}

/// Pull parser turning a JSON document into a stream of [`JsonEvent`].
///
/// The parser borrows from the input: keys and strings without escape
/// sequences are handed out without allocating. It checks the grammar as it
/// goes, so the event stream it produces is always well nested, but it never
/// builds a tree.
///
/// ```
/// use acechart::json::{JsonEvent, JsonParser};
///
/// let mut parser = JsonParser::new(br#"["A/X/1/2020", 1.5]"#);
/// assert_eq!(parser.next(), Some(Ok(JsonEvent::StartArray)));
/// assert_eq!(parser.next(), Some(Ok(JsonEvent::String("A/X/1/2020".into()))));
/// assert_eq!(parser.next(), Some(Ok(JsonEvent::Double(1.5))));
/// assert_eq!(parser.next(), Some(Ok(JsonEvent::EndArray)));
/// assert_eq!(parser.next(), None);
/// ```
#[derive(Debug)]
pub struct JsonParser<'a> {
    data: &'a [u8],
    position: usize,
    token_start: usize,
    expect: Expect,
    containers: Vec<Container>,
}

impl<'a> JsonParser<'a> {
    pub fn new(data: &'a [u8]) -> JsonParser<'a> {
        JsonParser {
            data,
            position: 0,
            token_start: 0,
            expect: Expect::Value,
            containers: Vec::new(),
        }
    }

    /// Byte offset of the next unread byte
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte offset where the most recently returned event starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Current container nesting
    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.data.get(self.position) {
            if is_whitespace(b) {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn err(&self, kind: JsonErrorKind) -> JsonError {
        JsonError::new(kind, self.position)
    }

    fn unexpected(&self) -> JsonError {
        match self.peek() {
            Some(b) => self.err(JsonErrorKind::Unexpected(b)),
            None => self.err(JsonErrorKind::Eof),
        }
    }

    fn after_value(&mut self) {
        self.expect = if self.containers.is_empty() {
            Expect::Done
        } else {
            Expect::Separator
        };
    }

    fn close(&mut self, container: Container) -> JsonEvent<'a> {
        self.position += 1;
        self.containers.pop();
        self.after_value();
        match container {
            Container::Object => JsonEvent::EndObject,
            Container::Array => JsonEvent::EndArray,
        }
    }

    /// Read the next event, `Ok(None)` once the root value is complete
    pub fn next_event(&mut self) -> Result<Option<JsonEvent<'a>>, JsonError> {
        let result = self.read_event();
        if result.is_err() {
            self.expect = Expect::Failed;
        }
        result
    }

    fn read_event(&mut self) -> Result<Option<JsonEvent<'a>>, JsonError> {
        loop {
            self.skip_whitespace();
            self.token_start = self.position;
            match self.expect {
                Expect::Failed => return Ok(None),
                Expect::Done => {
                    return match self.peek() {
                        None => Ok(None),
                        Some(_) => Err(self.err(JsonErrorKind::TrailingData)),
                    }
                }
                Expect::Value => return self.read_value().map(Some),
                Expect::FirstValue => {
                    if self.peek() == Some(b']') {
                        return Ok(Some(self.close(Container::Array)));
                    }
                    return self.read_value().map(Some);
                }
                Expect::FirstKey => {
                    if self.peek() == Some(b'}') {
                        return Ok(Some(self.close(Container::Object)));
                    }
                    return self.read_key().map(Some);
                }
                Expect::Key => return self.read_key().map(Some),
                Expect::Separator => {
                    let container = match self.containers.last() {
                        Some(x) => *x,
                        None => return Err(self.unexpected()),
                    };

                    match (container, self.peek()) {
                        (Container::Object, Some(b',')) => {
                            self.position += 1;
                            self.expect = Expect::Key;
                        }
                        (Container::Array, Some(b',')) => {
                            self.position += 1;
                            self.expect = Expect::Value;
                        }
                        (Container::Object, Some(b'}')) | (Container::Array, Some(b']')) => {
                            return Ok(Some(self.close(container)));
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
            }
        }
    }

    fn read_key(&mut self) -> Result<JsonEvent<'a>, JsonError> {
        if self.peek() != Some(b'"') {
            return Err(self.unexpected());
        }

        let key = self.read_string()?;
        self.skip_whitespace();
        if self.peek() != Some(b':') {
            return Err(self.unexpected());
        }

        self.position += 1;
        self.expect = Expect::Value;
        Ok(JsonEvent::Key(key))
    }

    fn read_value(&mut self) -> Result<JsonEvent<'a>, JsonError> {
        let event = match self.peek() {
            None => return Err(self.err(JsonErrorKind::Eof)),
            Some(b'{') => {
                self.position += 1;
                self.containers.push(Container::Object);
                self.expect = Expect::FirstKey;
                return Ok(JsonEvent::StartObject);
            }
            Some(b'[') => {
                self.position += 1;
                self.containers.push(Container::Array);
                self.expect = Expect::FirstValue;
                return Ok(JsonEvent::StartArray);
            }
            Some(b'"') => JsonEvent::String(self.read_string()?),
            Some(b't') => self.read_literal(b"true", JsonEvent::Bool(true))?,
            Some(b'f') => self.read_literal(b"false", JsonEvent::Bool(false))?,
            Some(b'n') => self.read_literal(b"null", JsonEvent::Null)?,
            Some(b'-' | b'0'..=b'9') => self.read_number()?,
            Some(_) => return Err(self.unexpected()),
        };

        self.after_value();
        Ok(event)
    }

    fn read_literal(
        &mut self,
        literal: &[u8],
        event: JsonEvent<'a>,
    ) -> Result<JsonEvent<'a>, JsonError> {
        for &expected in literal {
            match self.peek() {
                Some(b) if b == expected => self.position += 1,
                _ => return Err(self.unexpected()),
            }
        }

        Ok(event)
    }

    fn read_number(&mut self) -> Result<JsonEvent<'a>, JsonError> {
        let start = self.position;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.position += 1;
        }

        match self.peek() {
            Some(b'0') => self.position += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.err(JsonErrorKind::InvalidNumber)),
        }

        let mut integral = true;
        if self.peek() == Some(b'.') {
            integral = false;
            self.position += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err(JsonErrorKind::InvalidNumber));
            }
            self.skip_digits();
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            integral = false;
            self.position += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.position += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err(JsonErrorKind::InvalidNumber));
            }
            self.skip_digits();
        }

        // the grammar above only admits ascii
        let text = std::str::from_utf8(&self.data[start..self.position])
            .map_err(|_| JsonError::new(JsonErrorKind::InvalidNumber, start))?;

        if integral {
            if negative {
                if let Ok(x) = text.parse::<i64>() {
                    return Ok(JsonEvent::Int(x));
                }
            } else if let Ok(x) = text.parse::<u64>() {
                return Ok(JsonEvent::Uint(x));
            }
        }

        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(JsonEvent::Double(x)),
            _ => Err(JsonError::new(JsonErrorKind::InvalidNumber, start)),
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.position += 1;
        }
    }

    /// Reads a string starting at the opening quote
    fn read_string(&mut self) -> Result<Cow<'a, str>, JsonError> {
        self.position += 1;
        let start = self.position;
        loop {
            match self.peek() {
                None => return Err(self.err(JsonErrorKind::Eof)),
                Some(b'"') => {
                    let raw = &self.data[start..self.position];
                    self.position += 1;
                    return std::str::from_utf8(raw)
                        .map(Cow::Borrowed)
                        .map_err(|_| JsonError::new(JsonErrorKind::InvalidUtf8, start));
                }
                Some(b'\\') => return self.read_escaped_string(start).map(Cow::Owned),
                Some(b) if b < 0x20 => return Err(self.err(JsonErrorKind::ControlCharacter)),
                Some(_) => self.position += 1,
            }
        }
    }

    /// Slow path once an escape has been seen, `start` is the first byte
    /// after the opening quote
    fn read_escaped_string(&mut self, start: usize) -> Result<String, JsonError> {
        let mut scratch: Vec<u8> = self.data[start..self.position].to_vec();
        loop {
            match self.peek() {
                None => return Err(self.err(JsonErrorKind::Eof)),
                Some(b'"') => {
                    self.position += 1;
                    return String::from_utf8(scratch)
                        .map_err(|_| JsonError::new(JsonErrorKind::InvalidUtf8, start));
                }
                Some(b'\\') => {
                    self.position += 1;
                    let escaped = match self.peek() {
                        Some(b'"') => b'"',
                        Some(b'\\') => b'\\',
                        Some(b'/') => b'/',
                        Some(b'b') => 0x08,
                        Some(b'f') => 0x0c,
                        Some(b'n') => b'\n',
                        Some(b'r') => b'\r',
                        Some(b't') => b'\t',
                        Some(b'u') => {
                            self.position += 1;
                            let c = self.read_unicode_escape()?;
                            let mut buf = [0u8; 4];
                            scratch.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                            continue;
                        }
                        Some(_) => return Err(self.err(JsonErrorKind::InvalidEscape)),
                        None => return Err(self.err(JsonErrorKind::Eof)),
                    };
                    self.position += 1;
                    scratch.push(escaped);
                }
                Some(b) if b < 0x20 => return Err(self.err(JsonErrorKind::ControlCharacter)),
                Some(b) => {
                    self.position += 1;
                    scratch.push(b);
                }
            }
        }
    }

    /// Reads the four hex digits after `\u`, and a trailing low surrogate
    /// escape when the first one is a high surrogate
    fn read_unicode_escape(&mut self) -> Result<char, JsonError> {
        let first = self.read_hex4()?;
        let code = match first {
            0xD800..=0xDBFF => {
                if self.data.get(self.position..self.position + 2) != Some(&b"\\u"[..]) {
                    return Err(self.err(JsonErrorKind::InvalidUnicode));
                }
                self.position += 2;
                let second = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.err(JsonErrorKind::InvalidUnicode));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.err(JsonErrorKind::InvalidUnicode)),
            x => x,
        };

        char::from_u32(code).ok_or_else(|| self.err(JsonErrorKind::InvalidUnicode))
    }

    fn read_hex4(&mut self) -> Result<u32, JsonError> {
        let digits = self
            .data
            .get(self.position..self.position + 4)
            .ok_or_else(|| self.err(JsonErrorKind::Eof))?;

        let mut result = 0u32;
        for &d in digits {
            let value = match d {
                b'0'..=b'9' => d - b'0',
                b'a'..=b'f' => d - b'a' + 10,
                b'A'..=b'F' => d - b'A' + 10,
                _ => return Err(self.err(JsonErrorKind::InvalidUnicode)),
            };
            result = (result << 4) | u32::from(value);
        }

        self.position += 4;
        Ok(result)
    }
}

impl<'a> Iterator for JsonParser<'a> {
    type Item = Result<JsonEvent<'a>, JsonError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::*;

    fn events(data: &[u8]) -> Vec<JsonEvent<'_>> {
        JsonParser::new(data)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn error(data: &[u8]) -> JsonError {
        JsonParser::new(data)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err()
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(
            events(b" { } "),
            vec![JsonEvent::StartObject, JsonEvent::EndObject]
        );
        assert_eq!(
            events(b"[[],{}]"),
            vec![
                JsonEvent::StartArray,
                JsonEvent::StartArray,
                JsonEvent::EndArray,
                JsonEvent::StartObject,
                JsonEvent::EndObject,
                JsonEvent::EndArray,
            ]
        );
    }

    #[test]
    fn test_envelope_keys() {
        assert_eq!(
            events(br#"{"_":"","  version":"acmacs-ace-v1","c":{}}"#),
            vec![
                JsonEvent::StartObject,
                JsonEvent::Key("_".into()),
                JsonEvent::String("".into()),
                JsonEvent::Key("  version".into()),
                JsonEvent::String("acmacs-ace-v1".into()),
                JsonEvent::Key("c".into()),
                JsonEvent::StartObject,
                JsonEvent::EndObject,
                JsonEvent::EndObject,
            ]
        );
    }

    #[test]
    fn test_unescaped_strings_are_borrowed() {
        let mut parser = JsonParser::new(br#"["A/X/1/2020"]"#);
        parser.next();
        match parser.next() {
            Some(Ok(JsonEvent::String(Cow::Borrowed(s)))) => assert_eq!(s, "A/X/1/2020"),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[rstest]
    #[case(br#""a\"b""#, "a\"b")]
    #[case(br#""a\\b""#, "a\\b")]
    #[case(br#""\/\b\f\n\r\t""#, "/\u{8}\u{c}\n\r\t")]
    #[case(br#""\u00e9t\u00E9""#, "été")]
    #[case(br#""\ud83d\ude00""#, "\u{1F600}")]
    #[case("\"HONG KONG/4801/2014 été\"".as_bytes(), "HONG KONG/4801/2014 été")]
    fn test_strings(#[case] input: &[u8], #[case] expected: &str) {
        assert_eq!(events(input), vec![JsonEvent::String(expected.into())]);
    }

    #[rstest]
    #[case(b"0", JsonEvent::Uint(0))]
    #[case(b"1280", JsonEvent::Uint(1280))]
    #[case(b"-1", JsonEvent::Int(-1))]
    #[case(b"-0", JsonEvent::Int(0))]
    #[case(b"1.5", JsonEvent::Double(1.5))]
    #[case(b"-0.25", JsonEvent::Double(-0.25))]
    #[case(b"1e-10", JsonEvent::Double(1e-10))]
    #[case(b"2E3", JsonEvent::Double(2000.0))]
    #[case(b"18446744073709551615", JsonEvent::Uint(u64::MAX))]
    #[case(b"18446744073709551616", JsonEvent::Double(18446744073709551616.0))]
    #[case(b"-9223372036854775809", JsonEvent::Double(-9223372036854775809.0))]
    fn test_numbers(#[case] input: &[u8], #[case] expected: JsonEvent) {
        assert_eq!(events(input), vec![expected]);
    }

    #[rstest]
    #[case(b"true", JsonEvent::Bool(true))]
    #[case(b"false", JsonEvent::Bool(false))]
    #[case(b"null", JsonEvent::Null)]
    fn test_literals(#[case] input: &[u8], #[case] expected: JsonEvent) {
        assert_eq!(events(input), vec![expected]);
    }

    #[rstest]
    #[case(b"", JsonErrorKind::Eof, 0)]
    #[case(b"{", JsonErrorKind::Eof, 1)]
    #[case(b"[1,]", JsonErrorKind::Unexpected(b']'), 3)]
    #[case(b"[1 2]", JsonErrorKind::Unexpected(b'2'), 3)]
    #[case(b"{\"a\" 1}", JsonErrorKind::Unexpected(b'1'), 5)]
    #[case(b"{1:2}", JsonErrorKind::Unexpected(b'1'), 1)]
    #[case(b"{\"a\":1]", JsonErrorKind::Unexpected(b']'), 6)]
    #[case(b"01", JsonErrorKind::TrailingData, 1)]
    #[case(b"-", JsonErrorKind::InvalidNumber, 1)]
    #[case(b"1.", JsonErrorKind::InvalidNumber, 2)]
    #[case(b"1e", JsonErrorKind::InvalidNumber, 2)]
    #[case(b"1e400", JsonErrorKind::InvalidNumber, 0)]
    #[case(b"tru", JsonErrorKind::Eof, 3)]
    #[case(b"nul1", JsonErrorKind::Unexpected(b'1'), 3)]
    #[case(b"\"a\\x\"", JsonErrorKind::InvalidEscape, 3)]
    #[case(b"\"\\ud800\"", JsonErrorKind::InvalidUnicode, 7)]
    #[case(b"\"a\nb\"", JsonErrorKind::ControlCharacter, 2)]
    #[case(b"{} {}", JsonErrorKind::TrailingData, 3)]
    fn test_syntax_errors(
        #[case] input: &[u8],
        #[case] kind: JsonErrorKind,
        #[case] offset: usize,
    ) {
        let err = error(input);
        assert_eq!(err.kind(), &kind);
        assert_eq!(err.offset(), offset);
    }

    #[test]
    fn test_fused_after_error() {
        let mut parser = JsonParser::new(b"[1,,2]");
        assert_eq!(parser.next(), Some(Ok(JsonEvent::StartArray)));
        assert_eq!(parser.next(), Some(Ok(JsonEvent::Uint(1))));
        assert!(matches!(parser.next(), Some(Err(_))));
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn test_token_start() {
        let mut parser = JsonParser::new(br#"{ "a" : [ 1 , 22 ] }"#);
        let starts: Vec<usize> = std::iter::from_fn(|| {
            parser.next().map(|x| {
                x.unwrap();
                parser.token_start()
            })
        })
        .collect();
        assert_eq!(starts, vec![0, 2, 8, 10, 14, 17, 19]);
    }

    #[test]
    fn test_depth_tracking() {
        let mut parser = JsonParser::new(b"[[[]]]");
        parser.next();
        parser.next();
        assert_eq!(parser.depth(), 2);
        parser.next();
        parser.next();
        assert_eq!(parser.depth(), 2);
    }

    #[quickcheck]
    fn unsigned_integers_equality(data: u64) -> bool {
        events(data.to_string().as_bytes()) == vec![JsonEvent::Uint(data)]
    }

    #[quickcheck]
    fn signed_integers_equality(data: i64) -> bool {
        let expected = if data < 0 {
            JsonEvent::Int(data)
        } else {
            JsonEvent::Uint(data as u64)
        };
        events(data.to_string().as_bytes()) == vec![expected]
    }

    #[quickcheck]
    fn arbitrary_input_terminates(data: Vec<u8>) -> bool {
        let mut parser = JsonParser::new(&data);
        let mut count = 0;
        while let Some(event) = parser.next() {
            count += 1;
            if event.is_err() {
                return parser.next().is_none();
            }
        }
        count <= data.len()
    }
}
