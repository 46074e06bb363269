use super::frame::{Frame, FrameError, Step};
use crate::json::JsonEvent;
use serde_json::{Map, Number, Value};

const MAX_NESTING: usize = 128;

enum Partial {
    Array(Vec<Value>),
    Object(Map<String, Value>, Option<String>),
}

/// Captures an arbitrary JSON value without interpreting it
#[derive(Default)]
pub struct PassthroughFrame {
    stack: Vec<Partial>,
    value: Option<Value>,
}

impl PassthroughFrame {
    pub fn new() -> Self {
        PassthroughFrame::default()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    fn open(&mut self, partial: Partial) -> Result<Step, FrameError> {
        if self.stack.len() >= MAX_NESTING {
            return Err(FrameError::Invalid(format!(
                "nested more than {} levels deep",
                MAX_NESTING
            )));
        }

        self.stack.push(partial);
        Ok(Step::Continue)
    }

    fn insert(&mut self, value: Value) -> Result<Step, FrameError> {
        match self.stack.last_mut() {
            None => {
                self.value = Some(value);
                Ok(Step::Complete)
            }
            Some(Partial::Array(values)) => {
                values.push(value);
                Ok(Step::Continue)
            }
            Some(Partial::Object(map, key)) => {
                let key = key.take().ok_or(FrameError::Unexpected)?;
                map.insert(key, value);
                Ok(Step::Continue)
            }
        }
    }
}

impl Frame for PassthroughFrame {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        match event {
            JsonEvent::StartObject => self.open(Partial::Object(Map::new(), None)),
            JsonEvent::StartArray => self.open(Partial::Array(Vec::new())),
            JsonEvent::Key(k) => match self.stack.last_mut() {
                Some(Partial::Object(_, key @ None)) => {
                    *key = Some(k.to_string());
                    Ok(Step::Continue)
                }
                _ => Err(FrameError::Unexpected),
            },
            JsonEvent::EndObject => match self.stack.pop() {
                Some(Partial::Object(map, None)) => self.insert(Value::Object(map)),
                _ => Err(FrameError::Unexpected),
            },
            JsonEvent::EndArray => match self.stack.pop() {
                Some(Partial::Array(values)) => self.insert(Value::Array(values)),
                _ => Err(FrameError::Unexpected),
            },
            JsonEvent::String(x) => self.insert(Value::String(x.to_string())),
            JsonEvent::Int(x) => self.insert(Value::from(*x)),
            JsonEvent::Uint(x) => self.insert(Value::from(*x)),
            JsonEvent::Double(x) => {
                let number = Number::from_f64(*x)
                    .ok_or_else(|| FrameError::Invalid(format!("{} is not a finite number", x)))?;
                self.insert(Value::Number(number))
            }
            JsonEvent::Bool(x) => self.insert(Value::Bool(*x)),
            JsonEvent::Null => self.insert(Value::Null),
        }
    }
}
