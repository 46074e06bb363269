use serde_json::Value;

/// Drawing settings of a chart, kept verbatim
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotSpec(Value);

impl PlotSpec {
    pub fn new(value: Value) -> Self {
        PlotSpec(value)
    }

    /// True when absent or an empty object
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(x) => x.is_empty(),
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for PlotSpec {
    fn from(value: Value) -> Self {
        PlotSpec(value)
    }
}
