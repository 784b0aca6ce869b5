use crate::ValueImpl;
use serde_json::Value;

impl ValueImpl for Value {
    fn null() -> Self {
        Value::Null
    }

    fn from_lexeme(lexeme: &str) -> Self {
        Value::String(lexeme.to_string())
    }

    fn aggregate(values: Vec<Self>) -> Self {
        Value::Array(values)
    }

    fn into_aggregate(self) -> Result<Vec<Self>, Self> {
        match self {
            Value::Array(values) => Ok(values),
            other => Err(other),
        }
    }
}
