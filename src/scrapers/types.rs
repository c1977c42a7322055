use serde_json::Value;

/// Envelope keys collectors use to wrap their records, in lookup order
const ENVELOPE_KEYS: [&str; 3] = ["items", "all_ads", "new_ads"];

/// Raw records produced by one collector invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub records: Vec<Value>,
}

impl RawBatch {
    /// Unwrap whatever shape a collector produced.
    ///
    /// Accepts `{items|all_ads|new_ads: [...]}`, a bare array, or a single
    /// record. `null` yields an empty batch.
    pub fn from_value(value: Value) -> Self {
        let records = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            Value::Object(mut map) => {
                let key = ENVELOPE_KEYS
                    .iter()
                    .find(|key| map.get(**key).is_some_and(Value::is_array));
                match key {
                    Some(key) => match map.remove(*key) {
                        Some(Value::Array(items)) => items,
                        _ => Vec::new(),
                    },
                    None => vec![Value::Object(map)],
                }
            }
            other => vec![other],
        };
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
