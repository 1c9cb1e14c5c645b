use serde_json::{Map, Number, Value as JsonValue};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::frame::Frame;
use crate::value::Value;

const FIELD_SEPARATOR: u8 = 0x1f;
const ROW_TERMINATOR: u8 = b'\n';

impl Frame {
    /// Serializes the frame as a JSON array with one object per row, keys in column order.
    ///
    /// Nulls and non-finite floats are written as `null`.
    pub fn to_json_rows(&self) -> Result<String> {
        let rows: Vec<JsonValue> = (0..self.height())
            .map(|row| {
                let mut object = Map::new();
                for column in self.columns() {
                    object.insert(column.name().to_string(), json_value(column.get(row)));
                }
                JsonValue::Object(object)
            })
            .collect();
        Ok(serde_json::to_string(&rows)?)
    }

    /// Lowercase hex SHA-256 of the first `max_cols` columns, clamped to `1..=width`.
    ///
    /// Each row is hashed as its rendered fields separated by `0x1F` and terminated
    /// by `\n`. Nulls render as the empty string, so a null and an empty text value
    /// produce the same digest.
    pub fn projection_checksum(&self, max_cols: usize) -> String {
        let cols = max_cols.max(1).min(self.width());
        let columns: Vec<_> = self.columns().take(cols).collect();

        let mut hasher = Sha256::new();
        for row in 0..self.height() {
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    hasher.update([FIELD_SEPARATOR]);
                }
                hasher.update(column.value_string(row).as_bytes());
            }
            hasher.update([ROW_TERMINATOR]);
        }
        hex::encode(hasher.finalize())
    }
}

fn json_value(value: Option<Value>) -> JsonValue {
    match value {
        None | Some(Value::Null) => JsonValue::Null,
        Some(Value::Int(v)) => JsonValue::from(v),
        Some(Value::Float(v)) => Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number),
        Some(Value::Bool(v)) => JsonValue::Bool(v),
        Some(Value::Text(v)) => JsonValue::String(v.to_string()),
    }
}
