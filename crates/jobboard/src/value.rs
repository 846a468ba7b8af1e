//! JSON-like update values with direct Postgres binding.
//!
//! [`Value`] is the closed payload type carried by a partial update: every
//! entry of an update request is one of these, and the whole list is bound
//! as positional parameters. Values are never interpolated into SQL text.

use bytes::BytesMut;
use rust_decimal::Decimal;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A single update-payload value.
///
/// Explicit `Null` is a present value (it sets the column to NULL), never
/// "field absent". Nested arrays and objects pass through unchanged and
/// bind as JSONB.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Fractional numbers keep exact decimal semantics (e.g. an equity
    /// share in [0,1]); they are parsed from the JSON text, not via f64.
    Decimal(Decimal),
    Text(String),
    Json(serde_json::Value),
}

impl Value {
    /// Convert a JSON value into its closed-sum form.
    pub fn from_json(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Ok(d) = n.to_string().parse::<Decimal>() {
                    Self::Decimal(d)
                } else {
                    // Out of Decimal range; keep it as JSON rather than lose it.
                    Self::Json(serde_json::Value::Number(n))
                }
            }
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::from_json(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(raw))
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            // NUMERIC round-trips as a string, matching what the wire
            // protocol hands back for numeric columns.
            Self::Decimal(d) => serializer.collect_str(d),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Json(v) => v.serialize(serializer),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(b) => b.to_sql(ty, out),
            // Narrow to the column's integer width; overflow is a bind error.
            Self::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*i).to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Self::Decimal(d) => d.to_sql(ty, out),
            Self::Text(s) => s.to_sql(ty, out),
            Self::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The payload is dynamic by design; type mismatches surface as
        // bind/execution errors from the server.
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// Borrow a value slice as tokio-postgres positional parameters.
pub fn as_params(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_null_is_explicit_null() {
        assert_eq!(Value::from_json(serde_json::json!(null)), Value::Null);
        assert!(Value::from_json(serde_json::json!(null)).is_null());
    }

    #[test]
    fn json_integer_becomes_int() {
        assert_eq!(Value::from_json(serde_json::json!(30)), Value::Int(30));
    }

    #[test]
    fn json_fraction_keeps_exact_decimal() {
        let v = Value::from_json(serde_json::json!(0.065));
        assert_eq!(v, Value::Decimal("0.065".parse().unwrap()));
    }

    #[test]
    fn json_string_becomes_text() {
        assert_eq!(
            Value::from_json(serde_json::json!("Elaine")),
            Value::Text("Elaine".to_string())
        );
    }

    #[test]
    fn nested_json_passes_through_unchanged() {
        let raw = serde_json::json!({"tags": ["remote", "senior"]});
        assert_eq!(Value::from_json(raw.clone()), Value::Json(raw));
    }

    #[test]
    fn option_none_converts_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(5i32)), Value::Int(5));
    }

    #[test]
    fn decimal_serializes_as_string() {
        let v = Value::Decimal("0.5".parse().unwrap());
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"0.5\"");
    }

    #[test]
    fn as_params_is_index_aligned() {
        let values = vec![Value::Text("a".into()), Value::Null, Value::Int(1)];
        assert_eq!(as_params(&values).len(), 3);
    }
}
