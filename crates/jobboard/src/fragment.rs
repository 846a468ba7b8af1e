//! Partial-update SQL fragment building.
//!
//! Both entity models funnel their partial updates through
//! [`sql_for_partial_update`]: a sparse field payload plus a per-entity
//! [`FieldMap`] produce a `SET` fragment with positional placeholders and an
//! index-aligned value list. The caller appends its row-selector predicate
//! at [`UpdateFragment::next_placeholder`] and issues the statement.
//!
//! Only column names from the field map are ever interpolated into SQL
//! text; field values travel out-of-band as bound parameters.

use crate::error::{ModelError, ModelResult};
use crate::value::Value;
use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use std::fmt;

/// An insertion-ordered partial-update payload.
///
/// Field order is preserved from the request body, so placeholder numbering
/// is deterministic for a given input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateFields {
    entries: Vec<(String, Value)>,
}

impl UpdateFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder-style. Later entries keep later positions.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((field.into(), value.into()));
        self
    }

    /// Build from a JSON request body.
    ///
    /// Anything other than a JSON object is a caller bug and fails with
    /// [`ModelError::MalformedInput`].
    pub fn from_json(body: serde_json::Value) -> ModelResult<Self> {
        serde_json::from_value(body).map_err(|e| ModelError::malformed(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'de> Deserialize<'de> for UpdateFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = UpdateFields;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of field updates")
            }

            fn visit_map<A>(self, mut access: A) -> Result<UpdateFields, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((field, value)) = access.next_entry::<String, Value>()? {
                    entries.push((field, value));
                }
                Ok(UpdateFields { entries })
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// Per-entity field map: renames from logical (API-facing) field names to
/// storage columns, plus the pass-through fields whose logical and column
/// names coincide.
///
/// Together the two lists form the allow-list of updatable fields. A field
/// in neither list is rejected rather than interpolated verbatim, so
/// request keys can never smuggle arbitrary identifiers into SQL text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMap<'a> {
    renames: &'a [(&'a str, &'a str)],
    passthrough: &'a [&'a str],
}

impl<'a> FieldMap<'a> {
    pub const fn new(renames: &'a [(&'a str, &'a str)], passthrough: &'a [&'a str]) -> Self {
        Self {
            renames,
            passthrough,
        }
    }

    /// Resolve a logical field name to its column, or `None` if the field
    /// is not updatable.
    pub fn resolve(&self, field: &str) -> Option<&'a str> {
        for (logical, column) in self.renames {
            if *logical == field {
                return Some(column);
            }
        }
        for allowed in self.passthrough {
            if *allowed == field {
                return Some(allowed);
            }
        }
        None
    }
}

/// A parameterized `SET` fragment with index-aligned values.
#[derive(Debug, Clone)]
pub struct UpdateFragment {
    set_clause: String,
    values: Vec<Value>,
}

impl UpdateFragment {
    /// The comma-separated `"column"=$n` assignment list.
    pub fn set_clause(&self) -> &str {
        &self.set_clause
    }

    /// Values in placeholder order: the i-th value binds `$i`.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 1-based index of the next free placeholder, for the caller's
    /// row-selector predicate.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Append the row-selector value and return the full parameter list.
    pub fn into_params(self, selector: impl Into<Value>) -> Vec<Value> {
        let mut params = self.values;
        params.push(selector.into());
        params
    }
}

/// Translate a sparse update payload into a `SET` fragment and its ordered
/// parameter values.
///
/// Fields are enumerated in insertion order; the entry at position `i`
/// (1-based) emits `"column"=$i` and contributes the i-th value. Explicit
/// nulls are kept, and value contents are never inspected.
///
/// Fails with [`ModelError::BadRequest`] when the payload is empty or names
/// a field the map does not allow.
pub fn sql_for_partial_update(
    fields: &UpdateFields,
    map: &FieldMap<'_>,
) -> ModelResult<UpdateFragment> {
    if fields.is_empty() {
        return Err(ModelError::bad_request("no fields to update"));
    }

    let mut clauses = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for (idx, (field, value)) in fields.iter().enumerate() {
        let column = map
            .resolve(field)
            .ok_or_else(|| ModelError::bad_request(format!("unknown field: {field}")))?;
        clauses.push(format!("\"{}\"=${}", column, idx + 1));
        values.push(value.clone());
    }

    Ok(UpdateFragment {
        set_clause: clauses.join(", "),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: FieldMap<'static> = FieldMap::new(&[("firstName", "first_name")], &["age"]);

    #[test]
    fn renamed_and_passthrough_fields() {
        let fields = UpdateFields::new().set("firstName", "Elaine").set("age", 30);
        let fragment = sql_for_partial_update(&fields, &PERSON).unwrap();
        assert_eq!(fragment.set_clause(), "\"first_name\"=$1, \"age\"=$2");
        assert_eq!(
            fragment.values(),
            &[Value::Text("Elaine".into()), Value::Int(30)]
        );
    }

    #[test]
    fn single_field_with_rename() {
        let fields = UpdateFields::new().set("firstName", "Elaine");
        let fragment = sql_for_partial_update(&fields, &PERSON).unwrap();
        assert_eq!(fragment.set_clause(), "\"first_name\"=$1");
        assert_eq!(fragment.values(), &[Value::Text("Elaine".into())]);
        assert_eq!(fragment.next_placeholder(), 2);
    }

    #[test]
    fn allowed_key_with_no_rename_is_used_verbatim() {
        let map = FieldMap::new(&[], &["firstName"]);
        let fields = UpdateFields::new().set("firstName", "Elaine");
        let fragment = sql_for_partial_update(&fields, &map).unwrap();
        assert_eq!(fragment.set_clause(), "\"firstName\"=$1");
        assert_eq!(fragment.values(), &[Value::Text("Elaine".into())]);
    }

    #[test]
    fn empty_payload_is_a_bad_request() {
        let err = sql_for_partial_update(&UpdateFields::new(), &PERSON).unwrap_err();
        assert!(err.is_bad_request());

        let err = sql_for_partial_update(&UpdateFields::new(), &FieldMap::default()).unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn unknown_field_is_rejected() {
        // Stricter than the permissive variant of this algorithm, which
        // would interpolate the raw key as a column name.
        let fields = UpdateFields::new().set("handle; DROP TABLE companies", "x");
        let err = sql_for_partial_update(&fields, &PERSON).unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn explicit_nulls_are_preserved_in_order() {
        let map = FieldMap::new(&[], &["salary", "equity", "title"]);
        let fields = UpdateFields::new()
            .set("salary", Value::Null)
            .set("equity", Value::Null)
            .set("title", "New");
        let fragment = sql_for_partial_update(&fields, &map).unwrap();
        assert_eq!(
            fragment.set_clause(),
            "\"salary\"=$1, \"equity\"=$2, \"title\"=$3"
        );
        assert_eq!(
            fragment.values(),
            &[Value::Null, Value::Null, Value::Text("New".into())]
        );
    }

    #[test]
    fn placeholders_match_value_count_with_no_gaps() {
        let map = FieldMap::new(&[], &["a", "b", "c", "d"]);
        let fields = UpdateFields::new()
            .set("a", 1)
            .set("b", 2)
            .set("c", 3)
            .set("d", 4);
        let fragment = sql_for_partial_update(&fields, &map).unwrap();
        for i in 1..=4 {
            assert!(fragment.set_clause().contains(&format!("${i}")));
        }
        assert_eq!(fragment.set_clause().matches('$').count(), 4);
        assert_eq!(fragment.values().len(), 4);
        assert_eq!(fragment.next_placeholder(), 5);
    }

    #[test]
    fn build_is_deterministic() {
        let fields = UpdateFields::new().set("firstName", "Elaine").set("age", 30);
        let a = sql_for_partial_update(&fields, &PERSON).unwrap();
        let b = sql_for_partial_update(&fields, &PERSON).unwrap();
        assert_eq!(a.set_clause(), b.set_clause());
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn into_params_appends_selector_last() {
        let fields = UpdateFields::new().set("age", 30);
        let fragment = sql_for_partial_update(&fields, &PERSON).unwrap();
        let params = fragment.into_params("c1");
        assert_eq!(params, vec![Value::Int(30), Value::Text("c1".into())]);
    }

    #[test]
    fn from_json_preserves_request_order() {
        let fields = UpdateFields::from_json(serde_json::json!({
            "firstName": "Elaine",
            "age": 30,
        }))
        .unwrap();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["firstName", "age"]);
    }

    #[test]
    fn from_json_rejects_non_objects() {
        for body in [
            serde_json::json!(null),
            serde_json::json!([1, 2]),
            serde_json::json!("name"),
        ] {
            let err = UpdateFields::from_json(body).unwrap_err();
            assert!(matches!(err, ModelError::MalformedInput(_)));
        }
    }

    #[test]
    fn field_map_rename_takes_precedence() {
        let map = FieldMap::new(&[("name", "display_name")], &["name"]);
        assert_eq!(map.resolve("name"), Some("display_name"));
    }
}
