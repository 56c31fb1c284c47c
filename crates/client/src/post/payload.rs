//! Conversion of a form submission into a SharePoint list item.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use super::{FormContext, Submission};

/// Content type that makes SharePoint accept `__metadata` in the body.
pub const ODATA_CONTENT_TYPE: &str = "application/json;odata=verbose";

/// Element type whose values are sent as booleans.
const CHECKBOX: &str = "checkbox";

/// Alteration applied to every payload before delivery.
///
/// Hooks run in registration order and may add, change or remove fields.
pub trait PayloadHook: Send + Sync {
    fn alter(&self, payload: &mut Map<String, Value>, form: &FormContext);
}

impl<F> PayloadHook for F
where
    F: Fn(&mut Map<String, Value>, &FormContext) + Send + Sync,
{
    fn alter(&self, payload: &mut Map<String, Value>, form: &FormContext) {
        self(payload, form)
    }
}

/// Loose truthiness of a submitted value.
///
/// `false`, `null`, zero, `""`, `"0"`, and empty arrays or objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Build the list item body for `submission`.
///
/// Strings are trimmed and checkbox values become booleans. Only fields with
/// an entry in `mapping` are kept, under their SharePoint name.
pub fn build_payload(
    list_name: &str, submission: &Submission, form: &FormContext, mapping: &HashMap<String, String>,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("__metadata".to_string(), json!({ "type": format!("SP.Data.{list_name}") }));
    payload.insert("ReferralFormID".to_string(), Value::String(submission.uuid.clone()));
    payload.insert("Language".to_string(), Value::String(form.langcode.clone()));

    for (key, value) in &submission.data {
        let Some(target) = mapping.get(key) else {
            continue;
        };

        let mut value = match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        };
        if form.element_type(key) == Some(CHECKBOX) {
            value = Value::Bool(is_truthy(&value));
        }

        payload.insert(target.clone(), value);
    }

    payload
}
