//! Form schemas, raw-input conversion and validation.
//!
//! A `FormSpec` lists the fields of a create/edit dialog. The UI keeps one
//! raw string per field; `FormSpec::build` turns those strings into a JSON
//! object (typed per field kind, `gymId` injected), and `parse_draft`
//! deserializes it into the resource's draft type and runs its `validator`
//! rules. Nothing reaches the network until both steps pass.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::api::{api_error, ApiClient, Resource};
use crate::models::Id;

/// Field key -> message
pub type FieldErrors = BTreeMap<String, String>;

/// Key for errors that belong to the form as a whole
pub const FORM_LEVEL: &str = "__all__";

#[derive(Error, Debug)]
pub enum FormError {
    #[error("{} field(s) need attention", .0.len())]
    Invalid(FieldErrors),

    #[error("Form data could not be read: {0}")]
    Malformed(String),

    #[error(transparent)]
    Request(#[from] anyhow::Error),
}

impl FormError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FormError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }

    /// Text suitable for a toast notification.
    pub fn user_message(&self) -> String {
        match self {
            FormError::Invalid(errors) => match errors.values().next() {
                Some(first) if errors.len() == 1 => first.clone(),
                _ => format!("{} fields need attention", errors.len()),
            },
            FormError::Malformed(msg) => msg.clone(),
            FormError::Request(err) => api_error(err)
                .map(|e| e.user_message())
                .unwrap_or_else(|| err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Integer,
    Money,
    Date,
    /// `YYYY-MM`
    Month,
    Bool,
    /// One of a fixed set of wire values
    Choice(&'static [&'static str]),
    /// Id of another resource
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key; dots address nested values (`items.0.quantity`)
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn is_secret(&self) -> bool {
        self.key.eq_ignore_ascii_case("password")
    }

    /// Initial raw value for an empty form
    fn blank(&self) -> String {
        match self.kind {
            FieldKind::Bool => "no".to_string(),
            FieldKind::Choice(options) if self.required => {
                options.first().map(|s| s.to_string()).unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    fn parse(&self, raw: &str) -> Result<Option<Value>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return match self.kind {
                FieldKind::Bool => Ok(Some(Value::Bool(false))),
                _ if self.required => Err(format!("{} is required", self.label)),
                _ => Ok(None),
            };
        }

        let value = match self.kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Phone => Value::String(raw.to_string()),
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("{} must be a whole number", self.label))?,
            FieldKind::Reference => match raw.parse::<Id>() {
                Ok(id) if id > 0 => Value::from(id),
                _ => return Err(format!("{} must be a valid id", self.label)),
            },
            FieldKind::Money => {
                let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '$').collect();
                let amount: Decimal = cleaned
                    .parse()
                    .map_err(|_| format!("{} must be an amount", self.label))?;
                Value::String(amount.normalize().to_string())
            }
            FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .map_err(|_| format!("{} must be a date (YYYY-MM-DD)", self.label))?,
            FieldKind::Month => NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m").to_string()))
                .map_err(|_| format!("{} must be a month (YYYY-MM)", self.label))?,
            FieldKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "y" | "yes" | "true" | "1" => Value::Bool(true),
                "n" | "no" | "false" | "0" => Value::Bool(false),
                _ => return Err(format!("{} must be yes or no", self.label)),
            },
            FieldKind::Choice(options) => options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(raw))
                .map(|o| Value::String(o.to_string()))
                .ok_or_else(|| format!("{} must be one of: {}", self.label, options.join(", ")))?,
        };
        Ok(Some(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl FormSpec {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            fields: Vec::new(),
        }
    }

    /// Add a required field
    pub fn field(mut self, key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            key,
            label,
            kind,
            required: true,
        });
        self
    }

    /// Add an optional field
    pub fn optional(mut self, key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            key,
            label,
            kind,
            required: false,
        });
        self
    }

    pub fn blank_values(&self) -> Vec<String> {
        self.fields.iter().map(FieldSpec::blank).collect()
    }

    /// Raw values for an edit form, read from the entity's JSON form.
    pub fn prefill(&self, entity: &Value) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| {
                let pointer = format!("/{}", field.key.replace('.', "/"));
                match entity.pointer(&pointer) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => if *b { "yes" } else { "no" }.to_string(),
                    _ => field.blank(),
                }
            })
            .collect()
    }

    /// Convert raw values into a JSON object, reporting every bad field.
    pub fn build(&self, values: &[String], gym_id: Option<Id>) -> Result<Value, FormError> {
        let mut root = Value::Object(Map::new());
        let mut errors = FieldErrors::new();

        for (i, field) in self.fields.iter().enumerate() {
            let raw = values.get(i).map(String::as_str).unwrap_or("");
            match field.parse(raw) {
                Ok(Some(value)) => insert_path(&mut root, field.key, value),
                Ok(None) => {}
                Err(message) => {
                    errors.insert(field.key.to_string(), message);
                }
            }
        }

        if !errors.is_empty() {
            debug!(form = self.title, count = errors.len(), "Form rejected");
            return Err(FormError::Invalid(errors));
        }

        if let (Some(gym_id), Value::Object(map)) = (gym_id, &mut root) {
            map.insert("gymId".to_string(), Value::Number(Number::from(gym_id)));
        }
        Ok(root)
    }
}

impl FormSpec {
    /// Lists the form edits only partly (`items.0.*`): append the entries of
    /// `original` past the ones the form built.
    pub fn carry_over(&self, built: &mut Value, original: &Value) {
        let mut lists: Vec<String> = self
            .fields
            .iter()
            .filter_map(|field| list_pointer(field.key))
            .collect();
        lists.sort();
        lists.dedup();

        for pointer in lists {
            let Some(Value::Array(source)) = original.pointer(&pointer) else { continue };
            let Some(Value::Array(target)) = built.pointer_mut(&pointer) else { continue };
            if source.len() > target.len() {
                let extra = source[target.len()..].to_vec();
                debug!(form = self.title, list = %pointer, kept = extra.len(), "Carrying list entries");
                target.extend(extra);
            }
        }
    }

    /// Optional fields left empty that held a value in `original` are sent as
    /// `null` so the server clears them.
    pub fn clear_emptied(&self, body: &mut Value, values: &[String], original: &Value) {
        for (i, field) in self.fields.iter().enumerate() {
            if field.required || field.kind == FieldKind::Bool {
                continue;
            }
            let raw = values.get(i).map(String::as_str).unwrap_or("");
            if !raw.trim().is_empty() {
                continue;
            }
            let pointer = format!("/{}", field.key.replace('.', "/"));
            if original.pointer(&pointer).is_some_and(|v| !v.is_null()) {
                insert_path(body, field.key, Value::Null);
            }
        }
    }
}

/// JSON pointer of the array a dotted key indexes into (`items.0.x` -> `/items`)
fn list_pointer(key: &str) -> Option<String> {
    let segments: Vec<&str> = key.split('.').collect();
    let index = segments.iter().position(|s| s.parse::<usize>().is_ok())?;
    Some(format!("/{}", segments[..index].join("/")))
}

/// Set `value` at a dotted path, creating objects and arrays on the way.
fn insert_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    let segments: Vec<&str> = path.split('.').collect();
    for (depth, segment) in segments.iter().enumerate() {
        let last = depth == segments.len() - 1;
        let next_is_index = segments
            .get(depth + 1)
            .map(|s| s.parse::<usize>().is_ok())
            .unwrap_or(false);
        let empty_child = || {
            if next_is_index {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            }
        };

        current = match segment.parse::<usize>() {
            Ok(index) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let Value::Array(items) = current else { return };
                while items.len() <= index {
                    items.push(Value::Null);
                }
                if last {
                    items[index] = value;
                    return;
                }
                if items[index].is_null() {
                    items[index] = empty_child();
                }
                &mut items[index]
            }
            Err(_) => {
                if !current.is_object() {
                    *current = Value::Object(Map::new());
                }
                let Value::Object(map) = current else { return };
                if last {
                    map.insert(segment.to_string(), value);
                    return;
                }
                map.entry(segment.to_string()).or_insert_with(empty_child)
            }
        };
    }
}

/// Deserialize a built form into a typed draft and run its validation rules.
pub fn parse_draft<D: DeserializeOwned + Validate>(value: Value) -> Result<D, FormError> {
    let draft: D = serde_json::from_value(value).map_err(|e| FormError::Malformed(e.to_string()))?;
    draft.validate().map_err(|e| FormError::Invalid(collect_errors(&e)))?;
    Ok(draft)
}

fn collect_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, kind) in errors.errors() {
        // Struct-level rules report under `__all__`
        let key = match field.as_ref() {
            FORM_LEVEL => FORM_LEVEL.to_string(),
            name => camel_case(name),
        };
        let message = match kind {
            ValidationErrorsKind::Field(list) => list
                .first()
                .map(|e| describe(e, &key))
                .unwrap_or_else(|| format!("{} is invalid", key)),
            ValidationErrorsKind::Struct(_) | ValidationErrorsKind::List(_) => {
                format!("Check the entries in {}", key)
            }
        };
        out.insert(key, message);
    }
    out
}

fn describe(error: &ValidationError, field: &str) -> String {
    if let Some(ref message) = error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "email" => "Enter a valid e-mail address".to_string(),
        "length" => format!("{} is required", field),
        "range" => format!("{} is out of range", field),
        code => format!("{} is invalid ({})", field, code),
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Custom validators shared by drafts
// ============================================================================

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message("Amount must be greater than zero".into()))
    }
}

pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("non_negative").with_message("Amount cannot be negative".into()))
    } else {
        Ok(())
    }
}

pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED {
        Ok(())
    } else {
        Err(ValidationError::new("percentage").with_message("Must be between 0 and 100".into()))
    }
}

// ============================================================================
// Submission
// ============================================================================

/// The stored record an edit form was opened on
#[derive(Debug, Clone, Copy)]
pub struct Original<'a> {
    pub id: Id,
    pub json: &'a Value,
}

/// Validate raw form values and create (`original == None`) or update a resource.
///
/// Updates keep list entries the form has no fields for and send `null` for
/// optional fields the user emptied, so a PATCH never loses data silently.
pub async fn submit<R: Resource>(
    api: &ApiClient,
    original: Option<Original<'_>>,
    values: &[String],
    gym_id: Option<Id>,
) -> Result<R, FormError> {
    let spec = R::form();
    let mut value = spec.build(values, gym_id)?;
    let service = api.resource::<R>();

    let Some(original) = original else {
        let draft: R::Draft = parse_draft(value)?;
        return Ok(service.create(&draft).await?);
    };

    spec.carry_over(&mut value, original.json);
    let draft: R::Draft = parse_draft(value)?;
    let mut body = serde_json::to_value(&draft).map_err(|e| FormError::Malformed(e.to_string()))?;
    spec.clear_emptied(&mut body, values, original.json);
    Ok(service.update(original.id, &body).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    const STATES: &[&str] = &["ACTIVE", "INACTIVE"];

    fn spec() -> FormSpec {
        FormSpec::new("Test")
            .field("name", "Name", FieldKind::Text)
            .optional("email", "Email", FieldKind::Email)
            .field("price", "Price", FieldKind::Money)
            .field("days", "Days", FieldKind::Integer)
            .field("status", "Status", FieldKind::Choice(STATES))
            .optional("start", "Start", FieldKind::Date)
            .field("active", "Active", FieldKind::Bool)
    }

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Draft {
        #[validate(length(min = 2, message = "Name is too short"))]
        name: String,
        #[validate(email)]
        email: Option<String>,
        #[validate(custom(function = "positive_amount"))]
        price: Decimal,
        #[validate(range(min = 1, max = 365))]
        days: i32,
        #[serde(rename = "gymId")]
        gym_id: i64,
    }

    #[test]
    fn test_build_typed_values() {
        let built = spec()
            .build(&values(&["Gold", "", "$1,200.50", "30", "active", "2025-01-31", "yes"]), Some(7))
            .unwrap();
        assert_eq!(
            built,
            json!({
                "name": "Gold",
                "price": "1200.5",
                "days": 30,
                "status": "ACTIVE",
                "start": "2025-01-31",
                "active": true,
                "gymId": 7
            })
        );
    }

    #[test]
    fn test_required_fields_rejected() {
        let err = spec().build(&values(&["", "", "", "", "", "", ""]), None).unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("name").unwrap(), "Name is required");
        assert_eq!(errors.get("price").unwrap(), "Price is required");
        assert_eq!(errors.get("days").unwrap(), "Days is required");
        assert_eq!(errors.get("status").unwrap(), "Status is required");
        // Optional and boolean fields do not error when empty
        assert!(!errors.contains_key("email"));
        assert!(!errors.contains_key("start"));
        assert!(!errors.contains_key("active"));
    }

    #[test]
    fn test_unparseable_values_rejected() {
        let err = spec()
            .build(&values(&["Gold", "", "lots", "ten", "paused", "31/01/2025", "maybe"]), None)
            .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors["status"], "Status must be one of: ACTIVE, INACTIVE");
        assert_eq!(errors["start"], "Start must be a date (YYYY-MM-DD)");
    }

    #[test]
    fn test_parse_draft_runs_validation() {
        let built = json!({"name": "G", "email": "nope", "price": "0", "days": 400, "gymId": 1});
        let err = parse_draft::<Draft>(built).unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors["name"], "Name is too short");
        assert_eq!(errors["email"], "Enter a valid e-mail address");
        assert_eq!(errors["price"], "Amount must be greater than zero");
        assert_eq!(errors["days"], "days is out of range");
    }

    #[test]
    fn test_parse_draft_ok() {
        let built = json!({"name": "Gold", "price": "49.99", "days": 30, "gymId": 1});
        let draft = parse_draft::<Draft>(built).unwrap();
        assert_eq!(draft.price, Decimal::new(4999, 2));
        assert_eq!(draft.gym_id, 1);
        assert!(draft.email.is_none());
    }

    #[test]
    fn test_nested_paths() {
        let spec = FormSpec::new("Invoice")
            .field("items.0.description", "Item", FieldKind::Text)
            .field("items.0.quantity", "Qty", FieldKind::Integer);
        let built = spec.build(&values(&["Day pass", "2"]), None).unwrap();
        assert_eq!(built, json!({"items": [{"description": "Day pass", "quantity": 2}]}));

        let prefill = spec.prefill(&built);
        assert_eq!(prefill, values(&["Day pass", "2"]));
    }

    #[test]
    fn test_prefill_from_entity() {
        let entity = json!({"name": "Gold", "price": 49.99, "days": 30, "status": "INACTIVE", "active": false});
        let raw = spec().prefill(&entity);
        assert_eq!(raw, values(&["Gold", "", "49.99", "30", "INACTIVE", "", "no"]));
    }

    #[test]
    fn test_blank_values_defaults() {
        assert_eq!(spec().blank_values(), values(&["", "", "", "", "ACTIVE", "", "no"]));
    }

    fn invoice_spec() -> FormSpec {
        FormSpec::new("Invoice")
            .field("number", "Number", FieldKind::Text)
            .optional("notes", "Notes", FieldKind::Text)
            .field("items.0.description", "Item", FieldKind::Text)
            .field("items.0.quantity", "Qty", FieldKind::Integer)
    }

    #[test]
    fn test_carry_over_keeps_unedited_items() {
        let spec = invoice_spec();
        let original = json!({
            "number": "INV-000001",
            "items": [
                {"description": "Day pass", "quantity": 1},
                {"description": "Towel", "quantity": 2},
                {"description": "Locker", "quantity": 1}
            ]
        });
        let mut built = spec.build(&values(&["INV-000001", "", "Week pass", "1"]), None).unwrap();
        spec.carry_over(&mut built, &original);
        assert_eq!(
            built["items"],
            json!([
                {"description": "Week pass", "quantity": 1},
                {"description": "Towel", "quantity": 2},
                {"description": "Locker", "quantity": 1}
            ])
        );
    }

    #[test]
    fn test_carry_over_without_original_list() {
        let spec = invoice_spec();
        let mut built = spec.build(&values(&["INV-000001", "", "Day pass", "1"]), None).unwrap();
        let before = built.clone();
        spec.carry_over(&mut built, &json!({"number": "INV-000001"}));
        assert_eq!(built, before);
    }

    #[test]
    fn test_clear_emptied_sends_null() {
        let spec = invoice_spec();
        let raw = values(&["INV-000001", "  ", "Day pass", "1"]);
        let mut body = json!({"number": "INV-000001"});

        spec.clear_emptied(&mut body, &raw, &json!({"notes": "Paid at desk"}));
        assert_eq!(body, json!({"number": "INV-000001", "notes": null}));

        // Nothing to clear when the record never had a value
        let mut untouched = json!({"number": "INV-000001"});
        spec.clear_emptied(&mut untouched, &raw, &json!({"notes": null}));
        assert_eq!(untouched, json!({"number": "INV-000001"}));
    }

    #[test]
    fn test_list_pointer() {
        assert_eq!(list_pointer("items.0.quantity").as_deref(), Some("/items"));
        assert_eq!(list_pointer("billing.lines.2.amount").as_deref(), Some("/billing/lines"));
        assert_eq!(list_pointer("firstName"), None);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("first_name"), "firstName");
        assert_eq!(camel_case("gymId"), "gymId");
        assert_eq!(camel_case("duration_days"), "durationDays");
    }

    #[test]
    fn test_user_message_single_error() {
        let mut errors = FieldErrors::new();
        errors.insert("name".to_string(), "Name is required".to_string());
        assert_eq!(FormError::Invalid(errors).user_message(), "Name is required");
    }
}
