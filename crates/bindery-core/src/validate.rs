//! The validation facility: coercion and constraint checking of raw values.
//!
//! [`Validator`] is the seam; [`SchemaValidator`] is the built-in
//! implementation. Raw values come keyed by alias (strings for query, form,
//! header, cookie and path sources; arbitrary JSON for bodies) and leave keyed
//! by parameter name, coerced to the declared [`FieldType`].

use std::fmt;

use serde_json::{json, Number, Value};

use crate::error::FieldError;
use crate::params::{Constraints, FieldType};
use crate::signature::{SchemaField, ValidationSchema};
use crate::values::{RawValues, Values};

/// Outcome of validating one raw mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    /// Coerced values of every field that passed.
    pub values: Values,
    /// Errors located by alias, in field declaration order.
    pub errors: Vec<FieldError>,
}

/// Validates a raw mapping against a schema.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Coerces and checks `raw`.
    fn validate(&self, schema: &ValidationSchema, raw: &RawValues) -> Validation;
}

/// Built-in lax validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

struct Issue {
    msg: String,
    error_type: &'static str,
    ctx: Option<Value>,
    index: Option<usize>,
}

impl Issue {
    fn new(msg: impl Into<String>, error_type: &'static str) -> Self {
        Self {
            msg: msg.into(),
            error_type,
            ctx: None,
            index: None,
        }
    }

    fn ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    fn into_error(self, alias: &str) -> FieldError {
        let mut err = FieldError::new(alias, self.msg, self.error_type);
        if let Some(i) = self.index {
            err.loc.push(i.to_string());
        }
        err.ctx = self.ctx;
        err
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, schema: &ValidationSchema, raw: &RawValues) -> Validation {
        let mut out = Validation::default();
        for field in schema.fields() {
            match raw.get(field.alias()) {
                None => match field.param().default_value() {
                    Some(default) => {
                        out.values.insert(field.name(), default.clone());
                    }
                    None => out.errors.push(FieldError::missing(field.alias())),
                },
                Some(value) => match check_field(field, value) {
                    Ok(v) => {
                        out.values.insert(field.name(), v);
                    }
                    Err(issue) => out.errors.push(issue.into_error(field.alias())),
                },
            }
        }
        out
    }
}

fn check_field(field: &SchemaField, value: &Value) -> Result<Value, Issue> {
    if value.is_null() {
        return match field.param().default_value() {
            Some(Value::Null) => Ok(Value::Null),
            _ => Err(Issue::new(
                "none is not an allowed value",
                "type_error.none.not_allowed",
            )),
        };
    }
    let coerced = coerce(field.ty(), value)?;
    check_constraints(field, &coerced)?;
    Ok(coerced)
}

fn coerce(ty: &FieldType, value: &Value) -> Result<Value, Issue> {
    match ty {
        FieldType::Any => Ok(value.clone()),
        FieldType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err(Issue::new("str type expected", "type_error.str")),
        },
        FieldType::Integer => coerce_integer(value)
            .map(Value::from)
            .ok_or_else(|| Issue::new("value is not a valid integer", "type_error.integer")),
        FieldType::Number => coerce_number(value)
            .map(Value::Number)
            .ok_or_else(|| Issue::new("value is not a valid float", "type_error.float")),
        FieldType::Boolean => coerce_bool(value).map(Value::Bool).ok_or_else(|| {
            Issue::new("value could not be parsed to a boolean", "type_error.bool")
        }),
        FieldType::Object => match value {
            Value::Object(_) => Ok(value.clone()),
            _ => Err(Issue::new("value is not a valid dict", "type_error.dict")),
        },
        FieldType::Array(item) => {
            let Value::Array(items) = value else {
                return Err(Issue::new("value is not a valid list", "type_error.list"));
            };
            coerce_items(item, items).map(Value::Array)
        }
        FieldType::Set(item) => {
            let Value::Array(items) = value else {
                return Err(Issue::new("value is not a valid set", "type_error.set"));
            };
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for v in coerce_items(item, items)? {
                if !unique.contains(&v) {
                    unique.push(v);
                }
            }
            Ok(Value::Array(unique))
        }
    }
}

fn coerce_items(item: &FieldType, items: &[Value]) -> Result<Vec<Value>, Issue> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            coerce(item, v).map_err(|mut issue| {
                issue.index = Some(i);
                issue
            })
        })
        .collect()
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.2e18)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "y" | "t" => Some(true),
            "0" | "false" | "no" | "off" | "n" | "f" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Renders a bound the way it was most likely written: `100`, not `100.0`.
fn limit_value(limit: f64) -> Value {
    if limit.fract() == 0.0 && limit.abs() < 9.2e18 {
        json!(limit as i64)
    } else {
        json!(limit)
    }
}

fn check_constraints(field: &SchemaField, value: &Value) -> Result<(), Issue> {
    let c = field.param().constraints();
    match value {
        Value::Number(n) => {
            if let Some(x) = n.as_f64() {
                check_bounds(c, x)?;
            }
        }
        Value::String(s) => {
            check_length(c, s.chars().count(), "characters", "any_str")?;
            if let Some(re) = field.pattern() {
                if !re.find(s).is_some_and(|m| m.start() == 0) {
                    return Err(Issue::new(
                        format!("string does not match regex \"{}\"", re.as_str()),
                        "value_error.str.regex",
                    )
                    .ctx(json!({ "pattern": re.as_str() })));
                }
            }
        }
        Value::Array(items) => check_length(c, items.len(), "items", "list")?,
        _ => {}
    }

    if !c.one_of.is_empty() && !c.one_of.contains(value) {
        let permitted: Vec<String> = c
            .one_of
            .iter()
            .map(|v| match v {
                Value::String(s) => format!("'{s}'"),
                other => other.to_string(),
            })
            .collect();
        return Err(Issue::new(
            format!(
                "value is not a valid enumeration member; permitted: {}",
                permitted.join(", ")
            ),
            "type_error.enum",
        )
        .ctx(json!({ "enum_values": c.one_of })));
    }
    Ok(())
}

fn check_bounds(c: &Constraints, x: f64) -> Result<(), Issue> {
    let checks: [(Option<f64>, fn(f64, f64) -> bool, &str, &'static str); 4] = [
        (c.gt, |x, l| x > l, "greater than", "value_error.number.not_gt"),
        (c.ge, |x, l| x >= l, "greater than or equal to", "value_error.number.not_ge"),
        (c.lt, |x, l| x < l, "less than", "value_error.number.not_lt"),
        (c.le, |x, l| x <= l, "less than or equal to", "value_error.number.not_le"),
    ];
    for (limit, ok, phrase, error_type) in checks {
        if let Some(limit) = limit {
            if !ok(x, limit) {
                return Err(Issue::new(
                    format!("ensure this value is {phrase} {limit}"),
                    error_type,
                )
                .ctx(json!({ "limit_value": limit_value(limit) })));
            }
        }
    }
    Ok(())
}

fn check_length(c: &Constraints, len: usize, unit: &str, family: &str) -> Result<(), Issue> {
    let (min_type, max_type) = match family {
        "list" => ("value_error.list.min_items", "value_error.list.max_items"),
        _ => (
            "value_error.any_str.min_length",
            "value_error.any_str.max_length",
        ),
    };
    if let Some(min) = c.min_length {
        if len < min {
            return Err(Issue::new(
                format!("ensure this value has at least {min} {unit}"),
                min_type,
            )
            .ctx(json!({ "limit_value": min })));
        }
    }
    if let Some(max) = c.max_length {
        if len > max {
            return Err(Issue::new(
                format!("ensure this value has at most {max} {unit}"),
                max_type,
            )
            .ctx(json!({ "limit_value": max })));
        }
    }
    Ok(())
}
