//! Coerces loosely-shaped model output into a `CompanyRecord`.
//!
//! Only a missing name is an error. Every other malformed field falls back to
//! `None`/empty and is reported as a `FieldDefect`.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{ResearchError, ResearchResult};
use crate::model::{CompanyRecord, PricingModel};

/// A field that could not be used as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefect {
    /// Field name.
    pub field: &'static str,
    /// What was wrong with it.
    pub reason: String,
}

impl std::fmt::Display for FieldDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// A record plus the defects found while building it.
#[derive(Debug, Clone)]
pub struct Validated {
    pub record: CompanyRecord,
    pub defects: Vec<FieldDefect>,
}

/// Validate a JSON value against the company schema.
///
/// `fallback_website` fills `website` when the model supplied none (the
/// scraped URL, for instance).
pub fn validate_company(
    value: &Value,
    fallback_website: Option<&str>,
) -> ResearchResult<Validated> {
    let obj = as_company_object(value)
        .ok_or_else(|| ResearchError::validation("expected a JSON object describing a company"))?;

    let mut defects = Vec::new();

    let name = ["name", "company_name"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(clean_string))
        .ok_or_else(|| ResearchError::Validation {
            reason: "company name is missing or empty".to_string(),
            defects: vec!["name: required".to_string()],
        })?;

    let mut record = CompanyRecord::named(name);

    record.website = url_field(obj, "website", &mut defects)
        .or_else(|| fallback_website.map(ToString::to_string));
    record.description = string_field(obj, "description", &mut defects);
    record.pricing_model = match obj.get("pricing_model") {
        Some(Value::String(s)) => {
            let parsed = PricingModel::parse(s);
            if parsed == PricingModel::Unknown && !is_placeholder(s) {
                defects.push(defect("pricing_model", format!("unrecognized value '{s}'")));
            }
            parsed
        }
        None | Some(Value::Null) => PricingModel::Unknown,
        Some(other) => {
            defects.push(defect("pricing_model", format!("expected a string, got {other}")));
            PricingModel::Unknown
        }
    };
    record.is_open_source = bool_field(obj, "is_open_source", &mut defects) == Some(true);
    record.tech_stack = list_field(obj, &["tech_stack"], "tech_stack", &mut defects);
    record.language_support = list_field(
        obj,
        &["language_support"],
        "language_support",
        &mut defects,
    );
    record.api_available = bool_field(obj, "api_available", &mut defects);
    record.integration_capabilities = list_field(
        obj,
        &["integration_capabilities", "integrations"],
        "integration_capabilities",
        &mut defects,
    );
    record.category = string_field(obj, "category", &mut defects);
    record.github_url = url_field(obj, "github_url", &mut defects);
    record.documentation_url = url_field(obj, "documentation_url", &mut defects);

    if record.pricing_model == PricingModel::OpenSource {
        record.is_open_source = true;
    }

    Ok(Validated { record, defects })
}

/// Interpret a loose boolean. Unrecognized input is `None`, not `false`.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "available" => Some(true),
            "false" | "no" | "n" | "0" | "unavailable" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_company_object(value: &Value) -> Option<&Map<String, Value>> {
    let obj = value.as_object()?;
    match obj.get("company") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(obj),
    }
}

fn defect(field: &'static str, reason: impl Into<String>) -> FieldDefect {
    FieldDefect {
        field,
        reason: reason.into(),
    }
}

fn is_placeholder(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "" | "null" | "none" | "n/a" | "na" | "unknown"
    )
}

fn clean_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !is_placeholder(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn string_field(
    obj: &Map<String, Value>,
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => (!is_placeholder(s)).then(|| s.trim().to_string()),
        Some(other) => {
            defects.push(defect(field, format!("expected a string, got {other}")));
            None
        }
    }
}

fn url_field(
    obj: &Map<String, Value>,
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Option<String> {
    let raw = string_field(obj, field, defects)?;
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(raw),
        Ok(url) => {
            defects.push(defect(field, format!("unsupported scheme '{}'", url.scheme())));
            None
        }
        Err(e) => {
            defects.push(defect(field, format!("invalid URL '{raw}': {e}")));
            None
        }
    }
}

fn bool_field(
    obj: &Map<String, Value>,
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Option<bool> {
    let value = obj.get(field)?;
    if value.is_null() {
        return None;
    }
    let coerced = coerce_bool(value);
    if coerced.is_none() {
        defects.push(defect(field, format!("cannot interpret {value} as a boolean")));
    }
    coerced
}

fn list_field(
    obj: &Map<String, Value>,
    keys: &[&str],
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Vec<String> {
    let Some(value) = keys.iter().find_map(|key| obj.get(*key)) else {
        return Vec::new();
    };

    let items: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
        other => {
            defects.push(defect(field, format!("expected a list, got {other}")));
            Vec::new()
        }
    };

    items.into_iter().filter(|s| !is_placeholder(s)).collect()
}
