//! Per-field validation rules
//!
//! One [`FieldRule`] variant per [`FieldType`]; construction dispatches on the
//! type with a single `match`, never on the shape of a submitted value.

use std::sync::LazyLock;

use regex::Regex;

use crate::state::{AnswerValue, FieldDefinition, FieldType};

/// HTML living-standard email grammar, with at least one dot in the domain
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
    )
    .expect("Invalid email regex")
});

/// Optional leading `+`, then ten or more digits, spaces or dashes
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s-]{10,}$").expect("Invalid phone regex"));

/// Calendar date as `YYYY-MM-DD`
static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("Invalid date regex"));

pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Type-specific rule for one field
#[derive(Debug, Clone)]
pub enum FieldRule {
    Text {
        min_length: Option<u32>,
        max_length: Option<u32>,
        pattern: Option<Regex>,
    },
    Email,
    Phone,
    SingleSelect {
        options: Vec<String>,
    },
    Boolean,
    Date,
}

impl FieldRule {
    /// Build the rule for a field definition
    pub fn derive(field: &FieldDefinition) -> Self {
        match field.field_type {
            FieldType::ShortText | FieldType::LongText => {
                let validation = field.validation.clone().unwrap_or_default();
                let pattern = validation.pattern.as_deref().and_then(|p| match Regex::new(p) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        tracing::warn!("Ignoring invalid pattern on field {}: {e}", field.id);
                        None
                    }
                });
                FieldRule::Text {
                    min_length: validation.min_length,
                    max_length: validation.max_length,
                    pattern,
                }
            }
            FieldType::Email => FieldRule::Email,
            FieldType::Phone => FieldRule::Phone,
            FieldType::SingleSelect => FieldRule::SingleSelect {
                options: field.choices().to_vec(),
            },
            FieldType::Boolean => FieldRule::Boolean,
            FieldType::Date => FieldRule::Date,
        }
    }

    /// Whether a missing answer is a failure for a required field
    fn presence_matters(&self) -> bool {
        !matches!(self, FieldRule::Boolean)
    }

    /// Check a present, non-blank value
    fn check_value(&self, value: &AnswerValue) -> Result<(), String> {
        if let FieldRule::Boolean = self {
            return match value {
                AnswerValue::Bool(_) => Ok(()),
                AnswerValue::Text(_) => Err("Expected true or false".to_string()),
            };
        }

        let Some(text) = value.as_text() else {
            return Err("Expected text".to_string());
        };

        match self {
            FieldRule::Text {
                min_length,
                max_length,
                pattern,
            } => {
                let length = text.chars().count();
                if let Some(min) = min_length {
                    if length < *min as usize {
                        return Err(format!("Must be at least {min} characters"));
                    }
                }
                if let Some(max) = max_length {
                    if length > *max as usize {
                        return Err(format!("Must be at most {max} characters"));
                    }
                }
                if let Some(regex) = pattern {
                    if !regex.is_match(text) {
                        return Err("Invalid format".to_string());
                    }
                }
                Ok(())
            }
            FieldRule::Email if !EMAIL_REGEX.is_match(text) => {
                Err("Invalid email address".to_string())
            }
            FieldRule::Phone if !PHONE_REGEX.is_match(text) => {
                Err("Invalid phone number".to_string())
            }
            FieldRule::Date if !DATE_REGEX.is_match(text) => {
                Err("Use the YYYY-MM-DD format".to_string())
            }
            FieldRule::SingleSelect { options }
                if !options.is_empty() && !options.iter().any(|o| o == text) =>
            {
                Err("Please select a valid option".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Rule plus requiredness for one field id
#[derive(Debug, Clone)]
pub struct FieldValidator {
    pub field_id: String,
    pub required: bool,
    pub rule: FieldRule,
}

impl FieldValidator {
    pub fn derive(field: &FieldDefinition) -> Self {
        Self {
            field_id: field.id.clone(),
            required: field.required,
            rule: FieldRule::derive(field),
        }
    }

    /// Check one answer; `None` and empty text both mean "no answer"
    pub fn check(&self, value: Option<&AnswerValue>) -> Result<(), String> {
        match value.filter(|v| !v.is_blank()) {
            None if self.required && self.rule.presence_matters() => {
                Err(REQUIRED_MESSAGE.to_string())
            }
            None => Ok(()),
            Some(value) => self.rule.check_value(value),
        }
    }
}
