//! Field definitions and answer values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of input kinds a field can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[serde(alias = "text")]
    ShortText,
    #[serde(alias = "textarea")]
    LongText,
    #[serde(alias = "dropdown")]
    SingleSelect,
    #[serde(alias = "checkbox")]
    Boolean,
    Date,
    Email,
    Phone,
}

impl FieldType {
    /// Every field type, in palette order
    pub const ALL: [FieldType; 7] = [
        FieldType::ShortText,
        FieldType::LongText,
        FieldType::SingleSelect,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Email,
        FieldType::Phone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ShortText => "Text Input",
            Self::LongText => "Text Area",
            Self::SingleSelect => "Dropdown",
            Self::Boolean => "Checkbox",
            Self::Date => "Date",
            Self::Email => "Email",
            Self::Phone => "Phone",
        }
    }

    /// Whether answers to this field are strings
    pub fn is_textual(&self) -> bool {
        !matches!(self, Self::Boolean)
    }
}

/// Optional length and pattern constraints for text fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl FieldValidation {
    pub fn length(min_length: Option<u32>, max_length: Option<u32>) -> Self {
        Self {
            min_length,
            max_length,
            pattern: None,
        }
    }

    /// `min_length <= max_length` whenever both bounds are present
    pub fn is_consistent(&self) -> bool {
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// A single labeled input within a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
}

impl FieldDefinition {
    pub(crate) fn from_new(id: String, field: NewField) -> Self {
        Self {
            id,
            field_type: field.field_type,
            label: field.label,
            placeholder: field.placeholder,
            required: field.required,
            help_text: field.help_text,
            options: field.options,
            validation: field.validation,
        }
    }

    /// Options that constrain a single-select answer (empty for every other type)
    pub fn choices(&self) -> &[String] {
        match (self.field_type, &self.options) {
            (FieldType::SingleSelect, Some(options)) => options,
            _ => &[],
        }
    }
}

/// A field definition before the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewField {
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    pub help_text: Option<String>,
    pub options: Option<Vec<String>>,
    pub validation: Option<FieldValidation>,
}

impl NewField {
    /// Create an optional field with the given type and label
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            placeholder: None,
            required: false,
            help_text: None,
            options: None,
            validation: None,
        }
    }

    /// Field added from the palette, labeled after its type
    pub fn from_palette(field_type: FieldType) -> Self {
        Self::new(field_type, format!("New {} field", field_type.label()))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = Some(help_text.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }
}

impl From<&FieldDefinition> for NewField {
    fn from(field: &FieldDefinition) -> Self {
        Self {
            field_type: field.field_type,
            label: field.label.clone(),
            placeholder: field.placeholder.clone(),
            required: field.required,
            help_text: field.help_text.clone(),
            options: field.options.clone(),
            validation: field.validation.clone(),
        }
    }
}

/// Partial update merged into an existing field.
///
/// `None` leaves an attribute untouched; for optional attributes `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    pub placeholder: Option<Option<String>>,
    pub required: Option<bool>,
    pub help_text: Option<Option<String>>,
    pub options: Option<Option<Vec<String>>>,
    pub validation: Option<Option<FieldValidation>>,
}

impl FieldPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn required(required: bool) -> Self {
        Self {
            required: Some(required),
            ..Default::default()
        }
    }

    pub fn options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: Some(Some(options.into_iter().map(Into::into).collect())),
            ..Default::default()
        }
    }

    pub fn validation(validation: Option<FieldValidation>) -> Self {
        Self {
            validation: Some(validation),
            ..Default::default()
        }
    }

    /// A patch is rejected outright when it would break the length invariant
    pub fn is_consistent(&self) -> bool {
        match &self.validation {
            Some(Some(validation)) => validation.is_consistent(),
            _ => true,
        }
    }

    pub(crate) fn apply_to(self, field: &mut FieldDefinition) {
        if let Some(field_type) = self.field_type {
            field.field_type = field_type;
        }
        if let Some(label) = self.label {
            field.label = label;
        }
        if let Some(placeholder) = self.placeholder {
            field.placeholder = placeholder;
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(help_text) = self.help_text {
            field.help_text = help_text;
        }
        if let Some(options) = self.options {
            field.options = options;
        }
        if let Some(validation) = self.validation {
            field.validation = validation;
        }
    }
}

/// A submitted value for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Text(String),
}

impl Default for AnswerValue {
    fn default() -> Self {
        AnswerValue::Text(String::new())
    }
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    /// Get the text value (returns None for booleans)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            AnswerValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(b) => Some(*b),
            AnswerValue::Text(_) => None,
        }
    }

    /// Empty text counts as no answer
    pub fn is_blank(&self) -> bool {
        matches!(self, AnswerValue::Text(s) if s.is_empty())
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Bool(true) => "Yes".to_string(),
            AnswerValue::Bool(false) => "No".to_string(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

/// One filler submission: field id to value
pub type Answers = BTreeMap<String, AnswerValue>;
