//! Whole-form validators composed from field rules

use std::collections::BTreeMap;

use thiserror::Error;

use super::rules::FieldValidator;
use crate::state::{Answers, FieldDefinition, FormDefinition, Step};

/// Per-field messages for a rejected submission, keyed by field id
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .messages.len())]
pub struct ValidationErrors {
    pub messages: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.messages.get(field_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Validator derived from a list of field definitions.
///
/// Derivation is pure: the same fields always yield a validator with the same
/// verdicts, so callers re-derive on every render instead of caching.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    validators: Vec<FieldValidator>,
}

impl FormSchema {
    pub fn derive(fields: &[FieldDefinition]) -> Self {
        Self {
            validators: fields.iter().map(FieldValidator::derive).collect(),
        }
    }

    /// Schema covering a single step
    pub fn for_step(step: &Step) -> Self {
        Self::derive(&step.fields)
    }

    /// Schema covering every field of the given steps, in order
    pub fn for_steps(steps: &[Step]) -> Self {
        Self {
            validators: steps
                .iter()
                .flat_map(|s| s.fields.iter().map(FieldValidator::derive))
                .collect(),
        }
    }

    pub fn for_form(definition: &FormDefinition) -> Self {
        Self::for_steps(&definition.steps)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Check a submission; answers for unknown field ids are ignored
    pub fn validate(&self, answers: &Answers) -> Result<(), ValidationErrors> {
        let messages: BTreeMap<_, _> = self
            .validators
            .iter()
            .filter_map(|v| {
                v.check(answers.get(&v.field_id))
                    .err()
                    .map(|message| (v.field_id.clone(), message))
            })
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { messages })
        }
    }

    pub fn accepts(&self, answers: &Answers) -> bool {
        self.validate(answers).is_ok()
    }
}
