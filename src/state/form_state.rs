//! Form definition model and the action surface that mutates it
//!
//! [`FormStore`] is the only way to change a [`FormDefinition`]. Every action is
//! total: a reference to a step or field that no longer exists, an out-of-range
//! reorder, or an attempt to remove the last step turns into a logged no-op
//! rather than an error, because callers always derive ids and indices from the
//! state they just read.

use super::field::{FieldDefinition, FieldPatch, NewField};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a fresh form
pub const DEFAULT_FORM_TITLE: &str = "Untitled Form";
/// Id of the step every fresh form starts with
pub const DEFAULT_STEP_ID: &str = "step-1";
/// Title of the step every fresh form starts with
pub const DEFAULT_STEP_TITLE: &str = "Step 1";

/// An ordered group of fields presented together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl Step {
    fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    fn field_mut(&mut self, field_id: &str) -> Option<&mut FieldDefinition> {
        self.fields.iter_mut().find(|f| f.id == field_id)
    }
}

/// The whole form: title, ordered steps and the active step pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub title: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub current_step_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_id: Option<String>,
}

impl Default for FormDefinition {
    fn default() -> Self {
        Self {
            title: DEFAULT_FORM_TITLE.to_string(),
            steps: vec![Step::new(DEFAULT_STEP_ID, DEFAULT_STEP_TITLE)],
            current_step_index: 0,
            publication_id: None,
        }
    }
}

impl FormDefinition {
    /// Repair a definition read from outside the store so its invariants hold
    pub(crate) fn normalized(mut self) -> Self {
        if self.steps.is_empty() {
            tracing::warn!("Form definition has no steps, adding the default step");
            self.steps
                .push(Step::new(DEFAULT_STEP_ID, DEFAULT_STEP_TITLE));
        }
        self.current_step_index = self.current_step_index.min(self.steps.len() - 1);
        self
    }

    /// Total number of fields across all steps
    pub fn field_count(&self) -> usize {
        self.steps.iter().map(|s| s.fields.len()).sum()
    }
}

/// Generate a fresh id with the given prefix
pub(crate) fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// Owner of the builder's form definition
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    definition: FormDefinition,
    is_dark_mode: bool,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a persisted definition, repairing broken invariants
    pub fn restore(definition: FormDefinition, is_dark_mode: bool) -> Self {
        Self {
            definition: definition.normalized(),
            is_dark_mode,
        }
    }

    // ---- read accessors ----

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn steps(&self) -> &[Step] {
        &self.definition.steps
    }

    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.definition.steps.iter().find(|s| s.id == step_id)
    }

    pub fn current_step_index(&self) -> usize {
        self.definition.current_step_index
    }

    /// The active step; always present because steps are never empty
    pub fn current_step(&self) -> &Step {
        &self.definition.steps[self.definition.current_step_index]
    }

    pub fn form_id(&self) -> Option<&str> {
        self.definition.publication_id.as_deref()
    }

    pub fn is_dark_mode(&self) -> bool {
        self.is_dark_mode
    }

    fn step_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.definition.steps.iter_mut().find(|s| s.id == step_id)
    }

    // ---- actions ----

    /// Append a field to a step; returns the generated field id
    pub fn add_field(&mut self, step_id: &str, field: NewField) -> Option<String> {
        let Some(step) = self.step_mut(step_id) else {
            tracing::warn!("add_field: unknown step {step_id}");
            return None;
        };
        if let Some(validation) = &field.validation {
            if !validation.is_consistent() {
                tracing::warn!("add_field: minLength exceeds maxLength, field rejected");
                return None;
            }
        }
        let id = generate_id("field");
        step.fields.push(FieldDefinition::from_new(id.clone(), field));
        tracing::debug!("Added field {id} to step {step_id}");
        Some(id)
    }

    /// Merge a partial update into a field, keeping its id and position
    pub fn update_field(&mut self, step_id: &str, field_id: &str, patch: FieldPatch) -> bool {
        if !patch.is_consistent() {
            tracing::warn!("update_field: minLength exceeds maxLength, update rejected");
            return false;
        }
        let Some(field) = self.step_mut(step_id).and_then(|s| s.field_mut(field_id)) else {
            tracing::warn!("update_field: unknown field {field_id} in step {step_id}");
            return false;
        };
        patch.apply_to(field);
        true
    }

    pub fn remove_field(&mut self, step_id: &str, field_id: &str) -> bool {
        let Some(step) = self.step_mut(step_id) else {
            tracing::warn!("remove_field: unknown step {step_id}");
            return false;
        };
        let before = step.fields.len();
        step.fields.retain(|f| f.id != field_id);
        before != step.fields.len()
    }

    /// Move the field at `from` to `to`, shifting the fields in between
    pub fn reorder_fields(&mut self, step_id: &str, from: usize, to: usize) -> bool {
        let Some(step) = self.step_mut(step_id) else {
            tracing::warn!("reorder_fields: unknown step {step_id}");
            return false;
        };
        let count = step.fields.len();
        if from >= count || to >= count {
            tracing::warn!("reorder_fields: {from} -> {to} out of range for {count} fields");
            return false;
        }
        let field = step.fields.remove(from);
        step.fields.insert(to, field);
        true
    }

    /// Append an empty step; the current step does not change
    pub fn add_step(&mut self, title: impl Into<String>) -> String {
        let id = generate_id("step");
        self.definition.steps.push(Step::new(id.clone(), title));
        tracing::debug!("Added step {id}");
        id
    }

    /// Remove a step unless it is the last one, then re-clamp the current index
    pub fn remove_step(&mut self, step_id: &str) -> bool {
        let steps = &mut self.definition.steps;
        if steps.len() <= 1 {
            tracing::warn!("remove_step: refusing to remove the only step");
            return false;
        }
        let Some(position) = steps.iter().position(|s| s.id == step_id) else {
            tracing::warn!("remove_step: unknown step {step_id}");
            return false;
        };
        steps.remove(position);
        self.definition.current_step_index =
            self.definition.current_step_index.min(steps.len() - 1);
        true
    }

    /// Select the active step, clamped to the last step
    pub fn set_current_step(&mut self, index: usize) {
        let last = self.definition.steps.len() - 1;
        if index > last {
            tracing::debug!("set_current_step: clamping {index} to {last}");
        }
        self.definition.current_step_index = index.min(last);
    }

    pub fn set_form_title(&mut self, title: impl Into<String>) {
        self.definition.title = title.into();
    }

    pub fn set_form_id(&mut self, id: impl Into<String>) {
        self.definition.publication_id = Some(id.into());
    }

    pub fn clear_form_id(&mut self) {
        self.definition.publication_id = None;
    }

    pub fn toggle_dark_mode(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
    }

    /// Replace the definition with the one-step default; the theme preference stays
    pub fn reset_form(&mut self) {
        self.definition = FormDefinition::default();
    }
}
