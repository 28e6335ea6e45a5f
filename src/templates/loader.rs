//! Replaying templates through the store's action surface

use chrono::Utc;

use super::Template;
use crate::state::{generate_id, FormStore, NewField};

/// Replace the store's form with the template's content.
///
/// The form is reset, then every step and field is re-created with
/// `add_step`/`add_field` in source order, so ids are freshly generated exactly
/// as for hand-built forms. The default step left by the reset is removed once
/// the template's own steps exist.
pub fn load_template(store: &mut FormStore, template: &Template) {
    store.reset_form();
    store.set_form_title(template.title.clone());
    let placeholder = store.current_step().id.clone();

    for step in &template.steps {
        let step_id = store.add_step(step.title.clone());
        for field in &step.fields {
            store.add_field(&step_id, NewField::from(field));
        }
    }

    if !template.steps.is_empty() {
        store.remove_step(&placeholder);
    }
    tracing::info!(
        "Loaded template \"{}\" ({} step(s), {} field(s))",
        template.title,
        store.steps().len(),
        store.definition().field_count()
    );
}

/// Capture the store's current title and steps as a new template
pub fn snapshot_template(store: &FormStore) -> Template {
    Template {
        id: generate_id("template"),
        title: store.title().to_string(),
        steps: store.steps().to_vec(),
        saved_at: Some(Utc::now()),
    }
}
