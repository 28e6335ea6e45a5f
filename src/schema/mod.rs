//! Runtime validators derived from field definitions

mod form_schema;
mod rules;

pub use form_schema::{FormSchema, ValidationErrors};
pub use rules::{FieldRule, FieldValidator, REQUIRED_MESSAGE};
