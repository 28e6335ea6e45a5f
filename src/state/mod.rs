//! Form definition state

mod field;
mod form_state;

pub use field::*;
pub use form_state::{
    FormDefinition, FormStore, Step, DEFAULT_FORM_TITLE, DEFAULT_STEP_ID, DEFAULT_STEP_TITLE,
};
pub(crate) use form_state::generate_id;
