//! Form templates: predefined and user-saved starting points

mod builtin;
mod library;
mod loader;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::Step;

pub use builtin::predefined;
pub use library::{TemplateLibrary, TEMPLATES_KEY};
pub use loader::{load_template, snapshot_template};

/// A reusable form shape: title and steps, without session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub title: String,
    pub steps: Vec<Step>,
    /// When the template was saved; `None` for predefined templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Template {
    /// "1 step" / "3 steps"
    pub fn summary(&self) -> String {
        match self.steps.len() {
            1 => "1 step".to_string(),
            n => format!("{n} steps"),
        }
    }
}
