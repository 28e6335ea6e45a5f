//! User-saved templates persisted as one list in the durable store

use std::sync::Arc;

use super::loader::snapshot_template;
use super::{predefined, Template};
use crate::error::SyncError;
use crate::state::FormStore;
use crate::storage::DurableStore;
use crate::sync::{read_json, write_json};

/// Fixed key of the saved-template list
pub const TEMPLATES_KEY: &str = "form-templates";

pub struct TemplateLibrary {
    durable: Arc<dyn DurableStore>,
    key: String,
}

impl TemplateLibrary {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self::with_key(durable, TEMPLATES_KEY)
    }

    pub fn with_key(durable: Arc<dyn DurableStore>, key: impl Into<String>) -> Self {
        Self {
            durable,
            key: key.into(),
        }
    }

    /// Saved templates, oldest first
    pub async fn saved(&self) -> Result<Vec<Template>, SyncError> {
        Ok(read_json(self.durable.as_ref(), &self.key)
            .await?
            .unwrap_or_default())
    }

    /// Predefined templates followed by saved ones
    pub async fn all(&self) -> Result<Vec<Template>, SyncError> {
        let mut templates = predefined();
        templates.extend(self.saved().await?);
        Ok(templates)
    }

    /// Append the store's current form to the saved list
    pub async fn save_current(&self, store: &FormStore) -> Result<Template, SyncError> {
        let template = snapshot_template(store);
        let mut saved = self.saved().await?;
        saved.push(template.clone());
        write_json(self.durable.as_ref(), &self.key, &saved).await?;
        tracing::info!("Saved template \"{}\" as {}", template.title, template.id);
        Ok(template)
    }

    /// Remove a saved template; returns whether it existed
    pub async fn delete(&self, template_id: &str) -> Result<bool, SyncError> {
        let mut saved = self.saved().await?;
        let before = saved.len();
        saved.retain(|t| t.id != template_id);
        if saved.len() == before {
            return Ok(false);
        }
        write_json(self.durable.as_ref(), &self.key, &saved).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldType, NewField, DEFAULT_STEP_ID};
    use crate::storage::{MemoryBackend, MemoryStore};
    use crate::sync::BuilderSession;
    use crate::templates::load_template;

    fn library() -> TemplateLibrary {
        TemplateLibrary::new(Arc::new(MemoryStore::standalone()))
    }

    #[tokio::test]
    async fn test_empty_library_lists_only_predefined() {
        let library = library();
        assert!(library.saved().await.unwrap().is_empty());
        assert_eq!(library.all().await.unwrap().len(), predefined().len());
    }

    #[tokio::test]
    async fn test_save_appends_in_order() {
        let library = library();
        let mut store = FormStore::new();
        store.set_form_title("First");
        let first = library.save_current(&store).await.unwrap();
        store.set_form_title("Second");
        let second = library.save_current(&store).await.unwrap();

        let saved = library.saved().await.unwrap();
        assert!(first.saved_at.is_some());
        pretty_assertions::assert_eq!(saved, vec![first, second]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_template() {
        let library = library();
        let kept = library.save_current(&FormStore::new()).await.unwrap();
        let doomed = library.save_current(&FormStore::new()).await.unwrap();

        assert!(library.delete(&doomed.id).await.unwrap());
        assert!(!library.delete(&doomed.id).await.unwrap());
        assert_eq!(library.saved().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_saved_template_loads_in_another_context() {
        let backend = MemoryBackend::new();
        let mut author = BuilderSession::open(Arc::new(backend.context())).await;
        author
            .update(|s| {
                s.set_form_title("Poll");
                s.add_field(DEFAULT_STEP_ID, NewField::new(FieldType::Boolean, "Agree?"));
            })
            .await
            .unwrap();
        TemplateLibrary::new(Arc::new(backend.context()))
            .save_current(author.store())
            .await
            .unwrap();

        let mut reader = BuilderSession::open_with_key(Arc::new(backend.context()), "other-session").await;
        let templates = TemplateLibrary::new(Arc::new(backend.context()))
            .saved()
            .await
            .unwrap();
        reader
            .update(|s| load_template(s, &templates[0]))
            .await
            .unwrap();
        assert_eq!(reader.store().title(), "Poll");
        assert_eq!(reader.store().current_step().fields[0].label, "Agree?");
    }
}
