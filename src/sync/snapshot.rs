//! Persisted document shapes and their JSON codec

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::state::{FormDefinition, FormStore, Step};
use crate::storage::DurableStore;

/// Builder session document stored under the session key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(alias = "formTitle")]
    pub title: String,
    pub steps: Vec<Step>,
    #[serde(default, alias = "currentStep")]
    pub current_step_index: usize,
    #[serde(default)]
    pub form_id: Option<String>,
    #[serde(default)]
    pub is_dark_mode: bool,
}

impl SessionSnapshot {
    pub fn capture(store: &FormStore) -> Self {
        let definition = store.definition();
        Self {
            title: definition.title.clone(),
            steps: definition.steps.clone(),
            current_step_index: definition.current_step_index,
            form_id: definition.publication_id.clone(),
            is_dark_mode: store.is_dark_mode(),
        }
    }

    pub fn into_store(self) -> FormStore {
        let definition = FormDefinition {
            title: self.title,
            steps: self.steps,
            current_step_index: self.current_step_index,
            publication_id: self.form_id,
        };
        FormStore::restore(definition, self.is_dark_mode)
    }
}

/// Read-only copy of a form stored under its publication id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedForm {
    #[serde(alias = "formTitle")]
    pub title: String,
    pub steps: Vec<Step>,
    #[serde(default, alias = "currentStep")]
    pub current_step_index: usize,
}

impl PublishedForm {
    pub fn capture(definition: &FormDefinition) -> Self {
        Self {
            title: definition.title.clone(),
            steps: definition.steps.clone(),
            current_step_index: definition.current_step_index,
        }
    }
}

/// Read and decode the JSON document under `key`
pub(crate) async fn read_json<T: DeserializeOwned>(
    store: &dyn DurableStore,
    key: &str,
) -> Result<Option<T>, SyncError> {
    let Some(bytes) = store.get(key).await? else {
        return Ok(None);
    };
    decode(key, &bytes).map(Some)
}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, SyncError> {
    serde_json::from_slice(bytes).map_err(|source| SyncError::Corrupt {
        key: key.to_string(),
        source,
    })
}

/// Encode `value` as JSON and store it under `key`
pub(crate) async fn write_json<T: Serialize + ?Sized>(
    store: &dyn DurableStore,
    key: &str,
    value: &T,
) -> Result<(), SyncError> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldType, NewField};
    use crate::storage::MemoryStore;

    #[test]
    fn test_session_snapshot_round_trips_through_store() {
        let mut store = FormStore::new();
        store.set_form_title("Survey");
        let step = store.add_step("Two");
        store.add_field(&step, NewField::new(FieldType::Email, "Email"));
        store.set_current_step(1);
        store.set_form_id("form-9");
        store.toggle_dark_mode();

        let restored = SessionSnapshot::capture(&store).into_store();
        pretty_assertions::assert_eq!(restored.definition(), store.definition());
        assert!(restored.is_dark_mode());
    }

    #[test]
    fn test_published_form_omits_response_and_session_data() {
        let store = FormStore::new();
        let json = serde_json::to_value(PublishedForm::capture(store.definition())).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["currentStepIndex", "steps", "title"]);
    }

    #[test]
    fn test_accepts_legacy_field_names() {
        let json = r#"{"formTitle": "Old", "steps": [{"id": "step-1", "title": "Step 1", "fields": []}], "currentStep": 0}"#;
        let form: PublishedForm = serde_json::from_str(json).unwrap();
        assert_eq!(form.title, "Old");
    }

    #[tokio::test]
    async fn test_read_json_reports_corrupt_documents() {
        let store = MemoryStore::standalone();
        store.set("k", b"not json".to_vec()).await.unwrap();
        let result = read_json::<PublishedForm>(&store, "k").await;
        assert!(matches!(result, Err(SyncError::Corrupt { key, .. }) if key == "k"));
    }

    #[tokio::test]
    async fn test_write_then_read_json() {
        let store = MemoryStore::standalone();
        let form = PublishedForm::capture(FormStore::new().definition());
        write_json(&store, "k", &form).await.unwrap();
        assert_eq!(read_json(&store, "k").await.unwrap(), Some(form));
        assert_eq!(read_json::<PublishedForm>(&store, "missing").await.unwrap(), None);
    }
}
