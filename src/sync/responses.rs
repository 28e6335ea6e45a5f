//! Response collections: append-only lists of submitted answers

use super::snapshot::{decode, read_json, write_json};
use crate::error::SyncError;
use crate::state::Answers;
use crate::storage::{DurableStore, ExternalChange};

/// Key of the response collection before a form is published
pub const DEFAULT_RESPONSES_KEY: &str = "form-responses";

/// Key of the response collection for a form
pub fn response_key(form_id: Option<&str>) -> String {
    match form_id {
        Some(id) => format!("{DEFAULT_RESPONSES_KEY}-{id}"),
        None => DEFAULT_RESPONSES_KEY.to_string(),
    }
}

pub async fn load_responses(
    store: &dyn DurableStore,
    key: &str,
) -> Result<Vec<Answers>, SyncError> {
    Ok(read_json(store, key).await?.unwrap_or_default())
}

/// Append one submission and return the new collection.
///
/// This is a plain read-modify-write: two contexts appending at the same time
/// can race and the last write wins.
pub async fn append_response(
    store: &dyn DurableStore,
    key: &str,
    answers: Answers,
) -> Result<Vec<Answers>, SyncError> {
    let mut responses = load_responses(store, key).await?;
    responses.push(answers);
    write_json(store, key, &responses).await?;
    tracing::info!("Recorded response #{} under {key}", responses.len());
    Ok(responses)
}

/// Local copy of the response collection currently in scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseView {
    key: String,
    responses: Vec<Answers>,
}

impl ResponseView {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            responses: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn responses(&self) -> &[Answers] {
        &self.responses
    }

    /// Point the view at another collection, dropping the old contents
    pub fn rescope(&mut self, key: impl Into<String>) {
        let key = key.into();
        if key != self.key {
            self.key = key;
            self.responses.clear();
        }
    }

    pub async fn reload(&mut self, store: &dyn DurableStore) -> Result<(), SyncError> {
        self.responses = load_responses(store, &self.key).await?;
        Ok(())
    }

    pub(crate) fn replace(&mut self, responses: Vec<Answers>) {
        self.responses = responses;
    }

    /// Apply a change from another context; returns whether the view changed
    pub fn apply_change(&mut self, change: &ExternalChange) -> bool {
        if change.key != self.key {
            return false;
        }
        self.responses = match &change.value {
            Some(bytes) => match decode(&change.key, bytes) {
                Ok(responses) => responses,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable responses: {e}");
                    return false;
                }
            },
            None => Vec::new(),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AnswerValue;
    use crate::storage::{MemoryBackend, MemoryStore};

    fn answers(name: &str) -> Answers {
        let mut answers = Answers::new();
        answers.insert("name".to_string(), AnswerValue::text(name));
        answers
    }

    #[test]
    fn test_response_keys() {
        assert_eq!(response_key(None), "form-responses");
        assert_eq!(response_key(Some("form-1")), "form-responses-form-1");
    }

    #[tokio::test]
    async fn test_sequential_appends_keep_submission_order() {
        let store = MemoryStore::standalone();
        append_response(&store, DEFAULT_RESPONSES_KEY, answers("first"))
            .await
            .unwrap();
        append_response(&store, DEFAULT_RESPONSES_KEY, answers("second"))
            .await
            .unwrap();
        let stored = load_responses(&store, DEFAULT_RESPONSES_KEY).await.unwrap();
        assert_eq!(stored, vec![answers("first"), answers("second")]);
    }

    #[tokio::test]
    async fn test_view_follows_external_writes_for_its_key_only() {
        let backend = MemoryBackend::new();
        let builder = backend.context();
        let filler = backend.context();
        let mut changes = builder.subscribe();
        let mut view = ResponseView::new(response_key(Some("form-1")));

        append_response(&filler, "form-responses-other", answers("elsewhere"))
            .await
            .unwrap();
        append_response(&filler, view.key(), answers("ours"))
            .await
            .unwrap();

        assert!(!view.apply_change(&changes.recv().await.unwrap()));
        assert!(view.apply_change(&changes.recv().await.unwrap()));
        assert_eq!(view.responses(), &[answers("ours")]);
    }

    #[test]
    fn test_removed_collection_empties_view() {
        let mut view = ResponseView::new("k");
        view.replace(vec![answers("a")]);
        assert!(view.apply_change(&ExternalChange {
            key: "k".to_string(),
            value: None,
        }));
        assert!(view.responses().is_empty());
    }

    #[test]
    fn test_corrupt_change_is_ignored() {
        let mut view = ResponseView::new("k");
        view.replace(vec![answers("a")]);
        assert!(!view.apply_change(&ExternalChange {
            key: "k".to_string(),
            value: Some(b"{oops".to_vec()),
        }));
        assert_eq!(view.responses().len(), 1);
    }

    #[test]
    fn test_rescope_clears_only_on_new_key() {
        let mut view = ResponseView::new("a");
        view.replace(vec![answers("x")]);
        view.rescope("a");
        assert_eq!(view.responses().len(), 1);
        view.rescope("b");
        assert!(view.responses().is_empty());
        assert_eq!(view.key(), "b");
    }
}
