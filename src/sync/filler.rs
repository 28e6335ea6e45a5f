//! Filler side: load a published form, walk its steps, submit answers

use std::sync::Arc;

use super::responses::{append_response, response_key};
use super::snapshot::{read_json, PublishedForm};
use crate::error::{SubmitError, SyncError};
use crate::schema::{FormSchema, ValidationErrors};
use crate::state::{AnswerValue, Answers, Step};
use crate::storage::DurableStore;

/// Where a filler context stands with respect to its form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The lookup has not completed yet
    #[default]
    Loading,
    /// No form is published under the requested id
    NotFound,
    Ready(PublishedForm),
}

/// One filler execution context for a published form
pub struct FillerContext {
    durable: Arc<dyn DurableStore>,
    form_id: String,
    state: LoadState,
    current_step: usize,
    answers: Answers,
}

impl FillerContext {
    pub fn new(durable: Arc<dyn DurableStore>, form_id: impl Into<String>) -> Self {
        Self {
            durable,
            form_id: form_id.into(),
            state: LoadState::Loading,
            current_step: 0,
            answers: Answers::new(),
        }
    }

    /// Look up the published form; leaves `Loading` behind either way
    pub async fn load(&mut self) -> Result<&LoadState, SyncError> {
        let found = read_json::<PublishedForm>(self.durable.as_ref(), &self.form_id).await?;
        self.state = match found {
            Some(form) if !form.steps.is_empty() => {
                tracing::info!("Loaded form {} (\"{}\")", self.form_id, form.title);
                LoadState::Ready(form)
            }
            Some(_) => {
                tracing::warn!("Form {} has no steps", self.form_id);
                LoadState::NotFound
            }
            None => {
                tracing::info!("Form {} not found", self.form_id);
                LoadState::NotFound
            }
        };
        self.current_step = 0;
        self.answers.clear();
        Ok(&self.state)
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn form(&self) -> Option<&PublishedForm> {
        match &self.state {
            LoadState::Ready(form) => Some(form),
            _ => None,
        }
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.form().and_then(|f| f.steps.get(self.current_step))
    }

    pub fn is_last_step(&self) -> bool {
        self.form()
            .is_some_and(|f| self.current_step + 1 >= f.steps.len())
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn set_answer(&mut self, field_id: impl Into<String>, value: impl Into<AnswerValue>) {
        self.answers.insert(field_id.into(), value.into());
    }

    /// Validate the current step and move forward; stays put on the last step
    pub fn next_step(&mut self) -> Result<(), ValidationErrors> {
        let Some(step) = self.current_step() else {
            return Ok(());
        };
        FormSchema::for_step(step).validate(&self.answers)?;
        if !self.is_last_step() {
            self.current_step += 1;
        }
        Ok(())
    }

    /// Move back one step without validating
    pub fn previous_step(&mut self) {
        self.current_step = self.current_step.saturating_sub(1);
    }

    /// Validate every step and append the answers to the form's responses.
    ///
    /// Returns the collection size after the append; the answers are cleared and
    /// the context returns to the first step. A storage failure keeps both.
    pub async fn submit(&mut self) -> Result<usize, SubmitError> {
        let LoadState::Ready(form) = &self.state else {
            return Err(SubmitError::NotReady);
        };
        FormSchema::for_steps(&form.steps).validate(&self.answers)?;

        let key = response_key(Some(&self.form_id));
        let responses =
            append_response(self.durable.as_ref(), &key, self.answers.clone()).await?;
        self.answers.clear();
        self.current_step = 0;
        Ok(responses.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldType, FieldValidation, NewField, DEFAULT_STEP_ID};
    use crate::storage::{MemoryBackend, MemoryStore, StoreError, MockDurableStore};
    use crate::sync::responses::load_responses;
    use crate::sync::BuilderSession;
    use tokio::sync::broadcast;

    /// Publish a two-step form from a builder context; returns (id, name field, email field)
    async fn publish_two_steps(backend: &MemoryBackend) -> (String, String, String) {
        let mut builder = BuilderSession::open(Arc::new(backend.context())).await;
        let (name, email) = builder
            .update(|s| {
                s.set_form_title("Signup");
                let name = s
                    .add_field(
                        DEFAULT_STEP_ID,
                        NewField::new(FieldType::ShortText, "Name")
                            .required()
                            .with_validation(FieldValidation::length(Some(2), Some(40))),
                    )
                    .unwrap();
                let second = s.add_step("Contact");
                let email = s
                    .add_field(&second, NewField::new(FieldType::Email, "Email").required())
                    .unwrap();
                (name, email)
            })
            .await
            .unwrap();
        let id = builder.share().await.unwrap();
        (id, name, email)
    }

    #[tokio::test]
    async fn test_starts_loading_then_not_found() {
        let mut filler = FillerContext::new(Arc::new(MemoryStore::standalone()), "form-missing");
        assert_eq!(filler.state(), &LoadState::Loading);
        assert_eq!(filler.load().await.unwrap(), &LoadState::NotFound);
        assert!(filler.form().is_none());
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_not_found() {
        let mut mock = MockDurableStore::new();
        mock.expect_subscribe().returning(|| broadcast::channel(1).1);
        mock.expect_get()
            .returning(|_| Err(StoreError::Unavailable("offline".to_string())));
        let mut filler = FillerContext::new(Arc::new(mock), "form-x");
        assert!(filler.load().await.is_err());
        assert_eq!(filler.state(), &LoadState::Loading);
    }

    #[tokio::test]
    async fn test_loads_what_the_publisher_shared() {
        let backend = MemoryBackend::new();
        let (id, _, _) = publish_two_steps(&backend).await;
        let publisher = BuilderSession::open(Arc::new(backend.context())).await;

        let mut filler = FillerContext::new(Arc::new(backend.context()), id);
        filler.load().await.unwrap();
        let form = filler.form().unwrap();
        assert_eq!(form.title, "Signup");
        pretty_assertions::assert_eq!(&form.steps, publisher.store().steps());
    }

    #[tokio::test]
    async fn test_next_step_validates_only_current_step() {
        let backend = MemoryBackend::new();
        let (id, name, _) = publish_two_steps(&backend).await;
        let mut filler = FillerContext::new(Arc::new(backend.context()), id);
        filler.load().await.unwrap();

        let errors = filler.next_step().unwrap_err();
        assert_eq!(errors.messages.len(), 1);
        assert!(errors.get(&name).is_some());
        assert_eq!(filler.current_step_index(), 0);

        filler.set_answer(name, "Ada");
        filler.next_step().unwrap();
        assert_eq!(filler.current_step_index(), 1);
        assert!(filler.is_last_step());

        filler.previous_step();
        filler.previous_step();
        assert_eq!(filler.current_step_index(), 0);
    }

    #[tokio::test]
    async fn test_submit_validates_all_steps_and_appends() {
        let backend = MemoryBackend::new();
        let (id, name, email) = publish_two_steps(&backend).await;
        let store = backend.context();
        let mut filler = FillerContext::new(Arc::new(backend.context()), id.clone());
        filler.load().await.unwrap();

        filler.set_answer(name.clone(), "Ada");
        assert!(matches!(
            filler.submit().await.unwrap_err(),
            SubmitError::Invalid(errors) if errors.get(&email).is_some()
        ));

        filler.set_answer(email.clone(), "ada@example.com");
        assert_eq!(filler.submit().await.unwrap(), 1);
        assert!(filler.answers().is_empty());

        let stored = load_responses(&store, &response_key(Some(&id))).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get(&email), Some(&AnswerValue::text("ada@example.com")));
    }

    #[tokio::test]
    async fn test_submit_before_load_is_rejected() {
        let mut filler = FillerContext::new(Arc::new(MemoryStore::standalone()), "form-1");
        assert!(matches!(
            filler.submit().await.unwrap_err(),
            SubmitError::NotReady
        ));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_answers() {
        let backend = MemoryBackend::new();
        let (id, name, email) = publish_two_steps(&backend).await;
        let published = backend.context().get(&id).await.unwrap();

        // Reads of the form succeed, reads of the response collection fail
        let mut mock = MockDurableStore::new();
        mock.expect_subscribe().returning(|| broadcast::channel(1).1);
        let form_key = id.clone();
        mock.expect_get().returning(move |key| {
            if key == form_key {
                Ok(published.clone())
            } else {
                Err(StoreError::Unavailable("offline".to_string()))
            }
        });
        mock.expect_set().never();

        let mut filler = FillerContext::new(Arc::new(mock), id);
        filler.load().await.unwrap();
        filler.set_answer(name.clone(), "Ada");
        filler.next_step().unwrap();
        filler.set_answer(email.clone(), "ada@example.com");

        assert!(matches!(
            filler.submit().await.unwrap_err(),
            SubmitError::Sync(_)
        ));
        assert_eq!(filler.answers().len(), 2);
        assert_eq!(filler.answers().get(&name), Some(&AnswerValue::text("Ada")));
        assert_eq!(filler.current_step_index(), 1);
    }
}
