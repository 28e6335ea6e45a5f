//! Builder session: the form store wired to durable storage
//!
//! Every mutation goes through [`BuilderSession::update`], which applies one
//! store action and then persists:
//!
//! - the session snapshot under the session key, best-effort (failure leaves the
//!   session running in memory only);
//! - the publication snapshot under the form id, when the form is shared
//!   (failure is returned to the caller).

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;

use super::responses::{append_response, response_key, ResponseView};
use super::snapshot::{read_json, write_json, PublishedForm, SessionSnapshot};
use crate::error::{SubmitError, SyncError};
use crate::schema::FormSchema;
use crate::state::{generate_id, Answers, FormStore};
use crate::storage::{DurableStore, ExternalChange};

/// Fixed key of the builder session snapshot
pub const SESSION_KEY: &str = "form-builder-storage";

pub struct BuilderSession {
    store: FormStore,
    durable: Arc<dyn DurableStore>,
    session_key: String,
    is_durable: bool,
    responses: ResponseView,
    changes: Receiver<ExternalChange>,
}

impl BuilderSession {
    /// Open the session stored under [`SESSION_KEY`]
    pub async fn open(durable: Arc<dyn DurableStore>) -> Self {
        Self::open_with_key(durable, SESSION_KEY).await
    }

    /// Restore the session stored under `session_key`, or start a fresh one.
    ///
    /// Never fails: unreadable or unreachable storage yields a default session.
    pub async fn open_with_key(
        durable: Arc<dyn DurableStore>,
        session_key: impl Into<String>,
    ) -> Self {
        let session_key = session_key.into();
        // Subscribe before reading so nothing written in between is missed
        let changes = durable.subscribe();

        let (store, is_durable) =
            match read_json::<SessionSnapshot>(durable.as_ref(), &session_key).await {
                Ok(Some(snapshot)) => (snapshot.into_store(), true),
                Ok(None) => (FormStore::new(), true),
                Err(SyncError::Corrupt { key, source }) => {
                    tracing::warn!("Discarding corrupt session under {key}: {source}");
                    (FormStore::new(), true)
                }
                Err(e) => {
                    tracing::warn!("Session storage unavailable, running in memory: {e}");
                    (FormStore::new(), false)
                }
            };

        let mut responses = ResponseView::new(response_key(store.form_id()));
        if let Err(e) = responses.reload(durable.as_ref()).await {
            tracing::warn!("Could not load responses from {}: {e}", responses.key());
        }

        tracing::info!(
            "Opened builder session \"{}\" with {} step(s)",
            store.title(),
            store.steps().len()
        );

        Self {
            store,
            durable,
            session_key,
            is_durable,
            responses,
            changes,
        }
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    /// Whether the last session write reached durable storage
    pub fn is_durable(&self) -> bool {
        self.is_durable
    }

    pub fn responses(&self) -> &[Answers] {
        self.responses.responses()
    }

    pub fn response_key(&self) -> &str {
        self.responses.key()
    }

    /// Path of the shareable link, once the form is published
    pub fn share_path(&self) -> Option<String> {
        self.store.form_id().map(|id| format!("/form/{id}"))
    }

    /// Apply one store action and persist the result
    pub async fn update<R>(
        &mut self,
        action: impl FnOnce(&mut FormStore) -> R,
    ) -> Result<R, SyncError> {
        let result = action(&mut self.store);
        self.persist().await?;
        Ok(result)
    }

    /// Publish the form under a fresh id; returns the id.
    ///
    /// On failure the previous id (if any) is restored, so no link to a missing
    /// snapshot is ever handed out.
    pub async fn share(&mut self) -> Result<String, SyncError> {
        let previous = self.store.form_id().map(str::to_string);
        let id = generate_id("form");
        self.store.set_form_id(id.clone());

        if let Err(e) = self.publish().await {
            match previous {
                Some(previous) => self.store.set_form_id(previous),
                None => self.store.clear_form_id(),
            }
            return Err(e);
        }

        tracing::info!("Shared form \"{}\" as {id}", self.store.title());
        self.save_session().await;
        self.rescope_responses().await;
        Ok(id)
    }

    /// Validate a preview submission against the current step and record it
    pub async fn submit_response(&mut self, answers: Answers) -> Result<usize, SubmitError> {
        FormSchema::for_step(self.store.current_step()).validate(&answers)?;
        let responses =
            append_response(self.durable.as_ref(), self.responses.key(), answers).await?;
        let count = responses.len();
        self.responses.replace(responses);
        Ok(count)
    }

    /// Re-read the response collection in scope
    pub async fn refresh_responses(&mut self) -> Result<(), SyncError> {
        self.responses.reload(self.durable.as_ref()).await
    }

    /// Apply every pending change from other contexts; returns how many touched responses
    pub async fn sync_external(&mut self) -> Result<usize, SyncError> {
        let mut applied = 0;
        loop {
            match self.changes.try_recv() {
                Ok(change) => {
                    if self.responses.apply_change(&change) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {skipped} change notification(s), reloading");
                    self.refresh_responses().await?;
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        Ok(applied)
    }

    /// Wait for the next change from another context; returns whether it touched responses
    pub async fn next_external_change(&mut self) -> Result<bool, SyncError> {
        match self.changes.recv().await {
            Ok(change) => Ok(self.responses.apply_change(&change)),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {skipped} change notification(s), reloading");
                self.refresh_responses().await?;
                Ok(true)
            }
            Err(RecvError::Closed) => Err(SyncError::FeedClosed),
        }
    }

    async fn persist(&mut self) -> Result<(), SyncError> {
        self.save_session().await;
        if self.store.form_id().is_some() {
            self.publish().await?;
        }
        self.rescope_responses().await;
        Ok(())
    }

    async fn save_session(&mut self) {
        let snapshot = SessionSnapshot::capture(&self.store);
        match write_json(self.durable.as_ref(), &self.session_key, &snapshot).await {
            Ok(()) => {
                if !self.is_durable {
                    tracing::info!("Session storage available again");
                }
                self.is_durable = true;
            }
            Err(e) => {
                if self.is_durable {
                    tracing::warn!("Session storage unavailable, running in memory: {e}");
                }
                self.is_durable = false;
            }
        }
    }

    async fn publish(&self) -> Result<(), SyncError> {
        let Some(id) = self.store.form_id() else {
            return Ok(());
        };
        let snapshot = PublishedForm::capture(self.store.definition());
        write_json(self.durable.as_ref(), id, &snapshot)
            .await
            .map_err(|e| match e {
                SyncError::Storage(source) => SyncError::Publish {
                    id: id.to_string(),
                    source,
                },
                other => other,
            })
    }

    /// Follow the form id to its response collection
    async fn rescope_responses(&mut self) {
        let key = response_key(self.store.form_id());
        if key == self.responses.key() {
            return;
        }
        self.responses.rescope(key);
        if let Err(e) = self.responses.reload(self.durable.as_ref()).await {
            tracing::warn!("Could not load responses from {}: {e}", self.responses.key());
        }
    }
}
