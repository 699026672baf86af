use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use quiz_core::model::{normalize_records, QuizReview, SessionState};
use quiz_core::Clock;
use storage::repository::{SessionStore, StorageError, StoredQuiz, StoredSession};

use crate::error::QuizFlowError;
use crate::extract::TextExtractor;
use crate::generate::QuizGenerator;

/// Orchestrates the whole quiz lifecycle: upload through extraction,
/// generation and normalization into a live session, every mutation
/// persisted, submission into a review.
///
/// Holds the only collaborators with side effects; the session itself stays
/// a plain value owned by the caller.
#[derive(Clone)]
pub struct QuizFlowService {
    clock: Clock,
    store: Arc<dyn SessionStore>,
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn QuizGenerator>,
}

impl QuizFlowService {
    #[must_use]
    pub fn new(
        clock: Clock,
        store: Arc<dyn SessionStore>,
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn QuizGenerator>,
    ) -> Self {
        Self {
            clock,
            store,
            extractor,
            generator,
        }
    }

    /// Current time according to the service clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run the upload pipeline and start a fresh session.
    ///
    /// Per-record generator defects are logged and dropped; nothing is
    /// persisted unless the whole pipeline succeeds.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on extraction, generation, or storage
    /// failure.
    pub async fn create_quiz(&self, pdf_bytes: Vec<u8>) -> Result<SessionState, QuizFlowError> {
        let text = self.extractor.extract(pdf_bytes).await?;
        let records = self.generator.generate(&text).await?;
        let normalized = normalize_records(records).map_err(crate::error::GenerationError::from)?;

        for drop in &normalized.dropped {
            warn!(
                position = drop.position,
                prompt = %drop.prompt,
                reason = %drop.reason,
                "dropped generator record"
            );
        }

        let session = SessionState::start(normalized.questions, self.clock.now());
        self.store
            .save_quiz(&StoredQuiz::from_set(session.questions()))
            .await?;
        self.persist(&session).await?;
        Ok(session)
    }

    /// Reload the stored session, if a usable one exists.
    ///
    /// Missing or integrity-broken payloads (undecodable, unknown version,
    /// session/quiz mismatch, corrupt state) resolve to `Ok(None)`: the
    /// caller redirects to the start state instead of crashing.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Storage` only for infrastructure failures.
    pub async fn resume(&self) -> Result<Option<SessionState>, QuizFlowError> {
        let Some(stored_quiz) = recover(self.store.load_quiz().await, "quiz")?.flatten() else {
            return Ok(None);
        };
        let Some(stored_session) = recover(self.store.load_session().await, "session")?.flatten()
        else {
            return Ok(None);
        };

        let Some(questions) = recover(stored_quiz.into_set(), "quiz")? else {
            return Ok(None);
        };
        let Some(session) = recover(stored_session.into_session(questions), "session")? else {
            return Ok(None);
        };
        Ok(Some(session))
    }

    /// Record an answer for the current question and persist.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on an engine contract violation or a
    /// persistence failure.
    pub async fn select_answer(
        &self,
        session: &mut SessionState,
        option_index: usize,
    ) -> Result<(), QuizFlowError> {
        session.select_answer(option_index)?;
        self.persist(session).await
    }

    /// Toggle the review mark on the current question and persist; returns
    /// the new value.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on an engine contract violation or a
    /// persistence failure.
    pub async fn toggle_mark(&self, session: &mut SessionState) -> Result<bool, QuizFlowError> {
        let marked = session.toggle_mark()?;
        self.persist(session).await?;
        Ok(marked)
    }

    /// Jump to a question and persist.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on an out-of-range target or a persistence
    /// failure.
    pub async fn go_to(
        &self,
        session: &mut SessionState,
        index: usize,
    ) -> Result<(), QuizFlowError> {
        session.go_to(index)?;
        self.persist(session).await
    }

    /// Step to the next question and persist.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on a sealed session or a persistence failure.
    pub async fn next(&self, session: &mut SessionState) -> Result<(), QuizFlowError> {
        session.next()?;
        self.persist(session).await
    }

    /// Step to the previous question and persist.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on a sealed session or a persistence failure.
    pub async fn previous(&self, session: &mut SessionState) -> Result<(), QuizFlowError> {
        session.previous()?;
        self.persist(session).await
    }

    /// Seal the session and derive its review. Safe to call twice: the
    /// second call scores the already-sealed session unchanged.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError` on a persistence failure.
    pub async fn submit(&self, session: &mut SessionState) -> Result<QuizReview, QuizFlowError> {
        if session.finalize(self.clock.now()) {
            debug!("session finalized");
            self.persist(session).await?;
        }
        Ok(QuizReview::from_session(session)?)
    }

    /// Start the stored quiz over with a fresh session.
    ///
    /// Resolves to `Ok(None)` when no usable quiz is stored, mirroring the
    /// `resume` recovery policy.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Storage` only for infrastructure failures.
    pub async fn restart(&self) -> Result<Option<SessionState>, QuizFlowError> {
        let Some(stored_quiz) = recover(self.store.load_quiz().await, "quiz")?.flatten() else {
            return Ok(None);
        };
        let Some(questions) = recover(stored_quiz.into_set(), "quiz")? else {
            return Ok(None);
        };

        let session = SessionState::start(questions, self.clock.now());
        self.persist(&session).await?;
        Ok(Some(session))
    }

    /// Drop both stored payloads; the "exit" entry point.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Storage` if the store cannot be cleared.
    pub async fn discard(&self) -> Result<(), QuizFlowError> {
        self.store.clear().await?;
        Ok(())
    }

    async fn persist(&self, session: &SessionState) -> Result<(), QuizFlowError> {
        self.store
            .save_session(&StoredSession::from_session(session))
            .await?;
        Ok(())
    }
}

/// Collapse integrity failures into `None` (redirect-to-start policy) while
/// letting infrastructure failures propagate.
fn recover<T>(result: Result<T, StorageError>, what: &str) -> Result<Option<T>, StorageError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(
            err @ (StorageError::Corrupted(_)
            | StorageError::UnsupportedVersion { .. }
            | StorageError::QuizMismatch),
        ) => {
            warn!(payload = what, error = %err, "discarding unusable stored payload");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
