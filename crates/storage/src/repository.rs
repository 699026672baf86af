use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{Question, QuestionSet, QuizId, SessionState, OPTION_COUNT};

/// Logical key the question set payload is stored under.
pub const KEY_QUIZ: &str = "quizData";
/// Logical key the session payload is stored under.
pub const KEY_SESSION: &str = "quizState";

/// Current payload schema version. Unknown versions are treated as corrupt
/// and recoverable, never deserialized on a best-effort basis.
pub const PAYLOAD_VERSION: u32 = 1;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("corrupted payload: {0}")]
    Corrupted(String),

    #[error("unsupported payload version {found}")]
    UnsupportedVersion { found: u32 },

    #[error("stored session does not match the stored quiz")]
    QuizMismatch,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PAYLOAD RECORDS ───────────────────────────────────────────────────────────
//

/// Persisted shape of a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

/// Persisted shape of a question set.
///
/// Mirrors the domain `QuestionSet` so the store can serialize without
/// leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuiz {
    pub version: u32,
    pub quiz_id: QuizId,
    pub questions: Vec<StoredQuestion>,
}

impl StoredQuiz {
    #[must_use]
    pub fn from_set(set: &QuestionSet) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            quiz_id: set.id(),
            questions: set
                .iter()
                .map(|q| StoredQuestion {
                    prompt: q.prompt().to_owned(),
                    options: q.options().to_vec(),
                    correct_option: q.correct_option(),
                })
                .collect(),
        }
    }

    /// Convert the record back into a domain `QuestionSet`, re-validating
    /// every question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedVersion` for an unknown schema
    /// version and `StorageError::Corrupted` if any stored question fails
    /// domain validation.
    pub fn into_set(self) -> Result<QuestionSet, StorageError> {
        if self.version != PAYLOAD_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.version,
            });
        }

        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                let options: [String; OPTION_COUNT] = q
                    .options
                    .try_into()
                    .map_err(|bad: Vec<String>| {
                        StorageError::Corrupted(format!("{} options stored", bad.len()))
                    })?;
                Question::new(q.prompt, options, q.correct_option)
                    .map_err(|e| StorageError::Corrupted(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        QuestionSet::from_persisted(self.quiz_id, questions)
            .map_err(|e| StorageError::Corrupted(e.to_string()))
    }
}

/// Persisted shape of a session, without its question set. The set is stored
/// separately and the two are joined on `quiz_id` at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub version: u32,
    pub quiz_id: QuizId,
    pub current_index: usize,
    pub answers: Vec<Option<usize>>,
    pub marked: Vec<bool>,
    pub started_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    #[must_use]
    pub fn from_session(session: &SessionState) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            quiz_id: session.questions().id(),
            current_index: session.current_index(),
            answers: session.answers().to_vec(),
            marked: session.marked().to_vec(),
            started_at: session.started_at(),
            finalized_at: session.finalized_at(),
        }
    }

    /// Rejoin the record with its question set into a live `SessionState`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedVersion` for an unknown schema
    /// version, `StorageError::QuizMismatch` if the session was started from
    /// a different quiz, and `StorageError::Corrupted` if the domain layer
    /// rejects the stored state.
    pub fn into_session(self, questions: QuestionSet) -> Result<SessionState, StorageError> {
        if self.version != PAYLOAD_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.version,
            });
        }
        if self.quiz_id != questions.id() {
            return Err(StorageError::QuizMismatch);
        }

        SessionState::from_persisted(
            questions,
            self.current_index,
            self.answers,
            self.marked,
            self.started_at,
            self.finalized_at,
        )
        .map_err(|e| StorageError::Corrupted(e.to_string()))
    }
}

//
// ─── STORE CONTRACT ────────────────────────────────────────────────────────────
//

/// The durability boundary: ephemeral key-value storage scoped to one run,
/// holding at most one quiz and one session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the question set payload.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload cannot be stored.
    async fn save_quiz(&self, quiz: &StoredQuiz) -> Result<(), StorageError>;

    /// Load the question set payload, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` if a stored payload cannot be
    /// decoded, or other storage errors.
    async fn load_quiz(&self) -> Result<Option<StoredQuiz>, StorageError>;

    /// Persist the session payload.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload cannot be stored.
    async fn save_session(&self, session: &StoredSession) -> Result<(), StorageError>;

    /// Load the session payload, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` if a stored payload cannot be
    /// decoded, or other storage errors.
    async fn load_session(&self) -> Result<Option<StoredSession>, StorageError>;

    /// Remove both payloads.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be cleared.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory store holding encoded JSON strings under the fixed logical
/// keys, the same shape a browser keeps under `localStorage`.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a raw entry, bypassing encoding. Test hook for corrupt and
    /// stale payloads.
    pub fn put_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self.lock()?;
        guard.insert(key.to_owned(), encoded);
        Ok(())
    }

    fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let guard = self.lock()?;
        let Some(raw) = guard.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupted(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_quiz(&self, quiz: &StoredQuiz) -> Result<(), StorageError> {
        self.save(KEY_QUIZ, quiz)
    }

    async fn load_quiz(&self) -> Result<Option<StoredQuiz>, StorageError> {
        self.load(KEY_QUIZ)
    }

    async fn save_session(&self, session: &StoredSession) -> Result<(), StorageError> {
        self.save(KEY_SESSION, session)
    }

    async fn load_session(&self) -> Result<Option<StoredSession>, StorageError> {
        self.load(KEY_SESSION)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.remove(KEY_QUIZ);
        guard.remove(KEY_SESSION);
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn build_set() -> QuestionSet {
        let questions = (0..10)
            .map(|i| {
                Question::new(
                    format!("question {i}"),
                    [
                        format!("{i} a"),
                        format!("{i} b"),
                        format!("{i} c"),
                        format!("{i} d"),
                    ],
                    i % 4,
                )
                .unwrap()
            })
            .collect();
        QuestionSet::new(questions).unwrap()
    }

    #[test]
    fn quiz_payload_roundtrips() {
        let set = build_set();
        let restored = StoredQuiz::from_set(&set).into_set().unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn session_payload_roundtrips() {
        let set = build_set();
        let mut session = SessionState::start(set.clone(), fixed_now());
        session.select_answer(1).unwrap();
        session.go_to(4).unwrap();
        session.toggle_mark().unwrap();

        let restored = StoredSession::from_session(&session)
            .into_session(set)
            .unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let set = build_set();
        let mut quiz = StoredQuiz::from_set(&set);
        quiz.version = 2;
        let err = quiz.into_set().unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion { found: 2 }));

        let mut stored = StoredSession::from_session(&SessionState::start(set.clone(), fixed_now()));
        stored.version = 0;
        let err = stored.into_session(set).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion { found: 0 }));
    }

    #[test]
    fn session_from_different_quiz_is_rejected() {
        let set = build_set();
        let session = SessionState::start(set, fixed_now());
        let stored = StoredSession::from_session(&session);

        let other = build_set();
        let err = stored.into_session(other).unwrap_err();
        assert!(matches!(err, StorageError::QuizMismatch));
    }

    #[test]
    fn corrupted_question_payload_is_rejected() {
        let set = build_set();
        let mut quiz = StoredQuiz::from_set(&set);
        quiz.questions[0].options.pop();
        let err = quiz.into_set().unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(_)));
    }

    #[tokio::test]
    async fn store_roundtrips_under_fixed_keys() {
        let store = InMemorySessionStore::new();
        assert!(store.load_quiz().await.unwrap().is_none());
        assert!(store.load_session().await.unwrap().is_none());

        let set = build_set();
        let session = SessionState::start(set.clone(), fixed_now());
        store.save_quiz(&StoredQuiz::from_set(&set)).await.unwrap();
        store
            .save_session(&StoredSession::from_session(&session))
            .await
            .unwrap();

        let quiz = store.load_quiz().await.unwrap().unwrap();
        let stored = store.load_session().await.unwrap().unwrap();
        let restored = stored.into_session(quiz.into_set().unwrap()).unwrap();
        assert_eq!(restored, session);

        store.clear().await.unwrap();
        assert!(store.load_quiz().await.unwrap().is_none());
        assert!(store.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_json_surfaces_as_corrupted() {
        let store = InMemorySessionStore::new();
        store.put_raw(KEY_QUIZ, "not json at all").unwrap();
        let err = store.load_quiz().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(_)));
    }
}
