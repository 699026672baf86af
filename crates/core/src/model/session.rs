use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::question::{Question, QuestionSet, OPTION_COUNT};

/// Fixed quiz duration: thirty minutes.
pub const QUIZ_DURATION_SECS: i64 = 1800;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is already finalized")]
    AlreadyFinalized,

    #[error("option index {index} is out of range")]
    InvalidOptionIndex { index: usize },

    #[error("question index {index} is out of range for {len} questions")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid persisted session state: {0}")]
    InvalidPersistedState(String),
}

/// Derived progress counts; recomputed from the answer and mark vectors on
/// demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub attempted: usize,
    pub skipped: usize,
    pub marked: usize,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// The live state of one quiz attempt.
///
/// Owns the question set read-only and tracks position, per-question answers
/// and review marks, and the start/finalize timestamps. All mutation goes
/// through the methods here; every one of them refuses to touch a finalized
/// session except `finalize` itself, which is idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    questions: QuestionSet,
    current_index: usize,
    answers: Vec<Option<usize>>,
    marked: Vec<bool>,
    started_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Start a fresh session over the given question set.
    ///
    /// Position 0, everything unanswered and unmarked. `started_at` should
    /// come from the services layer clock to keep time deterministic.
    #[must_use]
    pub fn start(questions: QuestionSet, started_at: DateTime<Utc>) -> Self {
        let len = questions.len();
        Self {
            questions,
            current_index: 0,
            answers: vec![None; len],
            marked: vec![false; len],
            started_at,
            finalized_at: None,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// Stored answers outside the option range are clamped to unanswered so
    /// a corrupt value can never reach scoring. Structural mismatches reject
    /// the whole payload.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPersistedState` if vector lengths do not
    /// match the question count, the current index is out of bounds, or the
    /// finalize timestamp precedes the start timestamp.
    pub fn from_persisted(
        questions: QuestionSet,
        current_index: usize,
        answers: Vec<Option<usize>>,
        marked: Vec<bool>,
        started_at: DateTime<Utc>,
        finalized_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionError> {
        let len = questions.len();
        if answers.len() != len || marked.len() != len {
            return Err(SessionError::InvalidPersistedState(format!(
                "answer/mark lengths {}/{} do not match {len} questions",
                answers.len(),
                marked.len()
            )));
        }
        if current_index >= len {
            return Err(SessionError::InvalidPersistedState(format!(
                "current index {current_index} out of bounds for {len} questions"
            )));
        }
        if let Some(end) = finalized_at {
            if end < started_at {
                return Err(SessionError::InvalidPersistedState(
                    "finalized before started".to_owned(),
                ));
            }
        }

        let answers = answers
            .into_iter()
            .map(|a| a.filter(|&index| index < OPTION_COUNT))
            .collect();

        Ok(Self {
            questions,
            current_index,
            answers,
            marked,
            started_at,
            finalized_at,
        })
    }

    //
    // ─── MUTATION ──────────────────────────────────────────────────────────
    //

    /// Record an answer for the current question, overwriting any previous
    /// selection. Does not advance the position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidOptionIndex` for an index outside the
    /// option range, or `SessionError::AlreadyFinalized` on a sealed session.
    pub fn select_answer(&mut self, option_index: usize) -> Result<(), SessionError> {
        self.ensure_live()?;
        if option_index >= OPTION_COUNT {
            return Err(SessionError::InvalidOptionIndex {
                index: option_index,
            });
        }
        self.answers[self.current_index] = Some(option_index);
        Ok(())
    }

    /// Flip the review mark on the current question; returns the new value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinalized` on a sealed session.
    pub fn toggle_mark(&mut self) -> Result<bool, SessionError> {
        self.ensure_live()?;
        let flag = &mut self.marked[self.current_index];
        *flag = !*flag;
        Ok(*flag)
    }

    /// Jump to an arbitrary question. The target need not be answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfRange` for an index beyond the set, or
    /// `SessionError::AlreadyFinalized` on a sealed session.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_live()?;
        if index >= self.questions.len() {
            return Err(SessionError::OutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    /// Move to the next question; a no-op at the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinalized` on a sealed session.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        Ok(())
    }

    /// Move to the previous question; a no-op at the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinalized` on a sealed session.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(())
    }

    /// Seal the session for scoring. Idempotent: the first call sets the end
    /// timestamp and returns true; later calls change nothing and return
    /// false, which makes the manual-submit/timeout race harmless.
    pub fn finalize(&mut self, at: DateTime<Utc>) -> bool {
        if self.finalized_at.is_some() {
            return false;
        }
        self.finalized_at = Some(at);
        true
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.finalized_at.is_some() {
            return Err(SessionError::AlreadyFinalized);
        }
        Ok(())
    }

    //
    // ─── TIME ──────────────────────────────────────────────────────────────
    //

    /// When the countdown runs out; derived, never stored.
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::seconds(QUIZ_DURATION_SECS)
    }

    /// Whole seconds left on the clock at `now`, floored, never negative.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.deadline() - now).num_seconds()).unwrap_or(0)
    }

    /// True once the deadline has been reached; the trigger for forced
    /// submission. Keys off the exact deadline instant, not the rounded
    /// display value.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline()
    }

    //
    // ─── READ ACCESS ───────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question at the current position.
    ///
    /// # Panics
    ///
    /// Never panics: `current_index` is maintained in bounds.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions.questions()[self.current_index]
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answers[self.current_index]
    }

    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.marked[self.current_index]
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn marked(&self) -> &[bool] {
        &self.marked
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    /// Derived progress counts. `attempted + skipped == total` by
    /// construction.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let attempted = self.answers.iter().filter(|a| a.is_some()).count();
        SessionProgress {
            total,
            attempted,
            skipped: total - attempted,
            marked: self.marked.iter().filter(|m| **m).count(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
