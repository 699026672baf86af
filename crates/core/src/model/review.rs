use thiserror::Error;

use crate::model::session::SessionState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("session is not finalized")]
    NotFinalized,
}

/// Outcome of one question after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Correct,
    Wrong,
    Skipped,
}

/// Aggregate result counts for a finalized session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub marked: usize,
    pub elapsed_secs: i64,
}

impl ScoreSummary {
    /// Derive the score from a finalized session.
    ///
    /// A question counts as correct when the recorded answer equals the
    /// correct option, wrong when answered otherwise, skipped when
    /// unanswered. Elapsed time is floored to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::NotFinalized` if the session has not been
    /// sealed yet.
    pub fn from_session(session: &SessionState) -> Result<Self, ScoringError> {
        let Some(finalized_at) = session.finalized_at() else {
            return Err(ScoringError::NotFinalized);
        };

        let mut correct = 0;
        let mut wrong = 0;
        let mut skipped = 0;
        for (question, answer) in session.questions().iter().zip(session.answers()) {
            match answer {
                Some(selected) if *selected == question.correct_option() => correct += 1,
                Some(_) => wrong += 1,
                None => skipped += 1,
            }
        }

        Ok(Self {
            correct,
            wrong,
            skipped,
            marked: session.marked().iter().filter(|m| **m).count(),
            elapsed_secs: (finalized_at - session.started_at()).num_seconds(),
        })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.correct + self.wrong + self.skipped
    }
}

/// Per-question comparison of the user's answer against the correct one,
/// surfacing option text rather than indices for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub position: usize,
    pub prompt: String,
    pub selected: Option<String>,
    pub correct: String,
    pub status: AnswerStatus,
    pub marked: bool,
}

/// The full post-submission review: score plus one entry per question, in
/// question order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReview {
    pub summary: ScoreSummary,
    pub entries: Vec<ReviewEntry>,
}

impl QuizReview {
    /// Derive the review from a finalized session.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::NotFinalized` if the session has not been
    /// sealed yet.
    pub fn from_session(session: &SessionState) -> Result<Self, ScoringError> {
        let summary = ScoreSummary::from_session(session)?;

        let entries = session
            .questions()
            .iter()
            .zip(session.answers())
            .zip(session.marked())
            .enumerate()
            .map(|(position, ((question, answer), marked))| {
                let status = match answer {
                    Some(selected) if *selected == question.correct_option() => {
                        AnswerStatus::Correct
                    }
                    Some(_) => AnswerStatus::Wrong,
                    None => AnswerStatus::Skipped,
                };
                ReviewEntry {
                    position,
                    prompt: question.prompt().to_owned(),
                    selected: answer.map(|index| question.options()[index].clone()),
                    correct: question.correct_option_text().to_owned(),
                    status,
                    marked: *marked,
                }
            })
            .collect();

        Ok(Self { summary, entries })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
