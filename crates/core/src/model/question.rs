use thiserror::Error;

use crate::model::ids::QuizId;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single validated multiple-choice item.
///
/// Construction enforces the invariants, so downstream code never re-checks
/// them: the prompt is non-blank, all four options are non-blank and pairwise
/// distinct, and the correct answer indexes a real option. Prompt and options
/// are stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_option: usize,
}

impl Question {
    /// Build a question, validating all invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any option is blank after
    /// trimming, options collide, or `correct_option` is out of range.
    pub fn new(
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_option: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::BlankPrompt);
        }

        let options = options.map(|o| o.trim().to_owned());
        for (position, option) in options.iter().enumerate() {
            if option.is_empty() {
                return Err(QuestionError::BlankOption { position });
            }
        }
        for (position, option) in options.iter().enumerate() {
            if options[..position].contains(option) {
                return Err(QuestionError::DuplicateOption { position });
            }
        }

        if correct_option >= OPTION_COUNT {
            return Err(QuestionError::CorrectOptionOutOfRange {
                index: correct_option,
            });
        }

        Ok(Self {
            prompt,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_option_text(&self) -> &str {
        &self.options[self.correct_option]
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("prompt is blank")]
    BlankPrompt,

    #[error("option {position} is blank")]
    BlankOption { position: usize },

    #[error("option {position} duplicates an earlier option")]
    DuplicateOption { position: usize },

    #[error("correct option index {index} is out of range")]
    CorrectOptionOutOfRange { index: usize },
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// The immutable ordered list of questions for one quiz.
///
/// Fixed once built; a session holds it read-only for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    id: QuizId,
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a set with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionSetError> {
        Self::from_persisted(QuizId::new(), questions)
    }

    /// Rehydrate a set from persisted storage, keeping its stored id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Empty` if `questions` is empty.
    pub fn from_persisted(id: QuizId, questions: Vec<Question>) -> Result<Self, QuestionSetError> {
        if questions.is_empty() {
            return Err(QuestionSetError::Empty);
        }
        Ok(Self { id, questions })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false: an empty set cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionSetError {
    #[error("question set is empty")]
    Empty,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: [&str; OPTION_COUNT]) -> [String; OPTION_COUNT] {
        values.map(str::to_owned)
    }

    #[test]
    fn question_trims_prompt_and_options() {
        let q = Question::new("  Capital of India?  ", options([" Mumbai ", "New Delhi", "Kolkata", "Chennai"]), 1)
            .unwrap();
        assert_eq!(q.prompt(), "Capital of India?");
        assert_eq!(q.options()[0], "Mumbai");
        assert_eq!(q.correct_option_text(), "New Delhi");
    }

    #[test]
    fn question_rejects_blank_prompt() {
        let err = Question::new("   ", options(["a", "b", "c", "d"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::BlankPrompt);
    }

    #[test]
    fn question_rejects_blank_option() {
        let err = Question::new("q", options(["a", "  ", "c", "d"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::BlankOption { position: 1 });
    }

    #[test]
    fn question_rejects_duplicate_options() {
        let err = Question::new("q", options(["a", "b", " a ", "d"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::DuplicateOption { position: 2 });
    }

    #[test]
    fn question_rejects_out_of_range_correct_index() {
        let err = Question::new("q", options(["a", "b", "c", "d"]), 4).unwrap_err();
        assert_eq!(err, QuestionError::CorrectOptionOutOfRange { index: 4 });
    }

    #[test]
    fn question_set_rejects_empty() {
        let err = QuestionSet::new(Vec::new()).unwrap_err();
        assert_eq!(err, QuestionSetError::Empty);
    }

    #[test]
    fn question_set_keeps_order_and_id() {
        let questions = vec![
            Question::new("first", options(["a", "b", "c", "d"]), 0).unwrap(),
            Question::new("second", options(["e", "f", "g", "h"]), 3).unwrap(),
        ];
        let id = QuizId::new();
        let set = QuestionSet::from_persisted(id, questions).unwrap();
        assert_eq!(set.id(), id);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().prompt(), "first");
        assert_eq!(set.get(1).unwrap().prompt(), "second");
        assert!(set.get(2).is_none());
    }
}
