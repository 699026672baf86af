use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::{
    Question, QuestionError, QuestionSet, QuestionSetError, OPTION_COUNT,
};

/// Minimum records a generator must return for a usable quiz.
pub const MIN_QUESTIONS: usize = 10;
/// Maximum records a generator may return.
pub const MAX_QUESTIONS: usize = 20;

//
// ─── RAW GENERATOR OUTPUT ──────────────────────────────────────────────────────
//

/// A loosely-typed question record as emitted by a generator.
///
/// Generators have shipped two encodings of the correct answer: the literal
/// option text, and a numeric option index. Both are accepted here and
/// reconciled into the internal index representation; nothing downstream ever
/// sees the text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestionRecord {
    pub question: String,
    pub options: Vec<String>,
    pub answer: RawAnswer,
}

/// The two observed encodings of a record's correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Index(usize),
    Text(String),
}

//
// ─── NORMALIZATION ─────────────────────────────────────────────────────────────
//

/// Outcome of normalizing a batch of raw records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuiz {
    pub questions: QuestionSet,
    pub dropped: Vec<DroppedRecord>,
}

/// A record rejected during normalization, with its position in the raw batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub position: usize,
    pub prompt: String,
    pub reason: DropReason,
}

/// Why a single record was dropped (the batch as a whole survives).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DropReason {
    #[error("prompt is blank")]
    BlankPrompt,

    #[error("prompt duplicates an earlier question")]
    DuplicatePrompt,

    #[error("answer index {index} is out of range")]
    AnswerIndexOutOfRange { index: usize },

    #[error("answer text matches no option")]
    AnswerTextUnmatched,

    #[error("answer text matches more than one option")]
    AnswerTextAmbiguous,

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Fatal normalization failures: the whole batch is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error("generator returned {count} records, need at least {MIN_QUESTIONS}")]
    TooFewRecords { count: usize },

    #[error("generator returned {count} records, limit is {MAX_QUESTIONS}")]
    TooManyRecords { count: usize },

    #[error("record {position} has {count} options, expected {OPTION_COUNT}")]
    WrongOptionCount { position: usize, count: usize },

    #[error("no usable records after validation")]
    NoUsableRecords,

    #[error(transparent)]
    Set(#[from] QuestionSetError),
}

/// Normalize raw generator output into a validated `QuestionSet`.
///
/// Per-record defects drop the record and continue; structural defects
/// (record count outside bounds, a wrong option count, zero survivors)
/// fail the whole batch.
///
/// # Errors
///
/// Returns `NormalizeError` on any fatal condition above.
pub fn normalize_records(
    records: Vec<RawQuestionRecord>,
) -> Result<NormalizedQuiz, NormalizeError> {
    let count = records.len();
    if count < MIN_QUESTIONS {
        return Err(NormalizeError::TooFewRecords { count });
    }
    if count > MAX_QUESTIONS {
        return Err(NormalizeError::TooManyRecords { count });
    }

    let mut questions = Vec::with_capacity(count);
    let mut dropped = Vec::new();
    let mut seen_prompts: Vec<String> = Vec::with_capacity(count);

    for (position, record) in records.into_iter().enumerate() {
        let prompt = record.question.trim().to_owned();
        if prompt.is_empty() {
            dropped.push(DroppedRecord {
                position,
                prompt,
                reason: DropReason::BlankPrompt,
            });
            continue;
        }

        let prompt_key = prompt.to_lowercase();
        if seen_prompts.contains(&prompt_key) {
            dropped.push(DroppedRecord {
                position,
                prompt,
                reason: DropReason::DuplicatePrompt,
            });
            continue;
        }

        // A malformed option count is a generator contract violation, not a
        // per-record defect: the whole batch is rejected.
        let options: [String; OPTION_COUNT] = record
            .options
            .try_into()
            .map_err(|bad: Vec<String>| NormalizeError::WrongOptionCount {
                position,
                count: bad.len(),
            })?;
        let options = options.map(|o| o.trim().to_owned());

        let correct_option = match resolve_answer(&record.answer, &options) {
            Ok(index) => index,
            Err(reason) => {
                dropped.push(DroppedRecord {
                    position,
                    prompt,
                    reason,
                });
                continue;
            }
        };

        match Question::new(prompt.clone(), options, correct_option) {
            Ok(question) => {
                seen_prompts.push(prompt_key);
                questions.push(question);
            }
            Err(err) => dropped.push(DroppedRecord {
                position,
                prompt,
                reason: DropReason::Question(err),
            }),
        }
    }

    if questions.is_empty() {
        return Err(NormalizeError::NoUsableRecords);
    }

    Ok(NormalizedQuiz {
        questions: QuestionSet::new(questions)?,
        dropped,
    })
}

fn resolve_answer(
    answer: &RawAnswer,
    options: &[String; OPTION_COUNT],
) -> Result<usize, DropReason> {
    match answer {
        RawAnswer::Index(index) => {
            if *index >= OPTION_COUNT {
                Err(DropReason::AnswerIndexOutOfRange { index: *index })
            } else {
                Ok(*index)
            }
        }
        RawAnswer::Text(text) => {
            let needle = text.trim();
            let mut matches = options.iter().enumerate().filter(|(_, o)| *o == needle);
            match (matches.next(), matches.next()) {
                (Some((index, _)), None) => Ok(index),
                (None, _) => Err(DropReason::AnswerTextUnmatched),
                (Some(_), Some(_)) => Err(DropReason::AnswerTextAmbiguous),
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
