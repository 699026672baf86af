#![forbid(unsafe_code)]

pub mod model;
pub mod time;

pub use time::Clock;

pub use model::{
    AnswerStatus, DropReason, DroppedRecord, NormalizeError, NormalizedQuiz, Question,
    QuestionError, QuestionSet, QuestionSetError, QuizId, QuizReview, RawAnswer,
    RawQuestionRecord, ReviewEntry, ScoreSummary, ScoringError, SessionError, SessionProgress,
    SessionState,
};
