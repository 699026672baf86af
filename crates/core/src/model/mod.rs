mod ids;
mod normalize;
mod question;
mod review;
mod session;

pub use ids::QuizId;
pub use normalize::{
    DropReason, DroppedRecord, NormalizeError, NormalizedQuiz, RawAnswer, RawQuestionRecord,
    normalize_records, MAX_QUESTIONS, MIN_QUESTIONS,
};
pub use question::{Question, QuestionError, QuestionSet, QuestionSetError, OPTION_COUNT};
pub use review::{AnswerStatus, QuizReview, ReviewEntry, ScoreSummary, ScoringError};
pub use session::{SessionError, SessionProgress, SessionState, QUIZ_DURATION_SECS};
