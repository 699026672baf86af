#![forbid(unsafe_code)]

pub mod error;
pub mod extract;
pub mod generate;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::{ExtractionError, GenerationError, QuizFlowError};
pub use extract::{PdfTextExtractor, TextExtractor};
pub use generate::{QuizGenerator, StaticQuizGenerator};
pub use sessions::{QuizFlowService, SessionTicker, TickEvent};
