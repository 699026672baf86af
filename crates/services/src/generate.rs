//! The quiz-generation collaborator.
//!
//! `StaticQuizGenerator` is a placeholder for a real language-model backend:
//! it ignores the document content and returns a fixed general-knowledge
//! bank. The trait is the seam a real generator would plug into.

use async_trait::async_trait;
use tracing::debug;

use crate::error::GenerationError;
use quiz_core::model::RawQuestionRecord;

/// Longest prefix of the extracted text a generator is expected to consider.
pub const TEXT_PREVIEW_CHARS: usize = 100;

/// Contract for deriving question records from extracted text.
///
/// Output is loosely typed on purpose: shipped generators have disagreed on
/// the answer encoding, and normalization downstream reconciles them.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Produce raw question records for the given text.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if no records can be produced.
    async fn generate(&self, text: &str) -> Result<Vec<RawQuestionRecord>, GenerationError>;
}

/// The mock generator: a fixed ten-question bank with text-form answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticQuizGenerator;

impl StaticQuizGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QuizGenerator for StaticQuizGenerator {
    async fn generate(&self, text: &str) -> Result<Vec<RawQuestionRecord>, GenerationError> {
        let preview: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        debug!(%preview, "generating quiz from text (placeholder bank)");

        serde_json::from_str(STATIC_BANK).map_err(|e| GenerationError::MalformedOutput(e.to_string()))
    }
}

/// The question bank, kept as literal JSON: this is the wire shape a real
/// backend would return, answer given as option text.
const STATIC_BANK: &str = r#"[
    {
        "question": "What is the capital of India?",
        "options": ["Mumbai", "New Delhi", "Kolkata", "Chennai"],
        "answer": "New Delhi"
    },
    {
        "question": "Who was the first Prime Minister of India?",
        "options": ["Mahatma Gandhi", "Jawaharlal Nehru", "Sardar Vallabhbhai Patel", "Dr. B. R. Ambedkar"],
        "answer": "Jawaharlal Nehru"
    },
    {
        "question": "Which river is known as the 'Ganga of the South'?",
        "options": ["Krishna", "Godavari", "Cauvery", "Mahanadi"],
        "answer": "Godavari"
    },
    {
        "question": "The Indian Parliament consists of:",
        "options": ["Lok Sabha only", "Rajya Sabha only", "Lok Sabha and Rajya Sabha", "President, Lok Sabha, and Rajya Sabha"],
        "answer": "President, Lok Sabha, and Rajya Sabha"
    },
    {
        "question": "When did India gain independence from British rule?",
        "options": ["1945", "1947", "1950", "1952"],
        "answer": "1947"
    },
    {
        "question": "Who is known as the 'Father of the Indian Constitution'?",
        "options": ["Mahatma Gandhi", "Jawaharlal Nehru", "Sardar Vallabhbhai Patel", "Dr. B. R. Ambedkar"],
        "answer": "Dr. B. R. Ambedkar"
    },
    {
        "question": "What is the national animal of India?",
        "options": ["Lion", "Tiger", "Elephant", "Leopard"],
        "answer": "Tiger"
    },
    {
        "question": "The 'Dandi March' led by Mahatma Gandhi was associated with:",
        "options": ["Khilafat Movement", "Non-Cooperation Movement", "Civil Disobedience Movement", "Quit India Movement"],
        "answer": "Civil Disobedience Movement"
    },
    {
        "question": "Which of the following is a classical dance form of Kerala?",
        "options": ["Bharatanatyam", "Kathakali", "Kuchipudi", "Odissi"],
        "answer": "Kathakali"
    },
    {
        "question": "The highest civilian award in India is:",
        "options": ["Padma Vibhushan", "Bharat Ratna", "Padma Bhushan", "Param Vir Chakra"],
        "answer": "Bharat Ratna"
    }
]"#;

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
