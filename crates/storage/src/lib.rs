#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    InMemorySessionStore, SessionStore, StorageError, StoredQuestion, StoredQuiz, StoredSession,
    KEY_QUIZ, KEY_SESSION, PAYLOAD_VERSION,
};
