//! End-to-end flow: upload bytes through extraction, generation and
//! normalization into a live, persisted session, then submission and review.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use quiz_core::model::{AnswerStatus, QUIZ_DURATION_SECS};
use quiz_core::time::{fixed_clock, fixed_now};
use quiz_core::Clock;
use services::{
    ExtractionError, QuizFlowService, StaticQuizGenerator, TextExtractor,
};
use storage::repository::{InMemorySessionStore, SessionStore, KEY_SESSION};

struct FixedTextExtractor;

#[async_trait]
impl TextExtractor for FixedTextExtractor {
    async fn extract(&self, _pdf_bytes: Vec<u8>) -> Result<String, ExtractionError> {
        Ok("extracted document text".to_owned())
    }
}

struct FailingExtractor;

#[async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract(&self, _pdf_bytes: Vec<u8>) -> Result<String, ExtractionError> {
        Err(ExtractionError::Unreadable("bad file".to_owned()))
    }
}

fn build_flow(clock: Clock, store: Arc<InMemorySessionStore>) -> QuizFlowService {
    QuizFlowService::new(
        clock,
        store,
        Arc::new(FixedTextExtractor),
        Arc::new(StaticQuizGenerator::new()),
    )
}

#[tokio::test]
async fn create_answer_submit_and_review() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), Arc::clone(&store));

    let mut session = flow.create_quiz(b"pdf bytes".to_vec()).await.unwrap();
    assert_eq!(session.questions().len(), 10);
    assert_eq!(session.current_index(), 0);

    // Three correct, two wrong, rest skipped, one mark.
    for index in [0, 2, 4] {
        flow.go_to(&mut session, index).await.unwrap();
        let correct = session.current_question().correct_option();
        flow.select_answer(&mut session, correct).await.unwrap();
    }
    for index in [1, 3] {
        flow.go_to(&mut session, index).await.unwrap();
        let correct = session.current_question().correct_option();
        flow.select_answer(&mut session, (correct + 1) % 4)
            .await
            .unwrap();
    }
    flow.go_to(&mut session, 6).await.unwrap();
    assert!(flow.toggle_mark(&mut session).await.unwrap());

    let submit_flow = build_flow(
        Clock::fixed(fixed_now() + Duration::seconds(1200)),
        Arc::clone(&store),
    );
    let review = submit_flow.submit(&mut session).await.unwrap();

    assert_eq!(review.summary.correct, 3);
    assert_eq!(review.summary.wrong, 2);
    assert_eq!(review.summary.skipped, 5);
    assert_eq!(review.summary.marked, 1);
    assert_eq!(review.summary.elapsed_secs, 1200);
    assert_eq!(review.entries.len(), 10);
    assert_eq!(review.entries[0].status, AnswerStatus::Correct);
    assert_eq!(review.entries[5].status, AnswerStatus::Skipped);

    // Submitting again scores the same sealed session.
    let again = submit_flow.submit(&mut session).await.unwrap();
    assert_eq!(again.summary.elapsed_secs, 1200);
}

#[tokio::test]
async fn extraction_failure_leaves_no_session_behind() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = QuizFlowService::new(
        fixed_clock(),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        Arc::new(FailingExtractor),
        Arc::new(StaticQuizGenerator::new()),
    );

    flow.create_quiz(b"broken".to_vec()).await.unwrap_err();
    assert!(store.load_quiz().await.unwrap().is_none());
    assert!(flow.resume().await.unwrap().is_none());
}

#[tokio::test]
async fn resume_restores_the_persisted_session() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), Arc::clone(&store));

    let mut session = flow.create_quiz(Vec::new()).await.unwrap();
    flow.select_answer(&mut session, 2).await.unwrap();
    flow.next(&mut session).await.unwrap();
    flow.toggle_mark(&mut session).await.unwrap();

    let resumed = flow.resume().await.unwrap().unwrap();
    assert_eq!(resumed, session);
}

#[tokio::test]
async fn resume_is_none_on_empty_store_and_after_discard() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), Arc::clone(&store));
    assert!(flow.resume().await.unwrap().is_none());

    let _session = flow.create_quiz(Vec::new()).await.unwrap();
    flow.discard().await.unwrap();
    assert!(flow.resume().await.unwrap().is_none());
}

#[tokio::test]
async fn resume_is_none_when_only_the_quiz_is_stored() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), Arc::clone(&store));

    // Persist a quiz payload with no session alongside it.
    let session = flow.create_quiz(Vec::new()).await.unwrap();
    store.clear().await.unwrap();
    store
        .save_quiz(&storage::repository::StoredQuiz::from_set(
            session.questions(),
        ))
        .await
        .unwrap();

    assert!(store.load_quiz().await.unwrap().is_some());
    assert!(flow.resume().await.unwrap().is_none());

    // A stored quiz without a session is still enough to restart.
    assert!(flow.restart().await.unwrap().is_some());
}

#[tokio::test]
async fn corrupted_session_payload_resumes_as_none() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), Arc::clone(&store));

    let _session = flow.create_quiz(Vec::new()).await.unwrap();
    store.put_raw(KEY_SESSION, "{{{ not json").unwrap();

    assert!(flow.resume().await.unwrap().is_none());
}

#[tokio::test]
async fn restart_rebuilds_a_fresh_session_from_the_stored_quiz() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), Arc::clone(&store));

    let mut session = flow.create_quiz(Vec::new()).await.unwrap();
    flow.select_answer(&mut session, 1).await.unwrap();
    flow.submit(&mut session).await.unwrap();

    let restarted = flow.restart().await.unwrap().unwrap();
    assert_eq!(restarted.questions().id(), session.questions().id());
    assert!(!restarted.is_finalized());
    assert!(restarted.answers().iter().all(Option::is_none));
    assert_eq!(restarted.current_index(), 0);

    // The fresh session replaced the sealed one in the store.
    let resumed = flow.resume().await.unwrap().unwrap();
    assert_eq!(resumed, restarted);
}

#[tokio::test]
async fn restart_with_nothing_stored_is_none() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), store);
    assert!(flow.restart().await.unwrap().is_none());
}

#[tokio::test]
async fn session_deadline_tracks_the_fixed_duration() {
    let store = Arc::new(InMemorySessionStore::new());
    let flow = build_flow(fixed_clock(), store);
    let session = flow.create_quiz(Vec::new()).await.unwrap();
    assert_eq!(
        session.deadline() - session.started_at(),
        Duration::seconds(QUIZ_DURATION_SECS)
    );
}
