//! Conversation persistence round-trips through a temporary data directory.

use sightline::models::{AnalysisResult, ClassifiedResult, Message, MessageBody};
use sightline::store::{persist, ConversationStore};

#[test]
fn store_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = ConversationStore::new();
    let thread_id = store.active_thread().id.clone();
    store
        .append_user(&thread_id, "2024년 VOC를 월별로 분석해줘")
        .expect("append");
    store.begin_placeholder(&thread_id).expect("placeholder");
    store
        .replace_placeholder(
            &thread_id,
            MessageBody::Result {
                result: ClassifiedResult::Analysis(AnalysisResult {
                    query_id: Some("Q1".to_string()),
                    explanation: Some("월별 분석".to_string()),
                    ..Default::default()
                }),
            },
        )
        .expect("replace");

    persist::save_threads(dir.path(), store.threads()).expect("save");

    let restored = ConversationStore::from_threads(
        persist::load_threads(dir.path()).expect("load"),
    );

    let thread = restored.active_thread();
    assert_eq!(thread.id, thread_id);
    assert_eq!(thread.title, "2024년 VOC를 월별로 분석해줘");
    assert_eq!(thread.messages.len(), 2);
    match &thread.messages[1].body {
        MessageBody::Result {
            result: ClassifiedResult::Analysis(analysis),
        } => {
            assert_eq!(analysis.query_id.as_deref(), Some("Q1"));
        }
        other => panic!("expected analysis result, got {:?}", other),
    }
}

#[test]
fn interrupted_session_placeholder_never_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = ConversationStore::new();
    let thread_id = store.active_thread().id.clone();
    store.append_user(&thread_id, "질문").expect("append");
    store.begin_placeholder(&thread_id).expect("placeholder");

    // Save mid-stream, as a crash would.
    persist::save_threads(dir.path(), store.threads()).expect("save");

    let restored = ConversationStore::from_threads(
        persist::load_threads(dir.path()).expect("load"),
    );
    assert!(!restored.active_thread().has_pending());
    assert_eq!(restored.active_thread().messages.len(), 1);
}

#[test]
fn message_ids_continue_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = ConversationStore::new();
    let thread_id = store.active_thread().id.clone();
    let first_id = store.append_user(&thread_id, "one").expect("append");

    persist::save_threads(dir.path(), store.threads()).expect("save");

    let mut restored = ConversationStore::from_threads(
        persist::load_threads(dir.path()).expect("load"),
    );
    let restored_thread = restored.active_thread().id.clone();
    let next_id = restored.append_user(&restored_thread, "two").expect("append");
    assert!(next_id > first_id);
}

#[test]
fn multiple_threads_preserve_order() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = ConversationStore::new();
    let first = store.active_thread().id.clone();
    store.append_user(&first, "첫 대화").expect("append");
    let second = store.create_thread();
    store.append_user(&second, "두 번째 대화").expect("append");

    persist::save_threads(dir.path(), store.threads()).expect("save");
    let restored = ConversationStore::from_threads(
        persist::load_threads(dir.path()).expect("load"),
    );

    assert_eq!(restored.thread_count(), 2);
    assert_eq!(restored.threads()[0].id, first);
    assert_eq!(restored.threads()[1].id, second);
    assert_eq!(restored.threads()[1].title, "두 번째 대화");
}

#[test]
fn loaded_messages_keep_roles_and_bodies() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = ConversationStore::new();
    let thread_id = store.active_thread().id.clone();
    store.append_user(&thread_id, "질문").expect("append");
    store.begin_placeholder(&thread_id).expect("placeholder");
    store
        .replace_placeholder(
            &thread_id,
            MessageBody::Error {
                message: "connection lost".to_string(),
            },
        )
        .expect("replace");

    persist::save_threads(dir.path(), store.threads()).expect("save");
    let threads = persist::load_threads(dir.path()).expect("load");

    let messages: &[Message] = &threads[0].messages;
    assert_eq!(messages.len(), 2);
    assert!(matches!(messages[1].body, MessageBody::Error { .. }));
}
