use std::sync::Arc;
use std::time::Duration;

use database::{
    contact, conversation, inbox, instance, lead_list, message, ConversationStatus, Database,
    Direction, Inbox, Instance, MediaType, NewMessage,
};
use ingest::{Collaborators, IngestError, Outcome, Pipeline, PipelineConfig, SkipReason};
use mock_collaborators::{MockMediaSource, MockObjectStore, MockPublisher, MockTranscriber};
use serde_json::{json, Value};

struct Harness {
    pipeline: Pipeline,
    db: Database,
    source: MockMediaSource,
    store: MockObjectStore,
    publisher: MockPublisher,
    transcriber: MockTranscriber,
}

impl Harness {
    async fn new() -> Self {
        Self::with_source(MockMediaSource::new()).await
    }

    async fn with_source(source: MockMediaSource) -> Self {
        let db = Database::in_memory().await.unwrap();
        seed(&db).await;

        let store = MockObjectStore::new();
        let publisher = MockPublisher::new();
        let transcriber = MockTranscriber::new();
        let pipeline = Pipeline::new(
            db.clone(),
            Collaborators {
                media_source: Arc::new(source.clone()),
                object_store: Arc::new(store.clone()),
                publisher: Arc::new(publisher.clone()),
                transcriber: Arc::new(transcriber.clone()),
            },
            PipelineConfig {
                lead_list_name: "leads".to_string(),
                ..Default::default()
            },
        );

        Self {
            pipeline,
            db,
            source,
            store,
            publisher,
            transcriber,
        }
    }

    /// Ingest and wait for side effects.
    async fn ingest(&self, payload: Value) -> Outcome {
        let ingested = self.pipeline.ingest(payload).await.unwrap();
        ingested.background.join().await;
        ingested.outcome
    }
}

async fn seed(db: &Database) {
    instance::create_instance(
        db.pool(),
        &Instance {
            id: "inst-1".to_string(),
            name: "acct1".to_string(),
            owner: Some("5511000".to_string()),
            token: Some("tok-1".to_string()),
        },
    )
    .await
    .unwrap();
    inbox::create_inbox(
        db.pool(),
        &Inbox {
            id: "inbox-1".to_string(),
            instance_id: "inst-1".to_string(),
        },
    )
    .await
    .unwrap();
    instance::create_instance(
        db.pool(),
        &Instance {
            id: "inst-2".to_string(),
            name: "unbound".to_string(),
            owner: None,
            token: None,
        },
    )
    .await
    .unwrap();
}

fn hello_event() -> Value {
    json!({
        "EventType": "messages",
        "instanceName": "acct1",
        "message": {
            "chatid": "5511999@x",
            "fromMe": false,
            "messageid": "abc:123",
            "mediaType": "",
            "text": "Hello"
        }
    })
}

async fn store_external(db: &Database, conversation_id: &str, external_id: &str) {
    message::insert_message(
        db.pool(),
        &NewMessage {
            conversation_id: conversation_id.to_string(),
            direction: Direction::Incoming,
            content: Some("old".to_string()),
            media_type: MediaType::Text,
            media_url: None,
            external_id: Some(external_id.to_string()),
            created_at: database::now(),
        },
    )
    .await
    .unwrap();
}

fn event(message: Value) -> Value {
    json!({"EventType": "messages", "instanceName": "acct1", "message": message})
}

#[tokio::test]
async fn new_contact_message_is_stored() {
    let h = Harness::new().await;

    let outcome = h.ingest(hello_event()).await;
    let Outcome::Stored { conversation_id, message_id } = outcome.clone() else {
        panic!("expected stored, got {:?}", outcome);
    };
    assert_eq!(outcome.to_json()["ok"], true);
    assert_eq!(outcome.to_json()["conversation_id"], conversation_id.as_str());

    let stored_contact = contact::find_contact_by_jid(h.db.pool(), "5511999@x").await.unwrap().unwrap();
    assert_eq!(stored_contact.phone.as_deref(), Some("5511999"));

    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.status, ConversationStatus::Open);
    assert!(conv.unread);
    assert_eq!(conv.last_message_preview.as_deref(), Some("Hello"));

    let msg = message::get_message(h.db.pool(), &message_id).await.unwrap();
    assert_eq!(msg.direction, Direction::Incoming);
    assert_eq!(msg.media_type, MediaType::Text);
    assert_eq!(msg.content.as_deref(), Some("Hello"));
    assert_eq!(msg.external_id.as_deref(), Some("123"));

    let mut topics = h.publisher.topics();
    topics.sort();
    assert_eq!(topics, vec![format!("conversation:{}", conversation_id), "inbox:inbox-1".to_string()]);
}

#[tokio::test]
async fn redelivery_is_skipped_as_duplicate() {
    let h = Harness::new().await;

    h.ingest(hello_event()).await;
    for _ in 0..3 {
        let outcome = h.ingest(hello_event()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Duplicate));
        assert_eq!(
            outcome.to_json(),
            json!({"ok": true, "skipped": true, "reason": "duplicate"})
        );
    }

    assert_eq!(message::count_by_external_id(h.db.pool(), "123").await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_duplicates_store_one_row() {
    let h = Harness::new().await;

    let (a, b) = tokio::join!(h.ingest(hello_event()), h.ingest(hello_event()));
    let stored = [&a, &b]
        .iter()
        .filter(|o| matches!(o, Outcome::Stored { .. }))
        .count();
    assert_eq!(stored, 1);
    assert_eq!(message::count_messages(h.db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn legacy_composite_id_counts_as_duplicate() {
    let h = Harness::new().await;
    let Outcome::Stored { conversation_id, .. } =
        h.ingest(event(json!({"chatid": "1@x", "messageid": "FIRST", "text": "first"}))).await
    else {
        panic!("expected stored");
    };
    store_external(&h.db, &conversation_id, "5511000:LEG1").await;

    let outcome = h.ingest(event(json!({"chatid": "1@x", "messageid": "LEG1", "text": "old"}))).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Duplicate));
}

#[tokio::test]
async fn prefixed_id_matches_owner_legacy_form() {
    let h = Harness::new().await;
    let Outcome::Stored { conversation_id, .. } =
        h.ingest(event(json!({"chatid": "5511999@x", "messageid": "FIRST", "text": "first"}))).await
    else {
        panic!("expected stored");
    };
    store_external(&h.db, &conversation_id, "5511000:123").await;

    let outcome = h.ingest(hello_event()).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Duplicate));
    assert_eq!(message::count_by_external_id(h.db.pool(), "123").await.unwrap(), 0);
}

#[tokio::test]
async fn unique_index_race_reports_duplicate_index() {
    let source = MockMediaSource::new()
        .with_link("RACE1", "https://provider.test/race", "image/png")
        .with_delay(Duration::from_millis(300));
    let h = Harness::with_source(source).await;
    let Outcome::Stored { conversation_id, .. } =
        h.ingest(event(json!({"chatid": "11@x", "messageid": "OPEN", "text": "hi"}))).await
    else {
        panic!("expected stored");
    };

    // The row lands while media resolution is still waiting, after the
    // pre-check has passed.
    let racing = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store_external(&h.db, &conversation_id, "RACE1").await;
    };
    let (outcome, ()) = tokio::join!(
        h.ingest(event(json!({"chatid": "11@x", "messageid": "RACE1", "mediaType": "image"}))),
        racing
    );

    assert_eq!(outcome, Outcome::Skipped(SkipReason::DuplicateIndex));
    assert_eq!(
        outcome.to_json(),
        json!({"ok": true, "skipped": true, "reason": "duplicate_index"})
    );
    assert_eq!(message::count_by_external_id(h.db.pool(), "RACE1").await.unwrap(), 1);
}

#[tokio::test]
async fn failed_conversation_update_leaves_no_message() {
    let h = Harness::new().await;
    let Outcome::Stored { conversation_id, .. } =
        h.ingest(event(json!({"chatid": "5511999@x", "messageid": "OPEN", "text": "hi"}))).await
    else {
        panic!("expected stored");
    };

    sqlx::query(
        "CREATE TRIGGER reject_update BEFORE UPDATE ON conversations \
         BEGIN SELECT RAISE(ABORT, 'conversation locked'); END",
    )
    .execute(h.db.pool())
    .await
    .unwrap();

    let err = h.pipeline.ingest(hello_event()).await.unwrap_err();
    assert!(!err.is_client_error());
    assert_eq!(message::count_by_external_id(h.db.pool(), "123").await.unwrap(), 0);

    sqlx::query("DROP TRIGGER reject_update")
        .execute(h.db.pool())
        .await
        .unwrap();

    let outcome = h.ingest(hello_event()).await;
    assert!(matches!(outcome, Outcome::Stored { .. }), "got {:?}", outcome);
    assert_eq!(message::count_by_external_id(h.db.pool(), "123").await.unwrap(), 1);
    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.last_message_preview.as_deref(), Some("Hello"));
}

#[tokio::test]
async fn wrapped_payloads_are_unwrapped() {
    let h = Harness::new().await;

    let outcome = h.ingest(json!([{"body": hello_event(), "headers": {"x": "y"}}])).await;
    assert!(matches!(outcome, Outcome::Stored { .. }));
}

#[tokio::test]
async fn non_message_events_are_acknowledged() {
    let h = Harness::new().await;

    let outcome = h.ingest(json!({"EventType": "connection", "instanceName": "acct1"})).await;
    assert_eq!(outcome.to_json()["reason"], "not_message_event");
    assert_eq!(message::count_messages(h.db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_identity_is_skipped() {
    let h = Harness::new().await;

    let mut payload = hello_event();
    payload["instanceName"] = json!("nobody");
    assert_eq!(h.ingest(payload).await, Outcome::Skipped(SkipReason::InstanceNotFound));

    let mut payload = hello_event();
    payload["instanceName"] = json!("unbound");
    assert_eq!(h.ingest(payload).await, Outcome::Skipped(SkipReason::NoInbox));
}

#[tokio::test]
async fn unknown_inbox_id_is_skipped() {
    let h = Harness::new().await;

    let outcome = h
        .ingest(json!({"chatid": "4@x", "text": "hi", "messageid": "R1", "inbox_id": "gone"}))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoInbox));
    assert_eq!(outcome.to_json()["ok"], true);
    assert_eq!(message::count_messages(h.db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn structural_errors_are_reported() {
    let h = Harness::new().await;

    let err = h
        .pipeline
        .ingest(json!({"EventType": "messages", "instanceName": "acct1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingMessage(_)));
    assert!(err.is_client_error());

    let err = h
        .pipeline
        .ingest(json!({"EventType": "messages", "message": {"chatid": "1@x", "text": "hi"}}))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingInstance));
}

#[tokio::test]
async fn contact_name_is_never_overwritten() {
    let h = Harness::new().await;

    h.ingest(event(json!({"chatid": "1@x", "messageid": "N1", "senderName": "Alice", "text": "a"}))).await;
    h.ingest(event(json!({"chatid": "1@x", "messageid": "N2", "senderName": "Mallory", "text": "b"}))).await;

    let stored = contact::find_contact_by_jid(h.db.pool(), "1@x").await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn missing_contact_name_is_backfilled() {
    let h = Harness::new().await;

    h.ingest(event(json!({"chatid": "2@x", "messageid": "B1", "text": "a"}))).await;
    let stored = contact::find_contact_by_jid(h.db.pool(), "2@x").await.unwrap().unwrap();
    assert_eq!(stored.name, None);

    h.ingest(event(json!({"chatid": "2@x", "messageid": "B2", "pushName": "Bob", "text": "b"}))).await;
    let stored = contact::find_contact_by_jid(h.db.pool(), "2@x").await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn open_conversation_is_reused_and_resolved_one_is_not() {
    let h = Harness::new().await;

    let Outcome::Stored { conversation_id: first, .. } =
        h.ingest(event(json!({"chatid": "3@x", "messageid": "C1", "text": "a"}))).await
    else {
        panic!("expected stored");
    };
    let Outcome::Stored { conversation_id: second, .. } =
        h.ingest(event(json!({"chatid": "3@x", "messageid": "C2", "text": "b"}))).await
    else {
        panic!("expected stored");
    };
    assert_eq!(first, second);

    conversation::set_status(h.db.pool(), &first, ConversationStatus::Resolved).await.unwrap();
    let Outcome::Stored { conversation_id: third, .. } =
        h.ingest(event(json!({"chatid": "3@x", "messageid": "C3", "text": "c"}))).await
    else {
        panic!("expected stored");
    };
    assert_ne!(first, third);
}

#[tokio::test]
async fn raw_agent_message_is_stored_as_outgoing() {
    let h = Harness::new().await;
    let Outcome::Stored { conversation_id: opened, .. } =
        h.ingest(event(json!({"chatid": "4@x", "messageid": "R0", "text": "hi"}))).await
    else {
        panic!("expected stored");
    };

    let outcome = h
        .ingest(json!({"chatid": "4@x", "text": "Agent reply", "messageid": "R1", "inbox_id": "inbox-1"}))
        .await;
    let Outcome::Stored { conversation_id, message_id } = outcome else {
        panic!("expected stored, got {:?}", outcome);
    };
    assert_eq!(conversation_id, opened);

    let msg = message::get_message(h.db.pool(), &message_id).await.unwrap();
    assert_eq!(msg.direction, Direction::Outgoing);
    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.last_message_preview.as_deref(), Some("Agent reply"));
}

#[tokio::test]
async fn status_only_update_never_creates_a_message() {
    let h = Harness::new().await;
    let Outcome::Stored { conversation_id, .. } =
        h.ingest(event(json!({"chatid": "5@x", "messageid": "S1", "text": "hi"}))).await
    else {
        panic!("expected stored");
    };

    let outcome = h
        .ingest(json!({"status_ia": "desligada", "chatid": "5@x", "instanceName": "acct1"}))
        .await;
    assert_eq!(
        outcome,
        Outcome::StatusOnly {
            conversation_id: conversation_id.clone(),
            enabled: false
        }
    );
    assert_eq!(outcome.to_json()["reason"], "status_ia_updated");
    assert_eq!(message::count_messages(h.db.pool()).await.unwrap(), 1);

    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.assistant_enabled, Some(false));
}

#[tokio::test]
async fn status_without_conversation_is_skipped() {
    let h = Harness::new().await;
    let outcome = h
        .ingest(json!({"status_ia": "ligada", "chatid": "6@x", "instanceName": "acct1"}))
        .await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::StatusIaNoConversation));
    assert_eq!(message::count_messages(h.db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn status_with_content_stores_message_and_flag() {
    let h = Harness::new().await;
    let outcome = h
        .ingest(json!({
            "status_ia": "ligada",
            "chatid": "7@x",
            "instanceName": "acct1",
            "text": "Assistant is on",
            "messageid": "ST1"
        }))
        .await;
    let Outcome::Stored { conversation_id, message_id } = outcome else {
        panic!("expected stored, got {:?}", outcome);
    };

    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.assistant_enabled, Some(true));
    let msg = message::get_message(h.db.pool(), &message_id).await.unwrap();
    assert_eq!(msg.direction, Direction::Outgoing);
    assert!(h.publisher.events().iter().all(|e| e.payload["status_ia"] == true));
}

#[tokio::test]
async fn status_with_content_on_open_conversation() {
    let h = Harness::new().await;
    let Outcome::Stored { conversation_id: opened, .. } =
        h.ingest(event(json!({"chatid": "12@x", "messageid": "O1", "text": "hi"}))).await
    else {
        panic!("expected stored");
    };

    let outcome = h
        .ingest(json!({
            "status_ia": "desligada",
            "chatid": "12@x",
            "instanceName": "acct1",
            "text": "Handing over",
            "messageid": "ST2"
        }))
        .await;
    let Outcome::Stored { conversation_id, .. } = outcome else {
        panic!("expected stored, got {:?}", outcome);
    };
    assert_eq!(conversation_id, opened);

    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.assistant_enabled, Some(false));
    assert_eq!(conv.last_message_preview.as_deref(), Some("Handing over"));
}

#[tokio::test]
async fn group_chats_are_skipped() {
    let h = Harness::new().await;
    let outcome = h.ingest(event(json!({"chatid": "120363@g.us", "messageid": "G1", "text": "hi"}))).await;
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Group));
}

#[tokio::test]
async fn media_link_failure_still_persists() {
    let h = Harness::with_source(MockMediaSource::new().failing_links().failing_fetch()).await;

    let outcome = h
        .ingest(event(json!({
            "chatid": "8@x",
            "messageid": "IMG1",
            "mediaType": "image",
            "fileURL": "https://mmg.test/transient"
        })))
        .await;
    let Outcome::Stored { message_id, conversation_id } = outcome else {
        panic!("expected stored, got {:?}", outcome);
    };

    let msg = message::get_message(h.db.pool(), &message_id).await.unwrap();
    assert_eq!(msg.media_type, MediaType::Image);
    assert_eq!(msg.media_url.as_deref(), Some("https://mmg.test/transient"));
    let conv = conversation::get_conversation(h.db.pool(), &conversation_id).await.unwrap();
    assert_eq!(conv.last_message_preview.as_deref(), Some("📷 Image"));
}

#[tokio::test]
async fn image_is_rehosted_to_owned_storage() {
    let source = MockMediaSource::new().with_link("IMG2", "https://provider.test/img2", "image/png");
    let h = Harness::with_source(source).await;

    let outcome = h
        .ingest(event(json!({"chatid": "9@x", "messageid": "IMG2", "mediaType": "image"})))
        .await;
    let Outcome::Stored { message_id, .. } = outcome else {
        panic!("expected stored");
    };

    let msg = message::get_message(h.db.pool(), &message_id).await.unwrap();
    assert!(msg.media_url.unwrap().starts_with(MockObjectStore::PUBLIC_BASE));
    assert_eq!(h.store.uploads().len(), 1);
    assert_eq!(h.source.requests()[0].token, "tok-1");
}

#[tokio::test]
async fn duplicate_media_is_not_refetched() {
    let source = MockMediaSource::new().with_link("IMG3", "https://provider.test/img3", "image/png");
    let h = Harness::with_source(source).await;
    let payload = event(json!({"chatid": "9@x", "messageid": "IMG3", "mediaType": "image"}));

    h.ingest(payload.clone()).await;
    h.ingest(payload).await;

    assert_eq!(h.source.requests().len(), 1);
    assert_eq!(h.store.uploads().len(), 1);
}

#[tokio::test]
async fn incoming_audio_is_transcribed_not_rehosted() {
    let source = MockMediaSource::new().with_link("AUD1", "https://provider.test/a.mp3", "audio/mpeg");
    let h = Harness::with_source(source).await;

    let outcome = h
        .ingest(event(json!({"chatid": "10@x", "messageid": "AUD1", "mediaType": "ptt"})))
        .await;
    let Outcome::Stored { message_id, conversation_id } = outcome else {
        panic!("expected stored");
    };

    assert!(h.store.uploads().is_empty());
    let jobs = h.transcriber.requests();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].message_id, message_id);
    assert_eq!(jobs[0].conversation_id, conversation_id);
    assert_eq!(jobs[0].audio_url, "https://provider.test/a.mp3");
}

#[tokio::test]
async fn incoming_contacts_land_in_lead_list() {
    let h = Harness::new().await;
    h.ingest(event(json!({"chatid": "5511777@x", "messageid": "L1", "text": "hi"}))).await;
    h.ingest(event(json!({"chatid": "5511777@x", "messageid": "L2", "senderName": "Carol", "text": "again"}))).await;

    let list = lead_list::ensure_list(h.db.pool(), "inst-1", "leads").await.unwrap();
    let leads = lead_list::list_leads(h.db.pool(), &list.id).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].phone, "5511777");
    assert_eq!(leads[0].name.as_deref(), Some("Carol"));
}
