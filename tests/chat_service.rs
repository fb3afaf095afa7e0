//! ChatService integration tests

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

use common::*;
use studyabout::backend::chat::ChatService;
use studyabout::backend::error::BackendError;
use studyabout::backend::push::Notifier;
use studyabout::shared::chat::{CreateChatRequest, RecentChat};
use studyabout::shared::notification::{PushChannel, SubscribeRequest};

struct ChatFixture {
    chat: ChatService,
    web: RecordingBackend,
    fcm: RecordingBackend,
    web_service: studyabout::backend::push::PushService,
    fcm_service: studyabout::backend::push::PushService,
}

fn chat_fixture(pool: &SqlitePool) -> ChatFixture {
    let (web_service, web) = recording_service(pool, PushChannel::Web);
    let (fcm_service, fcm) = recording_service(pool, PushChannel::Fcm);
    let notifier = Notifier::new(web_service.clone(), Some(fcm_service.clone()));
    ChatFixture {
        chat: ChatService::new(pool.clone(), notifier),
        web,
        fcm,
        web_service,
        fcm_service,
    }
}

fn message_to(user: &TestUser, message: &str) -> CreateChatRequest {
    CreateChatRequest {
        to_user_id: user.id().to_string(),
        message: message.to_string(),
    }
}

fn endpoint(url: &str) -> SubscribeRequest {
    SubscribeRequest {
        endpoint: url.to_string(),
        keys: None,
    }
}

#[tokio::test]
async fn test_both_sides_share_one_thread() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    fixture
        .chat
        .create_chat(&alice.identity, message_to(&bob, "hi bob"))
        .await
        .unwrap()
        .await
        .unwrap();
    fixture
        .chat
        .create_chat(&bob.identity, message_to(&alice, "hi alice"))
        .await
        .unwrap()
        .await
        .unwrap();

    assert_eq!(db.count("chats").await, 1);

    let from_alice = fixture
        .chat
        .get_chat(&alice.identity, &bob.id().to_string())
        .await
        .unwrap()
        .expect("thread should exist");
    let from_bob = fixture
        .chat
        .get_chat(&bob.identity, &alice.id().to_string())
        .await
        .unwrap()
        .expect("thread should exist");

    assert_eq!(from_alice.opponent.uid, "bob");
    assert_eq!(from_bob.opponent.uid, "alice");
    assert_eq!(from_alice.contents, from_bob.contents);

    let texts: Vec<_> = from_alice.contents.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(texts, vec!["hi bob", "hi alice"]);
    assert_eq!(from_alice.contents[0].user_id, alice.id());

    assert_eq!(
        fixture.chat.chat_id_between(alice.id(), bob.id()).await.unwrap(),
        fixture.chat.chat_id_between(bob.id(), alice.id()).await.unwrap()
    );
}

#[tokio::test]
async fn test_get_chat_without_history_is_none() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    let thread = fixture
        .chat
        .get_chat(&alice.identity, &bob.id().to_string())
        .await
        .unwrap();
    assert!(thread.is_none());
}

#[tokio::test]
async fn test_unknown_recipient_is_not_found() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;

    let request = CreateChatRequest {
        to_user_id: uuid::Uuid::new_v4().to_string(),
        message: "anyone there?".to_string(),
    };
    let result = fixture.chat.create_chat(&alice.identity, request).await;

    assert_matches!(result, Err(BackendError::NotFound { entity: "user", .. }));
    assert_eq!(db.count("chats").await, 0);
    assert_eq!(db.count("chat_contents").await, 0);
}

#[tokio::test]
async fn test_messaging_yourself_is_rejected() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;

    let result = fixture
        .chat
        .create_chat(&alice.identity, message_to(&alice, "note to self"))
        .await;
    assert_matches!(result, Err(BackendError::SharedError(_)));

    let result = fixture
        .chat
        .create_chat(&alice.identity, CreateChatRequest {
            to_user_id: "bob".to_string(),
            message: "hi".to_string(),
        })
        .await;
    assert_matches!(result, Err(BackendError::SharedError(_)));
}

#[tokio::test]
async fn test_previews_newest_first() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;
    let carol = create_test_user(db.pool(), "carol").await;

    let send = |from: &TestUser, to: &TestUser, text: &str| {
        let chat = fixture.chat.clone();
        let identity = from.identity.clone();
        let request = message_to(to, text);
        async move { chat.create_chat(&identity, request).await.unwrap().await.unwrap() }
    };

    send(&alice, &bob, "first").await;
    send(&carol, &alice, "second").await;

    let previews = fixture.chat.get_chats(&alice.identity).await.unwrap();
    let order: Vec<_> = previews.iter().map(|p| p.user.uid.as_str()).collect();
    assert_eq!(order, vec!["carol", "bob"]);
    assert_eq!(previews[0].content.as_ref().unwrap().content, "second");

    send(&bob, &alice, "third").await;
    let previews = fixture.chat.get_chats(&alice.identity).await.unwrap();
    let order: Vec<_> = previews.iter().map(|p| p.user.uid.as_str()).collect();
    assert_eq!(order, vec!["bob", "carol"]);

    assert!(fixture.chat.get_chats(&create_test_user(db.pool(), "dave").await.identity)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_recent_chat_sentinel() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    assert_eq!(fixture.chat.get_recent_chat(&alice.identity).await.unwrap(), RecentChat::NoChat);
    assert_eq!(
        serde_json::to_value(RecentChat::NoChat).unwrap(),
        serde_json::json!("no chat")
    );

    fixture
        .chat
        .create_chat(&alice.identity, message_to(&bob, "hello"))
        .await
        .unwrap()
        .await
        .unwrap();

    let chat_id = fixture
        .chat
        .chat_id_between(alice.id(), bob.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        fixture.chat.get_recent_chat(&bob.identity).await.unwrap(),
        RecentChat::Found(chat_id)
    );
}

#[tokio::test]
async fn test_message_notifies_every_channel() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    fixture.web_service.subscribe(&bob.identity, endpoint("https://push.example.com/bob")).await.unwrap();
    fixture.fcm_service.subscribe(&bob.identity, endpoint("fcm-token-bob")).await.unwrap();

    let report = fixture
        .chat
        .create_chat(&alice.identity, message_to(&bob, "are you coming?"))
        .await
        .unwrap()
        .await
        .unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 2);

    let web = fixture.web.deliveries_to("bob");
    let fcm = fixture.fcm.deliveries_to("bob");
    assert_eq!(web.len(), 1);
    assert_eq!(fcm.len(), 1);
    assert_eq!(web[0].title, "You received a message!");
    assert_eq!(web[0].body, "are you coming?");
    assert!(fixture.web.deliveries_to("alice").is_empty());
}

#[tokio::test]
async fn test_failed_channel_does_not_block_the_other() {
    let db = TestDatabase::new().await;
    let fixture = chat_fixture(db.pool());
    let alice = create_test_user(db.pool(), "alice").await;
    let bob = create_test_user(db.pool(), "bob").await;

    fixture.web_service.subscribe(&bob.identity, endpoint("https://push.example.com/bob")).await.unwrap();
    fixture.fcm_service.subscribe(&bob.identity, endpoint("fcm-token-bob")).await.unwrap();
    fixture.fcm.fail_endpoint("fcm-token-bob", 500);

    let report = fixture
        .chat
        .create_chat(&alice.identity, message_to(&bob, "ping"))
        .await
        .expect("send succeeds even when a channel fails")
        .await
        .unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(fixture.web.deliveries_to("bob").len(), 1);
    assert_eq!(db.count("chat_contents").await, 1);
}
