//! FeedService integration tests

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

use common::*;
use studyabout::backend::error::BackendError;
use studyabout::backend::feed::FeedService;
use studyabout::backend::images::LocalImageStore;
use studyabout::backend::log::LogService;
use studyabout::shared::feed::{CreateFeedRequest, FeedPage, FEED_PAGE_SIZE, LIKE_DISPLAY_LIMIT};
use studyabout::shared::{Identity, SharedError};

fn feed_service(pool: &SqlitePool, image_root: &std::path::Path) -> FeedService {
    FeedService::new(
        pool.clone(),
        Arc::new(LocalImageStore::new(image_root, "https://cdn.example.com")),
    )
}

fn feed_request(title: &str, feed_type: &str, type_id: Option<&str>) -> CreateFeedRequest {
    CreateFeedRequest {
        title: title.to_string(),
        text: format!("body of {}", title),
        feed_type: feed_type.to_string(),
        type_id: type_id.map(str::to_string),
        ..CreateFeedRequest::default()
    }
}

async fn create_feed(feeds: &FeedService, writer: &Identity, title: &str) -> String {
    feeds
        .create_feed(writer, feed_request(title, "study", None))
        .await
        .expect("Failed to create feed")
        .to_string()
}

#[tokio::test]
async fn test_pagination_splits_twenty_feeds() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;

    for i in 0..20 {
        create_feed(&feeds, &writer.identity, &format!("feed {}", i)).await;
    }

    let first = feeds
        .find_feed_by_type(&writer.identity, "study", None, FeedPage::new(Some(0), None))
        .await
        .unwrap();
    let second = feeds
        .find_feed_by_type(&writer.identity, "study", None, FeedPage::new(Some(1), None))
        .await
        .unwrap();

    assert_eq!(first.len(), FEED_PAGE_SIZE as usize);
    assert_eq!(second.len(), 8);

    let first_ids: HashSet<_> = first.iter().map(|f| f.id).collect();
    assert!(second.iter().all(|f| !first_ids.contains(&f.id)));

    // Oldest first unless the caller asks for recent
    assert_eq!(first[0].title, "feed 0");
    let recent = feeds
        .find_all_feeds(&writer.identity, FeedPage::new(None, Some(true)))
        .await
        .unwrap();
    assert_eq!(recent[0].title, "feed 19");
}

#[tokio::test]
async fn test_type_filter_ignores_blank_type_id() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;

    feeds.create_feed(&writer.identity, feed_request("a", "gather", Some("7"))).await.unwrap();
    feeds.create_feed(&writer.identity, feed_request("b", "gather", Some("8"))).await.unwrap();
    feeds.create_feed(&writer.identity, feed_request("c", "group", None)).await.unwrap();

    let page = || FeedPage::default();
    let narrowed = feeds
        .find_feed_by_type(&writer.identity, "gather", Some("7"), page())
        .await
        .unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed[0].title, "a");

    let blank = feeds
        .find_feed_by_type(&writer.identity, "gather", Some("  "), page())
        .await
        .unwrap();
    assert_eq!(blank.len(), 2);
}

#[tokio::test]
async fn test_toggle_like_twice_nets_one_point() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let fan = create_test_user(db.pool(), "fan").await;
    let feed_id = create_feed(&feeds, &writer.identity, "likeable").await;

    let liked = feeds.toggle_like(&fan.identity, &feed_id).await.unwrap();
    assert!(liked.liked);
    assert_eq!(liked.like_cnt, 1);
    assert_eq!(points_of(db.pool(), writer.id()).await, 2);

    let unliked = feeds.toggle_like(&fan.identity, &feed_id).await.unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.like_cnt, 0);

    assert_eq!(points_of(db.pool(), writer.id()).await, 1);
    assert_eq!(points_of(db.pool(), fan.id()).await, 0);
    assert!(feeds.find_feed_like_by_id(&feed_id).await.unwrap().is_empty());

    let log = LogService::new(db.pool().clone())
        .get_log(&writer.identity, "point")
        .await
        .unwrap();
    let values: Vec<_> = log.iter().map(|entry| entry.meta.value).collect();
    assert_eq!(values, vec![2, -1]);
}

#[tokio::test]
async fn test_like_display_puts_caller_first() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let feed_id = create_feed(&feeds, &writer.identity, "popular").await;

    let likers = create_test_users(db.pool(), "liker", 10).await;
    let mut last = None;
    for liker in &likers {
        last = Some(feeds.toggle_like(&liker.identity, &feed_id).await.unwrap());
    }

    let caller = &likers[8];
    let view = feeds.find_feed_by_id(&caller.identity, &feed_id).await.unwrap();

    assert_eq!(view.like_cnt, 10);
    assert_eq!(last.map(|toggle| toggle.like_cnt), Some(view.like_cnt));
    let view_json = serde_json::to_value(&view).unwrap();
    let toggle_json = serde_json::to_value(last.unwrap()).unwrap();
    assert_eq!(view_json["likeCnt"], toggle_json["likeCnt"]);
    assert_eq!(view.like.len(), LIKE_DISPLAY_LIMIT);
    assert_eq!(view.like[0].uid, caller.uid());
    let rest: Vec<_> = view.like[1..].iter().map(|u| u.uid.clone()).collect();
    let expected: Vec<_> = likers[..7].iter().map(|u| u.uid().to_string()).collect();
    assert_eq!(rest, expected);

    let outsider = feeds.find_feed_by_id(&writer.identity, &feed_id).await.unwrap();
    let shown: Vec<_> = outsider.like.iter().map(|u| u.uid.clone()).collect();
    let first_eight: Vec<_> = likers[..8].iter().map(|u| u.uid().to_string()).collect();
    assert_eq!(shown, first_eight);

    let all = feeds.find_feed_like_by_id(&feed_id).await.unwrap();
    assert_eq!(all.len(), 10);
}

#[tokio::test]
async fn test_comment_pays_author_with_log() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let commenter = create_test_user(db.pool(), "commenter").await;
    let feed_id = create_feed(&feeds, &writer.identity, "discussion").await;

    feeds.create_comment(&commenter.identity, &feed_id, "nice").await.unwrap();

    assert_eq!(points_of(db.pool(), commenter.id()).await, 2);
    assert_eq!(points_of(db.pool(), writer.id()).await, 0);
    assert_eq!(db.count("logs").await, 1);

    let view = feeds.find_feed_by_id(&writer.identity, &feed_id).await.unwrap();
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].comment, "nice");
    assert_eq!(view.comments[0].user.uid, commenter.uid());
}

#[tokio::test]
async fn test_comment_on_missing_feed_changes_nothing() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let commenter = create_test_user(db.pool(), "commenter").await;

    let missing = uuid::Uuid::new_v4().to_string();
    let result = feeds.create_comment(&commenter.identity, &missing, "hello?").await;
    assert_matches!(result, Err(BackendError::NotFound { entity: "feed", .. }));

    assert_eq!(points_of(db.pool(), commenter.id()).await, 0);
    assert_eq!(db.count("comments").await, 0);
    assert_eq!(db.count("logs").await, 0);
}

#[tokio::test]
async fn test_malformed_ids_are_validation_errors() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let caller = create_test_user(db.pool(), "caller").await;

    let result = feeds.find_feed_by_id(&caller.identity, "64f1c0ffee").await;
    assert_matches!(
        result,
        Err(BackendError::SharedError(SharedError::ValidationError { .. }))
    );

    let result = feeds.toggle_like(&caller.identity, "not-an-id").await;
    assert_matches!(result, Err(BackendError::SharedError(_)));
}

#[tokio::test]
async fn test_missing_feed_is_not_found() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let caller = create_test_user(db.pool(), "caller").await;

    let missing = uuid::Uuid::new_v4().to_string();
    let result = feeds.find_feed_by_id(&caller.identity, &missing).await;
    assert_matches!(result, Err(ref e) if e.is_not_found());
}

#[tokio::test]
async fn test_comment_like_is_idempotent() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let fan = create_test_user(db.pool(), "fan").await;
    let feed_id = create_feed(&feeds, &writer.identity, "thread").await;
    let comment_id = feeds
        .create_comment(&writer.identity, &feed_id, "first")
        .await
        .unwrap()
        .to_string();

    feeds.create_comment_like(&fan.identity, &feed_id, &comment_id).await.unwrap();
    feeds.create_comment_like(&fan.identity, &feed_id, &comment_id).await.unwrap();

    let view = feeds.find_feed_by_id(&writer.identity, &feed_id).await.unwrap();
    assert_eq!(view.comments[0].like_list, vec![fan.id()]);

    feeds.delete_comment_like(&fan.identity, &feed_id, &comment_id).await.unwrap();
    feeds.delete_comment_like(&fan.identity, &feed_id, &comment_id).await.unwrap();

    let view = feeds.find_feed_by_id(&writer.identity, &feed_id).await.unwrap();
    assert!(view.comments[0].like_list.is_empty());
}

#[tokio::test]
async fn test_sub_comment_tree_and_likes() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let replier = create_test_user(db.pool(), "replier").await;
    let feed_id = create_feed(&feeds, &writer.identity, "thread").await;
    let comment_id = feeds
        .create_comment(&writer.identity, &feed_id, "question")
        .await
        .unwrap()
        .to_string();

    let sub_id = feeds
        .create_sub_comment(&replier.identity, &feed_id, &comment_id, "answer")
        .await
        .unwrap()
        .to_string();
    feeds
        .create_sub_comment_like(&writer.identity, &feed_id, &comment_id, &sub_id)
        .await
        .unwrap();
    feeds
        .update_sub_comment(&replier.identity, &feed_id, &comment_id, &sub_id, "better answer")
        .await
        .unwrap();

    let view = feeds.find_feed_by_id(&writer.identity, &feed_id).await.unwrap();
    let sub = &view.comments[0].sub_comments[0];
    assert_eq!(sub.comment, "better answer");
    assert_eq!(sub.user.uid, replier.uid());
    assert_eq!(sub.like_list, vec![writer.id()]);

    feeds
        .delete_sub_comment_like(&writer.identity, &feed_id, &comment_id, &sub_id)
        .await
        .unwrap();
    feeds
        .delete_sub_comment(&replier.identity, &feed_id, &comment_id, &sub_id)
        .await
        .unwrap();
    let view = feeds.find_feed_by_id(&writer.identity, &feed_id).await.unwrap();
    assert!(view.comments[0].sub_comments.is_empty());
}

#[tokio::test]
async fn test_path_segments_must_belong_together() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let feed_a = create_feed(&feeds, &writer.identity, "a").await;
    let feed_b = create_feed(&feeds, &writer.identity, "b").await;
    let comment_on_a = feeds
        .create_comment(&writer.identity, &feed_a, "on a")
        .await
        .unwrap()
        .to_string();

    let result = feeds.create_comment_like(&writer.identity, &feed_b, &comment_on_a).await;
    assert_matches!(result, Err(BackendError::NotFound { entity: "comment", .. }));

    let result = feeds
        .create_sub_comment_like(
            &writer.identity,
            &feed_a,
            &comment_on_a,
            &uuid::Uuid::new_v4().to_string(),
        )
        .await;
    assert_matches!(result, Err(BackendError::NotFound { entity: "subComment", .. }));
}

#[tokio::test]
async fn test_only_author_edits_comment() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let author = create_test_user(db.pool(), "author").await;
    let stranger = create_test_user(db.pool(), "stranger").await;
    let feed_id = create_feed(&feeds, &author.identity, "mine").await;
    let comment_id = feeds
        .create_comment(&author.identity, &feed_id, "original")
        .await
        .unwrap()
        .to_string();

    let result = feeds
        .update_comment(&stranger.identity, &feed_id, &comment_id, "hijacked")
        .await;
    assert_matches!(result, Err(BackendError::Forbidden { .. }));
    let result = feeds.delete_comment(&stranger.identity, &feed_id, &comment_id).await;
    assert_matches!(result, Err(BackendError::Forbidden { .. }));

    feeds
        .update_comment(&author.identity, &feed_id, &comment_id, "edited")
        .await
        .unwrap();
    let view = feeds.find_feed_by_id(&author.identity, &feed_id).await.unwrap();
    assert_eq!(view.comments[0].comment, "edited");
}

#[tokio::test]
async fn test_delete_comment_removes_sub_comments() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let author = create_test_user(db.pool(), "author").await;
    let feed_id = create_feed(&feeds, &author.identity, "mine").await;
    let comment_id = feeds
        .create_comment(&author.identity, &feed_id, "parent")
        .await
        .unwrap()
        .to_string();
    feeds
        .create_sub_comment(&author.identity, &feed_id, &comment_id, "child")
        .await
        .unwrap();

    feeds.delete_comment(&author.identity, &feed_id, &comment_id).await.unwrap();

    assert_eq!(db.count("comments").await, 0);
    assert_eq!(db.count("sub_comments").await, 0);
}

#[tokio::test]
async fn test_create_feed_uploads_images() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;

    let mut request = feed_request("with pictures", "study", None);
    request.buffers = vec![b"\x89PNG\r\n\x1a\n".to_vec(), vec![0xFF, 0xD8, 0xFF, 0xE0]];
    let id = feeds.create_feed(&writer.identity, request).await.unwrap();

    let view = feeds.find_feed_by_id(&writer.identity, &id.to_string()).await.unwrap();
    assert_eq!(view.images.len(), 2);
    assert!(view.images[0].starts_with("https://cdn.example.com/feed/"));
    assert!(view.images[1].ends_with(".jpg"));
    assert_eq!(view.writer.uid, writer.uid());
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let db = TestDatabase::new().await;
    let images = tempfile::tempdir().unwrap();
    let feeds = feed_service(db.pool(), images.path());
    let writer = create_test_user(db.pool(), "writer").await;
    let feed_id = create_feed(&feeds, &writer.identity, "quiet").await;

    let result = feeds.create_comment(&writer.identity, &feed_id, "   ").await;
    assert_matches!(result, Err(BackendError::SharedError(_)));
    assert_eq!(points_of(db.pool(), writer.id()).await, 0);
}
