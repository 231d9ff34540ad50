//! 投稿服务单元测试

use std::sync::Arc;

use chrono::Duration;

use crate::error::{ApplicationError, ErrorKind};
use crate::services::{ListPostingsRequest, RegisterPostingRequest};
use crate::storage::{MockObjectStorage, StorageError, StoredObject};
use crate::testing::*;
use domain::PostingId;

#[tokio::test]
async fn test_register_posting_stores_image_and_counts() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;

    let posting = app
        .services
        .postings
        .register(
            &alice,
            RegisterPostingRequest {
                title: "sleeping cat".to_owned(),
                image: format!("data:image/png;base64,{}", png_base64()),
            },
        )
        .await
        .unwrap();

    assert!(posting.image_key.ends_with("_alice.png"));
    assert!(app.storage.contains("postings", &posting.image_key));
    assert_eq!(app.user("alice").counters.posting_count, 1);
}

#[tokio::test]
async fn test_register_posting_rejects_bad_image() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;

    let err = app
        .services
        .postings
        .register(
            &alice,
            RegisterPostingRequest {
                title: "sleeping cat".to_owned(),
                image: "bm90IGFuIGltYWdl".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn test_list_is_newest_first_with_liked_flag() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    let bob = app.register_active_user("bob").await;
    let first = app.create_posting(&alice, "first").await;
    let second = app.create_posting(&alice, "second").await;
    app.services.likes.register(&bob, first).await.unwrap();

    let postings = app
        .services
        .postings
        .list(&bob, ListPostingsRequest::default())
        .await
        .unwrap();

    let ids: Vec<i64> = postings.iter().map(|p| p.posting_id).collect();
    assert_eq!(ids, vec![second.0, first.0]);
    assert!(!postings[0].liked);
    assert!(postings[1].liked);
    assert_eq!(postings[1].liked_count, 1);
}

#[tokio::test]
async fn test_list_pages_with_since_and_limit() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    for title in ["one", "two", "three"] {
        app.create_posting(&alice, title).await;
    }

    let first_page = app
        .services
        .postings
        .list(
            &alice,
            ListPostingsRequest {
                limit: Some(2),
                ..ListPostingsRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].title, "three");

    let next_page = app
        .services
        .postings
        .list(
            &alice,
            ListPostingsRequest {
                since_at: Some(first_page[1].uploaded_at),
                limit: Some(2),
                ..ListPostingsRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(next_page.len(), 1);
    assert_eq!(next_page[0].title, "one");

    let err = app
        .services
        .postings
        .list(
            &alice,
            ListPostingsRequest {
                limit: Some(0),
                ..ListPostingsRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_list_filters_by_user() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    let bob = app.register_active_user("bob").await;
    app.create_posting(&alice, "alice cat").await;
    app.create_posting(&bob, "bob cat").await;

    let postings = app
        .services
        .postings
        .list(
            &alice,
            ListPostingsRequest {
                user_name: Some("bob".to_owned()),
                ..ListPostingsRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].user_name, "bob");
}

#[tokio::test]
async fn test_guest_can_list_but_not_post() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    let guest = app.register_active_user("guest").await;
    app.create_posting(&alice, "alice cat").await;

    let postings = app
        .services
        .postings
        .list(&guest, ListPostingsRequest::default())
        .await
        .unwrap();
    assert_eq!(postings.len(), 1);

    let err = app
        .services
        .postings
        .register(
            &guest,
            RegisterPostingRequest {
                title: "guest cat".to_owned(),
                image: png_base64(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApplicationError::GuestForbidden));
}

#[tokio::test]
async fn test_delete_posting_removes_relations_and_counters() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    let bob = app.register_active_user("bob").await;
    let posting = app.create_posting(&alice, "my cat").await;
    let image_key = app.store.snapshot().postings[&posting.0].image_key.clone();
    app.services.likes.register(&bob, posting).await.unwrap();
    app.services
        .comments
        .register(
            &bob,
            crate::services::RegisterCommentRequest {
                posting_id: posting,
                comment: "nice".to_owned(),
            },
        )
        .await
        .unwrap();
    app.services
        .reports
        .report_posting(&bob, posting, "duplicate".to_owned())
        .await
        .unwrap();

    app.services.postings.delete(&alice, posting).await.unwrap();

    let state = app.store.snapshot();
    assert!(state.postings.is_empty());
    assert!(state.likes.is_empty());
    assert!(state.comments.is_empty());
    assert!(state.posting_reports.is_empty());
    assert!(!app.storage.contains("postings", &image_key));
    let alice = app.user("alice");
    assert_eq!(alice.counters.posting_count, 0);
    assert_eq!(alice.counters.liked_count, 0);
    assert_eq!(app.user("bob").counters.like_count, 0);
}

#[tokio::test]
async fn test_delete_posting_of_other_user_is_forbidden() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    let bob = app.register_active_user("bob").await;
    let posting = app.create_posting(&alice, "my cat").await;

    let err = app.services.postings.delete(&bob, posting).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = app
        .services
        .postings
        .delete(&bob, PostingId(424242))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_image_delete_keeps_posting_hidden() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    let posting = app.create_posting(&alice, "my cat").await;

    let mut storage = MockObjectStorage::new();
    storage
        .expect_delete()
        .times(1)
        .returning(|_, _| Err(StorageError::Io(std::io::Error::other("bucket offline"))));
    let services = app.services_with(app.mailer.clone(), Arc::new(storage));

    let err = services.postings.delete(&alice, posting).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let state = app.store.snapshot();
    assert!(state.postings[&posting.0].deleting_at.is_some());
    let visible = app
        .services
        .postings
        .list(&alice, Default::default())
        .await
        .unwrap();
    assert!(visible.is_empty());

    // 存储恢复后重试即可完成删除
    app.services.postings.delete(&alice, posting).await.unwrap();
    assert!(app.store.snapshot().postings.is_empty());
}

#[tokio::test]
async fn test_upload_is_cleaned_when_insert_fails() {
    let app = TestApp::new();
    let alice = app.register_active_user("alice").await;
    app.clock.advance(Duration::seconds(1));
    let alice_id = app.user("alice").id;

    // 上传完成后作者被删除，插入投稿时违反外键
    let store = app.store.clone();
    let mut storage = MockObjectStorage::new();
    storage
        .expect_put()
        .times(1)
        .returning(move |bucket, key, _, _| {
            store.with_state(|state| state.users.remove(&alice_id.0));
            Ok(StoredObject {
                key: key.to_owned(),
                url: format!("memory://{bucket}/{key}"),
            })
        });
    storage.expect_delete().times(1).returning(|_, _| Ok(()));
    let services = app.services_with(app.mailer.clone(), Arc::new(storage));

    let err = services
        .postings
        .register(
            &alice,
            RegisterPostingRequest {
                title: "lost cat".to_owned(),
                image: png_base64(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(app.store.snapshot().postings.is_empty());
}
