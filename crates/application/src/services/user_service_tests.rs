//! 用户服务单元测试
//!
//! 覆盖注册、激活、资料更新、改密以及注销时的级联清理。

#[cfg(test)]
mod user_service_tests {
    use std::sync::Arc;

    use crate::error::{ApplicationError, ErrorKind};
    use crate::identity::Actor;
    use crate::mail::{MailError, MockMailer};
    use crate::services::*;
    use crate::testing::*;
    use domain::UserName;

    fn register_request(name: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            user_name: name.to_owned(),
            email: format!("{name}@example.com"),
            password: TEST_PASSWORD.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_sends_activation_mail() {
        let app = TestApp::new();

        let name = app
            .services
            .users
            .register(register_request("alice"))
            .await
            .unwrap();
        assert_eq!(name.as_str(), "alice");

        let user = app.user("alice");
        assert!(!user.email_verified);
        let mail = app.mailer.last_to("alice@example.com").unwrap();
        assert!(mail
            .body
            .contains(&format!("/alice/{}", user.activation_key)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_name_and_email() {
        let app = TestApp::new();
        app.services
            .users
            .register(register_request("alice"))
            .await
            .unwrap();

        let same_name = app
            .services
            .users
            .register(RegisterUserRequest {
                email: "other@example.com".to_owned(),
                ..register_request("alice")
            })
            .await
            .unwrap_err();
        assert!(matches!(same_name, ApplicationError::DuplicateData));
        assert_eq!(same_name.kind(), ErrorKind::Conflict);

        let same_email = app
            .services
            .users
            .register(RegisterUserRequest {
                email: "alice@example.com".to_owned(),
                ..register_request("bob")
            })
            .await
            .unwrap_err();
        assert!(matches!(same_email, ApplicationError::DuplicateData));
        assert_eq!(app.store.snapshot().users.len(), 1);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let app = TestApp::new();
        let err = app
            .services
            .users
            .register(RegisterUserRequest {
                password: "short".to_owned(),
                ..register_request("alice")
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err = app
            .services
            .users
            .register(register_request("bad name"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mail_failure_rolls_back_registration() {
        let app = TestApp::new();
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(MailError::Delivery("smtp down".to_owned())));
        let services = app.services_with(Arc::new(mailer), app.storage.clone());

        let err = services
            .users
            .register(register_request("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(app.store.snapshot().users.is_empty());
    }

    #[tokio::test]
    async fn test_activate_only_once_with_matching_key() {
        let app = TestApp::new();
        app.services
            .users
            .register(register_request("alice"))
            .await
            .unwrap();
        let key = app.user("alice").activation_key.to_string();

        let wrong = app
            .services
            .users
            .activate(ActivateUserRequest {
                user_name: "alice".to_owned(),
                activation_key: domain::ActivationKey::generate().to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, ApplicationError::UserActivationNotFound));

        app.services
            .users
            .activate(ActivateUserRequest {
                user_name: "alice".to_owned(),
                activation_key: key.clone(),
            })
            .await
            .unwrap();
        assert!(app.user("alice").email_verified);

        let again = app
            .services
            .users
            .activate(ActivateUserRequest {
                user_name: "alice".to_owned(),
                activation_key: key,
            })
            .await
            .unwrap_err();
        assert!(matches!(again, ApplicationError::UserActivationNotFound));
    }

    #[tokio::test]
    async fn test_get_profile_of_other_user() {
        let app = TestApp::new();
        let alice = app.register_active_user("alice").await;
        app.register_active_user("bob").await;

        let profile = app.services.users.get_profile(&alice, "bob").await.unwrap();
        assert_eq!(profile.user_name, "bob");
        assert_eq!(profile.posting_count, 0);

        let missing = app
            .services
            .users
            .get_profile(&alice, "nobody")
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_get_profile_with_vanished_token_user() {
        let app = TestApp::new();
        app.register_active_user("bob").await;
        let ghost = Actor::new(UserName::parse("ghost").unwrap());

        let err = app.services.users.get_profile(&ghost, "bob").await.unwrap_err();
        assert!(matches!(err, ApplicationError::TokenUserNotFound));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_update_own_profile_and_icon() {
        let app = TestApp::new();
        let alice = app.register_active_user("alice").await;

        app.services
            .users
            .update(
                &alice,
                UpdateUserRequest {
                    user_name: "alice".to_owned(),
                    icon: Some(png_base64()),
                    self_introduction: Some("  hello there ".to_owned()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .unwrap();

        let user = app.user("alice");
        assert_eq!(user.self_introduction, "hello there");
        assert!(user.icon.ends_with("icons/alice"));
        assert!(app.storage.contains("icons", "alice"));
    }

    #[tokio::test]
    async fn test_update_other_account_is_forbidden() {
        let app = TestApp::new();
        let alice = app.register_active_user("alice").await;
        app.register_active_user("bob").await;

        let err = app
            .services
            .users
            .update(
                &alice,
                UpdateUserRequest {
                    user_name: "bob".to_owned(),
                    self_introduction: Some("hacked".to_owned()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(app.user("bob").self_introduction, "");
    }

    #[tokio::test]
    async fn test_guest_cannot_update() {
        let app = TestApp::new();
        let guest = app.register_active_user("guest").await;

        let err = app
            .services
            .users
            .update(
                &guest,
                UpdateUserRequest {
                    user_name: "guest".to_owned(),
                    self_introduction: Some("hi".to_owned()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::GuestForbidden));
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let app = TestApp::new();
        let alice = app.register_active_user("alice").await;

        let err = app
            .services
            .users
            .change_password(
                &alice,
                ChangePasswordRequest {
                    old_password: "Wrong12345".to_owned(),
                    new_password: "Another1234".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotCorrectPassword));

        app.services
            .users
            .change_password(
                &alice,
                ChangePasswordRequest {
                    old_password: TEST_PASSWORD.to_owned(),
                    new_password: "Another1234".to_owned(),
                },
            )
            .await
            .unwrap();

        let login = app
            .services
            .auth
            .login(LoginRequest {
                email: "alice@example.com".to_owned(),
                password: "Another1234".to_owned(),
            })
            .await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_cleans_every_relation() {
        let app = TestApp::new();
        let alice = app.register_active_user("alice").await;
        let bob = app.register_active_user("bob").await;
        let carol = app.register_active_user("carol").await;

        let alice_posting = app.create_posting(&alice, "alice cat").await;
        let bob_posting = app.create_posting(&bob, "bob cat").await;

        app.services.likes.register(&bob, alice_posting).await.unwrap();
        app.services.likes.register(&carol, alice_posting).await.unwrap();
        app.services.likes.register(&alice, bob_posting).await.unwrap();
        app.services
            .comments
            .register(
                &bob,
                RegisterCommentRequest {
                    posting_id: alice_posting,
                    comment: "so cute".to_owned(),
                },
            )
            .await
            .unwrap();
        app.services
            .comments
            .register(
                &alice,
                RegisterCommentRequest {
                    posting_id: bob_posting,
                    comment: "thanks".to_owned(),
                },
            )
            .await
            .unwrap();
        app.services.follows.register(&alice, "bob").await.unwrap();
        app.services.follows.register(&carol, "alice").await.unwrap();
        app.services
            .reports
            .report_user(&bob, "alice", "spam".to_owned())
            .await
            .unwrap();
        app.services
            .reports
            .report_posting(&carol, alice_posting, "not a cat".to_owned())
            .await
            .unwrap();
        app.services
            .password_resets
            .send_reset_email(PasswordResetEmailRequest {
                email: "alice@example.com".to_owned(),
            })
            .await
            .unwrap();

        app.services.users.delete(&alice, "alice").await.unwrap();

        let state = app.store.snapshot();
        assert!(state.user_by_name("alice").is_none());
        assert_eq!(state.postings.len(), 1);
        assert!(state.likes.is_empty());
        assert_eq!(state.comments.len(), 0);
        assert!(state.follows.is_empty());
        assert!(state.user_reports.is_empty());
        assert!(state.posting_reports.is_empty());
        assert!(state.password_resets.is_empty());
        assert!(state.notifications.is_empty());

        let bob = app.user("bob");
        assert_eq!(bob.counters.like_count, 0);
        assert_eq!(bob.counters.liked_count, 0);
        assert_eq!(bob.counters.followed_count, 0);
        let carol = app.user("carol");
        assert_eq!(carol.counters.like_count, 0);
        assert_eq!(carol.counters.follow_count, 0);
        assert_eq!(state.postings[&bob_posting.0].liked_count, 0);

        let bob_image = &state.postings[&bob_posting.0].image_key;
        assert!(app.storage.contains("postings", bob_image));
        assert_eq!(app.storage.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_other_account_is_forbidden() {
        let app = TestApp::new();
        let alice = app.register_active_user("alice").await;
        app.register_active_user("bob").await;

        let err = app.services.users.delete(&alice, "bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(app.store.snapshot().users.len(), 2);
    }
}
