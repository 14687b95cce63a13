use tutorlink_backend::modules::auth::interface::AuthError;
use tutorlink_backend::modules::auth::model::{CertificationStage, Platform, UserRole};
use tutorlink_backend::modules::auth::service::{LoginIdentifier, RegisterInput};

use crate::common::{test_password, TestHarness};

fn mobile_identifier() -> LoginIdentifier {
    LoginIdentifier::Mobile {
        country_code: "+91".to_string(),
        number: "1234567890".to_string(),
    }
}

#[tokio::test]
async fn register_tutor_then_login_with_mobile() {
    let harness = TestHarness::new();
    let registered = harness
        .register_tutor("+91", "1234567890", test_password())
        .await;

    assert_eq!(registered.user.role, UserRole::Tutor);
    assert_eq!(
        registered.user.certification_stage,
        Some(CertificationStage::NotStarted)
    );
    assert!(registered.user.last_login_at.is_some());
    assert!(registered.user.password_hash.is_none());

    let session = harness
        .auth
        .login(mobile_identifier(), test_password(), Some(Platform::Ios))
        .await
        .unwrap();

    assert_eq!(session.user.id, registered.user.id);
    assert!(session.user.password_hash.is_none());
    assert_eq!(session.tokens.expires_in, 24 * 60 * 60);
    // Registration and login each minted a session.
    assert_eq!(harness.session_rows.count(), 2);
}

#[tokio::test]
async fn admin_logs_in_with_email() {
    let harness = TestHarness::new();
    harness
        .register_admin("ops@tutorlink.example", test_password())
        .await;

    let session = harness
        .auth
        .login(
            LoginIdentifier::Email("ops@tutorlink.example".to_string()),
            test_password(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(session.user.role, UserRole::Admin);
    assert_eq!(session.user.certification_stage, None);
}

#[tokio::test]
async fn unknown_account_and_wrong_password_share_one_message() {
    let harness = TestHarness::new();
    harness
        .register_tutor("+91", "1234567890", test_password())
        .await;

    let unknown = harness
        .auth
        .login(
            LoginIdentifier::Email("nonexistent@x.com".to_string()),
            "whatever",
            None,
        )
        .await;
    let wrong = harness
        .auth
        .login(mobile_identifier(), "WrongPassword1!", None)
        .await;

    for result in [unknown, wrong] {
        match result {
            Err(AuthError::Authentication(message)) => {
                assert_eq!(message, "Invalid login credentials");
            }
            _ => panic!("expected authentication failure"),
        }
    }
}

#[tokio::test]
async fn inactive_account_is_reported_after_credentials_pass() {
    let harness = TestHarness::new();
    let registered = harness
        .register_tutor("+91", "1234567890", test_password())
        .await;
    harness.users.set_active(registered.user.id, false);

    // Wrong password on an inactive account: the generic message wins.
    match harness
        .auth
        .login(mobile_identifier(), "WrongPassword1!", None)
        .await
    {
        Err(AuthError::Authentication(message)) => {
            assert_eq!(message, "Invalid login credentials");
        }
        _ => panic!("expected authentication failure"),
    }

    match harness
        .auth
        .login(mobile_identifier(), test_password(), None)
        .await
    {
        Err(AuthError::Authentication(message)) => {
            assert_eq!(message, "Account is inactive");
        }
        _ => panic!("expected inactive-account failure"),
    }
}

#[tokio::test]
async fn duplicate_mobile_registration_conflicts() {
    let harness = TestHarness::new();
    harness
        .register_tutor("+91", "1234567890", test_password())
        .await;

    let result = harness
        .auth
        .register(RegisterInput {
            role: UserRole::Student,
            email: None,
            country_code: Some("+91".to_string()),
            mobile: Some("1234567890".to_string()),
            password: test_password().to_string(),
            platform: None,
        })
        .await;

    assert!(matches!(result, Err(AuthError::Conflict(_))));
}

#[tokio::test]
async fn duplicate_admin_email_conflicts() {
    let harness = TestHarness::new();
    harness
        .register_admin("ops@tutorlink.example", test_password())
        .await;

    let result = harness
        .auth
        .register(RegisterInput {
            role: UserRole::Admin,
            email: Some("ops@tutorlink.example".to_string()),
            country_code: None,
            mobile: None,
            password: test_password().to_string(),
            platform: None,
        })
        .await;

    assert!(matches!(result, Err(AuthError::Conflict(_))));
}

#[tokio::test]
async fn role_required_fields_are_enforced() {
    let harness = TestHarness::new();

    let admin_without_email = harness
        .auth
        .register(RegisterInput {
            role: UserRole::Admin,
            email: None,
            country_code: None,
            mobile: None,
            password: test_password().to_string(),
            platform: None,
        })
        .await;
    assert!(matches!(admin_without_email, Err(AuthError::Validation(_))));

    let tutor_without_mobile = harness
        .auth
        .register(RegisterInput {
            role: UserRole::Tutor,
            email: Some("tutor@tutorlink.example".to_string()),
            country_code: None,
            mobile: None,
            password: test_password().to_string(),
            platform: None,
        })
        .await;
    assert!(matches!(tutor_without_mobile, Err(AuthError::Validation(_))));

    let unknown_role = harness
        .auth
        .register(RegisterInput {
            role: UserRole::Unknown,
            email: Some("who@tutorlink.example".to_string()),
            country_code: None,
            mobile: None,
            password: test_password().to_string(),
            platform: None,
        })
        .await;
    assert!(matches!(unknown_role, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn refresh_resolves_the_owning_user() {
    let harness = TestHarness::new();
    let registered = harness
        .register_tutor("+91", "1234567890", test_password())
        .await;

    let refreshed = harness
        .auth
        .refresh(&registered.tokens.refresh_token)
        .await
        .unwrap();

    assert_eq!(refreshed.user.id, registered.user.id);
    assert_ne!(
        refreshed.tokens.refresh_token,
        registered.tokens.refresh_token
    );
}

#[tokio::test]
async fn refresh_with_an_unknown_secret_fails() {
    let harness = TestHarness::new();
    assert!(matches!(
        harness.auth.refresh("no-such-secret").await,
        Err(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn logout_revokes_the_presented_session() {
    let harness = TestHarness::new();
    let registered = harness
        .register_tutor("+91", "1234567890", test_password())
        .await;
    let secret = registered.tokens.refresh_token.clone();

    harness.auth.logout(&secret).await.unwrap();

    assert!(matches!(
        harness.auth.refresh(&secret).await,
        Err(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn logout_with_an_unknown_secret_still_succeeds() {
    let harness = TestHarness::new();
    harness.auth.logout("no-such-secret").await.unwrap();
}

#[tokio::test]
async fn logout_all_revokes_every_session() {
    let harness = TestHarness::new();
    let registered = harness
        .register_tutor("+91", "1234567890", test_password())
        .await;
    let second = harness
        .auth
        .login(mobile_identifier(), test_password(), Some(Platform::Android))
        .await
        .unwrap();

    let revoked = harness.auth.logout_all(registered.user.id).await.unwrap();
    assert_eq!(revoked, 2);

    for secret in [
        registered.tokens.refresh_token,
        second.tokens.refresh_token,
    ] {
        assert!(matches!(
            harness.auth.refresh(&secret).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
