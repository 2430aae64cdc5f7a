//! Email-verification token consumption tests.

mod common;

use chrono::{Duration, Utc};

use common::{TestHarness, unique_email};
use usher_api::verification::verify_email_core;
use usher_core::{CreateUser, CreateVerification, Error, UserStore, VerificationStore};

async fn seed_unverified_user(h: &TestHarness, email: &str) -> usher_core::User {
    h.state
        .store
        .create_user(CreateUser::new(email).with_name("Unverified"))
        .await
        .unwrap()
}

async fn seed_token(
    h: &TestHarness,
    email: &str,
    expires_at: chrono::DateTime<Utc>,
) -> usher_core::Verification {
    h.state
        .store
        .create_verification(CreateVerification {
            identifier: email.to_string(),
            value: format!("proof-{email}"),
            expires_at,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn verification_flips_the_flag_and_consumes_the_token() {
    let h = TestHarness::new();
    let email = unique_email("pending");
    let user = seed_unverified_user(&h, &email).await;
    assert!(!user.email_verified);

    let token = seed_token(&h, &email, Utc::now() + Duration::hours(24)).await;

    let response = verify_email_core(&token.id, &h.state).await.unwrap();
    assert!(response.success);
    assert_eq!(response.already_verified, None);

    let user = h.state.store.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert!(user.email_verified);

    // Consumed exactly once: the token row is gone and a replay fails.
    assert!(h.state.store.get_verification(&token.id).await.unwrap().is_none());
    let err = verify_email_core(&token.id, &h.state).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn already_verified_account_still_consumes_the_token() {
    let h = TestHarness::new();
    let email = unique_email("verified");
    h.create_user(&email).await; // harness users are pre-verified

    let token = seed_token(&h, &email, Utc::now() + Duration::hours(24)).await;

    let response = verify_email_core(&token.id, &h.state).await.unwrap();
    assert!(response.success);
    assert_eq!(response.already_verified, Some(true));
    assert!(h.state.store.get_verification(&token.id).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_token_is_deleted_and_rejected() {
    let h = TestHarness::new();
    let email = unique_email("late");
    seed_unverified_user(&h, &email).await;

    let token = seed_token(&h, &email, Utc::now() - Duration::minutes(1)).await;

    let err = verify_email_core(&token.id, &h.state).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    assert!(h.state.store.get_verification(&token.id).await.unwrap().is_none());

    // The account stays unverified.
    let user = h
        .state
        .store
        .get_user_by_email(&email)
        .await
        .unwrap()
        .unwrap();
    assert!(!user.email_verified);
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let h = TestHarness::new();
    let err = verify_email_core("no-such-token", &h.state).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}
