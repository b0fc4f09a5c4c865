use chrono::{Duration, Utc};

use crate::auth::UserSession;
use crate::db::{
    clean_expired_sessions, create_user, create_user_session, get_session_by_token,
    invalidate_session,
};
use crate::error::AppError;
use crate::test::utils::setup_test_db;

#[rocket::async_test]
async fn session_round_trip_and_validity() {
    let pool = setup_test_db().await;
    let user_id = create_user(&pool, "session_user", "secret").await.unwrap();

    let token = UserSession::generate_token();
    let expires_at = (Utc::now() + Duration::hours(1)).naive_utc();

    create_user_session(&pool, user_id, &token, expires_at)
        .await
        .unwrap();

    let session = get_session_by_token(&pool, &token).await.unwrap();
    assert_eq!(session.user_id, user_id);
    assert!(session.is_valid(), "Future session should be valid");
}

#[rocket::async_test]
async fn expired_sessions_are_invalid_and_swept() {
    let pool = setup_test_db().await;
    let user_id = create_user(&pool, "session_user", "secret").await.unwrap();

    let token = UserSession::generate_token();
    let expires_at = (Utc::now() - Duration::hours(1)).naive_utc();

    create_user_session(&pool, user_id, &token, expires_at)
        .await
        .unwrap();

    let session = get_session_by_token(&pool, &token).await.unwrap();
    assert!(!session.is_valid(), "Expired session should be invalid");

    let swept = clean_expired_sessions(&pool).await.unwrap();
    assert_eq!(swept, 1);

    let result = get_session_by_token(&pool, &token).await;
    assert!(matches!(result, Err(AppError::Authentication(_))));
}

#[rocket::async_test]
async fn invalidated_sessions_cannot_be_reused() {
    let pool = setup_test_db().await;
    let user_id = create_user(&pool, "session_user", "secret").await.unwrap();

    let token = UserSession::generate_token();
    let expires_at = (Utc::now() + Duration::hours(1)).naive_utc();

    create_user_session(&pool, user_id, &token, expires_at)
        .await
        .unwrap();
    invalidate_session(&pool, &token).await.unwrap();

    let result = get_session_by_token(&pool, &token).await;
    assert!(matches!(result, Err(AppError::Authentication(_))));
}

#[test]
fn generated_tokens_are_long_and_unique() {
    let first = UserSession::generate_token();
    let second = UserSession::generate_token();

    assert_eq!(first.len(), 48);
    assert_ne!(first, second);
}
