/// HTTP-level tests for the contact endpoints that run without a live
/// database. Every route under /contacts sits behind the bearer-token
/// middleware, so unauthenticated requests never reach a handler.
mod common;

use actix_web::{http::StatusCode, test, ResponseError};
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use common::setup_app;
use contacts_service::security::jwt::TokenIssuer;

#[actix_web::test]
async fn list_without_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(&app, test::TestRequest::get().uri("/contacts").to_request())
        .await
        .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(err.to_string(), "Not authorized");
}

#[actix_web::test]
async fn create_without_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(
        &app,
        test::TestRequest::post()
            .uri("/contacts")
            .set_json(json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "phone": "+44 20 7946 0001"
            }))
            .to_request(),
    )
    .await
    .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn get_without_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/contacts/{}", Uuid::new_v4()))
            .to_request(),
    )
    .await
    .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn update_without_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/contacts/{}", Uuid::new_v4()))
            .set_json(json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "phone": "+44 20 7946 0001"
            }))
            .to_request(),
    )
    .await
    .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn favorite_without_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/contacts/{}/favorite", Uuid::new_v4()))
            .set_json(json!({ "favorite": true }))
            .to_request(),
    )
    .await
    .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn delete_without_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/contacts/{}", Uuid::new_v4()))
            .to_request(),
    )
    .await
    .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn list_with_garbage_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/contacts")
            .insert_header(("Authorization", "Bearer nope.nope.nope"))
            .to_request(),
    )
    .await
    .expect_err("garbage token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn list_with_expired_token_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let expired = TokenIssuer::new(common::TEST_JWT_SECRET, -7200)
        .issue(Uuid::new_v4())
        .expect("issue token");

    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/contacts")
            .insert_header(("Authorization", format!("Bearer {}", expired)))
            .to_request(),
    )
    .await
    .expect_err("expired token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn list_with_foreign_signature_is_rejected() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    let forged = TokenIssuer::new("some-other-secret", 3600)
        .issue(Uuid::new_v4())
        .expect("issue token");

    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/contacts")
            .insert_header(("Authorization", format!("Bearer {}", forged)))
            .to_request(),
    )
    .await
    .expect_err("foreign signature should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn auth_runs_before_contact_id_parsing() {
    let tmp = TempDir::new().expect("temp dir");
    let app = setup_app(common::lazy_state(&tmp).await).await;

    // A malformed id would map to 404 inside the handler; without a
    // token the middleware rejects first.
    let err = test::try_call_service(
        &app,
        test::TestRequest::get()
            .uri("/contacts/not-a-uuid")
            .to_request(),
    )
    .await
    .expect_err("request without a token should be rejected");

    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}
