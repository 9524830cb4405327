// server/tests/http_api.rs

//! HTTP surface tests over the in-memory store: status-code mapping for the
//! engine's failure taxonomy, header-based identity, and the payment
//! callback contract.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use adoption_app::config::AppConfig;
use adoption_app::state::AppState;
use adoption_app::web::routes::configure_app_routes;
use leash::MemoryStore;

fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: None,
    gateway_webhook_secret: None,
    reconcile_max_attempts: 3,
    reconcile_base_delay: Duration::from_millis(1),
  }
}

fn app_state(config: AppConfig) -> AppState {
  AppState::build(Arc::new(MemoryStore::new()), Arc::new(config))
}

macro_rules! test_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn identity(id: Uuid, role: &str) -> [(&'static str, String); 2] {
  [
    ("X-Actor-ID", id.to_string()),
    ("X-Actor-Role", role.to_string()),
  ]
}

fn post_json(path: &str, id: Uuid, role: &str, body: Value) -> actix_http::Request {
  let [h1, h2] = identity(id, role);
  test::TestRequest::post()
    .uri(path)
    .insert_header(h1)
    .insert_header(h2)
    .set_json(body)
    .to_request()
}

fn get(path: &str) -> actix_http::Request {
  test::TestRequest::get().uri(path).to_request()
}

#[actix_web::test]
async fn health_endpoint_responds() {
  let app = test_app!(app_state(test_config()));
  let resp = test::call_service(&app, get("/api/v1/health")).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn missing_identity_headers_are_unauthorized() {
  let app = test_app!(app_state(test_config()));
  let req = test::TestRequest::post()
    .uri("/api/v1/listings")
    .set_json(json!({"name": "Rex", "species": "dog"}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn system_role_header_is_rejected() {
  let app = test_app!(app_state(test_config()));
  let req = post_json(
    "/api/v1/listings",
    Uuid::new_v4(),
    "SYSTEM",
    json!({"name": "Rex", "species": "dog"}),
  );
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_lifecycle_over_http() {
  let app = test_app!(app_state(test_config()));
  let shelter = Uuid::new_v4();
  let admin = Uuid::new_v4();
  let user = Uuid::new_v4();

  // Shelter registers a listing.
  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/listings",
      shelter,
      "SHELTER",
      json!({"name": "Rex", "species": "dog"}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let listing: Value = test::read_body_json(resp).await;
  assert_eq!(listing["status"], "pending");
  assert_eq!(listing["version"], 0);
  let listing_id = listing["id"].as_str().unwrap().to_string();

  // Admin publishes it.
  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/listings/{listing_id}/status"),
      admin,
      "ADMIN",
      json!({"to_status": "available", "expected_version": 0}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let listing: Value = test::read_body_json(resp).await;
  assert_eq!(listing["status"], "available");
  assert_eq!(listing["version"], 1);

  // A user opens an adoption case against it.
  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/listings/{listing_id}/adoptions"),
      user,
      "USER",
      json!({}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let case: Value = test::read_body_json(resp).await;
  assert_eq!(case["status"], "pending");
  assert_eq!(case["version"], 1);
  let case_id = case["id"].as_str().unwrap().to_string();

  // The owning shelter approves; the listing moves in the same response.
  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/adoptions/{case_id}/decision"),
      shelter,
      "SHELTER",
      json!({"decision": "Approved", "expected_version": 1}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let outcome: Value = test::read_body_json(resp).await;
  assert_eq!(outcome["case"]["status"], "approved");
  assert_eq!(outcome["case"]["version"], 2);
  assert_eq!(outcome["listing"]["status"], "adopted");
  assert_eq!(outcome["listing"]["version"], 2);

  // Durable reads agree.
  let resp = test::call_service(&app, get(&format!("/api/v1/listings/{listing_id}"))).await;
  let listing: Value = test::read_body_json(resp).await;
  assert_eq!(listing["status"], "adopted");
}

#[actix_web::test]
async fn stale_version_maps_to_conflict() {
  let app = test_app!(app_state(test_config()));
  let shelter = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/listings",
      shelter,
      "SHELTER",
      json!({"name": "Mia", "species": "cat"}),
    ),
  )
  .await;
  let listing: Value = test::read_body_json(resp).await;
  let listing_id = listing["id"].as_str().unwrap();

  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/listings/{listing_id}/status"),
      Uuid::new_v4(),
      "ADMIN",
      json!({"to_status": "available", "expected_version": 5}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn denied_role_maps_to_forbidden() {
  let app = test_app!(app_state(test_config()));
  let shelter = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/listings",
      shelter,
      "SHELTER",
      json!({"name": "Mia", "species": "cat"}),
    ),
  )
  .await;
  let listing: Value = test::read_body_json(resp).await;
  let listing_id = listing["id"].as_str().unwrap();

  // Review is an admin move; a user may not publish.
  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/listings/{listing_id}/status"),
      Uuid::new_v4(),
      "USER",
      json!({"to_status": "available", "expected_version": 0}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn illegal_transition_maps_to_unprocessable() {
  let app = test_app!(app_state(test_config()));
  let shelter = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/listings",
      shelter,
      "SHELTER",
      json!({"name": "Mia", "species": "cat"}),
    ),
  )
  .await;
  let listing: Value = test::read_body_json(resp).await;
  let listing_id = listing["id"].as_str().unwrap();

  // pending -> adopted skips review and is not a machine edge.
  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/listings/{listing_id}/status"),
      Uuid::new_v4(),
      "ADMIN",
      json!({"to_status": "adopted", "expected_version": 0}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn opening_case_on_unreviewed_listing_maps_to_precondition_failed() {
  let app = test_app!(app_state(test_config()));
  let shelter = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/listings",
      shelter,
      "SHELTER",
      json!({"name": "Mia", "species": "cat"}),
    ),
  )
  .await;
  let listing: Value = test::read_body_json(resp).await;
  let listing_id = listing["id"].as_str().unwrap();

  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/listings/{listing_id}/adoptions"),
      Uuid::new_v4(),
      "USER",
      json!({}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
}

#[actix_web::test]
async fn order_amount_is_validated() {
  let app = test_app!(app_state(test_config()));
  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/orders",
      Uuid::new_v4(),
      "USER",
      json!({"total_amount_cents": 0, "currency": "USD"}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payment_callback_settles_and_absorbs_replay() {
  let app = test_app!(app_state(test_config()));
  let user = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/orders",
      user,
      "USER",
      json!({"total_amount_cents": 2500, "currency": "USD"}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let order: Value = test::read_body_json(resp).await;
  assert_eq!(order["payment_status"], "pending");
  let order_id = order["id"].as_str().unwrap().to_string();

  // The gateway redirect lands. No identity headers: the callback authenticates
  // by signature, not by actor.
  let callback = |outcome: &str| {
    test::TestRequest::post()
      .uri(&format!("/api/v1/orders/{order_id}/payment-callback"))
      .set_json(json!({"outcome": outcome}))
      .to_request()
  };

  let resp = test::call_service(&app, callback("Paid")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "settled");
  assert_eq!(body["order"]["payment_status"], "paid");
  assert_eq!(body["order"]["version"], 1);

  // Duplicate delivery settles to the same answer, version unchanged.
  let resp = test::call_service(&app, callback("Paid")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "settled");
  assert_eq!(body["order"]["version"], 1);

  // The poll target agrees.
  let resp = test::call_service(&app, get(&format!("/api/v1/orders/{order_id}"))).await;
  let order: Value = test::read_body_json(resp).await;
  assert_eq!(order["payment_status"], "paid");
}

#[actix_web::test]
async fn conflicting_callback_is_acknowledged_but_rejected_in_body() {
  let app = test_app!(app_state(test_config()));
  let user = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/orders",
      user,
      "USER",
      json!({"total_amount_cents": 1000, "currency": "EUR"}),
    ),
  )
  .await;
  let order: Value = test::read_body_json(resp).await;
  let order_id = order["id"].as_str().unwrap().to_string();

  let callback = |outcome: &str| {
    test::TestRequest::post()
      .uri(&format!("/api/v1/orders/{order_id}/payment-callback"))
      .set_json(json!({"outcome": outcome}))
      .to_request()
  };

  let resp = test::call_service(&app, callback("Paid")).await;
  assert_eq!(resp.status(), StatusCode::OK);

  // A contradictory redelivery is acknowledged so the gateway stops, but the
  // order does not flip.
  let resp = test::call_service(&app, callback("Failed")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "rejected");

  let resp = test::call_service(&app, get(&format!("/api/v1/orders/{order_id}"))).await;
  let order: Value = test::read_body_json(resp).await;
  assert_eq!(order["payment_status"], "paid");
}

#[actix_web::test]
async fn callback_for_unknown_order_is_not_found() {
  let app = test_app!(app_state(test_config()));
  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/payment-callback", Uuid::new_v4()))
    .set_json(json!({"outcome": "Paid"}))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn callback_signature_is_enforced_when_configured() {
  let mut config = test_config();
  config.gateway_webhook_secret = Some("s3cr3t".to_string());
  let app = test_app!(app_state(config));
  let user = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/orders",
      user,
      "USER",
      json!({"total_amount_cents": 500, "currency": "USD"}),
    ),
  )
  .await;
  let order: Value = test::read_body_json(resp).await;
  let order_id = order["id"].as_str().unwrap().to_string();

  // Unsigned and wrongly signed deliveries are refused outright.
  let unsigned = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{order_id}/payment-callback"))
    .set_json(json!({"outcome": "Paid"}))
    .to_request();
  let resp = test::call_service(&app, unsigned).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let badly_signed = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{order_id}/payment-callback"))
    .insert_header(("X-Gateway-Signature", "wrong"))
    .set_json(json!({"outcome": "Paid"}))
    .to_request();
  let resp = test::call_service(&app, badly_signed).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let signed = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{order_id}/payment-callback"))
    .insert_header(("X-Gateway-Signature", "s3cr3t"))
    .set_json(json!({"outcome": "Paid"}))
    .to_request();
  let resp = test::call_service(&app, signed).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "settled");
}

#[actix_web::test]
async fn dead_letter_listing_is_admin_only() {
  let app = test_app!(app_state(test_config()));
  let user = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/orders",
      user,
      "USER",
      json!({"total_amount_cents": 500, "currency": "USD"}),
    ),
  )
  .await;
  let order: Value = test::read_body_json(resp).await;
  let order_id = order["id"].as_str().unwrap().to_string();

  let [h1, h2] = identity(user, "USER");
  let as_user = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{order_id}/dead-letters"))
    .insert_header(h1)
    .insert_header(h2)
    .to_request();
  let resp = test::call_service(&app, as_user).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let [h1, h2] = identity(Uuid::new_v4(), "ADMIN");
  let as_admin = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{order_id}/dead-letters"))
    .insert_header(h1)
    .insert_header(h2)
    .to_request();
  let resp = test::call_service(&app, as_admin).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let letters: Value = test::read_body_json(resp).await;
  assert_eq!(letters.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn fulfillment_advance_is_staff_work() {
  let app = test_app!(app_state(test_config()));
  let user = Uuid::new_v4();

  let resp = test::call_service(
    &app,
    post_json(
      "/api/v1/orders",
      user,
      "USER",
      json!({"total_amount_cents": 500, "currency": "USD"}),
    ),
  )
  .await;
  let order: Value = test::read_body_json(resp).await;
  let order_id = order["id"].as_str().unwrap().to_string();

  // The buyer cannot confirm their own order.
  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/orders/{order_id}/fulfillment"),
      user,
      "USER",
      json!({"to_status": "confirmed", "expected_version": 0}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = test::call_service(
    &app,
    post_json(
      &format!("/api/v1/orders/{order_id}/fulfillment"),
      Uuid::new_v4(),
      "STAFF",
      json!({"to_status": "confirmed", "expected_version": 0}),
    ),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let order: Value = test::read_body_json(resp).await;
  assert_eq!(order["order_status"], "confirmed");
  assert_eq!(order["version"], 1);
}
