use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::registrations::blueprint::BlueprintConfig;
use crate::registrations::domain::RecordKind;
use crate::registrations::router::{registration_router, ROLE_HEADER, USER_HEADER};
use crate::registrations::service::RegistrationService;
use crate::registrations::store::{RecordFilter, RecordStore};

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn create_route_returns_the_first_question() {
    let (service, _) = build_service();
    let router = registration_router(service);

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/v1/registrations",
            Some(CREATOR),
            Some(json!({ "title": "Study A" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["registration_id"], json!(1));
    assert_eq!(body["location"], json!("/registrations/1/questions/faculty"));
}

#[tokio::test]
async fn requests_without_a_user_are_unauthorized() {
    let (service, _) = build_service();
    let router = registration_router(service);

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/v1/registrations",
            None,
            Some(json!({ "title": "Study A" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_roles_are_rejected() {
    let (service, store) = build_service();
    let id = seed(&store, titled("Study A"));
    let mut headers = HeaderMap::new();
    headers.insert(USER_HEADER, HeaderValue::from_static(CREATOR));
    headers.insert(ROLE_HEADER, HeaderValue::from_static("auditor"));

    let response = crate::registrations::router::status_handler::<_>(
        State(service),
        headers,
        Path(id.0),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_answers_are_unprocessable() {
    let (service, store) = build_service();
    let id = seed(&store, titled("Study A"));
    let router = registration_router(service);

    let response = router
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/registrations/{id}/questions/faculty"),
            Some(CREATOR),
            Some(json!({ "values": { "faculty": "astrology" } })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["saved"], json!(false));
    assert_eq!(body["errors"][0]["field"], json!("faculty"));
}

#[tokio::test]
async fn overview_reports_progress_and_next_step() {
    let (service, store) = build_service();
    let id = seed(&store, through_goal());
    let router = registration_router(service);

    let response = router
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/registrations/{id}?current=goal"),
            Some(CREATOR),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["desired_next"],
        json!(format!("/registrations/{id}/questions/involved_people"))
    );
    let active: Vec<&Value> = body["progress"]
        .as_array()
        .expect("progress list")
        .iter()
        .filter(|item| item["active"] == json!(true))
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["slug"], json!("goal"));
}

#[tokio::test]
async fn deleting_an_entry_returns_no_content() {
    let (service, store) = build_service();
    let id = seed_complete(&store);
    let entry = store
        .filter(RecordKind::Involved, RecordFilter::for_registration(id))
        .expect("filter")[0]
        .id()
        .expect("persisted");
    let router = registration_router(service);

    let response = router
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("/api/v1/registrations/{id}/entries/involved/{entry}"),
            Some(CREATOR),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(request(
            Method::DELETE,
            &format!("/api/v1/registrations/{id}/entries/widgets/{entry}"),
            Some(CREATOR),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_applicants_are_forbidden() {
    let (service, store) = build_service();
    let id = seed(&store, titled("Study A"));
    let router = registration_router(service);

    let response = router
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/registrations/{id}/status"),
            Some("mallory"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn submit_and_review_flow_over_http() {
    let (service, store) = build_service();
    let id = seed_complete(&store);
    let router = registration_router(service);

    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/registrations/{id}/submit"),
            Some(CREATOR),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], json!("submitted"));

    let mut review = request(
        Method::POST,
        &format!("/api/v1/registrations/{id}/responses"),
        Some("olivia"),
        Some(json!({ "approved": true })),
    );
    review
        .headers_mut()
        .insert(ROLE_HEADER, HeaderValue::from_static("po"));
    let response = router.oneshot(review).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status_label"], json!("Registered"));
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let service = Arc::new(RegistrationService::new(
        Arc::new(UnavailableStore),
        BlueprintConfig::default(),
    ));
    let router = registration_router(service);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/registrations/1",
            Some(CREATOR),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
