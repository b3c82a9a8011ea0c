use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::{Actor, ActorRole};
use super::domain::{FieldValue, GroupType, RecordId, RecordKind, RegistrationStatus, UserId};
use super::location::Location;
use super::progress::{ProgressCursor, ProgressTracker};
use super::service::{
    AnswerRequest, RegistrationService, RegistrationServiceError, ReviewDecision,
};
use super::store::RecordStore;
use super::views::{BlueprintView, StatusView};

pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// Router builder exposing the registration questionnaire over JSON.
pub fn registration_router<S>(service: Arc<RegistrationService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route("/api/v1/registrations", post(create_handler::<S>))
        .route("/api/v1/registrations/:id", get(overview_handler::<S>))
        .route("/api/v1/registrations/:id/progress", get(progress_handler::<S>))
        .route("/api/v1/registrations/:id/status", get(status_handler::<S>))
        .route(
            "/api/v1/registrations/:id/questions/:slug",
            post(answer_handler::<S>),
        )
        .route(
            "/api/v1/registrations/:id/entries/:kind/:entry_id",
            delete(delete_entry_handler::<S>),
        )
        .route("/api/v1/registrations/:id/submit", post(submit_handler::<S>))
        .route(
            "/api/v1/registrations/:id/responses",
            post(respond_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateBody {
    pub title: String,
}

#[derive(Debug, Serialize)]
struct CreatedView {
    registration_id: RecordId,
    location: Location,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnswerBody {
    #[serde(default)]
    pub entry: Option<RecordId>,
    #[serde(default)]
    pub group_type: Option<GroupType>,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProgressParams {
    pub current: Option<String>,
    pub group_type: Option<GroupType>,
}

impl ProgressParams {
    fn cursor(&self) -> Option<ProgressCursor<'_>> {
        self.current.as_deref().map(|slug| ProgressCursor {
            slug,
            group_type: self.group_type,
        })
    }
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let user = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            let payload = json!({ "error": format!("missing {USER_HEADER} header") });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })?;

    let role = match headers.get(ROLE_HEADER) {
        None => ActorRole::Applicant,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|value| value.parse::<ActorRole>().ok())
            .ok_or_else(|| {
                let payload = json!({ "error": format!("unrecognised {ROLE_HEADER} header") });
                (StatusCode::BAD_REQUEST, Json(payload)).into_response()
            })?,
    };

    Ok(Actor {
        user: UserId(user.to_string()),
        role,
    })
}

fn error_response(error: RegistrationServiceError) -> Response {
    let status = error.status_code();
    let payload = match &error {
        RegistrationServiceError::Rejected(fields) => json!({
            "error": error.to_string(),
            "fields": fields,
        }),
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let created = service.create(&actor, &body.title).and_then(|id| {
        let blueprint = service.blueprint(&actor, id)?;
        Ok(CreatedView {
            registration_id: id,
            location: blueprint.get_desired_next_url(),
        })
    });

    match created {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn overview_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(params): Query<ProgressParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.blueprint(&actor, RecordId(id)) {
        Ok(blueprint) => {
            let view = BlueprintView::from_blueprint(&blueprint, params.cursor());
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(params): Query<ProgressParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.blueprint(&actor, RecordId(id)) {
        Ok(blueprint) => {
            let items = ProgressTracker::new(&blueprint).items(params.cursor());
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.status(&actor, RecordId(id)) {
        Ok(status) => status_response(RecordId(id), status),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answer_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path((id, slug)): Path<(u64, String)>,
    Json(body): Json<AnswerBody>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let request = AnswerRequest {
        slug,
        entry: body.entry,
        group_type: body.group_type,
        values: body.values,
    };

    match service.answer(&actor, RecordId(id), request) {
        Ok(outcome) if outcome.saved => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(outcome) => (StatusCode::UNPROCESSABLE_ENTITY, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_entry_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path((id, kind, entry)): Path<(u64, String, u64)>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let Ok(kind) = kind.parse::<RecordKind>() else {
        let payload = json!({ "error": format!("unknown entry kind '{kind}'") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    match service.delete_entry(&actor, RecordId(id), kind, RecordId(entry)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.submit(&actor, RecordId(id)) {
        Ok(status) => status_response(RecordId(id), status),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn respond_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(decision): Json<ReviewDecision>,
) -> Response
where
    S: RecordStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.respond(&actor, RecordId(id), decision) {
        Ok(status) => status_response(RecordId(id), status),
        Err(error) => error_response(error),
    }
}

fn status_response(registration_id: RecordId, status: RegistrationStatus) -> Response {
    let view = StatusView {
        registration_id,
        status,
        status_label: status.label(),
    };
    (StatusCode::OK, Json(view)).into_response()
}
