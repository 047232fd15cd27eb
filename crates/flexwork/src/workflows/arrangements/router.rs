use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{deserialize_optional_date, ApplicationId, EventId, StaffId};
use super::repository::{ArrangementStore, DirectoryProvider, StoreError};
use super::service::{
    ArrangementService, ArrangementServiceError, ArrangementSubmission, ChangeCommand,
    ProcessCommand, WithdrawRequest, WithdrawSelection,
};

/// Router builder exposing the portal's JSON endpoints.
pub fn arrangement_router<S, D>(service: Arc<ArrangementService<S, D>>) -> Router
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/arrangements/staff/:staff_id",
            get(staff_dashboard_handler::<S, D>),
        )
        .route(
            "/api/v1/arrangements/review/:approver_id",
            get(review_queue_handler::<S, D>),
        )
        .route("/api/v1/application", post(create_handler::<S, D>))
        .route(
            "/api/v1/application/:application_id",
            get(application_handler::<S, D>).put(change_handler::<S, D>),
        )
        .route(
            "/api/v1/application/withdraw/:application_id/:event_id",
            put(withdraw_event_handler::<S, D>),
        )
        .route(
            "/api/v1/application/withdraw/:application_id",
            post(withdraw_selection_handler::<S, D>),
        )
        .route(
            "/api/v1/application/process/:application_id",
            put(process_handler::<S, D>),
        )
        .route("/api/v1/overview", get(overview_handler::<S, D>))
        .route(
            "/api/v1/directory/hierarchy",
            get(hierarchy_handler::<S, D>),
        )
        .route(
            "/api/v1/directory/employee/:staff_id",
            get(employee_handler::<S, D>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
struct AsOfQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
struct OverviewQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    date: Option<NaiveDate>,
}

fn or_today(requested: Option<NaiveDate>) -> NaiveDate {
    requested.unwrap_or_else(|| Local::now().date_naive())
}

async fn staff_dashboard_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(staff_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.staff_dashboard(&StaffId(staff_id), or_today(query.today)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn review_queue_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(approver_id): Path<u64>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.review_queue(&StaffId(approver_id)) {
        Ok(queue) => (StatusCode::OK, Json(queue)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Json(submission): Json<ArrangementSubmission>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.submit(submission) {
        Ok(application) => {
            (StatusCode::CREATED, Json(application.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

async fn application_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(application_id): Path<u64>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.application(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn change_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(application_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
    Json(change): Json<ChangeCommand>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.request_change(&ApplicationId(application_id), change, or_today(query.today)) {
        Ok(application) => (StatusCode::OK, Json(application.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn withdraw_event_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path((application_id, event_id)): Path<(u64, u64)>,
    Query(query): Query<AsOfQuery>,
    Json(request): Json<WithdrawRequest>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    let application_id = ApplicationId(application_id);
    let event_id = EventId(event_id);
    match service.withdraw_event(&application_id, &event_id, request, or_today(query.today)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "application_id": application_id,
                "event_id": event_id,
                "status": "withdrawn",
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

async fn withdraw_selection_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(application_id): Path<u64>,
    Query(query): Query<AsOfQuery>,
    Json(selection): Json<WithdrawSelection>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    let application_id = ApplicationId(application_id);
    match service
        .withdraw_selection(&application_id, selection, or_today(query.today))
        .await
    {
        Ok(withdrawn) => (
            StatusCode::OK,
            Json(json!({
                "application_id": application_id,
                "withdrawn": withdrawn,
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

async fn process_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(application_id): Path<u64>,
    Json(command): Json<ProcessCommand>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.process(&ApplicationId(application_id), command) {
        Ok(application) => (StatusCode::OK, Json(application.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn overview_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Query(query): Query<OverviewQuery>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.overview(or_today(query.date)) {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn hierarchy_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.hierarchy() {
        Ok(hierarchy) => (StatusCode::OK, Json(hierarchy)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn employee_handler<S, D>(
    State(service): State<Arc<ArrangementService<S, D>>>,
    Path(staff_id): Path<u64>,
) -> Response
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    match service.employee(&StaffId(staff_id)) {
        Ok(employee) => (StatusCode::OK, Json(employee)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ArrangementServiceError) -> Response {
    let status = match &error {
        ArrangementServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ArrangementServiceError::UnknownStaff(_)
        | ArrangementServiceError::UnknownApplication(_)
        | ArrangementServiceError::UnknownEvent { .. }
        | ArrangementServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        ArrangementServiceError::NotPending(_)
        | ArrangementServiceError::NotApproved(_)
        | ArrangementServiceError::NotEditable { .. }
        | ArrangementServiceError::OutsideEditableWindow { .. }
        | ArrangementServiceError::WindowClosed(_)
        | ArrangementServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        ArrangementServiceError::Store(StoreError::Unavailable(_))
        | ArrangementServiceError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
