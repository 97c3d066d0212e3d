use crate::config::Config;
use crate::dashboard::{summarize, DashboardSummary};
use crate::directory::CustomerDirectory;
use crate::errors::AppError;
use crate::listing::{list_view, Column, Listable, Page, PageRequest, SortDirection};
use crate::mailer::{parse_cc, send_mentor_emails, EmailSender, Mailbox};
use crate::models::*;
use crate::qbo_client::QboClient;
use crate::reconcile::{reconcile_with, ReconciledCustomer};
use crate::store::RecordStore;
use crate::validation::{is_valid_email, validate_mentor, validate_student, validate_team};
use crate::views::{
    invoice_rows, mentor_rows, student_rows, team_rows, InvoiceRow, MentorRow, StudentRow,
    TeamRow,
};
use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Mentors, students and teams.
    pub store: RecordStore,
    pub config: Config,
    /// Cached, reconciled QBO customers.
    pub directory: CustomerDirectory,
    /// Direct QBO access for invoices.
    pub qbo: QboClient,
    pub mailer: Arc<dyn EmailSender>,
}

/// A page of rows plus the column layout and the effective sort.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    #[serde(flatten)]
    pub page: Page<T>,
    pub columns: &'static [Column],
    pub orderby: &'static str,
    pub order: SortDirection,
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    #[serde(flatten)]
    pub list: ListResponse<ReconciledCustomer>,
    /// False when no snapshot exists and QBO could not be reached.
    pub cache_available: bool,
    pub cache_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CustomerDetailResponse {
    pub customer: ReconciledCustomer,
    pub students: Vec<Student>,
    pub invoices: Vec<InvoiceRow>,
    /// False when the invoice query failed; `invoices` is then empty.
    pub invoices_available: bool,
}

fn list_response<T: Listable>(records: Vec<T>, params: &ListParams) -> ListResponse<T> {
    let search = params.search.clone().unwrap_or_default();
    let orderby = T::SPEC
        .resolve(params.orderby.as_deref().unwrap_or_default())
        .map_or("", |column| column.key);
    let order = SortDirection::parse(params.order.as_deref());
    let request = PageRequest::new(params.paged, params.per_page);

    ListResponse {
        page: list_view(records, &search, orderby, order, request),
        columns: T::SPEC.columns,
        orderby,
        order,
        search,
    }
}

/// Rejects requests without a matching `X-Admin-Token` header.
pub async fn require_admin_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = headers
        .get("X-Admin-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Admin-Token header".to_string()))?;

    if !constant_time_compare(token, &state.config.admin_token) {
        tracing::warn!("Invalid admin token on {}", request.uri().path());
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(next.run(request).await)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "gears-dashboard",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, AppError> {
    tracing::info!("GET /dashboard");

    let teams = state.store.list_teams().await?;
    let students = state.store.list_students().await?;
    let mentors = state.store.list_mentors().await?;
    let (customers, cache_updated_at) = state.directory.reconciled().await;

    Ok(Json(summarize(
        &teams,
        &students,
        &mentors,
        customers,
        cache_updated_at,
        Utc::now(),
    )))
}

// ============ Customers ============

/// GET /api/v1/customers
///
/// Reconciled customers from the cached snapshot. An unreachable QBO with an
/// empty cache gives an empty list, not an error.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<CustomerListResponse>, AppError> {
    tracing::info!("GET /customers - params: {:?}", params);

    let (customers, cache_updated_at) = state.directory.reconciled().await;

    Ok(Json(CustomerListResponse {
        list: list_response(customers, &params),
        cache_available: cache_updated_at.is_some(),
        cache_updated_at,
    }))
}

/// POST /api/v1/customers/refresh
pub async fn refresh_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, AppError> {
    tracing::info!("POST /customers/refresh");

    let snapshot = state.directory.refresh().await?;
    Ok(Json(RefreshResponse {
        customers: snapshot.customers.len(),
        refreshed_at: snapshot.timestamp,
    }))
}

/// GET /api/v1/customers/:id
///
/// One reconciled customer with the students linked to it and its invoices.
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetailResponse>, AppError> {
    tracing::info!("GET /customers/{}", id);

    let index = state.directory.index().await;
    let customer = match index.lookup(&id).found() {
        Some(customer) => customer.clone(),
        None => fetch_uncached_customer(&state, &id).await?,
    };

    let students = state.store.students_for_customer(customer.id()).await?;

    let (invoices, invoices_available) = match state.qbo.fetch_invoices(Some(customer.id())).await
    {
        Ok(invoices) => (invoice_rows(invoices, &index), true),
        Err(e) => {
            tracing::warn!("Invoices for customer {} unavailable: {}", customer.id(), e);
            (Vec::new(), false)
        }
    };

    Ok(Json(CustomerDetailResponse {
        customer,
        students,
        invoices,
        invoices_available,
    }))
}

/// Customers created in QBO since the last snapshot are fetched directly.
async fn fetch_uncached_customer(
    state: &AppState,
    id: &str,
) -> Result<ReconciledCustomer, AppError> {
    tracing::info!("Customer {} not in snapshot, asking QBO", id);
    match state.qbo.get_customer(id).await {
        Ok(customer) => Ok(reconcile_with(state.directory.grammar(), &customer)),
        Err(AppError::NotFound(_)) | Err(AppError::BadRequest(_)) => Err(AppError::NotFound(
            format!("Customer with id {} not found", id),
        )),
        Err(e) => Err(e),
    }
}

// ============ Invoices ============

/// GET /api/v1/invoices
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<InvoiceRow>>, AppError> {
    tracing::info!("GET /invoices - params: {:?}", params);

    let customer_id = params
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let invoices = state.qbo.fetch_invoices(customer_id).await?;
    let index = state.directory.index().await;

    Ok(Json(list_response(invoice_rows(invoices, &index), &params)))
}

// ============ Teams ============

/// GET /api/v1/teams
pub async fn list_teams(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<TeamRow>>, AppError> {
    tracing::info!("GET /teams - params: {:?}", params);

    let teams: Vec<Team> = state
        .store
        .list_teams()
        .await?
        .into_iter()
        .filter(|t| params.archived.map_or(true, |archived| t.archived == archived))
        .filter(|t| params.hall_of_fame.map_or(true, |hof| t.hall_of_fame == hof))
        .collect();
    let mentors = state.store.list_mentors().await?;
    let students = state.store.list_students().await?;

    Ok(Json(list_response(
        team_rows(teams, &mentors, &students),
        &params,
    )))
}

pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Team>, AppError> {
    Ok(Json(state.store.get_team(id).await?))
}

pub async fn create_team(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TeamInput>,
) -> Result<(StatusCode, Json<Team>), AppError> {
    tracing::info!("POST /teams - {}", input.name);
    let input = validate_team(input)?;
    let team = state.store.create_team(&input).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn update_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<TeamInput>,
) -> Result<Json<Team>, AppError> {
    tracing::info!("PUT /teams/{}", id);
    let input = validate_team(input)?;
    Ok(Json(state.store.update_team(id, &input).await?))
}

/// DELETE /api/v1/teams/:id
///
/// Mentors and students on the team are kept with no team.
pub async fn delete_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /teams/{}", id);
    state.store.delete_team(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A referenced team must exist; a dangling id is the caller's mistake.
async fn ensure_team_exists(store: &RecordStore, team_id: Option<i64>) -> Result<(), AppError> {
    let Some(team_id) = team_id else {
        return Ok(());
    };
    match store.get_team(team_id).await {
        Ok(_) => Ok(()),
        Err(AppError::NotFound(_)) => Err(AppError::BadRequest(format!(
            "Team with id {} does not exist",
            team_id
        ))),
        Err(e) => Err(e),
    }
}

// ============ Mentors ============

/// GET /api/v1/mentors
pub async fn list_mentors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<MentorRow>>, AppError> {
    tracing::info!("GET /mentors - params: {:?}", params);

    let mentors: Vec<Mentor> = state
        .store
        .list_mentors()
        .await?
        .into_iter()
        .filter(|m| params.team_id.map_or(true, |team_id| m.team_id == Some(team_id)))
        .collect();
    let teams = state.store.list_teams().await?;

    Ok(Json(list_response(mentor_rows(mentors, &teams), &params)))
}

pub async fn get_mentor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Mentor>, AppError> {
    Ok(Json(state.store.get_mentor(id).await?))
}

pub async fn create_mentor(
    State(state): State<Arc<AppState>>,
    Json(input): Json<MentorInput>,
) -> Result<(StatusCode, Json<Mentor>), AppError> {
    tracing::info!("POST /mentors");
    let input = validate_mentor(input)?;
    ensure_team_exists(&state.store, input.team_id).await?;
    let mentor = state.store.create_mentor(&input).await?;
    Ok((StatusCode::CREATED, Json(mentor)))
}

pub async fn update_mentor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<MentorInput>,
) -> Result<Json<Mentor>, AppError> {
    tracing::info!("PUT /mentors/{}", id);
    let input = validate_mentor(input)?;
    ensure_team_exists(&state.store, input.team_id).await?;
    Ok(Json(state.store.update_mentor(id, &input).await?))
}

pub async fn delete_mentor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /mentors/{}", id);
    state.store.delete_mentor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/mentors/email
///
/// Sends one email per mentor. A failure for one mentor is reported in the
/// response and does not stop the others.
pub async fn email_mentors(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MentorEmailRequest>,
) -> Result<Json<MentorEmailResponse>, AppError> {
    tracing::info!(
        "POST /mentors/email - {} mentor(s), subject '{}'",
        request.mentor_ids.len(),
        request.subject
    );

    if request.mentor_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one mentor is required".to_string(),
        ));
    }
    if request.subject.trim().is_empty() {
        return Err(AppError::BadRequest("subject is required".to_string()));
    }

    let cc = parse_cc(request.cc.as_deref());
    if let Some(bad) = cc.iter().find(|address| !is_valid_email(address)) {
        return Err(AppError::BadRequest(format!("Invalid CC address: {}", bad)));
    }

    let from = Mailbox {
        name: state.config.mail_from_name.clone(),
        email: state.config.mail_from_address.clone(),
    };

    let mentors: HashMap<i64, Mentor> = state
        .store
        .get_mentors(&request.mentor_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let MentorEmailResponse { sent, failed } = send_mentor_emails(
        state.mailer.as_ref(),
        &from,
        &mentors,
        &request.mentor_ids,
        &request.subject,
        &request.body,
        &cc,
    )
    .await;

    tracing::info!("Mentor email: {} sent, {} failed", sent, failed.len());
    Ok(Json(MentorEmailResponse { sent, failed }))
}

// ============ Students ============

/// GET /api/v1/students
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<StudentRow>>, AppError> {
    tracing::info!("GET /students - params: {:?}", params);

    let customer_filter = params
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let students: Vec<Student> = state
        .store
        .list_students()
        .await?
        .into_iter()
        .filter(|s| params.team_id.map_or(true, |team_id| s.team_id == Some(team_id)))
        .filter(|s| customer_filter.map_or(true, |id| s.customer_id.as_deref() == Some(id)))
        .collect();
    let teams = state.store.list_teams().await?;
    let index = state.directory.index().await;

    Ok(Json(list_response(
        student_rows(students, &teams, &index),
        &params,
    )))
}

pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.store.get_student(id).await?))
}

pub async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(input): Json<StudentInput>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    tracing::info!("POST /students");
    let input = validate_student(input)?;
    ensure_team_exists(&state.store, input.team_id).await?;
    let student = state.store.create_student(&input).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Student>, AppError> {
    tracing::info!("PUT /students/{}", id);
    let input = validate_student(input)?;
    ensure_team_exists(&state.store, input.team_id).await?;
    Ok(Json(state.store.update_student(id, &input).await?))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /students/{}", id);
    state.store.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
