use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::path::ErrorKind;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use wedplan_core::profile::ProfileInput;
use wedplan_core::recommend::RecommendationEngine;
use wedplan_core::reservation::{ReservationChanges, ReservationRequest};
use wedplan_core::token::TokenConfig;
use wedplan_core::token::guard::authenticate;
use wedplan_core::view::VendorSummary;
use wedplan_core::{CoreError, composer, registry, reservation};
use wedplan_db::models::VendorCategory;
use wedplan_db::queries::vendors as vendor_db;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: Arc<RecommendationEngine>,
    pub tokens: Arc<TokenConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, engine: RecommendationEngine, tokens: TokenConfig) -> Self {
        Self {
            pool,
            engine: Arc::new(engine),
            tokens: Arc::new(tokens),
        }
    }
}

/// The user a request was authenticated as.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError(CoreError);

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &err {
            CoreError::Internal(inner) => {
                error!(error = %format!("{inner:#}"), "request failed");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({ "code": err.code(), "message": message });
        if let Some(field) = err.field() {
            body["field"] = serde_json::Value::from(field);
        }
        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}

type ApiResult<T> = Result<T, AppError>;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| CoreError::validation("body", rejection.body_text()).into())
}

/// Unwrap path parameters, reporting a malformed segment as a validation
/// error on that parameter. `names` lists the route's parameters in order.
fn path_params<T>(path: Result<Path<T>, PathRejection>, names: &[&'static str]) -> ApiResult<T> {
    let rejection = match path {
        Ok(Path(value)) => return Ok(value),
        Err(rejection) => rejection,
    };
    let field = match &rejection {
        PathRejection::FailedToDeserializePathParams(inner) => match inner.kind() {
            ErrorKind::ParseErrorAtKey { key, .. } => names.iter().copied().find(|n| *n == key.as_str()),
            ErrorKind::ParseErrorAtIndex { index, .. } => names.get(*index).copied(),
            _ => None,
        },
        _ => None,
    };
    let field = field.or_else(|| names.first().copied()).unwrap_or("path");
    Err(CoreError::validation(field, rejection.body_text()).into())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/api/users-info", post(create_users_info))
        .route("/api/users-info/{id}", delete(delete_users_info))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/main", get(main_plan))
        .route("/api/plans/{id}", get(get_plan_detail))
        .route("/api/plans/{id}/main", patch(set_main_plan))
        .route("/api/plans/{id}/vendors", post(add_vendor))
        .route(
            "/api/plans/{id}/vendors/{vendor_id}/regenerate",
            post(regenerate_vendor),
        )
        .route("/api/plans/{id}/vendors/{vendor_id}", delete(remove_vendor))
        .route("/api/plans/{id}/reservations", post(create_reservation))
        .route("/api/reservations", get(list_reservations))
        .route("/api/reservations/{id}", patch(update_reservation))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/api/vendors", get(list_vendors))
        .merge(authed)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = authenticate(&state.tokens, authorization, Utc::now()).map_err(|err| {
        warn!(error = %err, "rejected request");
        err
    })?;

    req.extensions_mut().insert(AuthUser(claims.user_id));
    Ok(next.run(req).await)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("wedplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("wedplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl+C handler; serving until killed");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VendorFilter {
    category: Option<String>,
    region: Option<String>,
}

async fn list_vendors(
    State(state): State<AppState>,
    Query(filter): Query<VendorFilter>,
) -> ApiResult<Json<Vec<VendorSummary>>> {
    let category = filter
        .category
        .as_deref()
        .map(str::parse::<VendorCategory>)
        .transpose()
        .map_err(|err| CoreError::validation("category", err.to_string()))?;

    let vendors = vendor_db::list_vendors(&state.pool, category, filter.region.as_deref())
        .await
        .map_err(CoreError::from)?;
    Ok(Json(vendors.iter().map(VendorSummary::from).collect()))
}

async fn create_users_info(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> ApiResult<Response> {
    let input = json_body(payload)?;
    let created = composer::create_users_info(&state.pool, &state.engine, user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn delete_users_info(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_params(path, &["id"])?;
    composer::delete_users_info(&state.pool, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_plans(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Response> {
    let plans = registry::list_plans(&state.pool, user_id).await?;
    Ok(Json(plans).into_response())
}

async fn main_plan(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Response> {
    let main = registry::main_plan(&state.pool, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("main plan not found"))?;
    Ok(Json(main).into_response())
}

async fn get_plan_detail(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Response> {
    let id = path_params(path, &["id"])?;
    let detail = composer::get_plan_detail(&state.pool, user_id, id).await?;
    Ok(Json(detail).into_response())
}

async fn set_main_plan(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Response> {
    let id = path_params(path, &["id"])?;
    let change = registry::set_main_plan(&state.pool, user_id, id).await?;
    Ok(Json(change).into_response())
}

#[derive(Debug, Deserialize)]
struct AddVendorBody {
    vendor_id: Uuid,
}

async fn add_vendor(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AddVendorBody>, JsonRejection>,
) -> ApiResult<Response> {
    let id = path_params(path, &["id"])?;
    let body = json_body(payload)?;
    let outcome = composer::add_or_replace_vendor(&state.pool, user_id, id, body.vendor_id).await?;
    Ok(Json(outcome).into_response())
}

async fn regenerate_vendor(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Response> {
    let (id, vendor_id) = path_params(path, &["id", "vendor_id"])?;
    let item = composer::regenerate_vendor(&state.pool, &state.engine, user_id, id, vendor_id).await?;
    Ok(Json(item).into_response())
}

async fn remove_vendor(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<StatusCode> {
    let (id, vendor_id) = path_params(path, &["id", "vendor_id"])?;
    composer::remove_vendor(&state.pool, user_id, id, vendor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_reservation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let id = path_params(path, &["id"])?;
    let request = json_body(payload)?;
    let created = reservation::create_reservation(&state.pool, user_id, id, &request).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn list_reservations(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Response> {
    let reservations = reservation::list_reservations(&state.pool, user_id).await?;
    Ok(Json(reservations).into_response())
}

async fn update_reservation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReservationChanges>, JsonRejection>,
) -> ApiResult<Response> {
    let id = path_params(path, &["id"])?;
    let changes = json_body(payload)?;
    let updated = reservation::update_reservation(&state.pool, user_id, id, &changes).await?;
    Ok(Json(updated).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
