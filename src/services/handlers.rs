use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::common::MessageResponse;
use crate::customers;
use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{
    AddServiceRequest, AddServiceResponse, DeleteServiceRequest, GetServicesRequest,
    ServiceListResponse, UpdateServiceRequest,
};
use super::repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addService", post(add_service))
        .route("/getServicesById", post(get_services_by_customer))
        .route("/deleteServiceById", post(delete_service))
        .route("/updateServiceById", post(update_service))
}

fn require<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(message))
}

/// Every visit handler repeats the body-vs-token identity check on top of the
/// bearer gate: the `user_id` in the payload must be the authenticated user.
fn check_identity(user_id: Uuid, auth: &AuthUser) -> Result<(), ApiError> {
    if user_id != auth.id {
        return Err(ApiError::forbidden("User ID does not match the token"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
async fn add_service(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AddServiceRequest>,
) -> Result<(StatusCode, Json<AddServiceResponse>), ApiError> {
    const MISSING: &str = "customer_id and user_id are required";
    let customer_id = require(payload.customer_id, MISSING)?;
    let user_id = require(payload.user_id, MISSING)?;
    check_identity(user_id, &auth)?;

    // The visit must point at a customer the technician actually owns.
    if !customers::repo::pair_exists(&state.db, user_id, customer_id).await? {
        return Err(ApiError::bad_request("Invalid user_id or customer_id"));
    }

    let service_detail_id = repo::insert(&state.db, customer_id, user_id, &payload.details).await?;

    info!(%user_id, %customer_id, %service_detail_id, "service visit added");
    Ok((
        StatusCode::CREATED,
        Json(AddServiceResponse {
            message: "Service added successfully".into(),
            service_detail_id,
        }),
    ))
}

#[instrument(skip(state, payload))]
async fn get_services_by_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<GetServicesRequest>,
) -> Result<Json<ServiceListResponse>, ApiError> {
    const MISSING: &str = "customer_id and user_id are required";
    let customer_id = require(payload.customer_id, MISSING)?;
    let user_id = require(payload.user_id, MISSING)?;
    check_identity(user_id, &auth)?;

    let data = repo::list_by_customer(&state.db, customer_id, user_id).await?;
    if data.is_empty() {
        return Err(ApiError::not_found(
            "No services found for the given customer and user",
        ));
    }

    Ok(Json(ServiceListResponse {
        message: "Services fetched successfully".into(),
        data,
    }))
}

#[instrument(skip(state, payload))]
async fn delete_service(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<DeleteServiceRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    const MISSING: &str = "service_detail_id and user_id are required";
    let service_detail_id = require(payload.service_detail_id, MISSING)?;
    let user_id = require(payload.user_id, MISSING)?;
    check_identity(user_id, &auth)?;

    let rows = repo::delete(&state.db, service_detail_id, user_id).await?;
    if rows == 0 {
        return Err(ApiError::not_found("Service not found"));
    }

    info!(%user_id, %service_detail_id, "service visit deleted");
    Ok(Json(MessageResponse::new("Service deleted successfully")))
}

#[instrument(skip(state, payload))]
async fn update_service(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    const MISSING: &str = "service_detail_id and user_id are required";
    let service_detail_id = require(payload.service_detail_id, MISSING)?;
    let user_id = require(payload.user_id, MISSING)?;
    check_identity(user_id, &auth)?;

    let rows = repo::update(&state.db, service_detail_id, user_id, &payload.details).await?;
    if rows == 0 {
        return Err(ApiError::not_found("Service not found"));
    }

    info!(%user_id, %service_detail_id, "service visit updated");
    Ok(Json(MessageResponse::new("Service updated successfully")))
}
